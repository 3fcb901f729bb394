use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::api::{
    user_message, ActionError, Credentials, PostDraft, Registration, UserAction,
};
use crate::app::dashboard::count_badge;
use crate::app::{ActionDispatcher, App};
use crate::posts::preview::{footer_label, truncate_preview, DateStyle};
use crate::posts::{FeedView, Post, PostId};
use crate::session::SessionHandle;

#[derive(Args, Debug, Clone)]
pub struct TuiArgs {
    /// Page to open first, e.g. `/dashboard` or `/post/42`
    #[arg(long, default_value = "/")]
    pub route: String,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    /// Read from stdin (or prompted) when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    /// Read from stdin (or prompted) when omitted
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PostsArgs {
    /// Case-insensitive filter over title, content and author
    #[arg()]
    pub search: Vec<String>,
    /// Limit the number of posts printed
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    pub title: String,
    /// Post body as HTML. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub id: String,
    /// Confirm the delete; nothing is sent without it
    #[arg(long)]
    pub yes: bool,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn login(actions: &ActionDispatcher, args: LoginArgs) -> Result<String> {
    let password = secret_or_prompt(args.password, "Password")?;
    let credentials = Credentials {
        email: args.email,
        password,
    };
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        bail!("Please fill in all fields correctly.");
    }
    let username = actions
        .login(&credentials)
        .map_err(|err| explain(UserAction::Login, err))?;
    Ok(format!("Logged in as {username}\n"))
}

pub fn signup(actions: &ActionDispatcher, args: SignupArgs) -> Result<String> {
    let password = secret_or_prompt(args.password, "Password")?;
    let registration = Registration {
        username: args.username,
        email: args.email,
        password,
    };
    actions
        .signup(&registration)
        .map_err(|err| explain(UserAction::Signup, err))?;
    Ok("Account created successfully! Run `blogtui login` to sign in.\n".into())
}

pub fn logout(session: &SessionHandle) -> Result<String> {
    if !session.is_authenticated() {
        return Ok("Not logged in.\n".into());
    }
    session.logout().context("clearing stored session")?;
    Ok("Logged out.\n".into())
}

pub fn whoami(session: &SessionHandle) -> String {
    match session.current().username {
        Some(username) if session.is_authenticated() => format!("Logged in as {username}\n"),
        _ => "Not logged in.\n".into(),
    }
}

pub fn list_posts(actions: &ActionDispatcher, args: &PostsArgs, preview_chars: usize) -> Result<String> {
    let posts = actions
        .feed()
        .map_err(|err| explain(UserAction::LoadFeed, err))?;
    let mut view = FeedView::default();
    view.replace_posts(posts);
    view.set_query(args.search.join(" "));
    let visible: Vec<&Post> = view.visible().take(args.limit).collect();
    if visible.is_empty() {
        return Ok(if args.search.is_empty() {
            "There are no posts available\n".into()
        } else {
            "No posts found\n".into()
        });
    }
    Ok(format_feed(&visible, preview_chars))
}

pub fn list_mine(actions: &ActionDispatcher) -> Result<String> {
    let posts = actions
        .my_posts()
        .map_err(|err| explain(UserAction::LoadMyPosts, err))?;
    Ok(format_mine(&posts))
}

pub fn new_post(actions: &ActionDispatcher, args: NewArgs) -> Result<String> {
    let content = match args.content {
        Some(content) => content,
        None => read_stdin()?.unwrap_or_default(),
    };
    let draft = PostDraft {
        title: args.title.trim().to_string(),
        content,
    };
    if draft.title.is_empty() || draft.content.trim().is_empty() {
        bail!("Title and content are required.");
    }
    actions
        .create_post(&draft)
        .map_err(|err| explain(UserAction::CreatePost, err))?;
    Ok("Post created successfully!\n".into())
}

/// Fields left out keep the server's current value.
pub fn edit_post(actions: &ActionDispatcher, args: EditArgs) -> Result<String> {
    let id = PostId::new(args.id);
    let existing = actions
        .my_posts()
        .map_err(|err| explain(UserAction::LoadMyPosts, err))?
        .into_iter()
        .find(|post| post.id == id)
        .with_context(|| format!("post {id} is not one of yours"))?;
    let draft = PostDraft {
        title: args.title.unwrap_or(existing.title),
        content: args.content.unwrap_or(existing.content),
    };
    let saved = actions
        .update_post(&id, &draft)
        .map_err(|err| explain(UserAction::UpdatePost, err))?;
    Ok(format!("Updated #{}  {}\n", saved.id, saved.title))
}

pub fn delete_post(actions: &ActionDispatcher, args: DeleteArgs) -> Result<String> {
    if !args.yes {
        bail!("refusing to delete post {} without --yes", args.id);
    }
    let id = PostId::new(args.id);
    actions
        .delete_post(&id)
        .map_err(|err| explain(UserAction::DeletePost, err))?;
    Ok(format!("Deleted post #{id}\n"))
}

fn explain(action: UserAction, err: ActionError) -> anyhow::Error {
    tracing::error!(%action, ?err, "request failed");
    anyhow!(user_message(action, &err))
}

fn format_feed(posts: &[&Post], preview_chars: usize) -> String {
    let mut out = String::new();
    for post in posts {
        let _ = writeln!(&mut out, "#{}  {}", post.id, post.title);
        let _ = writeln!(
            &mut out,
            "    by {} • {}",
            post.author_label(),
            post.created_label(DateStyle::Day)
        );
        let preview = truncate_preview(&post.content, preview_chars).replace('\n', " ");
        if !preview.trim().is_empty() {
            let _ = writeln!(&mut out, "    {}", preview.trim());
        }
        out.push('\n');
    }
    out
}

fn format_mine(posts: &[Post]) -> String {
    if posts.is_empty() {
        return "You don't have any posts yet\nCreate your first post to get started\n".into();
    }
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "My Posts ({})",
        count_badge(posts.len())
    );
    for post in posts {
        let _ = writeln!(&mut out, "#{}  {}", post.id, post.title);
        let _ = writeln!(&mut out, "    {}", footer_label(post));
    }
    out
}

fn secret_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    if atty::is(atty::Stream::Stdin) {
        return read_hidden(label);
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[derive(Debug, PartialEq, Eq)]
enum SecretInput {
    Pending,
    Done,
    Aborted,
}

fn apply_secret_key(secret: &mut String, key: &KeyEvent) -> SecretInput {
    if key.kind != KeyEventKind::Press {
        return SecretInput::Pending;
    }
    match key.code {
        KeyCode::Enter => SecretInput::Done,
        KeyCode::Esc => SecretInput::Aborted,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            SecretInput::Aborted
        }
        KeyCode::Backspace => {
            secret.pop();
            SecretInput::Pending
        }
        KeyCode::Char(ch) => {
            secret.push(ch);
            SecretInput::Pending
        }
        _ => SecretInput::Pending,
    }
}

/// Prompts on the terminal with echo off; raw mode swallows the keystrokes.
fn read_hidden(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}: ")?;
    stdout.flush()?;
    enable_raw_mode().context("enabling raw mode for password entry")?;
    let result = read_secret_keys();
    disable_raw_mode().context("restoring terminal after password entry")?;
    writeln!(stdout)?;
    result
}

fn read_secret_keys() -> Result<String> {
    let mut secret = String::new();
    loop {
        if let Event::Key(key) = event::read().context("reading password key")? {
            match apply_secret_key(&mut secret, &key) {
                SecretInput::Pending => {}
                SecretInput::Done => return Ok(secret),
                SecretInput::Aborted => bail!("password entry cancelled"),
            }
        }
    }
}

fn read_stdin() -> Result<Option<String>> {
    use std::io::Read;
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}
