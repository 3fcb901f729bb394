use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::api::{BlogApi, HttpBlogApi};
use crate::app::{ActionDispatcher, App, Route};
use crate::config::ConfigLoader;
use crate::session::SessionHandle;
use crate::storage;

pub mod commands;

use self::commands::{
    DeleteArgs, EditArgs, LoginArgs, NewArgs, PostsArgs, SignupArgs, TuiArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "blogtui",
    version,
    about = "Keyboard-first terminal client for a blogging service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over BLOGTUI_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over BLOGTUI_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the blog API (takes precedence over BLOGTUI_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive client (default)
    Tui(TuiArgs),
    /// Log in and remember the session
    Login(LoginArgs),
    /// Create an account
    Signup(SignupArgs),
    /// Forget the stored session
    Logout,
    /// Show who the stored session belongs to
    Whoami,
    /// Print the public feed, optionally filtered
    Posts(PostsArgs),
    /// Print your own posts, most recently updated first
    Mine,
    /// Publish a new post
    New(NewArgs),
    /// Change the title or content of one of your posts
    Edit(EditArgs),
    /// Delete one of your posts
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("BLOGTUI_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("BLOGTUI_DATA", path);
    }
    if let Some(url) = &cli.api_url {
        env::set_var("BLOGTUI_API_URL", url);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();

    let command = cli.command.unwrap_or(Commands::Tui(TuiArgs {
        route: "/".into(),
    }));
    let log_target = match command {
        Commands::Tui(_) => LogTarget::File(paths.log_dir.join("blogtui.log")),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, &log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let config = loader.load_or_init()?;
    let store = storage::init(&config.storage)?;
    let session = SessionHandle::new(Arc::new(store));
    let api = HttpBlogApi::new(&config.api, session.clone())?;
    tracing::debug!(base_url = api.base_url(), "api client ready");

    let preview_chars = config.feed.preview_chars;
    let output = match command {
        Commands::Tui(args) => {
            if !atty::is(atty::Stream::Stdout) {
                bail!("the interactive client needs a terminal; try `blogtui posts` instead");
            }
            let api: Arc<dyn BlogApi> = Arc::new(api);
            let mut app = App::new(&config, session, api, Route::from_path(&args.route))?;
            return commands::run_tui(&mut app);
        }
        Commands::Logout => commands::logout(&session)?,
        Commands::Whoami => commands::whoami(&session),
        command => {
            let actions = ActionDispatcher::new(&api, &session);
            match command {
                Commands::Login(args) => commands::login(&actions, args)?,
                Commands::Signup(args) => commands::signup(&actions, args)?,
                Commands::Posts(args) => commands::list_posts(&actions, &args, preview_chars)?,
                Commands::Mine => commands::list_mine(&actions)?,
                Commands::New(args) => commands::new_post(&actions, args)?,
                Commands::Edit(args) => commands::edit_post(&actions, args)?,
                Commands::Delete(args) => commands::delete_post(&actions, args)?,
                Commands::Tui(_) | Commands::Logout | Commands::Whoami => String::new(),
            }
        }
    };
    print!("{output}");
    Ok(())
}

enum LogTarget {
    /// The interactive client owns the terminal, so logs go to a file.
    File(PathBuf),
    Stderr,
}

fn init_tracing(level: &str, target: &LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::File(path) => {
                let file = open_log_file(path)?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .init();
            }
            LogTarget::Stderr => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::parse_from(["blogtui", "--api-url", "http://example.test/api"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
    }

    #[test]
    fn tui_route_flag_parses() {
        let cli = Cli::parse_from(["blogtui", "tui", "--route", "/post/42"]);
        assert_matches!(cli.command, Some(Commands::Tui(TuiArgs { ref route })) if route == "/post/42");
    }

    #[test]
    fn posts_collects_search_words() {
        let cli = Cli::parse_from(["blogtui", "posts", "rust", "tips", "--limit", "5"]);
        assert_matches!(
            cli.command,
            Some(Commands::Posts(PostsArgs { ref search, limit: 5 })) if search == &["rust", "tips"]
        );
    }

    #[test]
    fn delete_defaults_to_unconfirmed() {
        let cli = Cli::parse_from(["blogtui", "delete", "7"]);
        assert_matches!(cli.command, Some(Commands::Delete(DeleteArgs { yes: false, .. })));
    }
}
