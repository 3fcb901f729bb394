use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::api::{ApiWorker, BlogApi};
use crate::config::AppConfig;
use crate::session::SessionHandle;
use crate::ui::{self, ListStates};

pub mod actions;
pub mod dashboard;
pub mod editor;
pub mod forms;
pub mod router;
pub mod state;

pub use actions::ActionDispatcher;
pub use dashboard::{DashboardState, EditSession, PostMode};
pub use editor::TextBuffer;
pub use forms::{DraftField, LoginField, LoginForm, PostForm, SignupField, SignupForm};
pub use router::{NavAction, NavItems, Route};
pub use state::{AppState, Notice, NoticeKind, Requests};

/// Re-read the session store this often so a login or logout from another
/// process shows up in the nav bar.
const SESSION_POLL: Duration = Duration::from_secs(2);

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    Open,
    Back,
    Refresh,
    StartSearch,
    EditPost,
    DeletePost,
    NewPost,
    DismissNotice,
    Nav(usize),
}

/// What a key did inside a title/content form.
enum FormKey {
    Submit,
    Cancel,
    Handled,
    Ignored,
}

pub struct App {
    state: AppState,
    worker: ApiWorker,
    lists: ListStates,
    should_quit: bool,
    tick_rate: Duration,
    last_session_poll: Instant,
}

impl App {
    pub fn new(
        config: &AppConfig,
        session: SessionHandle,
        api: Arc<dyn BlogApi>,
        start: Route,
    ) -> Result<Self> {
        let worker = ApiWorker::spawn(api).context("starting api worker")?;
        let mut app = Self {
            state: AppState::new(session, config.feed.clone()),
            worker,
            lists: ListStates::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(100),
            last_session_poll: Instant::now(),
        };
        let requests = app.state.start(start);
        app.submit(requests);
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state, &mut self.lists))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            self.drain_completions();

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn submit(&mut self, requests: Requests) {
        let mount = self.state.mount();
        for request in requests {
            let ticket = self.worker.submit(mount, request);
            tracing::debug!(ticket = ticket.id, mount, "request queued");
        }
    }

    fn drain_completions(&mut self) {
        while let Some(completion) = self.worker.try_recv() {
            let requests = self
                .state
                .apply_reply(completion.ticket.mount, completion.reply);
            self.submit(requests);
        }
    }

    fn on_tick(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_session_poll) >= SESSION_POLL {
            self.state.sync_session(true);
            self.last_session_poll = now;
        }
        let requests = self.state.tick(now);
        self.submit(requests);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('x') => {
                    self.state.notices.dismiss();
                    return;
                }
                _ => {}
            }
        }
        if key.modifiers.contains(KeyModifiers::ALT) {
            if let KeyCode::Char(digit @ '1'..='9') = key.code {
                self.handle_action(Action::Nav(digit as usize - '1' as usize));
                return;
            }
        }

        if self.state.dashboard.pending_delete().is_some() {
            self.handle_confirm_key(key);
            return;
        }

        if self.state.is_typing() {
            self.handle_typing_key(key);
            return;
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let on_dashboard = self.is_on(Route::Dashboard);
        let action = match key.code {
            KeyCode::Char('q') if plain => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Enter => Some(Action::Open),
            KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
            KeyCode::Char('b') if plain => Some(Action::Back),
            KeyCode::Char('r') if plain => Some(Action::Refresh),
            KeyCode::Char('x') if plain => Some(Action::DismissNotice),
            KeyCode::Char('/') if plain => Some(Action::StartSearch),
            KeyCode::Char('e') if plain && on_dashboard => Some(Action::EditPost),
            KeyCode::Char('d') if plain && on_dashboard => Some(Action::DeletePost),
            KeyCode::Char('n') if plain => Some(Action::NewPost),
            KeyCode::Char(digit @ '1'..='9') if plain => {
                Some(Action::Nav(digit as usize - '1' as usize))
            }
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        let requests = match action {
            Action::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Action::SelectNext => {
                self.move_selection(1);
                Vec::new()
            }
            Action::SelectPrevious => {
                self.move_selection(-1);
                Vec::new()
            }
            Action::Open if self.is_on(Route::Home) => self.state.open_selected_post(),
            Action::Open => Vec::new(),
            Action::Back if self.is_on(Route::Home) => Vec::new(),
            Action::Back => self.state.go_back(),
            Action::Refresh => self.state.refresh(),
            Action::StartSearch => {
                if self.is_on(Route::Home) {
                    self.state.home.searching = true;
                }
                Vec::new()
            }
            Action::EditPost => {
                if let Some(id) = self.state.dashboard.selected_post().map(|p| p.id.clone()) {
                    if let Some(discarded) = self.state.dashboard.begin_edit(&id) {
                        tracing::debug!(post = %discarded, "discarded unsaved edit");
                    }
                }
                Vec::new()
            }
            Action::DeletePost => {
                self.state.dashboard.request_delete();
                Vec::new()
            }
            Action::NewPost => {
                if self.state.nav().contains(NavItems::NEW_POST) {
                    self.state.navigate(Route::NewPost)
                } else {
                    Vec::new()
                }
            }
            Action::DismissNotice => {
                self.state.notices.dismiss();
                Vec::new()
            }
            Action::Nav(index) => match self.state.nav().actions().get(index).copied() {
                Some(nav) => self.state.activate_nav(nav),
                None => Vec::new(),
            },
        };
        self.submit(requests);
    }

    fn is_on(&self, route: Route) -> bool {
        *self.state.route() == route
    }

    fn move_selection(&mut self, delta: isize) {
        if self.is_on(Route::Home) {
            self.state.home.move_selection(delta);
        } else if self.is_on(Route::Dashboard) {
            self.state.dashboard.move_selection(delta);
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                let requests = self.state.confirm_delete();
                self.submit(requests);
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.state.dashboard.cancel_delete();
            }
            _ => {}
        }
    }

    fn handle_typing_key(&mut self, key: KeyEvent) {
        let requests = match self.state.route().clone() {
            Route::Home => {
                self.handle_search_key(key);
                Vec::new()
            }
            Route::Login => self.handle_login_key(key),
            Route::Signup => self.handle_signup_key(key),
            Route::NewPost => match edit_post_form(&mut self.state.new_post, key) {
                FormKey::Submit => self.state.submit_new_post(),
                FormKey::Cancel => self.state.go_back(),
                FormKey::Handled | FormKey::Ignored => Vec::new(),
            },
            Route::Dashboard => {
                let outcome = match self.state.dashboard.edit_session_mut() {
                    Some(session) => edit_post_form(&mut session.form, key),
                    None => FormKey::Ignored,
                };
                match outcome {
                    FormKey::Submit => self.state.save_edit(),
                    FormKey::Cancel => {
                        self.state.dashboard.cancel_edit();
                        Vec::new()
                    }
                    FormKey::Handled | FormKey::Ignored => Vec::new(),
                }
            }
            Route::PostDetail(_) => Vec::new(),
        };
        self.submit(requests);
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let home = &mut self.state.home;
        match key.code {
            KeyCode::Esc => home.clear_search(),
            KeyCode::Enter => home.searching = false,
            KeyCode::Backspace => home.pop_search_char(),
            KeyCode::Down => home.move_selection(1),
            KeyCode::Up => home.move_selection(-1),
            KeyCode::Char(ch) if is_text_input(&key) => home.push_search_char(ch),
            _ => {}
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Requests {
        let form = &mut self.state.login;
        match key.code {
            KeyCode::Enter => return self.state.submit_login(),
            KeyCode::Esc => return self.state.go_back(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.cycle_focus(),
            KeyCode::Backspace => {
                form.focused_mut().pop();
            }
            KeyCode::Char(ch) if is_text_input(&key) => form.focused_mut().push(ch),
            _ => {}
        }
        Vec::new()
    }

    fn handle_signup_key(&mut self, key: KeyEvent) -> Requests {
        let form = &mut self.state.signup;
        match key.code {
            KeyCode::Enter => return self.state.submit_signup(),
            KeyCode::Esc => return self.state.go_back(),
            KeyCode::Tab | KeyCode::Down => form.cycle_focus(true),
            KeyCode::BackTab | KeyCode::Up => form.cycle_focus(false),
            KeyCode::Backspace => {
                form.focused_mut().pop();
            }
            KeyCode::Char(ch) if is_text_input(&key) => form.focused_mut().push(ch),
            _ => {}
        }
        Vec::new()
    }
}

fn is_text_input(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// Shared key handling for the new-post page and dashboard edits.
fn edit_post_form(form: &mut PostForm, key: KeyEvent) -> FormKey {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => FormKey::Submit,
            KeyCode::Char('z') if form.focus == DraftField::Content => {
                form.content.undo();
                FormKey::Handled
            }
            KeyCode::Char('y') if form.focus == DraftField::Content => {
                form.content.redo();
                FormKey::Handled
            }
            _ => FormKey::Ignored,
        };
    }
    match key.code {
        KeyCode::Esc => return FormKey::Cancel,
        KeyCode::Tab | KeyCode::BackTab => {
            form.focus = form.focus.toggle();
            return FormKey::Handled;
        }
        _ => {}
    }
    if form.submitting {
        return FormKey::Ignored;
    }
    match form.focus {
        DraftField::Title => match key.code {
            KeyCode::Enter | KeyCode::Down => form.focus = DraftField::Content,
            KeyCode::Backspace => {
                form.title.pop();
            }
            KeyCode::Char(ch) if is_text_input(&key) => form.title.push(ch),
            _ => return FormKey::Ignored,
        },
        DraftField::Content => {
            let buffer = &mut form.content;
            match key.code {
                KeyCode::Enter => buffer.insert_newline(),
                KeyCode::Backspace => {
                    buffer.backspace();
                }
                KeyCode::Delete => {
                    buffer.delete();
                }
                KeyCode::Left => {
                    buffer.move_left();
                }
                KeyCode::Right => {
                    buffer.move_right();
                }
                KeyCode::Up => {
                    buffer.move_up();
                }
                KeyCode::Down => {
                    buffer.move_down();
                }
                KeyCode::Home => {
                    buffer.move_home();
                }
                KeyCode::End => {
                    buffer.move_end();
                }
                KeyCode::Char(ch) if is_text_input(&key) => buffer.insert_char(ch),
                _ => return FormKey::Ignored,
            }
        }
    }
    FormKey::Handled
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("creating terminal backend")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char(ch))
        }
    }

    #[test]
    fn title_enter_moves_to_content_and_ctrl_s_submits() {
        let mut form = PostForm::default();
        for ch in "Hi".chars() {
            edit_post_form(&mut form, key(KeyCode::Char(ch)));
        }
        edit_post_form(&mut form, key(KeyCode::Enter));
        assert_eq!(form.focus, DraftField::Content);
        for ch in "<p>x</p>".chars() {
            edit_post_form(&mut form, key(KeyCode::Char(ch)));
        }
        edit_post_form(&mut form, key(KeyCode::Enter));
        assert_eq!(form.title, "Hi");
        assert_eq!(form.content.text(), "<p>x</p>\n");
        assert!(matches!(edit_post_form(&mut form, ctrl('s')), FormKey::Submit));
        assert!(matches!(edit_post_form(&mut form, key(KeyCode::Esc)), FormKey::Cancel));
    }

    #[test]
    fn content_undo_is_bound_to_ctrl_z() {
        let mut form = PostForm::from_post("t", "abc");
        form.focus = DraftField::Content;
        edit_post_form(&mut form, key(KeyCode::Backspace));
        assert_eq!(form.content.text(), "ab");
        edit_post_form(&mut form, ctrl('z'));
        assert_eq!(form.content.text(), "abc");
    }

    #[test]
    fn submitting_form_ignores_typing() {
        let mut form = PostForm::from_post("t", "abc");
        form.submitting = true;
        assert!(matches!(
            edit_post_form(&mut form, key(KeyCode::Char('z'))),
            FormKey::Ignored
        ));
        assert_eq!(form.title, "t");
    }
}
