use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::api::{user_message, ActionError, ApiReply, ApiRequest, UserAction};
use crate::config::FeedOptions;
use crate::posts::{normalize_all, FeedView, Post};
use crate::session::SessionHandle;

use super::dashboard::DashboardState;
use super::forms::{LoginForm, PostForm, SignupForm};
use super::router::{NavAction, NavItems, Route};

const MAX_HISTORY: usize = 64;

/// Requests a state transition wants sent; the caller stamps them with the
/// mount that was current when they were returned.
pub type Requests = Vec<ApiRequest>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    raised_at: Instant,
}

/// Page-level alerts. Errors stay until dismissed; successes also expire.
#[derive(Debug, Clone)]
pub struct Notices {
    error: Option<Notice>,
    success: Option<Notice>,
    ttl: Duration,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            error: None,
            success: None,
            ttl,
        }
    }

    pub fn raise_error(&mut self, text: impl Into<String>) {
        self.error = Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
            raised_at: Instant::now(),
        });
    }

    pub fn raise_success(&mut self, text: impl Into<String>) {
        self.success = Some(Notice {
            kind: NoticeKind::Success,
            text: text.into(),
            raised_at: Instant::now(),
        });
    }

    /// Dismisses the error first, then the success notice.
    pub fn dismiss(&mut self) -> bool {
        self.error.take().is_some() || self.success.take().is_some()
    }

    pub fn clear(&mut self) {
        self.error = None;
        self.success = None;
    }

    pub fn expire(&mut self, now: Instant) {
        if self
            .success
            .as_ref()
            .is_some_and(|notice| now.saturating_duration_since(notice.raised_at) >= self.ttl)
        {
            self.success = None;
        }
    }

    pub fn error(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    pub fn success(&self) -> Option<&Notice> {
        self.success.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.error.iter().chain(self.success.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub feed: FeedView,
    pub loading: bool,
    pub searching: bool,
    pub selected: usize,
}

impl HomeState {
    pub fn selected_post(&self) -> Option<&Post> {
        self.feed.visible_at(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.feed.visible_len();
        self.selected = if len == 0 {
            0
        } else {
            self.selected.saturating_add_signed(delta).min(len - 1)
        };
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.feed.push_query_char(ch);
        self.move_selection(0);
    }

    pub fn pop_search_char(&mut self) {
        self.feed.pop_query_char();
        self.move_selection(0);
    }

    pub fn clear_search(&mut self) {
        self.feed.set_query("");
        self.searching = false;
        self.move_selection(0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRedirect {
    to: Route,
    due: Instant,
    mount: u64,
}

#[derive(Debug)]
pub struct AppState {
    session: SessionHandle,
    session_revision: u64,
    options: FeedOptions,
    route: Route,
    history: Vec<Route>,
    mount: u64,
    nav: NavItems,
    username: Option<String>,
    redirect: Option<PendingRedirect>,
    pub notices: Notices,
    pub home: HomeState,
    pub login: LoginForm,
    pub signup: SignupForm,
    pub new_post: PostForm,
    pub dashboard: DashboardState,
}

impl AppState {
    pub fn new(session: SessionHandle, options: FeedOptions) -> Self {
        let mut state = Self {
            session_revision: session.revision(),
            session,
            notices: Notices::new(options.notice_ttl()),
            options,
            route: Route::Home,
            history: Vec::new(),
            mount: 0,
            nav: NavItems::for_session(false),
            username: None,
            redirect: None,
            home: HomeState::default(),
            login: LoginForm::default(),
            signup: SignupForm::default(),
            new_post: PostForm::default(),
            dashboard: DashboardState::default(),
        };
        state.sync_session(true);
        state
    }

    /// Mounts the first page; call once before the event loop starts.
    pub fn start(&mut self, route: Route) -> Requests {
        self.route = route;
        self.mount_current()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn mount(&self) -> u64 {
        self.mount
    }

    pub fn nav(&self) -> NavItems {
        self.nav
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn preview_chars(&self) -> usize {
        self.options.preview_chars
    }

    pub fn has_pending_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    pub fn detail_post(&self) -> Option<&Post> {
        match &self.route {
            Route::PostDetail(id) => self.home.feed.get(id),
            _ => None,
        }
    }

    /// True when plain keystrokes should go into a text field.
    pub fn is_typing(&self) -> bool {
        match self.route {
            Route::Login | Route::Signup | Route::NewPost => true,
            Route::Home => self.home.searching,
            Route::Dashboard => self.dashboard.is_editing(),
            Route::PostDetail(_) => false,
        }
    }

    /// Re-derives nav items and the displayed username when the session has
    /// changed since the last look, or unconditionally with `force`.
    pub fn sync_session(&mut self, force: bool) -> bool {
        let revision = self.session.revision();
        if !force && revision == self.session_revision {
            return false;
        }
        self.session_revision = revision;
        let current = self.session.current();
        let nav = NavItems::for_session(current.is_authenticated());
        let changed = nav != self.nav || current.username != self.username;
        self.nav = nav;
        self.username = current.username;
        changed
    }

    pub fn navigate(&mut self, route: Route) -> Requests {
        let previous = std::mem::replace(&mut self.route, route);
        self.history.push(previous);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
        self.mount_current()
    }

    pub fn go_back(&mut self) -> Requests {
        self.route = self.history.pop().unwrap_or(Route::Home);
        self.mount_current()
    }

    pub fn activate_nav(&mut self, action: NavAction) -> Requests {
        if !self.nav.contains(action.flag()) {
            return Vec::new();
        }
        match action.route() {
            Some(route) => self.navigate(route),
            None => self.logout(),
        }
    }

    pub fn logout(&mut self) -> Requests {
        if let Err(err) = self.session.logout() {
            tracing::error!(?err, "failed to clear session");
            self.notices.raise_error("Could not log out. Please try again.");
            return Vec::new();
        }
        self.sync_session(true);
        self.navigate(Route::Login)
    }

    fn mount_current(&mut self) -> Requests {
        self.mount += 1;
        self.redirect = None;
        self.notices.clear();
        tracing::debug!(route = %self.route.path(), mount = self.mount, "page mounted");
        match self.route.clone() {
            Route::Home => {
                self.home.clear_search();
                self.home.selected = 0;
                self.home.loading = true;
                vec![ApiRequest::LoadFeed]
            }
            Route::PostDetail(id) => {
                if self.home.feed.get(&id).is_some() {
                    Vec::new()
                } else {
                    self.home.loading = true;
                    vec![ApiRequest::LoadFeed]
                }
            }
            Route::Login => {
                self.login = LoginForm::default();
                Vec::new()
            }
            Route::Signup => {
                self.signup = SignupForm::default();
                Vec::new()
            }
            Route::NewPost => {
                self.new_post = PostForm::default();
                Vec::new()
            }
            Route::Dashboard => {
                self.dashboard = DashboardState::default();
                self.dashboard.begin_loading();
                vec![ApiRequest::LoadMyPosts]
            }
        }
    }

    pub fn refresh(&mut self) -> Requests {
        match self.route {
            Route::Home | Route::PostDetail(_) => {
                self.home.loading = true;
                vec![ApiRequest::LoadFeed]
            }
            Route::Dashboard if !self.dashboard.is_editing() => {
                self.dashboard.begin_loading();
                vec![ApiRequest::LoadMyPosts]
            }
            _ => Vec::new(),
        }
    }

    pub fn open_selected_post(&mut self) -> Requests {
        match self.home.selected_post() {
            Some(post) => {
                let route = Route::PostDetail(post.id.clone());
                self.navigate(route)
            }
            None => Vec::new(),
        }
    }

    pub fn submit_login(&mut self) -> Requests {
        if self.login.submitting {
            return Vec::new();
        }
        match self.login.credentials() {
            Ok(credentials) => {
                self.login.submitting = true;
                self.notices.clear();
                vec![ApiRequest::Login(credentials)]
            }
            Err(failure) => self.fail(UserAction::Login, failure),
        }
    }

    pub fn submit_signup(&mut self) -> Requests {
        if self.signup.submitting {
            return Vec::new();
        }
        match self.signup.registration() {
            Ok(registration) => {
                self.signup.submitting = true;
                self.notices.clear();
                vec![ApiRequest::Signup(registration)]
            }
            Err(failure) => self.fail(UserAction::Signup, failure),
        }
    }

    pub fn submit_new_post(&mut self) -> Requests {
        if self.new_post.submitting {
            return Vec::new();
        }
        if !self.session.is_authenticated() {
            return self.fail(UserAction::CreatePost, ActionError::NotAuthenticated);
        }
        match self.new_post.new_post_draft() {
            Ok(draft) => {
                self.new_post.submitting = true;
                self.notices.clear();
                vec![ApiRequest::CreatePost(draft)]
            }
            Err(failure) => self.fail(UserAction::CreatePost, failure),
        }
    }

    pub fn save_edit(&mut self) -> Requests {
        match self.dashboard.save_request() {
            Some(Ok((id, draft))) => vec![ApiRequest::UpdatePost { id, draft }],
            Some(Err(failure)) => self.fail(UserAction::UpdatePost, failure),
            None => Vec::new(),
        }
    }

    pub fn confirm_delete(&mut self) -> Requests {
        match self.dashboard.confirm_delete() {
            Some(id) => vec![ApiRequest::DeletePost(id)],
            None => Vec::new(),
        }
    }

    /// Applies a finished request. Replies issued from an earlier mount are
    /// dropped so a slow response can never overwrite the page now shown.
    pub fn apply_reply(&mut self, mount: u64, reply: ApiReply) -> Requests {
        if mount != self.mount {
            tracing::debug!(mount, current = self.mount, "discarding stale reply");
            return Vec::new();
        }
        let now = OffsetDateTime::now_utc();
        match reply {
            ApiReply::Feed(result) => {
                self.home.loading = false;
                match result {
                    Ok(records) => {
                        self.home.feed.replace_posts(normalize_all(records, now));
                        self.home.move_selection(0);
                        Vec::new()
                    }
                    Err(err) => self.fail(UserAction::LoadFeed, err.into()),
                }
            }
            ApiReply::MyPosts(result) => match self.dashboard.apply_loaded(result, now) {
                Ok(()) => Vec::new(),
                Err(err) => self.fail(UserAction::LoadMyPosts, err.into()),
            },
            ApiReply::Login(result) => {
                self.login.submitting = false;
                match result {
                    Ok(response) => {
                        if let Err(err) = self
                            .session
                            .login(&response.token, &response.user.username)
                        {
                            tracing::error!(?err, "failed to persist session");
                            self.notices.raise_error("Error: Something went wrong");
                            return Vec::new();
                        }
                        self.sync_session(true);
                        self.navigate(Route::Home)
                    }
                    Err(err) => self.fail(UserAction::Login, err.into()),
                }
            }
            ApiReply::Signup(result) => match result {
                Ok(()) => {
                    self.notices.raise_success("Account created successfully!");
                    self.schedule_redirect(Route::Login);
                    Vec::new()
                }
                Err(err) => {
                    self.signup.submitting = false;
                    self.fail(UserAction::Signup, err.into())
                }
            },
            ApiReply::Created(result) => match result {
                Ok(()) => {
                    self.notices.raise_success("Post created successfully!");
                    self.schedule_redirect(Route::Dashboard);
                    Vec::new()
                }
                Err(err) => {
                    self.new_post.submitting = false;
                    self.fail(UserAction::CreatePost, err.into())
                }
            },
            ApiReply::Updated { id, result } => {
                match self.dashboard.apply_saved(&id, result, now) {
                    Ok(()) => {
                        self.notices.raise_success("Post updated successfully!");
                        Vec::new()
                    }
                    Err(err) => self.fail(UserAction::UpdatePost, err.into()),
                }
            }
            ApiReply::Deleted { id, result } => match self.dashboard.apply_deleted(&id, result) {
                Ok(()) => {
                    self.notices.raise_success("Post deleted successfully!");
                    self.dashboard.begin_loading();
                    vec![ApiRequest::LoadMyPosts]
                }
                Err(err) => self.fail(UserAction::DeletePost, err.into()),
            },
        }
    }

    /// Expires notices and fires a due redirect.
    pub fn tick(&mut self, now: Instant) -> Requests {
        self.notices.expire(now);
        self.sync_session(false);
        let due = self
            .redirect
            .as_ref()
            .is_some_and(|redirect| now >= redirect.due);
        if !due {
            return Vec::new();
        }
        match self.redirect.take() {
            Some(redirect) if redirect.mount == self.mount => {
                if self.route == Route::NewPost {
                    self.new_post = PostForm::default();
                }
                self.navigate(redirect.to)
            }
            _ => Vec::new(),
        }
    }

    fn schedule_redirect(&mut self, to: Route) {
        self.redirect = Some(PendingRedirect {
            to,
            due: Instant::now() + self.options.redirect_delay(),
            mount: self.mount,
        });
    }

    fn fail(&mut self, action: UserAction, failure: ActionError) -> Requests {
        let text = user_message(action, &failure);
        tracing::warn!(%action, error = %failure, "action failed");
        if failure.is_unauthorized() && action.requires_session() {
            self.session.invalidate("server rejected the session token");
            self.sync_session(true);
            let requests = self.navigate(Route::Login);
            self.notices.raise_error(text);
            return requests;
        }
        self.notices.raise_error(text);
        Vec::new()
    }
}
