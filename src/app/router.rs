use bitflags::bitflags;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::posts::PostId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    NewPost,
    Dashboard,
    PostDetail(PostId),
}

impl Route {
    /// Resolves a path; anything unrecognised lands on the home feed.
    pub fn from_path(path: &str) -> Route {
        Route::parse(path).unwrap_or_else(|| {
            tracing::debug!(path, "unknown route, showing home");
            Route::Home
        })
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(trimmed);
        match trimmed {
            "" | "/" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            "/new" => Some(Route::NewPost),
            "/dashboard" => Some(Route::Dashboard),
            other => other
                .strip_prefix("/post/")
                .filter(|id| !id.is_empty() && !id.contains('/'))
                .map(|id| Route::PostDetail(PostId::new(id))),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::NewPost => "/new".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::PostDetail(id) => format!("/post/{id}"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Latest Posts",
            Route::Login => "Login",
            Route::Signup => "Create Account",
            Route::NewPost => "Create a New Post",
            Route::Dashboard => "My Posts",
            Route::PostDetail(_) => "Post",
        }
    }

    /// Pages whose main area is a text form; plain keys type into it.
    pub fn is_form(&self) -> bool {
        matches!(self, Route::Login | Route::Signup | Route::NewPost)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NavItems: u8 {
        const HOME = 1 << 0;
        const NEW_POST = 1 << 1;
        const DASHBOARD = 1 << 2;
        const LOGOUT = 1 << 3;
        const LOGIN = 1 << 4;
        const SIGNUP = 1 << 5;
    }
}

impl NavItems {
    pub fn for_session(authenticated: bool) -> NavItems {
        if authenticated {
            NavItems::HOME | NavItems::NEW_POST | NavItems::DASHBOARD | NavItems::LOGOUT
        } else {
            NavItems::HOME | NavItems::LOGIN | NavItems::SIGNUP
        }
    }

    /// Visible entries in display order.
    pub fn actions(self) -> Vec<NavAction> {
        NavAction::iter()
            .filter(|action| self.contains(action.flag()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum NavAction {
    #[strum(to_string = "Home")]
    Home,
    #[strum(to_string = "New Post")]
    NewPost,
    #[strum(to_string = "My Posts")]
    Dashboard,
    #[strum(to_string = "Logout")]
    Logout,
    #[strum(to_string = "Login")]
    Login,
    #[strum(to_string = "Sign Up")]
    Signup,
}

impl NavAction {
    pub fn flag(self) -> NavItems {
        match self {
            NavAction::Home => NavItems::HOME,
            NavAction::NewPost => NavItems::NEW_POST,
            NavAction::Dashboard => NavItems::DASHBOARD,
            NavAction::Logout => NavItems::LOGOUT,
            NavAction::Login => NavItems::LOGIN,
            NavAction::Signup => NavItems::SIGNUP,
        }
    }

    /// Where the entry leads; logout has no page of its own.
    pub fn route(self) -> Option<Route> {
        match self {
            NavAction::Home => Some(Route::Home),
            NavAction::NewPost => Some(Route::NewPost),
            NavAction::Dashboard => Some(Route::Dashboard),
            NavAction::Login => Some(Route::Login),
            NavAction::Signup => Some(Route::Signup),
            NavAction::Logout => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_to_pages() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/signup/"), Route::Signup);
        assert_eq!(Route::from_path("/new"), Route::NewPost);
        assert_eq!(Route::from_path("/dashboard"), Route::Dashboard);
        assert_eq!(
            Route::from_path("/post/abc123"),
            Route::PostDetail(PostId::new("abc123"))
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_home() {
        assert_eq!(Route::from_path("/settings"), Route::Home);
        assert_eq!(Route::from_path("/post/"), Route::Home);
        assert_eq!(Route::from_path("/post/1/comments"), Route::Home);
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Home,
            Route::Login,
            Route::Signup,
            Route::NewPost,
            Route::Dashboard,
            Route::PostDetail(PostId::new("7")),
        ] {
            assert_eq!(Route::from_path(&route.path()), route);
        }
    }

    #[test]
    fn nav_items_follow_the_session() {
        let signed_in: Vec<String> = NavItems::for_session(true)
            .actions()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(signed_in, ["Home", "New Post", "My Posts", "Logout"]);

        let signed_out = NavItems::for_session(false);
        assert!(signed_out.contains(NavItems::HOME | NavItems::LOGIN | NavItems::SIGNUP));
        assert!(!signed_out.intersects(NavItems::NEW_POST | NavItems::DASHBOARD | NavItems::LOGOUT));
    }
}
