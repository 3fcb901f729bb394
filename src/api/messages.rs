//! The text a page shows for each failed action. Kept apart from the HTTP
//! layer so every page reports failures the same way.

use strum::Display;

use super::error::{ActionError, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum UserAction {
    Login,
    Signup,
    CreatePost,
    LoadFeed,
    LoadMyPosts,
    UpdatePost,
    DeletePost,
}

impl UserAction {
    /// Actions that need a valid session; a 401 on these means the stored
    /// token is no longer accepted.
    pub fn requires_session(self) -> bool {
        matches!(
            self,
            UserAction::LoadMyPosts
                | UserAction::CreatePost
                | UserAction::UpdatePost
                | UserAction::DeletePost
        )
    }
}

pub fn user_message(action: UserAction, failure: &ActionError) -> String {
    let err = match failure {
        ActionError::Validation(text) => return text.clone(),
        ActionError::NotAuthenticated => {
            return match action {
                UserAction::CreatePost => "You must be logged in to create a post.".into(),
                _ => "You must be logged in to do that.".into(),
            }
        }
        ActionError::Api(err) => err,
    };

    match action {
        UserAction::Login => login_message(err),
        UserAction::Signup => signup_message(err),
        UserAction::CreatePost => match err {
            ApiError::Unauthorized { .. } => "Unauthorized. Please login again.".into(),
            _ => "Something went wrong. Please try again.".into(),
        },
        UserAction::LoadFeed => "Failed to load posts. Please try again later.".into(),
        UserAction::LoadMyPosts => "Failed to fetch posts. Please try again later.".into(),
        UserAction::UpdatePost => "Failed to update post.".into(),
        UserAction::DeletePost => "Failed to delete post.".into(),
    }
}

fn login_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => "Network error. Please check your connection.".into(),
        ApiError::BadRequest { .. } => "Please fill in all fields correctly.".into(),
        ApiError::Unauthorized { .. } => "Invalid email or password.".into(),
        other => format!(
            "Error: {}",
            other.server_message().unwrap_or("Something went wrong")
        ),
    }
}

fn signup_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => "Network error. Please check your connection.".into(),
        ApiError::BadRequest { .. } => "Please fill all fields correctly".into(),
        ApiError::Conflict { .. } => "Email or username already exists".into(),
        _ => "Registration failed. Please try again.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, body: &str) -> ActionError {
        ActionError::Api(ApiError::from_status(status, body))
    }

    #[test]
    fn login_failures() {
        assert_eq!(
            user_message(UserAction::Login, &api(401, "")),
            "Invalid email or password."
        );
        assert_eq!(
            user_message(UserAction::Login, &api(400, "")),
            "Please fill in all fields correctly."
        );
        assert_eq!(
            user_message(UserAction::Login, &api(500, r#"{"message":"db down"}"#)),
            "Error: db down"
        );
        assert_eq!(
            user_message(UserAction::Login, &api(502, "")),
            "Error: Something went wrong"
        );
        assert_eq!(
            user_message(
                UserAction::Login,
                &ActionError::Api(ApiError::Network("refused".into()))
            ),
            "Network error. Please check your connection."
        );
    }

    #[test]
    fn signup_failures() {
        assert_eq!(
            user_message(UserAction::Signup, &api(409, "")),
            "Email or username already exists"
        );
        assert_eq!(
            user_message(UserAction::Signup, &api(400, "")),
            "Please fill all fields correctly"
        );
        assert_eq!(
            user_message(UserAction::Signup, &api(500, "")),
            "Registration failed. Please try again."
        );
    }

    #[test]
    fn post_failures_ignore_server_detail() {
        assert_eq!(
            user_message(UserAction::CreatePost, &api(401, "")),
            "Unauthorized. Please login again."
        );
        assert_eq!(
            user_message(UserAction::CreatePost, &ActionError::NotAuthenticated),
            "You must be logged in to create a post."
        );
        assert_eq!(
            user_message(UserAction::DeletePost, &api(500, r#"{"message":"boom"}"#)),
            "Failed to delete post."
        );
        assert_eq!(
            user_message(UserAction::LoadFeed, &api(503, "")),
            "Failed to load posts. Please try again later."
        );
    }

    #[test]
    fn validation_text_passes_through() {
        let failure = ActionError::Validation("Title cannot be empty.".into());
        assert_eq!(
            user_message(UserAction::UpdatePost, &failure),
            "Title cannot be empty."
        );
    }
}
