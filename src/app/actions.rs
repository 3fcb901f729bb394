//! Blocking page actions for the command-line subcommands. They share the
//! session and failure policy with the interactive client: a 401 on an
//! action that needs a session clears the stored credentials.

use time::OffsetDateTime;

use crate::api::{
    ActionError, ApiError, BlogApi, Credentials, PostDraft, Registration, UserAction,
};
use crate::posts::{normalize, normalize_all, sort_by_recent_update, Post, PostId};
use crate::session::SessionHandle;

use super::forms::validate_registration;

pub struct ActionDispatcher<'a> {
    api: &'a dyn BlogApi,
    session: &'a SessionHandle,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(api: &'a dyn BlogApi, session: &'a SessionHandle) -> Self {
        Self { api, session }
    }

    /// Logs in and stores the session. Returns the username.
    pub fn login(&self, credentials: &Credentials) -> Result<String, ActionError> {
        let response = self.api.login(credentials)?;
        self.session
            .login(&response.token, &response.user.username)
            .map_err(|err| {
                tracing::error!(?err, "failed to persist session");
                ActionError::Validation("Error: Something went wrong".into())
            })?;
        Ok(response.user.username)
    }

    pub fn signup(&self, registration: &Registration) -> Result<(), ActionError> {
        validate_registration(registration)?;
        Ok(self.api.signup(registration)?)
    }

    pub fn feed(&self) -> Result<Vec<Post>, ActionError> {
        let records = self.api.list_posts()?;
        Ok(normalize_all(records, OffsetDateTime::now_utc()))
    }

    /// The caller's own posts, most recently updated first.
    pub fn my_posts(&self) -> Result<Vec<Post>, ActionError> {
        let records = self.guard(UserAction::LoadMyPosts, self.api.list_my_posts())?;
        let mut posts = normalize_all(records, OffsetDateTime::now_utc());
        sort_by_recent_update(&mut posts);
        Ok(posts)
    }

    pub fn create_post(&self, draft: &PostDraft) -> Result<(), ActionError> {
        if !self.session.is_authenticated() {
            return Err(ActionError::NotAuthenticated);
        }
        self.guard(UserAction::CreatePost, self.api.create_post(draft))
    }

    pub fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<Post, ActionError> {
        if draft.title.trim().is_empty() {
            return Err(ActionError::Validation("Title cannot be empty.".into()));
        }
        let record = self.guard(UserAction::UpdatePost, self.api.update_post(id, draft))?;
        let mut post = normalize(record, OffsetDateTime::now_utc());
        post.id = id.clone();
        Ok(post)
    }

    pub fn delete_post(&self, id: &PostId) -> Result<(), ActionError> {
        self.guard(UserAction::DeletePost, self.api.delete_post(id))
    }

    fn guard<T>(&self, action: UserAction, result: Result<T, ApiError>) -> Result<T, ActionError> {
        result.map_err(|err| {
            if err.is_unauthorized() && action.requires_session() {
                self.session.invalidate("server rejected the session token");
            }
            ActionError::Api(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{record, FakeBlogApi};
    use crate::api::{LoginResponse, LoginUser};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn login_persists_the_session() -> anyhow::Result<()> {
        let api = FakeBlogApi::default();
        *api.login.lock() = Ok(LoginResponse {
            token: "t".into(),
            user: LoginUser {
                username: "ada".into(),
            },
        });
        let session = SessionHandle::in_memory();
        let actions = ActionDispatcher::new(&api, &session);
        let username = actions.login(&Credentials {
            email: "a@x.com".into(),
            password: "secret".into(),
        })?;
        assert_eq!(username, "ada");
        assert_eq!(session.current().username.as_deref(), Some("ada"));
        Ok(())
    }

    #[test]
    fn my_posts_come_back_sorted() -> anyhow::Result<()> {
        let api = FakeBlogApi::default();
        *api.my_posts.lock() = Ok(vec![
            record(json!({ "id": 1, "createdAt": "2024-01-01T00:00:00Z" })),
            record(json!({ "id": 2, "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-04-01T00:00:00Z" })),
        ]);
        let session = SessionHandle::in_memory();
        session.login("t", "ada")?;
        let posts = ActionDispatcher::new(&api, &session).my_posts()?;
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["2", "1"]);
        Ok(())
    }

    #[test]
    fn unauthorized_delete_clears_the_session() -> anyhow::Result<()> {
        let api = FakeBlogApi::default();
        *api.delete.lock() = Err(ApiError::Unauthorized { message: None });
        let session = SessionHandle::in_memory();
        session.login("expired", "ada")?;
        let result = ActionDispatcher::new(&api, &session).delete_post(&PostId::new("3"));
        assert!(result.as_ref().is_err_and(ActionError::is_unauthorized));
        assert!(!session.is_authenticated());
        Ok(())
    }

    #[test]
    fn invalid_registration_never_reaches_the_api() {
        let api = FakeBlogApi::default();
        let session = SessionHandle::in_memory();
        let result = ActionDispatcher::new(&api, &session).signup(&Registration {
            username: "ab".into(),
            email: "no-at-sign".into(),
            password: "123".into(),
        });
        assert_matches!(result, Err(ActionError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn create_without_session_is_refused_locally() {
        let api = FakeBlogApi::default();
        let session = SessionHandle::in_memory();
        let result = ActionDispatcher::new(&api, &session).create_post(&PostDraft {
            title: "t".into(),
            content: "c".into(),
        });
        assert_matches!(result, Err(ActionError::NotAuthenticated));
        assert!(api.calls().is_empty());
    }
}
