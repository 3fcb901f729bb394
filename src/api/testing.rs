use parking_lot::Mutex;

use super::{ApiError, BlogApi, Credentials, LoginResponse, PostDraft, Registration};
use crate::posts::{PostId, PostRecord};

/// Scripted `BlogApi` for state-machine tests. Each endpoint answers with
/// whatever was last configured and every call is recorded by name.
pub(crate) struct FakeBlogApi {
    pub login: Mutex<Result<LoginResponse, ApiError>>,
    pub signup: Mutex<Result<(), ApiError>>,
    pub posts: Mutex<Result<Vec<PostRecord>, ApiError>>,
    pub my_posts: Mutex<Result<Vec<PostRecord>, ApiError>>,
    pub create: Mutex<Result<(), ApiError>>,
    pub update: Mutex<Option<Result<PostRecord, ApiError>>>,
    pub delete: Mutex<Result<(), ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeBlogApi {
    fn default() -> Self {
        Self {
            login: Mutex::new(Err(ApiError::Unauthorized { message: None })),
            signup: Mutex::new(Ok(())),
            posts: Mutex::new(Ok(Vec::new())),
            my_posts: Mutex::new(Ok(Vec::new())),
            create: Mutex::new(Ok(())),
            update: Mutex::new(None),
            delete: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBlogApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

pub(crate) fn record(value: serde_json::Value) -> PostRecord {
    serde_json::from_value(value).expect("valid post record")
}

impl BlogApi for FakeBlogApi {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("login {}", credentials.email));
        self.login.lock().clone()
    }

    fn signup(&self, registration: &Registration) -> Result<(), ApiError> {
        self.record(format!("signup {}", registration.username));
        self.signup.lock().clone()
    }

    fn list_posts(&self) -> Result<Vec<PostRecord>, ApiError> {
        self.record("list_posts".into());
        self.posts.lock().clone()
    }

    fn list_my_posts(&self) -> Result<Vec<PostRecord>, ApiError> {
        self.record("list_my_posts".into());
        self.my_posts.lock().clone()
    }

    fn create_post(&self, draft: &PostDraft) -> Result<(), ApiError> {
        self.record(format!("create {}", draft.title));
        self.create.lock().clone()
    }

    fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<PostRecord, ApiError> {
        self.record(format!("update {id}"));
        match self.update.lock().clone() {
            Some(result) => result,
            None => Ok(record(serde_json::json!({
                "id": id.as_str(),
                "title": draft.title,
                "content": draft.content,
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-06-01T00:00:00Z",
            }))),
        }
    }

    fn delete_post(&self, id: &PostId) -> Result<(), ApiError> {
        self.record(format!("delete {id}"));
        self.delete.lock().clone()
    }
}
