//! HTTP client for the blog API.
//!
//! Every outbound request goes through one place that attaches the session
//! token (when there is one) and a request id, so callers never build headers
//! themselves.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ApiOptions;
use crate::posts::{PostId, PostRecord};
use crate::session::SessionHandle;

pub mod error;
pub mod messages;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ActionError, ApiError};
pub use messages::{user_message, UserAction};
pub use worker::{dispatch, ApiReply, ApiRequest, ApiWorker, Completion, Ticket};

const USER_AGENT: &str = concat!("blogtui/", env!("CARGO_PKG_VERSION"));
const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoginUser {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

/// Operations the pages need from the server. The HTTP implementation is the
/// only production one; tests substitute a scripted fake.
pub trait BlogApi: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    fn signup(&self, registration: &Registration) -> Result<(), ApiError>;
    fn list_posts(&self) -> Result<Vec<PostRecord>, ApiError>;
    fn list_my_posts(&self) -> Result<Vec<PostRecord>, ApiError>;
    fn create_post(&self, draft: &PostDraft) -> Result<(), ApiError>;
    fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<PostRecord, ApiError>;
    fn delete_post(&self, id: &PostId) -> Result<(), ApiError>;
}

pub struct HttpBlogApi {
    client: Client,
    base_url: String,
    session: SessionHandle,
}

impl HttpBlogApi {
    pub fn new(options: &ApiOptions, session: SessionHandle) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout())
            .timeout(options.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: options.base_url.trim().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds a request with the token read from the session at send time.
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, Uuid) {
        let request_id = Uuid::new_v4();
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        (builder, request_id)
    }

    fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        let (mut builder, request_id) = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        tracing::debug!(%method, path, %request_id, "sending request");
        let response = builder.send().map_err(|err| {
            tracing::warn!(?err, %method, path, %request_id, "request failed");
            ApiError::Network(err.to_string())
        })?;
        let status = response.status();
        let text = response.text().map_err(|err| {
            tracing::warn!(?err, %method, path, %request_id, "reading response failed");
            ApiError::Network(err.to_string())
        })?;

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &text);
            tracing::warn!(%method, path, %request_id, status = status.as_u16(), error = %err, "request rejected");
            return Err(err);
        }
        tracing::debug!(%method, path, %request_id, status = status.as_u16(), "request completed");
        Ok(text)
    }

    fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let text = self.execute(method, path, body)?;
        serde_json::from_str(&text).map_err(|err| {
            tracing::warn!(?err, path, "response did not match the expected shape");
            ApiError::Decode(err.to_string())
        })
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}

impl BlogApi for HttpBlogApi {
    fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.execute_json(Method::POST, "/auth/login", Some(to_body(credentials)?))
    }

    fn signup(&self, registration: &Registration) -> Result<(), ApiError> {
        self.execute(Method::POST, "/auth/signup", Some(to_body(registration)?))
            .map(drop)
    }

    fn list_posts(&self) -> Result<Vec<PostRecord>, ApiError> {
        self.execute_json(Method::GET, "/posts", None)
    }

    fn list_my_posts(&self) -> Result<Vec<PostRecord>, ApiError> {
        self.execute_json(Method::GET, "/posts/my", None)
    }

    fn create_post(&self, draft: &PostDraft) -> Result<(), ApiError> {
        self.execute(Method::POST, "/posts", Some(to_body(draft)?))
            .map(drop)
    }

    fn update_post(&self, id: &PostId, draft: &PostDraft) -> Result<PostRecord, ApiError> {
        self.execute_json(
            Method::PUT,
            &format!("/posts/{id}"),
            Some(to_body(draft)?),
        )
    }

    fn delete_post(&self, id: &PostId) -> Result<(), ApiError> {
        self.execute(Method::DELETE, &format!("/posts/{id}"), None)
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves exactly one canned response and hands back the raw request.
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("local addr");
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                head.push_str(&line);
            }
            let mut body = vec![0; content_length];
            let _ = reader.read_exact(&mut body);
            head.push_str("\r\n");
            head.push_str(&String::from_utf8_lossy(&body));
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(head);
        });
        (format!("http://{addr}/api"), rx)
    }

    fn client(base_url: String, session: SessionHandle) -> HttpBlogApi {
        let options = ApiOptions {
            base_url,
            connect_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
        };
        HttpBlogApi::new(&options, session).expect("client")
    }

    #[test]
    fn attaches_bearer_token_and_request_id_when_logged_in() -> anyhow::Result<()> {
        let (base, requests) = serve_once("200 OK", "[]");
        let session = SessionHandle::in_memory();
        session.login("tok-123", "ada")?;
        let api = client(base, session);

        assert!(api.list_my_posts()?.is_empty());
        let raw = requests.recv()?.to_ascii_lowercase();
        assert!(raw.starts_with("get /api/posts/my "));
        assert!(raw.contains("authorization: bearer tok-123"));
        assert!(raw.contains("x-request-id: "));
        Ok(())
    }

    #[test]
    fn omits_authorization_without_a_session() -> anyhow::Result<()> {
        let (base, requests) = serve_once("200 OK", r#"[{"id":1,"title":"Hello"}]"#);
        let api = client(base, SessionHandle::in_memory());

        let posts = api.list_posts()?;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title.as_deref(), Some("Hello"));
        assert!(!requests.recv()?.to_ascii_lowercase().contains("authorization:"));
        Ok(())
    }

    #[test]
    fn login_posts_credentials_and_decodes_the_user() -> anyhow::Result<()> {
        let (base, requests) = serve_once("200 OK", r#"{"token":"t","user":{"username":"ada"}}"#);
        let api = client(base, SessionHandle::in_memory());

        let response = api.login(&Credentials {
            email: "ada@example.com".into(),
            password: "pw".into(),
        })?;
        assert_eq!(response.user.username, "ada");
        let raw = requests.recv()?;
        assert!(raw.starts_with("POST /api/auth/login "));
        assert!(raw.contains(r#""email":"ada@example.com""#));
        Ok(())
    }

    #[test]
    fn rejected_login_surfaces_as_unauthorized() {
        let (base, _requests) = serve_once("401 Unauthorized", r#"{"message":"nope"}"#);
        let api = client(base, SessionHandle::in_memory());

        let err = api
            .login(&Credentials {
                email: "ada@example.com".into(),
                password: "wrong".into(),
            })
            .unwrap_err();
        assert_matches!(err, ApiError::Unauthorized { message: Some(m) } if m == "nope");
    }

    #[test]
    fn delete_failure_carries_status() {
        let (base, requests) = serve_once("500 Internal Server Error", "{}");
        let api = client(base, SessionHandle::in_memory());

        let err = api.delete_post(&PostId::new("42")).unwrap_err();
        assert_eq!(err.status(), Some(500));
        let raw = requests.recv().expect("request captured");
        assert!(raw.starts_with("DELETE /api/posts/42 "));
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let (base, _requests) = serve_once("200 OK", r#"{"posts":"nope"}"#);
        let api = client(base, SessionHandle::in_memory());
        assert_matches!(api.list_posts(), Err(ApiError::Decode(_)));
    }

    #[test]
    fn unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let api = client(format!("http://{addr}/api"), SessionHandle::in_memory());
        assert_matches!(api.list_posts(), Err(ApiError::Network(_)));
    }

    #[test]
    fn credentials_debug_hides_the_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
