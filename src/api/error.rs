use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API call, classified by what the pages need to know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("could not reach the server: {0}")]
    Network(String),
    #[error("bad request: {}", .message.as_deref().unwrap_or("no details"))]
    BadRequest { message: Option<String> },
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("no details"))]
    Unauthorized { message: Option<String> },
    #[error("conflict: {}", .message.as_deref().unwrap_or("no details"))]
    Conflict { message: Option<String> },
    #[error("server responded with status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Classifies a non-2xx response. The body is searched for a JSON
    /// `message` (or `error`) field.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            400 => ApiError::BadRequest { message },
            401 => ApiError::Unauthorized { message },
            409 => ApiError::Conflict { message },
            _ => ApiError::Server { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Conflict { .. } => Some(409),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { message }
            | ApiError::Unauthorized { message }
            | ApiError::Conflict { message }
            | ApiError::Server { message, .. } => message.as_deref(),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Why a page action did not go through: either it never left the client,
/// or the API call failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    /// Carries the text shown to the user as-is.
    #[error("{0}")]
    Validation(String),
    #[error("not logged in")]
    NotAuthenticated,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ActionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Api(err) if err.is_unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn classifies_statuses_and_keeps_server_message() {
        assert_matches!(
            ApiError::from_status(401, r#"{"message":"Invalid credentials"}"#),
            ApiError::Unauthorized { message: Some(m) } if m == "Invalid credentials"
        );
        assert_matches!(
            ApiError::from_status(409, r#"{"error":"taken"}"#),
            ApiError::Conflict { message: Some(m) } if m == "taken"
        );
        assert_matches!(
            ApiError::from_status(503, "<html>down</html>"),
            ApiError::Server { status: 503, message: None }
        );
        assert_matches!(
            ApiError::from_status(400, r#"{"message":"   "}"#),
            ApiError::BadRequest { message: None }
        );
    }

    #[test]
    fn status_is_absent_for_transport_failures() {
        assert_eq!(ApiError::Network("refused".into()).status(), None);
        assert_eq!(ApiError::from_status(500, "").status(), Some(500));
    }
}
