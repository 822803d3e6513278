use crate::domain::forms::ValidationError;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("unauthorized")]
    Unauthorized,
    #[error("token refresh failed: {0}")]
    RefreshFailed(Box<ClientError>),
    #[error("request rejected by server")]
    Rejected { message: Option<String> },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Message suitable for a transient notification. Prefers the server's
    /// own `message` field, falls back to `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Status {
                message: Some(message),
                ..
            }
            | ClientError::Rejected {
                message: Some(message),
            } => message.clone(),
            ClientError::RefreshFailed(inner) => inner.user_message(fallback),
            ClientError::Validation(err) => err.description.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ClientError::Http(err) => err.status(),
            ClientError::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

/// Turns a non-success response into a `Status` error, keeping the
/// server-provided `message` when the body carries one.
pub(crate) async fn status_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorPayload>(&body)
        .ok()
        .and_then(|payload| payload.message)
        .filter(|m| !m.trim().is_empty());
    ClientError::Status { status, message }
}
