use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a clustering update. Service-side variants carry BigQuery's
/// own message, which already names the table and the problem.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableUpdateError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("Conflicting update: {0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("BigQuery API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
}

impl TableUpdateError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = google_error_message(body);
        match status {
            StatusCode::NOT_FOUND => TableUpdateError::NotFound(message),
            StatusCode::FORBIDDEN => TableUpdateError::PermissionDenied(message),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                TableUpdateError::Conflict(message)
            }
            StatusCode::BAD_REQUEST => TableUpdateError::InvalidArgument(message),
            StatusCode::UNAUTHORIZED => TableUpdateError::Unauthenticated(message),
            other => TableUpdateError::Api {
                status: other.as_u16(),
                message,
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, TableUpdateError::Conflict(_))
    }
}

impl From<reqwest::Error> for TableUpdateError {
    fn from(err: reqwest::Error) -> Self {
        TableUpdateError::Transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// The `error.message` of a Google API error body, or the raw body.
pub(crate) fn google_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => String::from("empty error response"),
        Err(_) => body.trim().to_string(),
    }
}
