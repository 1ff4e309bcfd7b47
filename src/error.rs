use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::store::StoreError;

/// Fixed user-facing message attached to 403 rejections.
pub const ACCESS_DENIED_MESSAGE: &str =
    "Access denied. You do not have permission to perform this action.";
/// Fixed user-facing message attached to 404 rejections.
pub const NOT_FOUND_MESSAGE: &str = "Resource not found. The requested item does not exist.";
/// Fixed user-facing message attached to 500 rejections.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
/// Fixed user-facing message attached once network retries are exhausted.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
/// Fixed user-facing message attached to 400 responses carrying field errors.
pub const VALIDATION_MESSAGE: &str = "Validation failed";

/// A single field-level error mirrored from a 400 validation response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    #[serde(default, alias = "param", alias = "path")]
    pub field: Option<String>,
    #[serde(alias = "msg")]
    pub message: String,
}

/// Error type for the UniNexus client and CLI.
///
/// Classified API failures keep the raw status and body message alongside the
/// fixed `user_message`, so callers needing the original response can still
/// inspect it.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Non-success HTTP status, annotated with a user-facing message when the
    /// status falls in a recognized category and passed through untouched
    /// otherwise.
    #[error("API returned an error: status={status}, message={message}")]
    Status {
        status: StatusCode,
        message: String,
        user_message: Option<&'static str>,
    },
    /// 400 response carrying a structured list of field errors.
    #[error("Validation failed: {} field error(s)", errors.len())]
    Validation {
        status: StatusCode,
        user_message: &'static str,
        errors: Vec<FieldError>,
    },
    /// Connectivity failure that survived every backoff retry.
    #[error("Network error after {attempts} attempts: {source}")]
    NetworkExhausted {
        attempts: u32,
        user_message: &'static str,
        source: reqwest::Error,
    },
    /// The token refresh call itself failed; the session has been cleared.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[source] Box<ApiError>),
    #[error("Credential store error: {0}")]
    CredentialStore(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InputError(String),
}

impl ApiError {
    /// The human-readable annotation for recognized failure categories.
    /// Uncategorized errors return `None` and must be handled from the raw
    /// status or message.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { user_message, .. } => *user_message,
            ApiError::Validation { user_message, .. } => Some(user_message),
            ApiError::NetworkExhausted { user_message, .. } => Some(user_message),
            _ => None,
        }
    }

    /// HTTP status of the failing response, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } | ApiError::Validation { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Field-level errors from a validation failure, if any.
    pub fn validation_errors(&self) -> Option<&[FieldError]> {
        match self {
            ApiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::CredentialStore(err.to_string())
    }
}
