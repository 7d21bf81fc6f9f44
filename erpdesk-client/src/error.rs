//! Error taxonomy of the client layer.

use serde::Serialize;
use serde_json::Value;
use shared::models::ErrorResponse;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A non-2xx response: status plus whatever body the server sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestError {
    pub status: u16,
    pub data: Value,
}

impl RequestError {
    /// Server error message, if the body carries one.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        ErrorResponse::from_body(&self.data).map(|error| error.message)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {message}", self.status),
            None if self.data.is_null() => write!(f, "{}", self.status),
            None => write!(f, "{}: {}", self.status, self.data),
        }
    }
}

/// Shape handed to callers: `{status, data}`. Transport failures have no
/// status and carry the error text as `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub status: Option<u16>,
    pub data: Value,
}

/// Failure of a token refresh. Cloned once per queued caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("no refresh token or user id stored; log in again")]
    MissingCredentials,

    #[error("refresh rejected with status {status}")]
    Rejected { status: u16, data: Value },

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("refresh response could not be decoded: {0}")]
    Decode(String),

    #[error("refresh was abandoned before it completed")]
    Abandoned,
}

/// Errors surfaced by API calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 401 that the refresh path could not recover.
    #[error("unauthorized: {0}")]
    Unauthorized(RequestError),

    /// Any other non-2xx status.
    #[error("request failed with {0}")]
    Application(RequestError),

    /// The refresh the request depended on failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// The session could not be written to its storage.
    #[error("session storage failed: {0}")]
    Storage(String),

    #[error("no location id given and none stored in the session")]
    NoLocation,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl ApiError {
    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(error) | Self::Application(error) => Some(error.status),
            Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Whether the server refused the credentials, so only a new login can
    /// help. A refresh endpoint answering 5xx is not a refusal. Whether the
    /// stored session was also cleared depends on the refresh failure policy.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Unauthorized(_) | Self::Refresh(RefreshError::MissingCredentials) => true,
            Self::Refresh(RefreshError::Rejected { status, .. }) => (400..500).contains(status),
            _ => false,
        }
    }

    /// Render as the `{status, data}` payload.
    #[must_use]
    pub fn payload(&self) -> ErrorPayload {
        match self {
            Self::Unauthorized(error) | Self::Application(error) => ErrorPayload {
                status: Some(error.status),
                data: error.data.clone(),
            },
            Self::Refresh(RefreshError::Rejected { status, data }) => ErrorPayload {
                status: Some(*status),
                data: data.clone(),
            },
            other => ErrorPayload {
                status: None,
                data: Value::String(other.to_string()),
            },
        }
    }
}

/// Credential storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credential store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("credential store {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
