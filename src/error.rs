//! Error types
//!
//! [`ArmError`] is what the ARM client returns for every call. Not-found is its
//! own variant so callers can match on it instead of inspecting status codes.
//! [`ResourceError`] covers failures raised by the resource layer itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("API request failed: {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("long-running operation ended with status {status}: {message}")]
    OperationFailed { status: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ArmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound { .. })
    }

    /// HTTP status carried by the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ArmError::NotFound { .. } => Some(404),
            ArmError::Api { status, .. } => Some(*status),
            ArmError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Cannot read Local Network Gateway {name} (resource group {resource_group}) ID")]
    MissingId {
        name: String,
        resource_group: String,
    },

    #[error("{0}: required field is not set")]
    MissingAttribute(String),

    #[error("{0}: must not be empty")]
    EmptyAttribute(String),

    #[error("{0}: unknown attribute")]
    UnknownAttribute(String),

    #[error("{attribute}: expected {expected}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },
}
