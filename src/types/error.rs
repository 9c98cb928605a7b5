//! Error taxonomy
//!
//! Remote failures come in three shapes (transport, service, unknown) and
//! local precondition failures in one (validation). Every kind normalizes
//! into [`ErrorInfo`] before reaching UI-level callers.

use serde::{Deserialize, Serialize};

/// Status code reported for transport failures (no response received)
pub const STATUS_TRANSPORT: i32 = 0;

/// Status code reported for responses matching no known shape
pub const STATUS_UNKNOWN: i32 = -1;

/// Status code reported for local precondition failures
pub const STATUS_VALIDATION: i32 = 422;

/// Crate error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Request never reached the server or no response came back
    #[error("network error - cannot connect to server: {0}")]
    Transport(String),

    /// Server responded with a structured error payload
    #[error("{message} (status {status})")]
    Service { message: String, status: u16 },

    /// Anything not matching the two response shapes above
    #[error("unknown error: {0}")]
    Unknown(String),

    /// Local precondition failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Local key-value store could not be read or written
    #[error("storage error: {0}")]
    Storage(String),
}

/// Local precondition failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("photo collection is full (max {cap})")]
    CapacityExceeded { cap: usize },

    #[error("rating must be between 1 and 10, got {0}")]
    RatingOutOfRange(i64),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("age must be 18 or older, got {0}")]
    UnderAge(u32),

    #[error("at least one photo is required")]
    NoPhotos,

    #[error("no photo with id {0}")]
    UnknownPhoto(String),

    #[error("no candidate is being presented")]
    NoCandidate,

    #[error("no pending intent to confirm")]
    NoPendingIntent,

    #[error("a decision is already open for candidate {0}")]
    IntentAlreadyOpen(String),

    #[error("a rating submission is already in flight")]
    SubmissionInFlight,

    #[error("no identity stored; create a profile first")]
    NoIdentity,
}

/// Normalized error shape handed to UI-level callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub status_code: i32,
}

impl Error {
    /// Build a service error from a status and an optional server message
    pub fn service(status: u16, message: Option<String>) -> Self {
        Error::Service {
            message: message.unwrap_or_else(|| "Server error".to_string()),
            status,
        }
    }

    /// Status code in the normalized shape
    pub fn status_code(&self) -> i32 {
        match self {
            Error::Transport(_) => STATUS_TRANSPORT,
            Error::Service { status, .. } => i32::from(*status),
            Error::Unknown(_) => STATUS_UNKNOWN,
            Error::Validation(_) => STATUS_VALIDATION,
            Error::Storage(_) => STATUS_UNKNOWN,
        }
    }

    /// Normalize into `{message, status_code}`
    pub fn info(&self) -> ErrorInfo {
        let message = match self {
            Error::Transport(_) => "Network error - cannot connect to server".to_string(),
            Error::Service { message, .. } => message.clone(),
            Error::Unknown(detail) => detail.clone(),
            Error::Validation(v) => v.to_string(),
            Error::Storage(detail) => detail.clone(),
        };
        ErrorInfo {
            message,
            status_code: self.status_code(),
        }
    }

    /// True for failures detected before any request was made
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Storage(_))
    }
}

impl From<Error> for ErrorInfo {
    fn from(err: Error) -> Self {
        err.info()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_normalizes_to_zero() {
        let info = Error::Transport("connection refused".into()).info();
        assert_eq!(info.status_code, 0);
        assert!(info.message.contains("Network error"));
    }

    #[test]
    fn test_service_keeps_server_message() {
        let info = Error::service(404, Some("User not found".into())).info();
        assert_eq!(info.status_code, 404);
        assert_eq!(info.message, "User not found");
    }

    #[test]
    fn test_service_without_message_defaults() {
        let info = Error::service(500, None).info();
        assert_eq!(info.message, "Server error");
    }

    #[test]
    fn test_unknown_is_minus_one() {
        assert_eq!(Error::Unknown("garbled".into()).status_code(), -1);
    }

    #[test]
    fn test_validation_is_local() {
        let err: Error = ValidationError::CapacityExceeded { cap: 6 }.into();
        assert!(err.is_local());
        assert_eq!(err.info().message, "photo collection is full (max 6)");
        assert!(!Error::Transport("x".into()).is_local());
    }
}
