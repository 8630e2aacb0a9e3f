//! Crate-wide error type.

use sea_orm::DbErr;
use thiserror::Error;

use crate::http::HttpError;

/// Errors surfaced by every omg operation.
///
/// Each variant is one failure kind; the attached message is meant for humans.
#[derive(Debug, Error)]
pub enum OmgError {
    /// Network or protocol failure while talking to a remote endpoint.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed JSON, an unexpected document shape, or a bad pattern.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local store failure (open, prepare, step).
    #[error("Store error: {0}")]
    Store(#[from] DbErr),

    /// The fixed-capacity query buffer would have overflowed.
    #[error("Query buffer too small when appending {step}: need {needed} bytes, capacity {capacity}")]
    BufferTooSmall {
        capacity: usize,
        needed: usize,
        step: &'static str,
    },

    /// The API (or the local store) does not know the requested resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rejected our credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Any other non-success API status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// File or allocation failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OmgError {
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify a non-success HTTP status.
    ///
    /// `message` is whatever human-readable text the body carried.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(message),
            _ => Self::Api { status, message },
        }
    }
}

impl From<HttpError> for OmgError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::OutOfMemory { .. } | HttpError::File { .. } => {
                Self::Internal(err.to_string())
            }
            HttpError::Transport(_) | HttpError::NoMockResponse { .. } => {
                Self::Transport(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for OmgError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<regex::Error> for OmgError {
    fn from(err: regex::Error) -> Self {
        Self::Decode(format!("invalid pattern: {err}"))
    }
}

/// Result type alias for omg operations.
pub type Result<T> = std::result::Result<T, OmgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_classifies_auth_and_not_found() {
        assert!(matches!(
            OmgError::from_status(401, "Bad credentials"),
            OmgError::Auth(_)
        ));
        assert!(matches!(
            OmgError::from_status(403, "forbidden"),
            OmgError::Auth(_)
        ));
        assert!(matches!(
            OmgError::from_status(404, "Not Found"),
            OmgError::NotFound(_)
        ));
        match OmgError::from_status(422, "Validation Failed") {
            OmgError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation Failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn http_errors_map_to_transport_or_internal() {
        let err: OmgError = HttpError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, OmgError::Transport(_)));
        assert!(err.to_string().contains("connection reset"));

        let err: OmgError = HttpError::OutOfMemory {
            requested: 10,
            buffered: 5,
        }
        .into();
        assert!(matches!(err, OmgError::Internal(_)));

        let err: OmgError = HttpError::File {
            path: "/nope/out.bin".to_string(),
            message: "permission denied".to_string(),
        }
        .into();
        assert!(matches!(err, OmgError::Internal(_)));
    }

    #[test]
    fn json_errors_are_decode_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: OmgError = json_err.into();
        assert!(matches!(err, OmgError::Decode(_)));
    }

    #[test]
    fn buffer_too_small_message_names_the_step() {
        let err = OmgError::BufferTooSmall {
            capacity: 512,
            needed: 900,
            step: "keyword",
        };
        let msg = err.to_string();
        assert!(msg.contains("keyword"));
        assert!(msg.contains("512"));
        assert!(msg.contains("900"));
    }
}
