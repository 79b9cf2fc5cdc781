//! Error types for the spanlog core.
//!
//! Store mutations never fail: malformed input is skipped and logged, and
//! listener panics are contained at the notification boundary. Errors only
//! surface from configuration validation and feed decoding.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in spanlog core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration rejected by validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected setting.
        message: String,
    },

    /// Ingestion entry references an unusable span id.
    #[error("invalid span id: {span_id:?}")]
    InvalidSpanId {
        /// The offending span id.
        span_id: String,
    },

    /// Transport payload could not be decoded.
    #[error("feed decode error: {0}")]
    Feed(#[from] serde_json::Error),

    /// I/O error while reading a feed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid span id error.
    pub fn invalid_span_id(span_id: impl Into<String>) -> Self {
        Self::InvalidSpanId {
            span_id: span_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = CoreError::invalid_config("ratio must be below 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: ratio must be below 1"
        );

        let err = CoreError::invalid_span_id("");
        assert_eq!(err.to_string(), "invalid span id: \"\"");
    }

    #[test]
    fn from_serde_json() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Feed(_)));
    }
}
