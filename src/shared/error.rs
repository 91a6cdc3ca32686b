//! Shared Error Types
//!
//! Errors that can occur on both sides of the wire: decoding frames and
//! validating message bodies. The server and the client run the same
//! validation, so a body the client accepts is never rejected for shape by
//! the server.
//!
//! # Usage
//!
//! ```rust
//! use chatline::shared::error::SharedError;
//!
//! let error = SharedError::validation("image", "image must not be blank");
//! assert!(error.to_string().contains("image"));
//! ```
use thiserror::Error;

/// Shared error types that can occur in both frontend and backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A message body carried neither text nor an image
    #[error("Message must contain text or an image")]
    EmptyMessage,

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = SharedError::validation("image", "must not be blank");
        match error {
            SharedError::ValidationError { field, message } => {
                assert_eq!(field, "image");
                assert_eq!(message, "must not be blank");
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_empty_message_display() {
        let display = SharedError::EmptyMessage.to_string();
        assert_eq!(display, "Message must contain text or an image");
    }

    #[test]
    fn test_from_serde_error() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let shared_error: SharedError = result.unwrap_err().into();

        match shared_error {
            SharedError::SerializationError { message } => assert!(message.starts_with("JSON error")),
            _ => panic!("Expected SerializationError from serde error"),
        }
    }
}
