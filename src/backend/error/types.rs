/**
 * Backend Error Types
 *
 * The HTTP-facing error enum. Domain errors from the verifier, the delivery
 * coordinator and the stores convert into it with `?`, and each one knows
 * which status code it maps to.
 *
 * # Status Code Mapping
 *
 * | Error | Status |
 * |---|---|
 * | `AuthError::UnknownUser` | 404 |
 * | `AuthError::Store` | 500 |
 * | other `AuthError` | 401 |
 * | `SendError::Empty`, `SelfTarget`, `Invalid` | 400 |
 * | `SendError::UnknownReceiver` | 404 |
 * | `SendError::ImageUpload` | 502 |
 * | `SendError::Persistence` | 500 |
 * | `StoreError` | 500 |
 */
use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::auth::AuthError;
use crate::backend::messaging::SendError;
use crate::backend::store::StoreError;
use crate::shared::SharedError;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status (e.g. 404 for a missing user)
    #[error("Handler error: {message}")]
    HandlerError { status: StatusCode, message: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Auth(err) => match err {
                AuthError::UnknownUser => StatusCode::NOT_FOUND,
                AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::Missing | AuthError::Invalid | AuthError::Expired => StatusCode::UNAUTHORIZED,
            },
            Self::Send(err) => match err {
                SendError::Empty | SendError::SelfTarget | SendError::Invalid(_) => StatusCode::BAD_REQUEST,
                SendError::UnknownReceiver => StatusCode::NOT_FOUND,
                SendError::ImageUpload(_) => StatusCode::BAD_GATEWAY,
                SendError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } | SharedError::EmptyMessage => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client
    ///
    /// Internal failures are not echoed verbatim; they are logged instead.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Store(_) | Self::SerializationError(_) => "Internal Server Error".to_string(),
            Self::Auth(AuthError::Store(_)) => "Internal Server Error".to_string(),
            Self::Send(SendError::Persistence(_)) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::NOT_FOUND, "User not found");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "User not found");
    }

    #[test]
    fn test_auth_status_mapping() {
        assert_eq!(BackendError::from(AuthError::Missing).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BackendError::from(AuthError::Expired).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(BackendError::from(AuthError::UnknownUser).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BackendError::from(AuthError::Store("down".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_send_status_mapping() {
        assert_eq!(BackendError::from(SendError::Empty).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BackendError::from(SendError::SelfTarget).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(BackendError::from(SendError::UnknownReceiver).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BackendError::from(SendError::ImageUpload("x".to_string())).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BackendError::from(SendError::Persistence("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_send_messages_are_user_facing() {
        assert_eq!(
            BackendError::from(SendError::Empty).message(),
            "Message must contain text or an image"
        );
        assert_eq!(
            BackendError::from(SendError::Persistence("connection reset".to_string())).message(),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_from_shared_error() {
        let backend_error: BackendError = SharedError::validation("field", "message").into();
        assert_eq!(backend_error.status_code(), StatusCode::BAD_REQUEST);
    }
}
