/// Unified error types for the moderation service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the moderation service
#[derive(Error, Debug)]
pub enum RelmonError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors (actor is not an administrator)
    #[error("Not authorized: {0}")]
    Authorization(String),

    /// Validation errors on submitted forms
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested state is outside the allowed set
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (uniqueness rejected by the store)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelmonError {
    /// True when the underlying storage error is a UNIQUE constraint rejection
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RelmonError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert RelmonError to HTTP response
impl IntoResponse for RelmonError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            RelmonError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            RelmonError::Authorization(_) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                self.to_string(),
            ),
            RelmonError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            RelmonError::InvalidState(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "InvalidState",
                self.to_string(),
            ),
            RelmonError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            RelmonError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            RelmonError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            RelmonError::Database(_) | RelmonError::Internal(_) | RelmonError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for moderation operations
pub type RelmonResult<T> = Result<T, RelmonError>;
