//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Access denied (bad signature, expired link, failed safety re-check).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found. Also covers invalid tokens, so callers cannot
    /// distinguish "bad token" from "no such resource".
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error on caller input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream fetch returned a failure status (proxy mode).
    #[error("Upstream returned status {0}")]
    Upstream(u16),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            Self::Upstream(status) => *status,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
