//! # Application Error Types
//!
//! Unified error handling with automatic HTTP conversion, of the
//! error-handling design: every handler surfaces a structured
//! `{success: false, error: {kind, message}}` envelope.
//!
//! ## Error Categories
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ invalid_input (400) │ unauthenticated (401) │ forbidden (403)            │
//! │ not_found (404)     │ conflict (409)        │ store_unavailable (503)    │
//! │ internal (500)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ai_unavailable` is deliberately absent from this enum: LLM failures are
//! contained inside the quiz orchestrator and tutor conversation, which
//! degrade to a fallback quiz or an apologetic reply and return 200 rather
//! than raising to the request surface.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Result type alias for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;

/// Application error type with automatic HTTP status mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body failed validation rules (`validator` crate).
    /// Returns 400.
    #[error("Validation error")]
    ValidationError(#[from] ValidationErrors),

    /// Generic invalid input with a custom message: bad username pattern,
    /// malformed quiz structure, unrecognized topic, etc. Returns 400.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// `username` already claimed. Returns 409.
    #[error("Username already taken")]
    UsernameTaken,

    /// Wrong username/password, or no valid session. Returns 401.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Session token missing, expired, or revoked. Returns 401.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Authenticated principal may not act on this resource. Returns 403.
    #[error("Forbidden")]
    Forbidden,

    /// Requested resource doesn't exist. Returns 404.
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Action would violate a uniqueness constraint. Returns 409.
    #[error("Conflict: {resource}")]
    Conflict { resource: String },

    /// The document store could not service the request in time.
    /// Returns 503.
    #[error("Store unavailable")]
    StoreUnavailable(#[from] sqlx::Error),

    /// Unspecified internal error. Returns 500.
    #[error("Internal server error")]
    Internal { message: String },
}

impl ApiError {
    /// Machine-readable error kind, matching its `kind` field exactly.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationError(_) | Self::InvalidInput { .. } => "invalid_input",
            Self::UsernameTaken => "conflict",
            Self::InvalidCredentials => "unauthenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::UsernameTaken | Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Internal { .. })
    }
}

/// The `error` field of the uniform `{success, data?, error?}` envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn from_error(error: &ApiError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Top-level response envelope for error paths: `{success: false, error}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(error: &ApiError) -> Self {
        Self {
            success: false,
            error: ErrorBody::from_error(error),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind(), "request rejected");
        }
        HttpResponse::build(self.status_code()).json(ErrorEnvelope::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_match_spec_table() {
        assert_eq!(ApiError::InvalidInput { message: "x".into() }.kind(), "invalid_input");
        assert_eq!(ApiError::Unauthenticated.kind(), "unauthenticated");
        assert_eq!(ApiError::Forbidden.kind(), "forbidden");
        assert_eq!(ApiError::NotFound { resource: "user".into() }.kind(), "not_found");
        assert_eq!(ApiError::Conflict { resource: "username".into() }.kind(), "conflict");
        assert_eq!(ApiError::Internal { message: "x".into() }.kind(), "internal");
    }

    #[test]
    fn test_status_codes_match_spec_table() {
        assert_eq!(ApiError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound { resource: "user".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::UsernameTaken.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal { message: "x".into() }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_flagged() {
        assert!(ApiError::Internal { message: "x".into() }.is_server_error());
        assert!(!ApiError::Unauthenticated.is_server_error());
        assert!(!ApiError::NotFound { resource: "x".into() }.is_server_error());
    }
}
