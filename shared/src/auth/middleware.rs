//! # Session Authentication Extractor for Actix-web
//!
//! Extracts and validates the bearer session token from HTTP requests.
//!
//! ## Overview
//!
//! Unlike a stateless JWT, the session token is opaque and
//! store-backed: validating it requires a lookup (and, lazily, an expiry
//! check) against the document store. This module does not own that lookup;
//! it depends on a [`SessionValidator`] injected as `app_data`, which the
//! server crate implements against its session repository.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shared::auth::{AuthenticatedUser, SessionValidator};
//!
//! async fn get_profile(user: AuthenticatedUser) -> impl Responder {
//!     format!("Hello, {}!", user.username)
//! }
//! ```
//!
//! The extractor pulls `Authorization: Bearer <token>` from the request,
//! resolves a `web::Data<Arc<dyn SessionValidator>>` from app data, and
//! awaits `validate_session`. Missing header, malformed header, or an
//! invalid/expired/revoked token all surface as `ApiError::Unauthenticated`
//! ("fails `unauthenticated`").

use crate::errors::ApiError;
use actix_web::{web, FromRequest, HttpRequest};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

/// The principal attached to a request once its session token validates
/// (`validate(token) -> principal`).
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub english_level: String,
    pub has_completed_first_quiz: bool,
}

/// Dependency injected by the server crate to resolve a bearer token into an
/// [`AuthenticatedUser`]. Kept as a trait so tests can substitute an
/// in-memory fake ("store and LLM clients are injected dependencies").
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate_session(&self, token: &str) -> Result<AuthenticatedUser, ApiError>;
}

/// Extracts the bearer token from an `Authorization` header value.
///
/// Accepts exactly `Bearer <token>`; anything else is treated as missing.
pub fn extract_bearer_token(header_value: &str) -> Result<&str, ApiError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthenticated)
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let header_value = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or(ApiError::Unauthenticated)?;

            let token = extract_bearer_token(header_value)?;

            let validator = req
                .app_data::<web::Data<Arc<dyn SessionValidator>>>()
                .ok_or_else(|| ApiError::Internal {
                    message: "session validator not configured".to_string(),
                })?;

            validator
                .validate_session(token)
                .await
                .map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token_valid() {
        assert_eq!(extract_bearer_token("Bearer abc123").unwrap(), "abc123");
    }

    #[test]
    fn test_extract_bearer_token_missing_prefix() {
        assert!(extract_bearer_token("abc123").is_err());
    }

    #[test]
    fn test_extract_bearer_token_empty() {
        assert!(extract_bearer_token("Bearer ").is_err());
        assert!(extract_bearer_token("Bearer").is_err());
    }
}
