//! # Session Repository
//!
//! Data access for the `sessions` collection. Tokens are
//! stored only as a SHA-256 hash, following the refresh-token hashing
//! pattern elsewhere in the corpus: the plaintext token is returned to the
//! client once and never persisted.

use chrono::{DateTime, Utc};
use shared::errors::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Session;

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        token_hash: &str,
        user_id: Uuid,
        username: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, ApiError> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, username, expires_at, is_active)
            VALUES ($1, $2, $3, $4, true)
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(username)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)
    }

    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, ApiError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)
    }

    /// Revokes a single session. Idempotent: revoking an already-inactive or
    /// nonexistent session is not an error (`sign_out` is idempotent).
    pub async fn revoke(&self, token_hash: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE sessions SET is_active = false WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        Ok(())
    }

    /// Revokes every active session for a user (sign-out-everywhere on
    /// password change or account deletion).
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = false WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)?;

        Ok(result.rows_affected())
    }

    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::domain::Session;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_session_validity_window() {
        let now = Utc::now();
        let session = Session {
            token_hash: "h".to_string(),
            user_id: Uuid::new_v4(),
            username: "test_435".to_string(),
            created_at: now - Duration::days(1),
            expires_at: now + Duration::days(6),
            is_active: true,
        };
        assert!(session.is_valid(now));
    }

    #[test]
    fn test_session_invalid_when_revoked() {
        let now = Utc::now();
        let session = Session {
            token_hash: "h".to_string(),
            user_id: Uuid::new_v4(),
            username: "test_435".to_string(),
            created_at: now,
            expires_at: now + Duration::days(6),
            is_active: false,
        };
        assert!(!session.is_valid(now));
    }

    #[test]
    fn test_session_invalid_when_expired() {
        let now = Utc::now();
        let session = Session {
            token_hash: "h".to_string(),
            user_id: Uuid::new_v4(),
            username: "test_435".to_string(),
            created_at: now - Duration::days(8),
            expires_at: now - Duration::days(1),
            is_active: true,
        };
        assert!(!session.is_valid(now));
    }
}
