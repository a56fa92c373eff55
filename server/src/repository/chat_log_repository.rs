//! # Chat Log Repository
//!
//! Append-only data access for the `chat_log_entries` collection (
//! `ChatSession`: "stateless endpoint semantics make this a convenience log
//! only"). Never read back by the tutor conversation itself; the client
//! remains the source of truth for history.

use shared::errors::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::ChatLogEntry;

#[derive(Debug, Clone)]
pub struct ChatLogRepository {
    pool: PgPool,
}

impl ChatLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        user_id: Uuid,
        role: &str,
        content: &str,
    ) -> Result<ChatLogEntry, ApiError> {
        sqlx::query_as::<_, ChatLogEntry>(
            r#"
            INSERT INTO chat_log_entries (user_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(role)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)
    }
}
