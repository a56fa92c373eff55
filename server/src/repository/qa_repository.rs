//! # Q&A Repository
//!
//! Append-only data access for the `qa_entries` collection,
//! written by `POST /api/ask-question/`.

use shared::errors::ApiError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::QaEntry;

#[derive(Debug, Clone)]
pub struct QaRepository {
    pool: PgPool,
}

impl QaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        user_id: Uuid,
        question: &str,
        context: Option<&str>,
        answer: &str,
    ) -> Result<QaEntry, ApiError> {
        sqlx::query_as::<_, QaEntry>(
            r#"
            INSERT INTO qa_entries (user_id, question, context, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(question)
        .bind(context)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)
    }
}
