//! # Quiz Repository
//!
//! Data access for the `quizzes` collection (entity: [`crate::domain::Quiz`]),
//! indexed on `user_id` ascending and `timestamp` descending. The
//! transaction-scoped `insert_in_tx` lets [`crate::service::progression_service`]
//! commit a quiz insert and the owning user's aggregate update atomically,
//! enforcing per-user serializability through a store-side transaction.

use shared::errors::ApiError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{EnglishLevel, Question, Quiz, QuizType, TopicTally};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct QuizRepository {
    pool: PgPool,
}

/// Fields required to record a completed quiz attempt.
pub struct NewQuiz {
    pub user_id: Uuid,
    pub quiz_type: QuizType,
    pub topic: String,
    pub difficulty: EnglishLevel,
    pub score: i32,
    pub questions: Vec<Question>,
    pub topic_performance: HashMap<String, TopicTally>,
}

impl QuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        new_quiz: NewQuiz,
    ) -> Result<Quiz, ApiError> {
        sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (
                user_id, quiz_type, topic, difficulty, score, questions, topic_performance
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_quiz.user_id)
        .bind(new_quiz.quiz_type)
        .bind(&new_quiz.topic)
        .bind(new_quiz.difficulty)
        .bind(new_quiz.score)
        .bind(Json(new_quiz.questions))
        .bind(Json(new_quiz.topic_performance))
        .fetch_one(&mut **tx)
        .await
        .map_err(ApiError::StoreUnavailable)
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, ApiError> {
        self.pool.begin().await.map_err(ApiError::StoreUnavailable)
    }

    /// Reads a user's full quiz history in submission order within an
    /// already-open transaction, so the progression engine's window replay
    /// sees a consistent snapshot alongside the row lock taken on
    /// the user.
    pub async fn find_by_user_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Vec<Quiz>, ApiError> {
        sqlx::query_as::<_, Quiz>(
            "SELECT * FROM quizzes WHERE user_id = $1 ORDER BY timestamp ASC",
        )
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(ApiError::StoreUnavailable)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Quiz>, ApiError> {
        sqlx::query_as::<_, Quiz>(
            "SELECT * FROM quizzes WHERE user_id = $1 ORDER BY timestamp ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)
    }

    /// The most recent `limit` questions a user has been asked, used as the
    /// quiz orchestrator's avoid-repeat context.
    pub async fn recent_questions(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Question>, ApiError> {
        let rows = sqlx::query_as::<_, Quiz>(
            "SELECT * FROM quizzes WHERE user_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)?;

        Ok(rows.into_iter().flat_map(|q| q.questions.0).collect())
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quizzes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        Ok(count.0)
    }

    pub async fn average_score_for_user(&self, user_id: Uuid) -> Result<f64, ApiError> {
        let row: (Option<f64>,) =
            sqlx::query_as("SELECT AVG(score)::float8 FROM quizzes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::StoreUnavailable)?;

        Ok(row.0.unwrap_or(0.0))
    }
}
