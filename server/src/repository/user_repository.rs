//! # User Repository
//!
//! Data access for the `users` collection (entity: [`crate::domain::User`])
//! and its cascading owned records. Deletion is a hard cascade delete, not
//! the soft-delete pattern used elsewhere in the corpus: deleting a user
//! removes all of its owned records, with no account-recovery requirement
//! to justify a `deleted_at` tombstone.

use shared::errors::ApiError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{EnglishLevel, NewUser, User};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, password_salt)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.password_salt)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("users_username_key") {
                    return ApiError::UsernameTaken;
                }
            }
            ApiError::StoreUnavailable(e)
        })
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)
    }

    /// Reads the user row locked `FOR UPDATE` within an open transaction, so
    /// a concurrent `submit_quiz` for the same user blocks at the store
    /// level rather than racing — this row lock is what actually enforces
    /// per-user serializability.
    pub async fn find_by_id_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(ApiError::StoreUnavailable)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        Ok(count.0 > 0)
    }

    pub async fn touch_last_login(&self, user_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        Ok(())
    }

    pub async fn rename(&self, user_id: Uuid, new_username: &str) -> Result<(), ApiError> {
        let result = sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(new_username)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e {
                    if db_err.constraint() == Some("users_username_key") {
                        return ApiError::UsernameTaken;
                    }
                }
                ApiError::StoreUnavailable(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound {
                resource: format!("user:{user_id}"),
            });
        }

        Ok(())
    }

    pub async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE users SET password_hash = $1, password_salt = $2 WHERE id = $3",
        )
        .bind(password_hash)
        .bind(password_salt)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::StoreUnavailable)?;

        Ok(())
    }

    /// Applies the atomic update within an already-open transaction:
    /// rewrites the running aggregates and, when the level changed,
    /// `english_level`. Called alongside [`crate::repository::QuizRepository::insert_in_tx`]
    /// so the quiz insert and user mutation commit together.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_quiz_submission_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        total_quizzes: i64,
        average_score: f64,
        progress: &std::collections::HashMap<String, f64>,
        has_completed_first_quiz: bool,
        new_level: EnglishLevel,
    ) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE users
            SET total_quizzes = $1,
                average_score = $2,
                progress = $3,
                has_completed_first_quiz = $4,
                english_level = $5
            WHERE id = $6
            "#,
        )
        .bind(total_quizzes)
        .bind(average_score)
        .bind(Json(progress))
        .bind(has_completed_first_quiz)
        .bind(new_level)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(ApiError::StoreUnavailable)?;

        Ok(())
    }

    /// Corrects the cached aggregate fields when the analytics aggregator
    /// finds them out of step with the quiz records: the aggregator is
    /// authoritative and corrects the user record as a side effect.
    pub async fn correct_cached_aggregates(
        &self,
        user_id: Uuid,
        total_quizzes: i64,
        average_score: f64,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET total_quizzes = $1, average_score = $2 WHERE id = $3")
            .bind(total_quizzes)
            .bind(average_score)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        Ok(())
    }

    /// Deletes the user; `ON DELETE CASCADE` foreign keys remove owned
    /// quizzes, sessions, and Q&A entries.
    pub async fn delete(&self, user_id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::StoreUnavailable)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound {
                resource: format!("user:{user_id}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_struct() {
        let new_user = NewUser {
            username: "test_435".to_string(),
            password_hash: "hash".to_string(),
            password_salt: "salt".to_string(),
        };
        assert_eq!(new_user.username, "test_435");
    }
}
