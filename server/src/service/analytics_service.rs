//! # Analytics Aggregator
//!
//! Derives dashboard projections from the `quizzes` collection itself,
//! never from the cached fields on `users` — those fields exist only as a
//! fast path for other reads ("the result must equal the cached
//! fields... if it does not, the aggregator is authoritative and corrects
//! the user record as a side effect"). Shares its topic-percentage formula
//! with [`crate::service::progression_service::ProgressionService::topic_progress`]
//! so the bit-identical consistency contract holds by
//! construction rather than by coincidence.

use std::collections::HashMap;

use shared::errors::ApiError;
use uuid::Uuid;

use crate::domain::{EnglishLevel, Quiz, User};
use crate::repository::{QuizRepository, UserRepository};
use crate::service::progression_service::ProgressionService;

/// `profile(user_id)`'s response shape ("user projection"): every
/// `User` field the client is allowed to see. `password_hash`/`password_salt`
/// are deliberately excluded.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    pub english_level: EnglishLevel,
    pub has_completed_first_quiz: bool,
    pub total_quizzes: i64,
    pub average_score: f64,
    pub progress: HashMap<String, f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_login: chrono::DateTime<chrono::Utc>,
}

/// `performance(user_id)`'s response shape.
#[derive(Debug, Clone)]
pub struct BasicPerformance {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub english_level: EnglishLevel,
}

/// One row of `performance_detailed`'s chronological quiz list.
#[derive(Debug, Clone)]
pub struct QuizHistoryEntry {
    pub quiz_number: usize,
    pub score: i32,
    pub topic: String,
    pub difficulty: EnglishLevel,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// `performance_detailed(user_id)`'s response shape.
#[derive(Debug, Clone)]
pub struct DetailedPerformance {
    pub basic: BasicPerformance,
    pub topic_performance: HashMap<String, f64>,
    pub level_counts: HashMap<EnglishLevel, i64>,
    pub history: Vec<QuizHistoryEntry>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    users: UserRepository,
    quizzes: QuizRepository,
}

impl AnalyticsService {
    pub fn new(users: UserRepository, quizzes: QuizRepository) -> Self {
        Self { users, quizzes }
    }

    /// `GET /api/auth/profile`, `GET /api/user-profile/{user_id}`.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ApiError> {
        let user = self.fetch_user(user_id).await?;
        Ok(Self::to_profile(&user))
    }

    /// `performance`: computed from quiz records, reconciled against
    /// (and, on mismatch, used to correct) the cached `users` fields.
    pub async fn performance(&self, user_id: Uuid) -> Result<BasicPerformance, ApiError> {
        let user = self.fetch_user(user_id).await?;
        let history = self.quizzes.find_by_user(user_id).await?;

        let total_quizzes = history.len() as i64;
        let average_score = Self::mean_score(&history);

        if total_quizzes != user.total_quizzes || !Self::approx_equal(average_score, user.average_score) {
            tracing::warn!(
                user_id = %user_id,
                cached_total = user.total_quizzes,
                actual_total = total_quizzes,
                cached_average = user.average_score,
                actual_average = average_score,
                "cached user aggregates drifted from quiz records; correcting"
            );
            self.users
                .correct_cached_aggregates(user_id, total_quizzes, average_score)
                .await?;
        }

        Ok(BasicPerformance {
            total_quizzes,
            average_score,
            english_level: user.english_level,
        })
    }

    /// `performance_detailed`: basic metrics plus per-topic means,
    /// per-level attempt counts, and the full chronological history.
    pub async fn performance_detailed(&self, user_id: Uuid) -> Result<DetailedPerformance, ApiError> {
        let basic = self.performance(user_id).await?;
        let history = self.quizzes.find_by_user(user_id).await?;

        let topic_performance = ProgressionService::topic_progress(&history);
        let level_counts = Self::count_by_level(&history);
        let history = history
            .iter()
            .enumerate()
            .map(|(i, q)| QuizHistoryEntry {
                quiz_number: i + 1,
                score: q.score,
                topic: q.topic.clone(),
                difficulty: q.difficulty,
                timestamp: q.timestamp,
            })
            .collect();

        Ok(DetailedPerformance {
            basic,
            topic_performance,
            level_counts,
            history,
        })
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user:{user_id}"),
            })
    }

    fn to_profile(user: &User) -> UserProfile {
        UserProfile {
            user_id: user.id,
            username: user.username.clone(),
            english_level: user.english_level,
            has_completed_first_quiz: user.has_completed_first_quiz,
            total_quizzes: user.total_quizzes,
            average_score: user.average_score,
            progress: user.progress.0.clone(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }

    fn mean_score(history: &[Quiz]) -> f64 {
        if history.is_empty() {
            return 0.0;
        }
        let sum: i64 = history.iter().map(|q| q.score as i64).sum();
        sum as f64 / history.len() as f64
    }

    fn count_by_level(history: &[Quiz]) -> HashMap<EnglishLevel, i64> {
        let mut counts = HashMap::new();
        for quiz in history {
            *counts.entry(quiz.difficulty).or_insert(0) += 1;
        }
        counts
    }

    /// Floating-point averages are compared with a small epsilon rather than
    /// bit equality, since `average_score` is persisted and recomputed
    /// through different arithmetic paths (incremental update vs. full
    /// scan) that can differ in the last bit without representing real drift.
    fn approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    fn quiz(score: i32, topic: &str, difficulty: EnglishLevel) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quiz_type: crate::domain::QuizType::Adaptive,
            topic: topic.to_string(),
            difficulty,
            score,
            questions: Json(vec![]),
            topic_performance: Json(HashMap::new()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_mean_score_empty_is_zero() {
        assert_eq!(AnalyticsService::mean_score(&[]), 0.0);
    }

    #[test]
    fn test_mean_score_averages_correctly() {
        let history = vec![
            quiz(100, "Grammar", EnglishLevel::Beginner),
            quiz(50, "Grammar", EnglishLevel::Beginner),
        ];
        assert_eq!(AnalyticsService::mean_score(&history), 75.0);
    }

    #[test]
    fn test_count_by_level() {
        let history = vec![
            quiz(80, "Grammar", EnglishLevel::Beginner),
            quiz(80, "Grammar", EnglishLevel::Intermediate),
            quiz(80, "Grammar", EnglishLevel::Beginner),
        ];
        let counts = AnalyticsService::count_by_level(&history);
        assert_eq!(counts.get(&EnglishLevel::Beginner), Some(&2));
        assert_eq!(counts.get(&EnglishLevel::Intermediate), Some(&1));
    }

    #[test]
    fn test_approx_equal() {
        assert!(AnalyticsService::approx_equal(75.0, 75.0000000001));
        assert!(!AnalyticsService::approx_equal(75.0, 76.0));
    }
}
