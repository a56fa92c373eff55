//! # Domain Entities
//!
//! The five store-backed entities of the data model: [`User`], [`Quiz`],
//! [`Session`], [`QaEntry`], and [`ChatLogEntry`]. All JSON-shaped fields
//! (quiz questions, per-topic progress, per-topic performance) are stored as
//! JSONB columns and mapped here through [`sqlx::types::Json`], mirroring the
//! `options`/`correct_answers` JSONB fields of the assessments domain.
//!
//! Ownership: a [`User`] owns its [`Quiz`], [`Session`], and [`QaEntry`]
//! records by `user_id`; deleting the user cascades (`ON DELETE CASCADE`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// A learner's current placement. Ordered: `Beginner < Intermediate < Advanced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnglishLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl EnglishLevel {
    pub fn advance(self) -> Option<Self> {
        match self {
            Self::Beginner => Some(Self::Intermediate),
            Self::Intermediate => Some(Self::Advanced),
            Self::Advanced => None,
        }
    }

    pub fn demote(self) -> Option<Self> {
        match self {
            Self::Beginner => None,
            Self::Intermediate => Some(Self::Beginner),
            Self::Advanced => Some(Self::Intermediate),
        }
    }
}

impl fmt::Display for EnglishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{s}")
    }
}

impl Default for EnglishLevel {
    fn default() -> Self {
        Self::Beginner
    }
}

impl std::str::FromStr for EnglishLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unrecognized english level: {other}")),
        }
    }
}

/// The recognized topic set, plus `Mixed` (server-selected). Kept as a plain
/// string on the wire and in storage rather than a closed enum, since the
/// fallback bank and LLM-generated questions both stamp arbitrary topic
/// strings that must round-trip unchanged.
pub const RECOGNIZED_TOPICS: [&str; 5] =
    ["Grammar", "Vocabulary", "Reading", "Tenses", "Pronunciation"];

pub const MIXED_TOPIC: &str = "Mixed";

/// Quiz type: server-curated static set vs. LLM-generated adaptive quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    Static,
    Adaptive,
}

/// A single multiple-choice item, as it lives inside a [`Quiz`]'s JSONB
/// `questions` column and as it is returned from quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    /// Exactly 4 entries, invariant enforced at the orchestrator/progression
    /// boundary rather than in this type ("options (exactly 4 strings)").
    pub options: Vec<String>,
    pub correct_answer: String,
    /// Present only once evaluated; absent on freshly generated questions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_correct: Option<bool>,
    pub explanation: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub passage: Option<String>,
}

/// Per-topic correctness tally for a single quiz (`topic_performance`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TopicTally {
    pub correct: i32,
    pub total: i32,
}

/// A completed quiz attempt.
#[derive(Debug, Clone, FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_type: QuizType,
    pub topic: String,
    pub difficulty: EnglishLevel,
    pub score: i32,
    pub questions: Json<Vec<Question>>,
    pub topic_performance: Json<HashMap<String, TopicTally>>,
    pub timestamp: DateTime<Utc>,
}

/// A learner account.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
    pub english_level: EnglishLevel,
    pub has_completed_first_quiz: bool,
    pub total_quizzes: i64,
    pub average_score: f64,
    pub progress: Json<HashMap<String, f64>>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Fields required to insert a new user via `register`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
}

/// A bearer session binding.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Session {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }
}

/// An append-only question/answer record from `POST /api/ask-question/`.
#[derive(Debug, Clone, FromRow)]
pub struct QaEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub context: Option<String>,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// A convenience log of a chat turn (stateless endpoint,
/// transcript kept only for incidental record-keeping, never read back by
/// `chat`/`teacher-chat` themselves).
#[derive(Debug, Clone, FromRow)]
pub struct ChatLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
