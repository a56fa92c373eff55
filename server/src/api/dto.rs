//! # API Data Transfer Objects
//!
//! Request/response shapes for every endpoint of the external interface.
//! Field names are snake_case on the wire (`user_id`, `session_token`,
//! `english_level`, `num_questions`, `quiz_data`, `topic_performance`, …) —
//! unlike `auth-service`, which uses camelCase for its own contract.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{EnglishLevel, QuizType};
use crate::service::analytics_service::{BasicPerformance, DetailedPerformance, UserProfile};
use crate::service::progression_service::{LevelChangeType, SubmissionResult};
use crate::service::session_service::AuthenticatedSession;

// =============================================================================
// COMMON ENVELOPE
// =============================================================================

/// The success half of the uniform `{success, data?, error?}` envelope
/// (; the error half lives in [`shared::errors::ErrorEnvelope`]).
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// `{success: bool}` with no `data`, for endpoints that return only a status
/// (`logout`, `profile/username`, `profile/password`, `profile` delete).
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// `signup`/`signin` response (`{user_id, session_token, username, english_level}`).
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub session_token: String,
    pub username: String,
    pub english_level: EnglishLevel,
}

impl From<AuthenticatedSession> for AuthResponse {
    fn from(session: AuthenticatedSession) -> Self {
        Self {
            user_id: session.user.id,
            session_token: session.token,
            username: session.user.username,
            english_level: session.user.english_level,
        }
    }
}

/// `GET /api/auth/validate` response.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user_id: Uuid,
    pub username: String,
    pub english_level: String,
    pub has_completed_first_quiz: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeUsernameRequest {
    #[validate(length(min = 3, max = 20))]
    pub new_username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1))]
    pub password: String,
}

/// User projection shared by `profile`/`user-profile/{user_id}`.
#[derive(Debug, Serialize)]
pub struct UserProfileDto {
    pub user_id: Uuid,
    pub username: String,
    pub english_level: EnglishLevel,
    pub has_completed_first_quiz: bool,
    pub total_quizzes: i64,
    pub average_score: f64,
    pub progress: HashMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl From<UserProfile> for UserProfileDto {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            username: p.username,
            english_level: p.english_level,
            has_completed_first_quiz: p.has_completed_first_quiz,
            total_quizzes: p.total_quizzes,
            average_score: p.average_score,
            progress: p.progress,
            created_at: p.created_at,
            last_login: p.last_login,
        }
    }
}

// =============================================================================
// QUIZ TOPICS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TopicDto {
    pub name: String,
    pub subtopics: Vec<String>,
    pub levels: Vec<EnglishLevel>,
}

#[derive(Debug, Serialize)]
pub struct QuizTopicsResponse {
    pub topics: Vec<TopicDto>,
}

// =============================================================================
// QUIZ GENERATION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    pub topic: Option<String>,
    pub num_questions: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QuestionDto {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub topic: String,
    pub difficulty: EnglishLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub questions: Vec<QuestionDto>,
}

// =============================================================================
// QUIZ SUBMISSION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmittedQuestionDto {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub user_answer: String,
    pub explanation: String,
    pub topic: String,
    #[serde(default)]
    pub passage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuizDataDto {
    pub questions: Vec<SubmittedQuestionDto>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateQuizRequest {
    pub quiz_data: QuizDataDto,
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<EnglishLevel>,
    #[serde(default)]
    pub quiz_type: Option<QuizType>,
}

/// `progression`/`retrocession`, the direction of a level change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelChangeTypeDto {
    Progression,
    Retrocession,
}

impl From<LevelChangeType> for LevelChangeTypeDto {
    fn from(t: LevelChangeType) -> Self {
        match t {
            LevelChangeType::Progression => Self::Progression,
            LevelChangeType::Retrocession => Self::Retrocession,
        }
    }
}

/// `evaluate_quiz`'s evaluation object.
#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub score: i32,
    pub previous_level: EnglishLevel,
    pub english_level: EnglishLevel,
    pub level_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_change_type: Option<LevelChangeTypeDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_change_message: Option<String>,
    pub total_quizzes: i64,
    pub average_score: f64,
    pub progress: HashMap<String, f64>,
    pub has_completed_first_quiz: bool,
}

impl From<SubmissionResult> for EvaluationResponse {
    fn from(r: SubmissionResult) -> Self {
        Self {
            score: r.score,
            previous_level: r.previous_level,
            english_level: r.new_level,
            level_changed: r.previous_level != r.new_level,
            level_change_type: r.level_change_type.map(LevelChangeTypeDto::from),
            level_change_message: r.level_change_message,
            total_quizzes: r.total_quizzes,
            average_score: r.average_score,
            progress: r.progress,
            has_completed_first_quiz: r.has_completed_first_quiz,
        }
    }
}

// =============================================================================
// ANALYTICS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub english_level: EnglishLevel,
}

impl From<BasicPerformance> for PerformanceResponse {
    fn from(p: BasicPerformance) -> Self {
        Self {
            total_quizzes: p.total_quizzes,
            average_score: p.average_score,
            english_level: p.english_level,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizHistoryEntryDto {
    pub quiz_number: usize,
    pub score: i32,
    pub topic: String,
    pub difficulty: EnglishLevel,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PerformanceDetailedResponse {
    pub total_quizzes: i64,
    pub average_score: f64,
    pub english_level: EnglishLevel,
    pub topic_performance: HashMap<String, f64>,
    pub level_counts: HashMap<String, i64>,
    pub history: Vec<QuizHistoryEntryDto>,
}

impl From<DetailedPerformance> for PerformanceDetailedResponse {
    fn from(p: DetailedPerformance) -> Self {
        Self {
            total_quizzes: p.basic.total_quizzes,
            average_score: p.basic.average_score,
            english_level: p.basic.english_level,
            topic_performance: p.topic_performance,
            level_counts: p
                .level_counts
                .into_iter()
                .map(|(level, count)| (level.to_string(), count))
                .collect(),
            history: p
                .history
                .into_iter()
                .map(|h| QuizHistoryEntryDto {
                    quiz_number: h.quiz_number,
                    score: h.score,
                    topic: h.topic,
                    difficulty: h.difficulty,
                    timestamp: h.timestamp,
                })
                .collect(),
        }
    }
}

// =============================================================================
// TUTOR CONVERSATION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct TeacherChatRequest {
    pub message: String,
    pub user_level: String,
    pub focus: String,
}

#[derive(Debug, Deserialize)]
pub struct AskQuestionRequest {
    pub question: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskQuestionResponse {
    pub answer: String,
}

// =============================================================================
// OPERATIONS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub current_model: String,
    pub base_url: String,
    pub timeout: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub available_models: Vec<String>,
}
