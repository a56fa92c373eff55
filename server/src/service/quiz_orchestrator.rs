//! # Quiz Orchestrator
//!
//! Drives the adaptive-quiz generation pipeline end to end: topic/level
//! selection, avoid-list lookup, prompt build, a timeout-bounded LLM call,
//! defensive parsing, one bounded retry, and deterministic fallback to the
//! curated question bank. Returns an unpersisted `Vec<Question>` — nothing
//! is written to the `quizzes` collection until the learner submits
//! answers — that write belongs to the progression engine.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use shared::{config::LlmConfig, errors::ApiError};
use tokio::time::timeout;
use uuid::Uuid;

use crate::domain::{EnglishLevel, Question, RECOGNIZED_TOPICS};
use crate::fallback::select_fallback_questions;
use crate::llm::{
    build_quiz_prompt, build_retry_prompt, parse_and_validate, LlmClient, ParseError, QuizPromptSpec,
};
use crate::repository::{QuizRepository, UserRepository};

/// How many of the user's most recent questions are shown to the model as
/// an avoid-list.
const AVOID_LIST_SIZE: i64 = 10;

/// A failed LLM call or parse attempt, carrying the raw completion text
/// (when one was received) so a retry can show the model its own prior
/// output alongside the rejection reason.
struct CallFailure {
    reason: String,
    raw: Option<String>,
}

#[derive(Clone)]
pub struct QuizOrchestrator {
    users: UserRepository,
    quizzes: QuizRepository,
    llm: Arc<dyn LlmClient>,
    llm_config: LlmConfig,
}

impl QuizOrchestrator {
    pub fn new(
        users: UserRepository,
        quizzes: QuizRepository,
        llm: Arc<dyn LlmClient>,
        llm_config: LlmConfig,
    ) -> Self {
        Self {
            users,
            quizzes,
            llm,
            llm_config,
        }
    }

    /// `generate_quiz`: `topic` of `None` or `Mixed` spreads
    /// `num_questions` across the user's weakest topics; a named topic is
    /// honored as-is. Falls back to the static bank on any LLM or
    /// validation failure after one retry.
    pub async fn generate_quiz(
        &self,
        user_id: Uuid,
        topic: Option<&str>,
        num_questions: Option<u32>,
    ) -> Result<Vec<Question>, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("user:{user_id}"),
            })?;

        let num_questions = num_questions.unwrap_or(self.llm_config.default_quiz_questions).max(1);
        let topics = Self::select_topics(topic, &user.progress.0);
        let avoid = self.quizzes.recent_questions(user_id, AVOID_LIST_SIZE).await?;

        let spec = QuizPromptSpec {
            level: user.english_level,
            topics: &topics,
            num_questions,
            avoid: &avoid,
        };

        match self.generate_via_llm(&spec).await {
            Ok(questions) => Ok(questions),
            Err(reason) => {
                tracing::warn!(
                    user_id = %user_id,
                    reason = %reason,
                    "quiz generation fell back to the static question bank"
                );
                let fallback_topic = topic.unwrap_or(crate::domain::MIXED_TOPIC);
                Ok(select_fallback_questions(
                    fallback_topic,
                    user.english_level,
                    num_questions as usize,
                    &avoid,
                ))
            }
        }
    }

    /// An explicit topic is used verbatim; `None`/`Mixed` selects the
    /// topics with the lowest recorded progress, breaking ties by the
    /// fixed topic order, so the weakest areas are practiced more.
    fn select_topics(requested: Option<&str>, progress: &HashMap<String, f64>) -> Vec<String> {
        match requested {
            Some(t) if t != crate::domain::MIXED_TOPIC => vec![t.to_string()],
            _ => {
                let mut topics: Vec<&str> = RECOGNIZED_TOPICS.to_vec();
                topics.sort_by(|a, b| {
                    let score_a = progress.get(*a).copied().unwrap_or(0.0);
                    let score_b = progress.get(*b).copied().unwrap_or(0.0);
                    score_a
                        .partial_cmp(&score_b)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                topics.into_iter().take(2).map(String::from).collect()
            }
        }
    }

    /// First attempt, then one tightened retry on a parse/validation
    /// failure, surfacing why both attempts failed if the second also fails.
    async fn generate_via_llm(&self, spec: &QuizPromptSpec<'_>) -> Result<Vec<Question>, String> {
        let prompt = build_quiz_prompt(spec);

        match self.call_and_parse(&prompt, spec).await {
            Ok(questions) => Ok(questions),
            Err(first_failure) => {
                let prior_output = first_failure.raw.as_deref().unwrap_or("<no response received>");
                let retry_prompt = build_retry_prompt(spec, prior_output, &first_failure.reason);
                match self.call_and_parse(&retry_prompt, spec).await {
                    Ok(questions) => Ok(questions),
                    Err(retry_failure) => Err(format!(
                        "first attempt: {}; retry: {}",
                        first_failure.reason, retry_failure.reason
                    )),
                }
            }
        }
    }

    async fn call_and_parse(
        &self,
        prompt: &str,
        spec: &QuizPromptSpec<'_>,
    ) -> Result<Vec<Question>, CallFailure> {
        let deadline = std::time::Duration::from_secs(self.llm_config.timeout_seconds);

        let raw = timeout(deadline, self.llm.complete(prompt))
            .await
            .map_err(|_| CallFailure {
                reason: "LLM request timed out".to_string(),
                raw: None,
            })?
            .map_err(|e| CallFailure {
                reason: e.to_string(),
                raw: None,
            })?;

        parse_and_validate(&raw, spec.num_questions as usize, spec.level).map_err(|e: ParseError| CallFailure {
            reason: e.to_string(),
            raw: Some(raw.clone()),
        })
    }

    /// Randomizes question order within a generated/fallback set so the
    /// weakest-area ordering from topic selection doesn't leak into the
    /// presented sequence. Called by handlers, not by `generate_quiz`
    /// itself, so orchestration stays deterministic and test-friendly.
    pub fn shuffle_questions(questions: &mut [Question]) {
        questions.shuffle(&mut rand::thread_rng());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_topics_honors_explicit_topic() {
        let progress = HashMap::new();
        let topics = QuizOrchestrator::select_topics(Some("Vocabulary"), &progress);
        assert_eq!(topics, vec!["Vocabulary".to_string()]);
    }

    #[test]
    fn test_select_topics_mixed_picks_weakest() {
        let mut progress = HashMap::new();
        progress.insert("Grammar".to_string(), 90.0);
        progress.insert("Vocabulary".to_string(), 20.0);
        progress.insert("Reading".to_string(), 95.0);
        progress.insert("Tenses".to_string(), 10.0);
        progress.insert("Pronunciation".to_string(), 99.0);

        let topics = QuizOrchestrator::select_topics(None, &progress);
        assert_eq!(topics, vec!["Tenses".to_string(), "Vocabulary".to_string()]);
    }

    #[test]
    fn test_select_topics_unscored_topics_treated_as_weakest() {
        let progress = HashMap::new();
        let topics = QuizOrchestrator::select_topics(Some(crate::domain::MIXED_TOPIC), &progress);
        assert_eq!(topics.len(), 2);
    }
}
