//! # Tutor Conversation
//!
//! `chat`, `teacher_chat`, and `ask_question`: stateless request/response
//! endpoints over the same [`crate::llm::LlmClient`] the quiz orchestrator
//! uses, but with no retry and no structured output — the model's raw text
//! is the reply. No conversation history is read back; the client
//! remains the source of truth. Failures degrade to an apologetic reply
//! rather than an HTTP error ("`ai_unavailable`... never fail the
//! request").

use std::sync::Arc;

use shared::{config::LlmConfig, errors::ApiError};
use uuid::Uuid;

use crate::llm::{build_tutor_system_prompt, LlmClient};
use crate::repository::{ChatLogRepository, QaRepository};

/// The apology shown in place of a real reply when the model call fails
/// ("a user-visible apology string is acceptable as a degraded reply").
const CHAT_FALLBACK_REPLY: &str =
    "I'm sorry, I can't respond right now. Please try again in a moment.";

#[derive(Clone)]
pub struct TutorService {
    chat_log: ChatLogRepository,
    qa: QaRepository,
    llm: Arc<dyn LlmClient>,
    llm_config: LlmConfig,
}

impl TutorService {
    pub fn new(
        chat_log: ChatLogRepository,
        qa: QaRepository,
        llm: Arc<dyn LlmClient>,
        llm_config: LlmConfig,
    ) -> Self {
        Self {
            chat_log,
            qa,
            llm,
            llm_config,
        }
    }

    /// `chat`: `conversation` is an ordered alternating sequence
    /// ending in `user`. `LlmClient::complete` is single-string-in/out, so
    /// the turns are serialized into one prompt with roles inferred from
    /// position (even index from the end = user, per the "ends in user"
    /// invariant).
    pub async fn chat(
        &self,
        user_id: Uuid,
        conversation: &[String],
        teacher_mode: Option<(&str, &str)>,
    ) -> Result<String, ApiError> {
        if conversation.is_empty() {
            return Err(ApiError::InvalidInput {
                message: "conversation must contain at least one message".to_string(),
            });
        }

        let prompt = Self::serialize_conversation(conversation, teacher_mode);
        let reply = self.complete_or_fallback(&prompt).await;

        self.log_turn(user_id, conversation, &reply).await;

        Ok(reply)
    }

    /// `POST /api/teacher-chat/`: a single-message convenience wrapper over
    /// `chat` that always sets `teacher_mode`.
    pub async fn teacher_chat(
        &self,
        user_id: Uuid,
        message: &str,
        user_level: &str,
        focus: &str,
    ) -> Result<String, ApiError> {
        self.chat(user_id, &[message.to_string()], Some((user_level, focus))).await
    }

    /// `POST /api/ask-question/`: a one-shot Q&A call that always appends a
    /// `QAEntry`, even on a degraded reply, so the history reflects what the
    /// user actually saw.
    pub async fn ask_question(
        &self,
        user_id: Uuid,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, ApiError> {
        if question.trim().is_empty() {
            return Err(ApiError::InvalidInput {
                message: "question must not be blank".to_string(),
            });
        }

        let prompt = match context {
            Some(ctx) if !ctx.trim().is_empty() => {
                format!(
                    "{}\n\nContext: {ctx}\n\nQuestion: {question}",
                    build_tutor_system_prompt(None)
                )
            }
            _ => format!("{}\n\nQuestion: {question}", build_tutor_system_prompt(None)),
        };

        let answer = self.complete_or_fallback(&prompt).await;

        self.qa.append(user_id, question, context, &answer).await?;

        Ok(answer)
    }

    async fn complete_or_fallback(&self, prompt: &str) -> String {
        let deadline = std::time::Duration::from_secs(self.llm_config.timeout_seconds);

        match tokio::time::timeout(deadline, self.llm.complete(prompt)).await {
            Ok(Ok(reply)) if !reply.trim().is_empty() => reply,
            Ok(Ok(_)) => {
                tracing::warn!("tutor conversation received an empty completion");
                CHAT_FALLBACK_REPLY.to_string()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "tutor conversation LLM call failed");
                CHAT_FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                tracing::warn!("tutor conversation LLM call timed out");
                CHAT_FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Alternating `user`/`assistant` turns, last one always `user`, folded
    /// into a single prompt string behind the system preamble.
    fn serialize_conversation(conversation: &[String], teacher_mode: Option<(&str, &str)>) -> String {
        let mut prompt = build_tutor_system_prompt(teacher_mode);
        prompt.push_str("\n\n");

        let last_index = conversation.len() - 1;
        for (i, turn) in conversation.iter().enumerate() {
            let role = if (last_index - i) % 2 == 0 { "User" } else { "Assistant" };
            prompt.push_str(role);
            prompt.push_str(": ");
            prompt.push_str(turn);
            prompt.push('\n');
        }

        prompt
    }

    /// Best-effort convenience log: logging failures
    /// never fail the request, since the transcript is a side record, not
    /// the mechanism by which the conversation works.
    async fn log_turn(&self, user_id: Uuid, conversation: &[String], reply: &str) {
        if let Some(last_user_turn) = conversation.last() {
            if let Err(e) = self.chat_log.append(user_id, "user", last_user_turn).await {
                tracing::warn!(error = %e, "failed to append chat log entry");
            }
        }
        if let Err(e) = self.chat_log.append(user_id, "assistant", reply).await {
            tracing::warn!(error = %e, "failed to append chat log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_conversation_ends_in_user_role() {
        let conversation = vec!["Hi".to_string(), "Hello!".to_string(), "How are you?".to_string()];
        let prompt = TutorService::serialize_conversation(&conversation, None);
        assert!(prompt.contains("User: Hi"));
        assert!(prompt.contains("Assistant: Hello!"));
        assert!(prompt.contains("User: How are you?"));
    }

    #[test]
    fn test_serialize_conversation_single_turn() {
        let conversation = vec!["What is a gerund?".to_string()];
        let prompt = TutorService::serialize_conversation(&conversation, None);
        assert!(prompt.contains("User: What is a gerund?"));
    }

    #[test]
    fn test_serialize_conversation_includes_teacher_mode() {
        let conversation = vec!["Explain conditionals".to_string()];
        let prompt =
            TutorService::serialize_conversation(&conversation, Some(("advanced", "conditionals")));
        assert!(prompt.contains("advanced"));
        assert!(prompt.contains("conditionals"));
    }
}
