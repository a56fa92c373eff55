//! # LLM Client
//!
//! Single-shot request/response against the local inference endpoint: text
//! in, text out, with a timeout. No retry, no streaming, no conversation
//! state — those concerns belong to the prompt/parse layer and the quiz
//! and tutor orchestration above it, which call this client as an injected
//! dependency so tests can substitute an in-memory fake.

pub mod parser;
pub mod prompt;

pub use parser::{parse_and_validate, ParseError};
pub use prompt::{build_quiz_prompt, build_retry_prompt, build_tutor_system_prompt, QuizPromptSpec};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::config::LlmConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM transport error: {0}")]
    Transport(String),
    #[error("LLM endpoint returned an error: {0}")]
    EndpointError(String),
}

/// Dependency boundary for the inference endpoint. Implemented by
/// [`HttpLlmClient`] in production and by an in-memory fake in tests
/// (wiremock for HTTP-level fakes, a trait object for unit tests).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `prompt` to the model and returns its raw text completion.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Request body for the local inference endpoint's completion API. The
/// endpoint is treated as an opaque text-in/text-out service; this
/// shape is the minimal chat-completions envelope most local runtimes
/// (llama.cpp server, text-generation-webui, ollama's OpenAI-compatible
/// surface) accept without model-specific extensions.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP implementation of [`LlmClient`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("failed to build LLM HTTP client");

        Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::EndpointError(format!("{status}: {body}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::EndpointError(format!("malformed response envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::EndpointError("empty choices array".to_string()))
    }
}
