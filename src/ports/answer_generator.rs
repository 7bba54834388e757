//! Answer generator port.
//!
//! Abstracts the language model that writes repair guidance, so the
//! message handler can be exercised against a mock and production can
//! point at a local Ollama instance or any compatible service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::conversation::ChatTurn;

/// Which system prompt frames the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// First answer for a newly described problem.
    NewAnswer,
    /// A previous suggestion failed; propose a different approach.
    RetryAnswer,
}

/// Everything the generator needs to produce one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRequest {
    /// The user's sanitized message.
    pub message: String,
    /// Recent turns, oldest first.
    pub history: Vec<ChatTurn>,
    pub mode: PromptMode,
    /// 1-based attempt number for the current problem.
    pub attempt: u32,
    /// Attempt cap, so retry prompts can say how much budget remains.
    pub max_attempts: u32,
}

/// Failures surfaced by answer generator implementations.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The provider cannot be reached or timed out.
    #[error("answer provider unavailable: {0}")]
    Unavailable(String),

    /// The provider responded, but not with usable text.
    #[error("answer provider returned an unusable reply: {0}")]
    Malformed(String),
}

/// Port for generating repair guidance.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: AnswerRequest) -> Result<String, AnswerError>;
}
