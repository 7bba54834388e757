//! Topic classifier port.
//!
//! Optional second opinion on whether a borderline message is really
//! about home repair. Only consulted under the LLM-assisted validation
//! strategy, and always fail-open: if the classifier errors, the
//! guardrail's own score stands.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopicClassifierError {
    #[error("topic classifier unavailable: {0}")]
    Unavailable(String),

    #[error("topic classifier gave an unparseable answer: {0}")]
    Unparseable(String),
}

/// Port for external topic confirmation.
#[async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Whether the message concerns home repair.
    async fn is_on_topic(&self, message: &str) -> Result<bool, TopicClassifierError>;
}
