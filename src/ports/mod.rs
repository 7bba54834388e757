//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - Session persistence with optimistic concurrency
//! - `AnswerGenerator` - LLM-backed repair guidance
//! - `TopicClassifier` - Optional second opinion for borderline messages

mod answer_generator;
mod session_store;
mod topic_classifier;

pub use answer_generator::{AnswerError, AnswerGenerator, AnswerRequest, PromptMode};
pub use session_store::{SessionStore, SessionStoreError};
pub use topic_classifier::{TopicClassifier, TopicClassifierError};
