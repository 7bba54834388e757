//! AI adapters implementing the answer generator and topic classifier
//! ports.
//!
//! - `OllamaGenerator` / `OllamaTopicClassifier` - local Ollama service
//! - `MockAnswerGenerator` / `MockTopicClassifier` - test doubles

mod mock_generator;
mod ollama;

pub use mock_generator::{MockAnswerGenerator, MockTopicClassifier};
pub use ollama::{OllamaConfig, OllamaGenerator, OllamaTopicClassifier};
