//! Mock AI adapters for testing.
//!
//! Configurable implementations of the answer generator and topic
//! classifier ports, so handler and HTTP tests run without a model.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockAnswerGenerator::new()
//!     .with_response("Feche o registro e troque o reparo da torneira.");
//!
//! let reply = generator.generate(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    AnswerError, AnswerGenerator, AnswerRequest, TopicClassifier, TopicClassifierError,
};

/// Mock answer generator.
///
/// Returns queued responses in order, falling back to a canned reply
/// when the queue is empty. Records every request for verification.
#[derive(Debug, Clone, Default)]
pub struct MockAnswerGenerator {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<AnswerRequest>>>,
}

impl MockAnswerGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    /// Queues an unavailability error.
    pub fn with_unavailable(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
        self
    }

    /// Requests seen so far.
    pub fn calls(&self) -> Vec<AnswerRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AnswerGenerator for MockAnswerGenerator {
    async fn generate(&self, request: AnswerRequest) -> Result<String, AnswerError> {
        self.calls.lock().unwrap().push(request);

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(content),
            Some(Err(message)) => Err(AnswerError::Unavailable(message)),
            None => Ok("Tente apertar a conexão e observe se o problema persiste.".to_string()),
        }
    }
}

/// Mock topic classifier with a fixed outcome.
#[derive(Debug, Clone)]
pub struct MockTopicClassifier {
    outcome: Result<bool, String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTopicClassifier {
    /// Always answers `on_topic`.
    pub fn fixed(on_topic: bool) -> Self {
        Self {
            outcome: Ok(on_topic),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fails, for exercising the fail-open path.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TopicClassifier for MockTopicClassifier {
    async fn is_on_topic(&self, message: &str) -> Result<bool, TopicClassifierError> {
        self.calls.lock().unwrap().push(message.to_string());
        match &self.outcome {
            Ok(on_topic) => Ok(*on_topic),
            Err(message) => Err(TopicClassifierError::Unavailable(message.clone())),
        }
    }
}
