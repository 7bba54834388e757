//! Ollama-backed implementations of the AI ports.
//!
//! Talks to a local Ollama instance over its `/api/generate` endpoint,
//! non-streaming. Two adapters share the configuration: the answer
//! generator that writes repair guidance, and the topic classifier used
//! for borderline admissions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::conversation::Role;
use crate::ports::{
    AnswerError, AnswerGenerator, AnswerRequest, PromptMode, TopicClassifier,
    TopicClassifierError,
};

const NEW_ANSWER_SYSTEM: &str = "\
Você é um assistente de pequenos reparos residenciais. O usuário vai \
descrever um problema em casa. Responda em português, com passos claros \
e numerados que uma pessoa leiga consiga seguir com ferramentas comuns. \
Avise quando o reparo exigir desligar água ou energia antes de começar, \
e nunca oriente nada que envolva risco elétrico ou de gás sem um \
profissional. Termine perguntando se a sugestão resolveu o problema.";

/// Retry framing carries the attempt budget so the model knows how
/// close the conversation is to the professional hand-off.
fn retry_answer_system(attempt: u32, max_attempts: u32) -> String {
    format!(
        "Você é um assistente de pequenos reparos residenciais. A sugestão \
anterior não resolveu o problema do usuário; esta é a tentativa {attempt} \
de {max_attempts}. Proponha uma abordagem diferente da que já foi tentada, \
em passos claros e numerados, sem repetir a solução anterior. Se as \
alternativas seguras estiverem se esgotando, diga isso com franqueza. \
Termine perguntando se desta vez o problema foi resolvido."
    )
}

const TOPIC_SYSTEM: &str = "\
Você é um filtro de tópico. Responda apenas 'sim' se a mensagem do \
usuário for sobre reparos, manutenção ou problemas domésticos, e apenas \
'não' caso contrário.";

/// Connection settings for the local Ollama service.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new("http://localhost:11434", "llama3")
    }
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
}

#[derive(Clone)]
struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { config, client }
    }

    async fn generate(&self, system: &str, prompt: String) -> Result<String, String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let body = GenerateBody {
            model: &self.config.model,
            system,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("ollama returned status {}", response.status()));
        }

        let reply: GenerateReply = response.json().await.map_err(|e| e.to_string())?;
        Ok(reply.response)
    }
}

/// Answer generator backed by Ollama.
#[derive(Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
}

impl OllamaGenerator {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: OllamaClient::new(config),
        }
    }
}

/// Flattens recent turns into a plain-text prompt, the user's current
/// message last.
fn build_prompt(request: &AnswerRequest) -> String {
    let mut prompt = String::new();
    for turn in &request.history {
        let speaker = match turn.role {
            Role::User => "Usuário",
            Role::Assistant => "Assistente",
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }
    prompt.push_str("Usuário: ");
    prompt.push_str(&request.message);
    prompt
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, request: AnswerRequest) -> Result<String, AnswerError> {
        let system = match request.mode {
            PromptMode::NewAnswer => NEW_ANSWER_SYSTEM.to_string(),
            PromptMode::RetryAnswer => retry_answer_system(request.attempt, request.max_attempts),
        };

        let prompt = build_prompt(&request);
        let text = self
            .client
            .generate(&system, prompt)
            .await
            .map_err(AnswerError::Unavailable)?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AnswerError::Malformed("empty completion".to_string()));
        }
        Ok(trimmed.to_string())
    }
}

/// Topic classifier backed by the same Ollama instance.
#[derive(Clone)]
pub struct OllamaTopicClassifier {
    client: OllamaClient,
}

impl OllamaTopicClassifier {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: OllamaClient::new(config),
        }
    }
}

#[async_trait]
impl TopicClassifier for OllamaTopicClassifier {
    async fn is_on_topic(&self, message: &str) -> Result<bool, TopicClassifierError> {
        let text = self
            .client
            .generate(TOPIC_SYSTEM, message.to_string())
            .await
            .map_err(TopicClassifierError::Unavailable)?;

        let normalized = text.trim().to_lowercase();
        if normalized.starts_with("sim") {
            Ok(true)
        } else if normalized.starts_with("não") || normalized.starts_with("nao") {
            Ok(false)
        } else {
            Err(TopicClassifierError::Unparseable(normalized))
        }
    }
}
