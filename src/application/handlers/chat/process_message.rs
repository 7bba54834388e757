//! ProcessMessageHandler - the full message path for one chat turn.
//!
//! Runs the guardrail, advances the lifecycle, asks the generator for a
//! reply when one is due, and persists the session with a
//! compare-and-set write. Rejected messages never touch stored state.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::conversation::{
    advance, ChatTurn, Directive, Inbound, LifecycleError, LifecycleState, SessionState,
};
use crate::domain::foundation::{SessionId, StateMachine};
use crate::domain::guardrail::{Guardrail, RejectReason, StructuralClass, Verdict};
use crate::ports::{AnswerGenerator, AnswerRequest, PromptMode, SessionStore, TopicClassifier};

use super::error::ChatError;

/// Turns of history handed to the generator for context.
const HISTORY_CONTEXT_TURNS: usize = 6;

const CLARIFICATION_REPLY: &str = "Não consegui entender bem o seu problema. \
Pode descrever o que está acontecendo? Por exemplo: \"a torneira da cozinha \
está vazando\".";

const FEEDBACK_CLARIFICATION_REPLY: &str = "Só para eu confirmar: a sugestão \
resolveu o problema? Responda \"sim\" ou \"não\", por favor.";

const RESOLVED_REPLY: &str = "Que ótimo que funcionou! Se aparecer outro \
problema em casa, é só me chamar.";

const PROFESSIONAL_REPLY: &str = "Já tentamos algumas abordagens sem sucesso. \
Para esse problema, o mais seguro agora é chamar um profissional \
qualificado. Se quiser começar outro reparo, inicie uma nova conversa.";

/// Command to process one user message in a session.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub session_id: SessionId,
    pub message: String,
}

/// Result of a processed message.
#[derive(Debug, Clone)]
pub struct ProcessMessageResult {
    pub session_id: SessionId,
    pub reply: String,
    pub lifecycle: LifecycleState,
    pub attempt_count: u32,
    /// Guardrail score, 1.0 for exempted feedback.
    pub score: f64,
    /// Typo corrections applied during matching.
    pub corrections: BTreeMap<String, String>,
}

/// Handler for processing chat messages.
pub struct ProcessMessageHandler {
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn AnswerGenerator>,
    /// Consulted only for borderline admissions, and only when present.
    classifier: Option<Arc<dyn TopicClassifier>>,
    guardrail: Arc<Guardrail>,
    max_attempts: u32,
}

impl ProcessMessageHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn AnswerGenerator>,
        guardrail: Arc<Guardrail>,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            generator,
            classifier: None,
            guardrail,
            max_attempts,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TopicClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessMessageCommand,
    ) -> Result<ProcessMessageResult, ChatError> {
        let existing = self.store.get(&cmd.session_id).await?;
        let read_version = existing.as_ref().map(|s| s.version).unwrap_or(0);
        let mut session = existing.unwrap_or_else(|| SessionState::new(cmd.session_id));

        let verdict = self
            .guardrail
            .evaluate(&cmd.message, session.is_awaiting_feedback());

        let (text, score, inbound, corrections) = match verdict {
            Verdict::Rejected { reason, score } => {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    %reason,
                    score,
                    "message rejected by guardrail"
                );
                return Err(ChatError::Rejected { reason, score });
            }
            Verdict::Ambiguous { text } => (text, 0.0, Inbound::Ambiguous, BTreeMap::new()),
            Verdict::Accepted {
                text,
                score,
                structure,
                corrections,
                needs_secondary_check,
            } => {
                if needs_secondary_check {
                    self.confirm_topic(text.as_str(), score).await?;
                }
                let inbound = match structure {
                    StructuralClass::ShortAffirmation => Inbound::Affirmation,
                    StructuralClass::ShortNegation => Inbound::Negation,
                    _ => Inbound::Content,
                };
                (text, score, inbound, corrections)
            }
        };

        // A closed conversation accepts a fresh problem description;
        // the finished thread is discarded in place, as a reset would.
        if session.lifecycle.is_terminal() && inbound == Inbound::Content {
            session.start_new_problem();
        }

        let transition = advance(
            session.lifecycle,
            session.attempt_count,
            inbound,
            self.max_attempts,
        )
        .map_err(|LifecycleError::SessionClosed(state)| ChatError::SessionClosed(state))?;

        let reply = match transition.directive {
            Directive::GenerateAnswer => {
                self.generate(&session, text.as_str(), PromptMode::NewAnswer, &transition)
                    .await?
            }
            Directive::GenerateRetryAnswer => {
                self.generate(&session, text.as_str(), PromptMode::RetryAnswer, &transition)
                    .await?
            }
            Directive::AcknowledgeResolved => RESOLVED_REPLY.to_string(),
            Directive::SuggestProfessional => PROFESSIONAL_REPLY.to_string(),
            Directive::AskClarification => CLARIFICATION_REPLY.to_string(),
            Directive::AskFeedbackClarification => FEEDBACK_CLARIFICATION_REPLY.to_string(),
        };

        session.apply(
            &transition,
            ChatTurn::user(text.into_string()),
            ChatTurn::assistant(reply.clone()),
        );
        self.store.put(&session, read_version).await?;

        tracing::debug!(
            session_id = %cmd.session_id,
            lifecycle = ?session.lifecycle,
            attempt_count = session.attempt_count,
            score,
            "message processed"
        );

        Ok(ProcessMessageResult {
            session_id: cmd.session_id,
            reply,
            lifecycle: session.lifecycle,
            attempt_count: session.attempt_count,
            score,
            corrections,
        })
    }

    /// Secondary topic check for borderline scores. Fails open: a
    /// classifier error keeps the guardrail's admission.
    async fn confirm_topic(&self, text: &str, score: f64) -> Result<(), ChatError> {
        let Some(classifier) = &self.classifier else {
            return Ok(());
        };

        match classifier.is_on_topic(text).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ChatError::Rejected {
                reason: RejectReason::OffTopic,
                score,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "topic classifier failed, keeping admission");
                Ok(())
            }
        }
    }

    async fn generate(
        &self,
        session: &SessionState,
        message: &str,
        mode: PromptMode,
        transition: &crate::domain::conversation::Transition,
    ) -> Result<String, ChatError> {
        let request = AnswerRequest {
            message: message.to_string(),
            history: session.recent_history(HISTORY_CONTEXT_TURNS).to_vec(),
            mode,
            attempt: transition.attempt_count,
            max_attempts: self.max_attempts,
        };
        Ok(self.generator.generate(request).await?)
    }
}
