//! Errors surfaced by the chat handlers.

use thiserror::Error;

use crate::domain::conversation::LifecycleState;
use crate::domain::foundation::SessionId;
use crate::domain::guardrail::RejectReason;
use crate::ports::{AnswerError, SessionStoreError};

#[derive(Debug, Error)]
pub enum ChatError {
    /// The guardrail turned the message away.
    #[error("{reason}")]
    Rejected { reason: RejectReason, score: f64 },

    /// The conversation is in a terminal state; only a reset helps.
    #[error("conversation already closed in state {0:?}")]
    SessionClosed(LifecycleState),

    /// No such session.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// Another message for the same session won the write race.
    #[error("session {0} was modified concurrently, retry the message")]
    Conflict(SessionId),

    #[error("session store error: {0}")]
    Store(SessionStoreError),

    #[error("answer generation failed: {0}")]
    Generator(#[from] AnswerError),
}

impl From<SessionStoreError> for ChatError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::VersionConflict(id) => ChatError::Conflict(id),
            other => ChatError::Store(other),
        }
    }
}
