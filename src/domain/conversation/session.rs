//! Session state carried between messages.
//!
//! One session per conversation, identified by [`SessionId`] and stored
//! through the session-store port. The `version` field supports
//! compare-and-set writes so two concurrent messages cannot silently
//! overwrite each other.

use serde::{Deserialize, Serialize};

use super::lifecycle::{LifecycleState, Transition};
use crate::domain::foundation::{SessionId, Timestamp};

/// Author of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub at: Timestamp,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            at: Timestamp::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            at: Timestamp::now(),
        }
    }
}

/// Full state of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub lifecycle: LifecycleState,
    /// Answers already produced for the current problem.
    pub attempt_count: u32,
    pub history: Vec<ChatTurn>,
    /// Monotonic write counter for optimistic concurrency.
    pub version: u64,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

impl SessionState {
    /// Fresh session with no history.
    pub fn new(session_id: SessionId) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            lifecycle: LifecycleState::NewProblem,
            attempt_count: 0,
            history: Vec::new(),
            version: 0,
            created_at: now,
            last_updated: now,
        }
    }

    /// Applies a computed lifecycle transition and records the exchange.
    ///
    /// The version is bumped once per applied message so the store can
    /// detect conflicting writers.
    pub fn apply(&mut self, transition: &Transition, user_message: ChatTurn, reply: ChatTurn) {
        self.lifecycle = transition.next;
        self.attempt_count = transition.attempt_count;
        self.history.push(user_message);
        self.history.push(reply);
        self.version += 1;
        self.last_updated = Timestamp::now();
    }

    /// Discards the finished thread so a new problem starts in place.
    ///
    /// The version is kept; the write that follows still races
    /// correctly against concurrent writers of the old thread.
    pub fn start_new_problem(&mut self) {
        self.lifecycle = LifecycleState::NewProblem;
        self.attempt_count = 0;
        self.history.clear();
        self.last_updated = Timestamp::now();
    }

    pub fn is_awaiting_feedback(&self) -> bool {
        self.lifecycle == LifecycleState::WaitingFeedback
    }

    /// Most recent turns, oldest first, for prompt context.
    pub fn recent_history(&self, limit: usize) -> &[ChatTurn] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::lifecycle::Directive;

    fn transition_to_waiting() -> Transition {
        Transition {
            next: LifecycleState::WaitingFeedback,
            attempt_count: 1,
            directive: Directive::GenerateAnswer,
        }
    }

    #[test]
    fn new_session_starts_clean() {
        let session = SessionState::new(SessionId::new());
        assert_eq!(session.lifecycle, LifecycleState::NewProblem);
        assert_eq!(session.attempt_count, 0);
        assert_eq!(session.version, 0);
        assert!(session.history.is_empty());
    }

    #[test]
    fn apply_records_the_exchange_and_bumps_the_version() {
        let mut session = SessionState::new(SessionId::new());
        session.apply(
            &transition_to_waiting(),
            ChatTurn::user("a torneira está vazando"),
            ChatTurn::assistant("verifique o registro"),
        );

        assert_eq!(session.lifecycle, LifecycleState::WaitingFeedback);
        assert_eq!(session.attempt_count, 1);
        assert_eq!(session.version, 1);
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[1].role, Role::Assistant);
    }

    #[test]
    fn start_new_problem_clears_the_thread_but_keeps_the_version() {
        let mut session = SessionState::new(SessionId::new());
        session.apply(
            &transition_to_waiting(),
            ChatTurn::user("a torneira está vazando"),
            ChatTurn::assistant("verifique o registro"),
        );

        session.start_new_problem();

        assert_eq!(session.lifecycle, LifecycleState::NewProblem);
        assert_eq!(session.attempt_count, 0);
        assert!(session.history.is_empty());
        assert_eq!(session.version, 1);
    }

    #[test]
    fn recent_history_returns_the_tail() {
        let mut session = SessionState::new(SessionId::new());
        for i in 0..5 {
            session.history.push(ChatTurn::user(format!("msg {i}")));
        }
        let tail = session.recent_history(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "msg 3");
        assert_eq!(tail[1].content, "msg 4");
    }

    #[test]
    fn recent_history_handles_short_histories() {
        let session = SessionState::new(SessionId::new());
        assert!(session.recent_history(10).is_empty());
    }

    #[test]
    fn round_trips_through_json() {
        let mut session = SessionState::new(SessionId::new());
        session.apply(
            &transition_to_waiting(),
            ChatTurn::user("pia entupida"),
            ChatTurn::assistant("tente um desentupidor"),
        );

        let json = serde_json::to_string(&session).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
