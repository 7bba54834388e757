//! Conversation lifecycle state machine.
//!
//! A session moves through a bounded repair loop: a problem comes in, an
//! answer goes out, and the user's feedback either resolves the session
//! or spends one of a fixed number of retry attempts. The transition
//! function here is pure; persisting the outcome is the caller's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::StateMachine;

/// Where a conversation stands in the repair loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No answer given yet; waiting for a problem description.
    NewProblem,
    /// An answer was given; waiting for the user to say if it worked.
    WaitingFeedback,
    /// The user confirmed the fix worked. Terminal.
    Resolved,
    /// Retry budget exhausted without a fix. Terminal.
    MaxAttemptsReached,
}

impl StateMachine for LifecycleState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            (NewProblem, WaitingFeedback)
                | (WaitingFeedback, WaitingFeedback)
                | (WaitingFeedback, Resolved)
                | (WaitingFeedback, MaxAttemptsReached)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LifecycleState::*;
        match self {
            NewProblem => vec![WaitingFeedback],
            WaitingFeedback => vec![WaitingFeedback, Resolved, MaxAttemptsReached],
            Resolved | MaxAttemptsReached => vec![],
        }
    }
}

/// Shape of an admitted message, as the lifecycle sees it.
///
/// The guardrail has already run; only the distinction between new
/// content, yes/no feedback and shapeless input matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A problem description or any substantive message.
    Content,
    /// Short positive feedback.
    Affirmation,
    /// Short negative feedback.
    Negation,
    /// Too vague to act on.
    Ambiguous,
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Produce a first answer for the described problem.
    GenerateAnswer,
    /// Produce an alternative answer; the previous one did not work.
    GenerateRetryAnswer,
    /// Close out with a confirmation that the problem is solved.
    AcknowledgeResolved,
    /// Out of attempts; recommend calling a professional.
    SuggestProfessional,
    /// Ask the user to rephrase. Never spends an attempt.
    AskClarification,
    /// An answer is pending and the reply was not a clear yes or no;
    /// ask for explicit feedback. Never spends an attempt.
    AskFeedbackClarification,
}

/// Result of advancing the lifecycle by one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: LifecycleState,
    pub attempt_count: u32,
    pub directive: Directive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The session reached a terminal state; a reset is required before
    /// any further message.
    #[error("conversation already closed in state {0:?}")]
    SessionClosed(LifecycleState),
}

/// Computes the next lifecycle step for one admitted message.
///
/// `attempt_count` is the number of answers already produced for the
/// current problem. It only ever grows when this function orders a new
/// answer; clarifications and resolutions leave it untouched.
pub fn advance(
    state: LifecycleState,
    attempt_count: u32,
    inbound: Inbound,
    max_attempts: u32,
) -> Result<Transition, LifecycleError> {
    use LifecycleState::*;

    if state.is_terminal() {
        return Err(LifecycleError::SessionClosed(state));
    }

    let transition = match (state, inbound) {
        (NewProblem, Inbound::Content) => Transition {
            next: WaitingFeedback,
            attempt_count: attempt_count + 1,
            directive: Directive::GenerateAnswer,
        },
        // Feedback with no prior answer, or input too vague to act on:
        // hold the state and ask again.
        (NewProblem, _) => Transition {
            next: NewProblem,
            attempt_count,
            directive: Directive::AskClarification,
        },
        (WaitingFeedback, Inbound::Affirmation) => Transition {
            next: Resolved,
            attempt_count,
            directive: Directive::AcknowledgeResolved,
        },
        (WaitingFeedback, Inbound::Negation) => {
            if attempt_count >= max_attempts {
                Transition {
                    next: MaxAttemptsReached,
                    attempt_count,
                    directive: Directive::SuggestProfessional,
                }
            } else {
                Transition {
                    next: WaitingFeedback,
                    attempt_count: attempt_count + 1,
                    directive: Directive::GenerateRetryAnswer,
                }
            }
        }
        // Only a clear yes or no moves a pending answer forward; any
        // other reply holds the state with the counter untouched.
        (WaitingFeedback, Inbound::Content) | (WaitingFeedback, Inbound::Ambiguous) => Transition {
            next: WaitingFeedback,
            attempt_count,
            directive: Directive::AskFeedbackClarification,
        },
        // Terminal states were rejected above.
        (Resolved, _) | (MaxAttemptsReached, _) => unreachable!(),
    };

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 3;

    mod state_machine {
        use super::*;

        #[test]
        fn happy_path_transitions_are_valid() {
            assert!(LifecycleState::NewProblem.can_transition_to(&LifecycleState::WaitingFeedback));
            assert!(
                LifecycleState::WaitingFeedback.can_transition_to(&LifecycleState::Resolved)
            );
            assert!(LifecycleState::WaitingFeedback
                .can_transition_to(&LifecycleState::MaxAttemptsReached));
        }

        #[test]
        fn retry_loops_back_to_waiting() {
            assert!(LifecycleState::WaitingFeedback
                .can_transition_to(&LifecycleState::WaitingFeedback));
        }

        #[test]
        fn terminal_states_have_no_exits() {
            assert!(LifecycleState::Resolved.is_terminal());
            assert!(LifecycleState::MaxAttemptsReached.is_terminal());
            assert!(!LifecycleState::WaitingFeedback.is_terminal());
        }

        #[test]
        fn cannot_skip_straight_to_resolved() {
            assert!(!LifecycleState::NewProblem.can_transition_to(&LifecycleState::Resolved));
        }
    }

    mod advancing {
        use super::*;

        #[test]
        fn first_problem_produces_an_answer_and_one_attempt() {
            let t = advance(LifecycleState::NewProblem, 0, Inbound::Content, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::WaitingFeedback);
            assert_eq!(t.attempt_count, 1);
            assert_eq!(t.directive, Directive::GenerateAnswer);
        }

        #[test]
        fn affirmation_resolves_without_spending_attempts() {
            let t = advance(LifecycleState::WaitingFeedback, 1, Inbound::Affirmation, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::Resolved);
            assert_eq!(t.attempt_count, 1);
            assert_eq!(t.directive, Directive::AcknowledgeResolved);
        }

        #[test]
        fn negation_spends_an_attempt_and_retries() {
            let t = advance(LifecycleState::WaitingFeedback, 1, Inbound::Negation, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::WaitingFeedback);
            assert_eq!(t.attempt_count, 2);
            assert_eq!(t.directive, Directive::GenerateRetryAnswer);
        }

        #[test]
        fn negation_at_the_cap_closes_the_session() {
            let t = advance(LifecycleState::WaitingFeedback, MAX, Inbound::Negation, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::MaxAttemptsReached);
            assert_eq!(t.attempt_count, MAX);
            assert_eq!(t.directive, Directive::SuggestProfessional);
        }

        #[test]
        fn more_detail_while_waiting_spends_no_attempt() {
            let t = advance(LifecycleState::WaitingFeedback, 1, Inbound::Content, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::WaitingFeedback);
            assert_eq!(t.attempt_count, 1);
            assert_eq!(t.directive, Directive::AskFeedbackClarification);
        }

        #[test]
        fn only_a_negation_spends_an_attempt_while_waiting() {
            for inbound in [Inbound::Content, Inbound::Ambiguous] {
                let t = advance(LifecycleState::WaitingFeedback, 2, inbound, MAX).unwrap();
                assert_eq!(t.attempt_count, 2, "{inbound:?} must not touch the counter");
            }
            let t = advance(LifecycleState::WaitingFeedback, 2, Inbound::Negation, MAX).unwrap();
            assert_eq!(t.attempt_count, 3);
        }

        #[test]
        fn ambiguous_input_never_touches_the_counter() {
            let t = advance(LifecycleState::NewProblem, 0, Inbound::Ambiguous, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::NewProblem);
            assert_eq!(t.attempt_count, 0);
            assert_eq!(t.directive, Directive::AskClarification);

            let t = advance(LifecycleState::WaitingFeedback, 2, Inbound::Ambiguous, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::WaitingFeedback);
            assert_eq!(t.attempt_count, 2);
            assert_eq!(t.directive, Directive::AskFeedbackClarification);
        }

        #[test]
        fn feedback_before_any_answer_asks_for_a_problem() {
            let t = advance(LifecycleState::NewProblem, 0, Inbound::Affirmation, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::NewProblem);
            assert_eq!(t.directive, Directive::AskClarification);
        }

        #[test]
        fn terminal_sessions_reject_further_messages() {
            let err = advance(LifecycleState::Resolved, 1, Inbound::Content, MAX).unwrap_err();
            assert_eq!(err, LifecycleError::SessionClosed(LifecycleState::Resolved));

            let err =
                advance(LifecycleState::MaxAttemptsReached, MAX, Inbound::Content, MAX).unwrap_err();
            assert_eq!(
                err,
                LifecycleError::SessionClosed(LifecycleState::MaxAttemptsReached)
            );
        }

        #[test]
        fn full_failure_loop_from_new_problem_to_professional() {
            let mut state = LifecycleState::NewProblem;
            let mut count = 0;

            let t = advance(state, count, Inbound::Content, MAX).unwrap();
            state = t.next;
            count = t.attempt_count;
            assert_eq!(count, 1);

            for expected in [2, 3] {
                let t = advance(state, count, Inbound::Negation, MAX).unwrap();
                state = t.next;
                count = t.attempt_count;
                assert_eq!(state, LifecycleState::WaitingFeedback);
                assert_eq!(count, expected);
            }

            let t = advance(state, count, Inbound::Negation, MAX).unwrap();
            assert_eq!(t.next, LifecycleState::MaxAttemptsReached);
            assert_eq!(t.directive, Directive::SuggestProfessional);
        }

        #[test]
        fn every_advance_respects_the_state_machine() {
            let inputs = [
                Inbound::Content,
                Inbound::Affirmation,
                Inbound::Negation,
                Inbound::Ambiguous,
            ];
            for state in [LifecycleState::NewProblem, LifecycleState::WaitingFeedback] {
                for inbound in inputs {
                    let t = advance(state, 1, inbound, MAX).unwrap();
                    assert!(
                        t.next == state || state.can_transition_to(&t.next),
                        "{state:?} -> {:?} on {inbound:?}",
                        t.next
                    );
                }
            }
        }
    }
}
