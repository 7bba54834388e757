//! State machine trait for lifecycle status enums.
//!
//! Provides a consistent interface for checking state transitions. The
//! conversation lifecycle implements this trait so that transitions can
//! be validated without going through the full pipeline.

/// Trait for status enums that represent state machines.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Checks if current state has no valid outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
