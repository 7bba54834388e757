//! Foundation layer - shared value objects for the domain.
//!
//! Contains the strongly-typed session identifier, timestamps and the
//! state-machine trait that the guardrail and conversation modules
//! build on. Everything here is pure and serializable.

mod ids;
mod state_machine;
mod timestamp;

pub use ids::SessionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
