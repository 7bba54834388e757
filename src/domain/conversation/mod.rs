//! Conversation lifecycle and session state.

pub mod lifecycle;
pub mod session;

pub use lifecycle::{advance, Directive, Inbound, LifecycleError, LifecycleState, Transition};
pub use session::{ChatTurn, Role, SessionState};
