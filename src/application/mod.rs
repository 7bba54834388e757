//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers own the full path of one operation: guardrail, lifecycle,
//! generation and persistence.

pub mod handlers;

pub use handlers::{
    ChatError, GetSessionHandler, ProcessMessageCommand, ProcessMessageHandler,
    ProcessMessageResult, ResetSessionHandler,
};
