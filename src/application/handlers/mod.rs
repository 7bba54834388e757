//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod chat;

pub use chat::{
    ChatError, GetSessionHandler, ProcessMessageCommand, ProcessMessageHandler,
    ProcessMessageResult, ResetSessionHandler,
};
