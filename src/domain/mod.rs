//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps)
//! - `guardrail` - Request admission pipeline (sanitize, score, fuse)
//! - `conversation` - Lifecycle state machine and session state

pub mod conversation;
pub mod foundation;
pub mod guardrail;
