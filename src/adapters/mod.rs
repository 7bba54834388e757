//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Session stores (Redis, in-memory)
//! - `ai` - Answer generation and topic classification (Ollama, mocks)
//! - `http` - REST API surface

pub mod ai;
pub mod http;
pub mod storage;
