//! HTTP adapters - REST API implementations.

pub mod chat;
mod health;

pub use chat::{chat_routes, ChatHandlers};
pub use health::health_routes;
