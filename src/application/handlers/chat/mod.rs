//! Chat command and query handlers.

mod error;
mod get_session;
mod process_message;
mod reset_session;

pub use error::ChatError;
pub use get_session::GetSessionHandler;
pub use process_message::{ProcessMessageCommand, ProcessMessageHandler, ProcessMessageResult};
pub use reset_session::ResetSessionHandler;
