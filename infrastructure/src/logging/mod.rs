//! Conversation logging to a JSONL file.
//!
//! Provides [`JsonlConversationLogger`], which implements the
//! [`ConversationLogger`](mediator_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
