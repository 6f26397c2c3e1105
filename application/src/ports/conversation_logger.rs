//! Conversation record port.
//!
//! Each query leaves a trail: the user's text, every model reply, each tool
//! request the mediator forwarded and what came back. [`ConversationLogger`]
//! receives that trail as discrete events so an adapter can persist it,
//! typically as JSON lines next to the `tracing` diagnostics.

use serde_json::Value;

/// One step of a query, tagged with a kind such as `user_query`,
/// `model_response`, `tool_call`, `tool_result` or `query_failed`.
pub struct ConversationEvent {
    pub event_type: &'static str,
    /// Fields specific to `event_type`.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for [`ConversationEvent`]s.
///
/// Called inline from the query loop, so `log` neither blocks on the caller
/// nor reports failure: a record that cannot be written is lost.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards every event. The client's default until a sink is attached.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
