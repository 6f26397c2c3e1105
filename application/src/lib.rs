//! Application layer for mcp-mediator
//!
//! This crate contains the port definitions, the tool dispatcher, the
//! conversation loop and the [`MediatorClient`] façade. It depends only on
//! the domain layer; adapters for the ports live in the infrastructure crate.

pub mod client;
pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use client::{ClientError, MediatorClient};
pub use config::{CompletionSettings, ExecutionParams, MediatorConfig};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_gateway::{GatewayError, ModelGateway},
    progress::{NoQueryProgress, QueryProgress},
    tool_transport::{ToolTransport, TransportError},
};
pub use use_cases::{
    dispatch_tools::ToolDispatcher, process_query::ConversationController,
};
