//! Infrastructure layer for mcp-mediator
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the MCP tool transport, the Anthropic model gateway,
//! configuration file loading and conversation logging.

pub mod config;
pub mod logging;
pub mod mcp;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileConfig, FileExecutionConfig, FileLoggingConfig,
    FileModelConfig, FileServerConfig,
};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpConnector, McpError, McpSession};
pub use providers::AnthropicGateway;
