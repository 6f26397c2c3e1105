//! Error types for the MCP adapter

use mediator_application::TransportError;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// Errors that can occur when talking to an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' was not found on PATH; it is needed to run this server")]
    InterpreterNotFound(String),

    #[error("Server script not found: {0}")]
    ScriptNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON-RPC error (code {code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        McpError::Http(e.to_string())
    }
}

impl From<McpError> for TransportError {
    fn from(e: McpError) -> Self {
        match e {
            McpError::TransportClosed => TransportError::Closed,
            McpError::Rpc { code, message } => TransportError::Rpc { code, message },
            McpError::Serialization(_) | McpError::UnexpectedResponse(_) => {
                TransportError::Protocol(e.to_string())
            }
            other => TransportError::Connection(other.to_string()),
        }
    }
}
