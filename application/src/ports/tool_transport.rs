//! Tool Transport port
//!
//! Defines the interface to a tool-providing endpoint: connect, enumerate
//! tools, invoke a tool, disconnect. Implementations choose the wire
//! transport (child process, HTTP) from the [`ServerLocator`] at connect time.

use async_trait::async_trait;
use mediator_domain::{ConnectionState, ServerLocator, ToolCatalog, ToolOutcome};
use serde_json::Value;
use thiserror::Error;

/// Errors from a tool transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Not connected to a tool server")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Server returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport closed")]
    Closed,
}

/// Session to a tool provider.
///
/// `invoke` takes `&self` so several tool calls from one model response can
/// be in flight at once. `connect` and `disconnect` need exclusive access.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Open a session, run the handshake and fetch the tool catalog.
    ///
    /// An existing session is closed first; its catalog is replaced wholesale.
    async fn connect(&mut self, locator: &ServerLocator) -> Result<ToolCatalog, TransportError>;

    /// Ask the server for its tool list again.
    async fn list_tools(&self) -> Result<ToolCatalog, TransportError>;

    /// Call a named tool. Fails fast with [`TransportError::NotConnected`]
    /// without any I/O when no session is open.
    async fn invoke(
        &self,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<ToolOutcome, TransportError>;

    /// Release the session. Calling it while disconnected is a no-op.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Snapshot of the connection state and cached catalog.
    fn state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}
