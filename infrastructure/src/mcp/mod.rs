//! MCP client adapter
//!
//! Speaks the Model Context Protocol (JSON-RPC 2.0) to a tool server, either
//! a child process over stdio or a remote endpoint over streamable HTTP, and
//! exposes it to the application layer as a [`ToolTransport`].
//!
//! [`ToolTransport`]: mediator_application::ToolTransport

pub mod connector;
pub mod error;
pub mod http;
pub mod protocol;
pub mod rpc;
pub mod session;
pub mod stdio;

pub use connector::McpConnector;
pub use error::{McpError, Result};
pub use session::{Channel, McpSession};
