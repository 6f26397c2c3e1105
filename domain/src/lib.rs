//! Domain layer for mcp-mediator
//!
//! This crate contains the data model of the tool-use mediator. It has no
//! dependencies on infrastructure or presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Tool Catalog
//!
//! The set of [`ToolDescriptor`]s a connected tool provider exposes. Fetched
//! once per connection and replaced wholesale on reconnect.
//!
//! ## Transcript
//!
//! The ordered, append-only conversation state fed to the model on every
//! call. Every [`ToolRequest`] it holds must be answered by exactly one
//! [`ToolResultEntry`] before the next model call.
//!
//! ## Model Response
//!
//! What one model call produced: ordered text segments and ordered tool
//! requests.

pub mod connection;
pub mod response;
pub mod tool;
pub mod transcript;
pub mod util;

// Re-export commonly used types
pub use connection::{ConnectionState, ServerKind, ServerLocator, UnsupportedServerType};
pub use response::{ContentBlock, ModelResponse, StopReason};
pub use tool::{
    entities::{ToolCatalog, ToolDescriptor},
    value_objects::ToolOutcome,
};
pub use transcript::{
    entities::{ToolRequest, ToolResultEntry, Transcript, TranscriptEntry},
    error::TranscriptError,
};
