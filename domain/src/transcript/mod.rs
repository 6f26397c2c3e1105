//! Transcript domain module
//!
//! The [`Transcript`] is the ordered conversation state sent to the model on
//! every call. Entries are only ever appended; nothing is removed or
//! reordered while a query is being processed.
//!
//! # Pairing invariant
//!
//! Each [`TranscriptEntry::AssistantToolRequest`] must be answered by exactly
//! one [`TranscriptEntry::ToolResult`] carrying the same request id before the
//! next model call. [`Transcript::push_tool_result`] rejects results that do
//! not answer an open request, and [`Transcript::unpaired_requests`] reports
//! any request still waiting for its result.

pub mod entities;
pub mod error;

pub use entities::{ToolRequest, ToolResultEntry, Transcript, TranscriptEntry};
pub use error::TranscriptError;
