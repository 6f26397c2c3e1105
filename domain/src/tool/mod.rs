//! Tool domain module
//!
//! A connected tool provider advertises a set of callable tools. Each tool is
//! described by a [`ToolDescriptor`] (name, description, JSON input schema) and
//! the full set forms a [`ToolCatalog`].
//!
//! ```text
//! ┌──────────────┐  connect   ┌──────────────┐  invoke   ┌──────────────┐
//! │ tool server  │──────────▶│ ToolCatalog  │─────────▶│ ToolOutcome  │
//! │ (MCP)        │ tools/list │ (snapshot)   │ tools/call│ (text+flag)  │
//! └──────────────┘            └──────────────┘           └──────────────┘
//! ```
//!
//! The catalog is fetched once per connection and replaced wholesale on
//! reconnect; it is never mutated in place.

pub mod entities;
pub mod value_objects;

pub use entities::{ToolCatalog, ToolDescriptor};
pub use value_objects::ToolOutcome;
