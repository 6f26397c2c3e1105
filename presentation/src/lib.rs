//! Presentation layer for mcp-mediator
//!
//! This crate contains the CLI definition, output formatters, progress
//! reporters and the interactive query REPL.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ProgressMode, ReplCommand, answer_query};
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
