//! Interactive query loop

pub mod command;
pub mod prompt;
pub mod repl;

pub use command::ReplCommand;
pub use repl::{ChatRepl, ProgressMode, answer_query};
