//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Raise the diagnostic log floor to `debug`.
    pub debug: bool,
    /// Write diagnostics to this file instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// JSONL conversation log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_log: Option<PathBuf>,
}
