//! Tool server configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Server used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Extra environment for spawned server processes.
    pub env: HashMap<String, String>,
}
