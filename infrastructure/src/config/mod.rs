//! Configuration loading for mcp-mediator
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MEDIATOR_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./mediator.toml` or `./.mediator.toml`
//! 4. Global: `$XDG_CONFIG_HOME/mcp-mediator/config.toml`
//! 5. Default values

mod error;
mod file_config;
mod loader;

pub use error::ConfigError;
pub use file_config::{
    FileConfig, FileExecutionConfig, FileLoggingConfig, FileModelConfig, FileServerConfig,
};
pub use loader::ConfigLoader;
