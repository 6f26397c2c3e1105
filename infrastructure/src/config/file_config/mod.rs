//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. Every section is optional;
//! missing keys fall back to the built-in defaults.

mod execution;
mod logging;
mod model;
mod server;

pub use execution::FileExecutionConfig;
pub use logging::FileLoggingConfig;
pub use model::FileModelConfig;
pub use server::FileServerConfig;

use super::error::ConfigError;
use mediator_application::{CompletionSettings, MediatorConfig};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model endpoint and completion settings
    pub model: FileModelConfig,
    /// Tool loop control
    pub execution: FileExecutionConfig,
    /// Default tool server
    pub server: FileServerConfig,
    /// Diagnostic and conversation logging
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Reject values that would make every query fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.model.name.trim().is_empty() {
            problems.push("model.name must not be empty".to_string());
        }
        if self.model.max_output_tokens == 0 {
            problems.push("model.max_output_tokens must be greater than 0".to_string());
        }
        if self.model.request_timeout_seconds == 0 {
            problems.push("model.request_timeout_seconds must be greater than 0".to_string());
        }
        if self.execution.max_tool_rounds == 0 {
            problems.push("execution.max_tool_rounds must be greater than 0".to_string());
        }
        if self.execution.tool_timeout_seconds == Some(0) {
            problems.push("execution.tool_timeout_seconds must be greater than 0".to_string());
        }
        if self.execution.query_timeout_seconds == Some(0) {
            problems.push("execution.query_timeout_seconds must be greater than 0".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// Apply `--model` / `--max-tokens` on top of the merged file settings.
    pub fn apply_cli_overrides(&mut self, model: Option<&str>, max_output_tokens: Option<u32>) {
        if let Some(model) = model {
            self.model.name = model.to_string();
        }
        if let Some(max) = max_output_tokens {
            self.model.max_output_tokens = max;
        }
    }

    /// Resolve the API key: CLI flag, then `model.api_key`, then the
    /// environment variable named by `model.api_key_env`.
    ///
    /// Empty values count as absent.
    pub fn resolve_api_key(&self, cli_flag: Option<&str>) -> Result<String, ConfigError> {
        let from_env = std::env::var(&self.model.api_key_env).ok();
        [cli_flag, self.model.api_key.as_deref(), from_env.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingCredential {
                env_var: self.model.api_key_env.clone(),
            })
    }

    pub fn to_mediator_config(&self) -> MediatorConfig {
        let mut completion = CompletionSettings::default()
            .with_model(self.model.name.clone())
            .with_max_output_tokens(self.model.max_output_tokens);
        if let Some(prompt) = &self.model.system_prompt {
            completion = completion.with_system_prompt(prompt.clone());
        }
        MediatorConfig::new(completion, self.execution.to_execution_params())
    }

    /// The built-in defaults rendered as TOML.
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&FileConfig::default())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
