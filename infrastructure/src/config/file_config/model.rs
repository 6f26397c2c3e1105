//! Model configuration from TOML (`[model]` section)

use mediator_application::config::completion::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};

/// Raw model and endpoint configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Environment variable consulted when `api_key` is absent.
    pub api_key_env: String,
    /// Direct API key (prefer the env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier sent with every request.
    pub name: String,
    pub max_output_tokens: u32,
    pub base_url: String,
    /// `anthropic-version` header value.
    pub api_version: String,
    pub request_timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            name: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            request_timeout_seconds: 120,
            system_prompt: None,
        }
    }
}
