//! Per-call model settings.

use serde::{Deserialize, Serialize};

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Default output token limit per model call.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Settings passed to the model gateway on every call.
///
/// The gateway holds only the credential and endpoint; everything that can
/// change between calls lives here so the client can adjust it through its
/// setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub model: String,
    pub max_output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            system_prompt: None,
        }
    }
}

impl CompletionSettings {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}
