//! Tool domain value objects

use serde::{Deserialize, Serialize};

/// What a tool invocation returned, as seen by the conversation.
///
/// `is_error` is set either by the provider (the tool ran and reported a
/// failure) or by the dispatcher when the invocation itself failed. In both
/// cases `content` is the text the model gets to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

impl std::fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_error {
            write!(f, "[ERROR] {}", self.content)
        } else {
            write!(f, "{}", self.content)
        }
    }
}
