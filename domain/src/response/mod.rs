//! Model response types.
//!
//! A [`ModelResponse`] is what one model call produced. It keeps the content
//! blocks in the order the provider returned them, so callers can read the
//! text segments and tool requests separately without losing their relative
//! order.

use crate::transcript::entities::ToolRequest;
use serde::{Deserialize, Serialize};

/// A single block of content within a model response.
///
/// Provider block kinds other than text and tool use (images, thinking, ...)
/// are dropped by the gateway before a response is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolRequest),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        match self {
            ContentBlock::ToolUse(req) => Some(req),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// The model wants tool results before it continues.
    ToolUse,
    /// Hit the output token limit; text may be truncated.
    MaxTokens,
    /// Provider-specific stop reason.
    Other(String),
}

impl StopReason {
    pub fn parse(s: &str) -> Self {
        match s {
            "end_turn" | "stop_sequence" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Output of one model call. Never mutated after creation.
///
/// # Examples
///
/// ```
/// use mediator_domain::{ContentBlock, ModelResponse, ToolRequest};
///
/// let response = ModelResponse::new(vec![
///     ContentBlock::text("Checking the forecast."),
///     ContentBlock::ToolUse(ToolRequest::new(
///         "toolu_1",
///         "get_forecast",
///         serde_json::json!({"latitude": 37.7, "longitude": -122.4}),
///     )),
/// ]);
/// assert_eq!(response.text_segments(), vec!["Checking the forecast."]);
/// assert!(response.has_tool_requests());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<StopReason>,
}

impl ModelResponse {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            stop_reason: None,
        }
    }

    /// A response consisting of a single text block.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            stop_reason: Some(StopReason::EndTurn),
        }
    }

    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = Some(reason);
        self
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Text blocks in order.
    pub fn text_segments(&self) -> Vec<&str> {
        self.content.iter().filter_map(|b| b.as_text()).collect()
    }

    /// Tool requests in order.
    pub fn tool_requests(&self) -> Vec<&ToolRequest> {
        self.content
            .iter()
            .filter_map(|b| b.as_tool_request())
            .collect()
    }

    pub fn has_tool_requests(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse(_)))
    }

    /// Consume the response, splitting it into owned text segments and tool
    /// requests.
    pub fn into_parts(self) -> (Vec<String>, Vec<ToolRequest>) {
        let mut texts = Vec::new();
        let mut requests = Vec::new();
        for block in self.content {
            match block {
                ContentBlock::Text { text } => texts.push(text),
                ContentBlock::ToolUse(req) => requests.push(req),
            }
        }
        (texts, requests)
    }
}
