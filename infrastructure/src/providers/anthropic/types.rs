//! Wire types for the Anthropic Messages API and conversions to and from
//! domain types.

use mediator_domain::{
    ContentBlock, ModelResponse, StopReason, ToolCatalog, ToolRequest, Transcript,
    TranscriptEntry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Request ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ApiTool<'a>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    User,
    Assistant,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub role: ApiRole,
    pub content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
pub struct ApiTool<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub input_schema: &'a Value,
}

/// Content block, shared by requests and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Block kinds this client does not handle (thinking, images, ...).
    #[serde(other)]
    Unknown,
}

// ─── Response ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ApiContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default, rename = "type")]
    pub kind: String,
    pub message: String,
}

// ─── Domain → API ────────────────────────────────────────────────

fn role_of(entry: &TranscriptEntry) -> ApiRole {
    if entry.is_assistant() {
        ApiRole::Assistant
    } else {
        ApiRole::User
    }
}

fn block_of(entry: &TranscriptEntry) -> ApiContentBlock {
    match entry {
        TranscriptEntry::UserText { content } | TranscriptEntry::AssistantText { content } => {
            ApiContentBlock::Text {
                text: content.clone(),
            }
        }
        TranscriptEntry::AssistantToolRequest(request) => ApiContentBlock::ToolUse {
            id: request.id.clone(),
            name: request.tool_name.clone(),
            input: if request.arguments.is_null() {
                serde_json::json!({})
            } else {
                request.arguments.clone()
            },
        },
        TranscriptEntry::ToolResult(result) => ApiContentBlock::ToolResult {
            tool_use_id: result.request_id.clone(),
            content: result.content.clone(),
            is_error: result.is_error,
        },
    }
}

/// Fold the transcript into alternating messages.
///
/// Consecutive entries with the same role share one message, so a batch of
/// tool requests becomes one assistant message and its results one user
/// message.
pub fn build_messages(transcript: &Transcript) -> Vec<ApiMessage> {
    let mut messages: Vec<ApiMessage> = Vec::new();
    for entry in transcript.iter() {
        let role = role_of(entry);
        let block = block_of(entry);
        match messages.last_mut() {
            Some(last) if last.role == role => last.content.push(block),
            _ => messages.push(ApiMessage {
                role,
                content: vec![block],
            }),
        }
    }
    messages
}

pub fn build_tools(catalog: &ToolCatalog) -> Vec<ApiTool<'_>> {
    catalog
        .iter()
        .map(|tool| ApiTool {
            name: &tool.name,
            description: &tool.description,
            input_schema: &tool.input_schema,
        })
        .collect()
}

// ─── API → Domain ────────────────────────────────────────────────

impl From<MessagesResponse> for ModelResponse {
    fn from(response: MessagesResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ApiContentBlock::Text { text } => Some(ContentBlock::Text { text }),
                ApiContentBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse(ToolRequest::new(id, name, input)))
                }
                ApiContentBlock::ToolResult { .. } | ApiContentBlock::Unknown => None,
            })
            .collect();

        let model_response = ModelResponse::new(content);
        match response.stop_reason.as_deref() {
            Some(reason) => model_response.with_stop_reason(StopReason::parse(reason)),
            None => model_response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediator_domain::{ToolDescriptor, ToolResultEntry};
    use serde_json::json;

    fn result(request_id: &str, content: &str, is_error: bool) -> ToolResultEntry {
        ToolResultEntry {
            request_id: request_id.to_string(),
            result_id: format!("toolres-{}", request_id),
            tool_name: "get_alerts".to_string(),
            content: content.to_string(),
            is_error,
        }
    }

    #[test]
    fn single_user_query() {
        let transcript = Transcript::with_user_text("Any alerts in CA?");
        let messages = serde_json::to_value(build_messages(&transcript)).unwrap();
        assert_eq!(
            messages,
            json!([{"role": "user", "content": [{"type": "text", "text": "Any alerts in CA?"}]}])
        );
    }

    #[test]
    fn tool_round_groups_by_role() {
        let mut transcript = Transcript::with_user_text("weather?");
        transcript.push_assistant_text("Let me check.");
        transcript
            .push_tool_requests(vec![
                ToolRequest::new("tu_1", "get_alerts", json!({"state": "CA"})),
                ToolRequest::new("tu_2", "get_alerts", json!({"state": "NY"})),
            ])
            .unwrap();
        transcript.push_tool_result(result("tu_1", "none", false)).unwrap();
        transcript.push_tool_result(result("tu_2", "boom", true)).unwrap();

        let messages = serde_json::to_value(build_messages(&transcript)).unwrap();

        assert_eq!(messages.as_array().unwrap().len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"][0]["type"], "text");
        assert_eq!(messages[1]["content"][1]["type"], "tool_use");
        assert_eq!(messages[1]["content"][2]["id"], "tu_2");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(
            messages[2]["content"][0],
            json!({"type": "tool_result", "tool_use_id": "tu_1", "content": "none"})
        );
        assert_eq!(messages[2]["content"][1]["is_error"], true);
    }

    #[test]
    fn tools_omitted_unless_given() {
        let catalog = ToolCatalog::new(vec![ToolDescriptor::new(
            "get_alerts",
            "Alerts",
            json!({"type": "object"}),
        )]);
        let empty = ToolCatalog::default();

        let base = |tools| MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: None,
            messages: vec![],
            tools,
        };

        let none = serde_json::to_value(base(None)).unwrap();
        assert!(none.get("tools").is_none());
        assert!(none.get("system").is_none());

        let empty_json = serde_json::to_value(base(Some(build_tools(&empty)))).unwrap();
        assert_eq!(empty_json["tools"], json!([]));

        let full = serde_json::to_value(base(Some(build_tools(&catalog)))).unwrap();
        assert_eq!(full["tools"][0]["name"], "get_alerts");
        assert_eq!(full["tools"][0]["input_schema"], json!({"type": "object"}));
    }

    #[test]
    fn response_keeps_text_and_tool_use_order() {
        let raw = json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "Checking"},
                {"type": "thinking", "thinking": "hmm"},
                {"type": "tool_use", "id": "tu_9", "name": "get_forecast", "input": {"lat": 1}},
                {"type": "text", "text": "done"}
            ],
            "stop_reason": "tool_use"
        });
        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        let response = ModelResponse::from(response);

        assert_eq!(response.stop_reason(), Some(&StopReason::ToolUse));
        let (texts, requests) = response.into_parts();
        assert_eq!(texts, vec!["Checking", "done"]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].id, "tu_9");
        assert_eq!(requests[0].arguments, json!({"lat": 1}));
    }
}
