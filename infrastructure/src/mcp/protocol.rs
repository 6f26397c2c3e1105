//! JSON-RPC and MCP message types.
//!
//! MCP runs JSON-RPC 2.0. Over stdio each message is one line of JSON; over
//! streamable HTTP each message is one POST body.
//!
//! # Message directions
//!
//! - **Requests**: client → server (`initialize`, `tools/list`, `tools/call`)
//!   and occasionally server → client (`ping`)
//! - **Responses**: the answer to a request, correlated by `id`
//! - **Notifications**: no `id`, no answer (`notifications/initialized`,
//!   `notifications/tools/list_changed`)

use mediator_domain::{ToolDescriptor, ToolOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP revision this client speaks.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Name reported in `clientInfo`.
pub const CLIENT_NAME: &str = "mcp-mediator";

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC request (outgoing)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC notification (outgoing)
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response (incoming)
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    /// Split into the result value or the server's error.
    ///
    /// A response carrying neither is treated as an empty result.
    pub fn into_result(self) -> std::result::Result<Value, RpcError> {
        match (self.result, self.error) {
            (_, Some(err)) => Err(err),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC response (outgoing), used to answer server-initiated requests.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponseOut {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponseOut {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Classification of an incoming JSON-RPC message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// A response to a request we sent (has `id`, no `method`).
    Response,
    /// A request from the server (has `id` + `method`), e.g. `ping`.
    IncomingRequest,
    /// A notification (has `method`, no `id`).
    Notification,
    /// Neither `id` nor `method`.
    Invalid,
}

/// Classify a JSON-RPC message by inspecting `id` and `method` fields.
pub fn classify_message(json: &Value) -> MessageKind {
    let has_id = json.get("id").is_some_and(|v| !v.is_null());
    let has_method = json.get("method").and_then(|v| v.as_str()).is_some();

    match (has_id, has_method) {
        (true, true) => MessageKind::IncomingRequest,
        (true, false) => MessageKind::Response,
        (false, true) => MessageKind::Notification,
        (false, false) => MessageKind::Invalid,
    }
}

// ==================== MCP payloads ====================

/// `clientInfo` / `serverInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// `initialize` request parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: Implementation,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: Implementation {
                name: CLIENT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// `initialize` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: Option<Implementation>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// `tools/list` result (one page)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// `tools/call` request parameters
#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams<'a> {
    pub name: &'a str,
    pub arguments: Value,
}

impl<'a> CallToolParams<'a> {
    /// `null` arguments are sent as an empty object.
    pub fn new(name: &'a str, arguments: &Value) -> Self {
        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments.clone()
        };
        Self { name, arguments }
    }
}

/// `tools/call` result
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub structured_content: Option<Value>,
}

impl CallToolResult {
    /// Flatten the content blocks into the text the model will read.
    ///
    /// `text` blocks are used verbatim, other blocks as compact JSON, joined
    /// by newlines. With no content blocks, `structuredContent` is used.
    pub fn render_text(&self) -> String {
        if self.content.is_empty() {
            return self
                .structured_content
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default();
        }
        self.content
            .iter()
            .map(|block| {
                match (
                    block.get("type").and_then(|t| t.as_str()),
                    block.get("text").and_then(|t| t.as_str()),
                ) {
                    (Some("text"), Some(text)) => text.to_string(),
                    _ => block.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_outcome(self) -> ToolOutcome {
        let text = self.render_text();
        if self.is_error {
            ToolOutcome::failure(text)
        } else {
            ToolOutcome::success(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_response() {
        assert_eq!(
            classify_message(&json!({"jsonrpc": "2.0", "id": 1, "result": {}})),
            MessageKind::Response
        );
    }

    #[test]
    fn classify_incoming_request_with_string_id() {
        assert_eq!(
            classify_message(&json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"})),
            MessageKind::IncomingRequest
        );
    }

    #[test]
    fn classify_notification() {
        assert_eq!(
            classify_message(&json!({"method": "notifications/tools/list_changed"})),
            MessageKind::Notification
        );
    }

    #[test]
    fn classify_no_id_no_method() {
        assert_eq!(classify_message(&json!({"data": 1})), MessageKind::Invalid);
    }

    #[test]
    fn request_serialization_omits_missing_params() {
        let req = JsonRpcRequest::new(7, "tools/list", None);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v, json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}));
    }

    #[test]
    fn initialize_params_shape() {
        let v = serde_json::to_value(InitializeParams::default()).unwrap();
        assert_eq!(v["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(v["clientInfo"]["name"], CLIENT_NAME);
        assert_eq!(v["capabilities"], json!({}));
    }

    #[test]
    fn response_into_result() {
        let ok: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": {"a": 1}})).unwrap();
        assert_eq!(ok.into_result().unwrap(), json!({"a": 1}));

        let err: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": -32602, "message": "Unknown tool: nope"}
        }))
        .unwrap();
        let e = err.into_result().unwrap_err();
        assert_eq!(e.code, -32602);
        assert_eq!(e.message, "Unknown tool: nope");
    }

    #[test]
    fn list_tools_result_with_cursor() {
        let page: ListToolsResult = serde_json::from_value(json!({
            "tools": [{"name": "get_alerts", "description": "alerts", "inputSchema": {"type": "object"}}],
            "nextCursor": "page-2"
        }))
        .unwrap();
        assert_eq!(page.tools[0].name, "get_alerts");
        assert_eq!(page.next_cursor.as_deref(), Some("page-2"));
    }

    #[test]
    fn call_params_null_arguments_become_object() {
        let params = CallToolParams::new("ping_tool", &Value::Null);
        assert_eq!(serde_json::to_value(&params).unwrap()["arguments"], json!({}));
    }

    #[test]
    fn render_text_blocks_and_other_blocks() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Sunny, 21C"},
                {"type": "image", "data": "AAA", "mimeType": "image/png"}
            ]
        }))
        .unwrap();
        let text = result.render_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Sunny, 21C");
        assert!(lines[1].contains("\"type\":\"image\""));
    }

    #[test]
    fn structured_content_used_without_blocks() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [],
            "structuredContent": {"temperature": 21}
        }))
        .unwrap();
        assert_eq!(result.render_text(), "{\"temperature\":21}");
    }

    #[test]
    fn is_error_result_becomes_failed_outcome() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "city not found"}],
            "isError": true
        }))
        .unwrap();
        let outcome = result.into_outcome();
        assert!(outcome.is_error);
        assert_eq!(outcome.content, "city not found");
    }
}
