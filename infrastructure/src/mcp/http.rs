//! Streamable HTTP channel.
//!
//! Every JSON-RPC message is POSTed to the endpoint. The server answers a
//! request either with a JSON body or with an SSE stream whose `data:` lines
//! carry JSON-RPC messages. The `Mcp-Session-Id` header handed out on
//! `initialize` is echoed on every later request, and the session is ended
//! with a `DELETE`.

use crate::mcp::error::{McpError, Result};
use crate::mcp::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION,
};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

const SESSION_HEADER: &str = "mcp-session-id";
const PROTOCOL_HEADER: &str = "mcp-protocol-version";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// MCP server reached over streamable HTTP.
pub struct HttpChannel {
    client: reqwest::Client,
    url: String,
    session_id: RwLock<Option<String>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl HttpChannel {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            session_id: RwLock::new(None),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        })
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(PROTOCOL_HEADER, HeaderValue::from_static(PROTOCOL_VERSION));
        if let Some(id) = self.session_id()
            && let Ok(value) = HeaderValue::from_str(&id)
        {
            headers.insert(SESSION_HEADER, value);
        }
        headers
    }

    async fn post(&self, body: &impl Serialize) -> Result<reqwest::Response> {
        if self.closed.load(Ordering::Acquire) {
            return Err(McpError::TransportClosed);
        }
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers())
            .json(body)
            .send()
            .await?;

        if let Some(id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut slot = self.session_id.write().unwrap_or_else(|e| e.into_inner());
            if slot.as_deref() != Some(id) {
                debug!("HTTP MCP session id: {}", id);
                *slot = Some(id.to_string());
            }
        }

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND && self.session_id().is_some() {
            // Server forgot our session
            self.closed.store(true, Ordering::Release);
            return Err(McpError::TransportClosed);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(McpError::Http(format!("HTTP {}: {}", status, text)));
        }
        Ok(response)
    }

    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        let response = self.post(&request).await?;

        let is_sse = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let message = if is_sse {
            read_event_stream(response, id).await?
        } else {
            let body = response.text().await?;
            trace!("HTTP MCP {} response: {}", method, body);
            serde_json::from_str::<Value>(&body)?
        };

        let response: JsonRpcResponse = serde_json::from_value(message)?;
        response.into_result().map_err(|e| McpError::Rpc {
            code: e.code,
            message: e.message,
        })
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.post(&JsonRpcNotification::new(method, params)).await?;
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// End the session. Servers that do not support `DELETE` answer 405,
    /// which is fine.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(id) = self.session_id() else {
            return;
        };
        match self
            .client
            .delete(&self.url)
            .header(SESSION_HEADER, id)
            .send()
            .await
        {
            Ok(r) => debug!("HTTP MCP session closed: {}", r.status()),
            Err(e) => warn!("Failed to close HTTP MCP session: {}", e),
        }
    }
}

/// Read SSE events until the response to `id` shows up.
///
/// Notifications and server requests interleaved on the stream are skipped,
/// as are events whose data is not JSON.
async fn read_event_stream(response: reqwest::Response, id: u64) -> Result<Value> {
    let mut events = response.bytes_stream().eventsource();

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| McpError::Http(format!("event stream: {}", e)))?;
        if event.data.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&event.data) {
            Ok(message) if is_response_to(&message, id) => return Ok(message),
            Ok(message) => trace!("Skipping SSE message: {}", message),
            Err(_) => trace!("Skipping non-JSON SSE event: {}", event.data),
        }
    }

    Err(McpError::UnexpectedResponse(format!(
        "no response for id {} in event stream",
        id
    )))
}

fn is_response_to(message: &Value, id: u64) -> bool {
    message.get("id").and_then(|v| v.as_u64()) == Some(id) && message.get("method").is_none()
}
