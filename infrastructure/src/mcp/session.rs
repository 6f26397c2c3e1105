//! MCP session: handshake, tool listing and tool calls over a [`Channel`].

use crate::mcp::error::{McpError, Result};
use crate::mcp::http::HttpChannel;
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    ListToolsResult,
};
use crate::mcp::stdio::StdioChannel;
use mediator_domain::{ServerKind, ServerLocator, ToolCatalog, ToolOutcome};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the server gets to answer `initialize`.
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the server gets to answer each `tools/list` page.
const LIST_TOOLS_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on `tools/list` pages, in case a server keeps handing out cursors.
const MAX_TOOL_PAGES: usize = 100;

/// Wire transport for one session, chosen once from the [`ServerLocator`].
pub enum Channel {
    Stdio(StdioChannel),
    Http(HttpChannel),
}

impl Channel {
    /// Open the transport the locator asks for.
    pub fn open(locator: &ServerLocator, env: &HashMap<String, String>) -> Result<Self> {
        match locator.kind() {
            ServerKind::Process { program, args } => {
                Ok(Channel::Stdio(StdioChannel::spawn(program, args, env)?))
            }
            ServerKind::Http { url } => Ok(Channel::Http(HttpChannel::new(url.as_str())?)),
        }
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        match self {
            Channel::Stdio(c) => c.request(method, params).await,
            Channel::Http(c) => c.request(method, params).await,
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        match self {
            Channel::Stdio(c) => c.notify(method, params).await,
            Channel::Http(c) => c.notify(method, params).await,
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            Channel::Stdio(c) => c.is_alive(),
            Channel::Http(c) => c.is_alive(),
        }
    }

    async fn close(&mut self) {
        match self {
            Channel::Stdio(c) => c.close().await,
            Channel::Http(c) => c.close().await,
        }
    }
}

/// An initialized MCP session.
pub struct McpSession {
    channel: Channel,
    server: String,
    server_info: Option<Implementation>,
    list_timeout: Duration,
}

impl McpSession {
    /// Open a channel for `locator` and run the MCP handshake.
    pub async fn open(locator: &ServerLocator, env: &HashMap<String, String>) -> Result<Self> {
        let channel = Channel::open(locator, env)?;
        Self::initialize(channel, locator.to_string()).await
    }

    /// Run `initialize` → `notifications/initialized` on an open channel.
    pub async fn initialize(mut channel: Channel, server: String) -> Result<Self> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let raw = match tokio::time::timeout(
            INITIALIZE_TIMEOUT,
            channel.request("initialize", Some(params)),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                channel.close().await;
                return Err(e);
            }
            Err(_) => {
                channel.close().await;
                return Err(McpError::Timeout(format!(
                    "{} did not answer initialize within {:?}",
                    server, INITIALIZE_TIMEOUT
                )));
            }
        };

        let result: InitializeResult = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                channel.close().await;
                return Err(McpError::UnexpectedResponse(format!(
                    "invalid initialize result: {}",
                    e
                )));
            }
        };

        if result.protocol_version != crate::mcp::protocol::PROTOCOL_VERSION {
            debug!(
                "Server {} negotiated protocol version {}",
                server, result.protocol_version
            );
        }
        if let Some(info) = &result.server_info {
            info!("MCP server: {} {}", info.name, info.version);
        }

        channel.notify("notifications/initialized", None).await?;

        Ok(Self {
            channel,
            server,
            server_info: result.server_info,
            list_timeout: LIST_TOOLS_TIMEOUT,
        })
    }

    /// Override the per-page `tools/list` deadline.
    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    pub fn is_alive(&self) -> bool {
        self.channel.is_alive()
    }

    /// Fetch the full tool catalog, following `nextCursor` pagination.
    pub async fn list_tools(&self) -> Result<ToolCatalog> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        for _ in 0..MAX_TOOL_PAGES {
            let params = cursor
                .as_ref()
                .map(|c| serde_json::json!({ "cursor": c }));
            let raw = tokio::time::timeout(
                self.list_timeout,
                self.channel.request("tools/list", params),
            )
            .await
            .map_err(|_| {
                McpError::Timeout(format!(
                    "{} did not answer tools/list within {:?}",
                    self.server, self.list_timeout
                ))
            })??;
            let page: ListToolsResult = serde_json::from_value(raw)?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if seen_cursors.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!("Server {} repeated tools/list cursor {}", self.server, next);
                    break;
                }
                None => break,
            }
        }

        debug!("{}: {} tools listed", self.server, tools.len());
        Ok(ToolCatalog::new(tools))
    }

    /// Call a tool. A tool that reports `isError` still yields `Ok`, with
    /// the outcome flagged as an error.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutcome> {
        let params = serde_json::to_value(CallToolParams::new(name, arguments))?;
        let raw = self.channel.request("tools/call", Some(params)).await?;
        let result: CallToolResult = serde_json::from_value(raw)?;
        Ok(result.into_outcome())
    }

    pub async fn close(&mut self) {
        debug!("Closing MCP session with {}", self.server);
        self.channel.close().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};

    /// In-memory MCP server. `handler` maps (method, params) to a result;
    /// `None` means "do not answer" (used for notifications).
    pub(crate) fn fake_server<F>(handler: F) -> Channel
    where
        F: Fn(&str, &Value) -> Option<std::result::Result<Value, (i64, String)>> + Send + 'static,
    {
        let (client_io, server_io) = duplex(256 * 1024);
        let (client_read, client_write) = split(client_io);
        let (server_read, mut server_write) = split(server_io);

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let msg: Value = serde_json::from_str(&line).unwrap();
                let method = msg["method"].as_str().unwrap_or_default().to_string();
                let Some(id) = msg.get("id").cloned() else {
                    continue;
                };
                let reply = match handler(&method, &msg["params"]) {
                    Some(Ok(result)) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                    Some(Err((code, message))) => json!({
                        "jsonrpc": "2.0", "id": id,
                        "error": {"code": code, "message": message}
                    }),
                    None => continue,
                };
                let mut out = reply.to_string();
                out.push('\n');
                if server_write.write_all(out.as_bytes()).await.is_err() {
                    break;
                }
            }
        });

        Channel::Stdio(StdioChannel::from_streams("fake", client_read, client_write))
    }

    pub(crate) fn init_result() -> Value {
        json!({
            "protocolVersion": "2025-06-18",
            "capabilities": {"tools": {}},
            "serverInfo": {"name": "weather", "version": "1.0.0"}
        })
    }

    #[tokio::test]
    async fn handshake_records_server_info() {
        let channel = fake_server(|method, params| match method {
            "initialize" => {
                assert_eq!(params["protocolVersion"], "2025-06-18");
                assert_eq!(params["clientInfo"]["name"], "mcp-mediator");
                Some(Ok(init_result()))
            }
            _ => None,
        });

        let session = McpSession::initialize(channel, "weather.py".to_string())
            .await
            .unwrap();

        assert_eq!(session.server(), "weather.py");
        assert_eq!(session.server_info().unwrap().name, "weather");
        assert!(session.is_alive());
    }

    #[tokio::test]
    async fn initialize_error_is_returned() {
        let channel = fake_server(|method, _| match method {
            "initialize" => Some(Err((-32600, "unsupported protocol".to_string()))),
            _ => None,
        });

        let err = McpSession::initialize(channel, "bad.py".to_string())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::Rpc { code: -32600, .. }));
    }

    #[tokio::test]
    async fn list_tools_follows_pagination() {
        let channel = fake_server(|method, params| match method {
            "initialize" => Some(Ok(init_result())),
            "tools/list" => match params.get("cursor").and_then(|c| c.as_str()) {
                None => Some(Ok(json!({
                    "tools": [{"name": "get_alerts", "description": "Alerts", "inputSchema": {"type": "object"}}],
                    "nextCursor": "p2"
                }))),
                Some("p2") => Some(Ok(json!({
                    "tools": [{"name": "get_forecast", "description": "Forecast", "inputSchema": {"type": "object"}}]
                }))),
                Some(_) => Some(Err((-32602, "bad cursor".to_string()))),
            },
            _ => None,
        });

        let session = McpSession::initialize(channel, "weather.py".to_string())
            .await
            .unwrap();
        let catalog = session.list_tools().await.unwrap();

        assert_eq!(catalog.names(), vec!["get_alerts", "get_forecast"]);
    }

    #[tokio::test]
    async fn list_tools_stops_on_repeated_cursor() {
        let channel = fake_server(|method, _| match method {
            "initialize" => Some(Ok(init_result())),
            "tools/list" => Some(Ok(json!({
                "tools": [{"name": "loop", "inputSchema": {}}],
                "nextCursor": "same"
            }))),
            _ => None,
        });

        let session = McpSession::initialize(channel, "s.py".to_string())
            .await
            .unwrap();
        let catalog = session.list_tools().await.unwrap();

        // first page, then one more page with the same cursor
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn list_tools_times_out_on_silent_server() {
        let channel = fake_server(|method, _| match method {
            "initialize" => Some(Ok(init_result())),
            _ => None,
        });

        let session = McpSession::initialize(channel, "silent.py".to_string())
            .await
            .unwrap()
            .with_list_timeout(Duration::from_millis(100));
        let err = session.list_tools().await.unwrap_err();

        assert!(matches!(err, McpError::Timeout(ref msg) if msg.contains("tools/list")));
    }

    #[tokio::test]
    async fn call_tool_sends_name_and_arguments() {
        let channel = fake_server(|method, params| match method {
            "initialize" => Some(Ok(init_result())),
            "tools/call" => {
                let state = params["arguments"]["state"].as_str().unwrap_or("??");
                Some(Ok(json!({
                    "content": [{"type": "text", "text": format!("No alerts for {}", state)}],
                    "isError": false
                })))
            }
            _ => None,
        });

        let session = McpSession::initialize(channel, "weather.py".to_string())
            .await
            .unwrap();
        let outcome = session
            .call_tool("get_alerts", &json!({"state": "CA"}))
            .await
            .unwrap();

        assert_eq!(outcome, ToolOutcome::success("No alerts for CA"));
    }
}
