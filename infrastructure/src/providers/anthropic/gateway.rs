//! Anthropic Messages API gateway.

use super::types::{ApiErrorBody, MessagesRequest, MessagesResponse, build_messages, build_tools};
use async_trait::async_trait;
use mediator_application::{CompletionSettings, GatewayError, ModelGateway};
use mediator_domain::{ModelResponse, ToolCatalog, Transcript};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// [`ModelGateway`] over `POST {base_url}/v1/messages`.
///
/// Holds only the credential, endpoint and HTTP client. Model, token limit
/// and system prompt come with each call.
pub struct AnthropicGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    api_version: String,
}

impl fmt::Debug for AnthropicGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicGateway")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AnthropicGateway {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_endpoint(
            api_key,
            DEFAULT_BASE_URL,
            DEFAULT_API_VERSION,
            DEFAULT_REQUEST_TIMEOUT,
        )
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: &str,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            api_version: api_version.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl ModelGateway for AnthropicGateway {
    async fn complete(
        &self,
        settings: &CompletionSettings,
        transcript: &Transcript,
        tools: Option<&ToolCatalog>,
    ) -> Result<ModelResponse, GatewayError> {
        let request = MessagesRequest {
            model: &settings.model,
            max_tokens: settings.max_output_tokens,
            system: settings.system_prompt.as_deref(),
            messages: build_messages(transcript),
            tools: tools.map(build_tools),
        };

        debug!(
            model = %settings.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "Sending Messages API request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = provider_message(&body);
            warn!(status = status.as_u16(), "Messages API error: {}", message);
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediator_domain::ToolDescriptor;
    use serde_json::{Value, json};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct Captured {
        head: String,
        body: Value,
    }

    /// Serve one HTTP request with a canned response; hand back what was sent.
    async fn one_shot_server(
        status: u16,
        response_body: String,
    ) -> (String, tokio::task::JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let (head, body_start, content_length) = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(pos) = text.find("\r\n\r\n") {
                    let head = text[..pos].to_string();
                    let length = head
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    break (head, pos + 4, length);
                }
            };
            while buf.len() < body_start + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
            }
            let body: Value =
                serde_json::from_slice(&buf[body_start..body_start + content_length]).unwrap();

            let reply = format!(
                "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                response_body.len(),
                response_body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            Captured { head, body }
        });

        (base, handle)
    }

    fn gateway(base: &str) -> AnthropicGateway {
        AnthropicGateway::with_endpoint("sk-test", base, "2023-06-01", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn endpoint_joins_base_url() {
        let gw = gateway("https://api.anthropic.com/");
        assert_eq!(gw.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn provider_message_prefers_error_message() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert_eq!(provider_message(body), "slow down");
        assert_eq!(provider_message("bad gateway\n"), "bad gateway");
    }

    #[tokio::test]
    async fn sends_headers_and_body() {
        let (base, server) = one_shot_server(
            200,
            json!({
                "content": [{"type": "text", "text": "No alerts."}],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .await;

        let settings = CompletionSettings::default()
            .with_model("claude-test")
            .with_max_output_tokens(256)
            .with_system_prompt("be brief");
        let catalog = ToolCatalog::new(vec![ToolDescriptor::new(
            "get_alerts",
            "Alerts",
            json!({"type": "object"}),
        )]);

        let response = gateway(&base)
            .complete(
                &settings,
                &Transcript::with_user_text("alerts?"),
                Some(&catalog),
            )
            .await
            .unwrap();
        let captured = server.await.unwrap();

        assert_eq!(response.text_segments(), vec!["No alerts."]);
        let head = captured.head.to_ascii_lowercase();
        assert!(head.starts_with("post /v1/messages"));
        assert!(head.contains("x-api-key: sk-test"));
        assert!(head.contains("anthropic-version: 2023-06-01"));
        assert_eq!(captured.body["model"], "claude-test");
        assert_eq!(captured.body["max_tokens"], 256);
        assert_eq!(captured.body["system"], "be brief");
        assert_eq!(captured.body["tools"][0]["name"], "get_alerts");
        assert_eq!(captured.body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn no_catalog_means_no_tools_field() {
        let (base, server) = one_shot_server(
            200,
            json!({"content": [{"type": "text", "text": "hi"}]}).to_string(),
        )
        .await;

        gateway(&base)
            .complete(
                &CompletionSettings::default(),
                &Transcript::with_user_text("hello"),
                None,
            )
            .await
            .unwrap();
        let captured = server.await.unwrap();

        assert!(captured.body.get("tools").is_none());
        assert!(captured.body.get("system").is_none());
        assert_eq!(captured.body["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn non_success_status_is_provider_error() {
        let (base, server) = one_shot_server(
            401,
            json!({"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}})
                .to_string(),
        )
        .await;

        let err = gateway(&base)
            .complete(
                &CompletionSettings::default(),
                &Transcript::with_user_text("hello"),
                None,
            )
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(
            err,
            GatewayError::Provider {
                status: 401,
                message: "invalid x-api-key".to_string()
            }
        );
    }

    #[tokio::test]
    async fn undecodable_body_is_invalid_response() {
        let (base, server) = one_shot_server(200, "not json".to_string()).await;

        let err = gateway(&base)
            .complete(
                &CompletionSettings::default(),
                &Transcript::with_user_text("hello"),
                None,
            )
            .await
            .unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = gateway(&base)
            .complete(
                &CompletionSettings::default(),
                &Transcript::with_user_text("hello"),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
