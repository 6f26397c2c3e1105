//! Hand-written port doubles shared by the use case and client tests.

use crate::config::CompletionSettings;
use crate::ports::model_gateway::{GatewayError, ModelGateway};
use crate::ports::tool_transport::{ToolTransport, TransportError};
use async_trait::async_trait;
use mediator_domain::{
    ConnectionState, ContentBlock, ModelResponse, ServerLocator, StopReason, ToolCatalog,
    ToolDescriptor, ToolOutcome, ToolRequest, Transcript,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ==================== Model Gateway ====================

/// What the gateway was called with.
pub(crate) struct RecordedCall {
    pub transcript: Transcript,
    pub tools: Option<ToolCatalog>,
    pub settings: CompletionSettings,
}

pub(crate) struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<ModelResponse, GatewayError>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ModelResponse, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(results)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(
        &self,
        settings: &CompletionSettings,
        transcript: &Transcript,
        tools: Option<&ToolCatalog>,
    ) -> Result<ModelResponse, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            transcript: transcript.clone(),
            tools: tools.cloned(),
            settings: settings.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Other("No more responses".to_string())))
    }
}

// ==================== Tool Transport ====================

pub(crate) struct MockTransport {
    catalog: ToolCatalog,
    state: Mutex<ConnectionState>,
    failures: HashMap<String, TransportError>,
    delays: HashMap<String, Duration>,
    pub invocations: Mutex<Vec<String>>,
    pub disconnects: Mutex<usize>,
}

impl MockTransport {
    /// A transport that will expose `tools` once connected.
    pub fn new(tools: &[&str]) -> Self {
        let catalog = ToolCatalog::new(
            tools
                .iter()
                .map(|name| {
                    ToolDescriptor::new(
                        *name,
                        format!("{} tool", name),
                        serde_json::json!({"type": "object"}),
                    )
                })
                .collect(),
        );
        Self {
            catalog,
            state: Mutex::new(ConnectionState::Disconnected),
            failures: HashMap::new(),
            delays: HashMap::new(),
            invocations: Mutex::new(Vec::new()),
            disconnects: Mutex::new(0),
        }
    }

    /// Same as `new`, already in the connected state.
    pub fn connected(tools: &[&str]) -> Self {
        let t = Self::new(tools);
        *t.state.lock().unwrap() = ConnectionState::Connected {
            server: "mock.py".to_string(),
            catalog: t.catalog.clone(),
        };
        t
    }

    pub fn failing(mut self, tool: &str, error: TransportError) -> Self {
        self.failures.insert(tool.to_string(), error);
        self
    }

    pub fn delayed(mut self, tool: &str, delay: Duration) -> Self {
        self.delays.insert(tool.to_string(), delay);
        self
    }

    pub fn invoked(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolTransport for MockTransport {
    async fn connect(&mut self, locator: &ServerLocator) -> Result<ToolCatalog, TransportError> {
        *self.state.lock().unwrap() = ConnectionState::Connected {
            server: locator.to_string(),
            catalog: self.catalog.clone(),
        };
        Ok(self.catalog.clone())
    }

    async fn list_tools(&self) -> Result<ToolCatalog, TransportError> {
        self.state
            .lock()
            .unwrap()
            .catalog()
            .cloned()
            .ok_or(TransportError::NotConnected)
    }

    async fn invoke(
        &self,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<ToolOutcome, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if !self.catalog.contains(tool_name) {
            return Err(TransportError::UnknownTool(tool_name.to_string()));
        }
        self.invocations.lock().unwrap().push(tool_name.to_string());
        if let Some(delay) = self.delays.get(tool_name) {
            tokio::time::sleep(*delay).await;
        }
        match self.failures.get(tool_name) {
            Some(err) => Err(err.clone()),
            None => Ok(ToolOutcome::success(format!("{} result for {}", tool_name, arguments))),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        *self.disconnects.lock().unwrap() += 1;
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.lock().unwrap().clone()
    }
}

// ==================== Response helpers ====================

pub(crate) fn text_response(text: &str) -> ModelResponse {
    ModelResponse::from_text(text)
}

pub(crate) fn tool_use_response(tool_name: &str, id: &str, args: Value) -> ModelResponse {
    ModelResponse::new(vec![ContentBlock::ToolUse(ToolRequest::new(
        id, tool_name, args,
    ))])
    .with_stop_reason(StopReason::ToolUse)
}

pub(crate) fn request(id: &str, tool_name: &str) -> ToolRequest {
    ToolRequest::new(id, tool_name, serde_json::json!({"term": "x"}))
}
