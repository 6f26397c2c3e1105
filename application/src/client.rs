//! Mediator client façade.
//!
//! [`MediatorClient`] owns everything one conversation endpoint needs: the
//! settings, the model gateway (via the controller), the tool transport and
//! the transcript of the last query. `process_query` takes `&mut self`, so a
//! client can only ever have one query in flight.

use crate::config::{ExecutionParams, MediatorConfig};
use crate::ports::conversation_logger::ConversationLogger;
use crate::ports::model_gateway::{GatewayError, ModelGateway};
use crate::ports::progress::{NoQueryProgress, QueryProgress};
use crate::ports::tool_transport::{ToolTransport, TransportError};
use crate::use_cases::process_query::ConversationController;
use mediator_domain::{
    ServerLocator, ToolCatalog, Transcript, TranscriptError, UnsupportedServerType,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced to callers of the client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    UnsupportedServerType(#[from] UnsupportedServerType),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected to a tool server")]
    NotConnected,

    #[error("Model gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Model kept requesting tools after {rounds} rounds")]
    ToolLoopExceeded { rounds: usize },

    #[error("Query timed out after {0:?}")]
    QueryTimedOut(Duration),

    #[error("Inconsistent tool requests from model: {0}")]
    Transcript(#[from] TranscriptError),
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NotConnected => ClientError::NotConnected,
            other => ClientError::Connection(other.to_string()),
        }
    }
}

/// The tool-use mediator.
///
/// Works with or without a connected tool server; without one, queries go to
/// the model with no tool catalog at all.
pub struct MediatorClient {
    config: MediatorConfig,
    transport: Box<dyn ToolTransport>,
    controller: ConversationController,
    last_transcript: Option<Transcript>,
}

impl MediatorClient {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        transport: Box<dyn ToolTransport>,
        config: MediatorConfig,
    ) -> Self {
        Self {
            config,
            transport,
            controller: ConversationController::new(gateway),
            last_transcript: None,
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.controller = self.controller.with_conversation_logger(logger);
        self
    }

    // ==================== Connection ====================

    /// Connect to the tool server named by `locator` and fetch its catalog.
    ///
    /// An unrecognised locator fails before any I/O and leaves the current
    /// connection untouched.
    pub async fn connect(&mut self, locator: &str) -> Result<ToolCatalog, ClientError> {
        let locator = ServerLocator::parse(locator)?;
        info!(server = %locator, "Connecting to tool server");
        let catalog = self.transport.connect(&locator).await?;
        info!(
            server = %locator,
            "Connected with tools: {}",
            catalog.names().join(", ")
        );
        Ok(catalog)
    }

    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.transport.disconnect().await?;
        Ok(())
    }

    /// Release the tool server session. Safe to call on every exit path and
    /// more than once.
    pub async fn cleanup(&mut self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!("Error during cleanup: {}", e);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Snapshot of the connected server's tools; empty when disconnected.
    pub fn tools(&self) -> ToolCatalog {
        self.transport
            .state()
            .catalog()
            .cloned()
            .unwrap_or_default()
    }

    // ==================== Queries ====================

    pub async fn process_query(&mut self, query: &str) -> Result<String, ClientError> {
        self.process_query_with_progress(query, &NoQueryProgress).await
    }

    /// Process one query, reporting progress through `progress`.
    ///
    /// The finished transcript is kept for [`last_transcript`](Self::last_transcript)
    /// whether the query succeeded or not.
    pub async fn process_query_with_progress(
        &mut self,
        query: &str,
        progress: &dyn QueryProgress,
    ) -> Result<String, ClientError> {
        let mut transcript = Transcript::new();
        let deadline = self.config.execution.query_timeout;

        let run = self.controller.process(
            query,
            &mut transcript,
            &*self.transport,
            &self.config.completion,
            &self.config.execution,
            progress,
        );
        let result = match deadline {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Query abandoned after {:?}", limit);
                    Err(ClientError::QueryTimedOut(limit))
                }
            },
            None => run.await,
        };

        self.controller
            .close_unpaired(&mut transcript, "query abandoned before the tool result arrived");
        self.last_transcript = Some(transcript);
        result
    }

    pub fn last_transcript(&self) -> Option<&Transcript> {
        self.last_transcript.as_ref()
    }

    // ==================== Settings ====================

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.completion.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.completion.model = model.into();
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.config.completion.max_output_tokens
    }

    pub fn set_max_output_tokens(&mut self, max: u32) {
        self.config.completion.max_output_tokens = max;
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.config.completion.system_prompt.as_deref()
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.config.completion.system_prompt = prompt;
    }

    pub fn execution(&self) -> &ExecutionParams {
        &self.config.execution
    }

    pub fn set_execution(&mut self, params: ExecutionParams) {
        self.config.execution = params;
    }
}
