//! [`ToolTransport`] adapter backed by an [`McpSession`].

use crate::mcp::session::McpSession;
use async_trait::async_trait;
use mediator_application::{ToolTransport, TransportError};
use mediator_domain::{ConnectionState, ServerLocator, ToolCatalog, ToolOutcome};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Tool transport speaking MCP to one server at a time.
///
/// Holds the session and the catalog fetched at connect time. Tool names are
/// checked against that catalog before any request goes out.
#[derive(Default)]
pub struct McpConnector {
    session: Option<McpSession>,
    catalog: ToolCatalog,
    server_env: HashMap<String, String>,
}

impl McpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra environment variables for spawned server processes.
    pub fn with_server_env(mut self, env: HashMap<String, String>) -> Self {
        self.server_env = env;
        self
    }

    /// Adopt an already-initialized session and fetch its catalog.
    pub async fn attach(&mut self, mut session: McpSession) -> Result<ToolCatalog, TransportError> {
        self.close_session().await;

        let catalog = match session.list_tools().await {
            Ok(catalog) => catalog,
            Err(e) => {
                session.close().await;
                return Err(e.into());
            }
        };
        info!(
            "Connected to {} with tools: {:?}",
            session.server(),
            catalog.names()
        );

        self.catalog = catalog.clone();
        self.session = Some(session);
        Ok(catalog)
    }

    fn live_session(&self) -> Option<&McpSession> {
        self.session.as_ref().filter(|s| s.is_alive())
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.catalog = ToolCatalog::default();
    }
}

#[async_trait]
impl ToolTransport for McpConnector {
    async fn connect(&mut self, locator: &ServerLocator) -> Result<ToolCatalog, TransportError> {
        if self.session.is_some() {
            debug!("Replacing existing MCP session");
            self.close_session().await;
        }
        let session = McpSession::open(locator, &self.server_env).await?;
        self.attach(session).await
    }

    async fn list_tools(&self) -> Result<ToolCatalog, TransportError> {
        let session = self.live_session().ok_or(TransportError::NotConnected)?;
        Ok(session.list_tools().await?)
    }

    async fn invoke(
        &self,
        tool_name: &str,
        arguments: &Value,
    ) -> Result<ToolOutcome, TransportError> {
        let session = self.live_session().ok_or(TransportError::NotConnected)?;
        if !self.catalog.contains(tool_name) {
            return Err(TransportError::UnknownTool(tool_name.to_string()));
        }
        debug!(tool = %tool_name, "Calling MCP tool");
        Ok(session.call_tool(tool_name, arguments).await?)
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        match self.session.as_ref() {
            Some(session) => info!("Disconnecting from {}", session.server()),
            None => return Ok(()),
        }
        self.close_session().await;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        match self.live_session() {
            Some(session) => ConnectionState::Connected {
                server: session.server().to_string(),
                catalog: self.catalog.clone(),
            },
            None => {
                if self.session.is_some() {
                    debug!("MCP session is no longer alive");
                }
                ConnectionState::Disconnected
            }
        }
    }
}
