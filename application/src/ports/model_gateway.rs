//! Model Gateway port
//!
//! Defines the interface for calling the language-model endpoint.

use crate::config::CompletionSettings;
use async_trait::async_trait;
use mediator_domain::{ModelResponse, ToolCatalog, Transcript};
use thiserror::Error;

/// Errors surfaced by a model gateway.
///
/// Provider-side failures (rate limit, auth, malformed request) keep the
/// provider's own message so the user sees what actually went wrong.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Provider error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Stateless call to the language-model endpoint.
///
/// Implementations hold only the credential, endpoint and HTTP client. The
/// same inputs always produce the same request.
///
/// `tools` is `None` for a tool-free completion. `Some` with an empty catalog
/// is a different request shape and must be sent as such.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(
        &self,
        settings: &CompletionSettings,
        transcript: &Transcript,
        tools: Option<&ToolCatalog>,
    ) -> Result<ModelResponse, GatewayError>;
}
