//! Tool dispatch.
//!
//! [`ToolDispatcher`] turns the tool requests of one model response into
//! [`ToolResultEntry`]s. It never fails: transport errors, unknown tools and
//! timeouts all become results flagged `is_error` so the model can see what
//! went wrong and react.

use crate::config::ExecutionParams;
use crate::ports::progress::QueryProgress;
use crate::ports::tool_transport::ToolTransport;
use mediator_domain::util::preview;
use mediator_domain::{ToolOutcome, ToolRequest, ToolResultEntry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Dispatches tool requests and owns the result id generator.
///
/// Result ids are `toolres-<n>` with `n` counting up from 1 for the lifetime
/// of the dispatcher, so they are unique within a client session even when
/// several calls run at once.
#[derive(Debug)]
pub struct ToolDispatcher {
    next_id: AtomicU64,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh result id.
    pub fn next_result_id(&self) -> String {
        format!("toolres-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Invoke one requested tool and capture the outcome.
    pub async fn dispatch(
        &self,
        transport: &dyn ToolTransport,
        request: &ToolRequest,
        tool_timeout: Option<Duration>,
        progress: &dyn QueryProgress,
    ) -> ToolResultEntry {
        let result_id = self.next_result_id();
        progress.on_tool_start(request);
        debug!(
            tool = %request.tool_name,
            request_id = %request.id,
            "Dispatching tool call: {}",
            preview(&request.arguments.to_string(), 120)
        );

        let invocation = transport.invoke(&request.tool_name, &request.arguments);
        let outcome = match tool_timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!(
                    "tool '{}' timed out after {:?}",
                    request.tool_name, limit
                )),
            },
            None => invocation.await.map_err(|e| e.to_string()),
        };

        let outcome = outcome.unwrap_or_else(|diagnostic| {
            warn!(
                tool = %request.tool_name,
                request_id = %request.id,
                "Tool invocation failed: {}",
                diagnostic
            );
            ToolOutcome::failure(diagnostic)
        });

        let entry = ToolResultEntry {
            request_id: request.id.clone(),
            result_id,
            tool_name: request.tool_name.clone(),
            content: outcome.content,
            is_error: outcome.is_error,
        };
        progress.on_tool_end(request, &entry);
        entry
    }

    /// Dispatch every request of one model response.
    ///
    /// Results come back in request order whatever order the calls finish in.
    pub async fn dispatch_all(
        &self,
        transport: &dyn ToolTransport,
        requests: &[ToolRequest],
        params: &ExecutionParams,
        progress: &dyn QueryProgress,
    ) -> Vec<ToolResultEntry> {
        if params.parallel_tool_calls && requests.len() > 1 {
            let futures = requests
                .iter()
                .map(|req| self.dispatch(transport, req, params.tool_timeout, progress));
            futures::future::join_all(futures).await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for req in requests {
                results.push(
                    self.dispatch(transport, req, params.tool_timeout, progress)
                        .await,
                );
            }
            results
        }
    }
}
