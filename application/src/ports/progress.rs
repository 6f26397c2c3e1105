//! Query progress port
//!
//! Callbacks fired while a query is processed. Implementations live in the
//! presentation layer (spinner, plain log lines, ...).

use mediator_domain::{ToolRequest, ToolResultEntry};

/// Callback for progress updates during `process_query`.
///
/// All methods default to no-ops. `on_tool_start` and `on_tool_end` may be
/// called from concurrently running dispatch futures.
pub trait QueryProgress: Send + Sync {
    /// Called before each model call. `round` is the number of tool rounds
    /// already completed in this query.
    fn on_model_call_start(&self, _round: usize) {}

    /// Called after a model call returns successfully.
    fn on_model_call_end(&self, _round: usize, _tool_requests: usize) {}

    fn on_tool_start(&self, _request: &ToolRequest) {}

    fn on_tool_end(&self, _request: &ToolRequest, _result: &ToolResultEntry) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoQueryProgress;

impl QueryProgress for NoQueryProgress {}
