//! Execution parameters: conversation loop control.
//!
//! [`ExecutionParams`] groups the parameters that bound the tool loop in
//! [`ConversationController`](crate::use_cases::process_query::ConversationController).

use std::time::Duration;

/// Conversation loop control parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionParams {
    /// Maximum number of tool-request rounds in one query. A response that
    /// asks for tools after this many rounds fails the query with
    /// `ToolLoopExceeded`.
    pub max_tool_rounds: usize,
    /// Dispatch the tool requests of one model response concurrently.
    pub parallel_tool_calls: bool,
    /// Deadline for a single tool invocation. Expiry becomes an error result.
    pub tool_timeout: Option<Duration>,
    /// Deadline for a whole query.
    pub query_timeout: Option<Duration>,
    /// Add a `[Calling tool ...]` segment to the answer for every request.
    pub annotate_tool_calls: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            parallel_tool_calls: true,
            tool_timeout: Some(Duration::from_secs(60)),
            query_timeout: None,
            annotate_tool_calls: false,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn with_parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = parallel;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_annotate_tool_calls(mut self, annotate: bool) -> Self {
        self.annotate_tool_calls = annotate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_tool_rounds, 10);
        assert!(params.parallel_tool_calls);
        assert_eq!(params.tool_timeout, Some(Duration::from_secs(60)));
        assert!(params.query_timeout.is_none());
        assert!(!params.annotate_tool_calls);
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_tool_rounds(3)
            .with_parallel_tool_calls(false)
            .with_query_timeout(Some(Duration::from_secs(5)))
            .with_annotate_tool_calls(true);

        assert_eq!(params.max_tool_rounds, 3);
        assert!(!params.parallel_tool_calls);
        assert_eq!(params.query_timeout, Some(Duration::from_secs(5)));
        assert!(params.annotate_tool_calls);
    }
}
