//! Tool loop configuration from TOML (`[execution]` section)

use mediator_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw execution configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_tool_rounds: usize,
    pub parallel_tool_calls: bool,
    /// Per-invocation deadline. Absent means no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_timeout_seconds: Option<u64>,
    /// Whole-query deadline. Absent means no deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_timeout_seconds: Option<u64>,
    pub annotate_tool_calls: bool,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_tool_rounds: params.max_tool_rounds,
            parallel_tool_calls: params.parallel_tool_calls,
            tool_timeout_seconds: params.tool_timeout.map(|d| d.as_secs()),
            query_timeout_seconds: params.query_timeout.map(|d| d.as_secs()),
            annotate_tool_calls: params.annotate_tool_calls,
        }
    }
}

impl FileExecutionConfig {
    pub fn to_execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_max_tool_rounds(self.max_tool_rounds)
            .with_parallel_tool_calls(self.parallel_tool_calls)
            .with_tool_timeout(self.tool_timeout_seconds.map(Duration::from_secs))
            .with_query_timeout(self.query_timeout_seconds.map(Duration::from_secs))
            .with_annotate_tool_calls(self.annotate_tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_execution_params() {
        let params = FileExecutionConfig::default().to_execution_params();
        assert_eq!(params, ExecutionParams::default());
    }

    #[test]
    fn seconds_become_durations() {
        let config = FileExecutionConfig {
            tool_timeout_seconds: Some(5),
            query_timeout_seconds: Some(300),
            ..Default::default()
        };
        let params = config.to_execution_params();
        assert_eq!(params.tool_timeout, Some(Duration::from_secs(5)));
        assert_eq!(params.query_timeout, Some(Duration::from_secs(300)));
    }
}
