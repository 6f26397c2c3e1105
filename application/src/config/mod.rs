//! Application-level configuration.
//!
//! - [`CompletionSettings`]: what every model call is made with (model, token limit, system prompt)
//! - [`ExecutionParams`]: conversation loop control (tool rounds, timeouts, dispatch mode)
//! - [`MediatorConfig`]: both of the above, owned by the client

pub mod completion;
pub mod execution_params;

pub use completion::CompletionSettings;
pub use execution_params::ExecutionParams;

/// Settings owned by a [`MediatorClient`](crate::MediatorClient).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediatorConfig {
    pub completion: CompletionSettings,
    pub execution: ExecutionParams,
}

impl MediatorConfig {
    pub fn new(completion: CompletionSettings, execution: ExecutionParams) -> Self {
        Self {
            completion,
            execution,
        }
    }
}
