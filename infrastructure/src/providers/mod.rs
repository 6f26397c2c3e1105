//! Model provider adapters implementing [`ModelGateway`].
//!
//! [`ModelGateway`]: mediator_application::ModelGateway

pub mod anthropic;

pub use anthropic::AnthropicGateway;
