//! Anthropic Messages API adapter

pub mod gateway;
pub mod types;

pub use gateway::AnthropicGateway;
