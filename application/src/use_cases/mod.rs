//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_tools;
pub mod process_query;

#[cfg(test)]
pub(crate) mod test_support;
