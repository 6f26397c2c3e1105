//! Transcript errors

use thiserror::Error;

/// Violations of the transcript's request/result pairing rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("tool request id '{0}' already present in transcript")]
    DuplicateRequest(String),

    #[error("no tool request with id '{0}' in transcript")]
    UnknownRequest(String),

    #[error("tool request '{0}' already has a result")]
    AlreadyAnswered(String),
}
