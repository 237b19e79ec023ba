//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Tool call '{0}' has no matching tool result")]
    UnpairedToolCall(String),

    #[error("Tool result '{0}' does not answer any pending tool call")]
    UnexpectedToolResult(String),

    #[error("Invalid orchestration transition: {event} while {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Model still requested tools after {0} tool rounds")]
    RoundLimitExceeded(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
