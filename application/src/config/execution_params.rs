//! Execution parameters - query loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control the tool
//! loop in [`AnswerQueryUseCase`](crate::use_cases::answer_query::AnswerQueryUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model id used when nothing else is configured
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

/// Query loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Model identifier sent with every request.
    pub model: String,
    /// Output token cap per model call.
    pub max_tokens: u32,
    /// Maximum tool rounds before the query fails.
    pub max_tool_rounds: usize,
    /// Upper bound for a single tool call.
    pub tool_call_timeout: Duration,
    /// Consume model output as a stream of events.
    pub streaming: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            max_tool_rounds: 5,
            tool_call_timeout: Duration::from_secs(10),
            streaming: true,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn with_tool_call_timeout(mut self, timeout: Duration) -> Self {
        self.tool_call_timeout = timeout;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.model, "claude-3-5-haiku-20241022");
        assert_eq!(params.max_tokens, 1000);
        assert_eq!(params.max_tool_rounds, 5);
        assert_eq!(params.tool_call_timeout, Duration::from_secs(10));
        assert!(params.streaming);
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_model("claude-test")
            .with_max_tokens(256)
            .with_max_tool_rounds(2)
            .with_tool_call_timeout(Duration::from_millis(500))
            .with_streaming(false);

        assert_eq!(params.model, "claude-test");
        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.max_tool_rounds, 2);
        assert_eq!(params.tool_call_timeout, Duration::from_millis(500));
        assert!(!params.streaming);
    }
}
