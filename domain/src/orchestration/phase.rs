//! Query orchestration phases

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a query is in its lifecycle.
///
/// ```text
/// AwaitingModel ──(tool calls)──▶ ExecutingTools
///       ▲                              │
///       └──────(results appended)──────┘
/// AwaitingModel ──(text only)──▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationPhase {
    AwaitingModel,
    ExecutingTools,
    Done,
}

impl OrchestrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationPhase::AwaitingModel => "awaiting_model",
            OrchestrationPhase::ExecutingTools => "executing_tools",
            OrchestrationPhase::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestrationPhase::Done)
    }
}

impl fmt::Display for OrchestrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one query through its tool rounds.
#[derive(Debug, Clone)]
pub struct QueryRun {
    phase: OrchestrationPhase,
    rounds_completed: usize,
    max_rounds: usize,
}

impl QueryRun {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            phase: OrchestrationPhase::AwaitingModel,
            rounds_completed: 0,
            max_rounds,
        }
    }

    pub fn phase(&self) -> OrchestrationPhase {
        self.phase
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Record a model response.
    ///
    /// A response with tool calls moves to `ExecutingTools` unless the round
    /// cap is already spent; a text-only response finishes the run.
    pub fn on_model_response(
        &mut self,
        has_tool_calls: bool,
    ) -> Result<OrchestrationPhase, DomainError> {
        self.expect(OrchestrationPhase::AwaitingModel, "model_response")?;
        self.phase = if has_tool_calls {
            if self.rounds_completed >= self.max_rounds {
                return Err(DomainError::RoundLimitExceeded(self.max_rounds));
            }
            OrchestrationPhase::ExecutingTools
        } else {
            OrchestrationPhase::Done
        };
        Ok(self.phase)
    }

    /// Record that every tool call of the round has a result.
    pub fn on_tools_completed(&mut self) -> Result<OrchestrationPhase, DomainError> {
        self.expect(OrchestrationPhase::ExecutingTools, "tools_completed")?;
        self.rounds_completed += 1;
        self.phase = OrchestrationPhase::AwaitingModel;
        Ok(self.phase)
    }

    fn expect(&self, phase: OrchestrationPhase, event: &str) -> Result<(), DomainError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.phase.to_string(),
                event: event.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_only_response_finishes() {
        let mut run = QueryRun::new(5);
        assert_eq!(run.phase(), OrchestrationPhase::AwaitingModel);
        assert_eq!(run.on_model_response(false), Ok(OrchestrationPhase::Done));
        assert!(run.phase().is_terminal());
        assert_eq!(run.rounds_completed(), 0);
    }

    #[test]
    fn test_tool_round_cycle() {
        let mut run = QueryRun::new(5);
        assert_eq!(
            run.on_model_response(true),
            Ok(OrchestrationPhase::ExecutingTools)
        );
        assert_eq!(
            run.on_tools_completed(),
            Ok(OrchestrationPhase::AwaitingModel)
        );
        assert_eq!(run.rounds_completed(), 1);
        assert_eq!(run.on_model_response(false), Ok(OrchestrationPhase::Done));
    }

    #[test]
    fn test_round_limit() {
        let mut run = QueryRun::new(2);
        for _ in 0..2 {
            run.on_model_response(true).unwrap();
            run.on_tools_completed().unwrap();
        }
        assert_eq!(
            run.on_model_response(true),
            Err(DomainError::RoundLimitExceeded(2))
        );
    }

    #[test]
    fn test_final_answer_allowed_after_last_round() {
        let mut run = QueryRun::new(1);
        run.on_model_response(true).unwrap();
        run.on_tools_completed().unwrap();
        assert_eq!(run.on_model_response(false), Ok(OrchestrationPhase::Done));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut run = QueryRun::new(5);
        assert!(matches!(
            run.on_tools_completed(),
            Err(DomainError::InvalidTransition { .. })
        ));

        run.on_model_response(false).unwrap();
        let err = run.on_model_response(false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid orchestration transition: model_response while done"
        );
    }
}
