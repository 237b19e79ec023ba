//! Progress notification port
//!
//! Defines the interface for reporting progress while a query is answered.

use cryptovox_domain::{ToolCall, ToolResult};

/// Callback for progress updates during a query
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default so a notifier only overrides what it displays. Tool callbacks may
/// fire concurrently from the same round.
pub trait QueryProgressNotifier: Send + Sync {
    /// Called before each model call; `round` starts at 1.
    fn on_model_call_start(&self, _round: usize) {}

    /// Called for each text chunk the model produces.
    fn on_text_delta(&self, _chunk: &str) {}

    /// Called after a model call returns.
    fn on_model_call_end(&self, _round: usize) {}

    /// Called when a tool call is dispatched.
    fn on_tool_started(&self, _call: &ToolCall) {}

    /// Called when a tool call has produced its result.
    fn on_tool_finished(&self, _result: &ToolResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl QueryProgressNotifier for NoProgress {}
