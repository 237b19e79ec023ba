//! Streaming events for model responses.
//!
//! [`StreamEvent`] is the vendor-neutral shape of one event in a streamed
//! response. [`ResponseAccumulator`] folds a sequence of them into the same
//! [`LlmResponse`] the batched path returns.
//!
//! Tool arguments arrive as JSON fragments keyed by content-block index and are
//! only parsed when their block closes. A block whose fragments do not form
//! valid JSON is dropped and recorded as a [`DroppedToolCall`]; the rest of the
//! response is kept.

use super::response::{ContentBlock, LlmResponse, StopReason};
use serde_json::Value;
use std::collections::BTreeMap;

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model.
    TextDelta(String),
    /// A tool use block opened at `index`.
    ToolUseStart {
        index: usize,
        id: String,
        name: String,
    },
    /// Incremental JSON fragment of a tool use block's arguments.
    ToolInputDelta { index: usize, partial_json: String },
    /// The content block at `index` is complete.
    BlockStop { index: usize },
    /// The message is complete.
    Stop { stop_reason: Option<StopReason> },
    /// The stream failed.
    Error(String),
}

impl StreamEvent {
    /// Returns the text if this is a text delta.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Stop { .. } | StreamEvent::Error(_))
    }
}

/// A tool use whose argument fragments could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedToolCall {
    pub id: String,
    pub name: String,
    pub raw_arguments: String,
    pub reason: String,
}

#[derive(Debug, Default)]
struct PendingToolUse {
    id: String,
    name: String,
    arguments: String,
}

/// Folds [`StreamEvent`]s into an [`LlmResponse`].
///
/// Text deltas collapse into one leading text block; completed tool uses
/// follow in the order their blocks closed.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    pending: BTreeMap<usize, PendingToolUse>,
    completed: Vec<ContentBlock>,
    dropped: Vec<DroppedToolCall>,
    stop_reason: Option<StopReason>,
    error: Option<String>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn push(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::TextDelta(delta) => self.text.push_str(&delta),
            StreamEvent::ToolUseStart { index, id, name } => {
                self.pending.insert(
                    index,
                    PendingToolUse {
                        id,
                        name,
                        arguments: String::new(),
                    },
                );
            }
            StreamEvent::ToolInputDelta {
                index,
                partial_json,
            } => {
                if let Some(tool) = self.pending.get_mut(&index) {
                    tool.arguments.push_str(&partial_json);
                }
            }
            StreamEvent::BlockStop { index } => {
                if let Some(tool) = self.pending.remove(&index) {
                    self.close_tool_use(tool);
                }
            }
            StreamEvent::Stop { stop_reason } => self.stop_reason = stop_reason,
            StreamEvent::Error(message) => self.error = Some(message),
        }
    }

    fn close_tool_use(&mut self, tool: PendingToolUse) {
        let parsed = if tool.arguments.trim().is_empty() {
            Ok(Value::Object(Default::default()))
        } else {
            serde_json::from_str::<Value>(&tool.arguments)
        };
        match parsed {
            Ok(input) => self.completed.push(ContentBlock::ToolUse {
                id: tool.id,
                name: tool.name,
                input,
            }),
            Err(e) => self.dropped.push(DroppedToolCall {
                id: tool.id,
                name: tool.name,
                raw_arguments: tool.arguments,
                reason: e.to_string(),
            }),
        }
    }

    /// Error reported by the stream, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Tool calls dropped so far because of malformed arguments.
    pub fn dropped(&self) -> &[DroppedToolCall] {
        &self.dropped
    }

    /// Build the response. Tool use blocks that never closed are discarded
    /// as dropped calls.
    pub fn finish(mut self) -> (LlmResponse, Vec<DroppedToolCall>) {
        for (_, tool) in std::mem::take(&mut self.pending) {
            self.dropped.push(DroppedToolCall {
                id: tool.id,
                name: tool.name,
                raw_arguments: tool.arguments,
                reason: "tool use block never closed".to_string(),
            });
        }

        let mut content = Vec::with_capacity(self.completed.len() + 1);
        if !self.text.is_empty() {
            content.push(ContentBlock::Text(self.text));
        }
        content.extend(self.completed);

        (
            LlmResponse {
                content,
                stop_reason: self.stop_reason,
                model: None,
            },
            self.dropped,
        )
    }
}
