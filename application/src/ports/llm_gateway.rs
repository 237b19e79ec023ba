//! LLM Gateway port
//!
//! Defines the interface for communicating with the language model API. The
//! gateway speaks the vendor wire format; everything it hands back is expressed
//! in domain types ([`LlmResponse`], [`StreamEvent`]).

use crate::ports::progress::QueryProgressNotifier;
use async_trait::async_trait;
use cryptovox_domain::{
    ContentBlock, DroppedToolCall, LlmResponse, Message, ResponseAccumulator, StreamEvent,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Stream ended before the message was complete")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// One request to the model: the whole conversation plus tool descriptors.
#[derive(Debug, Clone, Copy)]
pub struct LlmRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: &'a [Message],
    /// Tool descriptors in the API's `{name, description, input_schema}` shape
    pub tools: &'a [Value],
}

/// Gateway for model communication
///
/// Implementations (adapters) live in the infrastructure layer. Every call is
/// stateless: the caller resubmits the full conversation each round.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a request and wait for the complete response.
    async fn send(&self, request: &LlmRequest<'_>) -> Result<LlmResponse, GatewayError>;

    /// Send a request and receive the response as a stream of events.
    ///
    /// Default implementation calls `send()` and replays the result as
    /// events, so batched-only gateways work unchanged.
    async fn stream(&self, request: &LlmRequest<'_>) -> Result<StreamHandle, GatewayError> {
        let response = self.send(request).await?;
        Ok(StreamHandle::replay(&response))
    }
}

/// Handle for receiving streaming events from the model.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Build a finished stream carrying the events of an existing response.
    pub fn replay(response: &LlmResponse) -> Self {
        let mut events = Vec::new();
        for (index, block) in response.content.iter().enumerate() {
            match block {
                ContentBlock::Text(text) => events.push(StreamEvent::TextDelta(text.clone())),
                ContentBlock::ToolUse { id, name, input } => {
                    events.push(StreamEvent::ToolUseStart {
                        index,
                        id: id.clone(),
                        name: name.clone(),
                    });
                    events.push(StreamEvent::ToolInputDelta {
                        index,
                        partial_json: input.to_string(),
                    });
                    events.push(StreamEvent::BlockStop { index });
                }
            }
        }
        events.push(StreamEvent::Stop {
            stop_reason: response.stop_reason.clone(),
        });

        let (tx, rx) = mpsc::channel(events.len());
        for event in events {
            // Capacity matches the event count, so this never fills up.
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Consume the stream into a complete response.
    ///
    /// Text deltas are forwarded to `progress` as they arrive. Tool calls with
    /// malformed arguments are left out of the response and returned beside
    /// it. A stream that errors or closes before its stop event yields an
    /// error, never a partial response.
    pub async fn collect_response(
        mut self,
        progress: &dyn QueryProgressNotifier,
    ) -> Result<(LlmResponse, Vec<DroppedToolCall>), GatewayError> {
        let mut acc = ResponseAccumulator::new();
        let mut stopped = false;

        while let Some(event) = self.receiver.recv().await {
            if let StreamEvent::TextDelta(chunk) = &event {
                progress.on_text_delta(chunk);
            }
            let terminal = event.is_terminal();
            acc.push(event);
            if terminal {
                stopped = true;
                break;
            }
        }

        if let Some(message) = acc.error() {
            return Err(GatewayError::RequestFailed(message.to_string()));
        }
        if !stopped {
            return Err(GatewayError::TransportClosed);
        }

        let (response, dropped) = acc.finish();
        for call in &dropped {
            warn!(
                tool = %call.name,
                id = %call.id,
                reason = %call.reason,
                "Tool call has malformed arguments"
            );
        }
        Ok((response, dropped))
    }
}
