//! Server-sent event handling for streamed Messages API responses.
//!
//! `eventsource-stream` frames the byte stream into events; [`StreamParser`]
//! turns each event's JSON into domain [`StreamEvent`]s and [`pump`] forwards
//! them to the query's channel.

use std::fmt::Display;

use cryptovox_domain::{StopReason, StreamEvent};
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

/// Decode an SSE byte stream and forward parsed events to `tx`.
///
/// Stops after a terminal event, on a transport error (sent as
/// [`StreamEvent::Error`]) or once the receiver is gone.
pub async fn pump<S, B, E>(bytes: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut events = std::pin::pin!(bytes.eventsource());
    let mut parser = StreamParser::new();

    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Error(format!("Stream read failed: {e}")))
                    .await;
                return;
            }
        };
        trace!(event = %event.event, "SSE event");
        if let Some(parsed) = parser.parse(&event) {
            let terminal = parsed.is_terminal();
            // Receiver dropped: query cancelled.
            if tx.send(parsed).await.is_err() || terminal {
                return;
            }
        }
    }
}

/// Maps Messages API stream payloads onto [`StreamEvent`]s.
///
/// The stop reason arrives in `message_delta` and is held until
/// `message_stop`.
#[derive(Debug, Default)]
pub struct StreamParser {
    stop_reason: Option<StopReason>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, event: &Event) -> Option<StreamEvent> {
        let payload: Value = match serde_json::from_str(&event.data) {
            Ok(v) => v,
            Err(e) => {
                return Some(StreamEvent::Error(format!(
                    "Malformed stream event: {e}"
                )));
            }
        };

        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(event.event.as_str());
        let index = payload
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
            .unwrap_or(0);

        match event_type {
            "content_block_start" => {
                let block = payload.get("content_block")?;
                match block.get("type").and_then(Value::as_str) {
                    Some("tool_use") => Some(StreamEvent::ToolUseStart {
                        index,
                        id: str_field(block, "id"),
                        name: str_field(block, "name"),
                    }),
                    Some("text") => block
                        .get("text")
                        .and_then(Value::as_str)
                        .filter(|t| !t.is_empty())
                        .map(|t| StreamEvent::TextDelta(t.to_string())),
                    _ => None,
                }
            }
            "content_block_delta" => {
                let delta = payload.get("delta")?;
                match delta.get("type").and_then(Value::as_str) {
                    Some("text_delta") => Some(StreamEvent::TextDelta(str_field(delta, "text"))),
                    Some("input_json_delta") => Some(StreamEvent::ToolInputDelta {
                        index,
                        partial_json: str_field(delta, "partial_json"),
                    }),
                    _ => None,
                }
            }
            "content_block_stop" => Some(StreamEvent::BlockStop { index }),
            "message_delta" => {
                if let Some(reason) = payload.pointer("/delta/stop_reason").and_then(Value::as_str)
                {
                    self.stop_reason = Some(StopReason::from_wire(reason));
                }
                None
            }
            "message_stop" => Some(StreamEvent::Stop {
                stop_reason: self.stop_reason.take(),
            }),
            "error" => {
                let message = payload
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown stream error");
                let kind = payload
                    .pointer("/error/type")
                    .and_then(Value::as_str)
                    .unwrap_or("error");
                Some(StreamEvent::Error(format!("{kind}: {message}")))
            }
            other => {
                trace!("SSE: ignoring '{}'", other);
                None
            }
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
