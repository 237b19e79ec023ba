//! Structured model responses.
//!
//! The Messages API returns a response as an array of content blocks mixing
//! text with tool use requests, plus a stop reason. [`LlmResponse`] keeps that
//! shape so the orchestrator can decide between "run tools" and "done".

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single block of content within a model response.
///
/// # Examples
///
/// ```
/// use cryptovox_domain::session::response::ContentBlock;
///
/// let text = ContentBlock::Text("Let me check the price.".to_string());
/// assert!(text.as_text().is_some());
///
/// let tool = ContentBlock::ToolUse {
///     id: "toolu_abc123".to_string(),
///     name: "get_simple_price".to_string(),
///     input: serde_json::json!({ "ids": "bitcoin", "vs_currencies": "usd" }),
/// };
/// assert!(tool.as_tool_use().is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// A text content block from the model.
    Text(String),

    /// A tool use request from the model.
    ToolUse {
        /// API-assigned ID for correlating with tool results (e.g. "toolu_abc123").
        id: String,
        /// Tool name as emitted by the model. Not guaranteed to exist in the catalog.
        name: String,
        /// Arguments, normally a JSON object.
        input: Value,
    },
}

impl ContentBlock {
    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `(id, name, input)` if this is a `ToolUse` block.
    pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
        match self {
            ContentBlock::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// The model wants tools executed.
    ToolUse,
    /// Hit the token limit; the response may be truncated.
    MaxTokens,
    /// Provider-specific stop reason.
    Other(String),
}

impl StopReason {
    /// Parse the wire value used by the Messages API.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// A structured response from the model.
///
/// The orchestrator branches on [`has_tool_calls()`](Self::has_tool_calls),
/// not on the stop reason: a response that carries tool uses is treated as a
/// tool request even when the stop reason says otherwise.
///
/// # Examples
///
/// ```
/// use cryptovox_domain::session::response::{ContentBlock, LlmResponse, StopReason};
///
/// let response = LlmResponse::from_text("Bitcoin is at $67,000.");
/// assert!(!response.has_tool_calls());
///
/// let response = LlmResponse {
///     content: vec![
///         ContentBlock::Text("Checking...".to_string()),
///         ContentBlock::ToolUse {
///             id: "toolu_1".to_string(),
///             name: "get_simple_price".to_string(),
///             input: serde_json::json!({ "ids": "bitcoin" }),
///         },
///     ],
///     stop_reason: Some(StopReason::ToolUse),
///     model: None,
/// };
/// assert_eq!(response.tool_calls().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    /// Content blocks in the response (text and/or tool use).
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating.
    pub stop_reason: Option<StopReason>,
    /// Model identifier (if returned by the API).
    pub model: Option<String>,
}

impl LlmResponse {
    /// Create a text-only response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            stop_reason: Some(StopReason::EndTurn),
            model: None,
        }
    }

    /// Concatenate all `Text` content blocks in order.
    pub fn text_content(&self) -> String {
        self.content.iter().filter_map(|b| b.as_text()).collect()
    }

    /// Extract all `ToolUse` blocks as [`ToolCall`]s, preserving order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some(ToolCall::new(id, name, input.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if the response contains any tool use requests.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }

    /// Returns `true` when the model hit its token limit.
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == Some(StopReason::MaxTokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_text_creates_text_only_response() {
        let response = LlmResponse::from_text("Hello, world!");
        assert_eq!(response.text_content(), "Hello, world!");
        assert!(!response.has_tool_calls());
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.model, None);
    }

    #[test]
    fn tool_calls_extraction() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::Text("Let me look that up.".to_string()),
                ContentBlock::ToolUse {
                    id: "toolu_abc123".to_string(),
                    name: "get_simple_price".to_string(),
                    input: json!({ "ids": "bitcoin", "vs_currencies": "usd" }),
                },
                ContentBlock::Text(" And the market data.".to_string()),
                ContentBlock::ToolUse {
                    id: "toolu_def456".to_string(),
                    name: "get_coins_markets".to_string(),
                    input: json!({ "vs_currency": "usd" }),
                },
            ],
            stop_reason: Some(StopReason::ToolUse),
            model: Some("claude-3-5-haiku-20241022".to_string()),
        };

        assert!(response.has_tool_calls());
        assert_eq!(
            response.text_content(),
            "Let me look that up. And the market data."
        );

        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "toolu_abc123");
        assert_eq!(calls[0].tool_name, "get_simple_price");
        assert_eq!(calls[0].get_string("ids"), Some("bitcoin"));
        assert_eq!(calls[1].id, "toolu_def456");
        assert_eq!(calls[1].get_string("vs_currency"), Some("usd"));
    }

    #[test]
    fn empty_response() {
        let response = LlmResponse {
            content: vec![],
            stop_reason: None,
            model: None,
        };

        assert_eq!(response.text_content(), "");
        assert!(!response.has_tool_calls());
        assert!(!response.is_truncated());
    }

    #[test]
    fn content_block_accessors() {
        let text = ContentBlock::Text("hello".to_string());
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.as_tool_use().is_none());

        let tool = ContentBlock::ToolUse {
            id: "id1".to_string(),
            name: "get_simple_price".to_string(),
            input: json!({}),
        };
        assert!(tool.as_text().is_none());
        let (id, name, input) = tool.as_tool_use().unwrap();
        assert_eq!(id, "id1");
        assert_eq!(name, "get_simple_price");
        assert_eq!(input, &json!({}));
    }

    #[test]
    fn stop_reason_from_wire() {
        assert_eq!(StopReason::from_wire("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_wire("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_wire("max_tokens"), StopReason::MaxTokens);
        assert_eq!(
            StopReason::from_wire("stop_sequence"),
            StopReason::Other("stop_sequence".to_string())
        );
    }

    #[test]
    fn truncated_response() {
        let mut response = LlmResponse::from_text("Bitcoin is");
        response.stop_reason = Some(StopReason::MaxTokens);
        assert!(response.is_truncated());
    }
}
