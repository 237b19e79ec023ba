//! Messages API wire types.
//!
//! Requests are built from domain [`Message`]s; responses are turned back
//! into [`LlmResponse`]. Nothing outside this module sees these shapes.

use cryptovox_domain::{ContentBlock, LlmResponse, Message, MessageContent, Role, StopReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    pub tools: &'a [Value],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl<'a> MessagesRequest<'a> {
    pub fn new(
        model: &'a str,
        max_tokens: u32,
        messages: &[Message],
        tools: &'a [Value],
        stream: bool,
    ) -> Self {
        Self {
            model,
            max_tokens,
            messages: messages.iter().map(ApiMessage::from).collect(),
            tools,
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub role: &'static str,
    pub content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl From<&Message> for ApiMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        let content = message
            .content
            .iter()
            .map(|part| match part {
                MessageContent::Text(text) => ApiContentBlock::Text { text: text.clone() },
                MessageContent::ToolUse { id, name, input } => ApiContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                },
                MessageContent::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => ApiContentBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: content.clone(),
                    is_error: *is_error,
                },
            })
            .collect();
        Self { role, content }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

impl MessagesResponse {
    /// Keep text and tool use blocks; anything else the API adds is ignored.
    pub fn into_llm_response(self) -> LlmResponse {
        let content = self
            .content
            .into_iter()
            .filter_map(|block| match block.block_type.as_str() {
                "text" => block.text.map(ContentBlock::Text),
                "tool_use" => match (block.id, block.name) {
                    (Some(id), Some(name)) => Some(ContentBlock::ToolUse {
                        id,
                        name,
                        input: block.input.unwrap_or(Value::Null),
                    }),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        LlmResponse {
            content,
            stop_reason: self.stop_reason.as_deref().map(StopReason::from_wire),
            model: self.model,
        }
    }
}

/// `{"type":"error","error":{"type":"...","message":"..."}}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}
