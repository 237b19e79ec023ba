//! Session domain entities

use super::response::{ContentBlock, LlmResponse};
use crate::core::error::DomainError;
use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One piece of a message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<MessageContent>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![MessageContent::Text(text.into())],
        }
    }

    /// Tool use ids carried by this message, in order
    pub fn tool_use_ids(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|c| match c {
                MessageContent::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// The message history of a single query (Entity)
///
/// Append-only. Seeded with the formatted query as the only user message,
/// then alternates assistant turns with user turns carrying tool results.
/// Every tool use in an assistant turn must be answered before the
/// conversation can be sent to the model again.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(formatted_query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(formatted_query)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the model's turn, keeping its text and tool use blocks in order.
    ///
    /// Empty text blocks are dropped since the model API rejects them on
    /// resubmission.
    pub fn push_assistant(&mut self, response: &LlmResponse) {
        let content = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(text) if text.trim().is_empty() => None,
                ContentBlock::Text(text) => Some(MessageContent::Text(text.clone())),
                ContentBlock::ToolUse { id, name, input } => Some(MessageContent::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
            })
            .collect();
        self.messages.push(Message {
            role: Role::Assistant,
            content,
        });
    }

    /// Tool use ids of the last assistant turn that still await results.
    pub fn pending_tool_use_ids(&self) -> Vec<&str> {
        match self.messages.last() {
            Some(m) if m.role == Role::Assistant => m.tool_use_ids(),
            _ => Vec::new(),
        }
    }

    /// Append one user message answering every pending tool use.
    ///
    /// Results are reordered to match the order of the tool uses. Fails when
    /// a tool use is left unanswered, answered twice, or when a result does
    /// not belong to the pending round.
    pub fn push_tool_results(&mut self, results: &[ToolResult]) -> Result<(), DomainError> {
        let pending: Vec<String> = self
            .pending_tool_use_ids()
            .into_iter()
            .map(str::to_string)
            .collect();

        if let Some(stray) = results
            .iter()
            .find(|r| !pending.iter().any(|id| *id == r.call_id))
        {
            return Err(DomainError::UnexpectedToolResult(stray.call_id.clone()));
        }

        let mut content = Vec::with_capacity(pending.len());
        for id in &pending {
            let mut matching = results.iter().filter(|r| r.call_id == *id);
            let result = matching
                .next()
                .ok_or_else(|| DomainError::UnpairedToolCall(id.clone()))?;
            if matching.next().is_some() {
                return Err(DomainError::UnexpectedToolResult(id.clone()));
            }
            content.push(MessageContent::ToolResult {
                tool_use_id: id.clone(),
                content: result.content.clone(),
                is_error: !result.success,
            });
        }

        self.messages.push(Message {
            role: Role::User,
            content,
        });
        Ok(())
    }

    /// Check the conversation may be submitted to the model.
    pub fn ensure_ready_for_model(&self) -> Result<(), DomainError> {
        if let Some(id) = self.pending_tool_use_ids().first() {
            return Err(DomainError::UnpairedToolCall((*id).to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::response::StopReason;
    use crate::tool::value_objects::ToolError;
    use serde_json::json;

    fn tool_turn(ids: &[&str]) -> LlmResponse {
        let mut content = vec![ContentBlock::Text("Let me check.".to_string())];
        content.extend(ids.iter().map(|id| ContentBlock::ToolUse {
            id: id.to_string(),
            name: "get_price".to_string(),
            input: json!({ "id": "bitcoin" }),
        }));
        LlmResponse {
            content,
            stop_reason: Some(StopReason::ToolUse),
            model: None,
        }
    }

    #[test]
    fn test_new_conversation_has_single_user_message() {
        let conv = Conversation::new("What is the price of bitcoin?");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0].role, Role::User);
        assert!(conv.ensure_ready_for_model().is_ok());
    }

    #[test]
    fn test_push_assistant_keeps_order_and_drops_blank_text() {
        let mut conv = Conversation::new("q");
        let mut response = tool_turn(&["a"]);
        response.content.insert(0, ContentBlock::Text("  ".to_string()));
        conv.push_assistant(&response);

        let last = conv.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content.len(), 2);
        assert!(matches!(last.content[0], MessageContent::Text(_)));
        assert_eq!(conv.pending_tool_use_ids(), vec!["a"]);
    }

    #[test]
    fn test_unanswered_tool_use_blocks_model_call() {
        let mut conv = Conversation::new("q");
        conv.push_assistant(&tool_turn(&["a"]));
        assert_eq!(
            conv.ensure_ready_for_model(),
            Err(DomainError::UnpairedToolCall("a".to_string()))
        );
    }

    #[test]
    fn test_push_tool_results_reorders_to_match_calls() {
        let mut conv = Conversation::new("q");
        conv.push_assistant(&tool_turn(&["a", "b"]));

        let results = vec![
            ToolResult::success("b", "get_price", "B"),
            ToolResult::failure("a", "get_price", ToolError::timeout("get_price")),
        ];
        conv.push_tool_results(&results).unwrap();

        let last = conv.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        match (&last.content[0], &last.content[1]) {
            (
                MessageContent::ToolResult {
                    tool_use_id: first,
                    is_error: first_err,
                    ..
                },
                MessageContent::ToolResult {
                    tool_use_id: second,
                    is_error: second_err,
                    ..
                },
            ) => {
                assert_eq!(first, "a");
                assert!(*first_err);
                assert_eq!(second, "b");
                assert!(!*second_err);
            }
            other => panic!("unexpected content: {:?}", other),
        }
        assert!(conv.ensure_ready_for_model().is_ok());
    }

    #[test]
    fn test_missing_result_is_rejected() {
        let mut conv = Conversation::new("q");
        conv.push_assistant(&tool_turn(&["a", "b"]));

        let err = conv
            .push_tool_results(&[ToolResult::success("a", "get_price", "A")])
            .unwrap_err();
        assert_eq!(err, DomainError::UnpairedToolCall("b".to_string()));
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_stray_and_duplicate_results_are_rejected() {
        let mut conv = Conversation::new("q");
        conv.push_assistant(&tool_turn(&["a"]));

        let stray = conv.push_tool_results(&[
            ToolResult::success("a", "get_price", "A"),
            ToolResult::success("zzz", "get_price", "Z"),
        ]);
        assert_eq!(
            stray,
            Err(DomainError::UnexpectedToolResult("zzz".to_string()))
        );

        let duplicate = conv.push_tool_results(&[
            ToolResult::success("a", "get_price", "A"),
            ToolResult::success("a", "get_price", "A"),
        ]);
        assert_eq!(
            duplicate,
            Err(DomainError::UnexpectedToolResult("a".to_string()))
        );
    }

    #[test]
    fn test_results_without_pending_round_are_rejected() {
        let mut conv = Conversation::new("q");
        let err = conv
            .push_tool_results(&[ToolResult::success("a", "get_price", "A")])
            .unwrap_err();
        assert_eq!(err, DomainError::UnexpectedToolResult("a".to_string()));
    }
}
