//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Descriptor of a tool the model may call
///
/// Loaded once from the provider catalog at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "get_simple_price")
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON Schema describing the tool's arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: empty_object_schema(),
        }
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = if schema.is_object() {
            schema
        } else {
            empty_object_schema()
        };
        self
    }

    /// Names listed under the schema's `required` array
    pub fn required_parameters(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Catalog of available tools, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Tool names in lexical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<ToolDefinition> for ToolSpec {
    fn from_iter<I: IntoIterator<Item = ToolDefinition>>(iter: I) -> Self {
        iter.into_iter().fold(ToolSpec::new(), ToolSpec::register)
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque correlation token assigned by the model API (e.g. "toolu_01…")
    pub id: String,
    /// Name of the tool to call
    pub tool_name: String,
    /// Structured arguments (normally a JSON object)
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Short human-readable preview of the arguments for logs and progress
    pub fn args_preview(&self, max_chars: usize) -> String {
        let raw = match &self.arguments {
            Value::Object(map) if map.is_empty() => return String::new(),
            other => other.to_string(),
        };
        if raw.chars().count() <= max_chars {
            raw
        } else {
            let truncated: String = raw.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{}…", truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition() {
        let tool = ToolDefinition::new("get_simple_price", "Current price of coins")
            .with_input_schema(json!({
                "type": "object",
                "properties": { "ids": { "type": "string" }, "vs_currencies": { "type": "string" } },
                "required": ["ids", "vs_currencies"]
            }));

        assert_eq!(tool.name, "get_simple_price");
        assert_eq!(tool.required_parameters(), vec!["ids", "vs_currencies"]);
    }

    #[test]
    fn test_non_object_schema_is_replaced() {
        let tool = ToolDefinition::new("ping", "Ping").with_input_schema(Value::Null);
        assert_eq!(tool.input_schema["type"], "object");
        assert!(tool.required_parameters().is_empty());
    }

    #[test]
    fn test_tool_spec() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("get_coins_markets", "Markets"))
            .register(ToolDefinition::new("get_search", "Search"));

        assert!(spec.get("get_search").is_some());
        assert!(spec.contains("get_coins_markets"));
        assert!(spec.get("unknown").is_none());
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.names(), vec!["get_coins_markets", "get_search"]);
    }

    #[test]
    fn test_tool_spec_from_iter_last_wins() {
        let spec: ToolSpec = vec![
            ToolDefinition::new("a", "first"),
            ToolDefinition::new("a", "second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(spec.len(), 1);
        assert_eq!(spec.get("a").unwrap().description, "second");
    }

    #[test]
    fn test_tool_call() {
        let call = ToolCall::new("toolu_1", "get_price", json!({ "id": "bitcoin" }));

        assert_eq!(call.tool_name, "get_price");
        assert_eq!(call.get_string("id"), Some("bitcoin"));
        assert_eq!(call.get_string("missing"), None);
    }

    #[test]
    fn test_args_preview() {
        let empty = ToolCall::new("t", "ping", json!({}));
        assert_eq!(empty.args_preview(20), "");

        let call = ToolCall::new("t", "get_price", json!({ "id": "bitcoin" }));
        assert_eq!(call.args_preview(50), r#"{"id":"bitcoin"}"#);

        let long = ToolCall::new("t", "get_price", json!({ "ids": "a".repeat(100) }));
        let preview = long.args_preview(20);
        assert_eq!(preview.chars().count(), 20);
        assert!(preview.ends_with('…'));
    }
}
