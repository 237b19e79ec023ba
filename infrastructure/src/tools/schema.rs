//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] producing the
//! `{name, description, input_schema}` descriptors the Messages API expects.

use cryptovox_application::ports::tool_schema::ToolSchemaPort;
use cryptovox_domain::tool::entities::{ToolDefinition, ToolSpec};
use serde_json::{Value, json};

/// Passes the provider's JSON Schema through, guaranteeing an object schema.
pub struct JsonSchemaToolConverter;

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut input_schema = tool.input_schema.clone();
        if let Value::Object(map) = &mut input_schema {
            map.entry("type").or_insert_with(|| json!("object"));
            map.entry("properties").or_insert_with(|| json!({}));
        }

        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": input_schema,
        })
    }

    fn all_tools_schema(&self, spec: &ToolSpec) -> Vec<Value> {
        let mut tools: Vec<&ToolDefinition> = spec.all().collect();
        tools.sort_by_key(|t| &t.name);
        tools.into_iter().map(|t| self.tool_to_schema(t)).collect()
    }
}
