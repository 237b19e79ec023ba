//! Tool schema conversion port.
//!
//! Separates "which tools exist" (domain [`ToolSpec`]) from "how the model API
//! wants them serialized" (infrastructure).

use cryptovox_domain::tool::entities::{ToolDefinition, ToolSpec};

/// Port for converting tool definitions to the model API's descriptor format.
pub trait ToolSchemaPort: Send + Sync {
    /// Convert a single tool definition to a descriptor.
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value;

    /// Convert all tools to a descriptor array (sorted by name).
    fn all_tools_schema(&self, spec: &ToolSpec) -> Vec<serde_json::Value>;
}
