//! Infrastructure layer for cryptovox
//!
//! Adapters for the ports defined in the application layer: the Anthropic
//! Messages gateway, the MCP data provider, the caching tool executor,
//! configuration loading and transcript logging. [`VoiceAssistantService`]
//! wires them together.

pub mod anthropic;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod service;
pub mod tools;

// Re-export commonly used types
pub use anthropic::AnthropicGateway;
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use logging::JsonlConversationLogger;
pub use mcp::{McpClient, McpError, McpServerConfig};
pub use service::{ServiceError, VoiceAssistantService};
pub use tools::{
    CachingToolExecutor, CatalogError, JsonSchemaToolConverter, ResultCache, discover_catalog,
};
