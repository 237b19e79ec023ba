//! Tool provider abstraction
//!
//! This module defines the [`ToolProvider`] trait, which abstracts the external
//! data provider that actually serves cryptocurrency tools.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              Tool executor                    │
//! │  (catalog lookup, result cache, timeout)      │
//! └───────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!                ┌──────────────┐
//!                │ ToolProvider │  e.g. MCP server over stdio
//!                └──────────────┘
//! ```
//!
//! The provider only discovers and invokes. Caching, unknown-tool handling and
//! timeouts are the executor's job, so a provider implementation stays a thin
//! transport adapter.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::entities::ToolDefinition;
use super::value_objects::ToolError;

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider is not available (process not running, connection closed)
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    /// Failed to discover tools from the provider
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Tool not found in this provider
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The provider rejected the arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Upstream quota exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider did not answer in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Tool execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The provider answered with something we could not interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Map onto the error carried inside a [`ToolResult`](super::ToolResult).
    pub fn to_tool_error(&self, tool_name: &str) -> ToolError {
        match self {
            ProviderError::ToolNotFound(_) => ToolError::unknown_tool(tool_name),
            ProviderError::InvalidArguments(msg) => ToolError::invalid_argument(msg.clone()),
            ProviderError::Timeout(_) => ToolError::timeout(tool_name),
            other => ToolError::execution_failed(other.to_string()),
        }
    }
}

/// External source of tools
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "mcp:coingecko"
    fn id(&self) -> &str;

    /// Discover the tools this provider offers.
    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError>;

    /// Invoke a tool by name and return its output as text.
    ///
    /// Implementations flatten whatever content shape the provider uses into
    /// a single string suitable for handing back to the model.
    async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, ProviderError>;

    /// Release the provider's resources. Idempotent.
    async fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockProvider {
        tools: Vec<ToolDefinition>,
        available: bool,
    }

    impl MockProvider {
        fn new(available: bool) -> Self {
            Self {
                tools: Vec::new(),
                available,
            }
        }

        fn with_tool(mut self, name: &str) -> Self {
            self.tools
                .push(ToolDefinition::new(name, format!("Mock tool: {}", name)));
            self
        }
    }

    #[async_trait]
    impl ToolProvider for MockProvider {
        fn id(&self) -> &str {
            "mock"
        }

        async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
            if self.available {
                Ok(self.tools.clone())
            } else {
                Err(ProviderError::NotAvailable("mock offline".into()))
            }
        }

        async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, ProviderError> {
            if self.tools.iter().any(|t| t.name == name) {
                Ok(json!({ "tool": name, "args": arguments }).to_string())
            } else {
                Err(ProviderError::ToolNotFound(name.to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_provider_discovery() {
        let provider = MockProvider::new(true)
            .with_tool("get_simple_price")
            .with_tool("get_coins_markets");

        let tools = provider.discover_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().any(|t| t.name == "get_simple_price"));
        assert_eq!(provider.id(), "mock");
    }

    #[tokio::test]
    async fn test_provider_not_available() {
        let provider = MockProvider::new(false);
        assert!(matches!(
            provider.discover_tools().await,
            Err(ProviderError::NotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_call() {
        let provider = MockProvider::new(true).with_tool("get_simple_price");

        let out = provider
            .call_tool("get_simple_price", &json!({ "ids": "bitcoin" }))
            .await
            .unwrap();
        assert!(out.contains("bitcoin"));

        let err = provider.call_tool("nope", &json!({})).await.unwrap_err();
        assert_eq!(err.to_tool_error("nope").code, "NOT_FOUND");
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ProviderError::Timeout("10s".into())
                .to_tool_error("get_price")
                .code,
            "TIMEOUT"
        );
        assert_eq!(
            ProviderError::InvalidArguments("ids is required".into())
                .to_tool_error("get_price")
                .message,
            "ids is required"
        );
        let err = ProviderError::RateLimited("429".into()).to_tool_error("get_price");
        assert_eq!(err.code, "EXECUTION_FAILED");
        assert!(err.message.contains("429"));
    }
}
