//! [`ToolProvider`] implementation backed by an MCP session.

use async_trait::async_trait;
use cryptovox_domain::{ProviderError, ToolDefinition, ToolProvider};
use serde_json::Value;
use tracing::debug;

use super::client::McpClient;
use super::error::is_rate_limit;

#[async_trait]
impl ToolProvider for McpClient {
    fn id(&self) -> &str {
        McpClient::id(self)
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
        let tools = self
            .list_tools()
            .await
            .map_err(|e| ProviderError::DiscoveryFailed(e.to_string()))?;

        Ok(tools
            .into_iter()
            .map(|tool| {
                ToolDefinition::new(tool.name, tool.description.unwrap_or_default())
                    .with_input_schema(tool.input_schema)
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, ProviderError> {
        let result = self
            .invoke_tool(name, arguments)
            .await
            .map_err(|e| e.into_provider_error(name))?;

        let text = result.text();
        if result.is_error {
            debug!(tool = name, "MCP tool reported an error result");
            return Err(if is_rate_limit(&text) {
                ProviderError::RateLimited(text)
            } else {
                ProviderError::ExecutionFailed(text)
            });
        }
        Ok(text)
    }

    async fn shutdown(&self) {
        McpClient::shutdown(self).await;
    }
}
