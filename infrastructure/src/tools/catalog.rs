//! Tool catalog discovery.
//!
//! Builds the immutable [`ToolSpec`] a service instance works with. Discovery
//! runs once at startup; a provider that cannot be reached or that offers no
//! tools is a startup failure, not something a query can recover from.

use cryptovox_domain::tool::{
    entities::ToolSpec,
    provider::{ProviderError, ToolProvider},
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of tool names shown in the startup announcement
const ANNOUNCED_TOOLS: usize = 5;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Tool discovery failed for provider '{provider}': {source}")]
    Discovery {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Provider '{0}' offers no tools")]
    Empty(String),
}

/// Discover the provider's tools and build the catalog.
///
/// Tools with an empty name are skipped. When a name repeats, the last
/// definition wins.
pub async fn discover_catalog(provider: &dyn ToolProvider) -> Result<ToolSpec, CatalogError> {
    let tools = provider
        .discover_tools()
        .await
        .map_err(|source| CatalogError::Discovery {
            provider: provider.id().to_string(),
            source,
        })?;

    let mut spec = ToolSpec::new();
    for tool in tools {
        if tool.name.trim().is_empty() {
            warn!(provider = provider.id(), "Skipping tool with empty name");
            continue;
        }
        if spec.contains(&tool.name) {
            warn!(tool = %tool.name, "Duplicate tool name; keeping the later definition");
        }
        debug!(tool = %tool.name, provider = provider.id(), "Registered tool");
        spec = spec.register(tool);
    }

    if spec.is_empty() {
        return Err(CatalogError::Empty(provider.id().to_string()));
    }

    announce(provider.id(), &spec);
    Ok(spec)
}

fn announce(provider: &str, spec: &ToolSpec) {
    let names = spec.names();
    let shown: Vec<&str> = names.iter().take(ANNOUNCED_TOOLS).copied().collect();
    let more = names.len().saturating_sub(shown.len());
    info!(
        provider,
        count = spec.len(),
        tools = %shown.join(", "),
        more,
        "Tool catalog ready"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cryptovox_domain::ToolDefinition;
    use serde_json::Value;

    struct StaticProvider {
        tools: Result<Vec<ToolDefinition>, String>,
    }

    #[async_trait]
    impl ToolProvider for StaticProvider {
        fn id(&self) -> &str {
            "static"
        }

        async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
            self.tools
                .clone()
                .map_err(ProviderError::DiscoveryFailed)
        }

        async fn call_tool(&self, name: &str, _arguments: &Value) -> Result<String, ProviderError> {
            Err(ProviderError::ToolNotFound(name.to_string()))
        }
    }

    #[tokio::test]
    async fn test_catalog_from_provider() {
        let provider = StaticProvider {
            tools: Ok(vec![
                ToolDefinition::new("get_simple_price", "Prices"),
                ToolDefinition::new("", "nameless"),
                ToolDefinition::new("get_coins_markets", "Markets"),
            ]),
        };

        let spec = discover_catalog(&provider).await.unwrap();
        assert_eq!(spec.len(), 2);
        assert!(spec.contains("get_simple_price"));

        assert_eq!(spec.names(), vec!["get_coins_markets", "get_simple_price"]);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_fatal() {
        let provider = StaticProvider { tools: Ok(vec![]) };
        assert!(matches!(
            discover_catalog(&provider).await,
            Err(CatalogError::Empty(id)) if id == "static"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_fatal() {
        let provider = StaticProvider {
            tools: Err("connection refused".to_string()),
        };
        let err = discover_catalog(&provider).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
