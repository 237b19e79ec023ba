//! Caching tool executor - the concrete implementation of [`ToolExecutorPort`].
//!
//! # Execution Path
//!
//! ```text
//! ToolExecutorPort::execute()
//!   ├─ cache hit?            → success (provider not called)
//!   ├─ unknown tool?         → NOT_FOUND failure
//!   ├─ arguments invalid?    → INVALID_ARGUMENT failure
//!   └─ provider.call_tool()  → success (stored in cache) | failure
//! ```
//!
//! Nothing here returns an error to the caller: every outcome is a
//! [`ToolResult`] the model gets to read.

use crate::tools::cache::ResultCache;
use async_trait::async_trait;
use cryptovox_application::ports::tool_executor::ToolExecutorPort;
use cryptovox_domain::tool::{
    entities::{ToolCall, ToolDefinition, ToolSpec},
    provider::ToolProvider,
    value_objects::{ToolError, ToolResult},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Executor that serves tool calls from a [`ToolProvider`] behind a
/// [`ResultCache`].
pub struct CachingToolExecutor {
    provider: Arc<dyn ToolProvider>,
    tool_spec: ToolSpec,
    cache: Arc<ResultCache>,
}

impl CachingToolExecutor {
    pub fn new(provider: Arc<dyn ToolProvider>, tool_spec: ToolSpec, cache: Arc<ResultCache>) -> Self {
        Self {
            provider,
            tool_spec,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}

/// `null` means "no arguments"; everything else is passed through as-is.
fn normalize_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    }
}

fn check_arguments(tool: &ToolDefinition, arguments: &Value) -> Result<(), ToolError> {
    let Some(map) = arguments.as_object() else {
        return Err(ToolError::invalid_argument(format!(
            "Arguments for '{}' must be a JSON object",
            tool.name
        )));
    };
    let missing: Vec<&str> = tool
        .required_parameters()
        .into_iter()
        .filter(|p| !map.contains_key(*p))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolError::invalid_argument(format!(
            "Missing required argument(s) for '{}': {}",
            tool.name,
            missing.join(", ")
        )))
    }
}

#[async_trait]
impl ToolExecutorPort for CachingToolExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    async fn execute(&self, call: &ToolCall) -> ToolResult {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;
        let arguments = normalize_arguments(&call.arguments);

        if let Some(hit) = self.cache.get(&call.tool_name, &arguments) {
            debug!(tool = %call.tool_name, "Serving tool result from cache");
            return ToolResult::success(&call.id, &call.tool_name, hit)
                .from_cache()
                .with_duration(elapsed_ms());
        }

        let Some(tool) = self.tool_spec.get(&call.tool_name) else {
            warn!(tool = %call.tool_name, "Model requested unknown tool");
            return ToolResult::failure(
                &call.id,
                &call.tool_name,
                ToolError::unknown_tool(&call.tool_name),
            );
        };

        if let Err(e) = check_arguments(tool, &arguments) {
            warn!(tool = %call.tool_name, error = %e, "Rejected tool arguments");
            return ToolResult::failure(&call.id, &call.tool_name, e);
        }

        match self.provider.call_tool(&call.tool_name, &arguments).await {
            Ok(output) => {
                self.cache.put(&call.tool_name, &arguments, output.clone());
                ToolResult::success(&call.id, &call.tool_name, output).with_duration(elapsed_ms())
            }
            Err(e) => {
                warn!(
                    tool = %call.tool_name,
                    provider = self.provider.id(),
                    error = %e,
                    "Tool call failed"
                );
                ToolResult::failure(&call.id, &call.tool_name, e.to_tool_error(&call.tool_name))
                    .with_duration(elapsed_ms())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptovox_domain::tool::provider::ProviderError;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Provider that records every call and answers from a script.
    struct CountingProvider {
        calls: Mutex<Vec<(String, Value)>>,
        fail_with: Option<fn() -> ProviderError>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(f: fn() -> ProviderError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(f),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ToolProvider for CountingProvider {
        fn id(&self) -> &str {
            "counting"
        }

        async fn discover_tools(&self) -> Result<Vec<ToolDefinition>, ProviderError> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            match self.fail_with {
                Some(f) => Err(f()),
                None => Ok(format!("{{\"price\":67000,\"n\":{}}}", self.call_count())),
            }
        }
    }

    fn spec() -> ToolSpec {
        ToolSpec::new()
            .register(
                ToolDefinition::new("get_price", "Current price").with_input_schema(json!({
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                })),
            )
            .register(ToolDefinition::new("get_trending", "Trending coins"))
    }

    fn executor(provider: Arc<CountingProvider>, ttl: Duration) -> CachingToolExecutor {
        CachingToolExecutor::new(provider, spec(), Arc::new(ResultCache::new(ttl, 64)))
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_hits_cache() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_secs(15));

        let first = executor
            .execute(&ToolCall::new("a", "get_price", json!({ "id": "bitcoin" })))
            .await;
        let second = executor
            .execute(&ToolCall::new("b", "get_price", json!({ "id": "bitcoin" })))
            .await;

        assert_eq!(provider.call_count(), 1);
        assert!(second.is_success());
        assert!(second.metadata.cached);
        assert_eq!(second.call_id, "b");
        assert_eq!(first.content, second.content);
    }

    #[tokio::test]
    async fn test_provider_reinvoked_after_ttl() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_millis(50));
        let call = ToolCall::new("a", "get_price", json!({ "id": "bitcoin" }));

        executor.execute(&call).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        let again = executor.execute(&call).await;

        assert_eq!(provider.call_count(), 2);
        assert!(!again.metadata.cached);
        assert!(again.content.contains("\"n\":2"));
    }

    #[tokio::test]
    async fn test_argument_key_order_shares_cache_entry() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_secs(15));

        let a: Value = serde_json::from_str(r#"{"id":"bitcoin","vs":"usd"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"vs":"usd","id":"bitcoin"}"#).unwrap();
        executor.execute(&ToolCall::new("1", "get_price", a)).await;
        executor.execute(&ToolCall::new("2", "get_price", b)).await;

        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_secs(15));

        let result = executor
            .execute(&ToolCall::new("x", "get_weather", json!({})))
            .await;

        assert!(!result.is_success());
        assert_eq!(result.call_id, "x");
        assert_eq!(result.error().unwrap().code, "NOT_FOUND");
        assert!(result.content.contains("get_weather"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_secs(15));

        let result = executor
            .execute(&ToolCall::new("x", "get_price", json!({ "vs": "usd" })))
            .await;
        assert_eq!(result.error().unwrap().code, "INVALID_ARGUMENT");
        assert!(result.error().unwrap().message.contains("id"));

        let result = executor
            .execute(&ToolCall::new("y", "get_price", json!("bitcoin")))
            .await;
        assert_eq!(result.error().unwrap().code, "INVALID_ARGUMENT");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_null_arguments_are_empty_object() {
        let provider = Arc::new(CountingProvider::new());
        let executor = executor(provider.clone(), Duration::from_secs(15));

        let result = executor
            .execute(&ToolCall::new("t", "get_trending", Value::Null))
            .await;
        assert!(result.is_success());
        assert_eq!(provider.calls.lock().unwrap()[0].1, json!({}));
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_cached() {
        let provider = Arc::new(CountingProvider::failing(|| {
            ProviderError::RateLimited("429 Too Many Requests".into())
        }));
        let executor = executor(provider.clone(), Duration::from_secs(15));
        let call = ToolCall::new("a", "get_price", json!({ "id": "bitcoin" }));

        let result = executor.execute(&call).await;
        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().code, "EXECUTION_FAILED");
        assert!(result.content.contains("429"));

        executor.execute(&call).await;
        assert_eq!(provider.call_count(), 2);
        assert!(executor.cache().is_empty());
    }
}
