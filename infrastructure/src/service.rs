//! Service assembly.
//!
//! [`VoiceAssistantService`] owns everything one running assistant needs:
//! the model gateway, the data provider process, the tool catalog and the
//! result cache. Queries answered through the same instance share the cache
//! and catalog; nothing else carries over between them.

use crate::anthropic::AnthropicGateway;
use crate::config::{ConfigValidationError, FileConfig};
use crate::logging::JsonlConversationLogger;
use crate::mcp::{McpClient, McpError};
use crate::tools::{
    CachingToolExecutor, CatalogError, JsonSchemaToolConverter, ResultCache, discover_catalog,
};
use cryptovox_application::{
    AnswerQueryError, AnswerQueryInput, AnswerQueryOutput, AnswerQueryUseCase, ExecutionParams,
    GatewayError, LlmGateway, QueryProgressNotifier, ToolExecutorPort,
};
use cryptovox_domain::{Query, ToolProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Startup failures. Any of these means no query can be served.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("Model gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Data provider failed to start: {0}")]
    Provider(#[from] McpError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Cannot open conversation log {path}: {source}")]
    ConversationLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A ready-to-serve voice assistant.
pub struct VoiceAssistantService {
    provider: Arc<dyn ToolProvider>,
    executor: Arc<CachingToolExecutor>,
    use_case: AnswerQueryUseCase,
    execution: ExecutionParams,
}

impl VoiceAssistantService {
    /// Validate the configuration, start the MCP server and build the
    /// tool catalog.
    pub async fn create(config: &FileConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let started = Instant::now();

        let api_key = config.model.api_key.as_deref().unwrap_or_default();
        let gateway = AnthropicGateway::new(
            api_key,
            &config.model.base_url,
            config.model_request_timeout(),
        )?;

        let client = McpClient::spawn(&config.provider.to_server_config()).await?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Data provider connected"
        );

        Self::with_adapters(config, Arc::new(gateway), Arc::new(client)).await
    }

    /// Build the service around already-constructed adapters.
    ///
    /// The provider is shut down again if the catalog cannot be built.
    pub async fn with_adapters(
        config: &FileConfig,
        gateway: Arc<dyn LlmGateway>,
        provider: Arc<dyn ToolProvider>,
    ) -> Result<Self, ServiceError> {
        let tool_spec = match discover_catalog(provider.as_ref()).await {
            Ok(spec) => spec,
            Err(e) => {
                provider.shutdown().await;
                return Err(e.into());
            }
        };

        let cache = Arc::new(ResultCache::new(
            config.cache_ttl(),
            config.orchestration.cache_max_entries,
        ));
        let executor = Arc::new(CachingToolExecutor::new(
            Arc::clone(&provider),
            tool_spec,
            cache,
        ));

        let mut use_case = AnswerQueryUseCase::new(
            gateway,
            Arc::clone(&executor) as Arc<dyn ToolExecutorPort>,
            Arc::new(JsonSchemaToolConverter),
        );
        if let Some(path) = &config.logging.conversation_log {
            let logger = match JsonlConversationLogger::open(path) {
                Ok(logger) => logger,
                Err(source) => {
                    provider.shutdown().await;
                    return Err(ServiceError::ConversationLog {
                        path: path.clone(),
                        source,
                    });
                }
            };
            use_case = use_case.with_conversation_logger(Arc::new(logger));
        }

        Ok(Self {
            provider,
            executor,
            use_case,
            execution: config.to_execution_params(),
        })
    }

    /// Answer one query. Concurrent calls are independent.
    pub async fn answer(
        &self,
        query: Query,
        progress: &dyn QueryProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<AnswerQueryOutput, AnswerQueryError> {
        let input = AnswerQueryInput::new(query, self.execution.clone());
        self.use_case.execute(input, progress, cancel).await
    }

    /// Names of the tools in the catalog, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        self.executor
            .available_tools()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn execution(&self) -> &ExecutionParams {
        &self.execution
    }

    pub fn cached_results(&self) -> usize {
        self.executor.cache().len()
    }

    /// Stop the data provider. Queries after this fail their tool calls.
    pub async fn shutdown(&self) {
        info!(provider = self.provider.id(), "Shutting down");
        self.provider.shutdown().await;
    }
}
