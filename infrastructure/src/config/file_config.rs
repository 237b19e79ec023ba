//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. Every section has defaults,
//! so an empty file (or no file at all) yields a usable configuration once
//! the credentials are supplied through the environment.

use crate::mcp::McpServerConfig;
use cryptovox_application::ExecutionParams;
use cryptovox_application::config::execution_params::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Provider id used for the CoinGecko MCP server
pub const COINGECKO_PROVIDER_ID: &str = "mcp:coingecko";

/// Default CoinGecko MCP endpoint bridged by `mcp-remote`
pub const DEFAULT_SERVER_URL: &str = "https://mcp.pro-api.coingecko.com/sse";

/// Header carrying the CoinGecko key on the remote endpoint
const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("model API key is not set (ANTHROPIC_API_KEY or [model] api_key)")]
    MissingModelApiKey,

    #[error("data provider API key is not set (COINGECKO_PRO_API_KEY or [provider] api_key)")]
    MissingProviderApiKey,

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("max_tokens cannot be 0")]
    InvalidMaxTokens,

    #[error("max_tool_rounds cannot be 0")]
    InvalidMaxRounds,

    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("cache_ttl_seconds cannot be 0")]
    InvalidCacheTtl,

    #[error("provider command cannot be empty")]
    EmptyProviderCommand,
}

/// `[model]`: the Messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub streaming: bool,
    pub request_timeout_seconds: u64,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: crate::anthropic::DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            streaming: true,
            request_timeout_seconds: 60,
        }
    }
}

/// `[provider]`: the MCP data provider process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub command: String,
    /// Arguments placed before the server URL
    pub args: Vec<String>,
    pub server_url: String,
    pub api_key: Option<String>,
    /// Passed to the child as `COINGECKO_ENVIRONMENT`
    pub environment: Option<String>,
    pub request_timeout_seconds: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "mcp-remote".to_string()],
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            environment: None,
            request_timeout_seconds: 30,
        }
    }
}

impl FileProviderConfig {
    /// Launch description: `<command> <args..> <server_url> --header "x-cg-pro-api-key: KEY"`.
    pub fn to_server_config(&self) -> McpServerConfig {
        let mut config = McpServerConfig::new(COINGECKO_PROVIDER_ID, &self.command)
            .with_args(self.args.iter().cloned())
            .with_request_timeout(Duration::from_secs(self.request_timeout_seconds));

        if !self.server_url.trim().is_empty() {
            config = config.with_arg(&self.server_url);
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config
                .with_arg("--header")
                .with_arg(format!("{API_KEY_HEADER}: {key}"))
                .with_env("COINGECKO_PRO_API_KEY", key);
        }
        if let Some(env) = self.environment.as_deref().filter(|e| !e.is_empty()) {
            config = config.with_env("COINGECKO_ENVIRONMENT", env);
        }
        config
    }
}

/// `[orchestration]`: query loop limits and caching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    pub max_tool_rounds: usize,
    pub tool_timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: usize,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            tool_timeout_seconds: 10,
            cache_ttl_seconds: 15,
            cache_max_entries: 1024,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of every query, when set
    pub conversation_log: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub model: FileModelConfig,
    pub provider: FileProviderConfig,
    pub orchestration: FileOrchestrationConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self
            .model
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            return Err(ConfigValidationError::MissingModelApiKey);
        }
        if self
            .provider
            .api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            return Err(ConfigValidationError::MissingProviderApiKey);
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigValidationError::InvalidMaxTokens);
        }
        if self.model.request_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout(
                "model.request_timeout_seconds",
            ));
        }
        if self.provider.command.trim().is_empty() {
            return Err(ConfigValidationError::EmptyProviderCommand);
        }
        if self.provider.request_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout(
                "provider.request_timeout_seconds",
            ));
        }
        if self.orchestration.max_tool_rounds == 0 {
            return Err(ConfigValidationError::InvalidMaxRounds);
        }
        if self.orchestration.tool_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout(
                "orchestration.tool_timeout_seconds",
            ));
        }
        if self.orchestration.cache_ttl_seconds == 0 {
            return Err(ConfigValidationError::InvalidCacheTtl);
        }
        Ok(())
    }

    /// Query loop parameters derived from `[model]` and `[orchestration]`.
    pub fn to_execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_model(self.model.model.trim())
            .with_max_tokens(self.model.max_tokens)
            .with_max_tool_rounds(self.orchestration.max_tool_rounds)
            .with_tool_call_timeout(Duration::from_secs(
                self.orchestration.tool_timeout_seconds,
            ))
            .with_streaming(self.model.streaming)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.orchestration.cache_ttl_seconds)
    }

    pub fn model_request_timeout(&self) -> Duration {
        Duration::from_secs(self.model.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_keys(mut config: FileConfig) -> FileConfig {
        config.model.api_key = Some("sk-ant-test".into());
        config.provider.api_key = Some("CG-test".into());
        config
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[model]
api_key = "sk-ant-test"
model = "claude-3-5-sonnet-20241022"
max_tokens = 512
streaming = false

[provider]
command = "/usr/local/bin/mcp-remote"
args = []
server_url = "https://mcp.api.coingecko.com/sse"
api_key = "CG-test"
environment = "demo"

[orchestration]
max_tool_rounds = 3
tool_timeout_seconds = 4
cache_ttl_seconds = 30
cache_max_entries = 64

[logging]
conversation_log = "/tmp/cryptovox.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.model.max_tokens, 512);
        assert!(!config.model.streaming);
        assert_eq!(config.provider.environment.as_deref(), Some("demo"));
        assert_eq!(config.orchestration.cache_max_entries, 64);
        assert_eq!(
            config.logging.conversation_log,
            Some(PathBuf::from("/tmp/cryptovox.jsonl"))
        );
        assert!(config.validate().is_ok());

        let params = config.to_execution_params();
        assert_eq!(params.max_tool_rounds, 3);
        assert_eq!(params.tool_call_timeout, Duration::from_secs(4));
        assert!(!params.streaming);
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("[orchestration]\nmax_tool_rounds = 2\n").unwrap();
        assert_eq!(config.orchestration.max_tool_rounds, 2);
        assert_eq!(config.orchestration.cache_ttl_seconds, 15);
        assert_eq!(config.model.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.provider.command, "npx");
    }

    #[test]
    fn test_defaults_match_execution_params() {
        let config = FileConfig::default();
        assert_eq!(config.to_execution_params(), ExecutionParams::default());
        assert!(config.logging.conversation_log.is_none());
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = FileConfig::default();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingModelApiKey)
        );
        config.model.api_key = Some("sk-ant-test".into());
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingProviderApiKey)
        );
        config.provider.api_key = Some("  ".into());
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::MissingProviderApiKey)
        );
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = with_keys(FileConfig::default());
        config.orchestration.cache_ttl_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidCacheTtl));

        let mut config = with_keys(FileConfig::default());
        config.orchestration.max_tool_rounds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidMaxRounds));

        let mut config = with_keys(FileConfig::default());
        config.orchestration.tool_timeout_seconds = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout(
                "orchestration.tool_timeout_seconds"
            ))
        );

        let mut config = with_keys(FileConfig::default());
        config.model.model = " ".into();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyModelName));

        let mut config = with_keys(FileConfig::default());
        config.provider.command = String::new();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyProviderCommand)
        );
    }

    #[test]
    fn test_server_config_command_line() {
        let mut provider = FileProviderConfig::default();
        provider.api_key = Some("CG-secret".into());
        provider.environment = Some("pro".into());

        let server = provider.to_server_config();
        assert_eq!(server.name, "mcp:coingecko");
        assert_eq!(server.command, "npx");
        assert_eq!(
            server.args,
            vec![
                "-y",
                "mcp-remote",
                "https://mcp.pro-api.coingecko.com/sse",
                "--header",
                "x-cg-pro-api-key: CG-secret"
            ]
        );
        assert!(
            server
                .env
                .contains(&("COINGECKO_PRO_API_KEY".to_string(), "CG-secret".to_string()))
        );
        assert!(
            server
                .env
                .contains(&("COINGECKO_ENVIRONMENT".to_string(), "pro".to_string()))
        );
        assert_eq!(server.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_server_config_without_key() {
        let server = FileProviderConfig::default().to_server_config();
        assert_eq!(server.args.len(), 3);
        assert!(server.env.is_empty());
    }
}
