//! Configuration file loading for cryptovox
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CRYPTOVOX_*` environment variables
//! 2. `ANTHROPIC_API_KEY`, `COINGECKO_PRO_API_KEY`, `COINGECKO_ENVIRONMENT`, `MCP_SERVER_URL`
//! 3. `--config <path>` specified file
//! 4. Project root: `./cryptovox.toml` or `./.cryptovox.toml`
//! 5. Global: `$XDG_CONFIG_HOME/cryptovox/config.toml`
//! 6. Default values

mod file_config;
mod loader;

pub use file_config::{
    COINGECKO_PROVIDER_ID, ConfigValidationError, DEFAULT_SERVER_URL, FileConfig,
    FileLoggingConfig, FileModelConfig, FileOrchestrationConfig, FileProviderConfig,
};
pub use loader::ConfigLoader;
