//! Configuration loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["cryptovox.toml", ".cryptovox.toml"];

/// Prefix for environment overrides, e.g. `CRYPTOVOX_MODEL__MAX_TOKENS=500`
const ENV_PREFIX: &str = "CRYPTOVOX_";

/// Conventional credential variables and the keys they fill
const CREDENTIAL_VARS: [(&str, &str); 4] = [
    ("ANTHROPIC_API_KEY", "model.api_key"),
    ("COINGECKO_PRO_API_KEY", "provider.api_key"),
    ("COINGECKO_ENVIRONMENT", "provider.environment"),
    ("MCP_SERVER_URL", "provider.server_url"),
];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `CRYPTOVOX_*` environment variables (`__` separates sections)
    /// 2. Conventional variables (`ANTHROPIC_API_KEY`, `COINGECKO_PRO_API_KEY`, ...)
    /// 3. Explicit config path (if provided)
    /// 4. Project root: `./cryptovox.toml` or `./.cryptovox.toml`
    /// 5. Global: `$XDG_CONFIG_HOME/cryptovox/config.toml`
    /// 6. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }

        Self::with_env(figment).extract().map_err(Box::new)
    }

    /// Defaults plus environment only (for `--no-config`)
    pub fn load_without_files() -> Result<FileConfig, Box<figment::Error>> {
        let figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        Self::with_env(figment).extract().map_err(Box::new)
    }

    fn with_env(mut figment: Figment) -> Figment {
        for (var, key) in CREDENTIAL_VARS {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cryptovox").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config sources in priority order (for `--show-config`)
    pub fn describe_sources(config_path: Option<&Path>) -> Vec<String> {
        let mark = |found: bool| if found { "[FOUND]" } else { "[     ]" };
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        lines.push(format!("  [ENV  ] {ENV_PREFIX}* (sections split on \"__\")"));
        for (var, key) in CREDENTIAL_VARS {
            let set = std::env::var_os(var).is_some();
            lines.push(format!("  {} {} -> {}", mark(set), var, key));
        }

        if let Some(path) = config_path {
            lines.push(format!(
                "  {} Explicit: {}",
                mark(path.exists()),
                path.display()
            ));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./cryptovox.toml or ./.cryptovox.toml".into()),
        }

        if let Some(path) = Self::global_config_path() {
            lines.push(format!(
                "  {} Global:  {}",
                mark(path.exists()),
                path.display()
            ));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}
