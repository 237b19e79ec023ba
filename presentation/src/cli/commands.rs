//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The spoken answer as plain text
    Text,
    /// `{success, speech, query, timestamp}` envelope
    Json,
}

/// CLI arguments for cryptovox
#[derive(Parser, Debug)]
#[command(name = "cryptovox")]
#[command(author, version, about = "Voice-ready answers to cryptocurrency questions")]
#[command(long_about = r#"
cryptovox answers spoken-style questions about cryptocurrency markets.

The model decides which CoinGecko tools to call (served by an MCP server
launched through `npx mcp-remote`), the tools run concurrently, and the final
answer is phrased to be read aloud.

Credentials come from the environment (a `.env` file is honoured):
  ANTHROPIC_API_KEY       model API key
  COINGECKO_PRO_API_KEY   data provider key
  COINGECKO_ENVIRONMENT   data provider environment (optional)

Configuration files are loaded from (in priority order):
1. --config <path>                  Explicit config file
2. ./cryptovox.toml                 Project-level config
3. ~/.config/cryptovox/config.toml  Global config

Example:
  cryptovox "What's the price of bitcoin?"
  cryptovox -o json "How is ethereum doing today?"
  cryptovox --interactive
"#)]
pub struct Cli {
    /// The question to answer (not required in interactive mode)
    pub question: Option<String>,

    /// Read one question per line from stdin
    #[arg(short, long)]
    pub interactive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info + streamed text, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Log filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether streamed model text is echoed to stderr.
    pub fn echo_stream(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }
}
