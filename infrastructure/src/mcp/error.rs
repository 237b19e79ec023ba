//! Error types for the MCP stdio client

use cryptovox_domain::ProviderError;
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

/// JSON-RPC code for a request the server cannot route
pub const METHOD_NOT_FOUND: i64 = -32601;

/// JSON-RPC code for rejected parameters
pub const INVALID_PARAMS: i64 = -32602;

/// Errors that can occur when talking to an MCP server over stdio
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn MCP server: {0}")]
    SpawnError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("JSON-RPC error (code {code}): {message}")]
    RpcError { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Transport closed")]
    TransportClosed,

    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl McpError {
    /// Map onto the provider-level error seen by the tool executor.
    pub fn into_provider_error(self, tool_name: &str) -> ProviderError {
        match self {
            McpError::Timeout(method) => ProviderError::Timeout(format!("{tool_name} ({method})")),
            McpError::RpcError { code, message } if code == INVALID_PARAMS => {
                if message.to_ascii_lowercase().contains("unknown tool") {
                    ProviderError::ToolNotFound(tool_name.to_string())
                } else {
                    ProviderError::InvalidArguments(message)
                }
            }
            McpError::RpcError { code, message } if code == METHOD_NOT_FOUND => {
                ProviderError::ToolNotFound(message)
            }
            McpError::RpcError { message, .. } if is_rate_limit(&message) => {
                ProviderError::RateLimited(message)
            }
            McpError::TransportClosed | McpError::SpawnError(_) => {
                ProviderError::NotAvailable(self.to_string())
            }
            McpError::SerializationError(_) | McpError::UnexpectedResponse(_) => {
                ProviderError::MalformedResponse(self.to_string())
            }
            McpError::RpcError { .. } => ProviderError::ExecutionFailed(self.to_string()),
        }
    }
}

pub(crate) fn is_rate_limit(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
}
