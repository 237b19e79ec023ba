//! MCP data provider over stdio.
//!
//! - [`client`]: process spawn, handshake, request correlation
//! - [`protocol`]: JSON-RPC and MCP message types, content normalization
//! - [`transport`]: frame classification for the reader task
//! - [`provider`]: [`ToolProvider`](cryptovox_domain::ToolProvider) impl

pub mod client;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod transport;

pub use client::{McpClient, McpServerConfig};
pub use error::McpError;
pub use protocol::normalize_content;
