//! Tool domain module
//!
//! This module defines the core abstractions for the **Tool System**: how the
//! language model reaches the cryptocurrency data provider.
//!
//! # Overview
//!
//! Every tool is described by a [`ToolDefinition`] (name, description, JSON
//! Schema for its input), invoked via a [`ToolCall`], and answered with a
//! [`ToolResult`] carrying the same correlation id.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (catalog)    │    │ (id, args)   │    │ (id, content)│
//! └──────────────┘    └──────┬───────┘    └──────────────┘
//!                            │
//!                            └─ CacheKey: tool name + canonical arguments
//! ```
//!
//! # Key Types
//!
//! - [`ToolSpec`] - immutable catalog of available tools, keyed by name
//! - [`ToolDefinition`] - a single tool descriptor
//! - [`ToolCall`] - a model-issued invocation request
//! - [`ToolResult`] - the uniform success/error envelope
//! - [`CacheKey`] - canonical memoization key for a call
//! - [`ToolProvider`] - abstraction over the external data provider (MCP)

pub mod cache_key;
pub mod entities;
pub mod provider;
pub mod value_objects;

pub use cache_key::{CacheKey, canonical_json};
pub use entities::{ToolCall, ToolDefinition, ToolSpec};
pub use provider::{ProviderError, ToolProvider};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata};
