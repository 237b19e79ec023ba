//! Domain layer for cryptovox
//!
//! This crate contains the core types of the tool-calling orchestration
//! engine. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tools
//!
//! The data provider exposes a catalog of [`ToolDefinition`]s. The language
//! model requests them through [`ToolCall`]s, and every call produces exactly
//! one [`ToolResult`] carrying the same correlation id.
//!
//! ## Conversations
//!
//! A [`Conversation`] accumulates role-tagged messages for a single query.
//! It enforces the pairing rule: every tool use the model emitted must be
//! answered by one tool result before the model is called again.
//!
//! ## Orchestration
//!
//! [`QueryRun`] is the `AwaitingModel → ExecutingTools → Done` state machine
//! with a bounded number of tool rounds.

pub mod core;
pub mod orchestration;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use core::{error::DomainError, query::Query};
pub use orchestration::phase::{OrchestrationPhase, QueryRun};
pub use prompt::VoicePromptTemplate;
pub use session::{
    entities::{Conversation, Message, MessageContent, Role},
    response::{ContentBlock, LlmResponse, StopReason},
    stream::{DroppedToolCall, ResponseAccumulator, StreamEvent},
};
pub use tool::{
    cache_key::{CacheKey, canonical_json},
    entities::{ToolCall, ToolDefinition, ToolSpec},
    provider::{ProviderError, ToolProvider},
    value_objects::{ToolError, ToolResult, ToolResultMetadata},
};
