//! Anthropic Messages API adapter.

pub mod gateway;
pub mod sse;
pub mod types;

pub use gateway::{AnthropicGateway, DEFAULT_BASE_URL};
