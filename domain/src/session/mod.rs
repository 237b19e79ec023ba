//! Model session domain.
//!
//! - [`entities::Conversation`] - the message history of one query
//! - [`response::LlmResponse`] - a structured model response
//! - [`stream::ResponseAccumulator`] - folds streamed events into a response

pub mod entities;
pub mod response;
pub mod stream;
