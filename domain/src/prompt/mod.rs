//! Prompt domain
//!
//! Wraps the listener's raw query with the instructions that keep answers
//! short and readable aloud.

mod voice;

pub use voice::VoicePromptTemplate;
