//! Orchestration domain
//!
//! The per-query state machine that bounds the tool-calling loop.

pub mod phase;
