//! Application-level configuration.
//!
//! - [`ExecutionParams`] - per-query loop control (model, rounds, timeouts)

pub mod execution_params;

pub use execution_params::ExecutionParams;
