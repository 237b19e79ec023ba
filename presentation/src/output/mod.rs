//! Answer formatting

pub mod console;
pub mod envelope;
