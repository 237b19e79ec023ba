//! Core domain types shared by every other module.

pub mod error;
pub mod query;
