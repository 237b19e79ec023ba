//! Tool infrastructure
//!
//! - [`catalog`] - startup discovery of the provider's tools
//! - [`cache`] - short-TTL memoization of tool results
//! - [`executor`] - [`ToolExecutorPort`](cryptovox_application::ToolExecutorPort)
//!   implementation tying catalog, cache and provider together
//! - [`schema`] - tool descriptors in the model API's format

pub mod cache;
pub mod catalog;
pub mod executor;
pub mod schema;

pub use cache::ResultCache;
pub use catalog::{CatalogError, discover_catalog};
pub use executor::CachingToolExecutor;
pub use schema::JsonSchemaToolConverter;
