//! GitHub JSON cache
//!
//! A key-value cache for stateless deployments that keeps its whole document
//! in one gzip-compressed file of a GitHub repository, using the file's blob
//! sha for optimistic concurrency.

pub mod cache;
pub mod config;
pub mod github;
pub mod handlers;
pub mod summary;

pub use cache::{CacheDocument, CacheError, CacheStore};
pub use config::{CacheConfig, ConfigError, SummaryConfig};
pub use github::{GithubClient, GithubError};
