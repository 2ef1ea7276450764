//! GitHub repository contents API client

pub mod client;
pub mod errors;
pub mod types;

pub use client::GithubClient;
pub use errors::GithubError;
pub use types::*;
