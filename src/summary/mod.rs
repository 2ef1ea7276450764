//! Article summary proxy
//!
//! Forwards a title and body to an OpenAI-compatible chat-completions
//! endpoint and returns the assistant's reply. Independent of the cache.

pub mod client;
pub mod errors;
pub mod types;

pub use client::SummaryClient;
pub use errors::SummaryError;
