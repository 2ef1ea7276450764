//! JSON document cache persisted as one file in a GitHub repository
//!
//! The whole document lives in a single compressed envelope; reads degrade
//! to an empty document, writes are revision-checked by GitHub.

pub mod envelope;
pub mod errors;
pub mod store;

pub use envelope::{Decoded, StoredEnvelope};
pub use errors::{CacheError, CodecError};
pub use store::{CacheStore, Snapshot, SnapshotState};

/// The cached document: string keys to arbitrary JSON values
pub type CacheDocument = serde_json::Map<String, serde_json::Value>;
