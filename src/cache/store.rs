//! Cache Store
//!
//! Read, write and single-key update of the cached document. The only
//! concurrency control is GitHub's revision check on write.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::envelope;
use super::errors::CacheError;
use super::CacheDocument;
use crate::config::CacheConfig;
use crate::github::{FetchOutcome, FileHandle, GithubClient, GithubError};

/// Delay before re-reading after a lost write race, by attempt
const CONFLICT_BACKOFF_MS: [u64; 3] = [100, 250, 500];

const CREATE_MESSAGE: &str = "create cache";
const UPDATE_MESSAGE: &str = "update cache";

/// How the stored document looked when it was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    /// Valid and within max age
    Fresh,
    /// No file exists yet
    Missing,
    /// File exists but could not be decoded
    Corrupt,
    /// File is older than max age (or carries no timestamp)
    Expired,
}

/// A document together with the revision it was read at
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Usable document; empty unless the state is `Fresh`
    pub document: CacheDocument,
    /// Revision to write against; `None` when the file does not exist
    pub revision: Option<String>,
    pub state: SnapshotState,
}

/// Cache backed by a single file in a GitHub repository
pub struct CacheStore {
    client: GithubClient,
    handle: FileHandle,
    max_age: Duration,
    max_update_attempts: u32,
}

impl CacheStore {
    /// Create a store from configuration
    pub fn new(config: &CacheConfig) -> Result<Self, GithubError> {
        let client = GithubClient::new(&config.api_url, config.token.clone())?;
        Ok(Self::with_client(
            client,
            config.file_handle(),
            config.max_age,
            config.max_update_attempts,
        ))
    }

    /// Create a store around an existing client
    pub fn with_client(
        client: GithubClient,
        handle: FileHandle,
        max_age: Duration,
        max_update_attempts: u32,
    ) -> Self {
        Self {
            client,
            handle,
            max_age,
            max_update_attempts: max_update_attempts.max(1),
        }
    }

    pub fn handle(&self) -> &FileHandle {
        &self.handle
    }

    /// Read the file and classify what was found
    ///
    /// Only transport failures are errors; a missing, corrupt or expired file
    /// yields an empty document with the matching state.
    pub async fn load(&self) -> Result<Snapshot, CacheError> {
        let file = match self.client.fetch_file(&self.handle).await? {
            FetchOutcome::Found(file) => file,
            FetchOutcome::NotFound => {
                return Ok(Snapshot {
                    document: CacheDocument::new(),
                    revision: None,
                    state: SnapshotState::Missing,
                })
            }
        };

        let decoded = match envelope::decode(&file.content) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(path = %self.handle.path, error = %e, "Cache file is corrupt");
                return Ok(Snapshot {
                    document: CacheDocument::new(),
                    revision: Some(file.revision),
                    state: SnapshotState::Corrupt,
                });
            }
        };

        if is_stale(decoded.updated_at, Utc::now(), self.max_age) {
            info!(
                path = %self.handle.path,
                updated_at = ?decoded.updated_at,
                max_age_days = self.max_age.as_secs() / 86_400,
                "Cache expired"
            );
            return Ok(Snapshot {
                document: CacheDocument::new(),
                revision: Some(file.revision),
                state: SnapshotState::Expired,
            });
        }

        debug!(path = %self.handle.path, entries = decoded.document.len(), "Cache loaded");
        Ok(Snapshot {
            document: decoded.document,
            revision: Some(file.revision),
            state: SnapshotState::Fresh,
        })
    }

    /// Read the cached document
    ///
    /// Never fails. A missing, corrupt or expired file is replaced by an empty
    /// document; any other failure is logged and an empty document returned.
    pub async fn get(&self) -> CacheDocument {
        let snapshot = match self.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.handle.path, error = %e, "Failed to load cache, using empty cache");
                return CacheDocument::new();
            }
        };

        if snapshot.state != SnapshotState::Fresh {
            info!(path = %self.handle.path, state = ?snapshot.state, "Resetting cache to empty");
            let empty = CacheDocument::new();
            if let Err(e) = self.save(&empty, snapshot.revision.as_deref()).await {
                warn!(path = %self.handle.path, error = %e, "Failed to reset cache file");
            }
        }

        snapshot.document
    }

    /// Write a document against a known revision
    ///
    /// `None` creates the file. A stale revision fails with `CacheError::Conflict`.
    pub async fn save(
        &self,
        document: &CacheDocument,
        revision: Option<&str>,
    ) -> Result<(), CacheError> {
        let envelope = envelope::encode(document)?;
        let bytes = envelope.to_file_bytes()?;
        let message = if revision.is_some() {
            UPDATE_MESSAGE
        } else {
            CREATE_MESSAGE
        };

        self.client
            .put_file(&self.handle, &bytes, revision, message)
            .await?;

        info!(
            path = %self.handle.path,
            entries = document.len(),
            compressed_size = envelope.data.len(),
            "Cache written"
        );
        Ok(())
    }

    /// Replace the whole document
    ///
    /// Reads the current revision first; a writer that slips in between the
    /// read and the write makes this fail with `CacheError::Conflict`.
    pub async fn set(&self, document: &CacheDocument) -> Result<(), CacheError> {
        let outcome = self.client.fetch_file(&self.handle).await?;
        if outcome.revision().is_none() {
            info!(path = %self.handle.path, "Creating cache file");
        }
        self.save(document, outcome.revision()).await
    }

    /// Empty the cache
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.set(&CacheDocument::new()).await
    }

    /// Insert or replace a single key
    ///
    /// Read-modify-write against the revision that was read. When another
    /// writer wins the race the whole cycle is repeated from a fresh read, up
    /// to the configured number of attempts.
    pub async fn update_entry(&self, key: &str, value: Option<Value>) -> Result<Value, CacheError> {
        if key.trim().is_empty() {
            return Err(CacheError::InvalidArgument("key must not be empty".into()));
        }
        let value =
            value.ok_or_else(|| CacheError::InvalidArgument("value must be provided".into()))?;

        for attempt in 1..=self.max_update_attempts {
            let snapshot = self.load().await.map_err(|e| {
                error!(key = key, error = %e, "Failed to read cache for update");
                e
            })?;

            let mut document = snapshot.document;
            document.insert(key.to_string(), value.clone());

            match self.save(&document, snapshot.revision.as_deref()).await {
                Ok(()) => {
                    info!(key = key, attempt = attempt, "Cache entry updated");
                    return Ok(value);
                }
                Err(CacheError::Conflict(reason)) if attempt < self.max_update_attempts => {
                    let delay = CONFLICT_BACKOFF_MS
                        .get(attempt as usize - 1)
                        .copied()
                        .unwrap_or(500);
                    warn!(
                        key = key,
                        attempt = attempt,
                        max = self.max_update_attempts,
                        delay_ms = delay,
                        reason = %reason,
                        "Cache write lost a race, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(CacheError::Conflict(reason)) if self.max_update_attempts == 1 => {
                    warn!(key = key, reason = %reason, "Cache write lost a race");
                    return Err(CacheError::Conflict(reason));
                }
                Err(CacheError::Conflict(_)) => break,
                Err(e) => {
                    error!(key = key, error = %e, "Failed to update cache entry");
                    return Err(e);
                }
            }
        }

        error!(
            key = key,
            attempts = self.max_update_attempts,
            "Giving up on cache entry update"
        );
        Err(CacheError::TooManyConflicts {
            attempts: self.max_update_attempts,
        })
    }
}

/// Whether a document written at `updated_at` is older than `max_age`
///
/// A missing timestamp counts as infinitely old.
fn is_stale(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let Some(updated_at) = updated_at else {
        return true;
    };
    match chrono::Duration::from_std(max_age) {
        Ok(max_age) => now.signed_duration_since(updated_at) > max_age,
        Err(_) => false,
    }
}
