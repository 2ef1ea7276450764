//! Cache error types

use crate::github::GithubError;

/// Failure to turn a stored file into a document, or a document into an envelope
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Corrupt cache payload: {0}")]
    Corrupt(String),

    #[error("Failed to encode cache payload: {0}")]
    Encode(String),
}

/// Errors surfaced by cache writes and updates
///
/// Reads never fail; they degrade to an empty document instead.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cache file was modified concurrently: {0}")]
    Conflict(String),

    #[error("Gave up after {attempts} conflicting writes")]
    TooManyConflicts { attempts: u32 },

    #[error(transparent)]
    Transport(GithubError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<GithubError> for CacheError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Conflict(body) => CacheError::Conflict(body),
            other => CacheError::Transport(other),
        }
    }
}

impl CacheError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CacheError::Conflict(_))
    }
}
