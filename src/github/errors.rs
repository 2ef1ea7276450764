//! GitHub API Error Types
//!
//! Structured error handling for repository contents operations.
//! Maps HTTP status codes to specific error variants so callers branch on
//! the variant instead of inspecting message text.

/// GitHub API error types
#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("Unauthorized: token missing, invalid or expired")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited by GitHub API")]
    RateLimited,

    #[error("Revision conflict: {0}")]
    Conflict(String),

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("A GitHub token is required to write the cache file")]
    MissingToken,
}

impl GithubError {
    /// Create a GithubError from an HTTP status code and response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => GithubError::Unauthorized,
            403 => GithubError::Forbidden(body.to_string()),
            408 => GithubError::Timeout,
            409 => GithubError::Conflict(body.to_string()),
            429 => GithubError::RateLimited,
            500..=599 => GithubError::Server(status, body.to_string()),
            _ => GithubError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    /// HTTP status behind this error, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Unauthorized => Some(401),
            GithubError::Forbidden(_) => Some(403),
            GithubError::RateLimited => Some(429),
            GithubError::Conflict(_) => Some(409),
            GithubError::Server(status, _) => Some(*status),
            GithubError::Status { status, .. } => Some(*status),
            GithubError::Timeout
            | GithubError::Network(_)
            | GithubError::InvalidResponse(_)
            | GithubError::MissingToken => None,
        }
    }

    /// Whether a write failed because another writer got there first
    pub fn is_conflict(&self) -> bool {
        matches!(self, GithubError::Conflict(_))
    }
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GithubError::Timeout
        } else if err.is_decode() {
            GithubError::InvalidResponse(err.to_string())
        } else {
            GithubError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(GithubError::from_status(401, ""), GithubError::Unauthorized));
        assert!(matches!(
            GithubError::from_status(403, "Resource not accessible"),
            GithubError::Forbidden(_)
        ));
        assert!(matches!(GithubError::from_status(429, ""), GithubError::RateLimited));
        assert!(GithubError::from_status(409, "is at abc but expected def").is_conflict());
        assert!(matches!(GithubError::from_status(502, "bad gateway"), GithubError::Server(502, _)));
        assert!(matches!(
            GithubError::from_status(422, "Invalid request"),
            GithubError::Status { status: 422, .. }
        ));
    }

    #[test]
    fn test_status_is_preserved() {
        let err = GithubError::from_status(422, "Invalid request");
        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("Invalid request"));

        assert_eq!(GithubError::MissingToken.status(), None);
        assert_eq!(GithubError::from_status(503, "").status(), Some(503));
    }
}
