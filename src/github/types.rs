//! GitHub contents API types
//!
//! Request/response bodies for the repository contents endpoint and the
//! outcome types the client hands back to the cache store.

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::errors::GithubError;

/// Identifies the hosted cache file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Repository owner (user or organisation)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// File path within the repository
    pub path: String,
    /// Branch the file lives on
    pub branch: String,
}

impl FileHandle {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        path: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            path: path.into(),
            branch: branch.into(),
        }
    }

    /// Path component of the contents endpoint, each segment percent-encoded
    pub fn contents_path(&self) -> String {
        let path = self
            .path
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "/repos/{}/{}/contents/{}",
            urlencoding::encode(&self.owner),
            urlencoding::encode(&self.repo),
            path
        )
    }
}

/// A file read from the repository
#[derive(Debug, Clone)]
pub struct RemoteFile {
    /// Blob sha, required to update the file
    pub revision: String,
    /// Decoded file bytes
    pub content: Vec<u8>,
}

/// Result of reading the cache file
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Found(RemoteFile),
    NotFound,
}

impl FetchOutcome {
    /// Revision of the file, if it exists
    pub fn revision(&self) -> Option<&str> {
        match self {
            FetchOutcome::Found(file) => Some(file.revision.as_str()),
            FetchOutcome::NotFound => None,
        }
    }
}

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    /// New blob sha of the file
    pub revision: String,
    /// Sha of the commit that carried the write
    pub commit: Option<String>,
}

/// Response from GET /repos/{owner}/{repo}/contents/{path}
#[derive(Debug, Deserialize)]
pub struct ContentsResponse {
    pub sha: String,
    /// Base64 body, wrapped at 60 columns by GitHub
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl ContentsResponse {
    /// Decode the base64 body, ignoring GitHub's embedded line breaks
    pub fn decode_content(&self) -> Result<Vec<u8>, GithubError> {
        if self.encoding.as_deref() == Some("none") {
            return Err(GithubError::InvalidResponse(format!(
                "file of {} bytes is too large for the contents API",
                self.size
            )));
        }
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| GithubError::InvalidResponse(format!("content is not base64: {}", e)))
    }
}

/// Request body for PUT /repos/{owner}/{repo}/contents/{path}
#[derive(Debug, Serialize)]
pub struct PutContentsRequest<'a> {
    pub message: &'a str,
    /// Base64 of the new file body
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    pub branch: &'a str,
}

/// Response from a successful PUT
#[derive(Debug, Deserialize)]
pub struct PutContentsResponse {
    pub content: Option<PutContentInfo>,
    pub commit: Option<PutCommitInfo>,
}

#[derive(Debug, Deserialize)]
pub struct PutContentInfo {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct PutCommitInfo {
    pub sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_path_encodes_segments() {
        let handle = FileHandle::new("octo", "cache repo", "data/my cache.json", "main");
        assert_eq!(
            handle.contents_path(),
            "/repos/octo/cache%20repo/contents/data/my%20cache.json"
        );

        let leading = FileHandle::new("octo", "repo", "/data/cache.json", "main");
        assert_eq!(leading.contents_path(), "/repos/octo/repo/contents/data/cache.json");
    }

    #[test]
    fn test_deserialize_contents_with_wrapped_base64() {
        // GitHub wraps the base64 body with newlines
        let json = r#"{
            "type": "file",
            "encoding": "base64",
            "size": 11,
            "name": "cache.json",
            "path": "data/cache.json",
            "content": "aGVsbG8g\nd29ybGQ=\n",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1"
        }"#;
        let resp: ContentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.sha, "3d21ec53a331a6f037a91c368710b99387d012c1");
        assert_eq!(resp.decode_content().unwrap(), b"hello world");
    }

    #[test]
    fn test_large_file_without_inline_content() {
        let json = r#"{"sha": "abc", "content": "", "encoding": "none", "size": 2000000}"#;
        let resp: ContentsResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.decode_content(),
            Err(GithubError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_put_request_omits_sha_on_create() {
        let request = PutContentsRequest {
            message: "create cache",
            content: "e30=".to_string(),
            sha: None,
            branch: "main",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("sha").is_none());
        assert_eq!(json["branch"], "main");

        let update = PutContentsRequest {
            sha: Some("abc123"),
            ..request
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sha"], "abc123");
    }

    #[test]
    fn test_deserialize_put_response() {
        let json = r#"{
            "content": {"name": "cache.json", "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3"},
            "commit": {"sha": "7638417db6d59f3c431d3e1f261cc637155684cd", "message": "update cache"}
        }"#;
        let resp: PutContentsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content.unwrap().sha, "95b966ae1c166bd92f8ae7d1c313e738c731dfc3");
        assert_eq!(resp.commit.unwrap().sha, "7638417db6d59f3c431d3e1f261cc637155684cd");
    }
}
