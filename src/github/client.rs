//! GitHub Contents API Client
//!
//! Provides authenticated reads and revision-checked writes of a single
//! repository file.

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::GithubError;
use super::types::{
    ContentsResponse, FetchOutcome, FileHandle, PutContentsRequest, PutContentsResponse,
    PutOutcome, RemoteFile,
};

/// Public GitHub API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST API version pinned on every request
const API_VERSION: &str = "2022-11-28";

/// GitHub rejects requests without a user agent
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// GitHub API client for the repository contents endpoint
#[derive(Clone)]
pub struct GithubClient {
    /// HTTP client for making requests
    http_client: Client,
    /// API base URL without trailing slash
    api_url: String,
    /// Bearer token; reads work without one on public repositories
    token: Option<String>,
}

impl GithubClient {
    /// Create a client for the given API base URL
    ///
    /// # Arguments
    /// * `api_url` - API base, e.g. `https://api.github.com`
    /// * `token` - Optional bearer token, required for writes
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| GithubError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Whether a token is configured
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn contents_url(&self, handle: &FileHandle) -> String {
        format!("{}{}", self.api_url, handle.contents_path())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Read the file and its current revision
    ///
    /// A 404 is reported as `FetchOutcome::NotFound`, not as an error.
    pub async fn fetch_file(&self, handle: &FileHandle) -> Result<FetchOutcome, GithubError> {
        let url = self.contents_url(handle);
        debug!(url = %url, branch = %handle.branch, "Fetching file from GitHub");

        let response = self
            .authorize(self.http_client.get(&url))
            .query(&[("ref", handle.branch.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path = %handle.path, "File not found on GitHub");
            return Ok(FetchOutcome::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path = %handle.path, status = status.as_u16(), "GitHub read failed");
            return Err(GithubError::from_status(status.as_u16(), &body));
        }

        let contents: ContentsResponse = response.json().await?;
        let content = contents.decode_content()?;

        debug!(
            path = %handle.path,
            revision = %contents.sha,
            size = content.len(),
            "Fetched file from GitHub"
        );
        Ok(FetchOutcome::Found(RemoteFile {
            revision: contents.sha,
            content,
        }))
    }

    /// Create or update the file
    ///
    /// # Arguments
    /// * `handle` - File to write
    /// * `content` - New file bytes
    /// * `revision` - Current blob sha; `None` creates the file
    /// * `message` - Commit message
    ///
    /// # Returns
    /// The new revision of the file
    pub async fn put_file(
        &self,
        handle: &FileHandle,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> Result<PutOutcome, GithubError> {
        if self.token.is_none() {
            return Err(GithubError::MissingToken);
        }

        let url = self.contents_url(handle);
        let request = PutContentsRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha: revision,
            branch: &handle.branch,
        };

        debug!(
            url = %url,
            revision = ?revision,
            size = content.len(),
            "Writing file to GitHub"
        );

        let response = self
            .authorize(self.http_client.put(&url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Without a sha GitHub answers 422 when the file already exists:
            // someone created it between our read and this write.
            if status == StatusCode::UNPROCESSABLE_ENTITY && revision.is_none() {
                warn!(path = %handle.path, "File appeared concurrently during create");
                return Err(GithubError::Conflict(body));
            }
            warn!(path = %handle.path, status = status.as_u16(), "GitHub write failed");
            return Err(GithubError::from_status(status.as_u16(), &body));
        }

        let put_response: PutContentsResponse = response.json().await?;
        let revision = put_response
            .content
            .map(|c| c.sha)
            .ok_or_else(|| GithubError::InvalidResponse("write response has no content sha".into()))?;
        let commit = put_response.commit.map(|c| c.sha);

        info!(
            path = %handle.path,
            revision = %revision,
            commit = ?commit,
            "File written to GitHub"
        );
        Ok(PutOutcome { revision, commit })
    }
}
