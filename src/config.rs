//! Environment-sourced configuration
//!
//! Built once at startup and handed to the constructors that need it.

use std::env;
use std::time::Duration;

use crate::github::client::GITHUB_API_URL;
use crate::github::FileHandle;

pub const DEFAULT_CACHE_PATH: &str = "data/cache.json";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MAX_AGE_DAYS: u64 = 7;
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 3;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:4321";
pub const DEFAULT_SUMMARY_API_URL: &str = "https://spark-api-open.xf-yun.com/v1/chat/completions";
pub const DEFAULT_SUMMARY_MODEL: &str = "lite";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the cache store and its handlers
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// API base URL
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    /// File path of the cache within the repository
    pub path: String,
    pub branch: String,
    /// Bearer token; optional for reads, required for writes
    pub token: Option<String>,
    /// Age beyond which the whole cache is discarded
    pub max_age: Duration,
    /// Attempts of an entry update before giving up on conflicts
    pub max_update_attempts: u32,
    /// CORS allow-list used by the handler adapters
    pub allowed_origins: Vec<String>,
}

impl CacheConfig {
    /// Configuration with defaults for everything but the repository
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_url: GITHUB_API_URL.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            path: DEFAULT_CACHE_PATH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            token: None,
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_DAYS * SECONDS_PER_DAY),
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Read configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let owner = var("GITHUB_OWNER").ok_or(ConfigError::Missing("GITHUB_OWNER"))?;
        let repo = var("GITHUB_REPO").ok_or(ConfigError::Missing("GITHUB_REPO"))?;
        let mut config = Self::new(owner, repo);

        if let Some(api_url) = var("GITHUB_API_URL") {
            config.api_url = api_url;
        }
        if let Some(path) = var("GITHUB_CACHE_PATH") {
            config.path = path;
        }
        if let Some(branch) = var("GITHUB_BRANCH") {
            config.branch = branch;
        }
        config.token = var("GITHUB_TOKEN");

        if let Some(days) = var("GITHUB_CACHE_MAX_AGE") {
            config.max_age = days
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "GITHUB_CACHE_MAX_AGE",
                    value: days.clone(),
                })?;
        }
        if let Some(attempts) = var("GITHUB_CACHE_MAX_ATTEMPTS") {
            config.max_update_attempts = attempts
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "GITHUB_CACHE_MAX_ATTEMPTS",
                    value: attempts.clone(),
                })?;
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_max_update_attempts(mut self, attempts: u32) -> Self {
        self.max_update_attempts = attempts.max(1);
        self
    }

    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Handle of the cache file described by this configuration
    pub fn file_handle(&self) -> FileHandle {
        FileHandle::new(&self.owner, &self.repo, &self.path, &self.branch)
    }
}

/// Credentials and endpoint for the summary proxy
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub api_url: String,
    pub model: String,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SUMMARY_API_URL.to_string(),
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            app_id: None,
            api_key: None,
            api_secret: None,
        }
    }
}

impl SummaryConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Missing credentials are not an error here; the proxy reports them per request
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            api_url: var("SPARK_API_URL").unwrap_or(defaults.api_url),
            model: var("SPARK_MODEL").unwrap_or(defaults.model),
            app_id: var("SPARK_APPID"),
            api_key: var("SPARK_API_KEY"),
            api_secret: var("SPARK_API_SECRET"),
        }
    }

    /// Whether every credential the upstream needs is present
    pub fn is_configured(&self) -> bool {
        self.app_id.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }
}
