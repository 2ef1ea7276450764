//! Summary proxy error types

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Summary API credentials are not configured")]
    NotConfigured,

    #[error("Request body is missing 'content'")]
    MissingContent,

    #[error("Summary API error: {message} (code: {})", .code.as_deref().unwrap_or("N/A"))]
    Upstream {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Summary request failed with status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Summary API returned no usable reply")]
    EmptyReply,

    #[error("Could not parse summary API response: {0}")]
    InvalidResponse(String),

    #[error("Could not reach summary API: {0}")]
    Network(String),
}

impl SummaryError {
    /// Status the proxy answers with for this failure
    pub fn http_status(&self) -> u16 {
        match self {
            SummaryError::MissingContent => 400,
            SummaryError::Upstream { status, .. } if *status >= 400 => *status,
            SummaryError::Upstream { .. } => 502,
            SummaryError::UnexpectedStatus { status, .. } => *status,
            SummaryError::NotConfigured
            | SummaryError::EmptyReply
            | SummaryError::InvalidResponse(_)
            | SummaryError::Network(_) => 500,
        }
    }
}

impl From<reqwest::Error> for SummaryError {
    fn from(err: reqwest::Error) -> Self {
        SummaryError::Network(err.to_string())
    }
}
