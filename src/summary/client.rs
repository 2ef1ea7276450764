//! Summary API Client

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

use super::errors::SummaryError;
use super::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::SummaryConfig;

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "你是一个有用的助手，请根据用户提供的文章标题和内容生成一段简洁的摘要。";
const UNTITLED: &str = "无标题";
const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 200;

/// Stateless forwarder to a chat-completions endpoint
#[derive(Clone)]
pub struct SummaryClient {
    http_client: Client,
    config: SummaryConfig,
}

impl SummaryClient {
    pub fn new(config: SummaryConfig) -> Result<Self, SummaryError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SummaryError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn build_request(&self, title: Option<&str>, content: &str) -> ChatRequest {
        let title = title.filter(|t| !t.trim().is_empty()).unwrap_or(UNTITLED);
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", format!("文章标题：{}\n文章内容：{}", title, content)),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Summarize an article
    ///
    /// # Arguments
    /// * `title` - Optional article title
    /// * `content` - Article body, must not be empty
    pub async fn summarize(&self, title: Option<&str>, content: &str) -> Result<String, SummaryError> {
        let (Some(key), Some(secret)) = (&self.config.api_key, &self.config.api_secret) else {
            error!("Summary API credentials not configured");
            return Err(SummaryError::NotConfigured);
        };
        if self.config.app_id.is_none() {
            error!("Summary API app id not configured");
            return Err(SummaryError::NotConfigured);
        }
        if content.trim().is_empty() {
            return Err(SummaryError::MissingContent);
        }

        let request = self.build_request(title, content);
        debug!(url = %self.config.api_url, model = %request.model, "Requesting summary");

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(format!("{}:{}", key, secret))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Summary API returned non-JSON body");
            SummaryError::InvalidResponse(e.to_string())
        })?;

        if status.is_success() && !parsed.choices.is_empty() {
            return match parsed.assistant_reply() {
                Some(summary) => {
                    info!(chars = summary.chars().count(), "Summary generated");
                    Ok(summary)
                }
                None => {
                    error!(body = %body, "Summary API reply has no assistant content");
                    Err(SummaryError::EmptyReply)
                }
            };
        }

        if let Some(api_error) = &parsed.error {
            let message = api_error
                .message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            error!(status = status.as_u16(), message = %message, "Summary API error");
            return Err(SummaryError::Upstream {
                status: status.as_u16(),
                message,
                code: api_error.code_string(),
            });
        }

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Summary request failed");
            return Err(SummaryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        error!(body = %body, "Summary API response has an unknown shape");
        Err(SummaryError::EmptyReply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn configured(server: &MockServer) -> SummaryClient {
        SummaryClient::new(SummaryConfig {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            model: "lite".into(),
            app_id: Some("app".into()),
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
        })
        .unwrap()
    }

    #[test]
    fn test_request_uses_untitled_placeholder() {
        let client = SummaryClient::new(SummaryConfig::default()).unwrap();
        let request = client.build_request(None, "正文");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].content, "文章标题：无标题\n文章内容：正文");
        assert_eq!(request.max_tokens, 200);
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer key:secret"))
            .and(body_partial_json(json!({"model": "lite", "max_tokens": 200})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "choices": [{"message": {"role": "assistant", "content": " 摘要 "}, "index": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = configured(&server)
            .summarize(Some("Title"), "Body text")
            .await
            .unwrap();
        assert_eq!(summary, "摘要");
    }

    #[tokio::test]
    async fn test_summarize_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "HMAC signature cannot be verified", "code": "10013"}
            })))
            .mount(&server)
            .await;

        let err = configured(&server).summarize(None, "Body").await.unwrap_err();
        match err {
            SummaryError::Upstream { status, code, .. } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("10013"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_summarize_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "down"})))
            .mount(&server)
            .await;

        let err = configured(&server).summarize(None, "Body").await.unwrap_err();
        assert!(matches!(err, SummaryError::UnexpectedStatus { status: 503, .. }));
        assert_eq!(err.http_status(), 503);
    }

    #[tokio::test]
    async fn test_summarize_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = configured(&server).summarize(None, "Body").await.unwrap_err();
        assert!(matches!(err, SummaryError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_summarize_validates_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = configured(&server).summarize(Some("T"), "  ").await.unwrap_err();
        assert!(matches!(err, SummaryError::MissingContent));

        let unconfigured = SummaryClient::new(SummaryConfig {
            api_url: server.uri(),
            ..SummaryConfig::default()
        })
        .unwrap();
        let err = unconfigured.summarize(Some("T"), "Body").await.unwrap_err();
        assert!(matches!(err, SummaryError::NotConfigured));
    }
}
