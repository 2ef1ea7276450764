//! Summary proxy endpoint

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::cors::CorsPolicy;
use super::protocol::{HandlerRequest, HandlerResponse, Method};
use crate::summary::{SummaryClient, SummaryError};

const METHODS: &str = "POST, OPTIONS";

#[derive(Debug, Default, Deserialize)]
struct SummarizeBody {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Endpoint wrapping a [`SummaryClient`]; any origin may call it
pub struct SummaryHandler {
    client: SummaryClient,
}

impl SummaryHandler {
    pub fn new(client: SummaryClient) -> Self {
        Self { client }
    }

    pub async fn summarize(&self, request: &HandlerRequest) -> HandlerResponse {
        let response = match request.method {
            Method::Options => HandlerResponse::empty(200),
            Method::Post => self.handle(request).await,
            other => HandlerResponse::json(
                405,
                &json!({ "error": format!("Method {} Not Allowed", other) }),
            )
            .with_header("Allow", METHODS),
        };
        CorsPolicy::AnyOrigin.apply(request.origin.as_deref(), METHODS, response)
    }

    async fn handle(&self, request: &HandlerRequest) -> HandlerResponse {
        if !self.client.is_configured() {
            return error_response(&SummaryError::NotConfigured);
        }

        let body = match request.body.clone().map(serde_json::from_value::<SummarizeBody>) {
            Some(Ok(body)) => body,
            Some(Err(e)) => {
                warn!(error = %e, "Malformed summarize body");
                SummarizeBody::default()
            }
            None => SummarizeBody::default(),
        };
        let content = body.content.unwrap_or_default();

        match self.client.summarize(body.title.as_deref(), &content).await {
            Ok(summary) => HandlerResponse::json(200, &json!({ "summary": summary })),
            Err(e) => error_response(&e),
        }
    }
}

fn error_response(err: &SummaryError) -> HandlerResponse {
    HandlerResponse::json(err.http_status(), &json!({ "error": err.to_string() }))
}
