//! Cache endpoints: read the whole cache, replace it, update one entry

use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::cors::CorsPolicy;
use super::protocol::{HandlerRequest, HandlerResponse, Method};
use crate::cache::{CacheDocument, CacheError, CacheStore};

const GET_METHODS: &str = "GET, POST, OPTIONS";
const WRITE_METHODS: &str = "POST, OPTIONS";

/// Treat an explicit `null` as a present value; only a missing field is `None`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Body of an update request
#[derive(Debug, Default, Deserialize)]
struct UpdateBody {
    #[serde(default)]
    key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    value: Option<Value>,
}

/// Body of a replace request
#[derive(Debug, Deserialize)]
struct SetBody {
    data: CacheDocument,
}

/// Cache endpoints bound to one store
pub struct CacheHandlers {
    store: CacheStore,
    cors: CorsPolicy,
}

impl CacheHandlers {
    pub fn new(store: CacheStore, cors: CorsPolicy) -> Self {
        Self { store, cors }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// `getCache`: the full document
    pub async fn get_cache(&self, request: &HandlerRequest) -> HandlerResponse {
        let response = match request.method {
            Method::Options => HandlerResponse::empty(200),
            _ => {
                let data = self.store.get().await;
                HandlerResponse::json(200, &json!({ "success": true, "data": data }))
            }
        };
        self.finish(request, GET_METHODS, response)
    }

    /// `setCache`: replace the whole document
    pub async fn set_cache(&self, request: &HandlerRequest) -> HandlerResponse {
        let response = match request.method {
            Method::Options => HandlerResponse::empty(200),
            Method::Post => self.handle_set(request.body.clone()).await,
            _ => HandlerResponse::failure(405, "Method Not Allowed"),
        };
        self.finish(request, WRITE_METHODS, response)
    }

    /// `updateCache`: insert or replace one key
    pub async fn update_cache(&self, request: &HandlerRequest) -> HandlerResponse {
        let response = match request.method {
            Method::Options => HandlerResponse::empty(200),
            Method::Post => self.handle_update(request.body.clone()).await,
            _ => HandlerResponse::failure(405, "Method Not Allowed"),
        };
        self.finish(request, WRITE_METHODS, response)
    }

    async fn handle_set(&self, body: Option<Value>) -> HandlerResponse {
        let document = match body.map(serde_json::from_value::<SetBody>) {
            Some(Ok(body)) => body.data,
            _ => return HandlerResponse::failure(400, "Missing data object"),
        };

        match self.store.set(&document).await {
            Ok(()) => {
                info!(entries = document.len(), "Cache replaced");
                HandlerResponse::json(200, &json!({ "success": true }))
            }
            Err(e) => {
                error!(error = %e, "Failed to replace cache");
                HandlerResponse::failure(500, e.to_string())
            }
        }
    }

    async fn handle_update(&self, body: Option<Value>) -> HandlerResponse {
        let body = match body.map(serde_json::from_value::<UpdateBody>) {
            Some(Ok(body)) => body,
            Some(Err(e)) => {
                warn!(error = %e, "Malformed update body");
                UpdateBody::default()
            }
            None => UpdateBody::default(),
        };
        let key = body.key.unwrap_or_default();

        match self.store.update_entry(&key, body.value).await {
            Ok(value) => HandlerResponse::json(
                200,
                &json!({
                    "success": true,
                    "message": "Cache updated successfully",
                    "key": key,
                    "value": value,
                }),
            ),
            Err(CacheError::InvalidArgument(_)) => {
                HandlerResponse::failure(400, "Missing key or value")
            }
            Err(e) => HandlerResponse::failure(500, e.to_string()),
        }
    }

    fn finish(
        &self,
        request: &HandlerRequest,
        methods: &str,
        response: HandlerResponse,
    ) -> HandlerResponse {
        self.cors
            .apply(request.origin.as_deref(), methods, response)
    }
}
