//! CORS headers for the handler responses

use super::protocol::HandlerResponse;

const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Which origins may read a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Echo the request origin only when it is listed
    AllowList(Vec<String>),
    /// `Access-Control-Allow-Origin: *`
    AnyOrigin,
}

impl CorsPolicy {
    pub fn allow_list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CorsPolicy::AllowList(origins.into_iter().map(Into::into).collect())
    }

    /// Value for `Access-Control-Allow-Origin`, if the origin may be served
    pub fn allowed_origin(&self, origin: Option<&str>) -> Option<String> {
        match self {
            CorsPolicy::AnyOrigin => Some("*".to_string()),
            CorsPolicy::AllowList(list) => {
                let origin = origin?;
                list.iter().any(|o| o == origin).then(|| origin.to_string())
            }
        }
    }

    /// Attach CORS headers for an endpoint accepting `methods`
    pub fn apply(
        &self,
        origin: Option<&str>,
        methods: &str,
        mut response: HandlerResponse,
    ) -> HandlerResponse {
        if let Some(allowed) = self.allowed_origin(origin) {
            response = response.with_header("Access-Control-Allow-Origin", allowed);
        }
        response
            .with_header("Access-Control-Allow-Methods", methods)
            .with_header("Access-Control-Allow-Headers", ALLOW_HEADERS)
    }
}
