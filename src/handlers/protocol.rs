//! Request/response shapes shared by every handler

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP methods the handlers distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// Inbound request, already parsed by the hosting framework
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// Value of the `Origin` header
    pub origin: Option<String>,
    /// JSON body, if one was sent and parsed
    pub body: Option<Value>,
}

impl HandlerRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            origin: None,
            body: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Outbound response
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// JSON body; `None` for empty responses
    pub body: Option<Value>,
}

impl HandlerResponse {
    /// Response with no body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// JSON response
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        }
    }

    /// `{success: false, error}` body used by the cache endpoints
    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self::json(
            status,
            &serde_json::json!({ "success": false, "error": error.into() }),
        )
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with the given name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("OPTIONS".parse::<Method>().unwrap(), Method::Options);
        assert!("PATCH".parse::<Method>().is_err());
        assert_eq!(Method::Post.to_string(), "POST");
    }

    #[test]
    fn test_failure_body() {
        let response = HandlerResponse::failure(500, "boom");
        assert_eq!(response.status, 500);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(
            response.body,
            Some(serde_json::json!({"success": false, "error": "boom"}))
        );
        assert!(!response.is_success());
    }
}
