//! Buffered request representation
//!
//! The HTTP layer collects the body once and hands handlers an
//! [`ApiRequest`]. Integration tests build the same value in memory.

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::ServiceError;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Decode a query string; malformed input yields no parameters
pub fn parse_query(raw: Option<&str>) -> HashMap<String, String> {
    raw.and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

impl ApiRequest {
    /// Request for `target` (path plus optional `?query`)
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        Self {
            method,
            path: path.to_string(),
            query: parse_query(query),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            path: parts.uri.path().to_string(),
            query: parse_query(parts.uri.query()),
            method: parts.method,
            headers: parts.headers,
            body,
        }
    }

    /// Add a header; invalid names or values are ignored
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header(AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_vec(body).map(Bytes::from).unwrap_or_default();
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub fn with_body(mut self, content_type: &'static str, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize a required JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Err(ServiceError::BadRequest("Request body must be JSON".into()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid JSON body: {}", e)))
    }

    /// Deserialize an optional JSON body; an empty body yields the default
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, ServiceError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        self.json()
    }

    /// Required body that must be a JSON object
    pub fn json_object(&self) -> Result<Map<String, Value>, ServiceError> {
        match self.json::<Value>()? {
            Value::Object(map) => Ok(map),
            _ => Err(ServiceError::BadRequest(
                "Request body must be a JSON object".into(),
            )),
        }
    }

    /// Optional JSON object body (empty body is an empty object)
    pub fn json_object_or_empty(&self) -> Result<Map<String, Value>, ServiceError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        self.json_object()
    }

    /// Non-empty string field from an optional JSON object body
    pub fn string_field(&self, field: &str) -> Result<Option<String>, ServiceError> {
        let body = self.json_object_or_empty()?;
        Ok(body
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    /// Like [`ApiRequest::string_field`] but missing is a `BadRequest`
    pub fn required_string(&self, field: &str) -> Result<String, ServiceError> {
        self.string_field(field)?.ok_or_else(|| {
            ServiceError::BadRequest(format!("Field '{}' is required", field))
        })
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<&str, ServiceError> {
        std::str::from_utf8(&self.body)
            .map_err(|_| ServiceError::BadRequest("Request body must be UTF-8 text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_split_and_decoded() {
        let req = ApiRequest::new(Method::GET, "/api/library/search?query=langue%20maya&page=2");
        assert_eq!(req.path, "/api/library/search");
        assert_eq!(req.query("query"), Some("langue maya"));
        assert_eq!(req.query("page"), Some("2"));
    }

    #[test]
    fn test_empty_body_rules() {
        let req = ApiRequest::new(Method::POST, "/x");
        assert!(req.json_object().is_err());
        assert!(req.json_object_or_empty().unwrap().is_empty());
        assert!(req.required_string("tag").is_err());
    }

    #[test]
    fn test_string_fields() {
        let req = ApiRequest::new(Method::POST, "/x").with_json(&json!({"tag": " oral ", "n": 3}));
        assert_eq!(req.required_string("tag").unwrap(), "oral");
        assert_eq!(req.string_field("n").unwrap(), None);
    }

    #[test]
    fn test_non_object_body_rejected() {
        let req = ApiRequest::new(Method::POST, "/x").with_json(&json!([1, 2]));
        assert!(matches!(req.json_object(), Err(ServiceError::BadRequest(_))));
    }

    #[test]
    fn test_bearer_header() {
        let req = ApiRequest::new(Method::GET, "/x").with_bearer("abc");
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
    }
}
