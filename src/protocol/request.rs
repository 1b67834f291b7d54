//! # HTTP request interface attached to events.
//!
//! Request data arrives from web integrations as loose maps. [`Request::from_map`]
//! checks every key against [`REQUEST_FIELDS`] and rejects unknown keys instead
//! of dropping them, so a typo in an integration surfaces at the call site.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::BuildError;

/// The fixed set of keys a request map may carry.
pub const REQUEST_FIELDS: [&str; 7] = [
    "url",
    "method",
    "data",
    "query_string",
    "cookies",
    "headers",
    "env",
];

/// Request information for an event.
///
/// Every field is optional; values keep whatever JSON shape the integration
/// supplied.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Value>,
}

impl Request {
    /// Validates a loose map into a [`Request`].
    ///
    /// ### Errors
    /// [`BuildError::UnknownRequestField`] for the first key outside [`REQUEST_FIELDS`].
    pub fn from_map(map: Map<String, Value>) -> Result<Self, BuildError> {
        let mut req = Request::default();
        for (key, value) in map {
            let slot = match key.as_str() {
                "url" => &mut req.url,
                "method" => &mut req.method,
                "data" => &mut req.data,
                "query_string" => &mut req.query_string,
                "cookies" => &mut req.cookies,
                "headers" => &mut req.headers,
                "env" => &mut req.env,
                _ => return Err(BuildError::UnknownRequestField(key)),
            };
            *slot = Some(value);
        }
        Ok(req)
    }

    /// Field-wise merge: every field set in `other` overrides `self`.
    pub fn merge(mut self, other: Request) -> Self {
        fn pick(base: &mut Option<Value>, over: Option<Value>) {
            if over.is_some() {
                *base = over;
            }
        }
        pick(&mut self.url, other.url);
        pick(&mut self.method, other.method);
        pick(&mut self.data, other.data);
        pick(&mut self.query_string, other.query_string);
        pick(&mut self.cookies, other.cookies);
        pick(&mut self.headers, other.headers);
        pick(&mut self.env, other.env);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Request::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn accepts_known_fields() {
        let req = Request::from_map(map(json!({
            "url": "https://example.com/a",
            "method": "GET",
            "headers": {"accept": "*/*"}
        })))
        .unwrap();
        assert_eq!(req.method, Some(json!("GET")));
        assert_eq!(req.headers, Some(json!({"accept": "*/*"})));
    }

    #[test]
    fn rejects_unknown_field() {
        let err = Request::from_map(map(json!({"url": "/", "body": "x"}))).unwrap_err();
        assert_eq!(err, BuildError::UnknownRequestField("body".into()));
    }

    #[test]
    fn merge_prefers_other() {
        let base = Request::from_map(map(json!({"url": "/a", "method": "GET"}))).unwrap();
        let over = Request::from_map(map(json!({"method": "POST"}))).unwrap();
        let merged = base.merge(over);
        assert_eq!(merged.url, Some(json!("/a")));
        assert_eq!(merged.method, Some(json!("POST")));
    }
}
