//! # The event record.
//!
//! An [`Event`] is built once per capture call by the
//! [`EventBuilder`](crate::EventBuilder) and handed to the dispatcher as
//! `Arc<Event>`; nothing mutates it after handoff.
//!
//! ## Payload vs. local fields
//! ```text
//! Event
//!   ├── payload fields ──────► serialized by Event::to_payload() ──► transport
//!   └── local fields
//!         ├── source              (#[serde(skip)])
//!         └── original_exception  (#[serde(skip)])
//! ```
//!
//! ## Rules
//! - `event_id` (32 lowercase hex chars) and `timestamp` are always set.
//! - Every payload key is always serialized, possibly as `null`, `[]` or `{}`.
//! - `exception` and `original_exception` come from the same input; only the
//!   former leaves the process.

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Breadcrumb, Frame, Level, Request, Sdk, timestamp};

/// Platform tag sent with every event.
pub const PLATFORM: &str = "rust";

/// Where a capture call originated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// A logging integration.
    Logger,
    /// A web-request middleware integration.
    Plug,
    /// Any caller-supplied tag.
    Custom(String),
}

impl EventSource {
    pub fn as_str(&self) -> &str {
        match self {
            EventSource::Logger => "logger",
            EventSource::Plug => "plug",
            EventSource::Custom(s) => s,
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized frames attached to an exception entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
}

/// One entry of the event's `exception` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExceptionValue {
    /// Error type name, or `"message"` for message-only captures.
    #[serde(rename = "type")]
    pub ty: String,
    /// Human-readable error text.
    pub value: String,
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
}

/// A complete, immutable error event.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    pub event_id: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    pub platform: &'static str,
    pub level: Level,
    pub message: Option<String>,
    pub culprit: Option<String>,
    pub exception: Vec<ExceptionValue>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub tags: Map<String, Value>,
    pub extra: Map<String, Value>,
    pub user: Map<String, Value>,
    pub request: Request,
    pub contexts: Map<String, Value>,
    pub fingerprint: Vec<String>,
    pub modules: BTreeMap<String, String>,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub server_name: Option<String>,
    pub sdk: Sdk,

    /// Origin of the capture call (local only).
    #[serde(skip)]
    pub source: Option<EventSource>,
    /// The caller's error value, for local collaborators such as loggers.
    #[serde(skip)]
    pub original_exception: Option<Arc<dyn StdError + Send + Sync>>,
}

impl Event {
    /// Creates an empty event with a fresh id and timestamp.
    pub fn new(sdk: Sdk) -> Self {
        Self {
            event_id: new_event_id(),
            timestamp: timestamp::now(),
            platform: PLATFORM,
            level: Level::default(),
            message: None,
            culprit: None,
            exception: Vec::new(),
            breadcrumbs: Vec::new(),
            tags: Map::new(),
            extra: Map::new(),
            user: Map::new(),
            request: Request::default(),
            contexts: Map::new(),
            fingerprint: vec![Self::DEFAULT_FINGERPRINT.to_string()],
            modules: BTreeMap::new(),
            environment: None,
            release: None,
            server_name: None,
            sdk,
            source: None,
            original_exception: None,
        }
    }

    /// Fingerprint used when the caller supplies none.
    pub const DEFAULT_FINGERPRINT: &'static str = "{{default}}";

    /// Serializes the wire payload (local-only fields are never included).
    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Returns a 32-char lowercase hex identifier.
fn new_event_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_is_32_lowercase_hex() {
        let ev = Event::new(Sdk::current());
        assert_eq!(ev.event_id.len(), 32);
        assert!(
            ev.event_id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn ids_are_unique() {
        let a = Event::new(Sdk::current());
        let b = Event::new(Sdk::current());
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn timestamp_has_microsecond_precision() {
        let ev = Event::new(Sdk::current());
        let payload = ev.to_payload().unwrap();
        let ts = payload["timestamp"].as_str().unwrap();
        // 2024-01-01T00:00:00.000000
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn payload_strips_local_fields() {
        let mut ev = Event::new(Sdk::current());
        ev.source = Some(EventSource::Logger);
        ev.original_exception = Some(Arc::new(std::io::Error::other("boom")));
        let payload = ev.to_payload().unwrap();
        let obj = payload.as_object().unwrap();
        assert!(!obj.contains_key("source"));
        assert!(!obj.contains_key("original_exception"));
    }

    #[test]
    fn payload_has_all_documented_keys() {
        let payload = Event::new(Sdk::current()).to_payload().unwrap();
        let obj = payload.as_object().unwrap();
        for key in [
            "event_id",
            "timestamp",
            "platform",
            "level",
            "message",
            "culprit",
            "exception",
            "breadcrumbs",
            "tags",
            "extra",
            "user",
            "request",
            "contexts",
            "fingerprint",
            "modules",
            "environment",
            "release",
            "server_name",
            "sdk",
        ] {
            assert!(obj.contains_key(key), "missing payload key {key}");
        }
        assert_eq!(payload["fingerprint"], serde_json::json!(["{{default}}"]));
        assert_eq!(payload["level"], "error");
    }
}
