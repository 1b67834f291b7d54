use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{Level, timestamp};

/// A trail entry recorded before the event happened.
///
/// Breadcrumbs are kept most-recent-last; the builder caps the combined list at
/// `max_breadcrumbs` by dropping the oldest entries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Breadcrumb {
    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Breadcrumb {
    /// Creates a breadcrumb stamped with the current time.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp::now(),
            ty: None,
            category: None,
            message: Some(message.into()),
            level: None,
            data: Map::new(),
        }
    }

    #[inline]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[inline]
    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    #[inline]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[inline]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
