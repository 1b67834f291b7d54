use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::protocol::{Breadcrumb, EventSource, Level};
use crate::stacktrace::RawFrame;

/// An error value captured for reporting.
///
/// Keeps the wire-facing description (`ty`, `value`, `module`) together with the
/// original value, which stays local to the process.
#[derive(Clone, Debug)]
pub struct ExceptionInfo {
    /// Type name, e.g. `"Error"`.
    pub ty: String,
    /// Display text.
    pub value: String,
    /// Path of the type, e.g. `"std::io::error"`.
    pub module: Option<String>,
    pub original: Option<Arc<dyn StdError + Send + Sync>>,
}

impl ExceptionInfo {
    /// Describes `err` by its Rust type and `Display` text, keeping the value.
    pub fn from_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let (module, ty) = split_type_name(std::any::type_name::<E>());
        Self {
            ty,
            value: err.to_string(),
            module,
            original: Some(Arc::new(err)),
        }
    }

    /// Describes an already shared error; the type is only known as `ty`.
    pub fn from_shared(ty: impl Into<String>, err: Arc<dyn StdError + Send + Sync>) -> Self {
        Self {
            ty: ty.into(),
            value: err.to_string(),
            module: None,
            original: Some(err),
        }
    }

    /// A description with no underlying error value.
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            value: value.into(),
            module: None,
            original: None,
        }
    }
}

/// Splits `a::b::Type<x::Y>` into (`Some("a::b")`, `"Type<x::Y>"`).
fn split_type_name(full: &str) -> (Option<String>, String) {
    let generic_start = full.find('<').unwrap_or(full.len());
    match full[..generic_start].rfind("::") {
        Some(idx) => (Some(full[..idx].to_string()), full[idx + 2..].to_string()),
        None => (None, full.to_string()),
    }
}

/// Everything a caller can pass to a capture call.
///
/// Each field overrides (or, for maps, is merged over) the context store and
/// the static configuration.
#[derive(Clone, Debug, Default)]
pub struct CaptureOptions {
    pub exception: Option<ExceptionInfo>,
    /// Raw frames, top of stack first.
    pub stacktrace: Option<Vec<RawFrame>>,
    pub message: Option<String>,
    pub source: Option<EventSource>,
    pub extra: Map<String, Value>,
    pub tags: Map<String, Value>,
    pub user: Map<String, Value>,
    /// Validated against the known request fields at build time.
    pub request: Map<String, Value>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub level: Option<Level>,
    pub fingerprint: Option<Vec<String>>,
}

impl CaptureOptions {
    /// Options for reporting `err`.
    pub fn exception<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            exception: Some(ExceptionInfo::from_error(err)),
            ..Self::default()
        }
    }

    /// Options for reporting a plain message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    #[inline]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    pub fn with_stacktrace(mut self, frames: Vec<RawFrame>) -> Self {
        self.stacktrace = Some(frames);
        self
    }

    #[inline]
    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_user(mut self, user: Map<String, Value>) -> Self {
        self.user.extend(user);
        self
    }

    pub fn with_request(mut self, request: Map<String, Value>) -> Self {
        self.request.extend(request);
        self
    }

    pub fn with_breadcrumb(mut self, crumb: Breadcrumb) -> Self {
        self.breadcrumbs.push(crumb);
        self
    }

    pub fn with_fingerprint<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fingerprint = Some(parts.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_is_split_into_module_and_type() {
        let info = ExceptionInfo::from_error(std::io::Error::other("disk full"));
        assert_eq!(info.ty, "Error");
        assert_eq!(info.module.as_deref(), Some("std::io::error"));
        assert_eq!(info.value, "disk full");
        assert!(info.original.is_some());
    }

    #[test]
    fn generics_do_not_confuse_the_split() {
        let (module, ty) = split_type_name("app::Wrapper<core::num::ParseIntError>");
        assert_eq!(module.as_deref(), Some("app"));
        assert_eq!(ty, "Wrapper<core::num::ParseIntError>");
    }

    #[test]
    fn bare_type_has_no_module() {
        assert_eq!(split_type_name("MyError"), (None, "MyError".to_string()));
    }
}
