//! Wire data model.
//!
//! Everything in this module is plain data with `serde` derives: the [`Event`]
//! record and its parts, plus the process-wide [`ProcessInfo`] computed once
//! when the client is built.
//!
//! ## Contents
//! - [`Event`], [`EventSource`], [`ExceptionValue`], [`Stacktrace`]: the event record
//! - [`Frame`]: one normalized stack frame
//! - [`Breadcrumb`], [`Level`], [`Request`]: event parts
//! - [`ProcessInfo`], [`Sdk`]: one-shot process snapshot

mod breadcrumb;
mod event;
mod frame;
mod level;
mod process;
mod request;

pub use breadcrumb::Breadcrumb;
pub use event::{Event, EventSource, ExceptionValue, Stacktrace};
pub use frame::Frame;
pub use level::Level;
pub use process::{ProcessInfo, Sdk};
pub use request::{REQUEST_FIELDS, Request};

pub(crate) mod timestamp {
    use chrono::{DateTime, SubsecRound, Utc};
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    /// Current UTC time truncated to microsecond precision.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&at.format(FORMAT))
    }
}
