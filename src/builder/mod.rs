//! # Event construction.
//!
//! ```text
//! CaptureOptions ──┐
//! ContextSnapshot ─┼──► EventBuilder::build ──► Event
//! ClientConfig ────┤        │
//! ProcessInfo ─────┘        └── Normalizer (frames, in_app, source context)
//! ```
//!
//! ## Rules
//! - Precedence per field: options > context > static config.
//! - Breadcrumbs: option breadcrumbs then context breadcrumbs, keeping the last
//!   `max_breadcrumbs`.
//! - Building never awaits and performs no I/O besides the source lookup.

mod event_builder;
mod options;

pub use event_builder::{EventBuilder, MESSAGE_EXCEPTION_TYPE};
pub use options::{CaptureOptions, ExceptionInfo};
