//! # Stack frame normalization.
//!
//! Captured stacks arrive as [`RawFrame`]s ordered top-of-stack first. The
//! [`Normalizer`] turns them into protocol [`Frame`](crate::Frame)s:
//!
//! ```text
//! [RawFrame; top first] ──► Normalizer::normalize ──► [Frame; oldest call first]
//!                                │
//!                                ├── function = "module.function/arity"
//!                                ├── in_app   = module under an allow-listed prefix
//!                                ├── vars     = "argN" → bounded repr (argument lists only)
//!                                └── context  = SourceLookup (when enabled and located)
//! ```
//!
//! ## Rules
//! - Normalization never fails; missing location data stays missing.
//! - Only frames whose module sits under an allow-listed prefix are `in_app`.

mod normalizer;
mod raw;
mod source;

pub use normalizer::{MAX_ARG_REPR, Normalizer, culprit};
pub use raw::{Arity, Location, RawFrame};
pub use source::{SourceCodeMap, SourceContext, SourceLookup};
