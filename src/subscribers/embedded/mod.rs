//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes notices as structured `tracing` events.

mod log;

pub use log::LogWriter;
