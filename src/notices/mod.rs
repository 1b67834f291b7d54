//! Delivery notices: types and broadcast bus.
//!
//! ## Contents
//! - [`NoticeKind`], [`Notice`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Sender` actors, `core::attempt`, the `Client` (drops,
//!   rejections, shutdown) and `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the client's notice listener, which fans out to the
//!   `SubscriberSet`.

mod bus;
mod notice;

pub use bus::Bus;
pub use notice::{Notice, NoticeKind};
