//! # Observer trait
//!
//! `Subscribe` is the extension point for reacting to delivery notices: logging,
//! metrics, alerting on exhausted deliveries. Each subscriber is driven by its own
//! worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block senders or other subscribers.
//! - A full queue drops notices for that subscriber only (`SubscriberOverflow`).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use faultcast::{Notice, NoticeKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_notice(&self, n: &Notice) {
//!         if n.kind == NoticeKind::DeliveryExhausted {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::notices::Notice;

/// Contract for notice observers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one notice.
    async fn on_notice(&self, notice: &Notice);

    /// Name used in overflow/panic notices.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
