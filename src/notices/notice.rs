//! # Lifecycle notices emitted by senders, the dispatcher and the client.
//!
//! A [`Notice`] is the observable trace of what happened to an event after it
//! left the caller. The [`NoticeKind`] enum groups them into:
//! - **Delivery**: per-attempt flow inside a sender (starting, failed, retry, outcome)
//! - **Admission**: events that never reached a sender (dropped, rejected)
//! - **Subscriber**: observer faults (overflow, panic)
//! - **Shutdown**: client teardown
//!
//! ## Ordering guarantees
//! Every notice carries a process-wide monotonic `seq`; use it to restore the
//! order when notices from different senders interleave.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use faultcast::{Notice, NoticeKind};
//!
//! let n = Notice::new(NoticeKind::RetryScheduled)
//!     .with_event_id("0af7651916cd43dd8448eb211c80319c")
//!     .with_sender("sender-2")
//!     .with_attempt(1)
//!     .with_delay(Duration::from_secs(1));
//!
//! assert_eq!(n.sender.as_deref(), Some("sender-2"));
//! assert_eq!(n.delay_ms, Some(1000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === Delivery ===
    /// A sender starts an attempt.
    ///
    /// Sets: `event_id`, `sender`, `attempt`
    DeliveryStarting,

    /// One attempt failed (it may still be retried).
    ///
    /// Sets: `event_id`, `sender`, `attempt`, `reason`, `status` (HTTP answers only)
    DeliveryFailed,

    /// The sender will retry after `delay_ms`.
    ///
    /// Sets: `event_id`, `sender`, `attempt` (the failed one), `delay_ms`
    RetryScheduled,

    /// The endpoint accepted the event.
    ///
    /// Sets: `event_id`, `sender`, `attempt`, `remote_id`
    DeliverySucceeded,

    /// The delivery ended without success (retries exhausted, cancelled, deadline).
    ///
    /// Sets: `event_id`, `sender`, `attempt`, `reason`
    DeliveryExhausted,

    // === Admission ===
    /// The event was built but deliberately not sent.
    ///
    /// Sets: `event_id`, `reason` (`no_dsn`, `unsampled`, `filtered`)
    EventDropped,

    /// The dispatcher refused the event.
    ///
    /// Sets: `event_id`, `reason` (`saturated`, `closed`)
    DispatchRejected,

    // === Subscriber ===
    /// Subscriber panicked while handling a notice.
    ///
    /// Sets: `sender` (subscriber name), `reason` (panic message)
    SubscriberPanicked,

    /// Subscriber dropped a notice (queue full or worker closed).
    ///
    /// Sets: `sender` (subscriber name), `reason`
    SubscriberOverflow,

    // === Shutdown ===
    /// `Client::shutdown` was called.
    ShutdownRequested,

    /// Every sender drained within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; in-flight deliveries were cancelled.
    ///
    /// Sets: `reason` (names of stuck senders)
    GraceExceeded,
}

impl NoticeKind {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::DeliveryStarting => "delivery_starting",
            NoticeKind::DeliveryFailed => "delivery_failed",
            NoticeKind::RetryScheduled => "retry_scheduled",
            NoticeKind::DeliverySucceeded => "delivery_succeeded",
            NoticeKind::DeliveryExhausted => "delivery_exhausted",
            NoticeKind::EventDropped => "event_dropped",
            NoticeKind::DispatchRejected => "dispatch_rejected",
            NoticeKind::SubscriberPanicked => "subscriber_panicked",
            NoticeKind::SubscriberOverflow => "subscriber_overflow",
            NoticeKind::ShutdownRequested => "shutdown_requested",
            NoticeKind::AllStoppedWithin => "all_stopped_within",
            NoticeKind::GraceExceeded => "grace_exceeded",
        }
    }
}

/// A lifecycle notice with optional metadata.
#[derive(Clone, Debug)]
pub struct Notice {
    /// Process-wide monotonic sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    pub kind: NoticeKind,

    /// Id of the event concerned.
    pub event_id: Option<Arc<str>>,
    /// Sender (or subscriber) name.
    pub sender: Option<Arc<str>>,
    /// Attempt number, 1-based.
    pub attempt: Option<u32>,
    /// Wait before the next attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// HTTP status of a failed attempt.
    pub status: Option<u16>,
    /// Id assigned by the endpoint.
    pub remote_id: Option<Arc<str>>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event_id: None,
            sender: None,
            attempt: None,
            delay_ms: None,
            status: None,
            remote_id: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_event_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.event_id = Some(id.into());
        self
    }

    #[inline]
    pub fn with_sender(mut self, name: impl Into<Arc<str>>) -> Self {
        self.sender = Some(name.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Stored as milliseconds, saturating at `u32::MAX`.
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    pub fn with_remote_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.remote_id = Some(id.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow notice.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Notice::new(NoticeKind::SubscriberOverflow)
            .with_sender(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic notice.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Notice::new(NoticeKind::SubscriberPanicked)
            .with_sender(subscriber)
            .with_reason(info)
    }

    /// True for notices produced by subscriber workers themselves.
    #[inline]
    pub fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::SubscriberOverflow | NoticeKind::SubscriberPanicked
        )
    }

    /// True when the event's delivery reached a final outcome.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::DeliverySucceeded
                | NoticeKind::DeliveryExhausted
                | NoticeKind::EventDropped
                | NoticeKind::DispatchRejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Notice::new(NoticeKind::DeliveryStarting);
        let b = Notice::new(NoticeKind::DeliveryStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let n = Notice::new(NoticeKind::RetryScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(n.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn terminal_classification() {
        assert!(Notice::new(NoticeKind::DeliverySucceeded).is_terminal());
        assert!(Notice::new(NoticeKind::EventDropped).is_terminal());
        assert!(!Notice::new(NoticeKind::RetryScheduled).is_terminal());
        assert!(Notice::subscriber_overflow("log", "full").is_subscriber_fault());
    }
}
