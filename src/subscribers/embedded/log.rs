//! # LogWriter: notices as `tracing` events
//!
//! Turns every [`Notice`] into one structured `tracing` event under the
//! `faultcast` target. Failures log at `warn`/`error`, progress at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG faultcast: delivery starting event_id=0af7… sender=sender-1 attempt=1
//!  WARN faultcast: delivery attempt failed event_id=0af7… sender=sender-1 attempt=1 status=503 reason=…
//! DEBUG faultcast: retry scheduled event_id=0af7… sender=sender-1 attempt=1 delay_ms=1000
//!  INFO faultcast: event delivered event_id=0af7… sender=sender-1 attempt=2 remote_id=340
//! ERROR faultcast: event delivery failed event_id=… sender=sender-3 attempt=5 reason=…
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::notices::{Notice, NoticeKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "faultcast";

/// Subscriber writing notices through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_notice(&self, n: &Notice) {
        let event_id = n.event_id.as_deref().unwrap_or("-");
        let sender = n.sender.as_deref().unwrap_or("-");
        let reason = n.reason.as_deref().unwrap_or("-");

        match n.kind {
            NoticeKind::DeliveryStarting => {
                debug!(target: TARGET, event_id, sender, attempt = n.attempt, "delivery starting");
            }
            NoticeKind::DeliveryFailed => {
                warn!(target: TARGET, event_id, sender, attempt = n.attempt, status = n.status, reason, "delivery attempt failed");
            }
            NoticeKind::RetryScheduled => {
                debug!(target: TARGET, event_id, sender, attempt = n.attempt, delay_ms = n.delay_ms, "retry scheduled");
            }
            NoticeKind::DeliverySucceeded => {
                info!(target: TARGET, event_id, sender, attempt = n.attempt, remote_id = n.remote_id.as_deref(), "event delivered");
            }
            NoticeKind::DeliveryExhausted => {
                error!(target: TARGET, event_id, sender, attempt = n.attempt, reason, "event delivery failed");
            }
            NoticeKind::EventDropped => {
                debug!(target: TARGET, event_id, reason, "event not sent");
            }
            NoticeKind::DispatchRejected => {
                warn!(target: TARGET, event_id, reason, "event rejected by sender pool");
            }
            NoticeKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = sender, reason, "subscriber dropped notice");
            }
            NoticeKind::SubscriberPanicked => {
                error!(target: TARGET, subscriber = sender, reason, "subscriber panicked");
            }
            NoticeKind::ShutdownRequested => {
                info!(target: TARGET, "shutdown requested");
            }
            NoticeKind::AllStoppedWithin => {
                info!(target: TARGET, "all senders drained within grace");
            }
            NoticeKind::GraceExceeded => {
                warn!(target: TARGET, stuck = reason, "shutdown grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
