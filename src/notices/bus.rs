//! # Notice bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]: senders, the
//! dispatcher and the client publish; the client's listener task fans notices
//! out to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! sender-0 ──┐
//! sender-1 ──┼──► Bus ──► notice listener (in Client) ──► SubscriberSet
//! Client   ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks.
//! - One ring buffer of `capacity` notices is shared by all receivers; a
//!   receiver that falls behind gets `RecvError::Lagged(n)` and skips `n`.
//! - Notices published while nobody listens are lost.

use tokio::sync::broadcast;

use super::notice::Notice;

#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Notice>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }

    /// New independent receiver; it only sees notices published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}
