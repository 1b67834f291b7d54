//! # Dispatcher: routes events to the sender pool.
//!
//! ```text
//! dispatch(event, mode)
//!     │
//!     ├─► round-robin: try sender[next], sender[next+1], ... (each once)
//!     │        └─ first queue with room takes the job; next = chosen + 1
//!     │
//!     ├─► every queue full:
//!     │        ├─ FailFast        → Err(Saturated)
//!     │        └─ Block{timeout}  → wait for a sender to free space, retry; Err(Saturated) at timeout
//!     │
//!     └─► mode
//!              ├─ Async → Dispatched::Queued(event_id)   (outcome via notices)
//!              └─ Sync  → Dispatched::Pending(Completion) (outcome via oneshot)
//! ```
//!
//! ## Rules
//! - Never awaits network I/O; `Block` only waits for queue space.
//! - After `close()`, every dispatch fails with `Closed`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::{Notify, mpsc, oneshot};
use tokio::time;

use super::sender::{DeliveryResult, Job, SenderHandle};
use crate::error::{DeliveryError, DispatchError};
use crate::policies::SaturationPolicy;
use crate::protocol::Event;

/// How the caller wants the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Return as soon as a sender accepted the event.
    Async,
    /// Return a handle resolving to the delivery outcome.
    Sync,
}

/// Successful hand-off to a sender.
#[derive(Debug)]
pub enum Dispatched {
    /// Accepted; the outcome is reported through notices.
    Queued(String),
    /// Accepted; await the handle for the outcome.
    Pending(Completion),
}

/// Resolves to the outcome of a synchronous delivery.
#[derive(Debug)]
pub struct Completion {
    event_id: String,
    rx: oneshot::Receiver<DeliveryResult>,
}

impl Completion {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Waits for the delivery to finish; a sender gone mid-delivery is `Cancelled`.
    pub async fn wait(self) -> DeliveryResult {
        self.rx.await.unwrap_or(Err(DeliveryError::Cancelled))
    }
}

enum Placement {
    Placed,
    Full(Job),
    Closed,
}

/// Round-robin router over the sender pool.
pub struct Dispatcher {
    senders: Vec<SenderHandle>,
    next: AtomicUsize,
    saturation: SaturationPolicy,
    space: Arc<Notify>,
    closed: AtomicBool,
}

impl Dispatcher {
    pub(crate) fn new(
        senders: Vec<SenderHandle>,
        saturation: SaturationPolicy,
        space: Arc<Notify>,
    ) -> Self {
        Self {
            senders,
            next: AtomicUsize::new(0),
            saturation,
            space,
            closed: AtomicBool::new(false),
        }
    }

    /// Hands `event` to a sender, waiting for space if the policy allows.
    pub async fn dispatch(
        &self,
        event: Arc<Event>,
        mode: DispatchMode,
    ) -> Result<Dispatched, DispatchError> {
        let (mut job, dispatched) = self.prepare(event, mode);

        let Some(budget) = self.saturation.wait_budget() else {
            return self.place(job).map(|()| dispatched);
        };

        let deadline = time::Instant::now() + budget;
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_place(job) {
                Placement::Placed => return Ok(dispatched),
                Placement::Closed => return Err(DispatchError::Closed),
                Placement::Full(back) => job = back,
            }
            if time::timeout_at(deadline, notified).await.is_err() {
                return Err(DispatchError::Saturated);
            }
        }
    }

    /// Hands `event` to a sender without ever waiting.
    pub fn try_dispatch(
        &self,
        event: Arc<Event>,
        mode: DispatchMode,
    ) -> Result<Dispatched, DispatchError> {
        let (job, dispatched) = self.prepare(event, mode);
        self.place(job).map(|()| dispatched)
    }

    /// Refuses further dispatches.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.space.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn pool_size(&self) -> usize {
        self.senders.len()
    }

    /// Names of senders with work in flight or queued.
    pub fn busy_senders(&self) -> Vec<String> {
        self.senders
            .iter()
            .filter(|s| s.is_busy())
            .map(|s| s.name.to_string())
            .collect()
    }

    fn prepare(&self, event: Arc<Event>, mode: DispatchMode) -> (Job, Dispatched) {
        let event_id = event.event_id.clone();
        match mode {
            DispatchMode::Async => (Job { event, reply: None }, Dispatched::Queued(event_id)),
            DispatchMode::Sync => {
                let (tx, rx) = oneshot::channel();
                (
                    Job {
                        event,
                        reply: Some(tx),
                    },
                    Dispatched::Pending(Completion { event_id, rx }),
                )
            }
        }
    }

    fn place(&self, job: Job) -> Result<(), DispatchError> {
        match self.try_place(job) {
            Placement::Placed => Ok(()),
            Placement::Full(_) => Err(DispatchError::Saturated),
            Placement::Closed => Err(DispatchError::Closed),
        }
    }

    fn try_place(&self, mut job: Job) -> Placement {
        let n = self.senders.len();
        if n == 0 || self.is_closed() {
            return Placement::Closed;
        }

        let start = self.next.load(Ordering::Relaxed);
        let mut any_open = false;
        for offset in 0..n {
            let idx = (start + offset) % n;
            match self.senders[idx].tx.try_send(job) {
                Ok(()) => {
                    self.next.store((idx + 1) % n, Ordering::Relaxed);
                    return Placement::Placed;
                }
                Err(mpsc::error::TrySendError::Full(back)) => {
                    any_open = true;
                    job = back;
                }
                Err(mpsc::error::TrySendError::Closed(back)) => job = back,
            }
        }

        if any_open {
            Placement::Full(job)
        } else {
            Placement::Closed
        }
    }
}
