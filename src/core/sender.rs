//! # Sender: one member of the delivery pool.
//!
//! Each sender is an actor task owning a bounded job queue. It takes one job at
//! a time and drives its [`DeliveryState`] to a terminal state.
//!
//! ## Notice flow
//! ```text
//! DeliveryStarting → [attempt] → DeliveryFailed → RetryScheduled → [sleep] → DeliveryStarting → ...
//!                             └─► (terminal) DeliverySucceeded | DeliveryExhausted
//! ```
//!
//! ## Architecture
//! ```text
//! Dispatcher ──try_send(Job)──► [queue] ──► Sender::run()
//!
//! loop {
//!   ├─► recv job (or drain / cancel)
//!   ├─► notify dispatcher: queue space freed
//!   ├─► drive DeliveryState (bounded by delivery_deadline)
//!   │     ├─► Sending   → run_attempt()
//!   │     └─► Retrying  → sleep(delay), cancellable
//!   ├─► publish terminal notice
//!   └─► reply (sync jobs)
//! }
//! ```
//!
//! ## Rules
//! - Deliveries run **sequentially** within one sender.
//! - `drain` closes the queue; queued jobs are still delivered.
//! - `cancel` aborts the in-flight delivery and fails queued jobs with `Cancelled`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, oneshot};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::attempt::{AttemptTarget, run_attempt};
use super::retry::DeliveryState;
use crate::error::DeliveryError;
use crate::notices::{Bus, Notice, NoticeKind};
use crate::policies::RetryPolicy;
use crate::protocol::{Event, Sdk};
use crate::transport::{Dsn, Transport};

/// Outcome of a whole delivery: the remote id or the terminal error.
pub type DeliveryResult = Result<String, DeliveryError>;

/// One unit of work: an event and, for synchronous captures, where to reply.
pub(crate) struct Job {
    pub event: Arc<Event>,
    pub reply: Option<oneshot::Sender<DeliveryResult>>,
}

/// Dispatcher-side handle of a sender.
#[derive(Clone)]
pub(crate) struct SenderHandle {
    pub name: Arc<str>,
    pub tx: mpsc::Sender<Job>,
    pub busy: Arc<AtomicBool>,
}

impl SenderHandle {
    /// True while a delivery is in flight or jobs are waiting.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire) || self.tx.capacity() < self.tx.max_capacity()
    }
}

/// Settings every sender of a pool shares.
#[derive(Clone)]
pub(crate) struct SenderParams {
    pub transport: Arc<dyn Transport>,
    pub dsn: Arc<Dsn>,
    pub sdk: Sdk,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Overall budget per delivery (`None` = unbounded).
    pub deadline: Option<Duration>,
}

pub(crate) struct Sender {
    name: Arc<str>,
    rx: mpsc::Receiver<Job>,
    params: SenderParams,
    bus: Bus,
    busy: Arc<AtomicBool>,
    space: Arc<Notify>,
}

impl Sender {
    /// Creates the actor and its handle. The actor does nothing until `run`.
    pub fn new(
        index: usize,
        capacity: usize,
        params: SenderParams,
        bus: Bus,
        space: Arc<Notify>,
    ) -> (Self, SenderHandle) {
        let name: Arc<str> = Arc::from(format!("sender-{index}"));
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let busy = Arc::new(AtomicBool::new(false));

        let handle = SenderHandle {
            name: Arc::clone(&name),
            tx,
            busy: Arc::clone(&busy),
        };
        let sender = Self {
            name,
            rx,
            params,
            bus,
            busy,
            space,
        };
        (sender, handle)
    }

    /// Processes jobs until the queue is drained and closed, or `cancel` fires.
    pub async fn run(mut self, drain: CancellationToken, cancel: CancellationToken) {
        let mut draining = false;

        loop {
            let job = select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = drain.cancelled(), if !draining => {
                    draining = true;
                    self.rx.close();
                    continue;
                }
                job = self.rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            self.busy.store(true, Ordering::Release);
            self.space.notify_waiters();

            let (attempts, result) = self.deliver(&job.event, &cancel).await;
            self.report(&job.event, attempts, &result);

            self.busy.store(false, Ordering::Release);
            if let Some(reply) = job.reply {
                let _ = reply.send(result);
            }
        }

        self.rx.close();
        while let Ok(job) = self.rx.try_recv() {
            let result = Err(DeliveryError::Cancelled);
            self.report(&job.event, 0, &result);
            if let Some(reply) = job.reply {
                let _ = reply.send(result);
            }
        }
    }

    /// Drives one delivery, bounded by the configured deadline.
    async fn deliver(&self, event: &Event, cancel: &CancellationToken) -> (u32, DeliveryResult) {
        let mut attempts = 0;
        let result = match self.params.deadline {
            Some(limit) => time::timeout(limit, self.drive(event, cancel, &mut attempts))
                .await
                .unwrap_or(Err(DeliveryError::DeadlineExceeded(limit))),
            None => self.drive(event, cancel, &mut attempts).await,
        };
        (attempts, result)
    }

    async fn drive(
        &self,
        event: &Event,
        cancel: &CancellationToken,
        attempts: &mut u32,
    ) -> DeliveryResult {
        let target = AttemptTarget {
            transport: self.params.transport.as_ref(),
            dsn: &self.params.dsn,
            sdk: &self.params.sdk,
            request_timeout: self.params.request_timeout,
        };
        let mut state = DeliveryState::Idle;

        loop {
            state = match state {
                DeliveryState::Idle => DeliveryState::start(),
                DeliveryState::Sending { attempt } => {
                    *attempts = attempt;
                    self.bus.publish(
                        self.notice(NoticeKind::DeliveryStarting, event)
                            .with_attempt(attempt),
                    );

                    let outcome = select! {
                        _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
                        out = run_attempt(&target, event, &self.name, attempt, &self.bus) => out,
                    };
                    DeliveryState::Sending { attempt }.on_outcome(
                        outcome.result,
                        outcome.retry_after,
                        &self.params.retry,
                    )
                }
                DeliveryState::Retrying { attempt, delay } => {
                    self.bus.publish(
                        self.notice(NoticeKind::RetryScheduled, event)
                            .with_attempt(attempt)
                            .with_delay(delay),
                    );

                    let sleep = time::sleep(delay);
                    tokio::pin!(sleep);
                    select! {
                        _ = &mut sleep => {}
                        _ = cancel.cancelled() => return Err(DeliveryError::Cancelled),
                    }
                    DeliveryState::Retrying { attempt, delay }.resume()
                }
                DeliveryState::Succeeded { remote_id, .. } => return Ok(remote_id),
                DeliveryState::Exhausted { error, .. } => return Err(error),
            };
        }
    }

    fn report(&self, event: &Event, attempts: u32, result: &DeliveryResult) {
        let notice = match result {
            Ok(remote_id) => self
                .notice(NoticeKind::DeliverySucceeded, event)
                .with_remote_id(remote_id.as_str()),
            Err(e) => self
                .notice(NoticeKind::DeliveryExhausted, event)
                .with_reason(e.to_string()),
        };
        self.bus.publish(notice.with_attempt(attempts));
    }

    fn notice(&self, kind: NoticeKind, event: &Event) -> Notice {
        Notice::new(kind)
            .with_event_id(event.event_id.as_str())
            .with_sender(Arc::clone(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::{ScriptedTransport, ok, status};

    fn params(transport: Arc<dyn Transport>, retry: RetryPolicy) -> SenderParams {
        SenderParams {
            transport,
            dsn: Arc::new("https://pub@host/1".parse().unwrap()),
            sdk: Sdk::current(),
            retry,
            request_timeout: Duration::from_secs(30),
            deadline: None,
        }
    }

    async fn send_one(
        params: SenderParams,
        bus: &Bus,
    ) -> (DeliveryResult, CancellationToken, CancellationToken) {
        let (sender, handle) = Sender::new(0, 4, params, bus.clone(), Arc::new(Notify::new()));
        let drain = CancellationToken::new();
        let cancel = CancellationToken::new();
        tokio::spawn(sender.run(drain.clone(), cancel.clone()));

        let (tx, rx) = oneshot::channel();
        let job = Job {
            event: Arc::new(Event::new(Sdk::current())),
            reply: Some(tx),
        };
        assert!(handle.tx.send(job).await.is_ok());
        (rx.await.unwrap(), drain, cancel)
    }

    #[tokio::test]
    async fn single_attempt_against_failing_endpoint() {
        let transport = ScriptedTransport::new(vec![status(500, "down")]);
        let bus = Bus::new(64);
        let (result, ..) = send_one(params(transport.clone(), RetryPolicy::none()), &bus).await;

        match result {
            Err(DeliveryError::Exhausted { attempts: 1, last }) => {
                assert!(matches!(*last, DeliveryError::Status { status: 500, .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn accepted_event_returns_remote_id() {
        let transport = ScriptedTransport::new(vec![ok("340")]);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (result, ..) = send_one(params(transport, RetryPolicy::none()), &bus).await;
        assert_eq!(result, Ok("340".into()));

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|n| n.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NoticeKind::DeliveryStarting, NoticeKind::DeliverySucceeded]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_wait_the_configured_intervals() {
        let transport =
            ScriptedTransport::new(vec![status(502, ""), status(503, ""), ok("ok-after-retries")]);
        let retry = RetryPolicy::fixed([Duration::from_secs(1), Duration::from_secs(2)]);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let started = time::Instant::now();
        let (result, ..) = send_one(params(transport.clone(), retry), &bus).await;
        assert_eq!(result, Ok("ok-after-retries".into()));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(transport.calls(), 3);

        let delays: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|n| n.kind == NoticeKind::RetryScheduled)
            .map(|n| n.delay_ms)
            .collect();
        assert_eq!(delays, vec![Some(1000), Some(2000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_whole_delivery() {
        let transport = ScriptedTransport::new(vec![status(500, "")]);
        let mut p = params(transport, RetryPolicy::fixed([Duration::from_secs(60)]));
        p.deadline = Some(Duration::from_secs(5));

        let (result, ..) = send_one(p, &Bus::new(64)).await;
        assert_eq!(
            result,
            Err(DeliveryError::DeadlineExceeded(Duration::from_secs(5)))
        );
    }

    #[tokio::test]
    async fn queued_jobs_are_attempted_in_submission_order() {
        let transport = ScriptedTransport::new(vec![ok("a"), ok("b"), ok("c")]);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let (sender, handle) = Sender::new(
            0,
            4,
            params(transport.clone(), RetryPolicy::none()),
            bus.clone(),
            Arc::new(Notify::new()),
        );

        let mut submitted = Vec::new();
        for _ in 0..3 {
            let event = Arc::new(Event::new(Sdk::current()));
            submitted.push(event.event_id.clone());
            assert!(handle.tx.send(Job { event, reply: None }).await.is_ok());
        }

        let drain = CancellationToken::new();
        let task = tokio::spawn(sender.run(drain.clone(), CancellationToken::new()));
        drain.cancel();
        task.await.unwrap();
        assert_eq!(transport.calls(), 3);

        let started: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|n| n.kind == NoticeKind::DeliveryStarting)
            .filter_map(|n| n.event_id.map(|id| id.to_string()))
            .collect();
        assert_eq!(started, submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_in_flight_and_queued_jobs() {
        let transport = ScriptedTransport::slow(vec![ok("never")], Duration::from_secs(600));
        let (sender, handle) = Sender::new(
            0,
            4,
            params(transport.clone(), RetryPolicy::none()),
            Bus::new(64),
            Arc::new(Notify::new()),
        );
        let drain = CancellationToken::new();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(sender.run(drain, cancel.clone()));

        let mut replies = Vec::new();
        for _ in 0..2 {
            let (tx, rx) = oneshot::channel();
            let job = Job {
                event: Arc::new(Event::new(Sdk::current())),
                reply: Some(tx),
            };
            assert!(handle.tx.send(job).await.is_ok());
            replies.push(rx);
        }
        while transport.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(handle.is_busy());

        cancel.cancel();
        task.await.unwrap();
        for rx in replies {
            assert_eq!(rx.await.unwrap(), Err(DeliveryError::Cancelled));
        }
    }
}
