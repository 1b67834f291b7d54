//! # Client: the capture façade.
//!
//! The [`Client`] owns the event builder, the root [`ContextStore`], the notice
//! bus and (when a DSN is configured) the sender pool behind a [`Dispatcher`].
//! It is built by [`ClientBuilder`](crate::ClientBuilder) and shared as `Arc<Client>`.
//!
//! ## Capture path
//! ```text
//! capture*(opts, ctx)
//!   ├─► EventBuilder::build(opts, ctx.snapshot())     ── Err ─► CaptureError::Build
//!   ├─► no DSN?            → EventDropped, NotSent(NoDsn)
//!   ├─► sample_rate miss?  → EventDropped, NotSent(Unsampled)
//!   ├─► before_send → None → EventDropped, NotSent(Filtered)
//!   └─► Dispatcher::dispatch(Arc<Event>, mode)
//!          ├─ Err            → DispatchRejected, CaptureError::Dispatch
//!          ├─ Async          → Queued{event_id}
//!          └─ Sync (wait)    → Sent{event_id, remote_id} | CaptureError::Delivery
//! ```
//!
//! ## Shutdown path
//! ```text
//! shutdown(grace)
//!   ├─► Bus.publish(ShutdownRequested)
//!   ├─► dispatcher.close(); drain.cancel()       (senders finish their queues)
//!   └─► wait_all_with_grace(grace):
//!          ├─ all joined  → Bus.publish(AllStoppedWithin)
//!          └─ timeout     → Bus.publish(GraceExceeded), cancel.cancel(),
//!                           Err(RuntimeError::GraceExceeded{grace, stuck})
//! then: stop the notice listener and drain the subscriber queues.
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::config::ClientConfig;
use super::dispatcher::{DispatchMode, Dispatched, Dispatcher};
use crate::builder::{CaptureOptions, EventBuilder};
use crate::context::ContextStore;
use crate::error::{CaptureError, RuntimeError};
use crate::notices::{Bus, Notice, NoticeKind};
use crate::protocol::{Event, Level};
use crate::subscribers::SubscriberSet;
use crate::transport::Dsn;

/// Hook run on every built event before dispatch; `None` drops the event.
pub type BeforeSend = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// Message of the event sent by [`Client::send_test_event`].
pub const TEST_EVENT_MESSAGE: &str = "Testing sending Sentry event";

/// Why an event was built but not handed to a sender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotSentReason {
    /// No DSN configured.
    NoDsn,
    /// Dropped by `sample_rate`.
    Unsampled,
    /// `before_send` returned `None`.
    Filtered,
}

impl NotSentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotSentReason::NoDsn => "no_dsn",
            NotSentReason::Unsampled => "unsampled",
            NotSentReason::Filtered => "filtered",
        }
    }
}

impl fmt::Display for NotSentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a capture call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureResult {
    /// Handed to a sender; the delivery outcome arrives as a notice.
    Queued { event_id: String },
    /// Delivered (synchronous capture).
    Sent { event_id: String, remote_id: String },
    /// Built but intentionally not sent.
    NotSent {
        event_id: String,
        reason: NotSentReason,
    },
}

impl CaptureResult {
    pub fn event_id(&self) -> &str {
        match self {
            CaptureResult::Queued { event_id }
            | CaptureResult::Sent { event_id, .. }
            | CaptureResult::NotSent { event_id, .. } => event_id,
        }
    }
}

/// What [`Client::send_test_event`] reports back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestEventReport {
    /// Effective client settings (`host`, `public_key`, `project_id`,
    /// `environment`, `release`, `server_name`); absent values are omitted.
    pub settings: BTreeMap<&'static str, String>,
    pub outcome: CaptureResult,
}

/// Whether sampling and `before_send` apply to a submission.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Filters {
    Apply,
    Bypass,
}

/// Error-reporting client. Build it with [`ClientBuilder`](crate::ClientBuilder).
pub struct Client {
    cfg: ClientConfig,
    dsn: Option<Arc<Dsn>>,
    builder: EventBuilder,
    context: ContextStore,
    dispatcher: Option<Dispatcher>,
    bus: Bus,
    before_send: Option<BeforeSend>,

    drain: CancellationToken,
    cancel: CancellationToken,
    senders: Mutex<Option<JoinSet<()>>>,

    listener_stop: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Wiring handed over by the builder.
pub(crate) struct ClientParts {
    pub cfg: ClientConfig,
    pub dsn: Option<Arc<Dsn>>,
    pub builder: EventBuilder,
    pub dispatcher: Option<Dispatcher>,
    pub bus: Bus,
    pub before_send: Option<BeforeSend>,
    pub drain: CancellationToken,
    pub cancel: CancellationToken,
    pub senders: Option<JoinSet<()>>,
    pub listener_stop: CancellationToken,
    pub listener: JoinHandle<()>,
}

impl Client {
    pub(crate) fn from_parts(parts: ClientParts) -> Self {
        Self {
            context: ContextStore::new(parts.cfg.max_breadcrumbs),
            cfg: parts.cfg,
            dsn: parts.dsn,
            builder: parts.builder,
            dispatcher: parts.dispatcher,
            bus: parts.bus,
            before_send: parts.before_send,
            drain: parts.drain,
            cancel: parts.cancel,
            senders: Mutex::new(parts.senders),
            listener_stop: parts.listener_stop,
            listener: Mutex::new(Some(parts.listener)),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    /// Root context scope. Use [`ContextStore::fork`] for per-request scopes.
    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    /// True when a DSN is configured and events can leave the process.
    pub fn is_enabled(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Subscribes to delivery notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.bus.subscribe()
    }

    /// Captures with the root context and returns once a sender accepted the event.
    pub async fn capture(&self, opts: CaptureOptions) -> Result<CaptureResult, CaptureError> {
        self.capture_with(opts, &self.context).await
    }

    /// Captures with an explicit context scope.
    pub async fn capture_with(
        &self,
        opts: CaptureOptions,
        ctx: &ContextStore,
    ) -> Result<CaptureResult, CaptureError> {
        self.submit(opts, ctx, DispatchMode::Async, Filters::Apply)
            .await
    }

    /// Captures an error value as the event's exception.
    pub async fn capture_exception<E>(&self, err: E) -> Result<CaptureResult, CaptureError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.capture(CaptureOptions::exception(err)).await
    }

    /// Captures a plain message.
    pub async fn capture_message(
        &self,
        message: impl Into<String>,
    ) -> Result<CaptureResult, CaptureError> {
        self.capture(CaptureOptions::message(message)).await
    }

    /// Captures and waits for the delivery outcome.
    ///
    /// ### Errors
    /// [`CaptureError::Delivery`] when every attempt failed.
    pub async fn send_event(
        &self,
        opts: CaptureOptions,
        ctx: &ContextStore,
    ) -> Result<CaptureResult, CaptureError> {
        self.submit(opts, ctx, DispatchMode::Sync, Filters::Apply)
            .await
    }

    /// Sends an `info` message event synchronously, ignoring sampling and
    /// `before_send`, and reports the effective settings alongside the outcome.
    pub async fn send_test_event(&self) -> Result<TestEventReport, CaptureError> {
        let opts = CaptureOptions::message(TEST_EVENT_MESSAGE).with_level(Level::Info);
        let scope = ContextStore::new(self.cfg.max_breadcrumbs);
        let outcome = self
            .submit(opts, &scope, DispatchMode::Sync, Filters::Bypass)
            .await?;

        Ok(TestEventReport {
            settings: self.settings(),
            outcome,
        })
    }

    /// Stops accepting events and waits up to `grace` for queued deliveries.
    ///
    /// ### Errors
    /// [`RuntimeError::GraceExceeded`] naming the senders still busy when the
    /// grace period ran out; their deliveries end with `Cancelled`.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.bus.publish(Notice::new(NoticeKind::ShutdownRequested));
        if let Some(d) = &self.dispatcher {
            d.close();
        }
        self.drain.cancel();

        let senders = self.senders.lock().take();
        let result = match senders {
            Some(mut set) => self.wait_all_with_grace(&mut set, grace).await,
            None => Ok(()),
        };

        self.stop_listener().await;
        result
    }

    async fn submit(
        &self,
        opts: CaptureOptions,
        ctx: &ContextStore,
        mode: DispatchMode,
        filters: Filters,
    ) -> Result<CaptureResult, CaptureError> {
        let event = self.builder.build(opts, &ctx.snapshot())?;
        let event_id = event.event_id.clone();

        let Some(dispatcher) = &self.dispatcher else {
            return Ok(self.not_sent(event_id, NotSentReason::NoDsn));
        };

        let event = if filters == Filters::Apply {
            if !self.sampled() {
                return Ok(self.not_sent(event_id, NotSentReason::Unsampled));
            }
            match &self.before_send {
                Some(hook) => match hook(event) {
                    Some(event) => event,
                    None => return Ok(self.not_sent(event_id, NotSentReason::Filtered)),
                },
                None => event,
            }
        } else {
            event
        };

        match dispatcher.dispatch(Arc::new(event), mode).await {
            Ok(Dispatched::Queued(event_id)) => Ok(CaptureResult::Queued { event_id }),
            Ok(Dispatched::Pending(done)) => {
                let event_id = done.event_id().to_string();
                let remote_id = done.wait().await?;
                Ok(CaptureResult::Sent {
                    event_id,
                    remote_id,
                })
            }
            Err(e) => {
                self.bus.publish(
                    Notice::new(NoticeKind::DispatchRejected)
                        .with_event_id(event_id)
                        .with_reason(e.as_label()),
                );
                Err(e.into())
            }
        }
    }

    fn sampled(&self) -> bool {
        let rate = self.cfg.sample_rate;
        rate >= 1.0 || rand::rng().random::<f64>() < rate
    }

    fn not_sent(&self, event_id: String, reason: NotSentReason) -> CaptureResult {
        self.bus.publish(
            Notice::new(NoticeKind::EventDropped)
                .with_event_id(event_id.as_str())
                .with_reason(reason.as_str()),
        );
        CaptureResult::NotSent { event_id, reason }
    }

    fn settings(&self) -> BTreeMap<&'static str, String> {
        let mut s = BTreeMap::new();
        if let Some(dsn) = &self.dsn {
            s.insert("host", dsn.host().to_string());
            s.insert("public_key", dsn.public_key().to_string());
            s.insert("project_id", dsn.project_id().to_string());
        }
        let optional = [
            ("environment", &self.cfg.environment),
            ("release", &self.cfg.release),
            ("server_name", &self.cfg.server_name),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                s.insert(key, v.clone());
            }
        }
        s
    }

    /// Waits for all senders within `grace`; on timeout cancels them.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<()>,
        grace: Duration,
    ) -> Result<(), RuntimeError> {
        let done = async { while set.join_next().await.is_some() {} };
        let timed = time::timeout(grace, done).await;

        match timed {
            Ok(()) => {
                self.bus.publish(Notice::new(NoticeKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self
                    .dispatcher
                    .as_ref()
                    .map(Dispatcher::busy_senders)
                    .unwrap_or_default();
                self.bus.publish(
                    Notice::new(NoticeKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                self.cancel.cancel();
                while set.join_next().await.is_some() {}
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    async fn stop_listener(&self) {
        self.listener_stop.cancel();
        let handle = self.listener.lock().take();
        if let Some(h) = handle {
            let _ = h.await;
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.drain.cancel();
        self.listener_stop.cancel();
    }
}

/// Forwards bus notices to the subscriber set until `stop` fires, then drains
/// what is already buffered and waits for the subscriber workers.
pub(crate) fn spawn_listener(
    mut rx: broadcast::Receiver<Notice>,
    set: SubscriberSet,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(notice) => set.emit(Arc::new(notice)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        while let Ok(notice) = rx.try_recv() {
            set.emit(Arc::new(notice));
        }
        set.shutdown().await;
    })
}
