use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::client::{BeforeSend, Client, ClientParts, spawn_listener};
use super::config::ClientConfig;
use super::dispatcher::Dispatcher;
use super::sender::{Sender, SenderParams};
use crate::builder::EventBuilder;
use crate::error::ConfigError;
use crate::notices::Bus;
use crate::protocol::{Event, ProcessInfo};
use crate::stacktrace::SourceLookup;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::transport::{Dsn, HttpTransport, Transport};

/// Builder for constructing a [`Client`] with optional collaborators.
pub struct ClientBuilder {
    cfg: ClientConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    transport: Option<Arc<dyn Transport>>,
    source: Option<Arc<dyn SourceLookup>>,
    modules: Vec<(String, String)>,
    before_send: Option<BeforeSend>,
}

impl ClientBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ClientConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            transport: None,
            source: None,
            modules: Vec::new(),
            before_send: None,
        }
    }

    /// Sets notice subscribers.
    ///
    /// Subscribers receive delivery notices through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Source lookup used for frame context when `enable_source_code_context` is set.
    pub fn with_source_lookup(mut self, lookup: Arc<dyn SourceLookup>) -> Self {
        self.source = Some(lookup);
        self
    }

    /// Application dependencies (`name`, `version`) reported in `modules`.
    pub fn with_modules<I, K, V>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.modules = modules
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Hook that may rewrite or drop (`None`) each event before it is sent.
    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
    {
        self.before_send = Some(Arc::new(hook));
        self
    }

    /// Builds the client. Must be called inside a tokio runtime.
    ///
    /// Initializes:
    /// - the notice bus and the subscriber workers;
    /// - the process snapshot shared by every event;
    /// - the sender pool, only when a DSN is configured.
    ///
    /// ### Errors
    /// - [`ConfigError::InvalidSampleRate`] / [`ConfigError::InvalidDsn`] for bad settings;
    /// - [`ConfigError::Http`] if the default HTTP client cannot be created.
    pub fn build(self) -> Result<Arc<Client>, ConfigError> {
        let cfg = self.cfg;
        cfg.validate()?;

        let dsn = cfg
            .dsn
            .as_deref()
            .map(str::parse::<Dsn>)
            .transpose()?
            .map(Arc::new);
        let transport: Option<Arc<dyn Transport>> = match (&dsn, self.transport) {
            (None, _) => None,
            (Some(_), Some(t)) => Some(t),
            (Some(_), None) => {
                let http: Arc<dyn Transport> = Arc::new(HttpTransport::new(cfg.request_timeout)?);
                Some(http)
            }
        };

        let process = Arc::new(ProcessInfo::collect(cfg.report_dependencies, self.modules));
        let mut builder = EventBuilder::new(&cfg, Arc::clone(&process));
        if let Some(lookup) = self.source {
            builder = builder.with_source_lookup(lookup);
        }

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let listener_stop = CancellationToken::new();
        let listener = spawn_listener(bus.subscribe(), subs, listener_stop.clone());

        let drain = CancellationToken::new();
        let cancel = CancellationToken::new();

        let (dispatcher, senders) = match (&dsn, transport) {
            (Some(dsn), Some(transport)) => {
                let params = SenderParams {
                    transport,
                    dsn: Arc::clone(dsn),
                    sdk: process.sdk.clone(),
                    retry: cfg.retry.clone(),
                    request_timeout: cfg.request_timeout,
                    deadline: cfg.deadline(),
                };
                let space = Arc::new(Notify::new());

                let mut set = JoinSet::new();
                let mut handles = Vec::with_capacity(cfg.concurrency());
                for index in 0..cfg.concurrency() {
                    let (sender, handle) = Sender::new(
                        index,
                        cfg.queue_capacity(),
                        params.clone(),
                        bus.clone(),
                        Arc::clone(&space),
                    );
                    set.spawn(sender.run(drain.clone(), cancel.clone()));
                    handles.push(handle);
                }
                tracing::debug!(
                    target: "faultcast",
                    senders = handles.len(),
                    host = dsn.host(),
                    "sender pool started"
                );
                (
                    Some(Dispatcher::new(handles, cfg.saturation, space)),
                    Some(set),
                )
            }
            _ => {
                tracing::debug!(target: "faultcast", "no dsn configured; events will not be sent");
                (None, None)
            }
        };

        Ok(Arc::new(Client::from_parts(ClientParts {
            cfg,
            dsn,
            builder,
            dispatcher,
            bus,
            before_send: self.before_send,
            drain,
            cancel,
            senders,
            listener_stop,
            listener,
        })))
    }
}
