//! # faultcast
//!
//! **faultcast** is an error-reporting client for Rust services.
//!
//! It captures errors and messages together with ambient diagnostic context,
//! normalizes them into a structured [`Event`] and delivers that event to a
//! Sentry-compatible ingestion endpoint through a fixed pool of sender actors,
//! with retry and backpressure, without blocking the caller.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   capture_exception / capture_message / capture / capture_with / send_event
//!                                   │
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Client                                                           │
//! │  - ContextStore (root scope; fork() per request)                  │
//! │  - EventBuilder (config + context + options + Normalizer)         │
//! │  - sampling, before_send                                          │
//! │  - Dispatcher (round-robin, SaturationPolicy)                     │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   sender-0   │   │   sender-1   │   │  sender-N-1  │
//!     │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Transport::send (envelope POST, X-Sentry-Auth)
//!      │
//!      │ Publishes notices:
//!      │ - DeliveryStarting / DeliveryFailed / RetryScheduled
//!      │ - DeliverySucceeded / DeliveryExhausted
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                  Bus (broadcast channel of Notice)                │
//! │               (capacity: ClientConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │    notice listener     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter   custom     custom
//! ```
//!
//! ### Delivery lifecycle
//! ```text
//! Dispatcher ──► sender queue ──► Sender::run()
//!
//! loop {
//!   ├─► publish DeliveryStarting{ event_id, sender, attempt }
//!   ├─► run_attempt(event, request_timeout)
//!   │       │
//!   │       ├─ 2xx + {"id"} ──► publish DeliverySucceeded{ remote_id }, done
//!   │       │
//!   │       └─ failure ──► publish DeliveryFailed{ status, reason }
//!   │                      ├─ not retryable            ─► DeliveryExhausted, done
//!   │                      ├─ RetryPolicy has a wait d:
//!   │                      │     ├─ d = max(d, Retry-After) on 429
//!   │                      │     ├─ publish RetryScheduled{ delay }
//!   │                      │     ├─ sleep(d) (cancellable)
//!   │                      │     └─ continue
//!   │                      └─ schedule exhausted       ─► DeliveryExhausted, done
//!   │
//!   └─ whole delivery bounded by ClientConfig::delivery_deadline (if set)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                              |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------------------|
//! | **Capture**       | Build events from errors, messages and context.                  | [`Client`], [`CaptureOptions`], [`ContextStore`] |
//! | **Stacktraces**   | Normalize raw frames (in-app, source context, argument snapshot). | [`Normalizer`], [`RawFrame`], [`SourceLookup`]  |
//! | **Delivery**      | Sender pool with retry and backpressure.                          | [`RetryPolicy`], [`SaturationPolicy`]           |
//! | **Transport**     | Pluggable outbound transport, reqwest by default.                 | [`Transport`], [`HttpTransport`], [`Dsn`]       |
//! | **Subscriber API**| Observe delivery notices (logging, custom sinks).                 | [`Subscribe`], [`Notice`]                       |
//! | **Errors**        | Typed errors for each stage.                                      | [`CaptureError`], [`DeliveryError`]             |
//! | **Configuration** | Central client settings, environment overlay.                     | [`ClientConfig`]                                |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use faultcast::{CaptureResult, ClientBuilder, ClientConfig, NotSentReason};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // No DSN: events are built and validated but never leave the process.
//!     let cfg = ClientConfig {
//!         environment: Some("dev".into()),
//!         ..ClientConfig::default()
//!     };
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn faultcast::Subscribe>> = vec![Arc::new(faultcast::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn faultcast::Subscribe>> = Vec::new();
//!
//!     let client = ClientBuilder::new(cfg).with_subscribers(subs).build()?;
//!
//!     let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
//!     let result = client.capture_exception(io).await?;
//!     assert!(matches!(
//!         result,
//!         CaptureResult::NotSent { reason: NotSentReason::NoDsn, .. }
//!     ));
//!
//!     client.shutdown(Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```

mod builder;
mod context;
mod core;
mod error;
mod notices;
mod policies;
mod protocol;
mod stacktrace;
mod subscribers;
mod transport;

// ---- Public re-exports ----

pub use builder::{CaptureOptions, EventBuilder, ExceptionInfo, MESSAGE_EXCEPTION_TYPE};
pub use context::{ContextSnapshot, ContextStore};
pub use crate::core::{
    BeforeSend, CaptureResult, Client, ClientBuilder, ClientConfig, Completion, DeliveryResult,
    DeliveryState, DispatchMode, Dispatched, Dispatcher, NotSentReason, TEST_EVENT_MESSAGE,
    TestEventReport,
};
pub use error::{
    BuildError, CaptureError, ConfigError, DeliveryError, DispatchError, RuntimeError,
    TransportError,
};
pub use notices::{Bus, Notice, NoticeKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy, SaturationPolicy};
pub use protocol::{
    Breadcrumb, Event, EventSource, ExceptionValue, Frame, Level, ProcessInfo, REQUEST_FIELDS,
    Request, Sdk, Stacktrace,
};
pub use stacktrace::{
    Arity, Location, MAX_ARG_REPR, Normalizer, RawFrame, SourceCodeMap, SourceContext,
    SourceLookup, culprit,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use transport::{
    Dsn, ENVELOPE_CONTENT_TYPE, HttpTransport, MAX_RETRY_AFTER, SENTRY_VERSION, Transport,
    TransportRequest, TransportResponse, encode,
};

// Built-in tracing subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
