//! Error types used by the faultcast client.
//!
//! The taxonomy follows where an error is raised and who sees it:
//!
//! - [`BuildError`]: caller-contract violations detected while building an event.
//!   Raised synchronously, never sent anywhere.
//! - [`TransportError`]: a single network exchange failed below HTTP semantics.
//! - [`DeliveryError`]: a delivery attempt (or the whole delivery) failed.
//! - [`DispatchError`]: the sender pool refused the event.
//! - [`ConfigError`]: the client could not be built from its configuration.
//! - [`CaptureError`]: umbrella returned by the `Client::capture*` family.
//! - [`RuntimeError`]: shutdown did not complete within its grace period.
//!
//! Every enum provides `as_label` (stable snake_case) for logs.

use std::time::Duration;
use thiserror::Error;

/// # Caller-contract violations raised by the event builder.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A stacktrace was supplied without an exception or a message to attach it to.
    #[error("stacktrace given without an exception or a message")]
    StacktraceWithoutSubject,

    /// A request map contained a key outside the known request fields.
    #[error("unknown request field: {0:?}")]
    UnknownRequestField(String),
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use faultcast::BuildError;
    ///
    /// let err = BuildError::UnknownRequestField("body".into());
    /// assert_eq!(err.as_label(), "build_unknown_request_field");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::StacktraceWithoutSubject => "build_stacktrace_without_subject",
            BuildError::UnknownRequestField(_) => "build_unknown_request_field",
        }
    }
}

/// # Connection-level failures reported by a [`Transport`](crate::Transport).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not reach the endpoint (DNS, TCP, TLS).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The endpoint did not answer within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// Any other client-side failure (body read, redirect loop, ...).
    #[error("transport failure: {0}")]
    Other(String),
}

/// # Delivery failures.
///
/// Per-attempt variants (`Transport`, `Status`, `MalformedResponse`) are retried by
/// the sender according to its [`RetryPolicy`](crate::RetryPolicy). Terminal
/// variants end the delivery.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Connection-level fault.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// A 2xx answer whose body did not carry a string `id`.
    #[error("malformed success response: {0}")]
    MalformedResponse(String),

    /// The event could not be serialized into a payload.
    #[error("payload serialization failed: {0}")]
    Serialize(String),

    /// Every configured attempt failed.
    #[error("delivery failed after {attempts} attempt(s): {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error of the last attempt.
        last: Box<DeliveryError>,
    },

    /// The client shut down while the delivery was in flight.
    #[error("delivery cancelled by shutdown")]
    Cancelled,

    /// The per-event delivery deadline elapsed.
    #[error("delivery deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use faultcast::DeliveryError;
    ///
    /// let err = DeliveryError::Status { status: 500, body: String::new() };
    /// assert_eq!(err.as_label(), "delivery_status");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Transport(_) => "delivery_transport",
            DeliveryError::Status { .. } => "delivery_status",
            DeliveryError::MalformedResponse(_) => "delivery_malformed_response",
            DeliveryError::Serialize(_) => "delivery_serialize",
            DeliveryError::Exhausted { .. } => "delivery_exhausted",
            DeliveryError::Cancelled => "delivery_cancelled",
            DeliveryError::DeadlineExceeded(_) => "delivery_deadline_exceeded",
        }
    }

    /// Indicates whether a single failed attempt may be retried.
    ///
    /// Returns `true` for `Transport`, `Status` and `MalformedResponse`.
    ///
    /// # Example
    /// ```
    /// use faultcast::DeliveryError;
    ///
    /// assert!(DeliveryError::Status { status: 503, body: String::new() }.is_retryable());
    /// assert!(!DeliveryError::Cancelled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Transport(_)
                | DeliveryError::Status { .. }
                | DeliveryError::MalformedResponse(_)
        )
    }
}

/// # Errors returned when the sender pool refuses an event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Every sender queue is full (fail-fast, or the blocking wait timed out).
    #[error("sender pool saturated")]
    Saturated,

    /// The pool is shut down.
    #[error("sender pool closed")]
    Closed,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Saturated => "dispatch_saturated",
            DispatchError::Closed => "dispatch_closed",
        }
    }
}

/// # Errors raised while building a client.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The DSN could not be parsed.
    #[error("invalid dsn: {0}")]
    InvalidDsn(String),

    /// `sample_rate` outside `0.0..=1.0`.
    #[error("sample rate must be within 0.0..=1.0, got {0}")]
    InvalidSampleRate(f64),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Http(String),

    /// An environment variable held a value that does not parse.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidDsn(_) => "config_invalid_dsn",
            ConfigError::InvalidSampleRate(_) => "config_invalid_sample_rate",
            ConfigError::Http(_) => "config_http",
            ConfigError::InvalidEnv { .. } => "config_invalid_env",
        }
    }
}

/// # Errors surfaced by the capture API.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The event could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The sender pool refused the event.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Synchronous delivery failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl CaptureError {
    /// Returns the label of the wrapped error.
    pub fn as_label(&self) -> &'static str {
        match self {
            CaptureError::Build(e) => e.as_label(),
            CaptureError::Dispatch(e) => e.as_label(),
            CaptureError::Delivery(e) => e.as_label(),
        }
    }
}

/// # Errors produced by the client runtime itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; in-flight deliveries were abandoned.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Senders that were still busy.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use faultcast::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
