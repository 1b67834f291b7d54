//! # Outbound transport.
//!
//! Senders never talk HTTP directly; they hand a fully framed
//! [`TransportRequest`] to a [`Transport`] and interpret the
//! [`TransportResponse`]. The backend is picked once, when the client is built.
//!
//! ```text
//! Sender ──► envelope::encode(event, dsn) ──► TransportRequest
//!                                                 │
//!                                     Arc<dyn Transport>::send
//!                                                 │
//!             (status, body, retry_after) ◄───────┘
//! ```
//!
//! ## Contents
//! - [`Dsn`]: endpoint URL and `X-Sentry-Auth` header
//! - [`encode`]: envelope framing
//! - [`HttpTransport`]: the `reqwest` backend

mod dsn;
mod envelope;
mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub use dsn::{Dsn, SENTRY_VERSION};
pub use envelope::{ENVELOPE_CONTENT_TYPE, encode};
pub use http::{HttpTransport, MAX_RETRY_AFTER};

/// One outbound POST.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub url: String,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

/// What came back from the endpoint, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// Parsed `Retry-After`, if the endpoint sent one.
    pub retry_after: Option<Duration>,
}

impl TransportResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability to deliver one request.
///
/// Implementations must be cancel-safe: the sender may drop the future on
/// shutdown or when the delivery deadline elapses.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError>;
}
