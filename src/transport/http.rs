use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};

use super::{Transport, TransportRequest, TransportResponse};
use crate::error::{ConfigError, TransportError};

/// Response bodies longer than this are cut before being kept in errors.
const MAX_BODY: usize = 4096;

/// Upper bound on a server-provided `Retry-After`.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// [`Transport`] over `reqwest` with rustls.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose every request times out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client (proxies, custom roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .post(&req.url)
            .header(CONTENT_TYPE, req.content_type);
        for (name, value) in &req.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.body(req.body).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let retry_after = retry_after(response.headers());
        let mut body = response.text().await.map_err(classify)?;
        if body.len() > MAX_BODY {
            let mut cut = MAX_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        Ok(TransportResponse {
            status,
            body,
            retry_after,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

/// `Retry-After` in delta-seconds form, capped at [`MAX_RETRY_AFTER`].
/// HTTP dates, negative and non-finite values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    if secs >= MAX_RETRY_AFTER.as_secs_f64() {
        return Some(MAX_RETRY_AFTER);
    }
    Duration::try_from_secs_f64(secs).ok()
}
