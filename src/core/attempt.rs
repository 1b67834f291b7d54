//! # One delivery attempt.
//!
//! Frames the event, sends it once through the [`Transport`] and classifies the
//! answer. The caller (the sender actor) owns retries and cancellation.
//!
//! ```text
//! encode envelope ──► transport.send (bounded by request_timeout)
//!                          │
//!      2xx + {"id": "…"} ──┼──► Ok(remote_id)
//!      2xx, other body  ───┼──► MalformedResponse   ─┐
//!      non-2xx ────────────┼──► Status{status,body}  ├──► publish DeliveryFailed
//!      connect / timeout ──┴──► Transport(..)       ─┘
//! ```
//!
//! ## Rules
//! - Publishes `DeliveryFailed` for every failed attempt, nothing on success.
//! - `Retry-After` is only honored on `429`.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::time;

use crate::error::{DeliveryError, TransportError};
use crate::notices::{Bus, Notice, NoticeKind};
use crate::protocol::{Event, Sdk};
use crate::transport::{
    Dsn, ENVELOPE_CONTENT_TYPE, Transport, TransportRequest, TransportResponse, encode,
};

const TOO_MANY_REQUESTS: u16 = 429;

/// Result of one attempt plus the endpoint's wait hint.
#[derive(Debug)]
pub(crate) struct AttemptOutcome {
    pub result: Result<String, DeliveryError>,
    pub retry_after: Option<Duration>,
}

/// Static inputs shared by every attempt of a sender.
pub(crate) struct AttemptTarget<'a> {
    pub transport: &'a dyn Transport,
    pub dsn: &'a Dsn,
    pub sdk: &'a Sdk,
    pub request_timeout: Duration,
}

pub(crate) async fn run_attempt(
    target: &AttemptTarget<'_>,
    event: &Event,
    sender: &str,
    attempt: u32,
    bus: &Bus,
) -> AttemptOutcome {
    let outcome = send_once(target, event).await;

    if let Err(e) = &outcome.result {
        let mut notice = Notice::new(NoticeKind::DeliveryFailed)
            .with_event_id(event.event_id.as_str())
            .with_sender(sender)
            .with_attempt(attempt)
            .with_reason(e.to_string());
        if let DeliveryError::Status { status, .. } = e {
            notice = notice.with_status(*status);
        }
        bus.publish(notice);
    }
    outcome
}

async fn send_once(target: &AttemptTarget<'_>, event: &Event) -> AttemptOutcome {
    let now = Utc::now();
    let body = match encode(event, target.dsn, now) {
        Ok(body) => body,
        Err(e) => {
            return AttemptOutcome {
                result: Err(e),
                retry_after: None,
            };
        }
    };

    let req = TransportRequest {
        url: target.dsn.envelope_url(),
        content_type: ENVELOPE_CONTENT_TYPE,
        headers: vec![("X-Sentry-Auth", target.dsn.auth_header(target.sdk, now))],
        body,
    };

    let response = match time::timeout(target.request_timeout, target.transport.send(req)).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => return failed(e.into()),
        Err(_elapsed) => return failed(TransportError::Timeout.into()),
    };

    let retry_after = response
        .retry_after
        .filter(|_| response.status == TOO_MANY_REQUESTS);
    AttemptOutcome {
        result: interpret(response),
        retry_after,
    }
}

fn failed(error: DeliveryError) -> AttemptOutcome {
    AttemptOutcome {
        result: Err(error),
        retry_after: None,
    }
}

/// Success iff 2xx and a JSON body carrying a string `id`.
fn interpret(resp: TransportResponse) -> Result<String, DeliveryError> {
    if !resp.is_success() {
        return Err(DeliveryError::Status {
            status: resp.status,
            body: resp.body,
        });
    }
    match serde_json::from_str::<Value>(&resp.body) {
        Ok(Value::Object(mut obj)) => match obj.remove("id") {
            Some(Value::String(id)) => Ok(id),
            _ => Err(DeliveryError::MalformedResponse(resp.body)),
        },
        _ => Err(DeliveryError::MalformedResponse(resp.body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::scripted::{ScriptedTransport, ok, status};

    fn response(code: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status: code,
            body: body.into(),
            retry_after: None,
        }
    }

    #[test]
    fn interprets_responses() {
        assert_eq!(interpret(response(200, r#"{"id":"340"}"#)), Ok("340".into()));
        assert!(matches!(
            interpret(response(200, r#"{"id":340}"#)),
            Err(DeliveryError::MalformedResponse(_))
        ));
        assert!(matches!(
            interpret(response(202, "ok")),
            Err(DeliveryError::MalformedResponse(_))
        ));
        assert_eq!(
            interpret(response(500, "boom")),
            Err(DeliveryError::Status {
                status: 500,
                body: "boom".into()
            })
        );
    }

    #[tokio::test]
    async fn sends_envelope_with_auth_header() {
        let transport = ScriptedTransport::new(vec![ok("abc")]);
        let dsn: Dsn = "https://pub@ingest.example.com/9".parse().unwrap();
        let sdk = Sdk::current();
        let target = AttemptTarget {
            transport: transport.as_ref(),
            dsn: &dsn,
            sdk: &sdk,
            request_timeout: Duration::from_secs(5),
        };
        let event = Event::new(sdk.clone());

        let out = run_attempt(&target, &event, "sender-0", 1, &Bus::new(8)).await;
        assert_eq!(out.result, Ok("abc".into()));

        let req = &transport.requests()[0];
        assert_eq!(req.url, "https://ingest.example.com/api/9/envelope/");
        assert_eq!(req.content_type, "application/x-sentry-envelope");
        assert_eq!(req.headers[0].0, "X-Sentry-Auth");
        assert!(req.headers[0].1.contains("sentry_key=pub"));
    }

    #[tokio::test]
    async fn failures_are_published() {
        let transport = ScriptedTransport::new(vec![status(503, "unavailable")]);
        let dsn: Dsn = "https://pub@host/1".parse().unwrap();
        let sdk = Sdk::current();
        let target = AttemptTarget {
            transport: transport.as_ref(),
            dsn: &dsn,
            sdk: &sdk,
            request_timeout: Duration::from_secs(5),
        };
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let event = Event::new(sdk.clone());
        let out = run_attempt(&target, &event, "sender-3", 2, &bus).await;
        assert!(out.result.is_err());

        let n = rx.recv().await.unwrap();
        assert_eq!(n.kind, NoticeKind::DeliveryFailed);
        assert_eq!(n.status, Some(503));
        assert_eq!(n.attempt, Some(2));
        assert_eq!(n.sender.as_deref(), Some("sender-3"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_transport_hits_request_timeout() {
        let transport = ScriptedTransport::slow(vec![ok("late")], Duration::from_secs(60));
        let dsn: Dsn = "https://pub@host/1".parse().unwrap();
        let sdk = Sdk::current();
        let target = AttemptTarget {
            transport: transport.as_ref(),
            dsn: &dsn,
            sdk: &sdk,
            request_timeout: Duration::from_secs(2),
        };

        let out = run_attempt(&target, &Event::new(sdk.clone()), "s", 1, &Bus::new(8)).await;
        assert_eq!(
            out.result,
            Err(DeliveryError::Transport(TransportError::Timeout))
        );
    }

    #[tokio::test]
    async fn retry_after_only_kept_for_429() {
        let limited = Ok(TransportResponse {
            status: 429,
            body: String::new(),
            retry_after: Some(Duration::from_secs(9)),
        });
        let unavailable = Ok(TransportResponse {
            status: 503,
            body: String::new(),
            retry_after: Some(Duration::from_secs(9)),
        });
        let transport = ScriptedTransport::new(vec![limited, unavailable]);
        let dsn: Dsn = "https://pub@host/1".parse().unwrap();
        let sdk = Sdk::current();
        let target = AttemptTarget {
            transport: transport.as_ref(),
            dsn: &dsn,
            sdk: &sdk,
            request_timeout: Duration::from_secs(5),
        };
        let bus = Bus::new(8);
        let event = Event::new(sdk.clone());

        let first = run_attempt(&target, &event, "s", 1, &bus).await;
        assert_eq!(first.retry_after, Some(Duration::from_secs(9)));
        let second = run_attempt(&target, &event, "s", 2, &bus).await;
        assert_eq!(second.retry_after, None);
    }
}
