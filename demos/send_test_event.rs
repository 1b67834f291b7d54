//! # Demo: send_test_event
//!
//! Sends one `info` test event to the endpoint configured in the environment and
//! prints the effective settings and the outcome.
//!
//! ## Flow
//! ```text
//! ClientConfig::from_env()
//!     └─► ClientBuilder::build()
//!           └─► Client::send_test_event()
//!                 ├─► no DSN        → NotSent(no_dsn)
//!                 ├─► 2xx + {"id"}  → Sent{remote_id}
//!                 └─► failure       → CaptureError::Delivery
//! ```
//!
//! ## Run
//! ```bash
//! FAULTCAST_DSN=https://<key>@<host>/<project> cargo run --example send_test_event
//! ```

use std::{sync::Arc, time::Duration};

use faultcast::{CaptureResult, ClientBuilder, ClientConfig, RetryPolicy, Subscribe};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("faultcast=debug")),
        )
        .init();

    let mut cfg = ClientConfig::from_env()?;
    cfg.retry = RetryPolicy::none();
    cfg.request_timeout = Duration::from_secs(10);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(faultcast::LogWriter::new())];
    let client = ClientBuilder::new(cfg).with_subscribers(subs).build()?;

    println!("Client configuration:");
    let report = client.send_test_event().await?;
    for (key, value) in &report.settings {
        println!("  {key:<12} {value}");
    }

    match &report.outcome {
        CaptureResult::Sent { event_id, remote_id } => {
            println!("Test event {event_id} accepted, remote id {remote_id}");
        }
        CaptureResult::NotSent { reason, .. } => {
            println!("Test event not sent ({reason}); set FAULTCAST_DSN to send it");
        }
        CaptureResult::Queued { event_id } => println!("Test event {event_id} queued"),
    }

    client.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
