//! # Demo: capture_with_context
//!
//! Shows how request-scoped context flows into captured events:
//! - the root [`ContextStore`] holds process-wide tags;
//! - each "request" forks its own scope, adds user/request data and breadcrumbs;
//! - a failure is captured with a stacktrace and the request scope.
//!
//! Without `FAULTCAST_DSN` the events are built and dropped with `no_dsn`; the
//! printed JSON shows what would have been sent.
//!
//! ## Run
//! ```bash
//! cargo run --example capture_with_context
//! ```

use std::{sync::Arc, time::Duration};

use faultcast::{
    Breadcrumb, CaptureOptions, ClientBuilder, ClientConfig, ContextStore, EventBuilder, Level,
    ProcessInfo, RawFrame, Subscribe,
};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

#[derive(Debug, thiserror::Error)]
#[error("order {0} not found")]
struct OrderNotFound(u64);

fn handle_request(scope: &ContextStore, order: u64) -> Result<(), OrderNotFound> {
    scope.add_breadcrumb(
        Breadcrumb::new(format!("loading order {order}"))
            .with_category("db")
            .with_level(Level::Debug),
    );
    Err(OrderNotFound(order))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("faultcast=debug")),
        )
        .init();

    let mut cfg = ClientConfig::from_env()?;
    cfg.in_app_module_allow_list = vec!["shop".into()];
    cfg.release.get_or_insert_with(|| "shop@1.4.2".into());

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(faultcast::LogWriter::new())];
    let client = ClientBuilder::new(cfg.clone())
        .with_subscribers(subs)
        .with_modules([("serde", "1.0"), ("tokio", "1.47")])
        .build()?;

    client
        .context()
        .set_tags_context(object(json!({ "region": "eu-west-1" })));

    for (user_id, order) in [(7, 1001_u64), (9, 2002)] {
        let scope = client.context().fork();
        scope.set_user_context(object(json!({ "id": user_id })));
        scope.set_request_context(object(json!({
            "url": format!("https://shop.example.com/orders/{order}"),
            "method": "GET",
        })))?;

        let Err(err) = handle_request(&scope, order) else {
            continue;
        };

        let frames = vec![
            RawFrame::qualified("shop::orders", "load", 1).at("src/orders.rs", 42),
            RawFrame::qualified("shop::http", "handle", 2).at("src/http.rs", 18),
            RawFrame::qualified("hyper::server", "serve", 3),
        ];
        let opts = CaptureOptions::exception(err)
            .with_stacktrace(frames)
            .with_tag("order", order);

        // Preview the payload with the same inputs the client uses.
        let process = Arc::new(ProcessInfo::collect(false, Vec::<(String, String)>::new()));
        let preview = EventBuilder::new(&cfg, process).build(opts.clone(), &scope.snapshot())?;
        println!("{}", serde_json::to_string_pretty(&preview.to_payload()?)?);

        let result = client.capture_with(opts, &scope).await?;
        println!("captured {} → {result:?}", result.event_id());
    }

    client.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
