//! Runtime core: client, sender pool and delivery lifecycle.
//!
//! The public API from this module is [`Client`] (built by [`ClientBuilder`]
//! from a [`ClientConfig`]) plus the [`Dispatcher`] and the delivery state types.
//!
//! Internal modules:
//! - [`attempt`]: one delivery attempt with request timeout and notice publishing;
//! - [`retry`]: the per-delivery state machine;
//! - [`sender`]: a pool member, one delivery at a time with retry and cancellation;
//! - [`dispatcher`]: round-robin routing with backpressure;
//! - [`client`]: capture façade, sampling, `before_send`, graceful shutdown;
//! - [`builder`]: wires everything together.

mod attempt;
mod builder;
mod client;
mod config;
mod dispatcher;
mod retry;
mod sender;

pub use builder::ClientBuilder;
pub use client::{
    BeforeSend, CaptureResult, Client, NotSentReason, TEST_EVENT_MESSAGE, TestEventReport,
};
pub use config::ClientConfig;
pub use dispatcher::{Completion, DispatchMode, Dispatched, Dispatcher};
pub use retry::DeliveryState;
pub use sender::DeliveryResult;
