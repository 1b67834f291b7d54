//! Delivery policies.
//!
//! Knobs controlling **how long** a sender waits between attempts and **what**
//! the dispatcher does when the pool is full.
//!
//! ## Contents
//! - [`RetryPolicy`]      the explicit list of waits between attempts (+ jitter)
//! - [`BackoffPolicy`]    exponential generator for retry intervals
//! - [`JitterPolicy`]     randomization so senders do not retry in lockstep
//! - [`SaturationPolicy`] fail fast or block (bounded) when every queue is full
//!
//! ## Quick wiring
//! ```text
//! ClientConfig { retry: RetryPolicy, saturation: SaturationPolicy, .. }
//!      ├─► core::sender::Sender uses retry.delay_after(attempt) between attempts
//!      └─► core::dispatcher::Dispatcher uses saturation when all queues are full
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 4 retries: 1s, 2s, 4s, 8s, no jitter.
//! - `SaturationPolicy::FailFast`.

mod backoff;
mod jitter;
mod retry;
mod saturation;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
pub use saturation::SaturationPolicy;
