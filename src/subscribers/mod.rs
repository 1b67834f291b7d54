//! # Notice subscribers.
//!
//! ```text
//! Sender ── publish(Notice) ──► Bus ──► notice listener ──► SubscriberSet
//!                                                              │
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter   custom #1  custom #2
//! ```
//!
//! Delivery outcomes of asynchronous captures are only reported here, so at
//! least one subscriber (the `LogWriter` by default) should be installed.

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
