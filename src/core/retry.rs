//! # Delivery state machine.
//!
//! One delivery walks through explicit states; the sender actor performs the
//! side effects (attempt, sleep) and feeds the outcome back in.
//!
//! ```text
//! Idle ──start──► Sending{1}
//!
//! Sending{n} ──ok(id)───────────────────────────────► Succeeded{n, id}
//!            ──err, retryable, schedule has wait d──► Retrying{n, d} ──resume──► Sending{n+1}
//!            ──err, schedule exhausted──────────────► Exhausted(Exhausted{n, err})
//!            ──err, not retryable───────────────────► Exhausted(err)
//! ```
//!
//! ## Rules
//! - A `Retry-After` hint only ever lengthens the wait.
//! - With an empty schedule, the first failure is terminal.

use std::time::Duration;

use crate::error::DeliveryError;
use crate::policies::RetryPolicy;

/// State of one event's delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryState {
    Idle,
    /// Attempt `attempt` (1-based) is in flight.
    Sending { attempt: u32 },
    /// Attempt `attempt` failed; the next starts after `delay`.
    Retrying { attempt: u32, delay: Duration },
    Succeeded { attempts: u32, remote_id: String },
    Exhausted { attempts: u32, error: DeliveryError },
}

impl DeliveryState {
    /// `Idle → Sending{1}`.
    pub fn start() -> Self {
        DeliveryState::Sending { attempt: 1 }
    }

    /// Feeds the outcome of the in-flight attempt.
    ///
    /// Only meaningful in `Sending`; other states are returned unchanged.
    pub fn on_outcome(
        self,
        outcome: Result<String, DeliveryError>,
        retry_after: Option<Duration>,
        policy: &RetryPolicy,
    ) -> Self {
        let DeliveryState::Sending { attempt } = self else {
            return self;
        };

        let error = match outcome {
            Ok(remote_id) => {
                return DeliveryState::Succeeded {
                    attempts: attempt,
                    remote_id,
                };
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            return DeliveryState::Exhausted {
                attempts: attempt,
                error,
            };
        }

        match policy.delay_after(attempt) {
            Some(delay) => DeliveryState::Retrying {
                attempt,
                delay: retry_after.map_or(delay, |hint| delay.max(hint)),
            },
            None => DeliveryState::Exhausted {
                attempts: attempt,
                error: DeliveryError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                },
            },
        }
    }

    /// `Retrying{n, _} → Sending{n+1}`; other states are returned unchanged.
    pub fn resume(self) -> Self {
        match self {
            DeliveryState::Retrying { attempt, .. } => DeliveryState::Sending {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Succeeded { .. } | DeliveryState::Exhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> DeliveryError {
        DeliveryError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn success_is_terminal() {
        let s = DeliveryState::start().on_outcome(Ok("340".into()), None, &RetryPolicy::none());
        assert_eq!(
            s,
            DeliveryState::Succeeded {
                attempts: 1,
                remote_id: "340".into()
            }
        );
        assert!(s.is_terminal());
    }

    #[test]
    fn empty_schedule_exhausts_after_first_failure() {
        let s = DeliveryState::start().on_outcome(Err(status(500)), None, &RetryPolicy::none());
        match s {
            DeliveryState::Exhausted {
                attempts: 1,
                error: DeliveryError::Exhausted { attempts: 1, last },
            } => assert_eq!(*last, status(500)),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn walks_the_schedule() {
        let policy = RetryPolicy::fixed([Duration::from_secs(1), Duration::from_secs(2)]);

        let s = DeliveryState::start().on_outcome(Err(status(503)), None, &policy);
        assert_eq!(
            s,
            DeliveryState::Retrying {
                attempt: 1,
                delay: Duration::from_secs(1)
            }
        );
        let s = s.resume().on_outcome(Err(status(503)), None, &policy);
        assert_eq!(
            s,
            DeliveryState::Retrying {
                attempt: 2,
                delay: Duration::from_secs(2)
            }
        );
        let s = s.resume();
        assert_eq!(s, DeliveryState::Sending { attempt: 3 });
        let s = s.on_outcome(Err(status(503)), None, &policy);
        assert!(matches!(
            s,
            DeliveryState::Exhausted {
                attempts: 3,
                error: DeliveryError::Exhausted { attempts: 3, .. }
            }
        ));
    }

    #[test]
    fn retry_after_only_lengthens() {
        let policy = RetryPolicy::fixed([Duration::from_secs(4)]);

        let longer = DeliveryState::start().on_outcome(
            Err(status(429)),
            Some(Duration::from_secs(30)),
            &policy,
        );
        assert_eq!(
            longer,
            DeliveryState::Retrying {
                attempt: 1,
                delay: Duration::from_secs(30)
            }
        );

        let shorter = DeliveryState::start().on_outcome(
            Err(status(429)),
            Some(Duration::from_secs(1)),
            &policy,
        );
        assert_eq!(
            shorter,
            DeliveryState::Retrying {
                attempt: 1,
                delay: Duration::from_secs(4)
            }
        );
    }

    #[test]
    fn non_retryable_errors_end_immediately() {
        let policy = RetryPolicy::default();
        let s = DeliveryState::start().on_outcome(
            Err(DeliveryError::Serialize("bad float".into())),
            None,
            &policy,
        );
        assert_eq!(
            s,
            DeliveryState::Exhausted {
                attempts: 1,
                error: DeliveryError::Serialize("bad float".into())
            }
        );
    }
}
