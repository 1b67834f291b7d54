//! # Retry schedule for event delivery.
//!
//! A [`RetryPolicy`] is an explicit list of waits between attempts. With `n`
//! intervals a delivery makes at most `n + 1` attempts; an empty list means
//! exactly one attempt.
//!
//! ```text
//! attempt 1 ──fail──► wait intervals[0] ──► attempt 2 ──fail──► wait intervals[1] ──► ...
//!                                                            (list exhausted) ──► Exhausted
//! ```

use std::time::Duration;

use super::{BackoffPolicy, JitterPolicy};

/// Waits between delivery attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Base wait before each retry, in order.
    pub intervals: Vec<Duration>,
    /// Randomization applied to every wait.
    pub jitter: JitterPolicy,
}

impl Default for RetryPolicy {
    /// Four retries: `1s, 2s, 4s, 8s`, no jitter.
    fn default() -> Self {
        Self::from_backoff(BackoffPolicy::default(), 4)
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::fixed(Vec::new())
    }

    /// Exact intervals, no jitter.
    pub fn fixed(intervals: impl Into<Vec<Duration>>) -> Self {
        Self {
            intervals: intervals.into(),
            jitter: JitterPolicy::None,
        }
    }

    /// `retries` intervals generated by `backoff`.
    pub fn from_backoff(backoff: BackoffPolicy, retries: u32) -> Self {
        Self::fixed(backoff.intervals(retries))
    }

    #[inline]
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Upper bound on attempts per delivery.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.intervals.len() as u32 + 1
    }

    /// Jittered wait after failed attempt `attempt` (1-based), or `None` once
    /// the schedule is exhausted.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        let idx = (attempt as usize).checked_sub(1)?;
        let base = *self.intervals.get(idx)?;

        Some(match self.jitter {
            JitterPolicy::Decorrelated => {
                let floor = self.intervals.first().copied().unwrap_or(base);
                let max = self.intervals.iter().max().copied().unwrap_or(base);
                self.jitter.apply_decorrelated(floor.min(max), base, max)
            }
            jitter => jitter.apply(base),
        })
    }
}
