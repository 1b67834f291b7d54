//! # Exponential interval generator.
//!
//! [`BackoffPolicy`] produces the interval list of a
//! [`RetryPolicy`](crate::RetryPolicy) from three knobs instead of spelling
//! every interval out:
//! - [`BackoffPolicy::first`]: the first interval;
//! - [`BackoffPolicy::factor`]: multiplicative growth per retry;
//! - [`BackoffPolicy::max`]: cap for any single interval.
//!
//! Interval `n` is `first × factor^n`, clamped to `max`. Jitter is not applied
//! here; the retry policy applies it when a wait is actually scheduled.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use faultcast::BackoffPolicy;
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(1),
//!     max: Duration::from_secs(5),
//!     factor: 2.0,
//! };
//!
//! assert_eq!(
//!     backoff.intervals(4),
//!     vec![
//!         Duration::from_secs(1),
//!         Duration::from_secs(2),
//!         Duration::from_secs(4),
//!         Duration::from_secs(5),
//!     ]
//! );
//! ```

use std::time::Duration;

/// Exponential interval generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// First interval.
    pub first: Duration,
    /// Cap for any single interval.
    pub max: Duration,
    /// Growth factor (`>= 1.0` recommended).
    pub factor: f64,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 8s`: the default `1s/2s/4s/8s` schedule.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(8),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Interval before retry `attempt` (0-indexed).
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// The first `retries` intervals.
    pub fn intervals(&self, retries: u32) -> Vec<Duration> {
        (0..retries).map(|n| self.next(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let secs: Vec<_> = BackoffPolicy::default()
            .intervals(4)
            .into_iter()
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(secs, vec![1, 2, 4, 8]);
    }

    #[test]
    fn constant_factor_repeats_first() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 1.0,
        };
        assert!(
            policy
                .intervals(10)
                .iter()
                .all(|d| *d == Duration::from_millis(500))
        );
    }

    #[test]
    fn first_above_max_is_clamped() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next(u32::MAX), policy.max);
    }

    #[test]
    fn zero_retries_is_empty() {
        assert!(BackoffPolicy::default().intervals(0).is_empty());
    }
}
