//! # Jitter for retry intervals.
//!
//! [`JitterPolicy`] randomizes the wait between delivery attempts so that many
//! senders failing against the same endpoint do not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: the configured interval, unchanged
//! - [`JitterPolicy::Full`]: random in `[0, interval]`
//! - [`JitterPolicy::Equal`]: `interval/2 + random[0, interval/2]`
//! - [`JitterPolicy::Decorrelated`]: random in `[floor, prev * 3]`, capped

use rand::Rng;
use std::time::Duration;

/// Randomization applied to a retry interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact intervals. Predictable; the default, and what tests rely on.
    #[default]
    None,

    /// Random delay in `[0, interval]`.
    Full,

    /// `interval/2 + random[0, interval/2]`; keeps about 75% of the interval on average.
    Equal,

    /// Random delay in `[floor, prev * 3]`, capped at `max`.
    ///
    /// Needs context, see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns the input unchanged here; it needs
    /// [`apply_decorrelated`](Self::apply_decorrelated).
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => full(delay),
            JitterPolicy::Equal => equal(delay),
        }
    }

    /// Decorrelated jitter with its context; other policies fall back to `apply(prev)`.
    pub fn apply_decorrelated(&self, floor: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let floor_ms = floor.as_millis() as u64;
        let upper = (prev.as_millis() as u64)
            .saturating_mul(3)
            .min(max.as_millis() as u64)
            .max(floor_ms);

        if floor_ms >= upper {
            return floor;
        }
        Duration::from_millis(rand::rng().random_range(floor_ms..=upper))
    }
}

fn full(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

fn equal(delay: Duration) -> Duration {
    let half = delay.as_millis() as u64 / 2;
    if half == 0 {
        return delay;
    }
    Duration::from_millis(half + rand::rng().random_range(0..=half))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn full_stays_within_interval() {
        let d = Duration::from_secs(2);
        for _ in 0..100 {
            assert!(JitterPolicy::Full.apply(d) <= d);
        }
    }

    #[test]
    fn equal_keeps_at_least_half() {
        let d = Duration::from_secs(2);
        for _ in 0..100 {
            let j = JitterPolicy::Equal.apply(d);
            assert!(j >= Duration::from_secs(1) && j <= d, "{j:?}");
        }
    }

    #[test]
    fn decorrelated_respects_floor_and_cap() {
        let floor = Duration::from_millis(100);
        let max = Duration::from_secs(5);
        for _ in 0..100 {
            let j = JitterPolicy::Decorrelated.apply_decorrelated(floor, Duration::from_secs(4), max);
            assert!(j >= floor && j <= max, "{j:?}");
        }
    }

    #[test]
    fn zero_delay_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
