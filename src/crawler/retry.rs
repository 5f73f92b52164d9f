//! Backoff schedule and sleep seam
//!
//! The fetcher and the coordinator never call `tokio::time::sleep` directly;
//! they go through a [`Pause`] so the delays can be observed in tests.

use crate::config::FetchConfig;
use rand::Rng;
use std::future::Future;
#[cfg(test)]
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Something that can wait for a given duration
pub trait Pause {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested pauses and returns immediately
///
/// Clones share the same log.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingPause {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

#[cfg(test)]
impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .map(|pauses| pauses.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
    }
}

/// Exponential backoff with additive uniform jitter
///
/// The delay after failed attempt `n` (1-based) is
/// `base_delay * 2^(n-1) + U[0, jitter_max]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, never below 1
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, jitter_max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            jitter_max,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_backoff_ms),
            Duration::from_millis(config.jitter_max_ms),
        )
    }

    /// Backoff before jitter for the retry following `attempt`
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Full delay (backoff plus fresh jitter) for the retry following `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay_for(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1), Duration::ZERO);

        assert_eq!(policy.base_delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.base_delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.base_delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.base_delay_for(4), Duration::from_secs(8));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_millis(500));

        for _ in 0..200 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_delays_strictly_increase_when_jitter_below_base() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Duration::from_millis(99));

        for _ in 0..100 {
            let first = policy.delay_for(1);
            let second = policy.delay_for(2);
            let third = policy.delay_for(3);
            assert!(first < second);
            assert!(second < third);
        }
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10), Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::ZERO);
        assert_eq!(policy.base_delay_for(200), Duration::from_secs(1) * u32::MAX);
    }

    #[test]
    fn test_default_matches_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.jitter_max, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_recording_pause_shares_log_between_clones() {
        let pause = RecordingPause::new();
        let handle = pause.clone();

        pause.pause(Duration::from_millis(5)).await;
        pause.pause(Duration::from_millis(7)).await;

        assert_eq!(
            handle.recorded(),
            vec![Duration::from_millis(5), Duration::from_millis(7)]
        );
    }
}
