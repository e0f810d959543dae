//! Random extra wait added to non-failure delays.

use std::time::Duration;

use rand::Rng;

/// Source of jitter in `[0, max)`.
pub trait Jitter: Send {
    fn sample(&mut self, max: Duration) -> Duration;
}

/// Uniform jitter at millisecond resolution.
#[derive(Debug, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn sample(&mut self, max: Duration) -> Duration {
        let max_ms = max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

/// Always the same jitter, clamped below `max`.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub Duration);

impl Jitter for FixedJitter {
    fn sample(&mut self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        self.0.min(max.saturating_sub(Duration::from_millis(1)))
    }
}
