//! Pacing: how long the sweep waits, and how that adapts.
//!
//! - `Pacing`: the four tunables {base delay, max delay, jitter, hard cap}
//! - `SettleDelays`: fixed waits after UI triggers
//! - `BackoffController`: doubles the delay on failure, never decays
//! - `Jitter` / `Clock`: ports for randomness and time so runs are testable

mod backoff;
mod clock;
mod jitter;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use backoff::BackoffController;
pub use clock::{Clock, ManualClock, TokioClock};
pub use jitter::{FixedJitter, Jitter, RandomJitter};

/// Inter-action pacing and the safety cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// Starting delay between two actions
    pub base_delay: Duration,
    /// Ceiling for the escalated delay
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random extra wait after a non-failure
    pub jitter_max: Duration,
    /// Maximum number of items a run may process
    pub hard_cap: u64,
}

impl Pacing {
    pub fn new(base_delay: Duration, max_delay: Duration, jitter_max: Duration, hard_cap: u64) -> Self {
        Self {
            base_delay,
            max_delay,
            jitter_max,
            hard_cap,
        }
    }

    /// Check the invariants the loop relies on.
    pub fn validate(&self) -> crate::Result<()> {
        if self.base_delay.is_zero() {
            return Err(crate::SweepError::Config("base-delay-ms must be > 0".into()));
        }
        if self.max_delay < self.base_delay {
            return Err(crate::SweepError::Config("max-delay-ms must be >= base-delay-ms".into()));
        }
        if self.hard_cap == 0 {
            return Err(crate::SweepError::Config("hard-cap must be > 0".into()));
        }
        Ok(())
    }
}

/// Fixed waits inserted after UI triggers so asynchronous rendering catches up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleDelays {
    /// After opening a menu or choosing a menu entry
    pub action: Duration,
    /// After dismissing a menu or confirming
    pub dismiss: Duration,
    /// After asking the view for more content
    pub expand: Duration,
}

impl SettleDelays {
    pub fn new(action: Duration, dismiss: Duration, expand: Duration) -> Self {
        Self { action, dismiss, expand }
    }

    /// No waits at all; handy for tests against in-memory views.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_valid_pacing() {
        assert!(Pacing::new(ms(3000), ms(60_000), ms(1000), 1200).validate().is_ok());
    }

    #[test]
    fn test_zero_base_delay_rejected() {
        let err = Pacing::new(ms(0), ms(60_000), ms(0), 1).validate().unwrap_err();
        assert!(err.to_string().contains("base-delay-ms"));
    }

    #[test]
    fn test_max_below_base_rejected() {
        let err = Pacing::new(ms(5000), ms(1000), ms(0), 1).validate().unwrap_err();
        assert!(err.to_string().contains("max-delay-ms"));
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err = Pacing::new(ms(1), ms(1), ms(0), 0).validate().unwrap_err();
        assert!(err.to_string().contains("hard-cap"));
    }
}
