//! Adaptive inter-action delay.
//!
//! There is no signal from the rate limiter other than interactions failing,
//! so the controller only reacts to `Failure` outcomes: each one doubles the
//! base delay up to the ceiling, and the increase holds for the rest of the run.

use std::time::Duration;

use super::jitter::Jitter;
use super::Pacing;
use crate::domain::ActionOutcome;

/// Supplies the wait before the next action.
pub struct BackoffController<J: Jitter> {
    base_delay: Duration,
    max_delay: Duration,
    jitter_max: Duration,
    jitter: J,
    escalations: u32,
}

impl<J: Jitter> BackoffController<J> {
    pub fn new(pacing: &Pacing, jitter: J) -> Self {
        Self {
            base_delay: pacing.base_delay,
            max_delay: pacing.max_delay,
            jitter_max: pacing.jitter_max,
            jitter,
            escalations: 0,
        }
    }

    /// Delay to wait after `outcome`.
    ///
    /// Non-failures get the current base plus jitter in `[0, jitter_max)`.
    /// A failure doubles the base (capped at `max_delay`) and returns the new
    /// base without jitter.
    pub fn next_delay(&mut self, outcome: &ActionOutcome) -> Duration {
        match outcome {
            ActionOutcome::Failure(reason) => {
                self.escalate();
                tracing::warn!(
                    delay_ms = self.base_delay.as_millis() as u64,
                    escalations = self.escalations,
                    reason = %reason,
                    "Action failed, increasing delay"
                );
                self.base_delay
            }
            _ => self.base_delay + self.jitter.sample(self.jitter_max),
        }
    }

    /// Current base delay.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Number of failures that raised the delay so far.
    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    pub fn at_ceiling(&self) -> bool {
        self.base_delay >= self.max_delay
    }

    fn escalate(&mut self) {
        self.escalations += 1;
        self.base_delay = self.base_delay.saturating_mul(2).min(self.max_delay);
    }
}
