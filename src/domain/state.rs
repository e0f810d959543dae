//! Loop state owned by the orchestrator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::outcome::ActionOutcome;
use super::report::Termination;

/// Phase of the orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPhase {
    /// Locating and acting on items
    Running,
    /// Nothing visible; loading more and re-locating once
    Expanding,
    /// Run is over
    Terminated(Termination),
}

impl LoopPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

/// Counters and pacing of one run. Mutated once per iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopState {
    /// Items acted upon, whatever the outcome
    pub items_processed: u64,
    /// Items whose action went through
    pub items_succeeded: u64,
    pub skipped_no_permission: u64,
    pub skipped_no_confirmation: u64,
    pub items_failed: u64,
    /// Current base delay between actions; only ever grows
    pub current_delay_ms: u64,
    /// Items left before the safety cutoff
    pub iterations_remaining: u64,
    /// Number of times more content was requested
    pub expansions: u64,
}

impl LoopState {
    /// Zeroed counters with the starting delay and cap.
    pub fn new(base_delay: Duration, hard_cap: u64) -> Self {
        Self {
            items_processed: 0,
            items_succeeded: 0,
            skipped_no_permission: 0,
            skipped_no_confirmation: 0,
            items_failed: 0,
            current_delay_ms: base_delay.as_millis() as u64,
            iterations_remaining: hard_cap,
            expansions: 0,
        }
    }

    /// Count one processed item.
    pub fn record(&mut self, outcome: &ActionOutcome) {
        self.items_processed += 1;
        self.iterations_remaining = self.iterations_remaining.saturating_sub(1);
        match outcome {
            ActionOutcome::Success => self.items_succeeded += 1,
            ActionOutcome::SkippedNoPermission => self.skipped_no_permission += 1,
            ActionOutcome::SkippedNoConfirmation => self.skipped_no_confirmation += 1,
            ActionOutcome::Failure(_) => self.items_failed += 1,
        }
    }

    /// Track the controller's base delay. Never lowers it.
    pub fn observe_delay(&mut self, base_delay: Duration) {
        self.current_delay_ms = self.current_delay_ms.max(base_delay.as_millis() as u64);
    }

    pub fn record_expansion(&mut self) {
        self.expansions += 1;
    }

    pub fn cap_reached(&self) -> bool {
        self.iterations_remaining == 0
    }
}
