//! Terminal report of a run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::LoopState;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// No candidates left even after loading more
    Exhausted,
    /// The hard item cap was reached
    SafetyCutoff,
    /// The host asked the run to stop
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("exhausted"),
            Self::SafetyCutoff => f.write_str("safety-cutoff"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Summary handed back to the caller once the loop terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub profile: String,
    pub processed: u64,
    pub succeeded: u64,
    pub skipped_no_permission: u64,
    pub skipped_no_confirmation: u64,
    pub failed: u64,
    pub expansions: u64,
    pub termination: Termination,
    /// Base delay in force when the run stopped
    pub final_delay_ms: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub fn from_state(
        profile: impl Into<String>,
        state: &LoopState,
        termination: Termination,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            profile: profile.into(),
            processed: state.items_processed,
            succeeded: state.items_succeeded,
            skipped_no_permission: state.skipped_no_permission,
            skipped_no_confirmation: state.skipped_no_confirmation,
            failed: state.items_failed,
            expansions: state.expansions,
            termination,
            final_delay_ms: state.current_delay_ms,
            started_at,
            elapsed_ms,
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped_no_permission + self.skipped_no_confirmation
    }
}
