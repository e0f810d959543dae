//! Action outcome types.
//!
//! One `ActionOutcome` is produced per executor invocation and consumed
//! immediately by the orchestrator and the backoff controller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of applying the bulk action to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action went through
    Success,
    /// The item offers no capable control (not ours, reposted, ...)
    SkippedNoPermission,
    /// The action started but no confirmation surface appeared
    SkippedNoConfirmation,
    /// Unexpected failure while interacting
    Failure(String),
}

impl ActionOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::SkippedNoPermission => f.write_str("skipped (no permission)"),
            Self::SkippedNoConfirmation => f.write_str("skipped (no confirmation)"),
            Self::Failure(reason) => write!(f, "failure: {}", reason),
        }
    }
}
