//! Action profiles: which UI flow the executor runs and where its controls live.
//!
//! Built-in profiles:
//! - `unlike`: the candidate is the unlike button itself, one click per item
//! - `delete`: overflow menu, "delete" entry, confirmation dialog

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::pacing::{Pacing, SettleDelays};
use crate::view::Selector;

/// Built-in profile names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Unlike,
    Delete,
}

impl ProfileKind {
    pub fn all() -> [ProfileKind; 2] {
        [ProfileKind::Unlike, ProfileKind::Delete]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unlike => "unlike",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unlike" | "likes" => Ok(Self::Unlike),
            "delete" | "replies" | "posts" => Ok(Self::Delete),
            other => Err(SweepError::Config(format!("unknown profile: {}", other))),
        }
    }
}

/// Menu step of a flow: scan entries for one whose label contains `needle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuStep {
    pub entries: Selector,
    pub needle: String,
}

/// Confirmation step: canonical control first, then a labeled-button search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmStep {
    pub canonical: Selector,
    pub fallback: Selector,
    pub needle: String,
}

/// Everything the executor needs to know about one kind of bulk action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionProfile {
    pub kind: ProfileKind,
    /// Matches actionable items in document order
    pub candidate: Selector,
    /// Control inside the item to trigger; `None` means the item itself
    pub primary_control: Option<Selector>,
    pub menu: Option<MenuStep>,
    pub confirm: Option<ConfirmStep>,
    /// Detach the item from the view even when the action succeeded
    pub detach_processed: bool,
}

impl ActionProfile {
    pub fn builtin(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Unlike => Self::unlike(),
            ProfileKind::Delete => Self::delete(),
        }
    }

    /// One click on the unlike control; the control then turns into "like".
    pub fn unlike() -> Self {
        Self {
            kind: ProfileKind::Unlike,
            candidate: Selector::new(r#"[data-testid="unlike"]"#),
            primary_control: None,
            menu: None,
            confirm: None,
            detach_processed: false,
        }
    }

    /// Overflow menu -> "Delete" -> confirmation sheet.
    pub fn delete() -> Self {
        Self {
            kind: ProfileKind::Delete,
            candidate: Selector::new(r#"article[data-testid="tweet"]"#),
            primary_control: Some(Selector::new(
                r#"[data-testid="caret"], div[aria-label="More"][role="button"]"#,
            )),
            menu: Some(MenuStep {
                entries: Selector::new(r#"div[role="menuitem"], div[role="menuitemradio"]"#),
                needle: "delete".to_string(),
            }),
            confirm: Some(ConfirmStep {
                canonical: Selector::new(r#"[data-testid="confirmationSheetConfirm"]"#),
                fallback: Selector::new(r#"div[role="button"], div[role="menuitem"]"#),
                needle: "delete".to_string(),
            }),
            detach_processed: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Pacing the profile runs with unless configured otherwise.
    pub fn default_pacing(&self) -> Pacing {
        match self.kind {
            ProfileKind::Unlike => Pacing::new(
                Duration::from_millis(3000),
                Duration::from_millis(60_000),
                Duration::from_millis(1000),
                1200,
            ),
            ProfileKind::Delete => Pacing::new(
                Duration::from_millis(2000),
                Duration::from_millis(60_000),
                Duration::ZERO,
                5000,
            ),
        }
    }

    pub fn default_settle(&self) -> SettleDelays {
        match self.kind {
            ProfileKind::Unlike => SettleDelays::new(
                Duration::from_millis(800),
                Duration::from_millis(500),
                Duration::from_millis(5000),
            ),
            ProfileKind::Delete => SettleDelays::new(
                Duration::from_millis(800),
                Duration::from_millis(500),
                Duration::from_millis(3000),
            ),
        }
    }
}

/// Case-insensitive substring match on a visible label.
pub fn label_matches(label: &str, needle: &str) -> bool {
    label.trim().to_lowercase().contains(&needle.to_lowercase())
}
