//! Execution overrides (Layer 3).
//!
//! Values given on the command line for a single run.

use serde::{Deserialize, Serialize};

/// Per-run overrides; they win over every file setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter_max_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_cap: Option<u64>,

    /// Replace the profile's candidate selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_rescan: Option<bool>,
}

impl ConfigOverrides {
    /// Create empty overrides (no overrides applied).
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if any overrides are set.
    pub fn is_empty(&self) -> bool {
        self.base_delay_ms.is_none()
            && self.max_delay_ms.is_none()
            && self.jitter_max_ms.is_none()
            && self.hard_cap.is_none()
            && self.candidate.is_none()
            && self.menu_rescan.is_none()
    }

    pub fn builder() -> ConfigOverridesBuilder {
        ConfigOverridesBuilder::default()
    }
}

/// Builder for ConfigOverrides.
#[derive(Debug, Default)]
pub struct ConfigOverridesBuilder {
    overrides: ConfigOverrides,
}

impl ConfigOverridesBuilder {
    pub fn base_delay_ms(mut self, value: Option<u64>) -> Self {
        self.overrides.base_delay_ms = value;
        self
    }

    pub fn max_delay_ms(mut self, value: Option<u64>) -> Self {
        self.overrides.max_delay_ms = value;
        self
    }

    pub fn jitter_max_ms(mut self, value: Option<u64>) -> Self {
        self.overrides.jitter_max_ms = value;
        self
    }

    pub fn hard_cap(mut self, value: Option<u64>) -> Self {
        self.overrides.hard_cap = value;
        self
    }

    pub fn candidate(mut self, value: Option<String>) -> Self {
        self.overrides.candidate = value;
        self
    }

    pub fn menu_rescan(mut self, value: Option<bool>) -> Self {
        self.overrides.menu_rescan = value;
        self
    }

    pub fn build(self) -> ConfigOverrides {
        self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_empty() {
        assert!(ConfigOverrides::none().is_empty());
    }

    #[test]
    fn test_builder() {
        let overrides = ConfigOverrides::builder()
            .hard_cap(Some(25))
            .base_delay_ms(None)
            .menu_rescan(Some(false))
            .build();
        assert!(!overrides.is_empty());
        assert_eq!(overrides.hard_cap, Some(25));
        assert_eq!(overrides.base_delay_ms, None);
        assert_eq!(overrides.menu_rescan, Some(false));
    }
}
