//! File configuration (Layer 2).
//!
//! Loaded from an explicit path, ./.feedsweep.yml or ~/.config/feedsweep/feedsweep.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::ProfileKind;

/// Project config file name searched in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".feedsweep.yml";

/// Top-level configuration for Feedsweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Pacing applied to every profile.
    pub pacing: PacingConfig,

    /// Settle delays applied to every profile.
    pub settle: SettleConfig,

    /// Per-item flow options.
    pub executor: ExecutorConfig,

    /// Browser attachment.
    pub browser: BrowserConfig,

    /// Per-profile overrides.
    pub profiles: ProfilesConfig,
}

impl SweepConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .feedsweep.yml in current directory
    /// 3. ~/.config/feedsweep/feedsweep.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from {}", PROJECT_CONFIG_FILE);
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load {}: {}", PROJECT_CONFIG_FILE, e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("feedsweep").join("feedsweep.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Reject values that can never produce a sane run.
    pub fn validate(&self) -> Result<()> {
        if self.pacing.base_delay_ms == Some(0) {
            eyre::bail!("pacing.base-delay-ms must be > 0");
        }
        if self.pacing.hard_cap == Some(0) {
            eyre::bail!("pacing.hard-cap must be > 0");
        }
        if let (Some(base), Some(max)) = (self.pacing.base_delay_ms, self.pacing.max_delay_ms)
            && max < base
        {
            eyre::bail!("pacing.max-delay-ms must be >= pacing.base-delay-ms");
        }
        Ok(())
    }
}

/// Pacing values; unset fields keep the profile's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Starting delay between actions.
    #[serde(rename = "base-delay-ms", skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,

    /// Ceiling for the escalated delay.
    #[serde(rename = "max-delay-ms", skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    /// Upper bound of the random extra wait.
    #[serde(rename = "jitter-max-ms", skip_serializing_if = "Option::is_none")]
    pub jitter_max_ms: Option<u64>,

    /// Maximum items per run.
    #[serde(rename = "hard-cap", skip_serializing_if = "Option::is_none")]
    pub hard_cap: Option<u64>,
}

/// Settle delays; unset fields keep the profile's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettleConfig {
    /// After opening a menu or choosing an entry.
    #[serde(rename = "action-ms", skip_serializing_if = "Option::is_none")]
    pub action_ms: Option<u64>,

    /// After dismissing a menu or confirming.
    #[serde(rename = "dismiss-ms", skip_serializing_if = "Option::is_none")]
    pub dismiss_ms: Option<u64>,

    /// After loading more content.
    #[serde(rename = "expand-ms", skip_serializing_if = "Option::is_none")]
    pub expand_ms: Option<u64>,
}

/// Per-item flow options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Scan an opened menu a second time before skipping the item.
    #[serde(rename = "menu-rescan")]
    pub menu_rescan: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { menu_rescan: true }
    }
}

/// Where the live browser is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// DevTools websocket URL of an already running browser.
    #[serde(rename = "ws-url", skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    /// Substring of the tab URL to attach to.
    #[serde(rename = "page-match", skip_serializing_if = "Option::is_none")]
    pub page_match: Option<String>,
}

/// Overrides for each built-in profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfilesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlike: Option<ProfileConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<ProfileConfig>,
}

impl ProfilesConfig {
    pub fn get(&self, kind: ProfileKind) -> Option<&ProfileConfig> {
        match kind {
            ProfileKind::Unlike => self.unlike.as_ref(),
            ProfileKind::Delete => self.delete.as_ref(),
        }
    }

    pub fn set(&mut self, kind: ProfileKind, profile: ProfileConfig) {
        match kind {
            ProfileKind::Unlike => self.unlike = Some(profile),
            ProfileKind::Delete => self.delete = Some(profile),
        }
    }
}

/// Selector, needle and pacing overrides for one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,

    #[serde(rename = "primary-control", skip_serializing_if = "Option::is_none")]
    pub primary_control: Option<String>,

    #[serde(rename = "menu-entries", skip_serializing_if = "Option::is_none")]
    pub menu_entries: Option<String>,

    #[serde(rename = "confirm-canonical", skip_serializing_if = "Option::is_none")]
    pub confirm_canonical: Option<String>,

    #[serde(rename = "confirm-fallback", skip_serializing_if = "Option::is_none")]
    pub confirm_fallback: Option<String>,

    /// Label text that marks the delete entry / confirm button.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pacing: Option<PacingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settle: Option<SettleConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert!(config.pacing.base_delay_ms.is_none());
        assert!(config.executor.menu_rescan);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_kebab_case_yaml() {
        let yaml = r#"
pacing:
  base-delay-ms: 4000
  hard-cap: 50
settle:
  expand-ms: 1500
executor:
  menu-rescan: false
browser:
  ws-url: ws://127.0.0.1:9222/devtools/browser/abc
profiles:
  delete:
    needle: supprimer
    pacing:
      jitter-max-ms: 700
"#;
        let config: SweepConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pacing.base_delay_ms, Some(4000));
        assert_eq!(config.pacing.hard_cap, Some(50));
        assert_eq!(config.settle.expand_ms, Some(1500));
        assert!(!config.executor.menu_rescan);
        assert_eq!(
            config.browser.ws_url.as_deref(),
            Some("ws://127.0.0.1:9222/devtools/browser/abc")
        );
        let delete = config.profiles.get(ProfileKind::Delete).unwrap();
        assert_eq!(delete.needle.as_deref(), Some("supprimer"));
        assert_eq!(delete.pacing.as_ref().and_then(|p| p.jitter_max_ms), Some(700));
        assert!(config.profiles.get(ProfileKind::Unlike).is_none());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pacing:\n  max-delay-ms: 90000").unwrap();

        let config = SweepConfig::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.pacing.max_delay_ms, Some(90_000));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/feedsweep.yml");
        assert!(SweepConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = SweepConfig {
            pacing: PacingConfig {
                base_delay_ms: Some(5000),
                max_delay_ms: Some(1000),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SweepConfig {
            pacing: PacingConfig {
                hard_cap: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
