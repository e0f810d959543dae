//! Configuration system for Feedsweep.
//!
//! Three-layer configuration hierarchy:
//! 1. Built-in profile defaults
//! 2. Config file (.feedsweep.yml or ~/.config/feedsweep/feedsweep.yml)
//! 3. Execution overrides (command line)

use eyre::Result;
use std::path::PathBuf;

pub use self::global::{
    BrowserConfig, ExecutorConfig, PROJECT_CONFIG_FILE, PacingConfig, ProfileConfig, ProfilesConfig, SettleConfig,
    SweepConfig,
};
pub use self::overrides::{ConfigOverrides, ConfigOverridesBuilder};
pub use self::resolution::{ConfigResolver, SweepSettings};

mod global;
mod overrides;
mod resolution;

/// Load configuration from the standard search paths, then validate it.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .feedsweep.yml in current directory (project config)
/// 3. ~/.config/feedsweep/feedsweep.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<SweepConfig> {
    let config = SweepConfig::load(explicit_path)?;
    config.validate()?;
    Ok(config)
}
