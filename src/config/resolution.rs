//! Configuration resolution (3-layer merge).
//!
//! Resolves the effective settings for one profile from:
//! 1. Built-in profile defaults
//! 2. SweepConfig (global section, then the profile's own section)
//! 3. ConfigOverrides (command line)

use std::time::Duration;

use super::{ConfigOverrides, PacingConfig, ProfileConfig, SettleConfig, SweepConfig};
use crate::pacing::{Pacing, SettleDelays};
use crate::profile::{ActionProfile, ProfileKind};
use crate::view::Selector;

/// Everything a sweep needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSettings {
    pub profile: ActionProfile,
    pub pacing: Pacing,
    pub settle: SettleDelays,
    pub menu_rescan: bool,
}

impl SweepSettings {
    /// Render back into the file format, as a fully populated profile section.
    pub fn to_profile_config(&self) -> ProfileConfig {
        let profile = &self.profile;
        ProfileConfig {
            candidate: Some(profile.candidate.to_string()),
            primary_control: profile.primary_control.as_ref().map(|s| s.to_string()),
            menu_entries: profile.menu.as_ref().map(|m| m.entries.to_string()),
            confirm_canonical: profile.confirm.as_ref().map(|c| c.canonical.to_string()),
            confirm_fallback: profile.confirm.as_ref().map(|c| c.fallback.to_string()),
            needle: profile
                .menu
                .as_ref()
                .map(|m| m.needle.clone())
                .or_else(|| profile.confirm.as_ref().map(|c| c.needle.clone())),
            pacing: Some(PacingConfig {
                base_delay_ms: Some(millis(self.pacing.base_delay)),
                max_delay_ms: Some(millis(self.pacing.max_delay)),
                jitter_max_ms: Some(millis(self.pacing.jitter_max)),
                hard_cap: Some(self.pacing.hard_cap),
            }),
            settle: Some(SettleConfig {
                action_ms: Some(millis(self.settle.action)),
                dismiss_ms: Some(millis(self.settle.dismiss)),
                expand_ms: Some(millis(self.settle.expand)),
            }),
        }
    }
}

/// Merges the configuration layers for a profile.
#[derive(Debug)]
pub struct ConfigResolver {
    config: SweepConfig,
}

impl ConfigResolver {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Resolve the effective settings for `kind`.
    ///
    /// Later layers win field by field; the result is validated.
    pub fn resolve(&self, kind: ProfileKind, overrides: &ConfigOverrides) -> eyre::Result<SweepSettings> {
        let mut profile = ActionProfile::builtin(kind);
        let mut pacing = profile.default_pacing();
        let mut settle = profile.default_settle();
        let mut menu_rescan = self.config.executor.menu_rescan;

        apply_pacing(&mut pacing, &self.config.pacing);
        apply_settle(&mut settle, &self.config.settle);

        if let Some(section) = self.config.profiles.get(kind) {
            apply_profile(&mut profile, section);
            if let Some(p) = &section.pacing {
                apply_pacing(&mut pacing, p);
            }
            if let Some(s) = &section.settle {
                apply_settle(&mut settle, s);
            }
        }

        apply_pacing(
            &mut pacing,
            &PacingConfig {
                base_delay_ms: overrides.base_delay_ms,
                max_delay_ms: overrides.max_delay_ms,
                jitter_max_ms: overrides.jitter_max_ms,
                hard_cap: overrides.hard_cap,
            },
        );
        if let Some(candidate) = &overrides.candidate {
            profile.candidate = Selector::new(candidate.clone());
        }
        if let Some(rescan) = overrides.menu_rescan {
            menu_rescan = rescan;
        }

        pacing.validate()?;
        log::debug!("Resolved {} settings: {:?}", kind, pacing);

        Ok(SweepSettings {
            profile,
            pacing,
            settle,
            menu_rescan,
        })
    }

    /// Effective configuration for every profile, in file format.
    pub fn effective(&self) -> eyre::Result<SweepConfig> {
        let mut effective = SweepConfig {
            executor: self.config.executor.clone(),
            browser: self.config.browser.clone(),
            ..Default::default()
        };
        for kind in ProfileKind::all() {
            let settings = self.resolve(kind, &ConfigOverrides::none())?;
            effective.profiles.set(kind, settings.to_profile_config());
        }
        Ok(effective)
    }
}

fn apply_pacing(pacing: &mut Pacing, layer: &PacingConfig) {
    if let Some(ms) = layer.base_delay_ms {
        pacing.base_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = layer.max_delay_ms {
        pacing.max_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = layer.jitter_max_ms {
        pacing.jitter_max = Duration::from_millis(ms);
    }
    if let Some(cap) = layer.hard_cap {
        pacing.hard_cap = cap;
    }
}

fn apply_settle(settle: &mut SettleDelays, layer: &SettleConfig) {
    if let Some(ms) = layer.action_ms {
        settle.action = Duration::from_millis(ms);
    }
    if let Some(ms) = layer.dismiss_ms {
        settle.dismiss = Duration::from_millis(ms);
    }
    if let Some(ms) = layer.expand_ms {
        settle.expand = Duration::from_millis(ms);
    }
}

fn apply_profile(profile: &mut ActionProfile, section: &ProfileConfig) {
    if let Some(candidate) = &section.candidate {
        profile.candidate = Selector::new(candidate.clone());
    }
    if let Some(control) = &section.primary_control {
        profile.primary_control = Some(Selector::new(control.clone()));
    }
    if let Some(menu) = profile.menu.as_mut() {
        if let Some(entries) = &section.menu_entries {
            menu.entries = Selector::new(entries.clone());
        }
        if let Some(needle) = &section.needle {
            menu.needle = needle.clone();
        }
    }
    if let Some(confirm) = profile.confirm.as_mut() {
        if let Some(canonical) = &section.confirm_canonical {
            confirm.canonical = Selector::new(canonical.clone());
        }
        if let Some(fallback) = &section.confirm_fallback {
            confirm.fallback = Selector::new(fallback.clone());
        }
        if let Some(needle) = &section.needle {
            confirm.needle = needle.clone();
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfilesConfig;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_resolve_defaults() {
        let resolver = ConfigResolver::new(SweepConfig::default());
        let settings = resolver.resolve(ProfileKind::Unlike, &ConfigOverrides::none()).unwrap();

        assert_eq!(settings.profile, ActionProfile::unlike());
        assert_eq!(settings.pacing.base_delay, ms(3000));
        assert_eq!(settings.pacing.jitter_max, ms(1000));
        assert_eq!(settings.pacing.hard_cap, 1200);
        assert_eq!(settings.settle.expand, ms(5000));
        assert!(settings.menu_rescan);
    }

    #[test]
    fn test_layers_apply_in_order() {
        let config = SweepConfig {
            pacing: PacingConfig {
                base_delay_ms: Some(4000),
                hard_cap: Some(300),
                ..Default::default()
            },
            profiles: ProfilesConfig {
                delete: Some(ProfileConfig {
                    needle: Some("supprimer".to_string()),
                    pacing: Some(PacingConfig {
                        hard_cap: Some(200),
                        ..Default::default()
                    }),
                    settle: Some(SettleConfig {
                        expand_ms: Some(1000),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolver = ConfigResolver::new(config);
        let overrides = ConfigOverrides::builder().hard_cap(Some(10)).build();

        let settings = resolver.resolve(ProfileKind::Delete, &overrides).unwrap();
        assert_eq!(settings.pacing.base_delay, ms(4000));
        assert_eq!(settings.pacing.hard_cap, 10);
        assert_eq!(settings.settle.expand, ms(1000));
        assert_eq!(settings.settle.action, ms(800));
        assert_eq!(settings.profile.menu.as_ref().map(|m| m.needle.as_str()), Some("supprimer"));
        assert_eq!(settings.profile.confirm.as_ref().map(|c| c.needle.as_str()), Some("supprimer"));

        // the delete section does not leak into unlike
        let unlike = resolver.resolve(ProfileKind::Unlike, &ConfigOverrides::none()).unwrap();
        assert_eq!(unlike.pacing.hard_cap, 300);
        assert_eq!(unlike.settle.expand, ms(5000));
    }

    #[test]
    fn test_invalid_result_rejected() {
        let resolver = ConfigResolver::new(SweepConfig::default());
        let overrides = ConfigOverrides::builder().max_delay_ms(Some(100)).build();
        assert!(resolver.resolve(ProfileKind::Unlike, &overrides).is_err());
    }

    #[test]
    fn test_effective_config_round_trips() {
        let resolver = ConfigResolver::new(SweepConfig::default());
        let effective = resolver.effective().unwrap();
        let yaml = serde_yaml::to_string(&effective).unwrap();
        assert!(yaml.contains("base-delay-ms: 2000"));

        let reloaded = ConfigResolver::new(serde_yaml::from_str(&yaml).unwrap());
        for kind in ProfileKind::all() {
            assert_eq!(
                reloaded.resolve(kind, &ConfigOverrides::none()).unwrap(),
                resolver.resolve(kind, &ConfigOverrides::none()).unwrap()
            );
        }
    }
}
