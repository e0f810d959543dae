//! Applies the bulk action to one item.
//!
//! The per-item flow is a short sequence of fallible steps:
//! focus -> primary control -> (menu entry) -> (confirmation). Expected gaps
//! (no control, no delete entry, no confirmation surface) end the flow with a
//! skip outcome; anything that errors ends it with `Failure`. Whatever happens,
//! the item is retired afterwards so it is never processed twice.

use std::fmt;

use crate::domain::{ActionOutcome, ElementRef, ItemRef};
use crate::error::Result;
use crate::pacing::{Clock, SettleDelays};
use crate::profile::{label_matches, ActionProfile, ConfirmStep, MenuStep};
use crate::view::{Scope, Selector, View};

use super::locator::ElementLocator;

/// Step of the per-item flow, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    Focus,
    PrimaryControl,
    Menu,
    Confirm,
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Focus => f.write_str("focus"),
            Self::PrimaryControl => f.write_str("primary-control"),
            Self::Menu => f.write_str("menu"),
            Self::Confirm => f.write_str("confirm"),
        }
    }
}

/// Runs a profile's flow against one item at a time.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    profile: ActionProfile,
    settle: SettleDelays,
    menu_rescan: bool,
}

impl ActionExecutor {
    pub fn new(profile: ActionProfile, settle: SettleDelays) -> Self {
        Self {
            profile,
            settle,
            menu_rescan: true,
        }
    }

    /// Scan the menu a second time before concluding there is no delete entry.
    pub fn with_menu_rescan(mut self, enabled: bool) -> Self {
        self.menu_rescan = enabled;
        self
    }

    /// Act on `item` and report exactly one outcome.
    ///
    /// Never fails: errors become `ActionOutcome::Failure`. The item is retired
    /// from `locator` and, unless the action succeeded on a profile that leaves
    /// items in place, detached from the view.
    pub async fn execute<V, C>(
        &self,
        view: &V,
        clock: &C,
        locator: &mut ElementLocator,
        item: &ItemRef,
    ) -> ActionOutcome
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        let mut step = FlowStep::Focus;
        let outcome = match self.run_flow(view, clock, item, &mut step).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("{} failed at {} step: {}", item, step, err);
                ActionOutcome::failure(format!("{} step: {}", step, err))
            }
        };
        self.retire(view, locator, item, &outcome).await;
        outcome
    }

    async fn run_flow<V, C>(&self, view: &V, clock: &C, item: &ItemRef, step: &mut FlowStep) -> Result<ActionOutcome>
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        view.focus(item.element()).await?;

        *step = FlowStep::PrimaryControl;
        let control = match &self.profile.primary_control {
            None => item.element().clone(),
            Some(selector) => match view.query_first(selector, Scope::Within(item.element())).await? {
                Some(control) => control,
                None => {
                    log::debug!("{} has no primary control, not ours to act on", item);
                    return Ok(ActionOutcome::SkippedNoPermission);
                }
            },
        };
        view.trigger(&control).await?;

        if let Some(menu) = &self.profile.menu {
            *step = FlowStep::Menu;
            clock.sleep(self.settle.action).await;
            let Some(entry) = self.find_menu_entry(view, clock, menu).await? else {
                log::debug!("{} menu has no '{}' entry", item, menu.needle);
                view.dismiss_overlays().await?;
                clock.sleep(self.settle.dismiss).await;
                return Ok(ActionOutcome::SkippedNoPermission);
            };
            view.trigger(&entry).await?;
        }

        if let Some(confirm) = &self.profile.confirm {
            *step = FlowStep::Confirm;
            clock.sleep(self.settle.action).await;
            if !self.confirm(view, confirm).await? {
                log::debug!("{} has no confirmation surface", item);
                view.dismiss_overlays().await?;
                return Ok(ActionOutcome::SkippedNoConfirmation);
            }
            clock.sleep(self.settle.dismiss).await;
        }

        Ok(ActionOutcome::Success)
    }

    async fn find_menu_entry<V, C>(&self, view: &V, clock: &C, menu: &MenuStep) -> Result<Option<ElementRef>>
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        if let Some(entry) = find_labeled(view, &menu.entries, &menu.needle).await? {
            return Ok(Some(entry));
        }
        if !self.menu_rescan {
            return Ok(None);
        }
        // The menu may still be animating in.
        clock.sleep(self.settle.action).await;
        find_labeled(view, &menu.entries, &menu.needle).await
    }

    /// Trigger the canonical confirmation, else the first matching labeled button.
    async fn confirm<V>(&self, view: &V, confirm: &ConfirmStep) -> Result<bool>
    where
        V: View + ?Sized,
    {
        if let Some(control) = view.query_first(&confirm.canonical, Scope::Document).await? {
            view.trigger(&control).await?;
            return Ok(true);
        }
        match find_labeled(view, &confirm.fallback, &confirm.needle).await? {
            Some(button) => {
                view.trigger(&button).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retire<V>(&self, view: &V, locator: &mut ElementLocator, item: &ItemRef, outcome: &ActionOutcome)
    where
        V: View + ?Sized,
    {
        locator.retire(item);

        if outcome.is_failure() && (self.profile.menu.is_some() || self.profile.confirm.is_some()) {
            if let Err(err) = view.dismiss_overlays().await {
                log::debug!("dismissing overlays after failure on {}: {}", item, err);
            }
        }

        if self.profile.detach_processed || !outcome.is_success() {
            if let Err(err) = view.remove(item.element()).await {
                log::debug!("detaching {}: {}", item, err);
            }
        }
    }
}

/// First element matching `selector` whose label contains `needle` (case-insensitive).
async fn find_labeled<V>(view: &V, selector: &Selector, needle: &str) -> Result<Option<ElementRef>>
where
    V: View + ?Sized,
{
    for element in view.query_all(selector, Scope::Document).await? {
        let label = view.read_label(&element).await?;
        if label_matches(&label, needle) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}
