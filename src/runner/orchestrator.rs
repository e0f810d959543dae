//! Drives the sweep: locate -> act -> pace, expanding the view when it runs dry.
//!
//! State machine:
//! - Running -> Running: item located and processed, delay slept
//! - Running -> Expanding: nothing located; load more once
//! - Expanding -> Running: something appeared after loading
//! - Expanding -> Terminated: still nothing (feed exhausted)
//! - any -> Terminated: hard cap reached or cancellation requested
//!
//! Cancellation is checked at the top of every iteration. Once the cap is
//! reached the run still looks for one more candidate: it is a safety cutoff
//! only if one remains, otherwise the feed was exhausted. Timed waits are the
//! only suspension points.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::domain::{ItemRef, LoopPhase, LoopState, RunReport, Termination};
use crate::pacing::{BackoffController, Clock, Jitter, Pacing, RandomJitter, SettleDelays};
use crate::profile::ActionProfile;
use crate::view::View;

use super::executor::ActionExecutor;
use super::expander::ViewExpander;
use super::locator::ElementLocator;

/// One bounded, strictly sequential sweep over a view.
pub struct LoopOrchestrator<J: Jitter = RandomJitter> {
    profile: ActionProfile,
    pacing: Pacing,
    executor: ActionExecutor,
    expander: ViewExpander,
    backoff: BackoffController<J>,
}

impl LoopOrchestrator<RandomJitter> {
    pub fn new(profile: ActionProfile, pacing: Pacing, settle: SettleDelays) -> Self {
        Self::with_jitter(profile, pacing, settle, RandomJitter)
    }
}

impl<J: Jitter> LoopOrchestrator<J> {
    pub fn with_jitter(profile: ActionProfile, pacing: Pacing, settle: SettleDelays, jitter: J) -> Self {
        Self {
            executor: ActionExecutor::new(profile.clone(), settle),
            expander: ViewExpander::new(settle.expand),
            backoff: BackoffController::new(&pacing, jitter),
            profile,
            pacing,
        }
    }

    pub fn with_menu_rescan(mut self, enabled: bool) -> Self {
        self.executor = self.executor.with_menu_rescan(enabled);
        self
    }

    /// Run until the feed is exhausted, the cap is hit, or `cancel` fires.
    ///
    /// Per-item problems never abort the run; the report is always produced.
    pub async fn run<V, C>(mut self, view: &V, clock: &C, cancel: &CancellationToken) -> RunReport
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        let started_at = Utc::now();
        let start = clock.now();
        let mut state = LoopState::new(self.pacing.base_delay, self.pacing.hard_cap);
        let mut locator = ElementLocator::new(self.profile.candidate.clone());
        let mut phase = LoopPhase::Running;

        log::info!(
            "Starting {} sweep: base {}ms, max {}ms, jitter <{}ms, cap {}",
            self.profile.name(),
            self.pacing.base_delay.as_millis(),
            self.pacing.max_delay.as_millis(),
            self.pacing.jitter_max.as_millis(),
            self.pacing.hard_cap
        );

        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            let next = self.next_candidate(view, clock, &locator, &mut state, &mut phase).await;
            if state.cap_reached() {
                // only a cutoff if something was left undone
                break match next {
                    Some(_) => Termination::SafetyCutoff,
                    None => Termination::Exhausted,
                };
            }
            let Some(item) = next else {
                break Termination::Exhausted;
            };
            transition(&mut phase, LoopPhase::Running);

            let outcome = self.executor.execute(view, clock, &mut locator, &item).await;
            state.record(&outcome);
            let delay = self.backoff.next_delay(&outcome);
            state.observe_delay(self.backoff.base_delay());

            log::info!(
                "{} {}: {} (processed {}, succeeded {}, next wait {}ms)",
                self.profile.name(),
                item,
                outcome,
                state.items_processed,
                state.items_succeeded,
                delay.as_millis()
            );

            if state.cap_reached() {
                continue;
            }
            tokio::select! {
                _ = clock.sleep(delay) => {}
                _ = cancel.cancelled() => {}
            }
        };
        transition(&mut phase, LoopPhase::Terminated(termination));

        match termination {
            Termination::Exhausted => log::info!(
                "Feed exhausted: processed {}, succeeded {}",
                state.items_processed,
                state.items_succeeded
            ),
            Termination::SafetyCutoff => log::warn!(
                "Stopped at the hard cap of {} items to avoid rate limiting (succeeded {})",
                self.pacing.hard_cap,
                state.items_succeeded
            ),
            Termination::Cancelled => log::info!(
                "Sweep cancelled: processed {}, succeeded {}",
                state.items_processed,
                state.items_succeeded
            ),
        }

        let elapsed_ms = clock.now().saturating_duration_since(start).as_millis() as u64;
        RunReport::from_state(self.profile.name(), &state, termination, started_at, elapsed_ms)
    }

    /// Locate the next item, loading more content once if nothing is visible.
    async fn next_candidate<V, C>(
        &self,
        view: &V,
        clock: &C,
        locator: &ElementLocator,
        state: &mut LoopState,
        phase: &mut LoopPhase,
    ) -> Option<ItemRef>
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        if let Some(item) = self.locate(view, locator).await {
            return Some(item);
        }
        transition(phase, LoopPhase::Expanding);
        state.record_expansion();
        log::info!("No candidates visible, loading more (expansion #{})", state.expansions);
        if let Err(err) = self.expander.expand(view, clock).await {
            log::warn!("Loading more content failed: {}", err);
        }
        self.locate(view, locator).await
    }

    async fn locate<V>(&self, view: &V, locator: &ElementLocator) -> Option<ItemRef>
    where
        V: View + ?Sized,
    {
        match locator.locate_next(view).await {
            Ok(item) => item,
            Err(err) => {
                log::warn!("Locating the next item failed: {}", err);
                None
            }
        }
    }
}

fn transition(phase: &mut LoopPhase, next: LoopPhase) {
    if *phase != next {
        log::debug!("sweep phase {:?} -> {:?}", phase, next);
        *phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::{FixedJitter, ManualClock};
    use crate::view::{FeedItem, FeedScript, InjectedFault, MemoryView};
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn orchestrator(profile: &ActionProfile, cap: u64) -> LoopOrchestrator<FixedJitter> {
        LoopOrchestrator::with_jitter(
            profile.clone(),
            Pacing::new(ms(3000), ms(60_000), ms(1000), cap),
            SettleDelays::none(),
            FixedJitter(ms(250)),
        )
    }

    #[tokio::test]
    async fn test_empty_feed_terminates_exhausted() {
        let profile = ActionProfile::delete();
        let view = MemoryView::new(&profile, FeedScript::default());
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 10).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.processed, 0);
        assert_eq!(report.termination, Termination::Exhausted);
        assert_eq!(report.expansions, 1);
        assert_eq!(view.expansions(), 1);
    }

    #[tokio::test]
    async fn test_endless_feed_stops_at_cap() {
        let profile = ActionProfile::unlike();
        let script = FeedScript::default().paged(4).endless(|n| FeedItem::owned(format!("g{}", n)));
        let view = MemoryView::new(&profile, script);
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 7).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.termination, Termination::SafetyCutoff);
        assert_eq!(report.processed, 7);
        assert_eq!(report.succeeded, 7);
        assert_eq!(view.completed().len(), 7);
        // no wait after the last item; zero-length waits are expansion settles
        let waits: Vec<Duration> = clock.sleeps().into_iter().filter(|d| !d.is_zero()).collect();
        assert_eq!(waits, vec![ms(3250); 6]);
    }

    #[tokio::test]
    async fn test_feed_ending_at_cap_is_exhausted() {
        let profile = ActionProfile::unlike();
        let items = vec![FeedItem::owned("a"), FeedItem::owned("b"), FeedItem::owned("c")];
        let view = MemoryView::new(&profile, FeedScript::new(items));
        let clock = ManualClock::new();
        let orchestrator = LoopOrchestrator::with_jitter(
            profile.clone(),
            Pacing::new(ms(3000), ms(60_000), ms(1000), 3),
            SettleDelays::none(),
            FixedJitter(ms(0)),
        );

        let report = orchestrator.run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.termination, Termination::Exhausted);
        // one load-more attempt confirmed nothing was left
        assert_eq!(report.expansions, 1);
    }

    #[tokio::test]
    async fn test_cap_with_candidates_left_is_cutoff() {
        let profile = ActionProfile::unlike();
        let items = (0..4).map(|i| FeedItem::owned(format!("l{}", i))).collect();
        let view = MemoryView::new(&profile, FeedScript::new(items));
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 3).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.termination, Termination::SafetyCutoff);
        assert_eq!(report.expansions, 0);
        assert_eq!(view.rendered_ids().len(), 4);
    }

    #[tokio::test]
    async fn test_expansion_continues_run() {
        let profile = ActionProfile::delete();
        let items = (0..5).map(|i| FeedItem::owned(format!("p{}", i))).collect();
        let view = MemoryView::new(&profile, FeedScript::new(items).paged(2));
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 100).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.termination, Termination::Exhausted);
        assert_eq!(report.processed, 5);
        assert_eq!(report.succeeded, 5);
        // pages of 2: two loads that found more, one that found nothing
        assert_eq!(report.expansions, 3);
    }

    #[tokio::test]
    async fn test_failures_escalate_delay() {
        let profile = ActionProfile::delete();
        let items = vec![
            FeedItem::owned("a"),
            FeedItem::owned("b").with_fault(InjectedFault::Trigger),
            FeedItem::owned("c"),
        ];
        let view = MemoryView::new(&profile, FeedScript::new(items));
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 100).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.final_delay_ms, 6000);
        let sleeps: Vec<Duration> = clock.sleeps().into_iter().filter(|d| !d.is_zero()).collect();
        assert_eq!(sleeps, vec![ms(3250), ms(6000), ms(6250)]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let profile = ActionProfile::delete();
        let view = MemoryView::new(&profile, FeedScript::new(vec![FeedItem::owned("a")]));
        let clock = ManualClock::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = orchestrator(&profile, 10).run(&view, &clock, &cancel).await;

        assert_eq!(report.termination, Termination::Cancelled);
        assert_eq!(report.processed, 0);
        assert!(view.completed().is_empty());
    }

    #[tokio::test]
    async fn test_skips_counted_and_not_escalated() {
        let profile = ActionProfile::delete();
        let items = vec![FeedItem::foreign("a"), FeedItem::without_delete("b"), FeedItem::owned("c")];
        let view = MemoryView::new(&profile, FeedScript::new(items));
        let clock = ManualClock::new();

        let report = orchestrator(&profile, 10).run(&view, &clock, &CancellationToken::new()).await;

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped_no_permission, 2);
        assert_eq!(report.final_delay_ms, 3000);
        assert!(report.succeeded <= report.processed);
    }
}
