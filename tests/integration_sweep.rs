//! End-to-end sweep tests
//!
//! Runs whole sweeps against scripted in-memory feeds on a manual clock.

use std::io::Write;
use std::time::Duration;

use feedsweep::config::{ConfigOverrides, ConfigResolver, load_config};
use feedsweep::domain::{ActionOutcome, Termination};
use feedsweep::pacing::{ManualClock, Pacing, SettleDelays};
use feedsweep::profile::{ActionProfile, ProfileKind};
use feedsweep::runner::{ActionExecutor, ElementLocator, LoopOrchestrator};
use feedsweep::simulate::Scenario;
use feedsweep::view::{FeedItem, FeedScript, InjectedFault, MemoryView};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn non_zero(sleeps: Vec<Duration>) -> Vec<Duration> {
    sleeps.into_iter().filter(|d| !d.is_zero()).collect()
}

/// Counters stay ordered for every shape of feed.
#[tokio::test]
async fn test_counters_bounded_by_cap() {
    let shapes = [
        (
            ProfileKind::Delete,
            Scenario {
                items: 30,
                page_size: 4,
                no_permission_every: Some(3),
                fail_every: Some(5),
                infinite: false,
            },
        ),
        (
            ProfileKind::Delete,
            Scenario {
                items: 5,
                page_size: 2,
                no_permission_every: None,
                fail_every: None,
                infinite: true,
            },
        ),
        (
            ProfileKind::Unlike,
            Scenario {
                items: 12,
                page_size: 12,
                no_permission_every: None,
                fail_every: Some(2),
                infinite: false,
            },
        ),
        (
            ProfileKind::Unlike,
            Scenario {
                items: 0,
                page_size: 1,
                no_permission_every: None,
                fail_every: None,
                infinite: false,
            },
        ),
    ];

    for (kind, scenario) in shapes {
        let profile = ActionProfile::builtin(kind);
        let pacing = Pacing::new(ms(100), ms(1000), ms(50), 17);
        let view = MemoryView::new(&profile, scenario.script(kind));
        let clock = ManualClock::new();

        let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
            .run(&view, &clock, &CancellationToken::new())
            .await;

        assert!(report.succeeded <= report.processed, "{:?}", report);
        assert!(report.processed <= 17, "{:?}", report);
        assert_eq!(
            report.processed,
            report.succeeded + report.skipped() + report.failed,
            "{:?}",
            report
        );
        assert!(report.final_delay_ms <= 1000);
    }
}

/// Base 3000ms, jitter below 1000ms: success then failure then success.
#[tokio::test]
async fn test_jitter_and_doubling_scenario() {
    let profile = ActionProfile::unlike();
    let items = vec![
        FeedItem::owned("a"),
        FeedItem::owned("b").with_fault(InjectedFault::Trigger),
        FeedItem::owned("c"),
    ];
    let view = MemoryView::new(&profile, FeedScript::new(items));
    let clock = ManualClock::new();
    let pacing = Pacing::new(ms(3000), ms(60_000), ms(1000), 1200);

    let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.final_delay_ms, 6000);

    let sleeps = non_zero(clock.sleeps());
    assert_eq!(sleeps.len(), 3);
    assert!(sleeps[0] >= ms(3000) && sleeps[0] < ms(4000), "{:?}", sleeps);
    assert_eq!(sleeps[1], ms(6000));
    assert!(sleeps[2] >= ms(6000) && sleeps[2] < ms(7000), "{:?}", sleeps);
}

/// Consecutive failures climb to the ceiling and stay there.
#[tokio::test]
async fn test_consecutive_failures_reach_ceiling() {
    let profile = ActionProfile::unlike();
    let items = (0..9)
        .map(|i| FeedItem::owned(format!("f{}", i)).with_fault(InjectedFault::Trigger))
        .collect();
    let view = MemoryView::new(&profile, FeedScript::new(items));
    let clock = ManualClock::new();
    let pacing = Pacing::new(ms(3000), ms(60_000), ms(1000), 1200);

    let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.failed, 9);
    let sleeps = non_zero(clock.sleeps());
    assert!(sleeps.windows(2).all(|w| w[0] <= w[1]));
    assert!(sleeps.iter().all(|d| *d <= ms(60_000)));
    assert_eq!(sleeps.last(), Some(&ms(60_000)));
    assert_eq!(report.final_delay_ms, 60_000);
}

#[tokio::test]
async fn test_locate_is_stable_without_mutation() {
    let profile = ActionProfile::delete();
    let view = MemoryView::new(&profile, FeedScript::new(vec![FeedItem::owned("a"), FeedItem::owned("b")]));
    let locator = ElementLocator::new(profile.candidate.clone());

    let first = locator.locate_next(&view).await.unwrap();
    let second = locator.locate_next(&view).await.unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_item_without_control_skipped_and_gone() {
    let profile = ActionProfile::delete();
    let view = MemoryView::new(&profile, FeedScript::new(vec![FeedItem::foreign("x"), FeedItem::owned("y")]));
    let clock = ManualClock::new();
    let mut locator = ElementLocator::new(profile.candidate.clone());
    let executor = ActionExecutor::new(profile, SettleDelays::none());

    let item = locator.locate_next(&view).await.unwrap().unwrap();
    let outcome = executor.execute(&view, &clock, &mut locator, &item).await;

    assert_eq!(outcome, ActionOutcome::SkippedNoPermission);
    let next = locator.locate_next(&view).await.unwrap().unwrap();
    assert_ne!(next, item);
    assert_eq!(next.element().as_str(), "item/y");
}

#[tokio::test]
async fn test_empty_feed_exhausts_without_processing() {
    let profile = ActionProfile::unlike();
    let view = MemoryView::new(&profile, FeedScript::default());
    let clock = ManualClock::new();
    let pacing = profile.default_pacing();
    let settle = profile.default_settle();

    let report = LoopOrchestrator::new(profile, pacing, settle)
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.processed, 0);
    assert_eq!(report.termination, Termination::Exhausted);
    // one load-more attempt, with its settle wait
    assert_eq!(clock.sleeps(), vec![ms(5000)]);
}

#[tokio::test]
async fn test_infinite_feed_stops_after_exactly_cap() {
    let profile = ActionProfile::delete();
    let script = FeedScript::default().paged(3).endless(|n| FeedItem::owned(format!("e{}", n)));
    let view = MemoryView::new(&profile, script);
    let clock = ManualClock::new();
    let pacing = Pacing::new(ms(2000), ms(60_000), ms(0), 25);

    let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.termination, Termination::SafetyCutoff);
    assert_eq!(report.processed, 25);
    assert_eq!(report.succeeded, 25);
    assert_eq!(view.completed().len(), 25);
}

#[tokio::test]
async fn test_feed_ending_exactly_at_cap_reports_exhausted() {
    let profile = ActionProfile::delete();
    let items = (0..3).map(|i| FeedItem::owned(format!("d{}", i))).collect();
    let view = MemoryView::new(&profile, FeedScript::new(items));
    let clock = ManualClock::new();
    let pacing = Pacing::new(ms(2000), ms(60_000), ms(0), 3);

    let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.termination, Termination::Exhausted);
}

#[tokio::test]
async fn test_config_file_drives_simulation() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "pacing:\n  base-delay-ms: 1500\n  jitter-max-ms: 0\nprofiles:\n  delete:\n    pacing:\n      hard-cap: 4"
    )
    .unwrap();

    let config = load_config(Some(&file.path().to_path_buf())).unwrap();
    let resolver = ConfigResolver::new(config);
    let settings = resolver.resolve(ProfileKind::Delete, &ConfigOverrides::none()).unwrap();
    assert_eq!(settings.pacing.hard_cap, 4);

    let scenario = Scenario {
        items: 10,
        ..Default::default()
    };
    let view = MemoryView::new(&settings.profile, scenario.script(ProfileKind::Delete));
    let clock = ManualClock::new();

    let report = LoopOrchestrator::new(settings.profile, settings.pacing, SettleDelays::none())
        .with_menu_rescan(settings.menu_rescan)
        .run(&view, &clock, &CancellationToken::new())
        .await;

    assert_eq!(report.termination, Termination::SafetyCutoff);
    assert_eq!(report.processed, 4);
    assert_eq!(non_zero(clock.sleeps()), vec![ms(1500); 3]);
}

#[tokio::test]
async fn test_cancel_mid_run_still_reports() {
    let profile = ActionProfile::unlike();
    let script = FeedScript::default().endless(|n| FeedItem::owned(format!("i{}", n)));
    let view = MemoryView::new(&profile, script);
    let cancel = CancellationToken::new();
    let pacing = Pacing::new(ms(5), ms(10), ms(0), 1_000_000);

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(50)).await;
        trigger.cancel();
    });

    let report = LoopOrchestrator::new(profile, pacing, SettleDelays::none())
        .run(&view, &feedsweep::pacing::TokioClock, &cancel)
        .await;

    assert_eq!(report.termination, Termination::Cancelled);
    assert!(report.processed > 0);
    assert!(report.processed < 1_000_000);
}
