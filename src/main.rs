use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod cli;

use cli::Cli;
use cli::commands::{Commands, TuningArgs};
use feedsweep::config::{self, ConfigResolver, SweepConfig, SweepSettings};
use feedsweep::domain::{RunReport, Termination};
use feedsweep::pacing::{Clock, ManualClock, TokioClock};
use feedsweep::profile::ProfileKind;
use feedsweep::runner::LoopOrchestrator;
use feedsweep::simulate::Scenario;
use feedsweep::view::{MemoryView, View};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedsweep")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("feedsweep.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if verbose && std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: SweepConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let resolver = ConfigResolver::new(config);

    match &cli.command {
        Commands::Run {
            profile,
            ws_url,
            page_match,
            tuning,
            json,
        } => handle_run_command(&resolver, *profile, ws_url.as_deref(), page_match.as_deref(), tuning, *json).await,
        Commands::Simulate {
            profile,
            items,
            page_size,
            no_permission_every,
            fail_every,
            infinite,
            realtime,
            tuning,
            json,
        } => {
            let scenario = Scenario {
                items: *items,
                page_size: *page_size,
                no_permission_every: *no_permission_every,
                fail_every: *fail_every,
                infinite: *infinite,
            };
            handle_simulate_command(&resolver, *profile, &scenario, *realtime, tuning, *json).await
        }
        Commands::ShowConfig { profile } => handle_show_config_command(&resolver, *profile),
    }
}

#[cfg(feature = "cdp")]
async fn handle_run_command(
    resolver: &ConfigResolver,
    kind: ProfileKind,
    ws_url: Option<&str>,
    page_match: Option<&str>,
    tuning: &TuningArgs,
    json: bool,
) -> Result<()> {
    use feedsweep::view::CdpView;

    let settings = resolver.resolve(kind, &tuning.to_overrides())?;
    let browser = &resolver.config().browser;
    let ws_url = ws_url
        .map(str::to_string)
        .or_else(|| browser.ws_url.clone())
        .ok_or_else(|| eyre::eyre!("No DevTools URL: pass --ws-url or set browser.ws-url"))?;
    let page_match = page_match.map(str::to_string).or_else(|| browser.page_match.clone());

    info!("Connecting to {}", ws_url);
    println!("{} {}", "Connecting:".cyan(), ws_url);
    let view = CdpView::connect(&ws_url, page_match.as_deref())
        .await
        .context("Failed to attach to the browser")?;

    let report = sweep(settings, &view, &TokioClock).await;
    print_report(&report, json)
}

#[cfg(not(feature = "cdp"))]
async fn handle_run_command(
    _resolver: &ConfigResolver,
    _kind: ProfileKind,
    _ws_url: Option<&str>,
    _page_match: Option<&str>,
    _tuning: &TuningArgs,
    _json: bool,
) -> Result<()> {
    eyre::bail!("feedsweep was built without the `cdp` feature; rebuild with --features cdp")
}

async fn handle_simulate_command(
    resolver: &ConfigResolver,
    kind: ProfileKind,
    scenario: &Scenario,
    realtime: bool,
    tuning: &TuningArgs,
    json: bool,
) -> Result<()> {
    let settings = resolver.resolve(kind, &tuning.to_overrides())?;
    info!("Simulating {} sweep over {:?}", kind, scenario);

    let view = MemoryView::new(&settings.profile, scenario.script(kind));
    let report = if realtime {
        sweep(settings, &view, &TokioClock).await
    } else {
        sweep(settings, &view, &ManualClock::new()).await
    };
    print_report(&report, json)
}

fn handle_show_config_command(resolver: &ConfigResolver, kind: Option<ProfileKind>) -> Result<()> {
    let yaml = match kind {
        Some(kind) => {
            let settings = resolver.resolve(kind, &config::ConfigOverrides::none())?;
            serde_yaml::to_string(&settings.to_profile_config())?
        }
        None => serde_yaml::to_string(&resolver.effective()?)?,
    };
    print!("{}", yaml);
    Ok(())
}

/// Run one sweep, cancelling it on Ctrl-C.
async fn sweep<V, C>(settings: SweepSettings, view: &V, clock: &C) -> RunReport
where
    V: View + ?Sized,
    C: Clock + ?Sized,
{
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping after the current item");
            on_signal.cancel();
        }
    });

    let orchestrator = LoopOrchestrator::new(settings.profile, settings.pacing, settings.settle)
        .with_menu_rescan(settings.menu_rescan);
    let report = orchestrator.run(view, clock, &cancel).await;

    signal_task.abort();
    report
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    let termination = match report.termination {
        Termination::Exhausted => report.termination.to_string().green(),
        Termination::SafetyCutoff => report.termination.to_string().yellow(),
        Termination::Cancelled => report.termination.to_string().red(),
    };
    println!("{} {} sweep {}", "Done:".green().bold(), report.profile, termination);
    println!("  processed:  {}", report.processed);
    println!("  succeeded:  {}", report.succeeded.to_string().green());
    println!(
        "  skipped:    {} (no permission {}, no confirmation {})",
        report.skipped(),
        report.skipped_no_permission,
        report.skipped_no_confirmation
    );
    if report.failed > 0 {
        println!("  failed:     {}", report.failed.to_string().red());
    } else {
        println!("  failed:     0");
    }
    println!("  expansions: {}", report.expansions);
    println!("  last delay: {}ms", report.final_delay_ms);
    println!("  elapsed:    {}ms", report.elapsed_ms);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging first
    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load configuration
    let config = config::load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
