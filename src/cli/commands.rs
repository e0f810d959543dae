//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: sweep a live browser tab
//! - simulate: sweep a generated in-memory feed
//! - show-config: print the resolved settings

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use feedsweep::config::ConfigOverrides;
use feedsweep::profile::ProfileKind;

/// Feedsweep - paced bulk actions over an infinitely scrolling feed
#[derive(Parser, Debug)]
#[command(name = "feedsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep a live browser tab over the DevTools protocol
    Run {
        /// Action profile (unlike, delete)
        #[arg(short, long)]
        profile: ProfileKind,

        /// DevTools websocket URL (defaults to browser.ws-url from config)
        #[arg(long)]
        ws_url: Option<String>,

        /// Attach to the first tab whose URL contains this text
        #[arg(long)]
        page_match: Option<String>,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sweep a generated in-memory feed
    Simulate {
        /// Action profile (unlike, delete)
        #[arg(short, long)]
        profile: ProfileKind,

        /// Number of scripted items
        #[arg(short = 'n', long, default_value_t = 20)]
        items: u64,

        /// Items rendered per page
        #[arg(long, default_value_t = 10)]
        page_size: usize,

        /// Every Nth item is someone else's (delete only)
        #[arg(long)]
        no_permission_every: Option<u64>,

        /// Every Nth item fails when triggered
        #[arg(long)]
        fail_every: Option<u64>,

        /// Keep generating items after the scripted ones
        #[arg(long)]
        infinite: bool,

        /// Sleep for real instead of on a manual clock
        #[arg(long)]
        realtime: bool,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration as YAML
    ShowConfig {
        /// Only this profile
        #[arg(short, long)]
        profile: Option<ProfileKind>,
    },
}

/// Per-run overrides shared by run and simulate.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Starting delay between actions (ms)
    #[arg(long)]
    pub base_delay_ms: Option<u64>,

    /// Ceiling for the escalated delay (ms)
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Upper bound of the random extra wait (ms)
    #[arg(long)]
    pub jitter_max_ms: Option<u64>,

    /// Maximum items processed in this run
    #[arg(long)]
    pub hard_cap: Option<u64>,

    /// Replace the profile's candidate selector
    #[arg(long)]
    pub candidate: Option<String>,

    /// Skip an item as soon as its menu lacks the delete entry
    #[arg(long)]
    pub no_menu_rescan: bool,
}

impl TuningArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides::builder()
            .base_delay_ms(self.base_delay_ms)
            .max_delay_ms(self.max_delay_ms)
            .jitter_max_ms(self.jitter_max_ms)
            .hard_cap(self.hard_cap)
            .candidate(self.candidate.clone())
            .menu_rescan(self.no_menu_rescan.then_some(false))
            .build()
    }
}
