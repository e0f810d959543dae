//! Domain types for Feedsweep
//!
//! - ElementRef / ItemRef: transient handles into the view
//! - ActionOutcome: result of acting on one item
//! - LoopState / LoopPhase: counters and state machine of a run
//! - RunReport / Termination: what a finished run reports back

pub mod item;
pub mod outcome;
pub mod report;
pub mod state;

pub use item::{ElementRef, ItemRef};
pub use outcome::ActionOutcome;
pub use report::{RunReport, Termination};
pub use state::{LoopPhase, LoopState};
