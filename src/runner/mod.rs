//! Sweep runner - the resilient action loop.
//!
//! - ElementLocator: finds the next candidate in the current view
//! - ActionExecutor: runs the per-item flow and reports an outcome
//! - ViewExpander: loads more content when the view runs dry
//! - LoopOrchestrator: drives the above until exhaustion, cap, or cancellation

mod executor;
mod expander;
mod locator;
mod orchestrator;

pub use executor::{ActionExecutor, FlowStep};
pub use expander::ViewExpander;
pub use locator::ElementLocator;
pub use orchestrator::LoopOrchestrator;
