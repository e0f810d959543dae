//! The view port: the only boundary the sweep core talks to.
//!
//! A view is a dynamically rendered, partially loaded list of items that can
//! be queried, triggered and mutated. Implementations:
//! - `MemoryView`: scripted in-memory feed (tests, `simulate`)
//! - `CdpView`: a live browser tab over the DevTools protocol (feature `cdp`)

mod memory;
mod traits;

#[cfg(feature = "cdp")]
mod cdp;

pub use memory::{ConfirmSurface, FeedItem, FeedScript, InjectedFault, MemoryView, ViewEvent};
pub use traits::{Scope, Selector, View, ViewError};

#[cfg(feature = "cdp")]
pub use cdp::CdpView;
