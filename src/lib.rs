//! Feedsweep - paced bulk actions over an infinitely scrolling feed
//!
//! A single sequential loop locates the next actionable item in a live view,
//! runs a profile's UI flow on it (unlike, or menu -> delete -> confirm),
//! and waits an adaptive, jittered delay before the next one. The view loads
//! more content on demand; the run ends when the feed is exhausted, a hard
//! cap is reached, or the caller cancels.

pub mod config;
pub mod domain;
pub mod error;
pub mod pacing;
pub mod profile;
pub mod runner;
pub mod simulate;
pub mod view;

pub use error::{Result, SweepError};
