//! Time source and suspension primitive.
//!
//! Timed waits are the only yield points of a run, so everything that waits
//! goes through a `Clock`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` returns immediately, advances time and records the wait.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    inner: Mutex<ManualClockState>,
}

#[derive(Debug, Default)]
struct ManualClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            inner: Mutex::new(ManualClockState::default()),
        }
    }

    /// Total virtual time slept so far.
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().map(|s| s.elapsed).unwrap_or_default()
    }

    /// Every wait requested, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().map(|s| s.sleeps.clone()).unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.inner.lock() {
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
