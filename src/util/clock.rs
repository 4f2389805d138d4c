//! Time sources for the event loop.
//!
//! Scheduler time is a [`Duration`] measured from the scheduler's start, so
//! log lines, CSV rows and event due times all share one origin.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of scheduler time and the loop's only way to block.
pub trait Clock {
    /// Time elapsed since the scheduler started.
    fn now(&self) -> Duration;
    /// Block until `deadline` has been reached. Returns immediately if it has.
    fn sleep_until(&self, deadline: Duration);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Manually driven clock. Sleeping jumps straight to the deadline.
///
/// Clones share the same time, so a test can keep one handle while the
/// event loop owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    nanos: Arc<AtomicU64>,
}

impl SimulatedClock {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(as_nanos(by), Ordering::SeqCst);
    }
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for SimulatedClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep_until(&self, deadline: Duration) {
        self.nanos.fetch_max(as_nanos(deadline), Ordering::SeqCst);
    }
}
