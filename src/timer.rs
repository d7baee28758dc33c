use std::time::{Duration, Instant};
use thiserror::Error;

/// Default remaining budget, in milliseconds, below which a search aborts.
pub const DEFAULT_TIMEOUT_MS: f64 = 10.0;

/// The search ran out of time. Unwinds the whole search back to the
/// move-selection boundary, which is the only place that handles it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("search cancelled: time budget exhausted")]
pub struct SearchTimeout;

/// Checked on entry to every node of the search.
pub struct TimeGuard<'a> {
    time_left: &'a dyn Fn() -> f64,
    threshold: f64,
}

impl<'a> TimeGuard<'a> {
    pub fn new(time_left: &'a dyn Fn() -> f64, threshold: f64) -> Self {
        Self { time_left, threshold }
    }

    pub fn check(&self) -> Result<(), SearchTimeout> {
        if (self.time_left)() < self.threshold {
            Err(SearchTimeout)
        } else {
            Ok(())
        }
    }
}

/// A wall-clock budget that reports the milliseconds left.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self { start: Instant::now(), budget }
    }

    pub fn time_left(&self) -> f64 {
        self.budget.saturating_sub(self.start.elapsed()).as_secs_f64() * 1000.0
    }
}
