//! Time-gated execution for the cooperative loop.
//!
//! Sections of the loop that should run "every N ms" keep an [`IntervalTimer`]
//! and ask it on every pass. Between runs nothing happens.

use jg_core::elapsed_ms;

/// Tracks when a periodic section last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    /// Interval [ms]
    pub interval_ms: u32,
    /// Timestamp of the last run [ms]
    pub last_run_ms: u32,
}

impl IntervalTimer {
    /// Create a timer whose first run is due `interval_ms` after `now_ms`.
    pub fn new(interval_ms: u32, now_ms: u32) -> Self {
        Self {
            interval_ms,
            last_run_ms: now_ms,
        }
    }

    /// Check if the section is due at `now_ms`.
    pub fn should_run(&self, now_ms: u32) -> bool {
        elapsed_ms(now_ms, self.last_run_ms) >= self.interval_ms
    }

    /// Record a run at `now_ms`.
    pub fn mark(&mut self, now_ms: u32) {
        self.last_run_ms = now_ms;
    }

    /// Returns `true` and records the run if the section is due.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.should_run(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }

    /// Time left until the next run [ms].
    pub fn time_until_run(&self, now_ms: u32) -> u32 {
        self.interval_ms
            .saturating_sub(elapsed_ms(now_ms, self.last_run_ms))
    }
}
