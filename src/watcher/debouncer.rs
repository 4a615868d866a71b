//! Per-path deadlines for modify events.
//!
//! Every modify on a catalog directory is a full teardown and recreate, so a
//! run of modifies on one path is delivered once, after the path has been
//! quiet for the configured period.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Pending paths keyed to the instant they become deliverable.
///
/// Time is passed in by the caller; the debouncer never reads the clock.
#[derive(Debug)]
pub struct Debouncer {
    deadlines: HashMap<PathBuf, Instant>,
    quiet: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            deadlines: HashMap::new(),
            quiet: Duration::from_millis(debounce_ms),
        }
    }

    /// Push the deadline of `path` to `at` plus the quiet period.
    pub fn record(&mut self, path: PathBuf, at: Instant) {
        self.deadlines.insert(path, at + self.quiet);
    }

    /// Drop `path` without delivering it. Returns whether it was pending.
    pub fn cancel(&mut self, path: &Path) -> bool {
        self.deadlines.remove(path).is_some()
    }

    /// Remove and return, sorted, every path whose deadline is at or before `now`.
    pub fn take_ready(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready: Vec<PathBuf> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        for path in &ready {
            self.deadlines.remove(path);
        }
        ready.sort();
        ready
    }

    /// Forget everything pending; returns how many paths were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.deadlines.len();
        self.deadlines.clear();
        dropped
    }
}
