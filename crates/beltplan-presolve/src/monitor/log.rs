// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    monitor::resolver_monitor::ResolverMonitor, stats::ResolverStatistics,
};
use beltplan_model::{grid::BeltGrid, solution::Conflict};
use std::time::{Duration, Instant};

/// Reports resolver progress as `tracing` events.
///
/// One `info` event when the run starts and ends, and one per iteration once
/// at least `log_interval` has passed since the previous report.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
}

impl LogMonitor {
    pub fn new(log_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_log_time: now,
            log_interval,
        }
    }

    #[inline]
    pub fn log_interval(&self) -> Duration {
        self.log_interval
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl std::fmt::Display for LogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LogMonitor(log_interval: {:?})", self.log_interval)
    }
}

impl ResolverMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter(&mut self, grid: &BeltGrid) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        tracing::info!(
            lines = grid.num_lines(),
            cells = grid.num_cells(),
            "conflict resolution started"
        );
    }

    fn on_iteration(&mut self, conflicts: &[Conflict], statistics: &ResolverStatistics) {
        let now = Instant::now();
        if now.duration_since(self.last_log_time) < self.log_interval {
            return;
        }
        tracing::info!(
            iteration = statistics.iterations,
            conflicts = conflicts.len(),
            line_solves = statistics.line_solves,
            penalty_updates = statistics.penalty_updates,
            elapsed = ?now.duration_since(self.start_time),
            "conflict resolution progress"
        );
        self.last_log_time = now;
    }

    fn on_exit(&mut self, statistics: &ResolverStatistics) {
        tracing::info!(
            iterations = statistics.iterations,
            line_solves = statistics.line_solves,
            conflicts_left = statistics.last_conflicts,
            elapsed = ?self.start_time.elapsed(),
            "conflict resolution finished"
        );
    }
}
