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

use std::time::Duration;

/// Statistics collected by `ConflictResolver` during one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolverStatistics {
    /// Conflict scans performed.
    pub iterations: u64,
    /// Lines solved by the dynamic program, initial solves included.
    pub line_solves: u64,
    /// Penalty escalations applied.
    pub penalty_updates: u64,
    /// Conflicts found over all scans.
    pub conflicts_seen: u64,
    /// Conflicts found by the most recent scan.
    pub last_conflicts: u64,
    /// Total time spent in the resolver.
    pub time_total: Duration,
}

impl ResolverStatistics {
    #[inline]
    pub fn on_iteration(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    #[inline]
    pub fn on_line_solved(&mut self) {
        self.line_solves = self.line_solves.saturating_add(1);
    }

    #[inline]
    pub fn on_penalty_update(&mut self) {
        self.penalty_updates = self.penalty_updates.saturating_add(1);
    }

    #[inline]
    pub fn on_conflicts(&mut self, count: usize) {
        self.last_conflicts = count as u64;
        self.conflicts_seen = self.conflicts_seen.saturating_add(count as u64);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }
}

impl std::fmt::Display for ResolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Conflict Resolver Statistics:")?;
        writeln!(f, "  Iterations:           {}", self.iterations)?;
        writeln!(f, "  Line solves:          {}", self.line_solves)?;
        writeln!(f, "  Penalty updates:      {}", self.penalty_updates)?;
        writeln!(f, "  Conflicts seen:       {}", self.conflicts_seen)?;
        writeln!(f, "  Conflicts left:       {}", self.last_conflicts)?;
        writeln!(f, "  Total time:           {:.2?}", self.time_total)?;
        Ok(())
    }
}
