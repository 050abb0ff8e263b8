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

/// A monitor that does nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpMonitor;

impl NoOpMonitor {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl ResolverMonitor for NoOpMonitor {
    fn name(&self) -> &str {
        "NoOpMonitor"
    }

    fn on_enter(&mut self, _grid: &BeltGrid) {}

    fn on_iteration(&mut self, _conflicts: &[Conflict], _statistics: &ResolverStatistics) {}

    fn on_exit(&mut self, _statistics: &ResolverStatistics) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::resolver_monitor::SearchCommand;

    #[test]
    fn test_no_op_monitor_always_continues() {
        let mut monitor = NoOpMonitor::new();
        let stats = ResolverStatistics::default();
        monitor.on_enter(&BeltGrid::new());
        monitor.on_iteration(&[], &stats);
        assert_eq!(monitor.search_command(&stats), SearchCommand::Continue);
        let dynamic: &dyn ResolverMonitor = &monitor;
        assert_eq!(format!("{:?}", dynamic), "ResolverMonitor(NoOpMonitor)");
    }
}
