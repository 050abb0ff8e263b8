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
    monitor::resolver_monitor::{ResolverMonitor, SearchCommand},
    stats::ResolverStatistics,
};
use beltplan_model::{grid::BeltGrid, solution::Conflict};

/// Forwards every hook to each of its monitors, in insertion order.
#[derive(Default)]
pub struct CompositeMonitor<'a> {
    monitors: Vec<Box<dyn ResolverMonitor + 'a>>,
}

impl<'a> CompositeMonitor<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn from_vec(monitors: Vec<Box<dyn ResolverMonitor + 'a>>) -> Self {
        Self { monitors }
    }

    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: ResolverMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    #[inline]
    pub fn add_monitor_boxed(&mut self, monitor: Box<dyn ResolverMonitor + 'a>) {
        self.monitors.push(monitor);
    }

    #[inline]
    pub fn monitors(&self) -> &[Box<dyn ResolverMonitor + 'a>] {
        &self.monitors
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl<'a> FromIterator<Box<dyn ResolverMonitor + 'a>> for CompositeMonitor<'a> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ResolverMonitor + 'a>>,
    {
        Self {
            monitors: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for CompositeMonitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.monitors.iter()).finish()
    }
}

impl<'a> ResolverMonitor for CompositeMonitor<'a> {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter(&mut self, grid: &BeltGrid) {
        for m in &mut self.monitors {
            m.on_enter(grid);
        }
    }

    fn on_iteration(&mut self, conflicts: &[Conflict], statistics: &ResolverStatistics) {
        for m in &mut self.monitors {
            m.on_iteration(conflicts, statistics);
        }
    }

    fn on_exit(&mut self, statistics: &ResolverStatistics) {
        for m in &mut self.monitors {
            m.on_exit(statistics);
        }
    }

    fn search_command(&mut self, statistics: &ResolverStatistics) -> SearchCommand {
        for m in &mut self.monitors {
            match m.search_command(statistics) {
                SearchCommand::Continue => continue,
                // First terminate request wins.
                SearchCommand::Terminate(msg) => return SearchCommand::Terminate(msg),
            }
        }
        SearchCommand::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    struct Recording {
        name: &'static str,
        iterations: Rc<Cell<usize>>,
        command: SearchCommand,
    }

    impl ResolverMonitor for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn on_enter(&mut self, _grid: &BeltGrid) {}

        fn on_iteration(&mut self, _conflicts: &[Conflict], _statistics: &ResolverStatistics) {
            self.iterations.set(self.iterations.get() + 1);
        }

        fn on_exit(&mut self, _statistics: &ResolverStatistics) {}

        fn search_command(&mut self, _statistics: &ResolverStatistics) -> SearchCommand {
            self.command.clone()
        }
    }

    fn recording(name: &'static str, counter: &Rc<Cell<usize>>, command: SearchCommand) -> Recording {
        Recording {
            name,
            iterations: Rc::clone(counter),
            command,
        }
    }

    #[test]
    fn test_hooks_reach_every_monitor() {
        let counter = Rc::new(Cell::new(0));
        let mut composite = CompositeMonitor::with_capacity(2);
        composite.add_monitor(recording("a", &counter, SearchCommand::Continue));
        composite.add_monitor(recording("b", &counter, SearchCommand::Continue));
        assert_eq!(composite.len(), 2);

        composite.on_iteration(&[], &ResolverStatistics::default());
        assert_eq!(counter.get(), 2);
        assert_eq!(
            composite.search_command(&ResolverStatistics::default()),
            SearchCommand::Continue
        );
    }

    #[test]
    fn test_first_terminate_wins() {
        let counter = Rc::new(Cell::new(0));
        let composite: CompositeMonitor = [
            recording("a", &counter, SearchCommand::Continue),
            recording("b", &counter, SearchCommand::Terminate("b".to_string())),
            recording("c", &counter, SearchCommand::Terminate("c".to_string())),
        ]
        .into_iter()
        .map(|m| Box::new(m) as Box<dyn ResolverMonitor>)
        .collect();
        let mut composite = composite;
        assert_eq!(
            composite.search_command(&ResolverStatistics::default()),
            SearchCommand::Terminate("b".to_string())
        );
    }

    #[test]
    fn test_empty_composite_continues() {
        let mut composite = CompositeMonitor::new();
        assert!(composite.is_empty());
        assert_eq!(
            composite.search_command(&ResolverStatistics::default()),
            SearchCommand::Continue
        );
    }
}
