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

use beltplan_encode::{backend::BackendStatus, stats::SearchStatistics};
use beltplan_model::{placement::BeltPlacement, solution::GridAssignment};
use beltplan_presolve::stats::ResolverStatistics;
use std::time::Duration;

/// The path that produced a layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PlanMethod {
    Heuristic,
    Exact,
}

impl std::fmt::Display for PlanMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanMethod::Heuristic => write!(f, "Heuristic"),
            PlanMethod::Exact => write!(f, "Exact"),
        }
    }
}

/// Statistics of every solving path that ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanStatistics {
    pub resolver: Option<ResolverStatistics>,
    pub search: Option<SearchStatistics>,
    pub exact_status: Option<BackendStatus>,
    pub time_total: Duration,
}

impl std::fmt::Display for PlanStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Planner Statistics:")?;
        if let Some(status) = self.exact_status {
            writeln!(f, "  Exact status:         {}", status)?;
        }
        writeln!(f, "  Total time:           {:.2?}", self.time_total)?;
        if let Some(resolver) = &self.resolver {
            write!(f, "{}", resolver)?;
        }
        if let Some(search) = &self.search {
            write!(f, "{}", search)?;
        }
        Ok(())
    }
}

/// A verified, conflict-free layout together with how it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanOutcome {
    assignment: GridAssignment,
    placements: Vec<BeltPlacement>,
    cost: f64,
    method: PlanMethod,
    statistics: PlanStatistics,
}

impl PlanOutcome {
    #[inline]
    pub fn new(
        assignment: GridAssignment,
        cost: f64,
        method: PlanMethod,
        statistics: PlanStatistics,
    ) -> Self {
        let placements = assignment.placements();
        Self {
            assignment,
            placements,
            cost,
            method,
            statistics,
        }
    }

    #[inline]
    pub fn assignment(&self) -> &GridAssignment {
        &self.assignment
    }

    #[inline]
    pub fn into_assignment(self) -> GridAssignment {
        self.assignment
    }

    /// The entities to place, one per occupied tile.
    #[inline]
    pub fn placements(&self) -> &[BeltPlacement] {
        &self.placements
    }

    /// Total cost under the planner's cost function, in-place discount applied.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    #[inline]
    pub fn method(&self) -> PlanMethod {
        self.method
    }

    #[inline]
    pub fn statistics(&self) -> &PlanStatistics {
        &self.statistics
    }
}

impl std::fmt::Display for PlanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PlanOutcome(method: {}, cost: {:.3}, lines: {}, placements: {})",
            self.method,
            self.cost,
            self.assignment.len(),
            self.placements.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_display_skips_paths_that_did_not_run() {
        let stats = PlanStatistics {
            resolver: Some(ResolverStatistics::default()),
            ..PlanStatistics::default()
        };
        let text = stats.to_string();
        assert!(text.starts_with("Planner Statistics:"));
        assert!(text.contains("Conflict Resolver Statistics:"));
        assert!(!text.contains("Search Backend Statistics:"));
        assert!(!text.contains("Exact status"));
    }

    #[test]
    fn test_statistics_display_with_exact_path() {
        let stats = PlanStatistics {
            search: Some(SearchStatistics::default()),
            exact_status: Some(BackendStatus::Optimal),
            ..PlanStatistics::default()
        };
        let text = stats.to_string();
        assert!(text.contains("Exact status:         Optimal"));
        assert!(text.contains("Search Backend Statistics:"));
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = PlanOutcome::new(
            GridAssignment::new(),
            0.0,
            PlanMethod::Heuristic,
            PlanStatistics::default(),
        );
        assert!(outcome.placements().is_empty());
        assert_eq!(
            outcome.to_string(),
            "PlanOutcome(method: Heuristic, cost: 0.000, lines: 0, placements: 0)"
        );
    }
}
