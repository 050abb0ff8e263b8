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

use crate::stats::ResolverStatistics;
use beltplan_model::solution::GridAssignment;

/// A conflict-free assignment found by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverOutcome<C> {
    assignment: GridAssignment,
    cost: C,
    statistics: ResolverStatistics,
}

impl<C> ResolverOutcome<C>
where
    C: Copy,
{
    #[inline]
    pub fn new(assignment: GridAssignment, cost: C, statistics: ResolverStatistics) -> Self {
        Self {
            assignment,
            cost,
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

    /// The cost of the assignment without conflict penalties.
    #[inline]
    pub fn cost(&self) -> C {
        self.cost
    }

    #[inline]
    pub fn statistics(&self) -> &ResolverStatistics {
        &self.statistics
    }

    /// Conflict scans it took, the final conflict-free one included.
    #[inline]
    pub fn iterations(&self) -> u64 {
        self.statistics.iterations
    }
}

impl<C> std::fmt::Display for ResolverOutcome<C>
where
    C: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ResolverOutcome(lines: {}, cost: {}, iterations: {})",
            self.assignment.len(),
            self.cost,
            self.statistics.iterations
        )
    }
}
