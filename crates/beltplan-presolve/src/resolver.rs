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

//! # Conflict Resolver
//!
//! Turns independently solved lines into one conflict-free assignment.
//!
//! ## Loop
//!
//! 1. Solve every line on its own with `LineDp`.
//! 2. Scan the assignment for conflicts: tiles claimed by more than one line,
//!    and tunnel ends buried inside a same-tier tunnel of another line on the
//!    same axis. Stop if there are none.
//! 3. Escalate the penalty of every conflicted tile and mark every line
//!    involved. Interference escalates the tunnel penalty of its tier on the
//!    buried tile and on both ends of the tunnel, and marks the tunnel's line
//!    too.
//! 4. Re-solve the marked lines against the escalated penalties and go to 2.
//!
//! All lines of one batch are priced from the same penalty table; it is only
//! written between batches. Running out of iterations is an error; no
//! partial layout is ever returned.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::geometry::{Direction, TilePosition};
//! use beltplan_model::{
//!     cost::TierCostFunction,
//!     grid::BeltGrid,
//!     index::TierIndex,
//!     line::{BeltLine, LineTile},
//!     tier::TierCatalog,
//! };
//! use beltplan_presolve::{
//!     monitor::no_op::NoOpMonitor,
//!     resolver::{ConflictResolver, ResolverConfig},
//! };
//!
//! let catalog = TierCatalog::vanilla();
//! let line = BeltLine::new(
//!     TilePosition::new(0, 0),
//!     Direction::East,
//!     vec![LineTile::open([TierIndex::new(0)]); 4],
//! )
//! .unwrap();
//! let mut grid = BeltGrid::new();
//! grid.add_line(&line, &catalog).unwrap();
//!
//! let cost_fn = TierCostFunction::from_catalog(&catalog);
//! let resolver = ConflictResolver::<f64, _, _>::new(&catalog, &cost_fn, ResolverConfig::default());
//! let outcome = resolver.resolve(&grid, &mut NoOpMonitor::new()).unwrap();
//! assert!(outcome.assignment().is_conflict_free());
//! assert_eq!(outcome.cost(), 4.0);
//! ```

use crate::{
    dp::LineDp,
    error::PresolveError,
    monitor::resolver_monitor::{ResolverMonitor, SearchCommand},
    problem::{LineProblem, PenaltyTable, assignment_cost},
    result::ResolverOutcome,
    stats::ResolverStatistics,
};
use beltplan_core::num::{CostNumeric, cost_from_f64};
use beltplan_model::{
    cost::CostFunction,
    grid::BeltGrid,
    index::LineId,
    solution::{ConflictKind, GridAssignment, LineAssignment},
    tier::BeltCatalog,
};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, time::Instant};

/// Tuning of the penalty loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Penalty a tile receives on its first conflict. Must be positive.
    pub initial_penalty: f64,
    /// Growth of a tile's penalty on every further conflict. Must exceed 1.
    pub penalty_multiplier: f64,
    /// Price factor of a piece matching the existing entity, in `[0, 1]`.
    pub in_place_discount: f64,
    /// Conflict scans before giving up. Must be positive.
    pub max_iterations: usize,
}

impl ResolverConfig {
    pub const DEFAULT_INITIAL_PENALTY: f64 = 2.0;
    pub const DEFAULT_PENALTY_MULTIPLIER: f64 = 1.5;
    pub const DEFAULT_IN_PLACE_DISCOUNT: f64 = 0.9;
    pub const DEFAULT_MAX_ITERATIONS: usize = 100;

    #[inline]
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::new()
    }

    /// Rejects settings the loop cannot work with.
    pub fn validate(&self) -> Result<(), PresolveError> {
        if !(self.initial_penalty.is_finite() && self.initial_penalty > 0.0) {
            return Err(PresolveError::InvalidConfig {
                field: "initial_penalty",
                value: self.initial_penalty.to_string(),
                expected: "a finite value > 0",
            });
        }
        if !(self.penalty_multiplier.is_finite() && self.penalty_multiplier > 1.0) {
            return Err(PresolveError::InvalidConfig {
                field: "penalty_multiplier",
                value: self.penalty_multiplier.to_string(),
                expected: "a finite value > 1",
            });
        }
        if !(0.0..=1.0).contains(&self.in_place_discount) {
            return Err(PresolveError::InvalidConfig {
                field: "in_place_discount",
                value: self.in_place_discount.to_string(),
                expected: "a value in [0, 1]",
            });
        }
        if self.max_iterations == 0 {
            return Err(PresolveError::InvalidConfig {
                field: "max_iterations",
                value: self.max_iterations.to_string(),
                expected: "a value > 0",
            });
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            initial_penalty: Self::DEFAULT_INITIAL_PENALTY,
            penalty_multiplier: Self::DEFAULT_PENALTY_MULTIPLIER,
            in_place_discount: Self::DEFAULT_IN_PLACE_DISCOUNT,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl std::fmt::Display for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ResolverConfig(initial_penalty: {}, penalty_multiplier: {}, in_place_discount: {}, max_iterations: {})",
            self.initial_penalty, self.penalty_multiplier, self.in_place_discount, self.max_iterations
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn initial_penalty(mut self, value: f64) -> Self {
        self.config.initial_penalty = value;
        self
    }

    #[inline]
    pub fn penalty_multiplier(mut self, value: f64) -> Self {
        self.config.penalty_multiplier = value;
        self
    }

    #[inline]
    pub fn in_place_discount(mut self, value: f64) -> Self {
        self.config.in_place_discount = value;
        self
    }

    #[inline]
    pub fn max_iterations(mut self, value: usize) -> Self {
        self.config.max_iterations = value;
        self
    }

    pub fn build(self) -> Result<ResolverConfig, PresolveError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The heuristic solver: line dynamic programs tied together by tile penalties.
#[derive(Debug)]
pub struct ConflictResolver<'a, C, B, F>
where
    B: ?Sized,
    F: ?Sized,
{
    catalog: &'a B,
    cost_fn: &'a F,
    config: ResolverConfig,
    _phantom: PhantomData<C>,
}

impl<'a, C, B, F> ConflictResolver<'a, C, B, F>
where
    C: CostNumeric,
    B: BeltCatalog + ?Sized,
    F: CostFunction<C> + ?Sized,
{
    #[inline]
    pub fn new(catalog: &'a B, cost_fn: &'a F, config: ResolverConfig) -> Self {
        Self {
            catalog,
            cost_fn,
            config,
            _phantom: PhantomData,
        }
    }

    #[inline]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Solves every line of `grid` and resolves their conflicts.
    pub fn resolve<M>(
        &self,
        grid: &BeltGrid,
        monitor: &mut M,
    ) -> Result<ResolverOutcome<C>, PresolveError>
    where
        M: ResolverMonitor + ?Sized,
    {
        self.run(grid, GridAssignment::new(), monitor)
    }

    /// Resolves the conflicts of an existing assignment.
    ///
    /// Lines of `grid` missing from `assignment` are solved first. A complete,
    /// conflict-free assignment is returned unchanged after one scan.
    pub fn resolve_from<M>(
        &self,
        grid: &BeltGrid,
        assignment: GridAssignment,
        monitor: &mut M,
    ) -> Result<ResolverOutcome<C>, PresolveError>
    where
        M: ResolverMonitor + ?Sized,
    {
        self.run(grid, assignment, monitor)
    }

    fn run<M>(
        &self,
        grid: &BeltGrid,
        assignment: GridAssignment,
        monitor: &mut M,
    ) -> Result<ResolverOutcome<C>, PresolveError>
    where
        M: ResolverMonitor + ?Sized,
    {
        self.config.validate()?;
        grid.validate()?;

        let start_time = Instant::now();
        let mut statistics = ResolverStatistics::default();
        monitor.on_enter(grid);

        let result = self.resolve_conflicts(grid, assignment, monitor, &mut statistics);

        statistics.set_total_time(start_time.elapsed());
        monitor.on_exit(&statistics);

        match result {
            Ok(assignment) => {
                let discount: C = cost_from_f64(self.config.in_place_discount);
                let cost = assignment_cost(grid, &assignment, self.cost_fn, discount);
                tracing::info!(
                    lines = assignment.len(),
                    iterations = statistics.iterations,
                    line_solves = statistics.line_solves,
                    cost = %cost,
                    "conflict resolution converged"
                );
                Ok(ResolverOutcome::new(assignment, cost, statistics))
            }
            Err(err) => {
                tracing::warn!(
                    iterations = statistics.iterations,
                    conflicts = statistics.last_conflicts,
                    error = %err,
                    "conflict resolution failed"
                );
                Err(err)
            }
        }
    }

    fn resolve_conflicts<M>(
        &self,
        grid: &BeltGrid,
        mut assignment: GridAssignment,
        monitor: &mut M,
        statistics: &mut ResolverStatistics,
    ) -> Result<GridAssignment, PresolveError>
    where
        M: ResolverMonitor + ?Sized,
    {
        let discount: C = cost_from_f64(self.config.in_place_discount);
        let mut penalties = PenaltyTable::new(
            cost_from_f64(self.config.initial_penalty),
            cost_from_f64(self.config.penalty_multiplier),
            discount,
        );
        let mut dp = LineDp::new();

        for line in assignment.lines() {
            grid.line(line.line_id())?;
        }
        let missing: Vec<LineId> = grid
            .lines()
            .map(|(id, _)| id)
            .filter(|&id| assignment.get(id).is_none())
            .collect();
        for id in missing {
            let line = self.solve_line(grid, id, &penalties, discount, &mut dp, statistics)?;
            assignment.insert(line);
        }

        let capacity = grid
            .lines()
            .map(|(id, _)| id.get() as usize + 1)
            .max()
            .unwrap_or(0);
        let mut marked = FixedBitSet::with_capacity(capacity);
        let mut shared = FxHashSet::default();
        let mut tunnels = FxHashSet::default();

        loop {
            statistics.on_iteration();
            let conflicts = assignment.conflicts();
            statistics.on_conflicts(conflicts.len());
            monitor.on_iteration(&conflicts, statistics);

            if conflicts.is_empty() {
                return Ok(assignment);
            }
            let iterations = statistics.iterations as usize;
            if iterations >= self.config.max_iterations {
                return Err(PresolveError::NonConvergence {
                    iterations,
                    conflicts: conflicts.len(),
                });
            }
            if let SearchCommand::Terminate(reason) = monitor.search_command(statistics) {
                return Err(PresolveError::Aborted { reason, iterations });
            }

            marked.clear();
            shared.clear();
            tunnels.clear();
            for conflict in &conflicts {
                // At most one escalation per tile and kind per iteration.
                match conflict.kind {
                    ConflictKind::SharedTile => {
                        if shared.insert(conflict.tile) {
                            penalties.escalate_shared(conflict.tile);
                            statistics.on_penalty_update();
                        }
                    }
                    ConflictKind::TunnelInterference {
                        tier, entry, exit, ..
                    } => {
                        // The buried end and both ends of the tunnel over it.
                        for tile in [conflict.tile, entry, exit] {
                            if tunnels.insert((tile, tier)) {
                                penalties.escalate_tunnel(tile, tier);
                                statistics.on_penalty_update();
                            }
                        }
                    }
                }
                for id in &conflict.lines {
                    let bit = id.get() as usize;
                    marked.grow(bit + 1);
                    marked.insert(bit);
                }
            }
            tracing::debug!(
                iteration = iterations,
                conflicts = conflicts.len(),
                lines = marked.count_ones(..),
                "re-solving conflicted lines"
            );

            let mut batch = Vec::with_capacity(marked.count_ones(..));
            for (id, _) in grid.lines() {
                if marked.contains(id.get() as usize) {
                    batch.push(self.solve_line(grid, id, &penalties, discount, &mut dp, statistics)?);
                }
            }
            for line in batch {
                assignment.insert(line);
            }
        }
    }

    fn solve_line(
        &self,
        grid: &BeltGrid,
        line_id: LineId,
        penalties: &PenaltyTable<C>,
        discount: C,
        dp: &mut LineDp<C>,
        statistics: &mut ResolverStatistics,
    ) -> Result<LineAssignment, PresolveError> {
        let problem =
            LineProblem::from_grid(grid, line_id, self.catalog, self.cost_fn, penalties, discount)?;
        let solution = dp.solve(&problem)?;
        statistics.on_line_solved();
        tracing::debug!(line = %line_id, cost = %solution.cost(), "solved line");
        Ok(solution.into_assignment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{interrupt::InterruptMonitor, no_op::NoOpMonitor};
    use beltplan_core::geometry::{Direction, TilePosition};
    use beltplan_encode::{
        backend::{BackendStatus, ConstraintBackend, SearchLimits},
        encoder::GridEncoder,
        search::SearchBackend,
    };
    use beltplan_model::{
        belt_type::BeltType,
        cost::TierCostFunction,
        index::{TierIndex, line_id},
        line::{BeltLine, LineTile},
        tier::{BeltTier, TierCatalog},
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::AtomicBool;

    const T0: TierIndex = TierIndex::new(0);
    const T1: TierIndex = TierIndex::new(1);

    fn catalog(max_tunnel_distance: usize) -> TierCatalog {
        TierCatalog::builder()
            .tier(BeltTier::new(
                "basic",
                "belt",
                "underground",
                max_tunnel_distance,
                1.0,
                2.5,
            ))
            .build()
            .unwrap()
    }

    fn costs(belt_type: BeltType, _: TilePosition, _: Direction) -> f64 {
        if belt_type.is_underground() { 2.5 } else { 1.0 }
    }

    fn crossing(catalog: &TierCatalog, horizontal_tiles: Vec<LineTile>) -> BeltGrid {
        let horizontal =
            BeltLine::new(TilePosition::new(0, 1), Direction::East, horizontal_tiles).unwrap();
        let vertical = BeltLine::new(
            TilePosition::new(1, 0),
            Direction::South,
            vec![LineTile::open([T0]); 3],
        )
        .unwrap();
        let mut grid = BeltGrid::new();
        grid.add_line(&horizontal, catalog).unwrap();
        grid.add_line(&vertical, catalog).unwrap();
        grid
    }

    fn resolve(
        grid: &BeltGrid,
        catalog: &TierCatalog,
        config: ResolverConfig,
    ) -> Result<ResolverOutcome<f64>, PresolveError> {
        ConflictResolver::new(catalog, &costs, config).resolve(grid, &mut NoOpMonitor::new())
    }

    #[test]
    fn test_config_defaults_and_validation() {
        let config = ResolverConfig::default();
        assert_eq!(config.initial_penalty, 2.0);
        assert_eq!(config.max_iterations, 100);
        config.validate().unwrap();

        let err = ResolverConfig::builder()
            .penalty_multiplier(1.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PresolveError::InvalidConfig {
                field: "penalty_multiplier",
                ..
            }
        ));
        assert!(ResolverConfig::builder().in_place_discount(1.5).build().is_err());
        assert!(ResolverConfig::builder().initial_penalty(0.0).build().is_err());
        assert!(ResolverConfig::builder().max_iterations(0).build().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{ "max_iterations": 7, "in_place_discount": 0.5 }"#).unwrap();
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.in_place_discount, 0.5);
        assert_eq!(config.penalty_multiplier, 1.5);
        assert!(serde_json::from_str::<ResolverConfig>(r#"{ "typo": 1 }"#).is_err());
    }

    #[test]
    fn test_single_line_converges_immediately() {
        let catalog = catalog(5);
        let line = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![LineTile::open([T0]); 6],
        )
        .unwrap();
        let mut grid = BeltGrid::new();
        grid.add_line(&line, &catalog).unwrap();

        let outcome = resolve(&grid, &catalog, ResolverConfig::default()).unwrap();
        assert_eq!(outcome.iterations(), 1);
        assert_eq!(outcome.statistics().line_solves, 1);
        // entry at 0, exit at 5
        assert!((outcome.cost() - 5.0).abs() < 1e-9);
        outcome.assignment().verify(&grid, &catalog).unwrap();
    }

    #[test]
    fn test_crossing_lines_are_separated() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let outcome = resolve(&grid, &catalog, ResolverConfig::default()).unwrap();

        assert!(outcome.assignment().is_conflict_free());
        outcome.assignment().verify(&grid, &catalog).unwrap();
        assert!(outcome.iterations() > 1);
        assert!(outcome.statistics().penalty_updates > 0);
        // never below the exact optimum of one belt line and one tunnel
        assert!(outcome.cost() >= 8.0 - 1e-9);
    }

    #[test]
    fn test_reserved_tile_is_left_to_its_line() {
        let catalog = catalog(4);
        let mut horizontal = vec![LineTile::open([T0]); 3];
        horizontal[1] = LineTile::open([T0]).with_must_match(BeltType::belt(T0));
        let grid = crossing(&catalog, horizontal);
        assert_eq!(
            grid.only_usable_by(TilePosition::new(1, 1)),
            Some(line_id(1).unwrap())
        );

        let outcome = resolve(&grid, &catalog, ResolverConfig::default()).unwrap();
        assert_eq!(outcome.iterations(), 1);
        assert!((outcome.cost() - 8.0).abs() < 1e-9);

        let vertical = outcome.assignment().get(line_id(2).unwrap()).unwrap();
        assert_eq!(vertical.tile(0), Some(BeltType::entry(T0)));
        assert_eq!(vertical.tile(1), None);
        assert_eq!(vertical.tile(2), Some(BeltType::exit(T0)));
    }

    #[test]
    fn test_resolve_from_is_idempotent() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let resolver = ConflictResolver::<f64, _, _>::new(&catalog, &costs, ResolverConfig::default());
        let first = resolver.resolve(&grid, &mut NoOpMonitor::new()).unwrap();

        let again = resolver
            .resolve_from(&grid, first.assignment().clone(), &mut NoOpMonitor::new())
            .unwrap();
        assert_eq!(again.assignment(), first.assignment());
        assert_eq!(again.iterations(), 1);
        assert_eq!(again.statistics().penalty_updates, 0);
        assert_eq!(again.statistics().line_solves, 0);
        assert_eq!(again.cost(), first.cost());
    }

    #[test]
    fn test_resolve_from_completes_missing_lines() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let outcome = ConflictResolver::<f64, _, _>::new(&catalog, &costs, ResolverConfig::default())
            .resolve_from(&grid, GridAssignment::new(), &mut NoOpMonitor::new())
            .unwrap();
        assert_eq!(outcome.assignment().len(), 2);
        assert!(outcome.assignment().is_conflict_free());
    }

    #[test]
    fn test_resolve_from_rejects_foreign_lines() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let foreign: GridAssignment = [LineAssignment::new(
            line_id(9).unwrap(),
            TilePosition::new(5, 5),
            Direction::East,
            vec![Some(BeltType::belt(T0))],
        )]
        .into_iter()
        .collect();
        let err = ConflictResolver::<f64, _, _>::new(&catalog, &costs, ResolverConfig::default())
            .resolve_from(&grid, foreign, &mut NoOpMonitor::new())
            .unwrap_err();
        assert!(matches!(err, PresolveError::Model(_)));
    }

    #[test]
    fn test_iteration_budget_is_enforced() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let config = ResolverConfig::builder().max_iterations(1).build().unwrap();
        let err = resolve(&grid, &catalog, config).unwrap_err();
        assert_eq!(
            err,
            PresolveError::NonConvergence {
                iterations: 1,
                conflicts: 1
            }
        );
        assert_eq!(
            err.to_string(),
            "failed to find a solution after 1 iterations (1 conflicts left)"
        );
    }

    #[test]
    fn test_interrupt_aborts_between_iterations() {
        let catalog = catalog(4);
        let grid = crossing(&catalog, vec![LineTile::open([T0]); 3]);
        let flag = AtomicBool::new(true);
        let err = ConflictResolver::<f64, _, _>::new(&catalog, &costs, ResolverConfig::default())
            .resolve(&grid, &mut InterruptMonitor::new(&flag))
            .unwrap_err();
        assert_eq!(
            err,
            PresolveError::Aborted {
                reason: "Interrupt signal received".to_string(),
                iterations: 1
            }
        );
    }

    #[test]
    fn test_infeasible_line_is_reported() {
        let catalog = catalog(1);
        let mut tiles = vec![LineTile::open([T0]); 4];
        tiles[1] = LineTile::blocked();
        tiles[2] = LineTile::blocked();
        let line = BeltLine::new(TilePosition::new(0, 0), Direction::East, tiles).unwrap();
        let mut grid = BeltGrid::new();
        let id = grid.add_line(&line, &catalog).unwrap();
        let err = resolve(&grid, &catalog, ResolverConfig::default()).unwrap_err();
        assert_eq!(err, PresolveError::LineInfeasible { line: id });
    }

    #[test]
    fn test_tunnel_owner_moves_off_a_buried_end() {
        // B ends in a tier-0 entry right under A's cheapest tunnel.
        let catalog = TierCatalog::vanilla();
        let cost_fn = TierCostFunction::from_catalog(&catalog);
        let a = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![LineTile::open([T0, T1]); 6],
        )
        .unwrap();
        let b = BeltLine::new(
            TilePosition::new(3, 0),
            Direction::West,
            vec![
                LineTile::open([T0]),
                LineTile::open([T0]).with_must_match(BeltType::isolated_entry(T0)),
            ],
        )
        .unwrap();
        let mut grid = BeltGrid::new();
        let a_id = grid.add_line(&a, &catalog).unwrap();
        grid.add_line(&b, &catalog).unwrap();

        let outcome = ConflictResolver::<f64, _, _>::new(&catalog, &cost_fn, ResolverConfig::default())
            .resolve(&grid, &mut NoOpMonitor::new())
            .unwrap();
        assert!(outcome.assignment().is_conflict_free());
        outcome.assignment().verify(&grid, &catalog).unwrap();
        assert!(outcome.iterations() > 1);

        let a = outcome.assignment().get(a_id).unwrap();
        assert_eq!(a.tile(0), Some(BeltType::entry(T1)));
        assert_eq!(a.tile(5), Some(BeltType::exit(T1)));
        // fast tunnel 7.0, belt 1.0 and a basic entry 2.5
        assert!((outcome.cost() - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_random_grids_agree_with_exact_search() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xB17_C0DE);
        let catalog = catalog(4);
        let config = ResolverConfig::builder().max_iterations(200).build().unwrap();
        let limits = SearchLimits::default().with_node_limit(500_000);
        let (mut compared, mut resolved, mut stuck) = (0, 0, 0);

        for _ in 0..25 {
            let mut grid = BeltGrid::new();
            let mut used = Vec::new();
            for _ in 0..rng.random_range(2..=4) {
                let direction = Direction::ALL[rng.random_range(0..4)];
                let start = TilePosition::new(rng.random_range(0..6), rng.random_range(0..6));
                let len = rng.random_range(2..=6);
                let line =
                    BeltLine::new(start, direction, vec![LineTile::open([T0]); len]).unwrap();
                // Lines may not share their mandatory ends.
                let ends = [line.tile_position(0), line.tile_position(len - 1)];
                let overlaps = (0..len).any(|k| used.contains(&line.tile_position(k)))
                    || ends.iter().any(|e| used.contains(e));
                if overlaps {
                    continue;
                }
                if grid.add_line(&line, &catalog).is_ok() {
                    used.extend(ends);
                }
            }
            if grid.validate().is_err() {
                continue;
            }

            let mut backend = SearchBackend::new();
            GridEncoder::default()
                .encode(&grid, &catalog, &costs, &mut backend)
                .unwrap();
            let exact = backend.solve(&limits);
            let optimum = match exact.status() {
                BackendStatus::Optimal => exact.objective(),
                BackendStatus::Infeasible => None,
                _ => continue,
            };
            compared += 1;

            match resolve(&grid, &catalog, config) {
                Ok(outcome) => {
                    resolved += 1;
                    assert!(outcome.assignment().is_conflict_free());
                    outcome.assignment().verify(&grid, &catalog).unwrap();
                    let optimum = optimum.expect("a valid layout exists");
                    assert!(outcome.cost() >= optimum - 1e-9);
                }
                Err(PresolveError::LineInfeasible { .. }) => assert!(optimum.is_none()),
                Err(PresolveError::NonConvergence { .. }) => {
                    if optimum.is_some() {
                        stuck += 1;
                    }
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert!(resolved > 0);
        // The heuristic may give up on a feasible grid, but rarely.
        assert!(
            stuck * 5 <= compared,
            "{} of {} feasible grids did not converge",
            stuck,
            compared
        );
    }
}
