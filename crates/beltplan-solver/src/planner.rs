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

//! The belt network planner.
//!
//! `BeltPlanner` owns everything a planning run needs except the grid: the
//! tier catalog, the cost function, the configuration and the monitors
//! watching the conflict resolver. Planners are built with
//! `BeltPlannerBuilder` and can plan any number of grids.
//!
//! ## Mode semantics
//!
//! * `Heuristic` returns the resolver's layout. Resolver failures are errors.
//! * `Exact` encodes the grid and returns the backend's best layout.
//! * `ExactWithHints` runs the resolver first. A resolver failure other than
//!   a model error is logged and the exact backend runs without hints.
//! * `ExactForced` requires a resolver layout and fixes it in the exact
//!   model, which then only evaluates it.
//!
//! Exact runs that end without a solution fail with `PlanError::Exact`.
//! Every layout is verified against the line rules before it is returned.

use crate::{
    config::{PlanMode, PlannerConfig},
    error::{ConfigError, PlanError},
    outcome::{PlanMethod, PlanOutcome, PlanStatistics},
};
use beltplan_encode::{
    backend::{ConstraintBackend, SearchLimits},
    encoder::{EncoderConfig, GridEncoder, WarmStart},
    search::SearchBackend,
};
use beltplan_model::{
    cost::{CostFunction, TierCostFunction},
    error::ModelError,
    grid::BeltGrid,
    line::BeltLine,
    solution::GridAssignment,
    tier::BeltCatalog,
};
use beltplan_presolve::{
    error::PresolveError,
    monitor::{
        composite::CompositeMonitor, interrupt::InterruptMonitor,
        resolver_monitor::ResolverMonitor, time_limit::TimeLimitMonitor,
    },
    problem::assignment_cost,
    resolver::{ConflictResolver, ResolverConfig},
};
use std::{sync::atomic::AtomicBool, time::Duration, time::Instant};

/// Registers `lines` in a fresh grid, in order.
///
/// Line ids are handed out from `1` in the order of `lines`.
pub fn build_grid<B>(lines: &[BeltLine], catalog: &B) -> Result<BeltGrid, ModelError>
where
    B: BeltCatalog + ?Sized,
{
    let mut grid = BeltGrid::new();
    for line in lines {
        grid.add_line(line, catalog)?;
    }
    Ok(grid)
}

/// Plans conflict-free belt layouts for grids of lines.
pub struct BeltPlanner<'a, B>
where
    B: ?Sized,
{
    catalog: &'a B,
    cost_fn: Box<dyn CostFunction<f64> + 'a>,
    config: PlannerConfig,
    monitor: CompositeMonitor<'a>,
}

impl<'a, B> BeltPlanner<'a, B>
where
    B: BeltCatalog + ?Sized,
{
    #[inline]
    pub fn builder(catalog: &'a B) -> BeltPlannerBuilder<'a, B> {
        BeltPlannerBuilder::new(catalog)
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    #[inline]
    pub fn catalog(&self) -> &B {
        self.catalog
    }

    /// Builds the grid of `lines` and plans it.
    pub fn plan(&mut self, lines: &[BeltLine]) -> Result<PlanOutcome, PlanError> {
        let grid = build_grid(lines, self.catalog)?;
        self.plan_grid(&grid)
    }

    /// Plans every line registered in `grid`.
    pub fn plan_grid(&mut self, grid: &BeltGrid) -> Result<PlanOutcome, PlanError> {
        self.run(grid, None)
    }

    /// Plans `grid` starting from a previous layout.
    ///
    /// The resolver keeps the conflict-free part of `previous` and only
    /// re-solves what it must. In `PlanMode::Exact` the previous layout is
    /// passed to the backend as hints.
    pub fn plan_from(
        &mut self,
        grid: &BeltGrid,
        previous: GridAssignment,
    ) -> Result<PlanOutcome, PlanError> {
        self.run(grid, Some(previous))
    }

    fn run(
        &mut self,
        grid: &BeltGrid,
        previous: Option<GridAssignment>,
    ) -> Result<PlanOutcome, PlanError> {
        let start = Instant::now();
        grid.validate()?;

        let mode = self.config.mode;
        tracing::info!(
            mode = %mode,
            lines = grid.num_lines(),
            cells = grid.num_cells(),
            "planning started"
        );

        let mut statistics = PlanStatistics::default();
        let (assignment, method) = match mode {
            PlanMode::Heuristic => {
                let assignment = self.run_heuristic(grid, previous, &mut statistics)?;
                (assignment, PlanMethod::Heuristic)
            }
            PlanMode::Exact => {
                let hints = previous.map(|assignment| (assignment, WarmStart::Hint));
                let assignment = self.run_exact(grid, hints, &mut statistics)?;
                (assignment, PlanMethod::Exact)
            }
            PlanMode::ExactWithHints => {
                let hints = match self.run_heuristic(grid, previous, &mut statistics) {
                    Ok(assignment) => Some((assignment, WarmStart::Hint)),
                    Err(PresolveError::Model(err)) => return Err(err.into()),
                    Err(err) => {
                        tracing::warn!(error = %err, "heuristic failed, solving without hints");
                        None
                    }
                };
                let assignment = self.run_exact(grid, hints, &mut statistics)?;
                (assignment, PlanMethod::Exact)
            }
            PlanMode::ExactForced => {
                let assignment = self.run_heuristic(grid, previous, &mut statistics)?;
                let assignment =
                    self.run_exact(grid, Some((assignment, WarmStart::Force)), &mut statistics)?;
                (assignment, PlanMethod::Exact)
            }
        };

        assignment.verify(grid, self.catalog)?;
        let cost = assignment_cost(
            grid,
            &assignment,
            self.cost_fn.as_ref(),
            self.config.resolver.in_place_discount,
        );
        statistics.time_total = start.elapsed();

        tracing::info!(
            method = %method,
            cost,
            time = ?statistics.time_total,
            "planning finished"
        );
        Ok(PlanOutcome::new(assignment, cost, method, statistics))
    }

    fn run_heuristic(
        &mut self,
        grid: &BeltGrid,
        previous: Option<GridAssignment>,
        statistics: &mut PlanStatistics,
    ) -> Result<GridAssignment, PresolveError> {
        let resolver = ConflictResolver::<f64, _, _>::new(
            self.catalog,
            self.cost_fn.as_ref(),
            self.config.resolver,
        );
        let outcome = match previous {
            Some(previous) => resolver.resolve_from(grid, previous, &mut self.monitor)?,
            None => resolver.resolve(grid, &mut self.monitor)?,
        };
        statistics.resolver = Some(outcome.statistics().clone());
        Ok(outcome.into_assignment())
    }

    fn run_exact(
        &self,
        grid: &BeltGrid,
        warm_start: Option<(GridAssignment, WarmStart)>,
        statistics: &mut PlanStatistics,
    ) -> Result<GridAssignment, PlanError> {
        let encoder = GridEncoder::new(EncoderConfig {
            in_place_discount: self.config.resolver.in_place_discount,
        });
        let mut backend = SearchBackend::new();
        let encoding = encoder.encode(grid, self.catalog, self.cost_fn.as_ref(), &mut backend)?;
        if let Some((assignment, mode)) = &warm_start {
            encoding.apply_assignment(assignment, *mode, &mut backend)?;
        }

        let solution = backend.solve(&self.config.exact);
        let status = solution.status();
        statistics.search = Some(backend.statistics().clone());
        statistics.exact_status = Some(status);

        if !status.has_solution() {
            tracing::warn!(status = %status, "exact backend found no solution");
            return Err(PlanError::Exact { status });
        }
        tracing::debug!(
            status = %status,
            objective = solution.objective(),
            "exact backend finished"
        );
        Ok(encoding.decode(&solution))
    }
}

impl<B> std::fmt::Debug for BeltPlanner<'_, B>
where
    B: ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeltPlanner")
            .field("config", &self.config)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

/// Builder for `BeltPlanner`.
///
/// Without a cost function the planner prices pieces by their tier, see
/// `TierCostFunction`.
pub struct BeltPlannerBuilder<'a, B>
where
    B: ?Sized,
{
    catalog: &'a B,
    cost_fn: Option<Box<dyn CostFunction<f64> + 'a>>,
    config: PlannerConfig,
    monitor: CompositeMonitor<'a>,
}

impl<'a, B> BeltPlannerBuilder<'a, B>
where
    B: BeltCatalog + ?Sized,
{
    #[inline]
    pub fn new(catalog: &'a B) -> Self {
        Self {
            catalog,
            cost_fn: None,
            config: PlannerConfig::default(),
            monitor: CompositeMonitor::new(),
        }
    }

    #[inline]
    pub fn cost_function<F>(mut self, cost_fn: F) -> Self
    where
        F: CostFunction<f64> + 'a,
    {
        self.cost_fn = Some(Box::new(cost_fn));
        self
    }

    /// Replaces the whole configuration.
    #[inline]
    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn mode(mut self, mode: PlanMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[inline]
    pub fn resolver_config(mut self, resolver: ResolverConfig) -> Self {
        self.config.resolver = resolver;
        self
    }

    #[inline]
    pub fn exact_limits(mut self, limits: SearchLimits) -> Self {
        self.config.exact = limits;
        self
    }

    /// Adds a monitor to the conflict resolver.
    #[inline]
    pub fn monitor<M>(mut self, monitor: M) -> Self
    where
        M: ResolverMonitor + 'a,
    {
        self.monitor.add_monitor(monitor);
        self
    }

    /// Bounds both the resolver and the exact backend by `limit`.
    ///
    /// Each path gets the full budget.
    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.monitor.add_monitor(TimeLimitMonitor::new(limit));
        self.config.exact = self.config.exact.with_time_limit(limit);
        self
    }

    /// Stops the resolver once `flag` is raised.
    #[inline]
    pub fn interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.monitor.add_monitor(InterruptMonitor::new(flag));
        self
    }

    pub fn build(self) -> Result<BeltPlanner<'a, B>, ConfigError> {
        self.config.validate()?;
        let cost_fn: Box<dyn CostFunction<f64> + 'a> = match self.cost_fn {
            Some(cost_fn) => cost_fn,
            None => Box::new(TierCostFunction::from_catalog(self.catalog)),
        };
        Ok(BeltPlanner {
            catalog: self.catalog,
            cost_fn,
            config: self.config,
            monitor: self.monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltplan_core::geometry::{Direction, TilePosition};
    use beltplan_encode::backend::BackendStatus;
    use beltplan_model::{
        belt_type::BeltType,
        index::TierIndex,
        line::LineTile,
        tier::{BeltTier, TierCatalog},
    };

    fn tier0() -> TierIndex {
        TierIndex::new(0)
    }

    fn catalog(max_distance: usize, underground_cost: f64) -> TierCatalog {
        TierCatalog::builder()
            .tier(BeltTier::new("basic", "belt", "underground", max_distance, 1.0, underground_cost))
            .build()
            .unwrap()
    }

    fn open_line(start: TilePosition, direction: Direction, len: usize) -> BeltLine {
        BeltLine::new(start, direction, vec![LineTile::open([tier0()]); len]).unwrap()
    }

    fn crossing() -> Vec<BeltLine> {
        vec![
            open_line(TilePosition::new(0, 1), Direction::East, 3),
            open_line(TilePosition::new(1, 0), Direction::South, 3),
        ]
    }

    #[test]
    fn test_build_grid_assigns_ids_in_order() {
        let catalog = catalog(4, 2.0);
        let grid = build_grid(&crossing(), &catalog).unwrap();
        assert_eq!(grid.num_lines(), 2);
        let starts: Vec<_> = grid.lines().map(|(_, line)| line.start()).collect();
        assert_eq!(starts, vec![TilePosition::new(0, 1), TilePosition::new(1, 0)]);
    }

    #[test]
    fn test_build_grid_rejects_contradicting_lines() {
        let catalog = catalog(4, 2.0);
        let lines = vec![
            open_line(TilePosition::new(0, 0), Direction::East, 2),
            open_line(TilePosition::new(0, 0), Direction::South, 2),
        ];
        let err = build_grid(&lines, &catalog).unwrap_err();
        assert!(matches!(err, ModelError::ConflictingForcedValue { .. }));
    }

    #[test]
    fn test_heuristic_single_line() {
        let catalog = catalog(4, 2.5);
        let mut planner = BeltPlannerBuilder::new(&catalog).build().unwrap();
        let outcome = planner
            .plan(&[open_line(TilePosition::new(0, 0), Direction::East, 3)])
            .unwrap();

        assert_eq!(outcome.method(), PlanMethod::Heuristic);
        assert!((outcome.cost() - 3.0).abs() < 1e-9);
        assert_eq!(outcome.placements().len(), 3);
        assert!(outcome.statistics().search.is_none());
        assert_eq!(outcome.statistics().resolver.as_ref().unwrap().iterations, 1);
    }

    #[test]
    fn test_exact_single_line_matches_heuristic() {
        let catalog = catalog(5, 2.3);
        let line = open_line(TilePosition::new(0, 0), Direction::East, 6);

        let mut heuristic = BeltPlannerBuilder::new(&catalog).build().unwrap();
        let mut exact = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::Exact)
            .build()
            .unwrap();

        let h = heuristic.plan(std::slice::from_ref(&line)).unwrap();
        let e = exact.plan(std::slice::from_ref(&line)).unwrap();
        assert_eq!(e.method(), PlanMethod::Exact);
        assert_eq!(e.statistics().exact_status, Some(BackendStatus::Optimal));
        assert!(e.statistics().resolver.is_none());
        assert!((h.cost() - 4.6).abs() < 1e-9);
        assert!((e.cost() - h.cost()).abs() < 1e-9);
    }

    #[test]
    fn test_exact_crossing_uses_one_tunnel() {
        let catalog = catalog(4, 2.5);
        let mut planner = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::Exact)
            .build()
            .unwrap();
        let outcome = planner.plan(&crossing()).unwrap();

        assert!(outcome.assignment().is_conflict_free());
        assert!((outcome.cost() - 8.0).abs() < 1e-9);
        let tunnels: usize = outcome
            .assignment()
            .lines()
            .map(|line| line.tunnels().len())
            .sum();
        assert_eq!(tunnels, 1);
    }

    #[test]
    fn test_exact_forced_keeps_heuristic_layout() {
        let catalog = catalog(4, 2.5);
        let mut heuristic = BeltPlannerBuilder::new(&catalog).build().unwrap();
        let mut forced = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::ExactForced)
            .build()
            .unwrap();

        let h = heuristic.plan(&crossing()).unwrap();
        let f = forced.plan(&crossing()).unwrap();
        assert_eq!(f.method(), PlanMethod::Exact);
        assert_eq!(f.assignment(), h.assignment());
        assert!((f.cost() - h.cost()).abs() < 1e-9);
        assert!(f.statistics().resolver.is_some());
        assert!(f.statistics().search.is_some());
    }

    #[test]
    fn test_exact_with_hints_reaches_optimum() {
        let catalog = catalog(4, 2.5);
        let mut planner = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::ExactWithHints)
            .build()
            .unwrap();
        let outcome = planner.plan(&crossing()).unwrap();
        assert_eq!(outcome.statistics().exact_status, Some(BackendStatus::Optimal));
        assert!((outcome.cost() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_line() {
        let catalog = catalog(1, 2.0);
        let line = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![
                LineTile::open([tier0()]),
                LineTile::blocked(),
                LineTile::open([tier0()]),
            ],
        )
        .unwrap();

        let mut heuristic = BeltPlannerBuilder::new(&catalog).build().unwrap();
        let err = heuristic.plan(std::slice::from_ref(&line)).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Presolve(PresolveError::LineInfeasible { .. })
        ));

        let mut exact = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::Exact)
            .build()
            .unwrap();
        let err = exact.plan(std::slice::from_ref(&line)).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Exact {
                status: BackendStatus::Infeasible
            }
        ));

        let mut hinted = BeltPlannerBuilder::new(&catalog)
            .mode(PlanMode::ExactWithHints)
            .build()
            .unwrap();
        let err = hinted.plan(std::slice::from_ref(&line)).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Exact {
                status: BackendStatus::Infeasible
            }
        ));
    }

    #[test]
    fn test_custom_cost_function() {
        let catalog = catalog(4, 2.0);
        let cost_fn = |belt_type: BeltType, _tile: TilePosition, _direction: Direction| {
            if belt_type.is_underground() { 0.5 } else { 3.0 }
        };
        let mut planner = BeltPlannerBuilder::new(&catalog)
            .cost_function(cost_fn)
            .build()
            .unwrap();
        let outcome = planner
            .plan(&[open_line(TilePosition::new(0, 0), Direction::East, 5)])
            .unwrap();
        assert_eq!(outcome.placements().len(), 2);
        assert!((outcome.cost() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_from_keeps_previous_layout() {
        let catalog = catalog(4, 2.5);
        let grid = build_grid(&crossing(), &catalog).unwrap();
        let mut planner = BeltPlannerBuilder::new(&catalog).build().unwrap();

        let first = planner.plan_grid(&grid).unwrap();
        let second = planner
            .plan_from(&grid, first.assignment().clone())
            .unwrap();
        assert_eq!(second.assignment(), first.assignment());
        assert_eq!(second.statistics().resolver.as_ref().unwrap().iterations, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_by_builder() {
        let catalog = catalog(4, 2.0);
        let config = PlannerConfig {
            exact: SearchLimits::unlimited().with_node_limit(0),
            ..PlannerConfig::default()
        };
        let err = BeltPlannerBuilder::new(&catalog)
            .config(config)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_time_limit_sets_both_paths() {
        let catalog = catalog(4, 2.0);
        let planner = BeltPlannerBuilder::new(&catalog)
            .time_limit(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(
            planner.config().exact.time_limit(),
            Some(Duration::from_secs(3))
        );
        assert!(format!("{:?}", planner).contains("BeltPlanner"));
    }
}
