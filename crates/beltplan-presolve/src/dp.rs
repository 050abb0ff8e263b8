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

//! # Line Dynamic Program
//!
//! Finds the cheapest sequence of pieces for a single line in one pass over
//! its tiles.
//!
//! ## States
//!
//! * `with_output_cost[i]`: cheapest prefix ending with a piece at `i` that
//!   hands items to `i + 1` (a belt or a tunnel exit).
//! * One sliding window per tier over the cheapest prefixes ending with a
//!   tunnel entry of that tier, restricted to the tier's reach.
//!
//! ## Transitions at tile `i`
//!
//! ```text
//! prev           = with_output_cost[i - 1]   (0 at i = 0)
//! belt           = prev + cost(belt@i)
//! exit  (tier t) = min window_t[i - max_t ..= i - 1] + cost(exit@i)
//! entry (tier t) = prev + cost(entry@i)      pushed into window_t after i
//! ```
//!
//! An isolated exit is only reachable on the first tile and an isolated
//! entry only on the last. A tile that must hold a piece clears every
//! window of entries behind it, so no tunnel spans it.
//!
//! The per-tile work is constant per option and window operations are
//! amortized O(1), so a line of `n` tiles is solved in O(n).

use crate::{error::PresolveError, problem::LineProblem};
use beltplan_core::{algorithm::SlidingWindowMin, num::CostNumeric};
use beltplan_model::{belt_type::BeltType, index::TierIndex, solution::LineAssignment};
use smallvec::SmallVec;

/// How the cheapest output state at a tile was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Belt(BeltType),
    Exit { belt_type: BeltType, entry: usize },
    IsolatedExit(BeltType),
}

/// The cheapest assignment of one line and its priced cost.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSolution<C> {
    assignment: LineAssignment,
    cost: C,
}

impl<C> LineSolution<C>
where
    C: CostNumeric,
{
    #[inline]
    pub fn assignment(&self) -> &LineAssignment {
        &self.assignment
    }

    #[inline]
    pub fn into_assignment(self) -> LineAssignment {
        self.assignment
    }

    /// The cost including any penalties the problem was priced with.
    #[inline]
    pub fn cost(&self) -> C {
        self.cost
    }
}

/// Reusable buffers of the line dynamic program.
///
/// A single `LineDp` can solve any number of lines; the buffers grow to the
/// longest line seen and are reused afterwards.
#[derive(Clone, Debug, Default)]
pub struct LineDp<C> {
    with_output_cost: Vec<C>,
    steps: Vec<Option<Step>>,
    windows: Vec<SlidingWindowMin<C>>,
}

impl<C> LineDp<C>
where
    C: CostNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            with_output_cost: Vec::new(),
            steps: Vec::new(),
            windows: Vec::new(),
        }
    }

    /// Creates a dynamic program sized for lines of `len` tiles over `num_tiers` tiers.
    #[inline]
    pub fn preallocated(len: usize, num_tiers: usize) -> Self {
        Self {
            with_output_cost: Vec::with_capacity(len),
            steps: Vec::with_capacity(len),
            windows: (0..num_tiers)
                .map(|_| SlidingWindowMin::with_capacity(len))
                .collect(),
        }
    }

    fn reset(&mut self, len: usize, num_tiers: usize) {
        self.with_output_cost.clear();
        self.with_output_cost.resize(len, C::infinity());
        self.steps.clear();
        self.steps.resize(len, None);
        for window in &mut self.windows {
            window.clear();
        }
        if self.windows.len() < num_tiers {
            self.windows.resize_with(num_tiers, SlidingWindowMin::new);
        }
    }

    /// Solves `problem` and returns its cheapest assignment.
    ///
    /// Fails with `PresolveError::LineInfeasible` if no sequence of the
    /// offered pieces forms a valid line.
    pub fn solve(&mut self, problem: &LineProblem<C>) -> Result<LineSolution<C>, PresolveError> {
        let line = problem.line_id();
        let n = problem.len();
        if n == 0 {
            return Err(PresolveError::LineInfeasible { line });
        }
        let num_tiers = problem.num_tiers();
        self.reset(n, num_tiers);

        let mut terminal_entry: Option<(BeltType, C)> = None;
        let mut entries: SmallVec<[(usize, C); 4]> = SmallVec::new();

        for i in 0..n {
            let tile = problem.tile(i);
            let prev = if i == 0 {
                C::zero()
            } else {
                self.with_output_cost[i - 1]
            };

            for (tier, window) in self.windows.iter_mut().take(num_tiers).enumerate() {
                let reach = problem.max_tunnel_distance(TierIndex::new(tier));
                window.evict_before(i.saturating_sub(reach));
            }

            let mut best = C::infinity();
            let mut best_step = None;
            entries.clear();

            for piece in tile.pieces() {
                let (candidate, step) = match piece.belt_type {
                    BeltType::Belt(_) => (prev + piece.cost, Step::Belt(piece.belt_type)),
                    BeltType::OutputUnderground {
                        tier,
                        isolated: false,
                    } => match self.windows[tier.get()].min() {
                        Some((entry, cost)) => (
                            cost + piece.cost,
                            Step::Exit {
                                belt_type: piece.belt_type,
                                entry,
                            },
                        ),
                        None => continue,
                    },
                    BeltType::OutputUnderground { isolated: true, .. } => {
                        if i != 0 {
                            continue;
                        }
                        (piece.cost, Step::IsolatedExit(piece.belt_type))
                    }
                    BeltType::InputUnderground {
                        tier,
                        isolated: false,
                    } => {
                        entries.push((tier.get(), prev + piece.cost));
                        continue;
                    }
                    BeltType::InputUnderground { isolated: true, .. } => {
                        let cost = prev + piece.cost;
                        if i == n - 1 && terminal_entry.is_none_or(|(_, best)| cost < best) {
                            terminal_entry = Some((piece.belt_type, cost));
                        }
                        continue;
                    }
                };
                if candidate < best {
                    best = candidate;
                    best_step = Some(step);
                }
            }

            if best.is_finite() {
                self.with_output_cost[i] = best;
                self.steps[i] = best_step;
            }

            if tile.must_hold_piece() {
                for window in &mut self.windows {
                    window.evict_before(i);
                }
            }
            for &(tier, cost) in &entries {
                self.windows[tier].push(i, cost);
            }
        }

        self.backtrack(problem, terminal_entry)
    }

    fn backtrack(
        &self,
        problem: &LineProblem<C>,
        terminal_entry: Option<(BeltType, C)>,
    ) -> Result<LineSolution<C>, PresolveError> {
        let line = problem.line_id();
        let n = problem.len();
        let mut tiles: Vec<Option<BeltType>> = vec![None; n];

        let output = self.with_output_cost[n - 1];
        let (cost, mut cursor) = match terminal_entry {
            Some((belt_type, cost)) if cost < output => {
                tiles[n - 1] = Some(belt_type);
                (cost, (n - 1).checked_sub(1))
            }
            _ => (output, Some(n - 1)),
        };
        if !cost.is_finite() {
            return Err(PresolveError::LineInfeasible { line });
        }

        while let Some(k) = cursor {
            match self.steps[k] {
                Some(Step::Belt(belt_type)) => {
                    tiles[k] = Some(belt_type);
                    cursor = k.checked_sub(1);
                }
                Some(Step::Exit { belt_type, entry }) => {
                    tiles[k] = Some(belt_type);
                    tiles[entry] = Some(BeltType::entry(belt_type.tier()));
                    cursor = entry.checked_sub(1);
                }
                Some(Step::IsolatedExit(belt_type)) => {
                    tiles[k] = Some(belt_type);
                    cursor = None;
                }
                None => return Err(PresolveError::LineInfeasible { line }),
            }
        }

        Ok(LineSolution {
            assignment: LineAssignment::new(line, problem.start(), problem.direction(), tiles),
            cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{PenaltyTable, PricedPiece, ProblemTile};
    use beltplan_core::geometry::{Direction, TilePosition};
    use beltplan_encode::{
        backend::{BackendStatus, ConstraintBackend, SearchLimits},
        encoder::GridEncoder,
        search::SearchBackend,
    };
    use beltplan_model::{
        grid::BeltGrid,
        index::{LineId, line_id},
        line::{BeltLine, LineTile},
        tier::{BeltTier, TierCatalog},
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const T0: TierIndex = TierIndex::new(0);

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

    fn costs(underground: f64) -> impl Fn(BeltType, TilePosition, Direction) -> f64 + Send + Sync {
        move |belt_type: BeltType, _: TilePosition, _: Direction| {
            if belt_type.is_underground() {
                underground
            } else {
                1.0
            }
        }
    }

    fn single_line(tiles: Vec<LineTile>, catalog: &TierCatalog) -> (BeltGrid, LineId) {
        let line = BeltLine::new(TilePosition::new(0, 0), Direction::East, tiles).unwrap();
        let mut grid = BeltGrid::new();
        let id = grid.add_line(&line, catalog).unwrap();
        (grid, id)
    }

    fn solve_line(
        tiles: Vec<LineTile>,
        catalog: &TierCatalog,
        underground: f64,
    ) -> Result<LineSolution<f64>, PresolveError> {
        let (grid, id) = single_line(tiles, catalog);
        let problem = LineProblem::from_grid(
            &grid,
            id,
            catalog,
            &costs(underground),
            &PenaltyTable::new(2.0, 1.5, 0.9),
            0.9,
        )?;
        LineDp::new().solve(&problem)
    }

    #[test]
    fn test_expensive_tunnels_yield_belts() {
        let solution = solve_line(vec![LineTile::open([T0]); 6], &catalog(5), 3.5).unwrap();
        assert!((solution.cost() - 6.0).abs() < 1e-9);
        assert!(
            solution
                .assignment()
                .tiles()
                .iter()
                .all(|t| *t == Some(BeltType::belt(T0)))
        );
    }

    #[test]
    fn test_cheap_tunnels_span_the_line() {
        let catalog = catalog(5);
        let solution = solve_line(vec![LineTile::open([T0]); 6], &catalog, 2.3).unwrap();
        assert!((solution.cost() - 4.6).abs() < 1e-9);

        let line = solution.assignment();
        assert_eq!(line.tile(0), Some(BeltType::entry(T0)));
        assert_eq!(line.tile(5), Some(BeltType::exit(T0)));
        assert_eq!(line.entries().count(), 2);
        line.verify(&catalog).unwrap();
    }

    #[test]
    fn test_tunnel_respects_reach() {
        let catalog = catalog(3);
        let solution = solve_line(vec![LineTile::open([T0]); 6], &catalog, 2.3).unwrap();
        // No single tunnel reaches from 0 to 5, so at least one belt remains.
        assert!(solution.cost() > 4.6);
        for tunnel in solution.assignment().tunnels() {
            assert!(tunnel.exit - tunnel.entry <= 3);
        }
        solution.assignment().verify(&catalog).unwrap();
    }

    #[test]
    fn test_obstacle_is_tunnelled() {
        let catalog = catalog(2);
        let mut tiles = vec![LineTile::open([T0]); 6];
        tiles[3] = LineTile::blocked();
        let solution = solve_line(tiles, &catalog, 2.5).unwrap();
        // belt, belt, entry, -, exit, belt
        assert!((solution.cost() - 8.0).abs() < 1e-9);
        let line = solution.assignment();
        assert_eq!(line.tile(2), Some(BeltType::entry(T0)));
        assert_eq!(line.tile(3), None);
        assert_eq!(line.tile(4), Some(BeltType::exit(T0)));
        line.verify(&catalog).unwrap();
    }

    #[test]
    fn test_unreachable_obstacle_is_infeasible() {
        let catalog = catalog(2);
        let mut tiles = vec![LineTile::open([T0]); 6];
        tiles[2] = LineTile::blocked();
        tiles[3] = LineTile::blocked();
        let err = solve_line(tiles, &catalog, 2.5).unwrap_err();
        assert!(matches!(err, PresolveError::LineInfeasible { .. }));
    }

    #[test]
    fn test_mandatory_tile_is_not_tunnelled() {
        let mut tiles = vec![LineTile::open([T0]); 6];
        tiles[2] = LineTile::open([T0]).with_must_be_not_empty();
        let solution = solve_line(tiles, &catalog(5), 2.3).unwrap();
        assert!(solution.assignment().tile(2).is_some());
    }

    #[test]
    fn test_must_match_restricts_the_tile() {
        let mut tiles = vec![LineTile::open([T0]); 6];
        tiles[2] = LineTile::open([T0]).with_must_match(BeltType::belt(T0));
        let solution = solve_line(tiles, &catalog(5), 0.5).unwrap();
        let line = solution.assignment();
        assert_eq!(line.tile(2), Some(BeltType::belt(T0)));
        line.verify(&catalog(5)).unwrap();
    }

    #[test]
    fn test_isolated_ends() {
        let catalog = catalog(4);
        let mut tiles = vec![LineTile::open([T0]); 3];
        tiles[0] = LineTile::open([T0]).with_must_match(BeltType::isolated_exit(T0));
        tiles[2] = LineTile::open([T0]).with_must_match(BeltType::isolated_entry(T0));
        let solution = solve_line(tiles, &catalog, 2.5).unwrap();
        assert_eq!(
            solution.assignment().tiles(),
            &[
                Some(BeltType::isolated_exit(T0)),
                Some(BeltType::belt(T0)),
                Some(BeltType::isolated_entry(T0)),
            ]
        );
        assert!((solution.cost() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_exit_past_the_start_is_unreachable() {
        let problem = LineProblem::new(
            line_id(1).unwrap(),
            TilePosition::new(0, 0),
            Direction::East,
            vec![
                ProblemTile::new(
                    [PricedPiece {
                        belt_type: BeltType::belt(T0),
                        cost: 1.0,
                    }],
                    true,
                ),
                ProblemTile::new(
                    [PricedPiece {
                        belt_type: BeltType::isolated_exit(T0),
                        cost: 1.0,
                    }],
                    true,
                ),
            ],
            vec![4],
        );
        let err = LineDp::new().solve(&problem).unwrap_err();
        assert_eq!(
            err,
            PresolveError::LineInfeasible {
                line: line_id(1).unwrap()
            }
        );
    }

    #[test]
    fn test_isolated_ends_agree_with_exact_search() {
        let catalog = catalog(4);
        let cost_fn = costs(2.5);
        for (pinned, edge) in [
            (BeltType::isolated_entry(T0), 3),
            (BeltType::isolated_exit(T0), 0),
        ] {
            for offset in 0..4 {
                let mut tiles = vec![LineTile::open([T0]); 4];
                tiles[offset] = LineTile::open([T0]).with_must_match(pinned);
                let (grid, id) = single_line(tiles, &catalog);

                let problem = LineProblem::from_grid(
                    &grid,
                    id,
                    &catalog,
                    &cost_fn,
                    &PenaltyTable::new(2.0, 1.5, 0.9),
                    0.9,
                )
                .unwrap();
                let heuristic = LineDp::new().solve(&problem);

                let mut backend = SearchBackend::new();
                GridEncoder::default()
                    .encode(&grid, &catalog, &cost_fn, &mut backend)
                    .unwrap();
                let exact = backend.solve(&SearchLimits::unlimited());

                assert_eq!(heuristic.is_ok(), offset == edge, "{} at {}", pinned, offset);
                match heuristic {
                    Ok(solution) => {
                        assert_eq!(exact.status(), BackendStatus::Optimal);
                        let optimum = exact.objective().unwrap();
                        assert!((solution.cost() - optimum).abs() < 1e-6);
                    }
                    Err(err) => {
                        assert_eq!(err, PresolveError::LineInfeasible { line: id });
                        assert_eq!(exact.status(), BackendStatus::Infeasible);
                    }
                }
            }
        }
    }

    #[test]
    fn test_buffers_are_reused() {
        let catalog = catalog(5);
        let mut dp = LineDp::preallocated(8, 1);
        let table = PenaltyTable::new(2.0, 1.5, 0.9);
        for (len, underground, expected) in [(6, 2.3, 4.6), (3, 3.5, 3.0), (6, 3.5, 6.0)] {
            let (grid, id) = single_line(vec![LineTile::open([T0]); len], &catalog);
            let problem =
                LineProblem::from_grid(&grid, id, &catalog, &costs(underground), &table, 0.9)
                    .unwrap();
            let solution = dp.solve(&problem).unwrap();
            assert!((solution.cost() - expected).abs() < 1e-9);
            assert_eq!(solution.assignment().len(), len);
        }
    }

    #[test]
    fn test_random_lines_match_exact_optimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_BE17);
        for _ in 0..40 {
            let len = rng.random_range(3..=7);
            let catalog = catalog(rng.random_range(1..=4));
            let underground: f64 = rng.random_range(0.5..3.0);

            let mut tiles = vec![LineTile::open([T0]); len];
            for tile in tiles.iter_mut().take(len - 1).skip(1) {
                match rng.random_range(0..6) {
                    0 => *tile = LineTile::blocked(),
                    1 => *tile = LineTile::open([T0]).with_must_be_not_empty(),
                    _ => {}
                }
            }
            let (grid, id) = single_line(tiles, &catalog);
            let cost_fn = costs(underground);

            let problem = LineProblem::from_grid(
                &grid,
                id,
                &catalog,
                &cost_fn,
                &PenaltyTable::new(2.0, 1.5, 0.9),
                0.9,
            )
            .unwrap();
            let heuristic = LineDp::new().solve(&problem);

            let mut backend = SearchBackend::new();
            GridEncoder::default()
                .encode(&grid, &catalog, &cost_fn, &mut backend)
                .unwrap();
            let exact = backend.solve(&SearchLimits::unlimited());

            match heuristic {
                Ok(solution) => {
                    assert_eq!(exact.status(), BackendStatus::Optimal);
                    let optimum = exact.objective().unwrap();
                    assert!(
                        (solution.cost() - optimum).abs() < 1e-6,
                        "line dp found {} but the optimum is {}",
                        solution.cost(),
                        optimum
                    );
                    solution.assignment().verify(&catalog).unwrap();
                }
                Err(PresolveError::LineInfeasible { .. }) => {
                    assert_eq!(exact.status(), BackendStatus::Infeasible);
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
    }
}
