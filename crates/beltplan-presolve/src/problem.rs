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

//! # Line Problems
//!
//! A `LineProblem` is the view one line has of a `BeltGrid`: for each of its
//! tiles, the pieces this line may place there and what each one costs. It is
//! rebuilt whenever the penalties change, so the dynamic program never has to
//! look at the grid, the cost function or the penalty table itself.
//!
//! ## Pricing
//!
//! ```text
//! cost = base · (in_place_discount if the piece matches the existing entity)
//!      + penalty.in_place  (matching piece)  or  penalty.general  (any other)
//!      + tunnel penalty of (tile, tier)     (tunnel ends only)
//! ```
//!
//! Pieces of infinite cost are dropped from the table.

use crate::error::PresolveError;
use beltplan_core::{
    geometry::{Direction, TilePosition},
    num::CostNumeric,
};
use beltplan_model::{
    belt_type::BeltType,
    cost::CostFunction,
    grid::BeltGrid,
    index::{LineId, TierIndex},
    solution::{GridAssignment, LineAssignment},
    tier::BeltCatalog,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// The conflict penalties accumulated on one tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilePenalty<C> {
    /// Added to every piece that does not match the tile's existing entity.
    pub general: C,
    /// Added to the piece matching the tile's existing entity.
    pub in_place: C,
}

impl<C> TilePenalty<C>
where
    C: CostNumeric,
{
    #[inline]
    pub fn zero() -> Self {
        Self {
            general: C::zero(),
            in_place: C::zero(),
        }
    }
}

impl<C> Default for TilePenalty<C>
where
    C: CostNumeric,
{
    fn default() -> Self {
        Self::zero()
    }
}

/// Per-tile penalties raised by the conflict resolver.
///
/// Every penalty starts at zero. The first escalation sets it to the initial
/// penalty, every later one multiplies it. The in-place penalty grows by
/// `1 + (multiplier - 1) · in_place_discount` instead, so a line is pushed
/// off its existing belts more reluctantly than off fresh tiles.
///
/// Tunnel penalties are kept per tile and tier, so a line pushed out of a
/// tunnel of one tier may still tunnel through the same tiles with another.
#[derive(Clone, Debug)]
pub struct PenaltyTable<C> {
    tiles: FxHashMap<TilePosition, TilePenalty<C>>,
    tunnels: FxHashMap<(TilePosition, TierIndex), C>,
    initial: C,
    multiplier: C,
    in_place_multiplier: C,
    updates: u64,
}

impl<C> PenaltyTable<C>
where
    C: CostNumeric,
{
    pub fn new(initial: C, multiplier: C, in_place_discount: C) -> Self {
        Self {
            tiles: FxHashMap::default(),
            tunnels: FxHashMap::default(),
            initial,
            multiplier,
            in_place_multiplier: C::one() + (multiplier - C::one()) * in_place_discount,
            updates: 0,
        }
    }

    #[inline]
    pub fn get(&self, tile: TilePosition) -> TilePenalty<C> {
        self.tiles.get(&tile).copied().unwrap_or_default()
    }

    /// The penalty on tunnel ends of `tier` placed on `tile`.
    #[inline]
    pub fn tunnel_penalty(&self, tile: TilePosition, tier: TierIndex) -> C {
        self.tunnels.get(&(tile, tier)).copied().unwrap_or_else(C::zero)
    }

    /// The penalty added to `belt_type` placed on `tile`.
    #[inline]
    pub fn piece_penalty(&self, tile: TilePosition, belt_type: BeltType, matches_existing: bool) -> C {
        let base = match self.tiles.get(&tile) {
            Some(penalty) if matches_existing => penalty.in_place,
            Some(penalty) => penalty.general,
            None => C::zero(),
        };
        if belt_type.is_underground() {
            base + self.tunnel_penalty(tile, belt_type.tier())
        } else {
            base
        }
    }

    /// Escalates the penalties of a tile claimed by more than one line.
    pub fn escalate_shared(&mut self, tile: TilePosition) {
        let (initial, multiplier, in_place_multiplier) =
            (self.initial, self.multiplier, self.in_place_multiplier);
        let penalty = self.tiles.entry(tile).or_default();
        escalate(&mut penalty.general, initial, multiplier);
        escalate(&mut penalty.in_place, initial, in_place_multiplier);
        self.updates = self.updates.saturating_add(1);
    }

    /// Escalates the penalty of tunnel ends of `tier` on `tile`.
    pub fn escalate_tunnel(&mut self, tile: TilePosition, tier: TierIndex) {
        let (initial, multiplier) = (self.initial, self.multiplier);
        let penalty = self.tunnels.entry((tile, tier)).or_insert_with(C::zero);
        escalate(penalty, initial, multiplier);
        self.updates = self.updates.saturating_add(1);
    }

    /// Total escalations so far.
    #[inline]
    pub fn num_updates(&self) -> u64 {
        self.updates
    }

    /// Number of penalized tiles plus penalized (tile, tier) tunnel slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len() + self.tunnels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.tunnels.is_empty()
    }
}

#[inline]
fn escalate<C>(value: &mut C, initial: C, multiplier: C)
where
    C: CostNumeric,
{
    *value = if value.is_zero() {
        initial
    } else {
        *value * multiplier
    };
}

/// A piece a line may place on a tile, with its price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricedPiece<C> {
    pub belt_type: BeltType,
    pub cost: C,
}

/// The pieces one tile offers to one line.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemTile<C> {
    pieces: SmallVec<[PricedPiece<C>; 6]>,
    must_hold_piece: bool,
}

impl<C> ProblemTile<C> {
    pub fn new<I>(pieces: I, must_hold_piece: bool) -> Self
    where
        I: IntoIterator<Item = PricedPiece<C>>,
    {
        Self {
            pieces: pieces.into_iter().collect(),
            must_hold_piece,
        }
    }

    #[inline]
    pub fn pieces(&self) -> &[PricedPiece<C>] {
        &self.pieces
    }

    /// Whether the line must place a piece here, so no tunnel may span it.
    #[inline]
    pub fn must_hold_piece(&self) -> bool {
        self.must_hold_piece
    }
}

/// The priced option table of one line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineProblem<C> {
    line_id: LineId,
    start: TilePosition,
    direction: Direction,
    tiles: Vec<ProblemTile<C>>,
    max_tunnel_distances: Vec<usize>,
}

impl<C> LineProblem<C>
where
    C: CostNumeric,
{
    /// Assembles a problem from prepared tiles.
    ///
    /// `max_tunnel_distances[t]` is the reach of tier `t`; every piece must
    /// name a tier inside it.
    pub fn new(
        line_id: LineId,
        start: TilePosition,
        direction: Direction,
        tiles: Vec<ProblemTile<C>>,
        max_tunnel_distances: Vec<usize>,
    ) -> Self {
        debug_assert!(
            tiles
                .iter()
                .flat_map(|t| t.pieces())
                .all(|p| p.belt_type.tier().get() < max_tunnel_distances.len()),
            "called `LineProblem::new` with a piece of a tier missing from the distance table"
        );
        Self {
            line_id,
            start,
            direction,
            tiles,
            max_tunnel_distances,
        }
    }

    /// Reads the options of `line_id` from `grid` and prices them.
    ///
    /// Only options facing the line's direction and naming its id are kept,
    /// so tiles reserved for another line or blocked for this one offer
    /// nothing, and tunnels of this line may pass under them.
    pub fn from_grid<B, F>(
        grid: &BeltGrid,
        line_id: LineId,
        catalog: &B,
        cost_fn: &F,
        penalties: &PenaltyTable<C>,
        in_place_discount: C,
    ) -> Result<Self, PresolveError>
    where
        B: BeltCatalog + ?Sized,
        F: CostFunction<C> + ?Sized,
    {
        let line = grid.line(line_id)?;
        let direction = line.direction();

        let mut tiles = Vec::with_capacity(line.len());
        for offset in 0..line.len() {
            let position = line.tile_position(offset);
            let Some(cell) = grid.cell(position) else {
                tiles.push(ProblemTile::new([], false));
                continue;
            };

            let mut pieces = SmallVec::new();
            for option in cell.options() {
                if option.direction != direction || !option.line_ids.contains(&line_id) {
                    continue;
                }
                catalog.require_tier(option.belt_type.tier())?;

                let matches_existing = cell
                    .existing()
                    .is_some_and(|e| e.matches(direction, option.belt_type));
                let mut cost = cost_fn.cost(option.belt_type, position, direction);
                if matches_existing {
                    cost = cost * in_place_discount;
                }
                cost = cost
                    + penalties.piece_penalty(position, option.belt_type, matches_existing);
                if cost.is_finite() {
                    pieces.push(PricedPiece {
                        belt_type: option.belt_type,
                        cost,
                    });
                }
            }

            let must_hold_piece = !cell.can_be_empty() && cell.forced_line_id() == Some(line_id);
            tiles.push(ProblemTile {
                pieces,
                must_hold_piece,
            });
        }

        Ok(Self {
            line_id,
            start: line.start(),
            direction,
            tiles,
            max_tunnel_distances: catalog
                .tiers()
                .iter()
                .map(|t| t.max_tunnel_distance())
                .collect(),
        })
    }

    #[inline]
    pub fn line_id(&self) -> LineId {
        self.line_id
    }

    #[inline]
    pub fn start(&self) -> TilePosition {
        self.start
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn tiles(&self) -> &[ProblemTile<C>] {
        &self.tiles
    }

    /// Returns the tile at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the line.
    #[inline]
    pub fn tile(&self, offset: usize) -> &ProblemTile<C> {
        debug_assert!(
            offset < self.tiles.len(),
            "called `LineProblem::tile` with offset out of bounds: the len is {} but the index is {}",
            self.tiles.len(),
            offset
        );
        &self.tiles[offset]
    }

    #[inline]
    pub fn num_tiers(&self) -> usize {
        self.max_tunnel_distances.len()
    }

    #[inline]
    pub fn max_tunnel_distance(&self, tier: TierIndex) -> usize {
        self.max_tunnel_distances
            .get(tier.get())
            .copied()
            .unwrap_or(0)
    }
}

/// The cost of `line` without penalties, with the in-place discount applied.
pub fn line_cost<C, F>(grid: &BeltGrid, line: &LineAssignment, cost_fn: &F, in_place_discount: C) -> C
where
    C: CostNumeric,
    F: CostFunction<C> + ?Sized,
{
    let direction = line.direction();
    line.entries().fold(C::zero(), |acc, (offset, belt_type)| {
        let tile = line.tile_position(offset);
        let cost = cost_fn.cost(belt_type, tile, direction);
        let matches_existing = grid
            .cell(tile)
            .and_then(|c| c.existing())
            .is_some_and(|e| e.matches(direction, belt_type));
        if matches_existing {
            acc + cost * in_place_discount
        } else {
            acc + cost
        }
    })
}

/// The cost of every line of `assignment`, as the exact path's objective prices it.
pub fn assignment_cost<C, F>(
    grid: &BeltGrid,
    assignment: &GridAssignment,
    cost_fn: &F,
    in_place_discount: C,
) -> C
where
    C: CostNumeric,
    F: CostFunction<C> + ?Sized,
{
    assignment.lines().fold(C::zero(), |acc, line| {
        acc + line_cost(grid, line, cost_fn, in_place_discount)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltplan_model::{
        line::{BeltLine, LineTile},
        snapshot::ExistingBelt,
        tier::{BeltTier, TierCatalog},
    };

    const T0: TierIndex = TierIndex::new(0);

    fn catalog() -> TierCatalog {
        TierCatalog::builder()
            .tier(BeltTier::new("basic", "belt", "underground", 4, 1.0, 2.5))
            .build()
            .unwrap()
    }

    fn costs(belt_type: BeltType, _: TilePosition, _: Direction) -> f64 {
        if belt_type.is_underground() { 2.5 } else { 1.0 }
    }

    fn grid_with(tiles: Vec<LineTile>) -> (BeltGrid, LineId) {
        let line = BeltLine::new(TilePosition::new(0, 0), Direction::East, tiles).unwrap();
        let mut grid = BeltGrid::new();
        let id = grid.add_line(&line, &catalog()).unwrap();
        (grid, id)
    }

    #[test]
    fn test_penalty_escalation() {
        let mut table = PenaltyTable::<f64>::new(2.0, 1.5, 0.5);
        let tile = TilePosition::new(3, 4);
        assert_eq!(table.get(tile), TilePenalty::zero());

        table.escalate_shared(tile);
        assert_eq!(table.get(tile).general, 2.0);
        assert_eq!(table.get(tile).in_place, 2.0);

        table.escalate_shared(tile);
        assert_eq!(table.get(tile).general, 3.0);
        // 1 + 0.5 · 0.5
        assert_eq!(table.get(tile).in_place, 2.5);
        assert_eq!(table.tunnel_penalty(tile, T0), 0.0);

        table.escalate_tunnel(tile, T0);
        assert_eq!(table.piece_penalty(tile, BeltType::entry(T0), false), 5.0);
        assert_eq!(table.piece_penalty(tile, BeltType::belt(T0), true), 2.5);
        assert_eq!(table.num_updates(), 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_tunnel_penalty_is_per_tier() {
        let t1 = TierIndex::new(1);
        let mut table = PenaltyTable::<f64>::new(2.0, 1.5, 0.9);
        let tile = TilePosition::new(0, 0);

        table.escalate_tunnel(tile, T0);
        table.escalate_tunnel(tile, T0);
        assert_eq!(table.piece_penalty(tile, BeltType::exit(T0), false), 3.0);
        assert_eq!(table.piece_penalty(tile, BeltType::exit(t1), false), 0.0);
        assert_eq!(table.piece_penalty(tile, BeltType::belt(T0), false), 0.0);
        assert_eq!(table.get(tile), TilePenalty::zero());
    }

    #[test]
    fn test_problem_prices_options() {
        let (grid, id) = grid_with(vec![LineTile::open([T0]); 3]);
        let table = PenaltyTable::new(2.0, 1.5, 0.9);
        let problem = LineProblem::from_grid(&grid, id, &catalog(), &costs, &table, 0.9).unwrap();

        assert_eq!(problem.len(), 3);
        assert_eq!(problem.max_tunnel_distance(T0), 4);
        let pieces = problem.tile(1).pieces();
        assert_eq!(pieces.len(), 3);
        assert!(pieces.contains(&PricedPiece {
            belt_type: BeltType::belt(T0),
            cost: 1.0
        }));
        assert!(pieces.contains(&PricedPiece {
            belt_type: BeltType::exit(T0),
            cost: 2.5
        }));
        assert!(problem.tile(0).must_hold_piece());
        assert!(!problem.tile(1).must_hold_piece());
        assert!(problem.tile(2).must_hold_piece());
    }

    #[test]
    fn test_problem_applies_discount_and_penalty() {
        let mut tiles = vec![LineTile::open([T0]); 3];
        tiles[1] = LineTile::open([T0])
            .with_existing(ExistingBelt::new(Direction::East, BeltType::belt(T0)));
        let (grid, id) = grid_with(tiles);

        let mut table = PenaltyTable::new(2.0, 1.5, 0.5);
        table.escalate_shared(TilePosition::new(1, 0));
        let problem = LineProblem::from_grid(&grid, id, &catalog(), &costs, &table, 0.5).unwrap();

        let price = |bt: BeltType| {
            problem
                .tile(1)
                .pieces()
                .iter()
                .find(|p| p.belt_type == bt)
                .map(|p| p.cost)
        };
        // 1.0 · 0.5 + in-place penalty
        assert_eq!(price(BeltType::belt(T0)), Some(2.5));
        // 2.5 + general penalty
        assert_eq!(price(BeltType::entry(T0)), Some(4.5));
    }

    #[test]
    fn test_blocked_tile_offers_nothing() {
        let mut tiles = vec![LineTile::open([T0]); 4];
        tiles[2] = LineTile::blocked();
        let (grid, id) = grid_with(tiles);
        let table = PenaltyTable::new(2.0, 1.5, 0.9);
        let problem = LineProblem::from_grid(&grid, id, &catalog(), &costs, &table, 0.9).unwrap();
        assert!(problem.tile(2).pieces().is_empty());
        assert!(!problem.tile(2).must_hold_piece());
    }

    #[test]
    fn test_infinite_pieces_are_dropped() {
        let (grid, id) = grid_with(vec![LineTile::open([T0]); 2]);
        let table = PenaltyTable::new(2.0, 1.5, 0.9);
        let no_tunnels = |bt: BeltType, _: TilePosition, _: Direction| {
            if bt.is_underground() { f64::INFINITY } else { 1.0 }
        };
        let problem =
            LineProblem::from_grid(&grid, id, &catalog(), &no_tunnels, &table, 0.9).unwrap();
        assert!(problem.tiles().iter().all(|t| t.pieces().len() == 1));
    }

    #[test]
    fn test_line_cost_discounts_existing_pieces() {
        let mut tiles = vec![LineTile::open([T0]); 2];
        tiles[0] = LineTile::open([T0])
            .with_existing(ExistingBelt::new(Direction::East, BeltType::belt(T0)));
        let (grid, id) = grid_with(tiles);
        let line = LineAssignment::new(
            id,
            TilePosition::new(0, 0),
            Direction::East,
            vec![Some(BeltType::belt(T0)); 2],
        );
        assert_eq!(line_cost(&grid, &line, &costs, 0.5), 1.5);

        let assignment: GridAssignment = [line].into_iter().collect();
        assert_eq!(assignment_cost(&grid, &assignment, &costs, 0.5), 1.5);
    }
}
