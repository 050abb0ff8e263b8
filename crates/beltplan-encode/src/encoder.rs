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

//! # Grid Encoder
//!
//! Translates a `BeltGrid` into variables and constraints of a
//! `ConstraintBackend`.
//!
//! ## Variables
//!
//! Per cell:
//!
//! - one selection literal per live `(direction, belt type)` option and one
//!   literal for "empty", of which exactly one holds;
//! - a line-id integer variable whose domain is the set of ids among the
//!   options, with one indicator literal per id;
//! - `has_output[d]` / `has_input[d]` aggregates per direction.
//!
//! Per tunnel candidate, one pair literal linking a non-isolated entry to a
//! non-isolated exit of the same tier ahead of it within range.
//!
//! ## Constraints
//!
//! - A cell outputs in at most one direction.
//! - An output into `d` requires the neighbour at `+d` to take input from
//!   `d` with the same line id, unless the cell ends a line. Symmetrically an
//!   input from `d` requires an output from the tile behind, unless the cell
//!   starts a line.
//! - Every non-isolated tunnel end is covered by exactly one pair. A pair
//!   holds only if no underground of its tier on its axis lies strictly
//!   between the two ends, and it equates their line ids.
//! - An isolated entry only ends a line and an isolated exit only starts
//!   one. Neither has a partner it would pair with in range.
//!
//! The objective sums the cost of every selected option. Options matching
//! the existing entity on their tile are discounted by
//! `EncoderConfig::in_place_discount`; options of infinite cost are
//! disabled.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::geometry::{Direction, TilePosition};
//! use beltplan_encode::{
//!     backend::{ConstraintBackend, SearchLimits},
//!     encoder::GridEncoder,
//!     search::SearchBackend,
//! };
//! use beltplan_model::{
//!     cost::TierCostFunction,
//!     grid::BeltGrid,
//!     index::TierIndex,
//!     line::{BeltLine, LineTile},
//!     tier::TierCatalog,
//! };
//!
//! let catalog = TierCatalog::vanilla();
//! let line = BeltLine::new(
//!     TilePosition::new(0, 0),
//!     Direction::East,
//!     vec![LineTile::open([TierIndex::new(0)]); 3],
//! )
//! .unwrap();
//! let mut grid = BeltGrid::new();
//! grid.add_line(&line, &catalog).unwrap();
//!
//! let mut backend = SearchBackend::new();
//! let costs = TierCostFunction::from_catalog(&catalog);
//! let encoding = GridEncoder::default()
//!     .encode(&grid, &catalog, &costs, &mut backend)
//!     .unwrap();
//! let solution = backend.solve(&SearchLimits::default());
//! let assignment = encoding.decode(&solution);
//! assert_eq!(assignment.cost::<f64, _>(&costs), 3.0);
//! ```

use crate::{
    backend::{BackendSolution, Constraint, ConstraintBackend, Domain, IntVar, Literal},
    error::EncodeError,
};
use beltplan_core::geometry::{Direction, TilePosition};
use beltplan_model::{
    belt_type::BeltType,
    cell::{BeltCell, LineIdSet},
    cost::CostFunction,
    grid::BeltGrid,
    index::LineId,
    line::signed_offset,
    solution::{GridAssignment, LineAssignment},
    tier::BeltCatalog,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tuning of the objective written by `GridEncoder`.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Factor applied to the cost of an option that keeps the existing entity.
    pub in_place_discount: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            in_place_discount: 0.9,
        }
    }
}

/// How `GridEncoding::apply_assignment` passes a known assignment to the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum WarmStart {
    /// Every piece of the assignment becomes a hard constraint, and unused
    /// cells are forced empty.
    Force,
    /// Every piece becomes a solution hint.
    #[default]
    Hint,
}

/// The selection literal of one cell option.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionVar {
    pub direction: Direction,
    pub belt_type: BeltType,
    pub line_ids: LineIdSet,
    pub literal: Literal,
}

/// The variables of one cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellEncoding {
    tile: TilePosition,
    options: Vec<OptionVar>,
    empty: Literal,
    line_id: Option<IntVar>,
    indicators: Vec<(LineId, Literal)>,
    has_output: [Option<Literal>; 4],
    has_input: [Option<Literal>; 4],
    is_line_start: bool,
    is_line_end: bool,
}

impl CellEncoding {
    #[inline]
    pub fn tile(&self) -> TilePosition {
        self.tile
    }

    #[inline]
    pub fn options(&self) -> &[OptionVar] {
        &self.options
    }

    #[inline]
    pub fn option(&self, direction: Direction, belt_type: BeltType) -> Option<&OptionVar> {
        self.options
            .iter()
            .find(|o| o.direction == direction && o.belt_type == belt_type)
    }

    #[inline]
    pub fn empty(&self) -> Literal {
        self.empty
    }

    /// The line-id variable, `None` for cells without options.
    #[inline]
    pub fn line_id_var(&self) -> Option<IntVar> {
        self.line_id
    }

    /// The literal "the line id of this cell equals `line_id`".
    #[inline]
    pub fn indicator(&self, line_id: LineId) -> Option<Literal> {
        self.indicators
            .iter()
            .find(|(id, _)| *id == line_id)
            .map(|(_, literal)| *literal)
    }

    #[inline]
    pub fn has_output(&self, direction: Direction) -> Option<Literal> {
        self.has_output[direction.index()]
    }

    #[inline]
    pub fn has_input(&self, direction: Direction) -> Option<Literal> {
        self.has_input[direction.index()]
    }

    /// The option selected by `solution`, if any.
    #[inline]
    pub fn selected(&self, solution: &BackendSolution) -> Option<&OptionVar> {
        self.options.iter().find(|o| solution.value(o.literal))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct LineFrame {
    start: TilePosition,
    direction: Direction,
    len: usize,
}

/// The variables written for a grid, used to decode solutions and to pass
/// warm starts.
#[derive(Clone, Debug, PartialEq)]
pub struct GridEncoding {
    cells: Vec<CellEncoding>,
    index: BTreeMap<TilePosition, usize>,
    lines: BTreeMap<LineId, LineFrame>,
    num_pairs: usize,
}

impl GridEncoding {
    /// All cell encodings in tile order.
    #[inline]
    pub fn cells(&self) -> &[CellEncoding] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, tile: TilePosition) -> Option<&CellEncoding> {
        self.index.get(&tile).map(|&i| &self.cells[i])
    }

    /// The number of tunnel pair literals.
    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.num_pairs
    }

    /// Reads the assignment of every line from `solution`.
    ///
    /// A solution without values decodes to lines with every tile empty.
    pub fn decode(&self, solution: &BackendSolution) -> GridAssignment {
        let mut tiles: BTreeMap<LineId, Vec<Option<BeltType>>> = self
            .lines
            .iter()
            .map(|(id, frame)| (*id, vec![None; frame.len]))
            .collect();

        for cell in &self.cells {
            let Some(option) = cell.selected(solution) else {
                continue;
            };
            let Some(line_id) = cell
                .line_id
                .and_then(|var| solution.int_value(var))
                .and_then(|value| u32::try_from(value).ok())
                .and_then(LineId::new)
            else {
                continue;
            };
            let Some(frame) = self.lines.get(&line_id) else {
                continue;
            };
            if frame.direction != option.direction {
                continue;
            }
            if let Some(offset) = frame.start.offset_along(frame.direction, cell.tile)
                && offset < frame.len
                && let Some(line_tiles) = tiles.get_mut(&line_id)
            {
                line_tiles[offset] = Some(option.belt_type);
            }
        }

        tiles
            .into_iter()
            .filter_map(|(id, line_tiles)| {
                self.lines
                    .get(&id)
                    .map(|frame| LineAssignment::new(id, frame.start, frame.direction, line_tiles))
            })
            .collect()
    }

    /// Passes `assignment` to `backend` as hard constraints or as hints.
    ///
    /// Fails with `EncodeError::NotEncodable` if a piece of the assignment is
    /// not among the options of its tile.
    pub fn apply_assignment<K>(
        &self,
        assignment: &GridAssignment,
        mode: WarmStart,
        backend: &mut K,
    ) -> Result<(), EncodeError>
    where
        K: ConstraintBackend + ?Sized,
    {
        let mut used = vec![false; self.cells.len()];
        let set = |backend: &mut K, literal: Literal| match mode {
            WarmStart::Force => backend.fix(literal),
            WarmStart::Hint => backend.add_hint(literal),
        };

        for line in assignment.lines() {
            let line_id = line.line_id();
            if !self.lines.contains_key(&line_id) {
                return Err(EncodeError::UnknownLine { line: line_id });
            }
            for (tile, belt_type) in line.occupied() {
                let not_encodable = || EncodeError::NotEncodable {
                    line: line_id,
                    tile,
                    direction: line.direction(),
                    belt_type,
                };
                let index = *self.index.get(&tile).ok_or_else(not_encodable)?;
                let cell = &self.cells[index];
                let option = cell
                    .option(line.direction(), belt_type)
                    .filter(|o| o.line_ids.contains(&line_id))
                    .ok_or_else(not_encodable)?;
                let indicator = cell.indicator(line_id).ok_or_else(not_encodable)?;

                set(backend, option.literal);
                set(backend, indicator);
                set(backend, !cell.empty);
                used[index] = true;
            }
        }

        for (cell, _) in self.cells.iter().zip(used).filter(|(_, used)| !used) {
            set(backend, cell.empty);
        }

        tracing::debug!(lines = assignment.len(), mode = ?mode, "applied warm start");
        Ok(())
    }

    /// Literals of every underground of `belt_type`'s tier on the axis of
    /// `direction`, strictly between `from` and `from + distance · direction`.
    fn undergrounds_between(
        &self,
        from: TilePosition,
        direction: Direction,
        distance: usize,
        belt_type: BeltType,
    ) -> Vec<Literal> {
        (1..distance)
            .filter_map(|k| self.cell(from.shifted(direction, signed_offset(k))))
            .flat_map(|cell| cell.options.iter())
            .filter(|o| {
                o.belt_type.is_underground()
                    && o.belt_type.tier() == belt_type.tier()
                    && o.direction.axis() == direction.axis()
            })
            .map(|o| o.literal)
            .collect()
    }
}

impl std::fmt::Display for GridEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let options: usize = self.cells.iter().map(|c| c.options.len()).sum();
        write!(
            f,
            "GridEncoding ({} cells, {} options, {} tunnel pairs, {} lines)",
            self.cells.len(),
            options,
            self.num_pairs,
            self.lines.len()
        )
    }
}

/// Writes a `BeltGrid` into a `ConstraintBackend`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridEncoder {
    config: EncoderConfig,
}

impl GridEncoder {
    #[inline]
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encodes `grid` into `backend`.
    ///
    /// Runs the grid's eager validation first. Infeasibility beyond that is
    /// left to the backend.
    pub fn encode<B, F, K>(
        &self,
        grid: &BeltGrid,
        catalog: &B,
        cost_fn: &F,
        backend: &mut K,
    ) -> Result<GridEncoding, EncodeError>
    where
        B: BeltCatalog + ?Sized,
        F: CostFunction<f64> + ?Sized,
        K: ConstraintBackend + ?Sized,
    {
        grid.validate()?;

        let mut encoding = GridEncoding {
            cells: Vec::with_capacity(grid.num_cells()),
            index: BTreeMap::new(),
            lines: grid
                .lines()
                .map(|(id, line)| {
                    (
                        id,
                        LineFrame {
                            start: line.start(),
                            direction: line.direction(),
                            len: line.len(),
                        },
                    )
                })
                .collect(),
            num_pairs: 0,
        };

        for cell in grid.cells() {
            let cell_encoding = self.encode_cell(cell, cost_fn, backend);
            encoding
                .index
                .insert(cell.tile(), encoding.cells.len());
            encoding.cells.push(cell_encoding);
        }

        Self::encode_chaining(&encoding, backend);
        encoding.num_pairs = Self::encode_pairing(&encoding, catalog, backend)?;
        Self::encode_isolated_ends(&encoding, catalog, backend)?;

        tracing::debug!(
            backend = backend.name(),
            cells = encoding.cells.len(),
            pairs = encoding.num_pairs,
            "encoded belt grid"
        );
        Ok(encoding)
    }

    fn encode_cell<F, K>(&self, cell: &BeltCell, cost_fn: &F, backend: &mut K) -> CellEncoding
    where
        F: CostFunction<f64> + ?Sized,
        K: ConstraintBackend + ?Sized,
    {
        let tile = cell.tile();

        let options: Vec<OptionVar> = cell
            .options()
            .into_iter()
            .map(|option| {
                let literal = backend.new_literal();
                let mut cost = cost_fn.cost(option.belt_type, tile, option.direction);
                if cell
                    .existing()
                    .is_some_and(|e| e.matches(option.direction, option.belt_type))
                {
                    cost *= self.config.in_place_discount;
                }
                if !cost.is_finite() {
                    backend.fix(!literal);
                } else if cost != 0.0 {
                    backend.add_objective_term(literal, cost);
                }
                OptionVar {
                    direction: option.direction,
                    belt_type: option.belt_type,
                    line_ids: option.line_ids,
                    literal,
                }
            })
            .collect();

        let empty = backend.new_literal();
        backend.add_constraint(Constraint::exactly_one(
            options.iter().map(|o| o.literal).chain([empty]),
        ));
        if !cell.can_be_empty() {
            backend.fix(!empty);
        }

        let mut ids: Vec<LineId> = options
            .iter()
            .flat_map(|o| o.line_ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let line_id = (!ids.is_empty())
            .then(|| backend.new_int_var(Domain::new(ids.iter().map(|&id| i64::from(id)))));

        let mut indicators = Vec::with_capacity(ids.len());
        if let Some(var) = line_id {
            for &id in &ids {
                let indicator = backend.new_literal();
                backend.add_implication(indicator, !empty);
                backend.add_constraint(
                    Constraint::int_eq_const(var, i64::from(id)).only_enforce_if([indicator]),
                );
                backend.add_constraint(
                    Constraint::int_ne_const(var, i64::from(id))
                        .only_enforce_if([!indicator, !empty]),
                );
                indicators.push((id, indicator));
            }
            backend.add_constraint(
                Constraint::exactly_one(indicators.iter().map(|(_, l)| *l))
                    .only_enforce_if([!empty]),
            );
            for option in &options {
                backend.add_constraint(
                    Constraint::bool_or(
                        indicators
                            .iter()
                            .filter(|(id, _)| option.line_ids.contains(id))
                            .map(|(_, l)| *l),
                    )
                    .only_enforce_if([option.literal]),
                );
            }
        }

        let mut has_output = [None; 4];
        let mut has_input = [None; 4];
        for direction in Direction::ALL {
            has_output[direction.index()] =
                Self::aggregate(&options, backend, |o| {
                    o.direction == direction && o.belt_type.has_output()
                });
            has_input[direction.index()] = Self::aggregate(&options, backend, |o| {
                o.direction == direction && o.belt_type.has_input()
            });
        }
        let outputs: Vec<Literal> = has_output.iter().flatten().copied().collect();
        if outputs.len() > 1 {
            backend.add_constraint(Constraint::at_most_one(outputs));
        }

        CellEncoding {
            tile,
            options,
            empty,
            line_id,
            indicators,
            has_output,
            has_input,
            is_line_start: cell.is_line_start(),
            is_line_end: cell.is_line_end(),
        }
    }

    /// A literal that holds iff one of the options matching `filter` is selected.
    fn aggregate<K, P>(options: &[OptionVar], backend: &mut K, filter: P) -> Option<Literal>
    where
        K: ConstraintBackend + ?Sized,
        P: Fn(&OptionVar) -> bool,
    {
        let members: Vec<Literal> = options
            .iter()
            .filter(|o| filter(o))
            .map(|o| o.literal)
            .collect();
        if members.is_empty() {
            return None;
        }
        let aggregate = backend.new_literal();
        for &member in &members {
            backend.add_implication(member, aggregate);
        }
        backend.add_constraint(Constraint::bool_or(members).only_enforce_if([aggregate]));
        Some(aggregate)
    }

    fn encode_chaining<K>(encoding: &GridEncoding, backend: &mut K)
    where
        K: ConstraintBackend + ?Sized,
    {
        for cell in &encoding.cells {
            for direction in Direction::ALL {
                if !cell.is_line_end
                    && let Some(output) = cell.has_output(direction)
                {
                    let next = encoding.cell(cell.tile.step(direction));
                    match next.and_then(|n| n.has_input(direction).map(|i| (n, i))) {
                        Some((next, input)) => {
                            backend.add_implication(output, input);
                            Self::equal_line_ids(cell, next, output, backend);
                        }
                        None => backend.fix(!output),
                    }
                }

                if !cell.is_line_start
                    && let Some(input) = cell.has_input(direction)
                {
                    let previous = encoding.cell(cell.tile.step(direction.opposite()));
                    match previous.and_then(|p| p.has_output(direction).map(|o| (p, o))) {
                        Some((previous, output)) => {
                            backend.add_implication(input, output);
                            Self::equal_line_ids(cell, previous, input, backend);
                        }
                        None => backend.fix(!input),
                    }
                }
            }
        }
    }

    fn equal_line_ids<K>(a: &CellEncoding, b: &CellEncoding, when: Literal, backend: &mut K)
    where
        K: ConstraintBackend + ?Sized,
    {
        if let (Some(x), Some(y)) = (a.line_id, b.line_id) {
            backend.add_constraint(Constraint::int_eq(x, y).only_enforce_if([when]));
        }
    }

    fn encode_pairing<B, K>(
        encoding: &GridEncoding,
        catalog: &B,
        backend: &mut K,
    ) -> Result<usize, EncodeError>
    where
        B: BeltCatalog + ?Sized,
        K: ConstraintBackend + ?Sized,
    {
        let mut entry_pairs: BTreeMap<Literal, Vec<Literal>> = BTreeMap::new();
        let mut exit_pairs: BTreeMap<Literal, Vec<Literal>> = BTreeMap::new();
        let mut num_pairs = 0;

        for cell in &encoding.cells {
            for option in &cell.options {
                match option.belt_type {
                    BeltType::OutputUnderground {
                        isolated: false, ..
                    } => {
                        exit_pairs.entry(option.literal).or_default();
                    }
                    BeltType::InputUnderground {
                        tier,
                        isolated: false,
                    } => {
                        let pairs = entry_pairs.entry(option.literal).or_default();
                        let max = catalog.require_tier(tier)?.max_tunnel_distance();
                        for distance in 1..=max {
                            let tile = cell.tile.shifted(option.direction, signed_offset(distance));
                            let Some(partner_cell) = encoding.cell(tile) else {
                                continue;
                            };
                            let Some(partner) =
                                partner_cell.option(option.direction, BeltType::exit(tier))
                            else {
                                continue;
                            };

                            let pair = backend.new_literal();
                            backend.add_implication(pair, option.literal);
                            backend.add_implication(pair, partner.literal);
                            for blocker in encoding.undergrounds_between(
                                cell.tile,
                                option.direction,
                                distance,
                                option.belt_type,
                            ) {
                                backend.add_implication(pair, !blocker);
                            }
                            Self::equal_line_ids(cell, partner_cell, pair, backend);

                            pairs.push(pair);
                            exit_pairs.entry(partner.literal).or_default().push(pair);
                            num_pairs += 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        for (end, pairs) in entry_pairs.into_iter().chain(exit_pairs) {
            if pairs.is_empty() {
                backend.fix(!end);
            } else {
                backend.add_constraint(Constraint::bool_or(pairs).only_enforce_if([end]));
            }
        }
        Ok(num_pairs)
    }

    /// An isolated entry may only end a line and an isolated exit may only
    /// start one. It must not see a partner it would pair with either: every
    /// same-tier end facing the same way within range needs an underground
    /// of that tier on the axis in between.
    fn encode_isolated_ends<B, K>(
        encoding: &GridEncoding,
        catalog: &B,
        backend: &mut K,
    ) -> Result<(), EncodeError>
    where
        B: BeltCatalog + ?Sized,
        K: ConstraintBackend + ?Sized,
    {
        for cell in &encoding.cells {
            for option in cell.options.iter().filter(|o| o.belt_type.is_isolated()) {
                let looks_ahead = option.belt_type.has_input();
                let at_line_edge = if looks_ahead {
                    cell.is_line_end
                } else {
                    cell.is_line_start
                };
                if !at_line_edge {
                    backend.fix(!option.literal);
                    continue;
                }

                let tier = option.belt_type.tier();
                let max = catalog.require_tier(tier)?.max_tunnel_distance();

                for distance in 1..=max {
                    let offset = signed_offset(distance);
                    let (other_tile, from) = if looks_ahead {
                        (cell.tile.shifted(option.direction, offset), cell.tile)
                    } else {
                        let behind = cell.tile.shifted(option.direction, -offset);
                        (behind, behind)
                    };
                    let Some(other) = encoding.cell(other_tile) else {
                        continue;
                    };
                    let blockers = encoding.undergrounds_between(
                        from,
                        option.direction,
                        distance,
                        option.belt_type,
                    );

                    for partner in other.options.iter().filter(|o| {
                        o.direction == option.direction
                            && o.belt_type.tier() == tier
                            && o.belt_type.is_underground()
                            && o.belt_type.has_input() != looks_ahead
                    }) {
                        backend.add_constraint(
                            Constraint::bool_or(
                                std::iter::once(!partner.literal).chain(blockers.iter().copied()),
                            )
                            .only_enforce_if([option.literal]),
                        );
                    }
                }
            }
        }
        Ok(())
    }
}
