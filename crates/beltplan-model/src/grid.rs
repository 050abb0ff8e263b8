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

//! # Belt Grid
//!
//! The `BeltGrid` maps tiles to `BeltCell`s and owns the line id space.
//! Lines are registered one at a time with `add_line`, which translates each
//! `LineTile` obligation into options and forced values on the cells the line
//! covers. Cells shared by several lines accumulate options from all of them;
//! it is the solver's job to pick at most one per tile.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::geometry::{Direction, TilePosition};
//! use beltplan_model::{
//!     grid::BeltGrid,
//!     index::TierIndex,
//!     line::{BeltLine, LineTile},
//!     tier::TierCatalog,
//! };
//!
//! let catalog = TierCatalog::vanilla();
//! let tiles = vec![LineTile::open([TierIndex::new(0)]); 4];
//! let line = BeltLine::new(TilePosition::new(0, 0), Direction::East, tiles).unwrap();
//!
//! let mut grid = BeltGrid::new();
//! let id = grid.add_line(&line, &catalog).unwrap();
//! grid.validate().unwrap();
//! assert_eq!(grid.only_usable_by(TilePosition::new(0, 0)), Some(id));
//! ```

use crate::{
    belt_type::BeltType,
    cell::BeltCell,
    error::ModelError,
    index::{LineId, LineIdTag},
    line::BeltLine,
    tier::BeltCatalog,
};
use beltplan_core::{geometry::TilePosition, id::IdCounter};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct BeltGrid {
    cells: BTreeMap<TilePosition, BeltCell>,
    lines: BTreeMap<LineId, BeltLine>,
    line_ids: IdCounter<LineIdTag>,
}

impl BeltGrid {
    #[inline]
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            lines: BTreeMap::new(),
            line_ids: IdCounter::new(),
        }
    }

    /// Issues a fresh line id from the grid's own counter.
    #[inline]
    pub fn new_line_id(&mut self) -> LineId {
        self.line_ids.next_id()
    }

    #[inline]
    pub fn cell(&self, tile: TilePosition) -> Option<&BeltCell> {
        self.cells.get(&tile)
    }

    /// Returns the cell at `tile`, creating an empty one if needed.
    #[inline]
    pub fn cell_mut(&mut self, tile: TilePosition) -> &mut BeltCell {
        self.cells
            .entry(tile)
            .or_insert_with(|| BeltCell::new(tile))
    }

    /// All cells in tile order.
    #[inline]
    pub fn cells(&self) -> impl Iterator<Item = &BeltCell> + '_ {
        self.cells.values()
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// All registered lines in id order.
    #[inline]
    pub fn lines(&self) -> impl Iterator<Item = (LineId, &BeltLine)> + '_ {
        self.lines.iter().map(|(id, line)| (*id, line))
    }

    #[inline]
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, line_id: LineId) -> Result<&BeltLine, ModelError> {
        self.lines
            .get(&line_id)
            .ok_or(ModelError::UnknownLine { line: line_id })
    }

    /// The line a tile is reserved for, if any.
    #[inline]
    pub fn only_usable_by(&self, tile: TilePosition) -> Option<LineId> {
        self.cells.get(&tile).and_then(BeltCell::forced_line_id)
    }

    /// Registers `line` and returns its new id.
    ///
    /// Every allowed tier contributes a belt, a tunnel entry, and a tunnel exit
    /// option facing the line direction. Pinned tiles contribute only their
    /// pinned piece. The first and last tile are marked as line start and end,
    /// and the tile just past the end is banned from taking input from the line.
    ///
    /// On error the grid may be partially updated and should be discarded.
    pub fn add_line<B>(&mut self, line: &BeltLine, catalog: &B) -> Result<LineId, ModelError>
    where
        B: BeltCatalog + ?Sized,
    {
        line.validate(catalog)?;

        let line_id = self.new_line_id();
        let direction = line.direction();
        let last = line.len() - 1;

        for (offset, line_tile) in line.tiles().iter().enumerate() {
            let cell = self.cell_mut(line.tile_position(offset));

            if let Some(existing) = line_tile.existing() {
                cell.set_existing(existing);
            }

            match line_tile.must_match() {
                Some(belt_type) => cell.force_as(direction, line_id, belt_type)?,
                None => {
                    for &tier in line_tile.allowed_tiers() {
                        cell.add_option(direction, BeltType::belt(tier), line_id);
                        cell.add_option(direction, BeltType::entry(tier), line_id);
                        cell.add_option(direction, BeltType::exit(tier), line_id);
                    }
                }
            }

            if line_tile.must_be_not_empty() {
                cell.make_non_empty(line_id)?;
            }
            if offset == 0 {
                cell.make_line_start(direction, line_id)?;
            }
            if offset == last {
                cell.make_line_end(direction, line_id)?;
            }
        }

        self.cell_mut(line.tile_position(line.len()))
            .must_not_take_input_in(direction);

        self.lines.insert(line_id, line.clone());
        Ok(line_id)
    }

    /// Runs every eager contradiction check.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.cells.values().try_for_each(BeltCell::validate)
    }
}

impl std::fmt::Display for BeltGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "BeltGrid ({} lines, {} cells)",
            self.lines.len(),
            self.cells.len()
        )?;
        for (id, line) in &self.lines {
            writeln!(f, "  {}: {}", id, line)?;
        }
        Ok(())
    }
}
