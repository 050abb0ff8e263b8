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

//! # Belt Cells
//!
//! A `BeltCell` is the option table of one tile: every `(direction, belt type)`
//! choice some line may make there, together with the set of lines allowed to
//! make it. On top of the raw table a cell carries forced values (pinned
//! direction, line, or piece), line start/end markers, a non-empty obligation,
//! and directions from which it must never take input.
//!
//! `BeltCell::options` is the single source of truth for what a solver may pick
//! on a tile: it applies every restriction to the raw table.
//!
//! ## Forced values
//!
//! Each forced field is written at most once. Writing the same value again is
//! a no-op; writing a different value is a `ModelError::ConflictingForcedValue`.

use crate::{
    belt_type::BeltType,
    error::{ForcedField, ModelError},
    index::LineId,
    snapshot::ExistingBelt,
};
use beltplan_core::geometry::{Direction, DirectionSet, TilePosition};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Sorted, duplicate-free set of line ids.
pub type LineIdSet = SmallVec<[LineId; 2]>;

/// A value that may be set once.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ForcedValue<T> {
    value: Option<T>,
}

impl<T> Default for ForcedValue<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> ForcedValue<T>
where
    T: Copy + PartialEq,
{
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.value
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Sets the value, returning the previously forced value on conflict.
    #[inline]
    pub fn set(&mut self, value: T) -> Result<(), T> {
        match self.value {
            Some(existing) if existing != value => Err(existing),
            _ => {
                self.value = Some(value);
                Ok(())
            }
        }
    }

    /// Whether `value` is compatible with the forced state.
    #[inline]
    pub fn admits(&self, value: T) -> bool {
        self.value.is_none_or(|v| v == value)
    }
}

/// Key of the option table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OptionKey {
    pub direction: Direction,
    pub belt_type: BeltType,
}

/// A live option of a cell, after all restrictions are applied.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CellOption {
    pub direction: Direction,
    pub belt_type: BeltType,
    pub line_ids: LineIdSet,
}

impl CellOption {
    #[inline]
    pub fn key(&self) -> OptionKey {
        OptionKey {
            direction: self.direction,
            belt_type: self.belt_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BeltCell {
    tile: TilePosition,
    options: BTreeMap<OptionKey, LineIdSet>,
    forced_direction: ForcedValue<Direction>,
    forced_line_id: ForcedValue<LineId>,
    forced_belt_type: ForcedValue<BeltType>,
    is_line_start: bool,
    is_line_end: bool,
    must_not_be_empty: bool,
    no_input_directions: DirectionSet,
    existing: Option<ExistingBelt>,
}

impl BeltCell {
    pub fn new(tile: TilePosition) -> Self {
        Self {
            tile,
            options: BTreeMap::new(),
            forced_direction: ForcedValue::default(),
            forced_line_id: ForcedValue::default(),
            forced_belt_type: ForcedValue::default(),
            is_line_start: false,
            is_line_end: false,
            must_not_be_empty: false,
            no_input_directions: DirectionSet::empty(),
            existing: None,
        }
    }

    #[inline]
    pub fn tile(&self) -> TilePosition {
        self.tile
    }

    /// Registers `line_id` as a user of `(direction, belt_type)` on this tile.
    pub fn add_option(&mut self, direction: Direction, belt_type: BeltType, line_id: LineId) {
        let ids = self
            .options
            .entry(OptionKey {
                direction,
                belt_type,
            })
            .or_default();
        if let Err(position) = ids.binary_search(&line_id) {
            ids.insert(position, line_id);
        }
    }

    /// Marks the first tile of a line. Forces direction and line id.
    pub fn make_line_start(
        &mut self,
        direction: Direction,
        line_id: LineId,
    ) -> Result<(), ModelError> {
        self.force_direction(direction)?;
        self.force_line_id(line_id)?;
        self.is_line_start = true;
        Ok(())
    }

    /// Marks the last tile of a line. Forces direction and line id.
    pub fn make_line_end(&mut self, direction: Direction, line_id: LineId) -> Result<(), ModelError> {
        self.force_direction(direction)?;
        self.force_line_id(line_id)?;
        self.is_line_end = true;
        Ok(())
    }

    /// Pins the exact piece and registers it as an option.
    pub fn force_as(
        &mut self,
        direction: Direction,
        line_id: LineId,
        belt_type: BeltType,
    ) -> Result<(), ModelError> {
        self.force_direction(direction)?;
        self.force_line_id(line_id)?;
        self.forced_belt_type
            .set(belt_type)
            .map_err(|existing| self.conflict(ForcedField::BeltType, existing, belt_type))?;
        self.add_option(direction, belt_type, line_id);
        Ok(())
    }

    /// Requires the tile to carry a piece of `line_id`.
    pub fn make_non_empty(&mut self, line_id: LineId) -> Result<(), ModelError> {
        self.force_line_id(line_id)?;
        self.must_not_be_empty = true;
        Ok(())
    }

    /// Forbids pieces facing `direction` that take input from the tile behind them.
    #[inline]
    pub fn must_not_take_input_in(&mut self, direction: Direction) {
        self.no_input_directions.insert(direction);
    }

    #[inline]
    pub fn set_existing(&mut self, existing: ExistingBelt) {
        self.existing = Some(existing);
    }

    fn force_direction(&mut self, direction: Direction) -> Result<(), ModelError> {
        self.forced_direction
            .set(direction)
            .map_err(|existing| self.conflict(ForcedField::Direction, existing, direction))
    }

    fn force_line_id(&mut self, line_id: LineId) -> Result<(), ModelError> {
        self.forced_line_id
            .set(line_id)
            .map_err(|existing| self.conflict(ForcedField::LineId, existing, line_id))
    }

    fn conflict<T>(&self, field: ForcedField, existing: T, requested: T) -> ModelError
    where
        T: std::fmt::Display,
    {
        ModelError::ConflictingForcedValue {
            tile: self.tile,
            field,
            existing: existing.to_string(),
            requested: requested.to_string(),
        }
    }

    /// The live options, filtered by every forced value and input ban.
    ///
    /// A tunnel exit facing a banned direction stays allowed; it takes no
    /// input from the tile behind it.
    pub fn options(&self) -> Vec<CellOption> {
        self.options
            .iter()
            .filter(|(key, _)| {
                self.forced_direction.admits(key.direction)
                    && self.forced_belt_type.admits(key.belt_type)
                    && !(key.belt_type.has_input()
                        && self.no_input_directions.contains(key.direction))
            })
            .filter_map(|(key, ids)| {
                let line_ids: LineIdSet = ids
                    .iter()
                    .copied()
                    .filter(|id| self.forced_line_id.admits(*id))
                    .collect();
                (!line_ids.is_empty()).then_some(CellOption {
                    direction: key.direction,
                    belt_type: key.belt_type,
                    line_ids,
                })
            })
            .collect()
    }

    /// Whether the tile may be left without any piece.
    #[inline]
    pub fn can_be_empty(&self) -> bool {
        !(self.must_not_be_empty
            || self.forced_belt_type.is_set()
            || self.is_line_start
            || self.is_line_end)
    }

    /// Fails if the tile must carry a piece but no option survives the restrictions.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.can_be_empty() && self.options().is_empty() {
            return Err(ModelError::NoCompatibleOptions { tile: self.tile });
        }
        Ok(())
    }

    #[inline]
    pub fn raw_options(&self) -> &BTreeMap<OptionKey, LineIdSet> {
        &self.options
    }

    #[inline]
    pub fn forced_direction(&self) -> Option<Direction> {
        self.forced_direction.get()
    }

    #[inline]
    pub fn forced_line_id(&self) -> Option<LineId> {
        self.forced_line_id.get()
    }

    #[inline]
    pub fn forced_belt_type(&self) -> Option<BeltType> {
        self.forced_belt_type.get()
    }

    #[inline]
    pub fn is_line_start(&self) -> bool {
        self.is_line_start
    }

    #[inline]
    pub fn is_line_end(&self) -> bool {
        self.is_line_end
    }

    #[inline]
    pub fn must_not_be_empty(&self) -> bool {
        self.must_not_be_empty
    }

    #[inline]
    pub fn no_input_directions(&self) -> DirectionSet {
        self.no_input_directions
    }

    #[inline]
    pub fn existing(&self) -> Option<ExistingBelt> {
        self.existing
    }
}

impl std::fmt::Display for BeltCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BeltCell {} [", self.tile)?;
        for (i, option) in self.options().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", option.direction, option.belt_type)?;
        }
        write!(f, "]")
    }
}
