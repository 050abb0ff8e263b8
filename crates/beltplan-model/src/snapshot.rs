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

//! # World Snapshots
//!
//! The planner never owns the world it plans in. It reads two narrow views
//! of it: which belts already exist (`EntitySnapshot`) and which tiles are
//! free to build on (`TileAvailability`). Both are queried once while lines
//! are scanned and never again during solving.

use crate::belt_type::BeltType;
use beltplan_core::geometry::{Direction, TilePosition};
use std::collections::BTreeMap;

/// A belt or underground belt that is already placed in the world.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ExistingBelt {
    pub direction: Direction,
    pub belt_type: BeltType,
}

impl ExistingBelt {
    #[inline]
    pub const fn new(direction: Direction, belt_type: BeltType) -> Self {
        Self {
            direction,
            belt_type,
        }
    }

    /// Whether placing `belt_type` facing `direction` would leave this entity untouched.
    #[inline]
    pub fn matches(&self, direction: Direction, belt_type: BeltType) -> bool {
        self.direction == direction && self.belt_type == belt_type
    }
}

/// Spatial lookup of already placed belts.
pub trait EntitySnapshot {
    fn belt_at(&self, tile: TilePosition) -> Option<ExistingBelt>;
}

/// Tells whether a tile is free of external obstacles.
pub trait TileAvailability {
    fn can_use_tile(&self, tile: TilePosition) -> bool;
}

impl<F> TileAvailability for F
where
    F: Fn(TilePosition) -> bool,
{
    #[inline]
    fn can_use_tile(&self, tile: TilePosition) -> bool {
        self(tile)
    }
}

/// Every tile is usable.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllTilesAvailable;

impl TileAvailability for AllTilesAvailable {
    #[inline]
    fn can_use_tile(&self, _tile: TilePosition) -> bool {
        true
    }
}

/// An ordered, in-memory `EntitySnapshot`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMap {
    belts: BTreeMap<TilePosition, ExistingBelt>,
}

impl SnapshotMap {
    #[inline]
    pub fn new() -> Self {
        Self {
            belts: BTreeMap::new(),
        }
    }

    /// Records an entity, returning the one it replaced.
    #[inline]
    pub fn insert(&mut self, tile: TilePosition, belt: ExistingBelt) -> Option<ExistingBelt> {
        self.belts.insert(tile, belt)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.belts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.belts.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (TilePosition, ExistingBelt)> + '_ {
        self.belts.iter().map(|(t, b)| (*t, *b))
    }
}

impl EntitySnapshot for SnapshotMap {
    #[inline]
    fn belt_at(&self, tile: TilePosition) -> Option<ExistingBelt> {
        self.belts.get(&tile).copied()
    }
}

impl FromIterator<(TilePosition, ExistingBelt)> for SnapshotMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (TilePosition, ExistingBelt)>,
    {
        Self {
            belts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TierIndex;

    #[test]
    fn test_snapshot_lookup() {
        let belt = ExistingBelt::new(Direction::East, BeltType::belt(TierIndex::new(0)));
        let snapshot: SnapshotMap = [(TilePosition::new(1, 1), belt)].into_iter().collect();
        assert_eq!(snapshot.belt_at(TilePosition::new(1, 1)), Some(belt));
        assert_eq!(snapshot.belt_at(TilePosition::new(0, 0)), None);
    }

    #[test]
    fn test_closure_availability() {
        let blocked = TilePosition::new(3, 0);
        let availability = move |tile: TilePosition| tile != blocked;
        assert!(availability.can_use_tile(TilePosition::new(2, 0)));
        assert!(!availability.can_use_tile(blocked));
        assert!(AllTilesAvailable.can_use_tile(blocked));
    }

    #[test]
    fn test_matches_requires_exact_piece() {
        let t = TierIndex::new(0);
        let belt = ExistingBelt::new(Direction::North, BeltType::entry(t));
        assert!(belt.matches(Direction::North, BeltType::entry(t)));
        assert!(!belt.matches(Direction::South, BeltType::entry(t)));
        assert!(!belt.matches(Direction::North, BeltType::belt(t)));
    }
}
