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

//! # Belt Lines
//!
//! A `BeltLine` is a straight run of tiles, all facing one direction, that has
//! to carry one continuous conveyor path from its first to its last tile. How
//! the path is realized (plain belts, tunnels under obstacles, which tier) is
//! left to the solver; the line only records per-tile obligations:
//!
//! - `allowed_tiers`: the tiers usable on the tile, empty for a blocked tile
//!   that a tunnel may only pass under;
//! - `must_be_not_empty`: the tile has to carry a piece of this line;
//! - `must_match`: the tile has to carry exactly this piece;
//! - `existing`: the entity already standing on the tile, which makes
//!   rebuilding it in place cheaper.
//!
//! Lines are usually produced by `BeltLine::scan`, which reads the world
//! through an `EntitySnapshot` and a `TileAvailability` predicate.

use crate::{
    belt_type::BeltType,
    error::ModelError,
    index::TierIndex,
    snapshot::{EntitySnapshot, ExistingBelt, TileAvailability},
    tier::BeltCatalog,
};
use beltplan_core::geometry::{Direction, TilePosition};
use smallvec::SmallVec;

/// Longest line, and longest tunnel, a grid can hold: offsets along a line
/// must fit the signed tile coordinates.
pub const MAX_LINE_LEN: usize = i32::MAX as usize;

/// Converts a tile offset along a line into a signed shift.
///
/// Offsets are bounded by [`MAX_LINE_LEN`]; larger ones saturate.
#[inline]
pub fn signed_offset(offset: usize) -> i32 {
    debug_assert!(
        offset <= MAX_LINE_LEN,
        "called `signed_offset` with an offset past the longest line: the max is {} but the offset is {}",
        MAX_LINE_LEN,
        offset
    );
    i32::try_from(offset).unwrap_or(i32::MAX)
}

/// Small, ordered set of tiers usable on one tile.
pub type TierSet = SmallVec<[TierIndex; 4]>;

/// Per-tile obligations of a belt line.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LineTile {
    must_be_not_empty: bool,
    must_match: Option<BeltType>,
    allowed_tiers: TierSet,
    existing: Option<ExistingBelt>,
}

impl LineTile {
    /// A free tile usable with any of `tiers`.
    pub fn open<I>(tiers: I) -> Self
    where
        I: IntoIterator<Item = TierIndex>,
    {
        let mut allowed_tiers: TierSet = tiers.into_iter().collect();
        allowed_tiers.sort_unstable();
        allowed_tiers.dedup();
        Self {
            allowed_tiers,
            ..Self::default()
        }
    }

    /// A structurally blocked tile. Tunnels may pass under it.
    #[inline]
    pub fn blocked() -> Self {
        Self::default()
    }

    /// A tile holding `existing`. With `preserve` the entity must stay exactly as it is.
    pub fn from_existing<I>(existing: ExistingBelt, tiers: I, preserve: bool) -> Self
    where
        I: IntoIterator<Item = TierIndex>,
    {
        if preserve {
            Self::open([existing.belt_type.tier()])
                .with_must_match(existing.belt_type)
                .with_existing(existing)
        } else {
            Self::open(tiers).with_existing(existing)
        }
    }

    /// Reads the tile at `tile` of a line facing `direction` from the world.
    ///
    /// Unavailable tiles and tiles holding a belt that faces another direction
    /// are blocked. A belt facing `direction` becomes the existing entity and,
    /// under `ExistingPolicy::Preserve`, is pinned.
    pub fn from_snapshot<S, A>(
        snapshot: &S,
        availability: &A,
        tile: TilePosition,
        direction: Direction,
        tiers: &[TierIndex],
        policy: ExistingPolicy,
    ) -> Self
    where
        S: EntitySnapshot + ?Sized,
        A: TileAvailability + ?Sized,
    {
        if !availability.can_use_tile(tile) {
            return Self::blocked();
        }
        match snapshot.belt_at(tile) {
            Some(existing) if existing.direction == direction => Self::from_existing(
                existing,
                tiers.iter().copied(),
                policy == ExistingPolicy::Preserve,
            ),
            Some(_) => Self::blocked(),
            None => Self::open(tiers.iter().copied()),
        }
    }

    #[inline]
    pub fn with_must_be_not_empty(mut self) -> Self {
        self.must_be_not_empty = true;
        self
    }

    /// Pins the exact piece. A pinned tile is also non-empty.
    #[inline]
    pub fn with_must_match(mut self, belt_type: BeltType) -> Self {
        self.must_match = Some(belt_type);
        self.must_be_not_empty = true;
        self
    }

    #[inline]
    pub fn with_existing(mut self, existing: ExistingBelt) -> Self {
        self.existing = Some(existing);
        self
    }

    #[inline]
    pub fn must_be_not_empty(&self) -> bool {
        self.must_be_not_empty
    }

    #[inline]
    pub fn must_match(&self) -> Option<BeltType> {
        self.must_match
    }

    #[inline]
    pub fn allowed_tiers(&self) -> &[TierIndex] {
        &self.allowed_tiers
    }

    #[inline]
    pub fn existing(&self) -> Option<ExistingBelt> {
        self.existing
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.allowed_tiers.is_empty()
    }
}

/// How `BeltLine::scan` treats belts already standing on the line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ExistingPolicy {
    /// Existing belts may be replaced; they only make rebuilding in place cheaper.
    #[default]
    Replace,
    /// Existing belts facing the line direction must be kept exactly.
    Preserve,
}

/// A straight run of tiles that must carry one conveyor path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeltLine {
    start: TilePosition,
    direction: Direction,
    tiles: Vec<LineTile>,
}

impl BeltLine {
    pub fn new(
        start: TilePosition,
        direction: Direction,
        tiles: Vec<LineTile>,
    ) -> Result<Self, ModelError> {
        if tiles.is_empty() {
            return Err(ModelError::EmptyLine { start, direction });
        }
        Self::check_len(start, direction, tiles.len())?;
        Ok(Self {
            start,
            direction,
            tiles,
        })
    }

    /// Builds a line of `len` tiles by reading the world.
    ///
    /// Tiles rejected by `availability`, or holding a belt that faces another
    /// direction, become blocked. Belts facing the line direction are recorded
    /// as existing and, under `ExistingPolicy::Preserve`, pinned.
    pub fn scan<S, A>(
        start: TilePosition,
        direction: Direction,
        len: usize,
        tiers: &[TierIndex],
        snapshot: &S,
        availability: &A,
        policy: ExistingPolicy,
    ) -> Result<Self, ModelError>
    where
        S: EntitySnapshot + ?Sized,
        A: TileAvailability + ?Sized,
    {
        Self::check_len(start, direction, len)?;
        let tiles = (0..len)
            .map(|offset| {
                let tile = start.shifted(direction, signed_offset(offset));
                LineTile::from_snapshot(snapshot, availability, tile, direction, tiers, policy)
            })
            .collect();
        Self::new(start, direction, tiles)
    }

    fn check_len(start: TilePosition, direction: Direction, len: usize) -> Result<(), ModelError> {
        if len > MAX_LINE_LEN {
            return Err(ModelError::LineTooLong {
                start,
                direction,
                len,
                max: MAX_LINE_LEN,
            });
        }
        Ok(())
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
    pub fn tiles(&self) -> &[LineTile] {
        &self.tiles
    }

    /// Returns the tile record at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is out of bounds.
    #[inline]
    pub fn tile(&self, offset: usize) -> &LineTile {
        debug_assert!(
            offset < self.tiles.len(),
            "called `BeltLine::tile` with offset out of bounds: the len is {} but the offset is {}",
            self.tiles.len(),
            offset
        );
        &self.tiles[offset]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always `false`; lines have at least one tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// World position of the tile at `offset`. Offsets past the end are allowed.
    #[inline]
    pub fn tile_position(&self, offset: usize) -> TilePosition {
        self.start.shifted(self.direction, signed_offset(offset))
    }

    /// The offset of `tile` on this line, if it lies on it.
    #[inline]
    pub fn offset_of(&self, tile: TilePosition) -> Option<usize> {
        self.start
            .offset_along(self.direction, tile)
            .filter(|&offset| offset < self.tiles.len())
    }

    /// Checks the per-tile obligations for contradictions.
    pub fn validate<B>(&self, catalog: &B) -> Result<(), ModelError>
    where
        B: BeltCatalog + ?Sized,
    {
        for (offset, tile) in self.tiles.iter().enumerate() {
            for &tier in tile.allowed_tiers() {
                catalog.require_tier(tier)?;
            }

            if tile.is_blocked() {
                if tile.must_match().is_some() {
                    return Err(ModelError::BlockedTileContradiction {
                        start: self.start,
                        offset,
                        reason: "it must match a belt type",
                    });
                }
                if tile.must_be_not_empty() {
                    return Err(ModelError::BlockedTileContradiction {
                        start: self.start,
                        offset,
                        reason: "it must not be empty",
                    });
                }
            }

            if let Some(belt_type) = tile.must_match()
                && !tile.allowed_tiers().contains(&belt_type.tier())
            {
                return Err(ModelError::TierMismatch {
                    start: self.start,
                    offset,
                    tier: belt_type.tier(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for BeltLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BeltLine(start: {}, direction: {}, len: {})",
            self.start,
            self.direction,
            self.tiles.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        snapshot::{AllTilesAvailable, SnapshotMap},
        tier::TierCatalog,
    };

    const T0: TierIndex = TierIndex::new(0);

    #[test]
    fn test_empty_line_is_rejected() {
        let err = BeltLine::new(TilePosition::new(0, 0), Direction::East, vec![]).unwrap_err();
        assert!(matches!(err, ModelError::EmptyLine { .. }));
    }

    #[test]
    fn test_overlong_scan_is_rejected_before_reading() {
        let err = BeltLine::scan(
            TilePosition::new(0, 0),
            Direction::East,
            MAX_LINE_LEN + 1,
            &[T0],
            &SnapshotMap::new(),
            &AllTilesAvailable,
            ExistingPolicy::Replace,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::LineTooLong {
                start: TilePosition::new(0, 0),
                direction: Direction::East,
                len: MAX_LINE_LEN + 1,
                max: MAX_LINE_LEN,
            }
        );
    }

    #[test]
    fn test_signed_offset_covers_the_longest_line() {
        assert_eq!(signed_offset(0), 0);
        assert_eq!(signed_offset(7), 7);
        assert_eq!(signed_offset(MAX_LINE_LEN), i32::MAX);
    }

    #[test]
    fn test_tile_positions_and_offsets() {
        let line = BeltLine::new(
            TilePosition::new(2, 2),
            Direction::North,
            vec![LineTile::open([T0]); 4],
        )
        .unwrap();
        assert_eq!(line.tile_position(3), TilePosition::new(2, -1));
        assert_eq!(line.offset_of(TilePosition::new(2, 0)), Some(2));
        assert_eq!(line.offset_of(TilePosition::new(2, -2)), None);
        assert_eq!(line.offset_of(TilePosition::new(2, 3)), None);
    }

    #[test]
    fn test_blocked_mandatory_tile_fails_fast() {
        let catalog = TierCatalog::vanilla();
        let line = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![
                LineTile::open([T0]),
                LineTile::blocked().with_must_be_not_empty(),
                LineTile::open([T0]),
            ],
        )
        .unwrap();
        assert!(matches!(
            line.validate(&catalog),
            Err(ModelError::BlockedTileContradiction { offset: 1, .. })
        ));
    }

    #[test]
    fn test_must_match_outside_allowed_tiers() {
        let catalog = TierCatalog::vanilla();
        let line = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![LineTile::open([T0]).with_must_match(BeltType::belt(TierIndex::new(1)))],
        )
        .unwrap();
        assert!(matches!(
            line.validate(&catalog),
            Err(ModelError::TierMismatch { offset: 0, .. })
        ));
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        let catalog = TierCatalog::vanilla();
        let line = BeltLine::new(
            TilePosition::new(0, 0),
            Direction::East,
            vec![LineTile::open([TierIndex::new(9)])],
        )
        .unwrap();
        assert!(matches!(
            line.validate(&catalog),
            Err(ModelError::UnknownTier { .. })
        ));
    }

    #[test]
    fn test_scan_reads_obstacles_and_existing_belts() {
        let existing = ExistingBelt::new(Direction::East, BeltType::belt(T0));
        let crossing = ExistingBelt::new(Direction::South, BeltType::belt(T0));
        let snapshot: SnapshotMap = [
            (TilePosition::new(1, 0), existing),
            (TilePosition::new(2, 0), crossing),
        ]
        .into_iter()
        .collect();
        let rock = TilePosition::new(3, 0);
        let availability = move |tile: TilePosition| tile != rock;

        let line = BeltLine::scan(
            TilePosition::new(0, 0),
            Direction::East,
            5,
            &[T0],
            &snapshot,
            &availability,
            ExistingPolicy::Preserve,
        )
        .unwrap();

        assert!(!line.tile(0).is_blocked());
        assert_eq!(line.tile(1).must_match(), Some(BeltType::belt(T0)));
        assert!(line.tile(1).must_be_not_empty());
        assert_eq!(line.tile(1).existing(), Some(existing));
        assert!(line.tile(2).is_blocked());
        assert!(line.tile(3).is_blocked());
        assert!(!line.tile(4).is_blocked());
    }

    #[test]
    fn test_scan_replace_policy_only_records_existing() {
        let existing = ExistingBelt::new(Direction::West, BeltType::entry(T0));
        let snapshot: SnapshotMap = [(TilePosition::new(-1, 0), existing)].into_iter().collect();
        let line = BeltLine::scan(
            TilePosition::new(0, 0),
            Direction::West,
            3,
            &[T0],
            &snapshot,
            &AllTilesAvailable,
            ExistingPolicy::Replace,
        )
        .unwrap();
        assert_eq!(line.tile(1).existing(), Some(existing));
        assert_eq!(line.tile(1).must_match(), None);
        assert!(!line.tile(1).must_be_not_empty());
    }

    #[test]
    fn test_from_snapshot_blocks_unavailable_tile_with_belt() {
        let tile = TilePosition::new(4, 4);
        let existing = ExistingBelt::new(Direction::North, BeltType::belt(T0));
        let snapshot: SnapshotMap = [(tile, existing)].into_iter().collect();
        let nothing_usable = |_: TilePosition| false;

        let blocked = LineTile::from_snapshot(
            &snapshot,
            &nothing_usable,
            tile,
            Direction::North,
            &[T0],
            ExistingPolicy::Preserve,
        );
        assert!(blocked.is_blocked());
        assert_eq!(blocked.existing(), None);

        let kept = LineTile::from_snapshot(
            &snapshot,
            &AllTilesAvailable,
            tile,
            Direction::North,
            &[T0],
            ExistingPolicy::Preserve,
        );
        assert_eq!(kept.must_match(), Some(BeltType::belt(T0)));
    }
}
