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

//! # Grid Geometry
//!
//! Integer tile coordinates and the four cardinal directions of the planning
//! grid. The `y` axis grows southwards, matching the usual screen layout of
//! factory blueprints, so `North` is `(0, -1)` and `East` is `(1, 0)`.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::geometry::{Direction, TilePosition};
//!
//! let start = TilePosition::new(2, 3);
//! assert_eq!(start.shifted(Direction::East, 4), TilePosition::new(6, 3));
//! assert_eq!(Direction::North.opposite(), Direction::South);
//! assert_eq!(start.offset_along(Direction::South, TilePosition::new(2, 7)), Some(4));
//! ```

/// The axis a direction travels along.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Axis {
    /// East-west travel.
    Horizontal,
    /// North-south travel.
    Vertical,
}

impl Axis {
    /// Returns both directions travelling along this axis.
    #[inline]
    pub const fn directions(self) -> [Direction; 2] {
        match self {
            Axis::Horizontal => [Direction::East, Direction::West],
            Axis::Vertical => [Direction::North, Direction::South],
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

/// One of the four cardinal directions a belt can face.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    /// All directions in clockwise order starting at `North`.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Returns the direction pointing the other way.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Returns the axis this direction travels along.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::Vertical,
            Direction::East | Direction::West => Axis::Horizontal,
        }
    }

    /// Returns the unit offset `(dx, dy)` of a single step in this direction.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Returns a dense index in `0..4`, usable for fixed-size per-direction arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::East => write!(f, "east"),
            Direction::South => write!(f, "south"),
            Direction::West => write!(f, "west"),
        }
    }
}

/// A set of directions packed into the low four bits of a byte.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    /// Creates an empty set.
    #[inline]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    #[inline]
    const fn mask(direction: Direction) -> u8 {
        1 << (direction as u8)
    }

    /// Inserts a direction. Returns `true` if it was not present before.
    #[inline]
    pub fn insert(&mut self, direction: Direction) -> bool {
        let was_present = self.contains(direction);
        self.bits |= Self::mask(direction);
        !was_present
    }

    /// Removes a direction. Returns `true` if it was present.
    #[inline]
    pub fn remove(&mut self, direction: Direction) -> bool {
        let was_present = self.contains(direction);
        self.bits &= !Self::mask(direction);
        was_present
    }

    #[inline]
    pub const fn contains(&self, direction: Direction) -> bool {
        self.bits & Self::mask(direction) != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterates the contained directions in clockwise order starting at `North`.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Direction>,
    {
        let mut set = DirectionSet::empty();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl std::fmt::Debug for DirectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A tile coordinate on the planning grid.
///
/// Ordering is lexicographic by `(x, y)`, which gives every map keyed by
/// tiles a deterministic iteration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile `distance` steps away in `direction`.
    /// Negative distances step backwards.
    #[inline]
    pub const fn shifted(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx * distance,
            y: self.y + dy * distance,
        }
    }

    /// Returns the neighbouring tile in `direction`.
    #[inline]
    pub const fn step(self, direction: Direction) -> Self {
        self.shifted(direction, 1)
    }

    /// Returns how many steps in `direction` lead from `self` to `other`,
    /// or `None` if `other` does not lie on that ray (including behind `self`).
    pub fn offset_along(self, direction: Direction, other: TilePosition) -> Option<usize> {
        let (dx, dy) = direction.offset();
        let (ox, oy) = (other.x - self.x, other.y - self.y);
        let distance = match direction.axis() {
            Axis::Horizontal if oy == 0 => ox * dx,
            Axis::Vertical if ox == 0 => oy * dy,
            _ => return None,
        };
        usize::try_from(distance).ok()
    }
}

impl std::fmt::Display for TilePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
