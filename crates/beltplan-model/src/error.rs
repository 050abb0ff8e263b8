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

use crate::index::{LineId, TierIndex};
use beltplan_core::geometry::{Direction, TilePosition};

/// The cell field a forced value was written to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ForcedField {
    Direction,
    LineId,
    BeltType,
}

impl std::fmt::Display for ForcedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForcedField::Direction => write!(f, "direction"),
            ForcedField::LineId => write!(f, "line id"),
            ForcedField::BeltType => write!(f, "belt type"),
        }
    }
}

/// Contradictions detected while building or validating the planning model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("conflicting forced {field} at {tile}: already set to {existing}, requested {requested}")]
    ConflictingForcedValue {
        tile: TilePosition,
        field: ForcedField,
        existing: String,
        requested: String,
    },

    #[error("line id 0 is reserved for empty tiles")]
    ReservedLineId,

    #[error("tile {tile} must not be empty but has no compatible options")]
    NoCompatibleOptions { tile: TilePosition },

    #[error("tile {offset} of the line starting at {start} is blocked but {reason}")]
    BlockedTileContradiction {
        start: TilePosition,
        offset: usize,
        reason: &'static str,
    },

    #[error("tile {offset} of the line starting at {start} must match a {tier} belt, which is not allowed there")]
    TierMismatch {
        start: TilePosition,
        offset: usize,
        tier: TierIndex,
    },

    #[error("the line starting at {start} facing {direction} has no tiles")]
    EmptyLine {
        start: TilePosition,
        direction: Direction,
    },

    #[error("the line starting at {start} facing {direction} spans {len} tiles, more than {max}")]
    LineTooLong {
        start: TilePosition,
        direction: Direction,
        len: usize,
        max: usize,
    },

    #[error("unknown belt tier {tier}")]
    UnknownTier { tier: TierIndex },

    #[error("unknown line {line}")]
    UnknownLine { line: LineId },

    #[error("invalid belt tier `{name}`: {reason}")]
    InvalidTier { name: String, reason: String },
}

/// A structural rule broken by a line assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentViolation {
    #[error("{line} has no assignment")]
    MissingLine { line: LineId },

    #[error("{line} assigns {actual} tiles but the line has {expected}")]
    LengthMismatch {
        line: LineId,
        expected: usize,
        actual: usize,
    },

    #[error("{line} leaves tile {offset} empty outside of a tunnel")]
    Gap { line: LineId, offset: usize },

    #[error("{line} opens a tunnel at tile {offset} that is never closed")]
    UnpairedEntry { line: LineId, offset: usize },

    #[error("{line} closes a tunnel at tile {offset} that was never opened")]
    UnpairedExit { line: LineId, offset: usize },

    #[error("{line} tunnels from tile {entry} to tile {exit}, exceeding the maximum distance of {max}")]
    TunnelTooLong {
        line: LineId,
        entry: usize,
        exit: usize,
        max: usize,
    },

    #[error("{line} places a belt at tile {offset} inside an open tunnel")]
    TunnelInterrupted { line: LineId, offset: usize },

    #[error("{line} places an isolated tunnel end at tile {offset}, away from the line boundary")]
    MisplacedIsolatedEnd { line: LineId, offset: usize },

    #[error("{line} uses unknown belt tier {tier}")]
    UnknownTier { line: LineId, tier: TierIndex },

    #[error("{line} leaves mandatory tile {offset} empty")]
    EmptyMandatoryTile { line: LineId, offset: usize },

    #[error("{line} does not keep the required belt type at tile {offset}")]
    MatchViolated { line: LineId, offset: usize },

    #[error("{line} uses {tier} at tile {offset}, which is not allowed there")]
    TierNotAllowed {
        line: LineId,
        offset: usize,
        tier: TierIndex,
    },
}

/// Failures while re-detecting lines from placed entities.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectError {
    #[error("two placements share tile {tile}")]
    DuplicateTile { tile: TilePosition },

    #[error("placement at {tile} uses unknown belt tier {tier}")]
    UnknownTier { tile: TilePosition, tier: TierIndex },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_forced_value_message() {
        let err = ModelError::ConflictingForcedValue {
            tile: TilePosition::new(1, 2),
            field: ForcedField::Direction,
            existing: "north".to_string(),
            requested: "east".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "conflicting forced direction at (1, 2): already set to north, requested east"
        );
    }
}
