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

//! # Assignments
//!
//! A `LineAssignment` is the solver's answer for one line: the piece chosen
//! on every tile, or `None` where the line passes underground (or, in an
//! invalid assignment, skips a tile). A `GridAssignment` collects the answers
//! for all lines and knows how to find the tiles they fight over.
//!
//! ## Structural rules
//!
//! Walking a line front to back with at most one tunnel open at a time:
//!
//! - outside a tunnel a tile carries a belt or opens a tunnel with an entry;
//! - inside a tunnel tiles stay empty until an exit of the same tier closes
//!   it, no further than the tier's maximum tunnel distance from the entry;
//! - an isolated exit may only open the line (offset 0) and an isolated
//!   entry may only close it (the last offset);
//! - no tunnel is left open at the end.

use crate::{
    belt_type::BeltType,
    cell::LineIdSet,
    cost::CostFunction,
    error::AssignmentViolation,
    grid::BeltGrid,
    index::{LineId, TierIndex},
    line::{BeltLine, signed_offset},
    placement::{BeltPlacement, materialize},
    tier::BeltCatalog,
};
use beltplan_core::{
    geometry::{Direction, TilePosition},
    num::CostNumeric,
};
use std::collections::BTreeMap;

/// A paired tunnel inside one line, as offsets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tunnel {
    pub tier: TierIndex,
    pub entry: usize,
    pub exit: usize,
}

/// The chosen piece per tile of one line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineAssignment {
    line_id: LineId,
    start: TilePosition,
    direction: Direction,
    tiles: Vec<Option<BeltType>>,
}

impl LineAssignment {
    #[inline]
    pub fn new(
        line_id: LineId,
        start: TilePosition,
        direction: Direction,
        tiles: Vec<Option<BeltType>>,
    ) -> Self {
        Self {
            line_id,
            start,
            direction,
            tiles,
        }
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
    pub fn tiles(&self) -> &[Option<BeltType>] {
        &self.tiles
    }

    #[inline]
    pub fn tile(&self, offset: usize) -> Option<BeltType> {
        self.tiles.get(offset).copied().flatten()
    }

    #[inline]
    pub fn tile_position(&self, offset: usize) -> TilePosition {
        self.start.shifted(self.direction, signed_offset(offset))
    }

    /// The `(offset, piece)` pairs of all non-empty tiles, front to back.
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = (usize, BeltType)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(offset, t)| t.map(|bt| (offset, bt)))
    }

    /// The world tiles this line occupies, with their pieces.
    #[inline]
    pub fn occupied(&self) -> impl Iterator<Item = (TilePosition, BeltType)> + '_ {
        self.entries()
            .map(|(offset, bt)| (self.tile_position(offset), bt))
    }

    /// Pairs every non-isolated entry with the next exit, front to back.
    pub fn tunnels(&self) -> Vec<Tunnel> {
        let mut tunnels = Vec::new();
        let mut open: Option<(TierIndex, usize)> = None;
        for (offset, belt_type) in self.entries() {
            match (open, belt_type) {
                (
                    None,
                    BeltType::InputUnderground {
                        tier,
                        isolated: false,
                    },
                ) => open = Some((tier, offset)),
                (
                    Some((tier, entry)),
                    BeltType::OutputUnderground {
                        tier: exit_tier,
                        isolated: false,
                    },
                ) if tier == exit_tier => {
                    tunnels.push(Tunnel {
                        tier,
                        entry,
                        exit: offset,
                    });
                    open = None;
                }
                _ => {}
            }
        }
        tunnels
    }

    /// Sums the cost of every placed piece.
    pub fn cost<C, F>(&self, cost_fn: &F) -> C
    where
        C: CostNumeric,
        F: CostFunction<C> + ?Sized,
    {
        self.occupied().fold(C::zero(), |acc, (tile, bt)| {
            acc + cost_fn.cost(bt, tile, self.direction)
        })
    }

    /// Checks the structural rules of a line.
    pub fn verify<B>(&self, catalog: &B) -> Result<(), AssignmentViolation>
    where
        B: BeltCatalog + ?Sized,
    {
        let line = self.line_id;
        let last = self.tiles.len().saturating_sub(1);
        let mut open: Option<(TierIndex, usize)> = None;

        for (offset, tile) in self.tiles.iter().enumerate() {
            if let Some(bt) = tile
                && catalog.tier(bt.tier()).is_none()
            {
                return Err(AssignmentViolation::UnknownTier {
                    line,
                    tier: bt.tier(),
                });
            }

            match open {
                None => match *tile {
                    None => return Err(AssignmentViolation::Gap { line, offset }),
                    Some(BeltType::Belt(_)) => {}
                    Some(BeltType::InputUnderground {
                        tier,
                        isolated: false,
                    }) => open = Some((tier, offset)),
                    Some(BeltType::InputUnderground { isolated: true, .. }) => {
                        if offset != last {
                            return Err(AssignmentViolation::MisplacedIsolatedEnd { line, offset });
                        }
                    }
                    Some(BeltType::OutputUnderground { isolated: true, .. }) => {
                        if offset != 0 {
                            return Err(AssignmentViolation::MisplacedIsolatedEnd { line, offset });
                        }
                    }
                    Some(BeltType::OutputUnderground {
                        isolated: false, ..
                    }) => return Err(AssignmentViolation::UnpairedExit { line, offset }),
                },
                Some((tier, entry)) => match *tile {
                    None => {}
                    Some(BeltType::OutputUnderground {
                        tier: exit_tier,
                        isolated: false,
                    }) if exit_tier == tier => {
                        let max = catalog
                            .tier(tier)
                            .map_or(0, |t| t.max_tunnel_distance());
                        if offset - entry > max {
                            return Err(AssignmentViolation::TunnelTooLong {
                                line,
                                entry,
                                exit: offset,
                                max,
                            });
                        }
                        open = None;
                    }
                    Some(_) => return Err(AssignmentViolation::TunnelInterrupted { line, offset }),
                },
            }
        }

        match open {
            Some((_, entry)) => Err(AssignmentViolation::UnpairedEntry {
                line,
                offset: entry,
            }),
            None => Ok(()),
        }
    }

    /// Checks the structural rules and every per-tile obligation of `belt_line`.
    pub fn verify_against<B>(
        &self,
        belt_line: &BeltLine,
        catalog: &B,
    ) -> Result<(), AssignmentViolation>
    where
        B: BeltCatalog + ?Sized,
    {
        let line = self.line_id;
        if belt_line.len() != self.tiles.len() {
            return Err(AssignmentViolation::LengthMismatch {
                line,
                expected: belt_line.len(),
                actual: self.tiles.len(),
            });
        }

        for (offset, (required, chosen)) in
            belt_line.tiles().iter().zip(self.tiles.iter()).enumerate()
        {
            match chosen {
                None if required.must_be_not_empty() => {
                    return Err(AssignmentViolation::EmptyMandatoryTile { line, offset });
                }
                None => {}
                Some(bt) => {
                    if required.must_match().is_some_and(|m| m != *bt) {
                        return Err(AssignmentViolation::MatchViolated { line, offset });
                    }
                    if !required.allowed_tiers().contains(&bt.tier()) {
                        return Err(AssignmentViolation::TierNotAllowed {
                            line,
                            offset,
                            tier: bt.tier(),
                        });
                    }
                }
            }
        }

        self.verify(catalog)
    }
}

impl std::fmt::Display for LineAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {} {}: [", self.line_id, self.start, self.direction)?;
        for (i, tile) in self.tiles.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match tile {
                Some(bt) => write!(f, "{}", bt)?,
                None => write!(f, "-")?,
            }
        }
        write!(f, "]")
    }
}

/// Why a tile is reported as a conflict.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConflictKind {
    /// More than one line places a piece on the tile.
    SharedTile,
    /// The tile's tunnel end sits under a same-tier, same-axis tunnel of
    /// line `tunnel`, running from `entry` to `exit`.
    TunnelInterference {
        tunnel: LineId,
        tier: TierIndex,
        entry: TilePosition,
        exit: TilePosition,
    },
}

/// A tile the lines of an assignment fight over.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Conflict {
    pub tile: TilePosition,
    /// The lines involved: those placing a piece on the tile and, for
    /// tunnel interference, the line owning the tunnel.
    pub lines: LineIdSet,
    pub kind: ConflictKind,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} claimed by [", self.tile)?;
        for (i, id) in self.lines.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")?;
        if let ConflictKind::TunnelInterference { tunnel, .. } = self.kind {
            write!(f, " inside the tunnel of {}", tunnel)?;
        }
        Ok(())
    }
}

/// The assignment of every line of a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridAssignment {
    lines: BTreeMap<LineId, LineAssignment>,
}

impl GridAssignment {
    #[inline]
    pub fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }

    /// Inserts or replaces the assignment of one line.
    #[inline]
    pub fn insert(&mut self, assignment: LineAssignment) -> Option<LineAssignment> {
        self.lines.insert(assignment.line_id(), assignment)
    }

    #[inline]
    pub fn get(&self, line_id: LineId) -> Option<&LineAssignment> {
        self.lines.get(&line_id)
    }

    #[inline]
    pub fn lines(&self) -> impl Iterator<Item = &LineAssignment> + '_ {
        self.lines.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines placing a piece on each occupied tile.
    pub fn usage(&self) -> BTreeMap<TilePosition, LineIdSet> {
        let mut usage: BTreeMap<TilePosition, LineIdSet> = BTreeMap::new();
        for assignment in self.lines.values() {
            for (tile, _) in assignment.occupied() {
                let ids = usage.entry(tile).or_default();
                if !ids.contains(&assignment.line_id()) {
                    ids.push(assignment.line_id());
                }
            }
        }
        usage
    }

    /// Every tile claimed by more than one line, followed by every tunnel end
    /// placed under another line's tunnel of the same tier and axis.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut conflicts: Vec<Conflict> = self
            .usage()
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(tile, lines)| Conflict {
                tile,
                lines,
                kind: ConflictKind::SharedTile,
            })
            .collect();

        let mut undergrounds: BTreeMap<TilePosition, Vec<(LineId, Direction, TierIndex)>> =
            BTreeMap::new();
        for assignment in self.lines.values() {
            for (tile, bt) in assignment.occupied() {
                if bt.is_underground() {
                    undergrounds.entry(tile).or_default().push((
                        assignment.line_id(),
                        assignment.direction(),
                        bt.tier(),
                    ));
                }
            }
        }

        for assignment in self.lines.values() {
            let axis = assignment.direction().axis();
            for tunnel in assignment.tunnels() {
                for offset in tunnel.entry + 1..tunnel.exit {
                    let tile = assignment.tile_position(offset);
                    let Some(ends) = undergrounds.get(&tile) else {
                        continue;
                    };
                    for &(owner, direction, tier) in ends {
                        if owner != assignment.line_id()
                            && tier == tunnel.tier
                            && direction.axis() == axis
                        {
                            let mut lines = LineIdSet::new();
                            lines.push(owner);
                            lines.push(assignment.line_id());
                            conflicts.push(Conflict {
                                tile,
                                lines,
                                kind: ConflictKind::TunnelInterference {
                                    tunnel: assignment.line_id(),
                                    tier: tunnel.tier,
                                    entry: assignment.tile_position(tunnel.entry),
                                    exit: assignment.tile_position(tunnel.exit),
                                },
                            });
                        }
                    }
                }
            }
        }

        conflicts
    }

    #[inline]
    pub fn is_conflict_free(&self) -> bool {
        self.conflicts().is_empty()
    }

    /// All placements of all lines, line by line.
    pub fn placements(&self) -> Vec<BeltPlacement> {
        self.lines.values().flat_map(materialize).collect()
    }

    pub fn cost<C, F>(&self, cost_fn: &F) -> C
    where
        C: CostNumeric,
        F: CostFunction<C> + ?Sized,
    {
        self.lines
            .values()
            .fold(C::zero(), |acc, line| acc + line.cost(cost_fn))
    }

    /// Checks that every line of `grid` is assigned, obeys its obligations and
    /// the structural rules.
    pub fn verify<B>(&self, grid: &BeltGrid, catalog: &B) -> Result<(), AssignmentViolation>
    where
        B: BeltCatalog + ?Sized,
    {
        for (line_id, belt_line) in grid.lines() {
            let assignment = self
                .get(line_id)
                .ok_or(AssignmentViolation::MissingLine { line: line_id })?;
            assignment.verify_against(belt_line, catalog)?;
        }
        Ok(())
    }
}

impl FromIterator<LineAssignment> for GridAssignment {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = LineAssignment>,
    {
        Self {
            lines: iter.into_iter().map(|a| (a.line_id(), a)).collect(),
        }
    }
}

impl std::fmt::Display for GridAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GridAssignment ({} lines)", self.lines.len())?;
        for line in self.lines.values() {
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}
