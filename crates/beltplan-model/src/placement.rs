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

//! # Placements
//!
//! The bridge between line assignments and concrete entities in the world.
//! `materialize` turns a `LineAssignment` into one `BeltPlacement` per
//! occupied tile. `detect_lines` goes the other way: given a bag of placed
//! belts it follows belt-to-belt hand-offs and tunnel pairings to recover
//! the straight lines they form. Running both in sequence on a valid
//! assignment reproduces it, which makes the pair a consistency check for
//! both solving paths.
//!
//! Detection follows the game's pairing rule: a tunnel entry pairs with the
//! first underground of its tier on its axis within range, and only if that
//! one is an exit facing the same way. Ends without a partner come back as
//! isolated.

use crate::{
    belt_type::BeltType,
    error::DetectError,
    index::LineIdTag,
    line::signed_offset,
    solution::LineAssignment,
    tier::BeltCatalog,
};
use beltplan_core::{
    geometry::{Direction, TilePosition},
    id::IdCounter,
};
use std::collections::{BTreeMap, BTreeSet};

/// A belt or underground belt at a world tile.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BeltPlacement {
    pub tile: TilePosition,
    pub direction: Direction,
    pub belt_type: BeltType,
}

impl std::fmt::Display for BeltPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} at {}", self.belt_type, self.direction, self.tile)
    }
}

/// One placement per occupied tile of `assignment`, front to back.
pub fn materialize(assignment: &LineAssignment) -> Vec<BeltPlacement> {
    assignment
        .occupied()
        .map(|(tile, belt_type)| BeltPlacement {
            tile,
            direction: assignment.direction(),
            belt_type,
        })
        .collect()
}

/// How a placement hands its items on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Successor {
    None,
    /// The neighbouring tile ahead.
    Adjacent(TilePosition),
    /// A paired tunnel exit, `distance` tiles ahead.
    Tunnel(TilePosition, usize),
}

/// Recovers straight lines from placed belts.
///
/// Lines are returned ordered by their first tile and carry fresh ids
/// starting at `1`.
pub fn detect_lines<B>(
    placements: &[BeltPlacement],
    catalog: &B,
) -> Result<Vec<LineAssignment>, DetectError>
where
    B: BeltCatalog + ?Sized,
{
    let mut by_tile: BTreeMap<TilePosition, BeltPlacement> = BTreeMap::new();
    for placement in placements {
        if catalog.tier(placement.belt_type.tier()).is_none() {
            return Err(DetectError::UnknownTier {
                tile: placement.tile,
                tier: placement.belt_type.tier(),
            });
        }
        if by_tile.insert(placement.tile, *placement).is_some() {
            return Err(DetectError::DuplicateTile {
                tile: placement.tile,
            });
        }
    }

    let successors: BTreeMap<TilePosition, Successor> = by_tile
        .values()
        .map(|p| (p.tile, successor_of(p, &by_tile, catalog)))
        .collect();

    let fed: BTreeSet<TilePosition> = successors
        .values()
        .filter_map(|s| match *s {
            Successor::Adjacent(tile) | Successor::Tunnel(tile, _) => Some(tile),
            Successor::None => None,
        })
        .collect();

    let mut ids = IdCounter::<LineIdTag>::new();
    let mut visited: BTreeSet<TilePosition> = BTreeSet::new();
    let mut lines = Vec::new();

    for head in by_tile.values().filter(|p| !fed.contains(&p.tile)) {
        let mut tiles: Vec<Option<BeltType>> = Vec::new();
        let mut current = *head;
        loop {
            if !visited.insert(current.tile) {
                break;
            }
            let is_head = current.tile == head.tile;
            tiles.push(Some(normalize(&current, is_head, &successors, &fed)));

            let next = match successors.get(&current.tile).copied() {
                Some(Successor::Adjacent(tile)) => tile,
                Some(Successor::Tunnel(tile, distance)) => {
                    tiles.extend(std::iter::repeat_n(None, distance - 1));
                    tile
                }
                Some(Successor::None) | None => break,
            };
            match by_tile.get(&next) {
                Some(p) => current = *p,
                None => break,
            }
        }
        lines.push(LineAssignment::new(
            ids.next_id(),
            head.tile,
            head.direction,
            tiles,
        ));
    }

    Ok(lines)
}

fn successor_of<B>(
    placement: &BeltPlacement,
    by_tile: &BTreeMap<TilePosition, BeltPlacement>,
    catalog: &B,
) -> Successor
where
    B: BeltCatalog + ?Sized,
{
    let direction = placement.direction;
    match placement.belt_type {
        BeltType::Belt(_) | BeltType::OutputUnderground { .. } => {
            let ahead = placement.tile.step(direction);
            match by_tile.get(&ahead) {
                Some(next) if next.direction == direction && next.belt_type.has_input() => {
                    Successor::Adjacent(ahead)
                }
                _ => Successor::None,
            }
        }
        BeltType::InputUnderground { isolated: true, .. } => Successor::None,
        BeltType::InputUnderground {
            tier,
            isolated: false,
        } => {
            let max = catalog.tier(tier).map_or(0, |t| t.max_tunnel_distance());
            for distance in 1..=max {
                let tile = placement.tile.shifted(direction, signed_offset(distance));
                let Some(other) = by_tile.get(&tile) else {
                    continue;
                };
                if !other.belt_type.is_underground()
                    || other.belt_type.tier() != tier
                    || other.direction.axis() != direction.axis()
                {
                    continue;
                }
                return match other.belt_type {
                    BeltType::OutputUnderground {
                        isolated: false, ..
                    } if other.direction == direction => Successor::Tunnel(tile, distance),
                    _ => Successor::None,
                };
            }
            Successor::None
        }
    }
}

/// Marks tunnel ends without a partner as isolated.
fn normalize(
    placement: &BeltPlacement,
    is_head: bool,
    successors: &BTreeMap<TilePosition, Successor>,
    fed: &BTreeSet<TilePosition>,
) -> BeltType {
    match placement.belt_type {
        BeltType::InputUnderground { .. } => {
            let paired = matches!(
                successors.get(&placement.tile),
                Some(Successor::Tunnel(..))
            );
            placement.belt_type.with_isolation(!paired)
        }
        BeltType::OutputUnderground { .. } => {
            let paired = !is_head && fed.contains(&placement.tile);
            placement.belt_type.with_isolation(!paired)
        }
        BeltType::Belt(_) => placement.belt_type,
    }
}
