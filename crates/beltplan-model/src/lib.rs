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

//! # Beltplan Model
//!
//! **The domain model of the belt network planner.**
//!
//! This crate describes *what* has to be planned: which belt tiers exist, which
//! lines must be realized, which (direction, belt type, line) choices each tile
//! admits, and what a finished assignment looks like. It is consumed by both
//! solving paths, the exact constraint encoder (`beltplan_encode`) and the
//! heuristic pre-solver (`beltplan_presolve`).
//!
//! ## Architecture
//!
//! * **`index`**: `TierIndex` and `LineId`, the two identifier spaces of the model.
//! * **`tier`**: `BeltTier`, the `BeltCatalog` adapter trait and its `TierCatalog` implementation.
//! * **`belt_type`**: The tagged `BeltType` union (belt, tunnel entry, tunnel exit).
//! * **`snapshot`**: Read-only views of the world: existing entities and blocked tiles.
//! * **`line`**: `BeltLine` and its per-tile `LineTile` records.
//! * **`cell`**: `BeltCell`, the per-tile option table with forced values.
//! * **`grid`**: `BeltGrid`, the cell map lines are registered into.
//! * **`cost`**: The `CostFunction` trait shared by both solving paths.
//! * **`solution`**: `LineAssignment` and `GridAssignment`, plus structural verification.
//! * **`placement`**: Materializing assignments into placements and detecting lines back.
//! * **`error`**: `ModelError`, `AssignmentViolation` and `DetectError`.
//!
//! ## Design Philosophy
//!
//! 1.  **Fail-Fast**: Contradictions (conflicting forced values, mandatory tiles
//!     that cannot be used) are rejected while the grid is built, never deferred
//!     to solving.
//! 2.  **Determinism**: Every map is ordered by value, so iteration order, and
//!     therefore every downstream model, is reproducible run to run.
//! 3.  **Explicit Ownership**: Line ids are issued by the grid that owns them.

pub mod belt_type;
pub mod cell;
pub mod cost;
pub mod error;
pub mod grid;
pub mod index;
pub mod line;
pub mod placement;
pub mod snapshot;
pub mod solution;
pub mod tier;
