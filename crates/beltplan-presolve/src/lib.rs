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

//! # Beltplan Presolve
//!
//! **The heuristic solving path: one dynamic program per line, then
//! penalty-driven conflict resolution across lines.**
//!
//! Every line is solved in isolation by a single left-to-right pass that
//! chooses, tile by tile, between a belt, a tunnel entry, a tunnel exit, or
//! nothing (the tile is spanned by a tunnel). Lines solved independently
//! may claim the same tile; the resolver then raises a penalty on every
//! contested tile and re-solves only the lines involved until no tile is
//! claimed twice.
//!
//! ## Architecture
//!
//! * **`problem`**: `LineProblem`, the priced option table of one line read
//!   from a `BeltGrid`, and `PenaltyTable`, the per-tile conflict penalties.
//! * **`dp`**: `LineDp`, the reusable dynamic program over a `LineProblem`.
//! * **`resolver`**: `ConflictResolver` and `ResolverConfig`.
//! * **`monitor`**: Hooks observing and interrupting the resolver loop.
//! * **`stats`**: `ResolverStatistics`.
//! * **`result`**: `ResolverOutcome`.
//! * **`error`**: `PresolveError`.
//!
//! ## Guarantees
//!
//! - A returned assignment is conflict-free; running out of iterations is
//!   an error, never a partial layout.
//! - Tiles reserved for one line are never offered to another.
//! - Re-solving a conflict-free assignment changes nothing.

pub mod dp;
pub mod error;
pub mod monitor;
pub mod problem;
pub mod resolver;
pub mod result;
pub mod stats;
