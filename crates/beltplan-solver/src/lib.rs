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

//! # Beltplan Solver
//!
//! **The entry point of the belt network planner.**
//!
//! `BeltPlanner` takes the lines to realize, registers them in a
//! `BeltGrid`, and solves the grid with the path its `PlanMode` selects:
//!
//! * **`Heuristic`**: per-line dynamic programs and penalty-driven conflict
//!   resolution (`beltplan_presolve`).
//! * **`Exact`**: the constraint encoding solved by the in-crate
//!   branch-and-bound backend (`beltplan_encode`).
//! * **`ExactWithHints`**: the heuristic first, its layout handed to the
//!   exact backend as hints.
//! * **`ExactForced`**: the heuristic layout forced into the exact model,
//!   which then only confirms it.
//!
//! Every returned layout is verified against the line rules and comes with
//! its placements, its cost and the statistics of each path that ran.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::geometry::{Direction, TilePosition};
//! use beltplan_model::{
//!     index::TierIndex,
//!     line::{BeltLine, LineTile},
//!     tier::TierCatalog,
//! };
//! use beltplan_solver::{config::PlanMode, planner::BeltPlannerBuilder};
//!
//! let catalog = TierCatalog::vanilla();
//! let line = BeltLine::new(
//!     TilePosition::new(0, 0),
//!     Direction::East,
//!     vec![LineTile::open([TierIndex::new(0)]); 3],
//! )
//! .unwrap();
//!
//! let mut planner = BeltPlannerBuilder::new(&catalog)
//!     .mode(PlanMode::Exact)
//!     .build()
//!     .unwrap();
//! let outcome = planner.plan(&[line]).unwrap();
//! assert_eq!(outcome.placements().len(), 3);
//! ```
//!
//! ## Architecture
//!
//! * **`planner`**: `BeltPlanner`, its builder and `build_grid`.
//! * **`outcome`**: `PlanOutcome`, `PlanMethod` and `PlanStatistics`.
//! * **`config`**: `PlannerConfig` and `PlanMode`, loadable from JSON.
//! * **`error`**: `PlanError` and `ConfigError`.
//! * **`logging`**: `tracing` subscriber setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod planner;
