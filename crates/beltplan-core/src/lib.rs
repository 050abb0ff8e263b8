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

//! # Beltplan Core
//!
//! Foundational building blocks shared by every crate of the beltplan
//! workspace. Nothing in here knows about belts or tunnels; the crate only
//! provides the grid vocabulary, identifier plumbing, and numeric helpers the
//! model, encoder, and pre-solver are written against.
//!
//! ## Modules
//!
//! - `geometry`: Cardinal `Direction`s, their `Axis`, a compact
//!   `DirectionSet`, and integer `TilePosition`s on the planning grid.
//! - `id`: Phantom-tagged, non-zero identifiers (`TypedId<T>`) and the
//!   explicit `IdCounter<T>` that hands them out.
//! - `num`: The `CostNumeric` trait alias that bounds every cost type used
//!   by the dynamic program and the conflict resolver.
//! - `algorithm`: Algorithmic primitives, most notably the amortized O(1)
//!   `SlidingWindowMin` used for bounded-lookback minima.

pub mod algorithm;
pub mod geometry;
pub mod id;
pub mod num;
