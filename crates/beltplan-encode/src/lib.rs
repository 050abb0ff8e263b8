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

//! # Beltplan Encode
//!
//! **Exact constraint encoding of belt grids.**
//!
//! This crate translates a `BeltGrid` into boolean and bounded-integer
//! decision variables plus constraints over them, and reads a backend's
//! answer back into a `GridAssignment`. The encoder talks to solvers only
//! through the `ConstraintBackend` trait, so any solver that supports
//! conditional enforcement, at-most-one/exactly-one, boolean or/and and
//! integer (in)equalities can be plugged in.
//!
//! ## Architecture
//!
//! * **`backend`**: Variables, literals, constraints, limits, statuses and the `ConstraintBackend` trait.
//! * **`model`**: `ConstraintModel`, a backend that records the model without solving it.
//! * **`search`**: `SearchBackend`, a depth-first branch-and-bound with unit propagation.
//! * **`stats`**: Counters collected by `SearchBackend`.
//! * **`encoder`**: `GridEncoder`, producing a `GridEncoding` that can decode solutions and accept warm starts.
//! * **`error`**: `EncodeError`.

pub mod backend;
pub mod encoder;
pub mod error;
pub mod model;
pub mod search;
pub mod stats;
