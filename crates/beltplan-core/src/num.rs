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

//! # Cost Numeric Trait
//!
//! Unified numeric bounds for every cost value flowing through the planner.
//! Tile costs are fractional (an underground end typically costs a non-integer
//! multiple of a plain belt) and unreachable states are represented by
//! positive infinity, so costs are floating point.
//!
//! `CostNumeric` collects `Float + FromPrimitive` with formatting and
//! thread-safety bounds into a single alias; both `f32` and `f64` qualify.

use num_traits::{Float, FromPrimitive};

/// A trait alias for floating point types usable as tile costs.
pub trait CostNumeric:
    Float + FromPrimitive + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
}

impl<T> CostNumeric for T where
    T: Float + FromPrimitive + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
}

/// Converts an `f64` into the cost type, mapping unrepresentable values to infinity.
#[inline]
pub fn cost_from_f64<C>(value: f64) -> C
where
    C: CostNumeric,
{
    C::from_f64(value).unwrap_or_else(C::infinity)
}

/// Converts a cost into `f64`, mapping unrepresentable values to infinity.
#[inline]
pub fn cost_to_f64<C>(value: C) -> f64
where
    C: CostNumeric,
{
    value.to_f64().unwrap_or(f64::INFINITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_f64() {
        let c: f64 = cost_from_f64(2.5);
        assert_eq!(cost_to_f64(c), 2.5);
    }

    #[test]
    fn test_f32_conversion() {
        let c: f32 = cost_from_f64(1.25);
        assert_eq!(c, 1.25f32);
        assert!(cost_from_f64::<f32>(f64::INFINITY).is_infinite());
    }
}
