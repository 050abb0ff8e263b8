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

//! # Sliding Window Minimum
//!
//! A monotonic deque answering "what is the cheapest value pushed at an index
//! in `[lo, hi]`" for a window that only ever moves forward. Each element is
//! pushed and popped at most once, so a full pass over `n` indices costs
//! amortized O(1) per step.
//!
//! The tunnel transition of the line dynamic program uses one window per belt
//! tier: entries are pushed as they are computed and evicted once they fall
//! further behind than the tier's maximum tunnel distance.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::algorithm::SlidingWindowMin;
//!
//! let mut window = SlidingWindowMin::<f64>::new();
//! window.push(0, 3.0);
//! window.push(1, 1.0);
//! window.push(2, 2.0);
//! assert_eq!(window.min(), Some((1, 1.0)));
//! window.evict_before(2);
//! assert_eq!(window.min(), Some((2, 2.0)));
//! ```

use crate::num::CostNumeric;
use std::collections::VecDeque;

/// Monotonic deque over `(index, cost)` pairs with non-decreasing costs front to back.
///
/// Infinite costs are never stored, so an empty window means "no finite value
/// in range". Ties keep the earlier index, which makes backtracking through
/// the window deterministic.
#[derive(Clone, Debug, Default)]
pub struct SlidingWindowMin<C> {
    deque: VecDeque<(usize, C)>,
}

impl<C> SlidingWindowMin<C>
where
    C: CostNumeric,
{
    #[inline]
    pub fn new() -> Self {
        Self {
            deque: VecDeque::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            deque: VecDeque::with_capacity(capacity),
        }
    }

    /// Pushes `cost` observed at `index`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `index` is not greater than the last pushed index.
    #[inline]
    pub fn push(&mut self, index: usize, cost: C) {
        debug_assert!(
            self.deque.back().is_none_or(|&(last, _)| last < index),
            "called `SlidingWindowMin::push` with non-increasing index {}",
            index
        );
        if !cost.is_finite() {
            return;
        }
        while let Some(&(_, back)) = self.deque.back()
            && back > cost
        {
            self.deque.pop_back();
        }
        self.deque.push_back((index, cost));
    }

    /// Drops every element whose index is strictly below `index`.
    #[inline]
    pub fn evict_before(&mut self, index: usize) {
        while let Some(&(front, _)) = self.deque.front()
            && front < index
        {
            self.deque.pop_front();
        }
    }

    /// Returns the cheapest `(index, cost)` still in the window.
    #[inline]
    pub fn min(&self) -> Option<(usize, C)> {
        self.deque.front().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.deque.clear();
    }
}
