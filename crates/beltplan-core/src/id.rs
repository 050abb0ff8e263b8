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

//! # Strongly Typed Identifiers
//!
//! Phantom-tagged wrappers around `NonZeroU32`. Zero is the reserved
//! "unused" value of every identifier space (an empty tile carries no line),
//! so it is unrepresentable here: a `TypedId<T>` is always a valid, issued id.
//!
//! Identifiers are handed out by an explicit `IdCounter<T>` owned by whoever
//! builds the id space. There are no global counters.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_core::id::{IdCounter, IdTag, TypedId};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
//! struct WidgetTag;
//! impl IdTag for WidgetTag { const NAME: &'static str = "WidgetId"; }
//!
//! let mut counter = IdCounter::<WidgetTag>::new();
//! let first = counter.next_id();
//! assert_eq!(first.get(), 1);
//! assert_eq!(format!("{}", first), "WidgetId(1)");
//! assert!(TypedId::<WidgetTag>::new(0).is_none());
//! ```

use std::{marker::PhantomData, num::NonZeroU32};

/// A trait to tag typed identifiers with a name for debugging and display purposes.
pub trait IdTag: Clone {
    const NAME: &'static str;
}

/// Error returned when converting the reserved value `0` into an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroIdError {
    /// The name of the identifier space the conversion targeted.
    pub name: &'static str,
}

impl std::fmt::Display for ZeroIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 is reserved and cannot be used", self.name)
    }
}

impl std::error::Error for ZeroIdError {}

/// A non-zero identifier that belongs to the id space named by the tag `T`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedId<T> {
    value: NonZeroU32,
    _marker: PhantomData<T>,
}

impl<T> TypedId<T> {
    /// Creates an identifier, returning `None` for the reserved value `0`.
    #[inline]
    pub const fn new(value: u32) -> Option<Self> {
        match NonZeroU32::new(value) {
            Some(value) => Some(Self::from_non_zero(value)),
            None => None,
        }
    }

    #[inline(always)]
    pub const fn from_non_zero(value: NonZeroU32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Returns the raw identifier value, always `>= 1`.
    #[inline(always)]
    pub const fn get(&self) -> u32 {
        self.value.get()
    }

    #[inline(always)]
    pub const fn non_zero(&self) -> NonZeroU32 {
        self.value
    }
}

impl<T> std::fmt::Debug for TypedId<T>
where
    T: IdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.value)
    }
}

impl<T> std::fmt::Display for TypedId<T>
where
    T: IdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.value)
    }
}

impl<T> TryFrom<u32> for TypedId<T>
where
    T: IdTag,
{
    type Error = ZeroIdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ZeroIdError { name: T::NAME })
    }
}

impl<T> From<TypedId<T>> for u32 {
    fn from(id: TypedId<T>) -> Self {
        id.get()
    }
}

impl<T> From<TypedId<T>> for i64 {
    fn from(id: TypedId<T>) -> Self {
        i64::from(id.get())
    }
}

/// A dense, zero-based index into a collection owned by the id space `T`.
///
/// Unlike `TypedId<T>`, zero is a valid index. Indices are positions, not
/// identities, and are only meaningful against the collection that issued them.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: PhantomData<T>,
}

impl<T> TypedIndex<T> {
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: IdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: IdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline(always)]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline(always)]
    fn from(index: TypedIndex<T>) -> Self {
        index.get()
    }
}

/// Hands out consecutive identifiers starting at `1`.
///
/// The counter saturates at `u32::MAX`; callers that could exhaust the id
/// space must check `issued()` themselves.
#[derive(Clone, PartialEq, Eq)]
pub struct IdCounter<T> {
    next: NonZeroU32,
    issued: u32,
    _marker: PhantomData<T>,
}

impl<T> Default for IdCounter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdCounter<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            next: NonZeroU32::MIN,
            issued: 0,
            _marker: PhantomData,
        }
    }

    /// Issues the next identifier.
    #[inline]
    pub fn next_id(&mut self) -> TypedId<T> {
        let id = TypedId::from_non_zero(self.next);
        debug_assert!(
            self.next != NonZeroU32::MAX,
            "called `IdCounter::next_id` after exhausting the id space"
        );
        self.next = self.next.saturating_add(1);
        self.issued = self.issued.saturating_add(1);
        id
    }

    /// Returns the identifier the next call to `next_id` will issue.
    #[inline]
    pub fn peek(&self) -> TypedId<T> {
        TypedId::from_non_zero(self.next)
    }

    /// Returns how many identifiers have been issued so far.
    #[inline]
    pub fn issued(&self) -> u32 {
        self.issued
    }
}

impl<T> std::fmt::Debug for IdCounter<T>
where
    T: IdTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdCounter<{}>(next: {})", T::NAME, self.next)
    }
}
