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

use crate::error::ModelError;
use beltplan_core::id::{IdTag, TypedId, TypedIndex};

/// A tag type for belt tier indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TierIndexTag;

impl IdTag for TierIndexTag {
    const NAME: &'static str = "TierIndex";
}

/// A typed index into a `BeltCatalog`.
pub type TierIndex = TypedIndex<TierIndexTag>;

/// A tag type for line identifiers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LineIdTag;

impl IdTag for LineIdTag {
    const NAME: &'static str = "LineId";
}

/// The identifier of a belt line. `0` is reserved for empty tiles and cannot be represented.
pub type LineId = TypedId<LineIdTag>;

/// Converts a raw line id, rejecting the reserved value `0`.
#[inline]
pub fn line_id(raw: u32) -> Result<LineId, ModelError> {
    LineId::new(raw).ok_or(ModelError::ReservedLineId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_id_rejects_zero() {
        assert_eq!(line_id(0), Err(ModelError::ReservedLineId));
        assert_eq!(line_id(3).map(|id| id.get()), Ok(3));
    }

    #[test]
    fn test_display_names() {
        assert_eq!(format!("{}", TierIndex::new(2)), "TierIndex(2)");
        assert_eq!(format!("{}", line_id(5).unwrap()), "LineId(5)");
    }
}
