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

use crate::index::TierIndex;

/// What a single tile carries for a line.
///
/// A plain belt both takes input from the tile behind it and outputs to the
/// tile ahead. A tunnel entry only takes input, a tunnel exit only outputs.
/// Isolated tunnel ends have no partner and only occur at line boundaries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BeltType {
    Belt(TierIndex),
    InputUnderground { tier: TierIndex, isolated: bool },
    OutputUnderground { tier: TierIndex, isolated: bool },
}

impl BeltType {
    #[inline]
    pub const fn belt(tier: TierIndex) -> Self {
        BeltType::Belt(tier)
    }

    /// A paired tunnel entry.
    #[inline]
    pub const fn entry(tier: TierIndex) -> Self {
        BeltType::InputUnderground {
            tier,
            isolated: false,
        }
    }

    /// A paired tunnel exit.
    #[inline]
    pub const fn exit(tier: TierIndex) -> Self {
        BeltType::OutputUnderground {
            tier,
            isolated: false,
        }
    }

    #[inline]
    pub const fn isolated_entry(tier: TierIndex) -> Self {
        BeltType::InputUnderground {
            tier,
            isolated: true,
        }
    }

    #[inline]
    pub const fn isolated_exit(tier: TierIndex) -> Self {
        BeltType::OutputUnderground {
            tier,
            isolated: true,
        }
    }

    #[inline]
    pub const fn tier(&self) -> TierIndex {
        match *self {
            BeltType::Belt(tier)
            | BeltType::InputUnderground { tier, .. }
            | BeltType::OutputUnderground { tier, .. } => tier,
        }
    }

    /// Whether the piece accepts items from the tile behind it.
    #[inline]
    pub const fn has_input(&self) -> bool {
        matches!(
            self,
            BeltType::Belt(_) | BeltType::InputUnderground { .. }
        )
    }

    /// Whether the piece hands items to the tile ahead of it.
    #[inline]
    pub const fn has_output(&self) -> bool {
        matches!(
            self,
            BeltType::Belt(_) | BeltType::OutputUnderground { .. }
        )
    }

    #[inline]
    pub const fn is_underground(&self) -> bool {
        !matches!(self, BeltType::Belt(_))
    }

    #[inline]
    pub const fn is_isolated(&self) -> bool {
        matches!(
            self,
            BeltType::InputUnderground { isolated: true, .. }
                | BeltType::OutputUnderground { isolated: true, .. }
        )
    }

    /// Returns the same piece with its isolation flag replaced. Belts are returned unchanged.
    #[inline]
    pub const fn with_isolation(self, isolated: bool) -> Self {
        match self {
            BeltType::Belt(tier) => BeltType::Belt(tier),
            BeltType::InputUnderground { tier, .. } => {
                BeltType::InputUnderground { tier, isolated }
            }
            BeltType::OutputUnderground { tier, .. } => {
                BeltType::OutputUnderground { tier, isolated }
            }
        }
    }
}

impl std::fmt::Display for BeltType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeltType::Belt(tier) => write!(f, "Belt({})", tier.get()),
            BeltType::InputUnderground { tier, isolated } => {
                write!(f, "InputUnderground({}", tier.get())?;
                if *isolated {
                    write!(f, ", isolated")?;
                }
                write!(f, ")")
            }
            BeltType::OutputUnderground { tier, isolated } => {
                write!(f, "OutputUnderground({}", tier.get())?;
                if *isolated {
                    write!(f, ", isolated")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: TierIndex = TierIndex::new(0);

    #[test]
    fn test_capabilities_follow_the_tag() {
        assert!(BeltType::belt(T0).has_input() && BeltType::belt(T0).has_output());
        assert!(BeltType::entry(T0).has_input() && !BeltType::entry(T0).has_output());
        assert!(!BeltType::exit(T0).has_input() && BeltType::exit(T0).has_output());
        assert!(BeltType::isolated_entry(T0).has_input());
        assert!(BeltType::isolated_exit(T0).has_output());
    }

    #[test]
    fn test_isolation() {
        assert!(!BeltType::entry(T0).is_isolated());
        assert!(BeltType::isolated_exit(T0).is_isolated());
        assert!(!BeltType::belt(T0).is_isolated());
        assert_eq!(
            BeltType::entry(T0).with_isolation(true),
            BeltType::isolated_entry(T0)
        );
        assert_eq!(BeltType::belt(T0).with_isolation(true), BeltType::belt(T0));
    }

    #[test]
    fn test_tier_and_underground() {
        let t = TierIndex::new(2);
        assert_eq!(BeltType::exit(t).tier(), t);
        assert!(BeltType::exit(t).is_underground());
        assert!(!BeltType::belt(t).is_underground());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", BeltType::belt(T0)), "Belt(0)");
        assert_eq!(
            format!("{}", BeltType::isolated_entry(T0)),
            "InputUnderground(0, isolated)"
        );
        assert_eq!(format!("{}", BeltType::exit(T0)), "OutputUnderground(0)");
    }
}
