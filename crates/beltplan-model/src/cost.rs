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

use crate::{belt_type::BeltType, tier::BeltCatalog};
use beltplan_core::{
    geometry::{Direction, TilePosition},
    num::{CostNumeric, cost_from_f64},
};

/// The price of placing `belt_type` facing `direction` on `tile`.
///
/// Both solving paths read the same function. An infinite cost removes the
/// option altogether.
pub trait CostFunction<C>: Send + Sync {
    fn cost(&self, belt_type: BeltType, tile: TilePosition, direction: Direction) -> C;
}

impl<C, F> CostFunction<C> for F
where
    F: Fn(BeltType, TilePosition, Direction) -> C + Send + Sync,
{
    #[inline]
    fn cost(&self, belt_type: BeltType, tile: TilePosition, direction: Direction) -> C {
        self(belt_type, tile, direction)
    }
}

/// Prices every piece by its tier's catalog cost, independent of the tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TierCostFunction {
    /// `(belt_cost, underground_cost)` per tier.
    costs: Vec<(f64, f64)>,
}

impl TierCostFunction {
    pub fn from_catalog<B>(catalog: &B) -> Self
    where
        B: BeltCatalog + ?Sized,
    {
        Self {
            costs: catalog
                .tiers()
                .iter()
                .map(|t| (t.belt_cost(), t.underground_cost()))
                .collect(),
        }
    }
}

impl<C> CostFunction<C> for TierCostFunction
where
    C: CostNumeric,
{
    fn cost(&self, belt_type: BeltType, _tile: TilePosition, _direction: Direction) -> C {
        match self.costs.get(belt_type.tier().get()) {
            Some(&(belt, _)) if !belt_type.is_underground() => cost_from_f64(belt),
            Some(&(_, underground)) => cost_from_f64(underground),
            None => C::infinity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index::TierIndex, tier::TierCatalog};

    #[test]
    fn test_tier_costs() {
        let catalog = TierCatalog::vanilla();
        let costs = TierCostFunction::from_catalog(&catalog);
        let tile = TilePosition::new(0, 0);
        let t1 = TierIndex::new(1);
        let belt: f64 = costs.cost(BeltType::belt(t1), tile, Direction::East);
        let exit: f64 = costs.cost(BeltType::exit(t1), tile, Direction::East);
        let unknown: f64 = costs.cost(BeltType::belt(TierIndex::new(5)), tile, Direction::East);
        assert_eq!(belt, 1.5);
        assert_eq!(exit, 3.5);
        assert!(unknown.is_infinite());
    }

    #[test]
    fn test_closure_cost_function() {
        let blocked = TilePosition::new(1, 0);
        let costs = move |bt: BeltType, tile: TilePosition, _d: Direction| -> f64 {
            if tile == blocked {
                f64::INFINITY
            } else if bt.is_underground() {
                2.0
            } else {
                1.0
            }
        };
        let t = TierIndex::new(0);
        assert_eq!(
            costs.cost(BeltType::entry(t), TilePosition::new(0, 0), Direction::East),
            2.0
        );
        assert!(
            costs
                .cost(BeltType::belt(t), blocked, Direction::East)
                .is_infinite()
        );
    }
}
