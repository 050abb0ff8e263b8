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

//! # Belt Tiers
//!
//! A tier is a matched pair of a plain belt and its underground belt, sharing
//! speed and compatibility. The planner only needs three facts per tier: the
//! entity names (for lookups from snapshots), how far a tunnel may reach, and
//! the relative cost of each piece.
//!
//! Catalogs are an external concern; the planner reads them through the
//! `BeltCatalog` trait. `TierCatalog` is the in-memory implementation, which
//! can also be deserialized from JSON.
//!
//! ## Usage
//!
//! ```rust
//! use beltplan_model::tier::{BeltCatalog, BeltTier, TierCatalog};
//!
//! let catalog = TierCatalog::builder()
//!     .tier(BeltTier::new("basic", "transport-belt", "underground-belt", 5, 1.0, 2.5))
//!     .build()
//!     .unwrap();
//!
//! let index = catalog.tier_of_belt("underground-belt").unwrap();
//! assert_eq!(catalog.tier(index).unwrap().max_tunnel_distance(), 5);
//! ```

use crate::{error::ModelError, index::TierIndex, line::MAX_LINE_LEN};
use serde::{Deserialize, Serialize};

/// A matched belt / underground belt pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeltTier {
    name: String,
    belt_name: String,
    underground_name: String,
    /// Largest allowed offset between a tunnel entry and its exit.
    max_tunnel_distance: usize,
    belt_cost: f64,
    /// Cost of a single tunnel end, entry or exit.
    underground_cost: f64,
}

impl BeltTier {
    pub fn new<S1, S2, S3>(
        name: S1,
        belt_name: S2,
        underground_name: S3,
        max_tunnel_distance: usize,
        belt_cost: f64,
        underground_cost: f64,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            name: name.into(),
            belt_name: belt_name.into(),
            underground_name: underground_name.into(),
            max_tunnel_distance,
            belt_cost,
            underground_cost,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn belt_name(&self) -> &str {
        &self.belt_name
    }

    #[inline]
    pub fn underground_name(&self) -> &str {
        &self.underground_name
    }

    #[inline]
    pub fn max_tunnel_distance(&self) -> usize {
        self.max_tunnel_distance
    }

    #[inline]
    pub fn belt_cost(&self) -> f64 {
        self.belt_cost
    }

    #[inline]
    pub fn underground_cost(&self) -> f64 {
        self.underground_cost
    }

    /// Checks the tier for values no planner can work with.
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidTier {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.max_tunnel_distance == 0 {
            return Err(invalid("the maximum tunnel distance must be at least 1"));
        }
        if self.max_tunnel_distance > MAX_LINE_LEN {
            return Err(invalid("the maximum tunnel distance exceeds the longest line"));
        }
        if !self.belt_cost.is_finite() || self.belt_cost < 0.0 {
            return Err(invalid("the belt cost must be finite and non-negative"));
        }
        if !self.underground_cost.is_finite() || self.underground_cost < 0.0 {
            return Err(invalid("the underground cost must be finite and non-negative"));
        }
        if self.belt_name == self.underground_name {
            return Err(invalid("belt and underground entities must differ"));
        }
        Ok(())
    }
}

impl std::fmt::Display for BeltTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} / {}, tunnel <= {})",
            self.name, self.belt_name, self.underground_name, self.max_tunnel_distance
        )
    }
}

/// Read access to the belt tiers available to a planning run.
pub trait BeltCatalog {
    /// All tiers, in index order.
    fn tiers(&self) -> &[BeltTier];

    #[inline]
    fn tier(&self, index: TierIndex) -> Option<&BeltTier> {
        self.tiers().get(index.get())
    }

    #[inline]
    fn num_tiers(&self) -> usize {
        self.tiers().len()
    }

    /// Finds the tier owning the belt or underground entity called `entity_name`.
    fn tier_of_belt(&self, entity_name: &str) -> Option<TierIndex> {
        self.tiers()
            .iter()
            .position(|t| t.belt_name() == entity_name || t.underground_name() == entity_name)
            .map(TierIndex::new)
    }

    /// Returns the tier at `index` or `ModelError::UnknownTier`.
    fn require_tier(&self, index: TierIndex) -> Result<&BeltTier, ModelError> {
        self.tier(index)
            .ok_or(ModelError::UnknownTier { tier: index })
    }

    #[inline]
    fn tier_indices(&self) -> impl Iterator<Item = TierIndex>
    where
        Self: Sized,
    {
        (0..self.num_tiers()).map(TierIndex::new)
    }
}

/// An in-memory catalog of belt tiers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierCatalog {
    tiers: Vec<BeltTier>,
}

impl TierCatalog {
    #[inline]
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    #[inline]
    pub fn builder() -> TierCatalogBuilder {
        TierCatalogBuilder::new()
    }

    /// Builds a catalog from a list of tiers, validating each one.
    pub fn from_tiers(tiers: Vec<BeltTier>) -> Result<Self, ModelError> {
        let mut catalog = Self::new();
        for tier in tiers {
            catalog.push(tier)?;
        }
        Ok(catalog)
    }

    /// The three vanilla tiers with unit belt cost.
    pub fn vanilla() -> Self {
        Self {
            tiers: vec![
                BeltTier::new("basic", "transport-belt", "underground-belt", 5, 1.0, 2.5),
                BeltTier::new(
                    "fast",
                    "fast-transport-belt",
                    "fast-underground-belt",
                    7,
                    1.5,
                    3.5,
                ),
                BeltTier::new(
                    "express",
                    "express-transport-belt",
                    "express-underground-belt",
                    9,
                    2.0,
                    4.5,
                ),
            ],
        }
    }

    /// Validates and appends a tier, returning its index.
    pub fn push(&mut self, tier: BeltTier) -> Result<TierIndex, ModelError> {
        tier.validate()?;
        if self.tiers.iter().any(|t| t.name() == tier.name()) {
            return Err(ModelError::InvalidTier {
                name: tier.name,
                reason: "a tier with this name already exists".to_string(),
            });
        }
        self.tiers.push(tier);
        Ok(TierIndex::new(self.tiers.len() - 1))
    }

    /// Re-validates every tier, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.tiers.iter().try_for_each(BeltTier::validate)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl BeltCatalog for TierCatalog {
    #[inline]
    fn tiers(&self) -> &[BeltTier] {
        &self.tiers
    }
}

impl std::fmt::Display for TierCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TierCatalog ({} tiers)", self.tiers.len())?;
        for (i, tier) in self.tiers.iter().enumerate() {
            writeln!(f, "  [{}] {}", i, tier)?;
        }
        Ok(())
    }
}

/// A builder collecting tiers before validating them as a whole.
#[derive(Clone, Debug, Default)]
pub struct TierCatalogBuilder {
    tiers: Vec<BeltTier>,
}

impl TierCatalogBuilder {
    #[inline]
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    pub fn tier(mut self, tier: BeltTier) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn build(self) -> Result<TierCatalog, ModelError> {
        TierCatalog::from_tiers(self.tiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_lookup_by_entity_name() {
        let catalog = TierCatalog::vanilla();
        assert_eq!(catalog.num_tiers(), 3);
        assert_eq!(
            catalog.tier_of_belt("fast-underground-belt"),
            Some(TierIndex::new(1))
        );
        assert_eq!(
            catalog.tier_of_belt("express-transport-belt"),
            Some(TierIndex::new(2))
        );
        assert_eq!(catalog.tier_of_belt("pipe"), None);
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_zero_tunnel_distance_is_rejected() {
        let result = TierCatalog::builder()
            .tier(BeltTier::new("broken", "b", "u", 0, 1.0, 1.0))
            .build();
        assert!(matches!(result, Err(ModelError::InvalidTier { .. })));
    }

    #[test]
    fn test_unbounded_tunnel_distance_is_rejected() {
        let tier = BeltTier::new("broken", "b", "u", MAX_LINE_LEN + 1, 1.0, 1.0);
        assert!(matches!(tier.validate(), Err(ModelError::InvalidTier { .. })));
        let tier = BeltTier::new("long", "b", "u", MAX_LINE_LEN, 1.0, 1.0);
        assert!(tier.validate().is_ok());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let tier = BeltTier::new("broken", "b", "u", 4, -1.0, 1.0);
        assert!(tier.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut catalog = TierCatalog::new();
        catalog
            .push(BeltTier::new("a", "b1", "u1", 4, 1.0, 1.0))
            .unwrap();
        let err = catalog
            .push(BeltTier::new("a", "b2", "u2", 4, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidTier { .. }));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_require_unknown_tier() {
        let catalog = TierCatalog::vanilla();
        assert_eq!(
            catalog.require_tier(TierIndex::new(7)),
            Err(ModelError::UnknownTier {
                tier: TierIndex::new(7)
            })
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"[
            {
                "name": "basic",
                "belt_name": "transport-belt",
                "underground_name": "underground-belt",
                "max_tunnel_distance": 5,
                "belt_cost": 1.0,
                "underground_cost": 2.5
            }
        ]"#;
        let catalog: TierCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.tiers()[0].max_tunnel_distance(), 5);
        assert!(catalog.validate().is_ok());
    }
}
