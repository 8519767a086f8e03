//! The ability strategy table.

use crate::descriptor::{AbilityDescriptor, CasterSide, Delivery};
use crate::instance::AbilityInstance;
use fray_core::AbilityName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from [`AbilityCatalog::validate`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CatalogError {
    /// A descriptor has a negative AP cost.
    #[error("{name} ({side:?}) has negative cost {cost}")]
    NegativeCost {
        /// Ability.
        name: AbilityName,
        /// Caster side.
        side: CasterSide,
        /// Rejected cost.
        cost: i32,
    },
    /// A radius or range is not a positive finite number.
    #[error("{name} ({side:?}) has invalid {field} {value}")]
    InvalidExtent {
        /// Ability.
        name: AbilityName,
        /// Caster side.
        side: CasterSide,
        /// `"radius"` or `"range"`.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A lookup key is missing.
    #[error("no {name} defined for {side:?} casters")]
    Missing {
        /// Ability.
        name: AbilityName,
        /// Caster side.
        side: CasterSide,
    },
}

/// Ability descriptors keyed by `(name, caster side)`.
///
/// The default catalog encodes the standard economy: basic attacks
/// (HammerSwing, Fireball) are free and ColossalSweep costs 20 AP. Costs
/// are ordinary fields so a deployment can change them through
/// configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AbilityDescriptor>", into = "Vec<AbilityDescriptor>")]
pub struct AbilityCatalog {
    entries: IndexMap<(AbilityName, CasterSide), AbilityDescriptor>,
}

impl AbilityCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert or replace a descriptor.
    pub fn insert(&mut self, descriptor: AbilityDescriptor) {
        self.entries
            .insert((descriptor.name, descriptor.side), descriptor);
    }

    /// Look up a descriptor.
    pub fn get(&self, name: AbilityName, side: CasterSide) -> Option<&AbilityDescriptor> {
        self.entries.get(&(name, side))
    }

    /// Look up a descriptor, failing with [`CatalogError::Missing`].
    pub fn require(
        &self,
        name: AbilityName,
        side: CasterSide,
    ) -> Result<&AbilityDescriptor, CatalogError> {
        self.get(name, side)
            .ok_or(CatalogError::Missing { name, side })
    }

    /// Fresh, ready-to-use instance of a descriptor.
    pub fn instance(&self, name: AbilityName, side: CasterSide) -> Option<AbilityInstance> {
        self.get(name, side).cloned().map(AbilityInstance::new)
    }

    /// Change the AP cost of one ability for both sides.
    pub fn set_cost(&mut self, name: AbilityName, cost: i32) {
        for ((n, _), d) in self.entries.iter_mut() {
            if *n == name {
                d.cost = cost;
            }
        }
    }

    /// Iterate over all descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityDescriptor> {
        self.entries.values()
    }

    /// Check every descriptor for sane numbers.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for d in self.entries.values() {
            if d.cost < 0 {
                return Err(CatalogError::NegativeCost {
                    name: d.name,
                    side: d.side,
                    cost: d.cost,
                });
            }
            let mut extents = vec![("radius", d.radius)];
            if let Delivery::Ranged { range } = d.delivery {
                extents.push(("range", range));
            }
            for (field, value) in extents {
                if !(value.is_finite() && value > 0.0) {
                    return Err(CatalogError::InvalidExtent {
                        name: d.name,
                        side: d.side,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for AbilityCatalog {
    fn default() -> Self {
        use AbilityName::*;
        use CasterSide::*;
        let mut c = Self::empty();
        c.insert(AbilityDescriptor::melee(HammerSwing, Player, 15, 100.0, 500, 0));
        c.insert(AbilityDescriptor::melee(HammerSwing, Agent, 10, 70.0, 2000, 0));
        c.insert(AbilityDescriptor::ranged(Fireball, Player, 25, 50.0, 400.0, 3000, 0));
        c.insert(AbilityDescriptor::ranged(Fireball, Agent, 20, 50.0, 300.0, 3000, 0));
        c.insert(AbilityDescriptor::melee(ColossalSweep, Player, 30, 150.0, 2000, 20));
        c.insert(AbilityDescriptor::melee(ColossalSweep, Agent, 20, 100.0, 3000, 20));
        c
    }
}

impl From<Vec<AbilityDescriptor>> for AbilityCatalog {
    fn from(list: Vec<AbilityDescriptor>) -> Self {
        let mut c = Self::empty();
        for d in list {
            c.insert(d);
        }
        c
    }
}

impl From<AbilityCatalog> for Vec<AbilityDescriptor> {
    fn from(c: AbilityCatalog) -> Self {
        c.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TargetFilter;

    #[test]
    fn default_economy() {
        let c = AbilityCatalog::default();
        c.validate().unwrap();
        let hs = c.get(AbilityName::HammerSwing, CasterSide::Player).unwrap();
        assert_eq!((hs.damage, hs.radius, hs.cooldown_ms, hs.cost), (15, 100.0, 500, 0));
        assert_eq!(hs.targets, TargetFilter::Agents);
        let fb = c.get(AbilityName::Fireball, CasterSide::Agent).unwrap();
        assert_eq!(fb.delivery, Delivery::Ranged { range: 300.0 });
        assert_eq!(fb.targets, TargetFilter::Players);
        let cs = c.get(AbilityName::ColossalSweep, CasterSide::Player).unwrap();
        assert_eq!(cs.cost, 20);
    }

    #[test]
    fn costs_are_configurable() {
        let mut c = AbilityCatalog::default();
        c.set_cost(AbilityName::HammerSwing, 5);
        assert_eq!(c.get(AbilityName::HammerSwing, CasterSide::Agent).unwrap().cost, 5);
        assert_eq!(c.get(AbilityName::HammerSwing, CasterSide::Player).unwrap().cost, 5);
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let mut c = AbilityCatalog::default();
        c.set_cost(AbilityName::Fireball, -1);
        assert!(matches!(c.validate(), Err(CatalogError::NegativeCost { .. })));

        let mut c = AbilityCatalog::empty();
        c.insert(AbilityDescriptor::ranged(
            AbilityName::Fireball,
            CasterSide::Player,
            1,
            10.0,
            0.0,
            100,
            0,
        ));
        assert!(matches!(
            c.validate(),
            Err(CatalogError::InvalidExtent { field: "range", .. })
        ));
    }

    #[test]
    fn deserializes_from_list() {
        let raw = r#"[{
            "name": "HammerSwing", "side": "player", "cost": 3, "cooldownMs": 250,
            "damage": 9, "radius": 40.0, "delivery": {"kind": "melee"}, "targets": "all"
        }]"#;
        let c: AbilityCatalog = serde_json::from_str(raw).unwrap();
        let d = c.require(AbilityName::HammerSwing, CasterSide::Player).unwrap();
        assert_eq!(d.cost, 3);
        assert_eq!(d.targets, TargetFilter::All);
        assert!(c.require(AbilityName::Fireball, CasterSide::Player).is_err());
    }
}
