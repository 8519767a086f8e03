//! Static ability configuration.

use fray_core::{AbilityName, EntityId};
use serde::{Deserialize, Serialize};

/// Which side of the fight cast an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CasterSide {
    /// A player character.
    Player,
    /// A hostile agent.
    Agent,
}

impl CasterSide {
    /// Side of the given entity.
    pub fn of(id: EntityId) -> Self {
        match id {
            EntityId::Player(_) => Self::Player,
            EntityId::Agent(_) => Self::Agent,
        }
    }
}

/// Which entities an ability can damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetFilter {
    /// Player characters only.
    Players,
    /// Hostile agents only.
    Agents,
    /// Everyone except the caster.
    All,
}

impl TargetFilter {
    /// Whether `id` passes the filter.
    pub fn admits(self, id: EntityId) -> bool {
        matches!(
            (self, id),
            (Self::All, _) | (Self::Players, EntityId::Player(_)) | (Self::Agents, EntityId::Agent(_))
        )
    }

    /// The filter that targets the opposing side of `side`.
    pub fn opposing(side: CasterSide) -> Self {
        match side {
            CasterSide::Player => Self::Agents,
            CasterSide::Agent => Self::Players,
        }
    }
}

/// How the impact point of an ability is found.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Delivery {
    /// Centred on the caster's sprite; hit test inflates the radius by
    /// the target's collider.
    Melee,
    /// Centred on a point resolved before the cast; hit test uses the
    /// bare radius.
    Ranged {
        /// Maximum distance from caster to the chosen target.
        range: f32,
    },
}

impl Delivery {
    /// Whether the ability needs a pre-resolved impact point.
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::Ranged { .. })
    }
}

/// Everything that defines one combat action for one caster side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityDescriptor {
    /// Catalog key.
    pub name: AbilityName,
    /// Who casts this variant.
    pub side: CasterSide,
    /// AP deducted per cast.
    pub cost: i32,
    /// Minimum time between casts.
    pub cooldown_ms: u64,
    /// HP removed from every target hit.
    pub damage: i32,
    /// Effect radius in pixels.
    pub radius: f32,
    /// Impact point resolution.
    pub delivery: Delivery,
    /// Who can be hit.
    pub targets: TargetFilter,
}

impl AbilityDescriptor {
    /// A melee descriptor aimed at the opposing side.
    pub fn melee(
        name: AbilityName,
        side: CasterSide,
        damage: i32,
        radius: f32,
        cooldown_ms: u64,
        cost: i32,
    ) -> Self {
        Self {
            name,
            side,
            cost,
            cooldown_ms,
            damage,
            radius,
            delivery: Delivery::Melee,
            targets: TargetFilter::opposing(side),
        }
    }

    /// A ranged descriptor aimed at the opposing side.
    pub fn ranged(
        name: AbilityName,
        side: CasterSide,
        damage: i32,
        radius: f32,
        range: f32,
        cooldown_ms: u64,
        cost: i32,
    ) -> Self {
        Self {
            name,
            side,
            cost,
            cooldown_ms,
            damage,
            radius,
            delivery: Delivery::Ranged { range },
            targets: TargetFilter::opposing(side),
        }
    }

    /// Maximum target acquisition range; melee abilities reach their
    /// radius.
    pub fn reach(&self) -> f32 {
        match self.delivery {
            Delivery::Melee => self.radius,
            Delivery::Ranged { range } => range,
        }
    }
}
