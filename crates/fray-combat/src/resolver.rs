//! The shared ability resolver.

use crate::descriptor::{Delivery, TargetFilter};
use crate::instance::{AbilityInstance, Impact};
use fray_core::{AbilityEffect, AbilityName, Combatant, EntityId, Vec2};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

/// Why a cast did not happen.
///
/// Never sent to clients; callers log it and move on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AbilityRejection {
    /// The caster is dead.
    #[error("caster is dead")]
    CasterDead,
    /// Not enough AP.
    #[error("insufficient AP ({have} < {cost})")]
    InsufficientAp {
        /// AP the caster has.
        have: i32,
        /// AP the ability costs.
        cost: i32,
    },
    /// Cooldown still running.
    #[error("on cooldown for another {remaining_ms} ms")]
    OnCooldown {
        /// Time left.
        remaining_ms: u64,
    },
    /// A ranged ability was cast without a resolved impact.
    #[error("no impact point resolved")]
    NoImpact,
}

/// A committed cast, ready to land on targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Strike {
    /// Ability that was cast.
    pub ability: AbilityName,
    /// Who cast it.
    pub caster: EntityId,
    /// Centre of the effect.
    pub impact: Vec2,
    /// Effect radius.
    pub radius: f32,
    /// Damage per hit.
    pub damage: i32,
    /// Hit-test mode.
    pub delivery: Delivery,
    /// Who can be hit.
    pub targets: TargetFilter,
}

/// Result of landing a [`Strike`].
#[derive(Clone, Debug, PartialEq)]
pub struct StrikeOutcome {
    /// The one visual notification for this cast.
    pub effect: AbilityEffect,
    /// Every entity that took damage.
    pub hits: SmallVec<[EntityId; 8]>,
    /// Entities this strike took from alive to dead.
    pub kills: SmallVec<[EntityId; 4]>,
}

/// Check preconditions and commit a cast.
///
/// On success the ability's cost is deducted from the caster and the
/// cooldown is stamped with `now_ms`; for ranged abilities the fixed
/// impact is consumed. On failure nothing is mutated.
pub fn prepare(
    caster: &mut dyn Combatant,
    instance: &mut AbilityInstance,
    now_ms: u64,
) -> Result<Strike, AbilityRejection> {
    let result = check(caster, instance, now_ms);
    let impact = match result {
        Ok(impact) => impact,
        Err(reason) => {
            debug!(
                caster = %caster.entity_id(),
                ability = %instance.name(),
                %reason,
                "ability rejected"
            );
            return Err(reason);
        }
    };

    let d = instance.descriptor().clone();
    let spent = caster.stats_mut().try_spend_ap(d.cost);
    debug_assert!(spent, "AP checked above");
    instance.stamp(now_ms);
    instance.take_impact();

    Ok(Strike {
        ability: d.name,
        caster: caster.entity_id(),
        impact,
        radius: d.radius,
        damage: d.damage,
        delivery: d.delivery,
        targets: d.targets,
    })
}

fn check(
    caster: &dyn Combatant,
    instance: &AbilityInstance,
    now_ms: u64,
) -> Result<Vec2, AbilityRejection> {
    if caster.stats().is_dead() {
        return Err(AbilityRejection::CasterDead);
    }
    let d = instance.descriptor();
    let have = caster.stats().ap;
    if have < d.cost {
        return Err(AbilityRejection::InsufficientAp { have, cost: d.cost });
    }
    let remaining_ms = instance.cooldown_remaining(now_ms);
    if remaining_ms > 0 {
        return Err(AbilityRejection::OnCooldown { remaining_ms });
    }
    match d.delivery {
        Delivery::Melee => Ok(caster.centre()),
        Delivery::Ranged { .. } => instance
            .impact()
            .map(|i| i.point)
            .ok_or(AbilityRejection::NoImpact),
    }
}

impl Strike {
    /// Whether this strike lands on `target`.
    ///
    /// Melee compares squared distance from the impact to the target's
    /// sprite centre against `(radius + collider)^2`. Ranged compares the
    /// true distance from the impact to the target's position against
    /// the bare radius.
    pub fn hits(&self, target: &dyn Combatant) -> bool {
        let id = target.entity_id();
        if id == self.caster || !self.targets.admits(id) || !target.is_targetable() {
            return false;
        }
        match self.delivery {
            Delivery::Melee => {
                let reach = self.radius + target.collision_radius();
                target.centre().distance_squared(self.impact) <= reach * reach
            }
            Delivery::Ranged { .. } => target.position().distance(self.impact) <= self.radius,
        }
    }

    /// Land the strike on every eligible target.
    pub fn apply<'a, I>(&self, targets: I) -> StrikeOutcome
    where
        I: IntoIterator<Item = &'a mut dyn Combatant>,
    {
        let mut hits = SmallVec::new();
        let mut kills = SmallVec::new();
        for target in targets {
            if !self.hits(target) {
                continue;
            }
            target.stats_mut().apply_damage(self.damage);
            let id = target.entity_id();
            hits.push(id);
            if target.stats().is_dead() {
                kills.push(id);
            }
        }
        StrikeOutcome {
            effect: self.effect(),
            hits,
            kills,
        }
    }

    /// The visual notification for this strike.
    pub fn effect(&self) -> AbilityEffect {
        AbilityEffect {
            ability: self.ability,
            caster_id: self.caster,
            impact_x: self.impact.x,
            impact_y: self.impact.y,
            radius: self.radius,
        }
    }
}

/// Prepare and apply in one call, for casters that are not part of the
/// target collection.
pub fn execute<'a, I>(
    caster: &mut dyn Combatant,
    instance: &mut AbilityInstance,
    now_ms: u64,
    targets: I,
) -> Result<StrikeOutcome, AbilityRejection>
where
    I: IntoIterator<Item = &'a mut dyn Combatant>,
{
    let strike = prepare(caster, instance, now_ms)?;
    Ok(strike.apply(targets))
}

/// Nearest candidate within `range` of `origin` that passes `filter`.
///
/// Candidates are `(id, position)` pairs of targetable entities. The
/// returned impact is fixed at the candidate's position.
pub fn acquire_target<I>(
    origin: Vec2,
    range: f32,
    filter: TargetFilter,
    exclude: EntityId,
    candidates: I,
) -> Option<Impact>
where
    I: IntoIterator<Item = (EntityId, Vec2)>,
{
    let range_sq = range * range;
    candidates
        .into_iter()
        .filter(|(id, _)| *id != exclude && filter.admits(*id))
        .map(|(id, pos)| (id, pos, pos.distance_squared(origin)))
        .filter(|(_, _, d)| *d <= range_sq)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(target, point, _)| Impact { point, target })
}
