//! Per-caster ability state.

use crate::descriptor::AbilityDescriptor;
use fray_core::{AbilityName, EntityId, Vec2};

/// A pre-resolved ranged impact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// Where the effect lands.
    pub point: Vec2,
    /// The entity it was aimed at.
    pub target: EntityId,
}

/// One caster's copy of an ability: the descriptor plus mutable
/// cooldown and impact state.
#[derive(Clone, Debug, PartialEq)]
pub struct AbilityInstance {
    descriptor: AbilityDescriptor,
    last_used: Option<u64>,
    impact: Option<Impact>,
}

impl AbilityInstance {
    /// A never-used instance, ready to fire.
    pub fn new(descriptor: AbilityDescriptor) -> Self {
        Self {
            descriptor,
            last_used: None,
            impact: None,
        }
    }

    /// Static configuration.
    pub fn descriptor(&self) -> &AbilityDescriptor {
        &self.descriptor
    }

    /// Ability name.
    pub fn name(&self) -> AbilityName {
        self.descriptor.name
    }

    /// Timestamp of the last successful cast.
    pub fn last_used(&self) -> Option<u64> {
        self.last_used
    }

    /// Milliseconds until the cooldown expires; zero when ready.
    pub fn cooldown_remaining(&self, now_ms: u64) -> u64 {
        match self.last_used {
            None => 0,
            Some(t) => self
                .descriptor
                .cooldown_ms
                .saturating_sub(now_ms.saturating_sub(t)),
        }
    }

    /// Whether the cooldown has elapsed.
    pub fn is_ready(&self, now_ms: u64) -> bool {
        self.cooldown_remaining(now_ms) == 0
    }

    /// Fix the impact point for the next cast.
    pub fn set_impact(&mut self, impact: Impact) {
        self.impact = Some(impact);
    }

    /// The currently fixed impact, if any.
    pub fn impact(&self) -> Option<Impact> {
        self.impact
    }

    /// Forget the fixed impact.
    pub fn clear_impact(&mut self) {
        self.impact = None;
    }

    /// Make the ability usable immediately.
    pub fn reset_cooldown(&mut self) {
        self.last_used = None;
    }

    pub(crate) fn stamp(&mut self, now_ms: u64) {
        self.last_used = Some(now_ms);
    }

    pub(crate) fn take_impact(&mut self) -> Option<Impact> {
        self.impact.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CasterSide;

    #[test]
    fn cooldown_countdown() {
        let mut inst = AbilityInstance::new(AbilityDescriptor::melee(
            AbilityName::HammerSwing,
            CasterSide::Player,
            1,
            10.0,
            500,
            0,
        ));
        assert!(inst.is_ready(0));
        inst.stamp(1_000);
        assert_eq!(inst.cooldown_remaining(1_200), 300);
        assert!(!inst.is_ready(1_499));
        assert!(inst.is_ready(1_500));
        inst.reset_cooldown();
        assert!(inst.is_ready(1_000));
    }
}
