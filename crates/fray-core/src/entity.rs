//! The capability interface ability targeting operates on.

use crate::id::EntityId;
use crate::stats::Stats;
use glam::Vec2;

/// The minimal view of an entity that combat needs.
///
/// Implemented by both the player record and the hostile-agent record.
/// Ability resolution and hit testing see only this trait, never the
/// concrete type.
///
/// Positions are anchored at the sprite's visual base, so the visual
/// centre of an entity is `position - (0, sprite_height / 2)`.
pub trait Combatant {
    /// Identity of the entity.
    fn entity_id(&self) -> EntityId;

    /// World-space position (sprite base).
    fn position(&self) -> Vec2;

    /// Read access to the stat block.
    fn stats(&self) -> &Stats;

    /// Write access to the stat block.
    fn stats_mut(&mut self) -> &mut Stats;

    /// Height of the entity's sprite in pixels.
    fn sprite_height(&self) -> f32;

    /// Radius of the collider used by melee hit tests.
    fn collision_radius(&self) -> f32;

    /// Whether abilities can currently land on this entity.
    fn is_targetable(&self) -> bool {
        !self.stats().is_dead()
    }

    /// Visual centre of the sprite.
    fn centre(&self) -> Vec2 {
        self.position() - Vec2::new(0.0, self.sprite_height() / 2.0)
    }
}
