//! The player record.

use crate::config::PlayerDefaults;
use crate::sink::{ClientSink, TransportError};
use fray_combat::{prepare, AbilityCatalog, AbilityInstance, CasterSide, CatalogError, Strike};
use fray_core::{
    CharacterClass, Combatant, EntityId, Facing, InputState, PlayerId, PlayerSnapshot,
    ProgressionState, ServerMessage, Stats, Vec2, ZoneId,
};

/// Which of a player's two abilities to cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilitySlot {
    /// The timer-driven default attack.
    Base,
    /// The ability bound to the action key.
    Action,
}

/// A connected player owned by exactly one zone.
///
/// The record carries its own transport, so migrating a player moves
/// its connection along with it.
pub struct Player {
    id: PlayerId,
    zone: ZoneId,
    class: CharacterClass,
    position: Vec2,
    velocity: Vec2,
    speed: f32,
    facing: Facing,
    sprite_height: f32,
    stats: Stats,
    progression: ProgressionState,
    base: Option<AbilityInstance>,
    action: Option<AbilityInstance>,
    base_interval_ms: u64,
    base_timer_ms: u64,
    ap_regen_per_sec: f32,
    ap_carry: f32,
    dead: bool,
    disconnected: bool,
    migrating: bool,
    outbox: Vec<ServerMessage>,
    sink: Box<dyn ClientSink>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("zone", &self.zone)
            .field("position", &self.position)
            .field("stats", &self.stats)
            .field("progression", &self.progression)
            .field("dead", &self.dead)
            .field("migrating", &self.migrating)
            .finish_non_exhaustive()
    }
}

/// The ability instances every new player starts with.
#[derive(Clone, Debug)]
pub struct Loadout {
    /// Timer-driven default attack.
    pub base: AbilityInstance,
    /// Action-key ability.
    pub action: Option<AbilityInstance>,
}

impl Loadout {
    /// Resolve the abilities named in `defaults` against `catalog`.
    pub fn from_catalog(
        defaults: &PlayerDefaults,
        catalog: &AbilityCatalog,
    ) -> Result<Self, CatalogError> {
        let base = catalog
            .require(defaults.base_ability, CasterSide::Player)?
            .clone();
        let action = defaults
            .action_ability
            .map(|name| catalog.require(name, CasterSide::Player).cloned())
            .transpose()?;
        Ok(Self {
            base: AbilityInstance::new(base),
            action: action.map(AbilityInstance::new),
        })
    }
}

impl Player {
    /// Build a player of `class` at `position` with fresh copies of
    /// `loadout`'s abilities.
    pub fn new(
        id: PlayerId,
        zone: ZoneId,
        class: CharacterClass,
        position: Vec2,
        defaults: &PlayerDefaults,
        loadout: &Loadout,
        sink: Box<dyn ClientSink>,
    ) -> Self {
        Self {
            id,
            zone,
            class,
            position,
            velocity: Vec2::ZERO,
            speed: defaults.speed,
            facing: Facing::default(),
            sprite_height: defaults.sprite_height,
            stats: class.stats(defaults.base_hp, defaults.base_ap, defaults.base_attack),
            progression: ProgressionState::default(),
            base: Some(loadout.base.clone()),
            action: loadout.action.clone(),
            base_interval_ms: defaults.base_attack_interval_ms,
            base_timer_ms: defaults.base_attack_interval_ms,
            ap_regen_per_sec: defaults.ap_regen_per_sec,
            ap_carry: 0.0,
            dead: false,
            disconnected: false,
            migrating: false,
            outbox: Vec::new(),
            sink,
        }
    }

    /// Player id.
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Owning zone.
    pub fn zone_id(&self) -> ZoneId {
        self.zone
    }

    pub(crate) fn set_zone(&mut self, zone: ZoneId) {
        self.zone = zone;
    }

    /// Chosen class.
    pub fn class(&self) -> CharacterClass {
        self.class
    }

    /// Current velocity in px/s.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Sprite facing.
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Level and XP.
    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    /// Level and XP, mutably, for XP awards.
    pub fn progression_mut(&mut self) -> (&mut ProgressionState, &mut Stats) {
        (&mut self.progression, &mut self.stats)
    }

    /// An ability slot, if filled.
    pub fn ability(&self, slot: AbilitySlot) -> Option<&AbilityInstance> {
        match slot {
            AbilitySlot::Base => self.base.as_ref(),
            AbilitySlot::Action => self.action.as_ref(),
        }
    }

    /// Whether the player has died and awaits respawn.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Whether the transport failed or the client left.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Whether a migration request is outstanding.
    pub fn is_migrating(&self) -> bool {
        self.migrating
    }

    pub(crate) fn set_migrating(&mut self, migrating: bool) {
        self.migrating = migrating;
    }

    /// Teleport, e.g. on placement or in tests.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Apply a key-state update.
    ///
    /// Dead players ignore input. Returns whether the action key is held
    /// and the player may act on it.
    pub fn apply_input(&mut self, input: InputState) -> bool {
        if self.dead {
            return false;
        }
        self.velocity = input.movement.direction() * self.speed;
        if let Some(facing) = Facing::from_velocity(self.velocity) {
            self.facing = facing;
        }
        input.action
    }

    /// Position after moving for `dt` seconds at the current velocity.
    pub fn projected(&self, dt: f32) -> Vec2 {
        self.position + self.velocity * dt
    }

    /// Whether this player moves this tick.
    pub fn can_move(&self) -> bool {
        !self.dead && !self.migrating && self.velocity != Vec2::ZERO
    }

    /// Regenerate AP for `dt` seconds, keeping the fractional remainder.
    pub fn regen_ap(&mut self, dt: f32) {
        if self.dead {
            return;
        }
        self.ap_carry += self.ap_regen_per_sec * dt;
        let whole = self.ap_carry.floor();
        if whole >= 1.0 {
            self.ap_carry -= whole;
            self.stats.restore_ap(whole as i32);
        }
        if self.stats.ap >= self.stats.max_ap {
            self.ap_carry = 0.0;
        }
    }

    /// Count the base-attack timer down by `dt_ms`; true once it has
    /// reached zero. The timer stays at zero until
    /// [`reset_base_timer`](Self::reset_base_timer).
    pub fn tick_base_timer(&mut self, dt_ms: u64) -> bool {
        self.base_timer_ms = self.base_timer_ms.saturating_sub(dt_ms);
        self.base_timer_ms == 0 && !self.dead
    }

    /// Restart the base-attack timer.
    pub fn reset_base_timer(&mut self) {
        self.base_timer_ms = self.base_interval_ms;
    }

    /// Try to cast the ability in `slot`.
    ///
    /// Rejections are logged by the resolver and yield `None`.
    pub fn cast(&mut self, slot: AbilitySlot, now_ms: u64) -> Option<Strike> {
        let mut inst = match slot {
            AbilitySlot::Base => self.base.take()?,
            AbilitySlot::Action => self.action.take()?,
        };
        let strike = prepare(self, &mut inst, now_ms).ok();
        match slot {
            AbilitySlot::Base => self.base = Some(inst),
            AbilitySlot::Action => self.action = Some(inst),
        }
        strike
    }

    /// Mark the player dead: HP pinned at zero, movement stopped.
    ///
    /// Returns false if it was already dead.
    pub fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.stats.clamp_hp();
        self.velocity = Vec2::ZERO;
        true
    }

    /// Bring the player back at `position` in `zone` with full stats
    /// and fresh cooldowns. Progression is kept.
    pub fn revive(&mut self, zone: ZoneId, position: Vec2) {
        self.zone = zone;
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.stats.refill();
        self.dead = false;
        self.migrating = false;
        self.ap_carry = 0.0;
        self.base_timer_ms = self.base_interval_ms;
        for inst in [self.base.as_mut(), self.action.as_mut()].into_iter().flatten() {
            inst.reset_cooldown();
            inst.clear_impact();
        }
    }

    /// Queue a message for this tick's batch.
    pub fn push(&mut self, msg: ServerMessage) {
        self.outbox.push(msg);
    }

    /// Messages queued so far this tick.
    pub fn pending(&self) -> &[ServerMessage] {
        &self.outbox
    }

    /// Send the queued batch. On failure the player is marked
    /// disconnected and the batch is discarded.
    pub fn flush(&mut self) -> Result<(), TransportError> {
        if self.disconnected || self.outbox.is_empty() {
            return Ok(());
        }
        let result = self.sink.send_batch(&self.outbox);
        self.outbox.clear();
        if result.is_err() {
            self.disconnected = true;
        }
        result
    }

    /// Close the transport, best effort.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
        self.outbox.clear();
        self.sink.close();
    }

    /// Outbound view stamped with the owning zone's clock.
    pub fn snapshot(&self, now_ms: u64) -> PlayerSnapshot {
        PlayerSnapshot::new(
            self.id,
            self.zone,
            self.position,
            &self.stats,
            self.progression.level,
            self.progression.xp,
            self.facing,
            now_ms,
        )
    }
}

impl Combatant for Player {
    fn entity_id(&self) -> EntityId {
        EntityId::Player(self.id)
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    fn sprite_height(&self) -> f32 {
        self.sprite_height
    }

    fn collision_radius(&self) -> f32 {
        self.sprite_height / 2.0
    }

    fn is_targetable(&self) -> bool {
        !self.dead && !self.disconnected && !self.stats.is_dead()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::JsonLinesSink;
    use fray_core::{AbilityName, MoveKeys};

    struct Broken;

    impl ClientSink for Broken {
        fn send_batch(&mut self, _: &[ServerMessage]) -> Result<(), TransportError> {
            Err(TransportError::Disconnected)
        }
    }

    fn player(sink: Box<dyn ClientSink>) -> Player {
        let defaults = PlayerDefaults::default();
        let loadout = Loadout::from_catalog(&defaults, &AbilityCatalog::default()).unwrap();
        Player::new(
            PlayerId(1),
            ZoneId(1),
            CharacterClass::Guardian,
            Vec2::new(100.0, 100.0),
            &defaults,
            &loadout,
            sink,
        )
    }

    fn quiet() -> Player {
        player(Box::new(JsonLinesSink::new(std::io::sink())))
    }

    fn keys(bits: u8, action: bool) -> InputState {
        InputState {
            movement: MoveKeys::from_bits(bits),
            action,
        }
    }

    #[test]
    fn loadout_requires_catalog_entries() {
        let defaults = PlayerDefaults::default();
        assert!(Loadout::from_catalog(&defaults, &AbilityCatalog::empty()).is_err());
        let loadout = Loadout::from_catalog(&defaults, &AbilityCatalog::default()).unwrap();
        assert_eq!(loadout.base.name(), AbilityName::HammerSwing);
        assert_eq!(
            loadout.action.as_ref().map(AbilityInstance::name),
            Some(AbilityName::ColossalSweep)
        );
    }

    #[test]
    fn class_scales_stats() {
        let p = quiet();
        assert_eq!(p.stats().max_hp, 450);
        assert_eq!(p.stats().attack_power, 45);
        assert_eq!(p.stats().max_ap, 100);
        assert_eq!(p.collision_radius(), 32.0);
    }

    #[test]
    fn input_sets_velocity_and_facing() {
        let mut p = quiet();
        assert!(!p.apply_input(keys(MoveKeys::RIGHT | MoveKeys::UP, false)));
        assert_eq!(p.facing(), Facing::Right);
        assert!((p.velocity().length() - 160.0).abs() < 1e-3);
        assert!(p.apply_input(keys(0, true)));
        assert_eq!(p.velocity(), Vec2::ZERO);
        // Facing survives a stop.
        assert_eq!(p.facing(), Facing::Right);
    }

    #[test]
    fn ap_regen_accumulates_fractions() {
        let mut p = quiet();
        p.stats_mut().ap = 0;
        for _ in 0..3 {
            p.regen_ap(0.1);
        }
        assert_eq!(p.stats().ap, 1);
        for _ in 0..1000 {
            p.regen_ap(0.1);
        }
        assert_eq!(p.stats().ap, p.stats().max_ap);
    }

    #[test]
    fn base_timer_holds_at_zero() {
        let mut p = quiet();
        assert!(!p.tick_base_timer(900));
        assert!(p.tick_base_timer(100));
        assert!(p.tick_base_timer(100));
        p.reset_base_timer();
        assert!(!p.tick_base_timer(100));
    }

    #[test]
    fn action_cast_spends_ap_once() {
        let mut p = quiet();
        let before = p.stats().ap;
        let strike = p.cast(AbilitySlot::Action, 1000).unwrap();
        assert_eq!(strike.ability, AbilityName::ColossalSweep);
        assert_eq!(p.stats().ap, before - 20);
        assert!(p.cast(AbilitySlot::Action, 1500).is_none());
        assert_eq!(p.stats().ap, before - 20);
        assert!(p.ability(AbilitySlot::Action).is_some());
    }

    #[test]
    fn dead_player_ignores_input_and_revives_full() {
        let mut p = quiet();
        p.apply_input(keys(MoveKeys::LEFT, false));
        p.stats_mut().apply_damage(10_000);
        assert!(p.mark_dead());
        assert!(!p.mark_dead());
        assert_eq!(p.stats().hp, 0);
        assert!(!p.is_targetable());
        assert!(!p.apply_input(keys(MoveKeys::LEFT, true)));
        assert!(!p.can_move());

        p.revive(ZoneId(2), Vec2::new(5.0, 5.0));
        assert_eq!(p.stats().hp, p.stats().max_hp);
        assert_eq!(p.zone_id(), ZoneId(2));
        assert!(p.is_targetable());
    }

    #[test]
    fn failed_flush_marks_disconnected() {
        let mut p = player(Box::new(Broken));
        p.push(ServerMessage::PlayerUpdates(Vec::new()));
        assert_eq!(p.flush(), Err(TransportError::Disconnected));
        assert!(p.is_disconnected());
        assert!(p.pending().is_empty());
        assert!(!p.is_targetable());
    }
}
