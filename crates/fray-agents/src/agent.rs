//! The hostile-agent record and its per-tick state machine.

use crate::profile::{AgentProfile, BehaviorTuning};
use crate::separation::SeparationGrid;
use crate::state::AgentState;
use fray_combat::{
    acquire_target, prepare, AbilityCatalog, AbilityInstance, CasterSide, Delivery, Strike,
};
use fray_core::{
    AgentId, AgentSnapshot, Combatant, EntityId, Stats, TelegraphWarning, Vec2, ZoneId,
};
use fray_space::ZoneBounds;
use rand::Rng;
use std::f32::consts::TAU;
use std::sync::Arc;
use tracing::debug;

/// Read-only view of the zone an agent is updated against.
#[derive(Clone, Copy, Debug)]
pub struct AgentContext<'a> {
    /// Zone clock in milliseconds.
    pub now_ms: u64,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Targetable players in the zone.
    pub players: &'a [(EntityId, Vec2)],
    /// Start-of-tick agent positions.
    pub separation: &'a SeparationGrid,
    /// The owning zone's rectangle; agents never leave it.
    pub bounds: ZoneBounds,
    /// Shared steering constants.
    pub tuning: &'a BehaviorTuning,
}

/// XP to distribute when an agent's death completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct XpAward {
    /// The expired agent.
    pub agent: AgentId,
    /// XP per eligible player.
    pub amount: u32,
    /// Centre of the award circle.
    pub origin: Vec2,
    /// Radius of the award circle.
    pub radius: f32,
}

/// Something the zone has to act on after an agent update.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    /// A ranged telegraph has locked on; broadcast the warning.
    Telegraph(TelegraphWarning),
    /// The telegraph completed and the ability fired; land it.
    Strike(Strike),
    /// Death completed; grant XP and remove the agent.
    Expired(XpAward),
}

/// A hostile agent owned by one zone.
#[derive(Clone, Debug)]
pub struct HostileAgent {
    id: AgentId,
    zone: ZoneId,
    profile: Arc<AgentProfile>,
    position: Vec2,
    spawn_point: Vec2,
    velocity: Vec2,
    stats: Stats,
    ability: Option<AbilityInstance>,
    state: AgentState,
    entered_at: u64,
    duration_ms: u64,
    fresh_entry: bool,
    expired: bool,
}

impl HostileAgent {
    /// A freshly spawned agent in `Spawn` state.
    ///
    /// The agent's ability instance comes from `catalog`; a profile
    /// naming an ability the catalog lacks yields an agent without one.
    pub fn spawn(
        zone: ZoneId,
        profile: Arc<AgentProfile>,
        position: Vec2,
        catalog: &AbilityCatalog,
        now_ms: u64,
    ) -> Self {
        let ability = profile
            .ability
            .and_then(|name| catalog.instance(name, CasterSide::Agent));
        let stats = Stats::new(profile.max_hp, 0, profile.attack);
        let spawn_ms = profile.spawn_ms;
        Self {
            id: AgentId::next(),
            zone,
            profile,
            position,
            spawn_point: position,
            velocity: Vec2::ZERO,
            stats,
            ability,
            state: AgentState::Spawn,
            entered_at: now_ms,
            duration_ms: spawn_ms,
            fresh_entry: true,
            expired: false,
        }
    }

    /// Agent id.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Owning zone.
    pub fn zone_id(&self) -> ZoneId {
        self.zone
    }

    /// Behavior profile.
    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Current state.
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// When the current state was entered.
    pub fn entered_at(&self) -> u64 {
        self.entered_at
    }

    /// Configured length of the current state; zero for duration-less
    /// states.
    pub fn state_duration(&self) -> u64 {
        self.duration_ms
    }

    /// Current velocity in px/s.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Where the agent was spawned.
    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    /// The agent's ability, if it has one.
    pub fn ability(&self) -> Option<&AbilityInstance> {
        self.ability.as_ref()
    }

    /// Whether death has completed and the agent awaits removal.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Teleport the agent, e.g. in tests or on placement.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Enter `state` at `now_ms` for `duration_ms`.
    ///
    /// Always arms the one-shot entry flag, including when `state`
    /// equals the current state, so entry actions re-run on
    /// self-transitions.
    pub fn transition(&mut self, state: AgentState, now_ms: u64, duration_ms: u64) {
        if state != self.state {
            debug!(agent = %self.id, from = %self.state, to = %state, "agent state change");
        }
        self.state = state;
        self.entered_at = now_ms;
        self.duration_ms = duration_ms;
        self.fresh_entry = true;
        if !state.is_mobile() {
            self.velocity = Vec2::ZERO;
        }
    }

    /// Consume the one-shot entry flag.
    fn take_entry(&mut self) -> bool {
        std::mem::replace(&mut self.fresh_entry, false)
    }

    fn state_elapsed(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.entered_at) >= self.duration_ms
    }

    fn duration_for(&self, state: AgentState, tuning: &BehaviorTuning) -> u64 {
        let p = &self.profile;
        match state {
            AgentState::Spawn => p.spawn_ms,
            AgentState::Telegraph => p.telegraph_ms,
            AgentState::Attack => p.attack_ms,
            AgentState::Death => p.death_ms,
            AgentState::Cooldown => self
                .ability
                .as_ref()
                .map_or(tuning.cooldown_fallback_ms, |a| a.descriptor().cooldown_ms),
            AgentState::Roam | AgentState::Pursue => 0,
        }
    }

    fn enter(&mut self, state: AgentState, ctx: &AgentContext<'_>) {
        let duration = self.duration_for(state, ctx.tuning);
        self.transition(state, ctx.now_ms, duration);
    }

    /// Nearest player and its distance.
    fn nearest_player(&self, ctx: &AgentContext<'_>) -> Option<(EntityId, Vec2, f32)> {
        ctx.players
            .iter()
            .map(|&(id, pos)| (id, pos, pos.distance(self.position)))
            .min_by(|a, b| a.2.total_cmp(&b.2))
    }

    /// Advance the state machine by one tick.
    pub fn update<R: Rng>(
        &mut self,
        ctx: &AgentContext<'_>,
        rng: &mut R,
    ) -> Option<AgentEvent> {
        if self.expired {
            return None;
        }
        if self.state != AgentState::Death && self.stats.is_dead() {
            self.stats.clamp_hp();
            self.enter(AgentState::Death, ctx);
            return None;
        }

        let mut event = match self.state {
            AgentState::Spawn => {
                if self.state_elapsed(ctx.now_ms) {
                    self.enter(AgentState::Roam, ctx);
                }
                None
            }
            AgentState::Roam => {
                self.roam(ctx, rng);
                None
            }
            AgentState::Pursue => {
                self.pursue(ctx);
                None
            }
            AgentState::Telegraph => {
                if self.state_elapsed(ctx.now_ms) {
                    let strike = self.cast(ctx.now_ms);
                    self.enter(AgentState::Attack, ctx);
                    strike.map(AgentEvent::Strike)
                } else {
                    None
                }
            }
            AgentState::Attack => {
                if self.state_elapsed(ctx.now_ms) {
                    self.enter(AgentState::Cooldown, ctx);
                }
                None
            }
            AgentState::Cooldown => {
                if self.state_elapsed(ctx.now_ms) {
                    self.reengage(ctx);
                }
                None
            }
            AgentState::Death => {
                if self.state_elapsed(ctx.now_ms) {
                    self.expired = true;
                    Some(AgentEvent::Expired(XpAward {
                        agent: self.id,
                        amount: self.profile.xp_drop,
                        origin: self.position,
                        radius: self.profile.award_radius,
                    }))
                } else {
                    None
                }
            }
        };

        if self.take_entry() && self.state == AgentState::Telegraph {
            if let Some(warning) = self.begin_telegraph(ctx) {
                event = Some(AgentEvent::Telegraph(warning));
            }
        }

        if self.state.is_mobile() {
            self.position = ctx.bounds.clamp(self.position + self.velocity * ctx.dt);
        }
        event
    }

    fn roam<R: Rng>(&mut self, ctx: &AgentContext<'_>, rng: &mut R) {
        if let Some((_, _, d)) = self.nearest_player(ctx) {
            if d <= self.profile.pursue_radius {
                self.enter(AgentState::Pursue, ctx);
                self.pursue(ctx);
                return;
            }
        }
        let speed = self.profile.roam_speed;
        if rng.random::<f32>() < ctx.tuning.heading_change_chance {
            self.velocity = Vec2::from_angle(rng.random::<f32>() * TAU) * speed;
        }
        let home = self.spawn_point - self.position;
        if home.length() > ctx.tuning.roam_radius {
            self.velocity = home.normalize_or_zero() * speed;
        }
        self.separate(ctx);
    }

    fn pursue(&mut self, ctx: &AgentContext<'_>) {
        match self.nearest_player(ctx) {
            Some((_, _, d)) if d <= self.profile.telegraph_radius => {
                self.enter(AgentState::Telegraph, ctx);
            }
            Some((_, pos, d)) if d <= self.profile.pursue_radius => {
                let speed = self.profile.roam_speed * ctx.tuning.pursue_multiplier;
                self.velocity = (pos - self.position).normalize_or_zero() * speed;
                self.separate(ctx);
            }
            _ => self.enter(AgentState::Roam, ctx),
        }
    }

    fn reengage(&mut self, ctx: &AgentContext<'_>) {
        let next = match self.nearest_player(ctx) {
            Some((_, _, d)) if d <= self.profile.telegraph_radius => AgentState::Telegraph,
            Some((_, _, d)) if d <= self.profile.pursue_radius => AgentState::Pursue,
            _ => AgentState::Roam,
        };
        self.enter(next, ctx);
    }

    /// Layer repulsion onto the current velocity and cap the speed.
    fn separate(&mut self, ctx: &AgentContext<'_>) {
        let t = ctx.tuning;
        self.velocity += ctx.separation.repulsion(
            self.id,
            self.position,
            t.min_separation,
            t.separation_strength,
        );
        self.velocity = self
            .velocity
            .clamp_length_max(self.profile.roam_speed * t.speed_clamp);
    }

    /// Lock a ranged ability onto the nearest target in range.
    fn begin_telegraph(&mut self, ctx: &AgentContext<'_>) -> Option<TelegraphWarning> {
        let agent_id = self.entity_id();
        let origin = self.position;
        let duration_ms = self.duration_ms;
        let inst = self.ability.as_mut()?;
        let d = inst.descriptor();
        let Delivery::Ranged { range } = d.delivery else {
            return None;
        };
        let (ability, radius, filter) = (d.name, d.radius, d.targets);
        let Some(impact) = acquire_target(origin, range, filter, agent_id, ctx.players.iter().copied())
        else {
            debug!(agent = %self.id, "no target in range for telegraph");
            return None;
        };
        inst.set_impact(impact);
        Some(TelegraphWarning {
            agent_id,
            target_id: impact.target,
            ability,
            impact_x: impact.point.x,
            impact_y: impact.point.y,
            radius,
            duration_ms,
        })
    }

    fn cast(&mut self, now_ms: u64) -> Option<Strike> {
        let mut inst = self.ability.take()?;
        let result = prepare(self, &mut inst, now_ms);
        if result.is_err() {
            inst.clear_impact();
        }
        self.ability = Some(inst);
        result.ok()
    }

    /// Outbound view for clients.
    pub fn snapshot(&self, now_ms: u64) -> AgentSnapshot {
        AgentSnapshot {
            id: self.entity_id(),
            zone_id: self.zone,
            x: self.position.x,
            y: self.position.y,
            hp: self.stats.hp.max(0),
            max_hp: self.stats.max_hp,
            profile: self.profile.name.clone(),
            state: self.state.name(),
            timestamp: now_ms,
        }
    }
}

impl Combatant for HostileAgent {
    fn entity_id(&self) -> EntityId {
        EntityId::Agent(self.id)
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
        self.profile.sprite_height
    }

    fn collision_radius(&self) -> f32 {
        self.profile.sprite_height / 2.0 * 1.2
    }

    fn is_targetable(&self) -> bool {
        self.state != AgentState::Death && !self.stats.is_dead()
    }
}
