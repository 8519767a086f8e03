//! A zone and its fixed six-step tick.
//!
//! A [`Zone`] exclusively owns the players and hostile agents inside
//! one square of the world. [`Zone::tick`] runs, in order:
//!
//! 1. drain the inbox and apply inputs (action-key casts resolve here),
//! 2. move players, rolling back moves into void and raising migration
//!    requests for moves into a neighbour,
//! 3. run base-attack timers,
//! 4. advance agents, land their strikes, award XP for completed deaths
//!    and top up the population,
//! 5. publish this zone's snapshot and assemble each player's view of
//!    its active zone set,
//! 6. flush one batch per player and drop players whose transport
//!    failed.
//!
//! The zone never touches another zone. Moving a player between zones
//! is done by the coordinator between ticks, from the
//! [`MigrationRequest`]s in the [`TickReport`].

use crate::board::{SnapshotBoard, ZoneSnapshot};
use crate::config::ConfigError;
use crate::inbox::{Inbox, InboxSender, ZoneInput};
use crate::metrics::TickMetrics;
use crate::player::{AbilitySlot, Player};
use crate::rules::Rules;
use fray_agents::{
    AgentContext, AgentEvent, AgentProfile, AgentState, HostileAgent, SeparationGrid, XpAward,
};
use fray_combat::Strike;
use fray_core::{
    ActiveZones, AgentId, Combatant, EntityId, LevelUp, PlayerDeath, PlayerId, ServerMessage,
    TickId, Vec2, ZoneId,
};
use fray_space::ZoneBounds;
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A player that crossed into another zone and must be handed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MigrationRequest {
    /// The migrating player.
    pub player: PlayerId,
    /// Current owner.
    pub from: ZoneId,
    /// New owner.
    pub to: ZoneId,
}

/// What a tick needs the coordinator to act on.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Zone that ticked.
    pub zone: ZoneId,
    /// Tick number within that zone.
    pub tick: TickId,
    /// Players to hand over to a neighbour.
    pub migrations: Vec<MigrationRequest>,
    /// Players removed after a transport failure.
    pub dropped: Vec<PlayerId>,
    /// Inputs for players this zone no longer owns.
    pub misrouted: Vec<ZoneInput>,
    /// XP awards whose circle reaches past this zone's edge. Players
    /// here are already paid; neighbours still need to be.
    pub awards: Vec<XpAward>,
    /// Counters for this tick.
    pub metrics: TickMetrics,
}

#[derive(Debug)]
struct Population {
    profile: Arc<AgentProfile>,
    target: usize,
    interval_ms: u64,
    last_ms: u64,
}

/// One independently simulated region.
pub struct Zone {
    id: ZoneId,
    bounds: ZoneBounds,
    rules: Arc<Rules>,
    players: IndexMap<PlayerId, Player>,
    agents: IndexMap<AgentId, HostileAgent>,
    inbox: Inbox,
    rng: ChaCha8Rng,
    population: Vec<Population>,
    tick: TickId,
    last_tick_ms: Option<u64>,
    now_ms: u64,
}

impl Zone {
    /// Build zone `id` and spawn its initial population.
    pub fn new(id: ZoneId, rules: Arc<Rules>) -> Result<Self, ConfigError> {
        let bounds = rules
            .topology
            .bounds(id)
            .ok_or(ConfigError::UnknownZone { zone: id })?;
        let mut population = Vec::new();
        for entry in rules.population.iter().filter(|e| e.applies_to(id)) {
            let profile = rules
                .profiles
                .get(&entry.profile)
                .ok_or_else(|| ConfigError::UnknownProfile {
                    profile: entry.profile.clone(),
                })?;
            population.push(Population {
                profile: Arc::clone(profile),
                target: entry.count,
                interval_ms: entry.respawn_interval_ms,
                last_ms: 0,
            });
        }
        let mut zone = Self {
            id,
            bounds,
            inbox: Inbox::new(id, rules.inbox_capacity),
            rng: ChaCha8Rng::seed_from_u64(rules.zone_seed(id)),
            rules,
            players: IndexMap::new(),
            agents: IndexMap::new(),
            population,
            tick: TickId(0),
            last_tick_ms: None,
            now_ms: 0,
        };
        let spawned = zone.top_up(0, true);
        debug!(zone = %id, agents = spawned, "zone populated");
        Ok(zone)
    }

    /// Zone id.
    pub fn id(&self) -> ZoneId {
        self.id
    }

    /// The zone's rectangle in world space.
    pub fn bounds(&self) -> ZoneBounds {
        self.bounds
    }

    /// Where players spawn in this zone.
    pub fn spawn_point(&self) -> Vec2 {
        self.bounds.centre()
    }

    /// Ticks completed so far.
    pub fn tick_id(&self) -> TickId {
        self.tick
    }

    /// Clock of the last tick.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// A producer handle for this zone's inbox.
    pub fn inbox_sender(&self) -> InboxSender {
        self.inbox.sender()
    }

    /// Inputs waiting for the next tick.
    pub fn queued_inputs(&self) -> usize {
        self.inbox.len()
    }

    /// An owned player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// An owned player, mutably.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    /// Owned players in admission order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// An owned agent.
    pub fn agent(&self, id: AgentId) -> Option<&HostileAgent> {
        self.agents.get(&id)
    }

    /// An owned agent, mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut HostileAgent> {
        self.agents.get_mut(&id)
    }

    /// Owned agents in spawn order.
    pub fn agents(&self) -> impl Iterator<Item = &HostileAgent> {
        self.agents.values()
    }

    /// Number of owned players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of owned agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Spawn one agent of `profile` at `position`, clamped into the
    /// zone. Returns `None` for an unknown profile.
    pub fn spawn_agent(&mut self, profile: &str, position: Vec2) -> Option<AgentId> {
        let profile = Arc::clone(self.rules.profiles.get(profile)?);
        let position = self.bounds.clamp(position);
        Some(self.place_agent(profile, position, self.now_ms))
    }

    pub(crate) fn admit(&mut self, mut player: Player) {
        player.set_zone(self.id);
        player.set_migrating(false);
        self.players.insert(player.id(), player);
    }

    pub(crate) fn evict(&mut self, id: PlayerId) -> Option<Player> {
        self.players.shift_remove(&id)
    }

    /// Run one tick at zone clock `now_ms`.
    ///
    /// `board` supplies neighbour snapshots and receives this zone's.
    pub fn tick(&mut self, now_ms: u64, board: &SnapshotBoard) -> TickReport {
        let started = Instant::now();
        let dt_ms = self
            .last_tick_ms
            .map_or(self.rules.tick_interval_ms, |t| now_ms.saturating_sub(t));
        let dt = dt_ms as f32 / 1000.0;
        self.last_tick_ms = Some(now_ms);
        self.now_ms = now_ms;
        self.tick = TickId(self.tick.0 + 1);

        let mut report = TickReport {
            zone: self.id,
            tick: self.tick,
            ..Default::default()
        };

        // 1. Inputs.
        self.drain_inbox(now_ms, &mut report);
        report.metrics.input_us = started.elapsed().as_micros() as u64;

        // 2. Movement.
        self.move_players(dt, now_ms, &mut report);

        // 3. Base attacks.
        self.base_attacks(dt_ms, now_ms, &mut report);

        // 4. Agents.
        let agents_start = Instant::now();
        self.advance_agents(dt, now_ms, &mut report);
        report.metrics.agents_spawned += self.top_up(now_ms, false);
        self.reap_players();
        report.metrics.agents_us = agents_start.elapsed().as_micros() as u64;

        // 5 + 6. Snapshots and flush.
        let publish_start = Instant::now();
        self.publish(now_ms, board);
        self.flush(&mut report);
        report.metrics.publish_us = publish_start.elapsed().as_micros() as u64;

        report.metrics.players = self.players.len() as u32;
        report.metrics.agents = self.agents.len() as u32;
        report.metrics.total_us = started.elapsed().as_micros() as u64;
        report
    }

    fn drain_inbox(&mut self, now_ms: u64, report: &mut TickReport) {
        let inputs: Vec<ZoneInput> = self.inbox.drain().collect();
        for queued in inputs {
            let Some(player) = self.players.get_mut(&queued.player) else {
                report.metrics.inputs_misrouted += 1;
                report.misrouted.push(queued);
                continue;
            };
            report.metrics.inputs_applied += 1;
            if !player.apply_input(queued.input) {
                continue;
            }
            if let Some(strike) = player.cast(AbilitySlot::Action, now_ms) {
                self.land(&strike, report);
            }
        }
    }

    fn move_players(&mut self, dt: f32, now_ms: u64, report: &mut TickReport) {
        let zone = self.id;
        let topology = &self.rules.topology;
        for player in self.players.values_mut() {
            player.regen_ap(dt);
            if !player.can_move() {
                continue;
            }
            let next = player.projected(dt);
            match topology.resolve(zone, next) {
                None => {
                    report.metrics.moves_rejected += 1;
                    debug!(%zone, player = %player.id(), x = next.x, y = next.y, "move rejected");
                }
                Some(owner) if owner == zone => player.set_position(next),
                Some(owner) => {
                    // Settle frame at the old position, stamped by this zone.
                    let settle = player.snapshot(now_ms);
                    player.push(ServerMessage::PlayerUpdate(settle));
                    player.set_position(next);
                    player.set_migrating(true);
                    report.metrics.migrations_requested += 1;
                    report.migrations.push(MigrationRequest {
                        player: player.id(),
                        from: zone,
                        to: owner,
                    });
                }
            }
        }
    }

    fn base_attacks(&mut self, dt_ms: u64, now_ms: u64, report: &mut TickReport) {
        let viewport = self.rules.viewport;
        let visible: Vec<Vec2> = self
            .agents
            .values()
            .filter(|a| a.is_targetable())
            .map(|a| a.position())
            .collect();
        let mut strikes = Vec::new();
        for player in self.players.values_mut() {
            if !player.tick_base_timer(dt_ms) {
                continue;
            }
            let at = player.position();
            if !visible.iter().any(|&a| viewport.contains(at, a)) {
                continue;
            }
            player.reset_base_timer();
            if let Some(strike) = player.cast(AbilitySlot::Base, now_ms) {
                strikes.push(strike);
            }
        }
        for strike in &strikes {
            self.land(strike, report);
        }
    }

    fn advance_agents(&mut self, dt: f32, now_ms: u64, report: &mut TickReport) {
        let rules = Arc::clone(&self.rules);
        let players: Vec<(EntityId, Vec2)> = self
            .players
            .values()
            .filter(|p| p.is_targetable())
            .map(|p| (p.entity_id(), p.position()))
            .collect();
        let grid = SeparationGrid::build(
            rules.tuning.separation_bucket,
            self.agents
                .values()
                .filter(|a| a.state() != AgentState::Death)
                .map(|a| (a.id(), a.position())),
        );
        let ctx = AgentContext {
            now_ms,
            dt,
            players: &players,
            separation: &grid,
            bounds: self.bounds,
            tuning: &rules.tuning,
        };

        let mut events = Vec::new();
        for agent in self.agents.values_mut() {
            if let Some(event) = agent.update(&ctx, &mut self.rng) {
                events.push(event);
            }
        }

        for event in events {
            match event {
                AgentEvent::Telegraph(warning) => {
                    self.broadcast(ServerMessage::TelegraphWarning(warning));
                }
                AgentEvent::Strike(strike) => self.land(&strike, report),
                AgentEvent::Expired(award) => {
                    self.award_xp(&award);
                    if !self.bounds.encloses(award.origin, award.radius) {
                        report.awards.push(award);
                    }
                }
            }
        }

        let before = self.agents.len();
        self.agents.retain(|_, a| !a.is_expired());
        report.metrics.agents_expired += (before - self.agents.len()) as u32;
    }

    /// Apply a committed strike to everything in the zone and broadcast
    /// its effect.
    fn land(&mut self, strike: &Strike, report: &mut TickReport) {
        let targets = self
            .players
            .values_mut()
            .map(|p| p as &mut dyn Combatant)
            .chain(self.agents.values_mut().map(|a| a as &mut dyn Combatant));
        let outcome = strike.apply(targets);
        for victim in &outcome.kills {
            debug!(zone = %self.id, %victim, caster = %strike.caster, ability = %strike.ability, "killed");
        }
        report.metrics.strikes += 1;
        self.broadcast(ServerMessage::AbilityEffect(outcome.effect));
    }

    /// Pay `award` to every living player of this zone inside its
    /// circle.
    pub(crate) fn award_xp(&mut self, award: &XpAward) {
        let progression = Arc::clone(&self.rules.progression);
        let mut rewarded = 0;
        for player in self.players.values_mut() {
            if player.is_dead() || player.position().distance(award.origin) > award.radius {
                continue;
            }
            rewarded += 1;
            let (state, stats) = player.progression_mut();
            let outcome = progression.add_xp(state, stats, award.amount);
            if !outcome.leveled_up() {
                continue;
            }
            let msg = LevelUp {
                new_level: state.level,
                new_attack: stats.attack_power,
                xp_on_level: state.xp_on_level,
                xp_for_next: state.xp_for_next,
            };
            info!(zone = %self.id, player = %player.id(), level = msg.new_level, "level up");
            player.push(ServerMessage::LevelUp(msg));
        }
        debug!(zone = %self.id, agent = %award.agent, amount = award.amount, rewarded, "xp awarded");
    }

    /// Keep each population at its target. Unless `force`d, an entry is
    /// only topped up once its respawn interval has passed.
    fn top_up(&mut self, now_ms: u64, force: bool) -> u32 {
        let mut spawned = 0;
        for i in 0..self.population.len() {
            let (profile, target) = {
                let entry = &mut self.population[i];
                if !force && now_ms.saturating_sub(entry.last_ms) < entry.interval_ms {
                    continue;
                }
                entry.last_ms = now_ms;
                (Arc::clone(&entry.profile), entry.target)
            };
            let alive = self
                .agents
                .values()
                .filter(|a| a.profile().name == profile.name && a.state() != AgentState::Death)
                .count();
            for _ in alive..target {
                let at = self.random_point();
                self.place_agent(Arc::clone(&profile), at, now_ms);
                spawned += 1;
            }
        }
        spawned
    }

    fn random_point(&mut self) -> Vec2 {
        let b = self.bounds;
        Vec2::new(
            self.rng.random_range(b.min.x..b.max.x),
            self.rng.random_range(b.min.y..b.max.y),
        )
    }

    fn place_agent(&mut self, profile: Arc<AgentProfile>, at: Vec2, now_ms: u64) -> AgentId {
        let agent = HostileAgent::spawn(self.id, profile, at, &self.rules.abilities, now_ms);
        let id = agent.id();
        self.agents.insert(id, agent);
        id
    }

    fn reap_players(&mut self) {
        for player in self.players.values_mut() {
            if !player.stats().is_dead() || !player.mark_dead() {
                continue;
            }
            let progress = *player.progression();
            info!(zone = %self.id, player = %player.id(), level = progress.level, "player died");
            player.push(ServerMessage::PlayerDeath(PlayerDeath {
                player_id: player.id(),
                level: progress.level,
                xp: progress.xp,
            }));
        }
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        for player in self.players.values_mut() {
            player.push(msg.clone());
        }
    }

    fn publish(&mut self, now_ms: u64, board: &SnapshotBoard) {
        let own = Arc::new(ZoneSnapshot {
            zone: self.id,
            tick: self.tick,
            timestamp: now_ms,
            players: self
                .players
                .values()
                .filter(|p| !p.is_disconnected())
                .map(|p| p.snapshot(now_ms))
                .collect(),
            agents: self.agents.values().map(|a| a.snapshot(now_ms)).collect(),
        });

        let mut neighbours: IndexMap<ZoneId, Option<Arc<ZoneSnapshot>>> = IndexMap::new();
        let topology = &self.rules.topology;
        for player in self.players.values_mut() {
            if player.is_disconnected() {
                continue;
            }
            let zones = topology.active_zone_set(self.id, player.position());
            let mut seen: HashSet<PlayerId> = HashSet::new();
            let mut players = Vec::new();
            let mut agents = Vec::new();
            for &zone in &zones {
                let snap = if zone == self.id {
                    Some(Arc::clone(&own))
                } else {
                    neighbours
                        .entry(zone)
                        .or_insert_with(|| board.latest(zone))
                        .clone()
                };
                let Some(snap) = snap else { continue };
                players.extend(
                    snap.players
                        .iter()
                        .filter(|s| seen.insert(s.id))
                        .cloned(),
                );
                agents.extend(snap.agents.iter().cloned());
            }
            player.push(ServerMessage::ActiveZones(ActiveZones {
                current_zone: self.id,
                zones,
            }));
            player.push(ServerMessage::PlayerUpdates(players));
            player.push(ServerMessage::EnemyUpdates(agents));
        }

        board.publish(Arc::unwrap_or_clone(own));
    }

    fn flush(&mut self, report: &mut TickReport) {
        for player in self.players.values_mut() {
            if let Err(error) = player.flush() {
                warn!(zone = %self.id, player = %player.id(), %error, "transport failed, dropping player");
                player.disconnect();
            }
        }
        let mut dropped = Vec::new();
        self.players.retain(|id, p| {
            if p.is_disconnected() {
                dropped.push(*id);
                false
            } else {
                true
            }
        });
        report.metrics.players_dropped = dropped.len() as u32;
        report.dropped = dropped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PopulationEntry, ServerConfig};
    use crate::sink::{ClientSink, TransportError};
    use fray_core::{AgentId, CharacterClass, InputState, MoveKeys};
    use fray_space::WorldTopology;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<Vec<ServerMessage>>>>);

    impl ClientSink for Shared {
        fn send_batch(&mut self, batch: &[ServerMessage]) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    impl Shared {
        fn last(&self) -> Vec<ServerMessage> {
            self.0.lock().unwrap().last().cloned().unwrap_or_default()
        }

        fn all(&self) -> Vec<ServerMessage> {
            self.0.lock().unwrap().iter().flatten().cloned().collect()
        }
    }

    fn rules(config: ServerConfig) -> Arc<Rules> {
        let topology = WorldTopology::new(
            vec![
                vec![ZoneId(1), ZoneId(2)],
                vec![ZoneId(3), ZoneId::VOID],
            ],
            1000.0,
        )
        .unwrap();
        Arc::new(Rules::new(config, topology).unwrap())
    }

    fn zone_with_player(config: ServerConfig, at: Vec2) -> (Zone, PlayerId, Shared, SnapshotBoard) {
        let rules = rules(config);
        let board = SnapshotBoard::new(rules.topology.zone_ids());
        let mut zone = Zone::new(ZoneId(1), rules).unwrap();
        let sink = Shared::default();
        let id = PlayerId::next();
        let player =
            zone.rules
                .new_player(id, ZoneId(1), CharacterClass::Guardian, at, Box::new(sink.clone()));
        zone.admit(player);
        (zone, id, sink, board)
    }

    fn send(zone: &Zone, player: PlayerId, bits: u8, action: bool) {
        zone.inbox_sender()
            .submit(ZoneInput {
                player,
                input: InputState {
                    movement: MoveKeys::from_bits(bits),
                    action,
                },
            })
            .unwrap();
    }

    #[test]
    fn initial_population_is_spawned() {
        let config = ServerConfig {
            population: vec![
                PopulationEntry::everywhere("easy", 4),
                PopulationEntry {
                    zone: Some(ZoneId(2)),
                    ..PopulationEntry::everywhere("hard", 2)
                },
            ],
            ..Default::default()
        };
        let rules = rules(config);
        let one = Zone::new(ZoneId(1), Arc::clone(&rules)).unwrap();
        let two = Zone::new(ZoneId(2), rules).unwrap();
        assert_eq!(one.agent_count(), 4);
        assert_eq!(two.agent_count(), 6);
        assert!(one.agents().all(|a| one.bounds().contains(a.position())));
    }

    #[test]
    fn unknown_zone_is_rejected() {
        assert!(matches!(
            Zone::new(ZoneId(9), rules(ServerConfig::default())),
            Err(ConfigError::UnknownZone { .. })
        ));
    }

    #[test]
    fn tick_batches_zone_set_and_snapshots() {
        let (mut zone, id, sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(900.0, 900.0));
        zone.tick(100, &board);
        let batch = sink.last();
        let types: Vec<&str> = batch.iter().map(ServerMessage::type_name).collect();
        assert_eq!(types, vec!["activeZones", "playerUpdates", "enemyUpdates"]);
        let ServerMessage::ActiveZones(set) = &batch[0] else {
            panic!("expected activeZones");
        };
        // Bottom-right quadrant of zone 1: east is 2, south is 3, diagonal is void.
        assert_eq!(set.zones.as_slice(), &[ZoneId(1), ZoneId(2), ZoneId(3)]);
        let ServerMessage::PlayerUpdates(players) = &batch[1] else {
            panic!("expected playerUpdates");
        };
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, id);
        assert_eq!(players[0].timestamp, 100);
        assert_eq!(board.latest(ZoneId(1)).unwrap().players.len(), 1);
    }

    #[test]
    fn input_moves_player_next_tick() {
        let (mut zone, id, _sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(500.0, 500.0));
        send(&zone, id, MoveKeys::RIGHT, false);
        let report = zone.tick(100, &board);
        assert_eq!(report.metrics.inputs_applied, 1);
        let p = zone.player(id).unwrap();
        assert!((p.position().x - 516.0).abs() < 1e-3);
    }

    #[test]
    fn move_into_void_is_rolled_back() {
        let (mut zone, id, _sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(500.0, 995.0));
        zone.player_mut(id).unwrap().set_position(Vec2::new(1500.0, 995.0));
        // Zone 1 owns the player but the position sits in zone 2's square;
        // moving down enters the void cell at (1, 1).
        send(&zone, id, MoveKeys::DOWN, false);
        let report = zone.tick(100, &board);
        assert_eq!(report.metrics.moves_rejected, 1);
        assert!(report.migrations.is_empty());
        assert_eq!(zone.player(id).unwrap().position(), Vec2::new(1500.0, 995.0));
    }

    #[test]
    fn crossing_an_edge_requests_migration_with_settle_frame() {
        let (mut zone, id, sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(995.0, 500.0));
        send(&zone, id, MoveKeys::RIGHT, false);
        let report = zone.tick(100, &board);
        assert_eq!(
            report.migrations,
            vec![MigrationRequest {
                player: id,
                from: ZoneId(1),
                to: ZoneId(2)
            }]
        );
        let batch = sink.last();
        let ServerMessage::PlayerUpdate(settle) = &batch[0] else {
            panic!("expected settle frame first");
        };
        assert_eq!(settle.zone_id, ZoneId(1));
        assert_eq!(settle.x, 995.0);
        let p = zone.player(id).unwrap();
        assert!(p.is_migrating());
        // A pending player does not move again.
        let report = zone.tick(200, &board);
        assert!(report.migrations.is_empty());
        assert!((zone.player(id).unwrap().position().x - 1011.0).abs() < 1e-3);
    }

    #[test]
    fn action_key_casts_sweep_and_broadcasts_effect() {
        let (mut zone, id, sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(500.0, 500.0));
        let agent = zone.spawn_agent("easy", Vec2::new(560.0, 500.0)).unwrap();
        send(&zone, id, 0, true);
        zone.tick(100, &board);
        let hp = zone.agent(agent).unwrap().stats().hp;
        assert_eq!(hp, 50 - 30);
        assert_eq!(zone.player(id).unwrap().stats().ap, 100 - 20);
        let effects = sink
            .all()
            .into_iter()
            .filter(|m| m.type_name() == "abilityEffect")
            .count();
        assert_eq!(effects, 1);
    }

    #[test]
    fn base_attack_waits_for_visible_agent() {
        let (mut zone, id, _sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(100.0, 100.0));
        for t in 1..=12 {
            zone.tick(t * 100, &board);
        }
        assert!(zone.player(id).unwrap().ability(AbilitySlot::Base).unwrap().last_used().is_none());
        let agent = zone.spawn_agent("hard", Vec2::new(140.0, 100.0)).unwrap();
        zone.tick(1300, &board);
        assert_eq!(
            zone.player(id).unwrap().ability(AbilitySlot::Base).unwrap().last_used(),
            Some(1300)
        );
        assert_eq!(zone.agent(agent).unwrap().stats().hp, 200 - 15);
    }

    #[test]
    fn killed_player_gets_one_death_message() {
        let (mut zone, id, sink, board) =
            zone_with_player(ServerConfig::default(), Vec2::new(500.0, 500.0));
        zone.player_mut(id).unwrap().stats_mut().apply_damage(10_000);
        zone.tick(100, &board);
        zone.tick(200, &board);
        let deaths = sink
            .all()
            .into_iter()
            .filter(|m| m.type_name() == "playerDeath")
            .count();
        assert_eq!(deaths, 1);
        let p = zone.player(id).unwrap();
        assert!(p.is_dead());
        assert_eq!(p.stats().hp, 0);
        assert_eq!(board.latest(ZoneId(1)).unwrap().players[0].hp, 0);
    }

    #[test]
    fn expired_agents_are_removed_and_respawned() {
        let config = ServerConfig {
            population: vec![PopulationEntry {
                respawn_interval_ms: 500,
                ..PopulationEntry::everywhere("easy", 1)
            }],
            ..Default::default()
        };
        let (mut zone, _id, _sink, board) = zone_with_player(config, Vec2::new(10.0, 10.0));
        let first: AgentId = zone.agents().next().unwrap().id();
        zone.agent_mut(first).unwrap().stats_mut().apply_damage(1000);
        let mut gone_at = None;
        for t in 1..=20u64 {
            let report = zone.tick(t * 100, &board);
            if report.metrics.agents_expired > 0 {
                gone_at = Some(t);
            }
        }
        assert_eq!(gone_at, Some(11));
        assert!(zone.agent(first).is_none());
        assert_eq!(zone.agent_count(), 1);
    }
}
