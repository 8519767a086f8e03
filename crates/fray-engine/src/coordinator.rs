//! Zone ownership, routing and migration.
//!
//! The [`Coordinator`] owns every [`Zone`] and the player directory. It
//! is the only code that touches two zones at once: a migration removes
//! the player from one zone and inserts it into the other while holding
//! both zone locks, so no tick can observe the player in zero or two
//! zones.
//!
//! # Lock order
//!
//! Zone locks are taken in ascending [`ZoneId`] order, then the
//! directory. Snapshot-board slots are only locked from inside a zone
//! tick and are always innermost.

use crate::board::SnapshotBoard;
use crate::config::ConfigError;
use crate::inbox::{InboxSender, SubmitError, ZoneInput};
use crate::player::Player;
use crate::rules::Rules;
use crate::sink::ClientSink;
use crate::zone::{MigrationRequest, TickReport, Zone};
use fray_agents::XpAward;
use fray_core::{
    CharacterSelection, ClientMessage, PlayerId, PlayerRespawn, ServerMessage, Vec2, Welcome,
    ZoneId,
};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

// Shared between zone threads and the migrator in realtime mode.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Coordinator>();
};

/// How many times [`Coordinator::disconnect`] chases a player that is
/// migrating under it.
const DISCONNECT_ATTEMPTS: usize = 3;

struct ZoneSlot {
    zone: Mutex<Zone>,
    inbox: InboxSender,
}

impl ZoneSlot {
    fn lock(&self) -> MutexGuard<'_, Zone> {
        self.zone.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the zones, the player directory and the snapshot board.
pub struct Coordinator {
    rules: Arc<Rules>,
    zones: IndexMap<ZoneId, ZoneSlot>,
    board: Arc<SnapshotBoard>,
    directory: RwLock<HashMap<PlayerId, ZoneId>>,
    closed: AtomicBool,
}

impl Coordinator {
    /// Build one zone per topology cell and populate them.
    pub fn new(rules: Rules) -> Result<Self, ConfigError> {
        let rules = Arc::new(rules);
        let mut zones = IndexMap::new();
        for id in rules.topology.zone_ids() {
            let zone = Zone::new(id, Arc::clone(&rules))?;
            let inbox = zone.inbox_sender();
            zones.insert(
                id,
                ZoneSlot {
                    zone: Mutex::new(zone),
                    inbox,
                },
            );
        }
        let board = Arc::new(SnapshotBoard::new(zones.keys().copied()));
        info!(
            zones = zones.len(),
            spawn_zone = %rules.spawn_zone,
            tick_ms = rules.tick_interval_ms,
            "coordinator ready"
        );
        Ok(Self {
            rules,
            zones,
            board,
            directory: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Shared world rules.
    pub fn rules(&self) -> &Arc<Rules> {
        &self.rules
    }

    /// Latest published snapshot per zone.
    pub fn board(&self) -> &Arc<SnapshotBoard> {
        &self.board
    }

    /// Zone ids in topology order.
    pub fn zone_ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.keys().copied()
    }

    /// Number of zones.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Run `f` with exclusive access to zone `id`.
    ///
    /// Blocks while that zone is ticking.
    pub fn with_zone<R>(&self, id: ZoneId, f: impl FnOnce(&mut Zone) -> R) -> Option<R> {
        let slot = self.zones.get(&id)?;
        let mut zone = slot.lock();
        Some(f(&mut zone))
    }

    /// Zone that owns `player` according to the directory.
    pub fn player_zone(&self, player: PlayerId) -> Option<ZoneId> {
        self.directory_read().get(&player).copied()
    }

    /// Number of connected players.
    pub fn player_count(&self) -> usize {
        self.directory_read().len()
    }

    /// Every zone whose collection holds `player`.
    ///
    /// Locks each zone in turn; a diagnostic that should always return
    /// zero or one zone.
    pub fn owners(&self, player: PlayerId) -> SmallVec<[ZoneId; 2]> {
        self.zones
            .iter()
            .filter(|(_, slot)| slot.lock().player(player).is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Refuse new players, inputs and respawns from now on.
    ///
    /// Players already connected stay inspectable and can still be
    /// disconnected.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("coordinator closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), SubmitError> {
        if self.is_closed() {
            return Err(SubmitError::ShutDown);
        }
        Ok(())
    }

    fn slot(&self, zone: ZoneId) -> Result<&ZoneSlot, SubmitError> {
        self.zones
            .get(&zone)
            .ok_or(SubmitError::UnknownZone { zone })
    }

    fn directory_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<PlayerId, ZoneId>> {
        self.directory.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn directory_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, ZoneId>> {
        self.directory.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Connections ──────────────────────────────────────────────

    /// Admit a new player of the selected class at the spawn point.
    ///
    /// The player's first batch starts with a `welcome` message.
    pub fn spawn(
        &self,
        selection: CharacterSelection,
        sink: Box<dyn ClientSink>,
    ) -> Result<PlayerId, SubmitError> {
        self.ensure_open()?;
        let zone_id = self.rules.spawn_zone;
        let slot = self.slot(zone_id)?;
        let id = PlayerId::next();
        let mut zone = slot.lock();
        let at = zone.spawn_point();
        let mut player = self.rules.new_player(id, zone_id, selection.class, at, sink);
        player.push(ServerMessage::Welcome(Welcome {
            player_id: id,
            zone_id,
            class: selection.class,
        }));
        zone.admit(player);
        self.directory_write().insert(id, zone_id);
        drop(zone);
        info!(player = %id, zone = %zone_id, class = ?selection.class, "player spawned");
        Ok(id)
    }

    /// Handle one decoded client message from `player`.
    pub fn submit(&self, player: PlayerId, msg: ClientMessage) -> Result<(), SubmitError> {
        match msg {
            ClientMessage::Input(input) => self.route(ZoneInput { player, input }),
            ClientMessage::SpawnPlayerCharacter(_) | ClientMessage::SelectCharacter(_) => {
                self.respawn(player).map(|_| ())
            }
        }
    }

    /// Decode and handle a raw envelope. Malformed messages are logged
    /// and rejected without touching any zone.
    pub fn submit_raw(&self, player: PlayerId, raw: &str) -> Result<(), SubmitError> {
        let msg = ClientMessage::parse(raw).map_err(|error| {
            warn!(player = %player, %error, "malformed client message");
            SubmitError::from(error)
        })?;
        self.submit(player, msg)
    }

    /// Queue `input` on the inbox of the zone that owns its player.
    pub fn route(&self, input: ZoneInput) -> Result<(), SubmitError> {
        self.ensure_open()?;
        let zone = self
            .player_zone(input.player)
            .ok_or(SubmitError::UnknownPlayer {
                player: input.player,
            })?;
        self.slot(zone)?.inbox.submit(input)
    }

    /// Bring a dead player back at the spawn point, keeping class and
    /// progression. Returns `Ok(false)` if the player is alive.
    pub fn respawn(&self, player: PlayerId) -> Result<bool, SubmitError> {
        self.ensure_open()?;
        let from = self
            .player_zone(player)
            .ok_or(SubmitError::UnknownPlayer { player })?;
        let to = self.rules.spawn_zone;
        let at = self
            .spawn_point(to)
            .ok_or(SubmitError::UnknownZone { zone: to })?;
        let revived = self.transfer(player, from, to, |p| {
            if !p.is_dead() {
                return false;
            }
            p.revive(to, at);
            p.push(ServerMessage::PlayerRespawn(PlayerRespawn {
                player_id: player,
                zone_id: to,
                x: at.x,
                y: at.y,
            }));
            true
        })?;
        if revived {
            info!(player = %player, zone = %to, "player respawned");
        } else {
            debug!(player = %player, "respawn ignored, player alive");
        }
        Ok(revived)
    }

    /// Remove `player` and close its transport. Returns whether a
    /// player was removed.
    pub fn disconnect(&self, player: PlayerId) -> bool {
        for _ in 0..DISCONNECT_ATTEMPTS {
            let Some(zone_id) = self.player_zone(player) else {
                return false;
            };
            let Ok(slot) = self.slot(zone_id) else {
                return false;
            };
            let mut zone = slot.lock();
            if let Some(mut removed) = zone.evict(player) {
                removed.disconnect();
                self.directory_write().remove(&player);
                info!(player = %player, zone = %zone_id, "player disconnected");
                return true;
            }
            // Migrated between the lookup and the lock.
        }
        warn!(player = %player, "disconnect gave up chasing a migrating player");
        false
    }

    // ── Ticks and migration ──────────────────────────────────────

    /// Tick one zone at `now_ms`.
    pub fn tick_zone(&self, zone: ZoneId, now_ms: u64) -> Option<TickReport> {
        let slot = self.zones.get(&zone)?;
        let mut zone = slot.lock();
        Some(zone.tick(now_ms, &self.board))
    }

    /// Act on a finished tick: forget dropped players, pay XP awards
    /// that reach into neighbouring zones, hand over migrating players
    /// and re-route stray inputs.
    ///
    /// Awards are paid before migrations so a player leaving the
    /// awarding zone this tick, already paid there, is not paid twice.
    ///
    /// Returns the migrations that were carried out.
    pub fn apply_report(&self, report: &TickReport) -> Vec<MigrationRequest> {
        if !report.dropped.is_empty() {
            let mut directory = self.directory_write();
            for id in &report.dropped {
                if directory.get(id) == Some(&report.zone) {
                    directory.remove(id);
                }
                info!(player = %id, zone = %report.zone, "player dropped");
            }
        }

        for award in &report.awards {
            self.award_neighbours(report.zone, award);
        }

        let applied: Vec<MigrationRequest> = report
            .migrations
            .iter()
            .copied()
            .filter(|req| self.apply_migration(*req))
            .collect();

        for input in &report.misrouted {
            if let Err(error) = self.route(*input) {
                debug!(player = %input.player, %error, "stray input discarded");
            }
        }
        applied
    }

    fn award_neighbours(&self, origin: ZoneId, award: &XpAward) {
        let Some(neighbours) = self.rules.topology.neighbors(origin) else {
            return;
        };
        for &zone in neighbours.iter().filter(|z| !z.is_void()) {
            self.with_zone(zone, |z| z.award_xp(award));
        }
    }

    /// Move the player named by `req` from `req.from` to `req.to`.
    ///
    /// Stale requests (the player already left `req.from`) are ignored.
    pub fn apply_migration(&self, req: MigrationRequest) -> bool {
        match self.transfer(req.player, req.from, req.to, |_| true) {
            Ok(true) => {
                info!(player = %req.player, from = %req.from, to = %req.to, "player migrated");
                true
            }
            Ok(false) => {
                debug!(player = %req.player, from = %req.from, "stale migration request");
                false
            }
            Err(error) => {
                warn!(player = %req.player, to = %req.to, %error, "migration target missing");
                self.with_zone(req.from, |z| {
                    if let Some(p) = z.player_mut(req.player) {
                        p.set_migrating(false);
                    }
                });
                false
            }
        }
    }

    /// Hand `player` from `from` to `to`.
    ///
    /// `prepare` runs on the player while it is still owned by `from`;
    /// returning `false` aborts the transfer without changes. When
    /// `from == to` the player stays in place.
    fn transfer<F>(
        &self,
        player: PlayerId,
        from: ZoneId,
        to: ZoneId,
        prepare: F,
    ) -> Result<bool, SubmitError>
    where
        F: FnOnce(&mut Player) -> bool,
    {
        let src_slot = self.slot(from)?;
        if from == to {
            let mut zone = src_slot.lock();
            return Ok(zone.player_mut(player).is_some_and(prepare));
        }
        let dst_slot = self.slot(to)?;
        let (mut src, mut dst) = if from < to {
            let src = src_slot.lock();
            (src, dst_slot.lock())
        } else {
            let dst = dst_slot.lock();
            (src_slot.lock(), dst)
        };

        let Some(owned) = src.player_mut(player) else {
            return Ok(false);
        };
        if !prepare(owned) {
            return Ok(false);
        }
        let Some(moving) = src.evict(player) else {
            return Ok(false);
        };
        dst.admit(moving);
        self.directory_write().insert(player, to);
        Ok(true)
    }

    /// Spawn point of zone `zone`, if it exists.
    pub fn spawn_point(&self, zone: ZoneId) -> Option<Vec2> {
        self.rules.topology.bounds(zone).map(|b| b.centre())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::sink::TransportError;
    use fray_core::{CharacterClass, Combatant, InputState, MoveKeys};
    use fray_space::WorldTopology;

    struct Null;

    impl ClientSink for Null {
        fn send_batch(&mut self, _: &[ServerMessage]) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn coordinator() -> Coordinator {
        let topology =
            WorldTopology::new(vec![vec![ZoneId(1), ZoneId(2)]], 1000.0).unwrap();
        Coordinator::new(Rules::new(ServerConfig::default(), topology).unwrap()).unwrap()
    }

    fn guardian() -> CharacterSelection {
        CharacterSelection {
            class: CharacterClass::Guardian,
        }
    }

    #[test]
    fn spawn_registers_player_in_spawn_zone() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        assert_eq!(c.player_zone(id), Some(ZoneId(1)));
        assert_eq!(c.owners(id).as_slice(), &[ZoneId(1)]);
        let welcomed = c
            .with_zone(ZoneId(1), |z| {
                z.player(id).unwrap().pending()[0].type_name()
            })
            .unwrap();
        assert_eq!(welcomed, "welcome");
    }

    #[test]
    fn input_for_unknown_player_is_rejected() {
        let c = coordinator();
        let err = c
            .route(ZoneInput {
                player: PlayerId(u64::MAX),
                input: InputState::default(),
            })
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownPlayer { .. }));
    }

    #[test]
    fn malformed_raw_message_is_rejected() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        assert!(matches!(
            c.submit_raw(id, r#"{"type":"dance","data":{}}"#),
            Err(SubmitError::Malformed(_))
        ));
    }

    #[test]
    fn migration_moves_ownership_and_directory() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        let req = MigrationRequest {
            player: id,
            from: ZoneId(1),
            to: ZoneId(2),
        };
        assert!(c.apply_migration(req));
        assert_eq!(c.owners(id).as_slice(), &[ZoneId(2)]);
        assert_eq!(c.player_zone(id), Some(ZoneId(2)));
        let zone_of_record = c
            .with_zone(ZoneId(2), |z| z.player(id).unwrap().zone_id())
            .unwrap();
        assert_eq!(zone_of_record, ZoneId(2));
        // Replaying the same request is stale.
        assert!(!c.apply_migration(req));
        assert_eq!(c.owners(id).as_slice(), &[ZoneId(2)]);
    }

    #[test]
    fn respawn_only_revives_the_dead() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        assert!(c.apply_migration(MigrationRequest {
            player: id,
            from: ZoneId(1),
            to: ZoneId(2),
        }));
        assert!(!c.respawn(id).unwrap());

        c.with_zone(ZoneId(2), |z| {
            let p = z.player_mut(id).unwrap();
            p.stats_mut().apply_damage(10_000);
            p.mark_dead();
        });
        assert!(c.respawn(id).unwrap());
        assert_eq!(c.owners(id).as_slice(), &[ZoneId(1)]);
        let (hp, max, at) = c
            .with_zone(ZoneId(1), |z| {
                let p = z.player(id).unwrap();
                (p.stats().hp, p.stats().max_hp, p.position())
            })
            .unwrap();
        assert_eq!(hp, max);
        assert_eq!(at, Vec2::new(500.0, 500.0));
    }

    #[test]
    fn disconnect_removes_player() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        assert!(c.disconnect(id));
        assert!(c.owners(id).is_empty());
        assert_eq!(c.player_zone(id), None);
        assert!(!c.disconnect(id));
    }

    #[test]
    fn closed_coordinator_refuses_new_work() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        c.close();
        assert!(c.is_closed());
        assert_eq!(
            c.route(ZoneInput {
                player: id,
                input: InputState::default(),
            }),
            Err(SubmitError::ShutDown)
        );
        assert_eq!(c.spawn(guardian(), Box::new(Null)).unwrap_err(), SubmitError::ShutDown);
        assert_eq!(c.respawn(id), Err(SubmitError::ShutDown));
        assert_eq!(c.with_zone(ZoneId(1), |z| z.queued_inputs()), Some(0));
        // Existing players can still leave.
        assert!(c.disconnect(id));
    }

    #[test]
    fn misrouted_input_follows_the_player() {
        let c = coordinator();
        let id = c.spawn(guardian(), Box::new(Null)).unwrap();
        let input = ZoneInput {
            player: id,
            input: InputState {
                movement: MoveKeys::from_bits(MoveKeys::UP),
                action: false,
            },
        };
        c.route(input).unwrap();
        c.apply_migration(MigrationRequest {
            player: id,
            from: ZoneId(1),
            to: ZoneId(2),
        });
        let report = c.tick_zone(ZoneId(1), 100).unwrap();
        assert_eq!(report.misrouted, vec![input]);
        c.apply_report(&report);
        let report = c.tick_zone(ZoneId(2), 100).unwrap();
        assert_eq!(report.metrics.inputs_applied, 1);
    }
}
