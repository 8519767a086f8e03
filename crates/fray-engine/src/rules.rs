//! Validated, read-only world rules shared by every zone.

use crate::config::{ConfigError, PlayerDefaults, PopulationEntry, ServerConfig, Viewport};
use crate::player::{Loadout, Player};
use crate::sink::ClientSink;
use fray_agents::{BehaviorTuning, ProfileCatalog};
use fray_combat::AbilityCatalog;
use fray_core::{CharacterClass, LevelCurve, PlayerId, Progression, Vec2, ZoneId};
use fray_space::{TopologyError, WorldTopology};
use std::sync::Arc;

/// Everything a zone reads but never writes.
///
/// Built once from a [`ServerConfig`] and a [`WorldTopology`], after
/// validation, and shared by `Arc`.
pub struct Rules {
    /// The zone grid.
    pub topology: Arc<WorldTopology>,
    /// Ability strategy table.
    pub abilities: AbilityCatalog,
    /// Agent tiers.
    pub profiles: ProfileCatalog,
    /// Agent steering constants.
    pub tuning: BehaviorTuning,
    /// Player starting values.
    pub player: PlayerDefaults,
    /// Abilities handed to each new player.
    pub loadout: Loadout,
    /// Client viewport.
    pub viewport: Viewport,
    /// Agent populations.
    pub population: Vec<PopulationEntry>,
    /// Level curve used by XP awards.
    pub progression: Arc<dyn Progression>,
    /// Nominal tick length.
    pub tick_interval_ms: u64,
    /// Per-zone inbox capacity.
    pub inbox_capacity: usize,
    /// Base RNG seed.
    pub seed: u64,
    /// Where players spawn and respawn.
    pub spawn_zone: ZoneId,
}

impl Rules {
    /// Validate `config` against `topology` and use the default level
    /// curve.
    pub fn new(config: ServerConfig, topology: WorldTopology) -> Result<Self, ConfigError> {
        Self::with_progression(config, topology, Arc::new(LevelCurve::default()))
    }

    /// Validate `config` against `topology` with a custom level curve.
    pub fn with_progression(
        config: ServerConfig,
        topology: WorldTopology,
        progression: Arc<dyn Progression>,
    ) -> Result<Self, ConfigError> {
        config.validate(&topology)?;
        let spawn_zone = config
            .resolved_spawn_zone(&topology)
            .ok_or(TopologyError::EmptyGrid)?;
        let loadout = Loadout::from_catalog(&config.player, &config.abilities)?;
        let tick_interval_ms = config.tick_interval_ms();
        Ok(Self {
            topology: Arc::new(topology),
            abilities: config.abilities,
            profiles: config.profiles,
            tuning: config.tuning,
            player: config.player,
            loadout,
            viewport: config.viewport,
            population: config.population,
            progression,
            tick_interval_ms,
            inbox_capacity: config.inbox_capacity,
            seed: config.seed,
            spawn_zone,
        })
    }

    /// A fresh player of `class` at `position` in `zone`, with its
    /// level-span cache filled from the level curve.
    pub fn new_player(
        &self,
        id: PlayerId,
        zone: ZoneId,
        class: CharacterClass,
        position: Vec2,
        sink: Box<dyn ClientSink>,
    ) -> Player {
        let mut player = Player::new(id, zone, class, position, &self.player, &self.loadout, sink);
        let (state, _) = player.progression_mut();
        self.progression.refresh(state);
        player
    }

    /// Seed for `zone`'s RNG.
    pub fn zone_seed(&self, zone: ZoneId) -> u64 {
        self.seed ^ u64::from(zone.0).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}
