//! Server configuration, validation, and error types.
//!
//! [`ServerConfig`] is the builder input for both server modes.
//! [`validate()`](ServerConfig::validate) checks it against the world
//! topology at startup; any failure is fatal and the server refuses to
//! start.

use fray_agents::{BehaviorTuning, ProfileCatalog, ProfileError};
use fray_combat::{AbilityCatalog, CasterSide, CatalogError};
use fray_core::{AbilityName, ZoneId};
use fray_space::{TopologyError, WorldTopology};
use serde::Deserialize;
use thiserror::Error;

// ── PlayerDefaults ───────────────────────────────────────────────

/// Starting values for every spawned player.
///
/// Base stats are scaled per character class; see
/// [`CharacterClass::stats`](fray_core::CharacterClass::stats).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDefaults {
    /// Base max HP before class scaling.
    pub base_hp: i32,
    /// Base max AP before class scaling.
    pub base_ap: i32,
    /// Base attack power before class scaling.
    pub base_attack: i32,
    /// Movement speed in px/s.
    pub speed: f32,
    /// Sprite height in px. Half of it is the collider radius.
    pub sprite_height: f32,
    /// Period of the automatic base attack.
    pub base_attack_interval_ms: u64,
    /// Ability fired by the base-attack timer.
    pub base_ability: AbilityName,
    /// Ability fired by the input action flag.
    pub action_ability: Option<AbilityName>,
    /// AP regenerated per second, capped at max AP.
    pub ap_regen_per_sec: f32,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            base_hp: 300,
            base_ap: 200,
            base_attack: 45,
            speed: 160.0,
            sprite_height: 64.0,
            base_attack_interval_ms: 1000,
            base_ability: AbilityName::HammerSwing,
            action_ability: Some(AbilityName::ColossalSweep),
            ap_regen_per_sec: 5.0,
        }
    }
}

// ── Viewport ─────────────────────────────────────────────────────

/// Client viewport in pixels, centred on the player.
///
/// The base attack only fires while a hostile agent is inside it.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in px.
    pub width: f32,
    /// Height in px.
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl Viewport {
    /// Whether `point` is visible from a viewport centred on `centre`.
    pub fn contains(&self, centre: fray_core::Vec2, point: fray_core::Vec2) -> bool {
        let d = (point - centre).abs();
        d.x <= self.width / 2.0 && d.y <= self.height / 2.0
    }
}

// ── PopulationEntry ──────────────────────────────────────────────

/// Target agent population of one profile.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationEntry {
    /// Zone to populate; `None` populates every zone.
    #[serde(default)]
    pub zone: Option<ZoneId>,
    /// Profile name in the profile catalog.
    pub profile: String,
    /// Number of live agents to keep.
    pub count: usize,
    /// How often missing agents are replaced.
    #[serde(default = "default_respawn_interval_ms")]
    pub respawn_interval_ms: u64,
}

fn default_respawn_interval_ms() -> u64 {
    30_000
}

impl PopulationEntry {
    /// `count` agents of `profile` in every zone.
    pub fn everywhere(profile: impl Into<String>, count: usize) -> Self {
        Self {
            zone: None,
            profile: profile.into(),
            count,
            respawn_interval_ms: default_respawn_interval_ms(),
        }
    }

    /// Whether this entry applies to `zone`.
    pub fn applies_to(&self, zone: ZoneId) -> bool {
        self.zone.is_none_or(|z| z == zone)
    }
}

// ── ConfigError ──────────────────────────────────────────────────

/// Errors detected while building a server.
#[derive(Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The world topology is inconsistent.
    #[error("topology: {0}")]
    Topology(#[from] TopologyError),
    /// An ability descriptor is invalid or missing.
    #[error("abilities: {0}")]
    Catalog(#[from] CatalogError),
    /// An agent profile or the steering tuning is invalid.
    #[error("profiles: {0}")]
    Profile(#[from] ProfileError),
    /// `tick_rate_hz` is NaN, infinite, zero, or negative.
    #[error("tick_rate_hz must be finite and positive, got {value}")]
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// Inbox capacity is zero.
    #[error("inbox_capacity must be at least 1")]
    InboxCapacityZero,
    /// Viewport has a non-positive extent.
    #[error("viewport must be positive, got {width}x{height}")]
    InvalidViewport {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },
    /// A player default is out of range.
    #[error("player {field} must be positive, got {value}")]
    InvalidPlayerDefault {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// The spawn zone is not part of the topology.
    #[error("spawn zone {zone} is not in the world")]
    UnknownSpawnZone {
        /// The configured zone.
        zone: ZoneId,
    },
    /// A zone was requested that the topology does not define.
    #[error("zone {zone} is not in the world")]
    UnknownZone {
        /// The requested zone.
        zone: ZoneId,
    },
    /// A population entry names a zone that is not in the topology.
    #[error("population zone {zone} is not in the world")]
    UnknownPopulationZone {
        /// The configured zone.
        zone: ZoneId,
    },
    /// A population entry names a profile that is not in the catalog.
    #[error("population profile {profile:?} is not defined")]
    UnknownProfile {
        /// The configured profile name.
        profile: String,
    },
    /// The configuration document could not be decoded.
    #[error("malformed server config: {reason}")]
    Parse {
        /// Decoder message.
        reason: String,
    },
    /// A zone or coordinator thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse {
            reason: e.to_string(),
        }
    }
}

// ── ServerConfig ─────────────────────────────────────────────────

/// Everything a server needs besides the world topology.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Zone tick rate. Default: 10 Hz (100 ms).
    pub tick_rate_hz: f64,
    /// Per-zone inbound queue capacity. Default: 256.
    pub inbox_capacity: usize,
    /// Seed for every zone's RNG; each zone mixes in its own id.
    pub seed: u64,
    /// Where new and respawning players appear. `None` uses the first
    /// zone of the topology.
    pub spawn_zone: Option<ZoneId>,
    /// Player starting values.
    pub player: PlayerDefaults,
    /// Client viewport.
    pub viewport: Viewport,
    /// Agent populations.
    pub population: Vec<PopulationEntry>,
    /// Ability strategy table.
    pub abilities: AbilityCatalog,
    /// Agent tiers.
    pub profiles: ProfileCatalog,
    /// Agent steering constants.
    pub tuning: BehaviorTuning,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10.0,
            inbox_capacity: 256,
            seed: 0,
            spawn_zone: None,
            player: PlayerDefaults::default(),
            viewport: Viewport::default(),
            population: Vec::new(),
            abilities: AbilityCatalog::default(),
            profiles: ProfileCatalog::default(),
            tuning: BehaviorTuning::default(),
        }
    }
}

impl ServerConfig {
    /// Decode from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Tick interval in whole milliseconds, at least 1.
    pub fn tick_interval_ms(&self) -> u64 {
        ((1000.0 / self.tick_rate_hz).round() as u64).max(1)
    }

    /// The configured spawn zone, or the topology's first zone.
    pub fn resolved_spawn_zone(&self, topology: &WorldTopology) -> Option<ZoneId> {
        self.spawn_zone.or_else(|| topology.zone_ids().next())
    }

    /// Check structural invariants against `topology`.
    pub fn validate(&self, topology: &WorldTopology) -> Result<(), ConfigError> {
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidTickRate {
                value: self.tick_rate_hz,
            });
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::InboxCapacityZero);
        }
        let vp = self.viewport;
        if !(vp.width > 0.0 && vp.height > 0.0) {
            return Err(ConfigError::InvalidViewport {
                width: vp.width,
                height: vp.height,
            });
        }
        self.validate_player()?;

        match self.resolved_spawn_zone(topology) {
            Some(zone) if topology.contains(zone) => {}
            Some(zone) => return Err(ConfigError::UnknownSpawnZone { zone }),
            None => return Err(TopologyError::EmptyGrid.into()),
        }

        for entry in &self.population {
            if let Some(zone) = entry.zone {
                if !topology.contains(zone) {
                    return Err(ConfigError::UnknownPopulationZone { zone });
                }
            }
            if self.profiles.get(&entry.profile).is_none() {
                return Err(ConfigError::UnknownProfile {
                    profile: entry.profile.clone(),
                });
            }
        }

        self.abilities.validate()?;
        self.abilities
            .require(self.player.base_ability, CasterSide::Player)?;
        if let Some(action) = self.player.action_ability {
            self.abilities.require(action, CasterSide::Player)?;
        }
        self.profiles.validate()?;
        self.tuning.validate()?;
        Ok(())
    }

    fn validate_player(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        for (field, value) in [
            ("baseHp", f64::from(p.base_hp)),
            ("speed", f64::from(p.speed)),
            ("spriteHeight", f64::from(p.sprite_height)),
            ("baseAttackInterval", p.base_attack_interval_ms as f64),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidPlayerDefault { field, value });
            }
        }
        if !(p.ap_regen_per_sec.is_finite() && p.ap_regen_per_sec >= 0.0) {
            return Err(ConfigError::InvalidPlayerDefault {
                field: "apRegenPerSec",
                value: f64::from(p.ap_regen_per_sec),
            });
        }
        Ok(())
    }
}
