//! Behavior profiles and shared steering tuning.

use fray_core::{AbilityName, TILE_SIZE};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors from profile validation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProfileError {
    /// A radius, speed or height is not a positive finite number.
    #[error("profile {profile:?}: {field} must be positive, got {value}")]
    NonPositive {
        /// Profile name.
        profile: String,
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The telegraph trigger is wider than the pursue trigger.
    #[error("profile {profile:?}: telegraph radius exceeds pursue radius")]
    TelegraphOutsidePursue {
        /// Profile name.
        profile: String,
    },
    /// A profile has no positive max HP.
    #[error("profile {profile:?}: max HP must be positive")]
    NoHitPoints {
        /// Profile name.
        profile: String,
    },
    /// A probability is outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability {
        /// Offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Stat scaling, trigger radii, timings and ability of one agent tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    /// Lookup key, also sent in snapshots.
    pub name: String,
    /// Maximum HP.
    pub max_hp: i32,
    /// Attack power.
    pub attack: i32,
    /// XP granted on death.
    pub xp_drop: u32,
    /// Base movement speed in px/s.
    pub roam_speed: f32,
    /// Distance at which a player is chased.
    pub pursue_radius: f32,
    /// Distance at which the agent stops and winds up.
    pub telegraph_radius: f32,
    /// Distance within which players share the XP award.
    pub award_radius: f32,
    /// Sprite height in pixels.
    pub sprite_height: f32,
    /// `Spawn` state length.
    pub spawn_ms: u64,
    /// `Telegraph` state length.
    pub telegraph_ms: u64,
    /// `Attack` state length.
    pub attack_ms: u64,
    /// `Death` state length.
    pub death_ms: u64,
    /// Ability used at the end of a telegraph.
    pub ability: Option<AbilityName>,
}

impl AgentProfile {
    #[allow(clippy::too_many_arguments)]
    fn tier(
        name: &str,
        tier_scale: f32,
        max_hp: i32,
        attack: i32,
        xp_drop: u32,
        roam_speed: f32,
        telegraph_tiles: f32,
        telegraph_ms: u64,
        ability: AbilityName,
    ) -> Self {
        Self {
            name: name.to_string(),
            max_hp,
            attack,
            xp_drop,
            roam_speed,
            pursue_radius: 8.0 * TILE_SIZE,
            telegraph_radius: telegraph_tiles * TILE_SIZE,
            award_radius: 10.0 * TILE_SIZE * tier_scale,
            sprite_height: 64.0,
            spawn_ms: 1000,
            telegraph_ms,
            attack_ms: 500,
            death_ms: 1000,
            ability: Some(ability),
        }
    }

    /// The weakest tier: melee, 50 HP.
    pub fn easy() -> Self {
        Self::tier("easy", 1.0, 50, 5, 10, 32.0, 2.0, 500, AbilityName::HammerSwing)
    }

    /// Middle tier: melee, 100 HP.
    pub fn medium() -> Self {
        Self::tier("medium", 1.5, 100, 10, 20, 48.0, 2.0, 500, AbilityName::HammerSwing)
    }

    /// Strongest tier: ranged Fireball, 200 HP.
    pub fn hard() -> Self {
        Self::tier("hard", 2.0, 200, 20, 30, 64.0, 6.0, 1000, AbilityName::Fireball)
    }

    /// Check radii, speeds and HP.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (field, value) in [
            ("roamSpeed", self.roam_speed),
            ("pursueRadius", self.pursue_radius),
            ("telegraphRadius", self.telegraph_radius),
            ("awardRadius", self.award_radius),
            ("spriteHeight", self.sprite_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ProfileError::NonPositive {
                    profile: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if self.telegraph_radius > self.pursue_radius {
            return Err(ProfileError::TelegraphOutsidePursue {
                profile: self.name.clone(),
            });
        }
        if self.max_hp <= 0 {
            return Err(ProfileError::NoHitPoints {
                profile: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Named agent profiles, shared by reference between agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AgentProfile>", into = "Vec<AgentProfile>")]
pub struct ProfileCatalog {
    profiles: IndexMap<String, Arc<AgentProfile>>,
}

impl ProfileCatalog {
    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Option<&Arc<AgentProfile>> {
        self.profiles.get(name)
    }

    /// Insert or replace a profile.
    pub fn insert(&mut self, profile: AgentProfile) {
        self.profiles
            .insert(profile.name.clone(), Arc::new(profile));
    }

    /// Profile names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Validate every profile.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.profiles.values().try_for_each(|p| p.validate())
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::from(vec![
            AgentProfile::easy(),
            AgentProfile::medium(),
            AgentProfile::hard(),
        ])
    }
}

impl From<Vec<AgentProfile>> for ProfileCatalog {
    fn from(list: Vec<AgentProfile>) -> Self {
        let mut c = Self {
            profiles: IndexMap::new(),
        };
        for p in list {
            c.insert(p);
        }
        c
    }
}

impl From<ProfileCatalog> for Vec<AgentProfile> {
    fn from(c: ProfileCatalog) -> Self {
        c.profiles.into_values().map(|p| (*p).clone()).collect()
    }
}

/// Steering constants shared by every agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorTuning {
    /// Per-tick chance of picking a new roam heading.
    pub heading_change_chance: f32,
    /// Distance from the spawn point beyond which a roaming agent
    /// steers home.
    pub roam_radius: f32,
    /// Speed multiplier while pursuing.
    pub pursue_multiplier: f32,
    /// Agents closer than this push each other apart.
    pub min_separation: f32,
    /// Separation grid bucket size.
    pub separation_bucket: f32,
    /// Peak repulsion speed at zero distance.
    pub separation_strength: f32,
    /// Velocity cap as a multiple of roam speed.
    pub speed_clamp: f32,
    /// Cooldown length for agents without an ability.
    pub cooldown_fallback_ms: u64,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            heading_change_chance: 0.05,
            roam_radius: 5.0 * TILE_SIZE,
            pursue_multiplier: 1.5,
            min_separation: 64.0,
            separation_bucket: 128.0,
            separation_strength: 100.0,
            speed_clamp: 1.5,
            cooldown_fallback_ms: 1000,
        }
    }
}

impl BehaviorTuning {
    /// Check the chance and distances.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(0.0..=1.0).contains(&self.heading_change_chance) {
            return Err(ProfileError::InvalidProbability {
                field: "headingChangeChance",
                value: self.heading_change_chance,
            });
        }
        for (field, value) in [
            ("roamRadius", self.roam_radius),
            ("minSeparation", self.min_separation),
            ("separationBucket", self.separation_bucket),
            ("speedClamp", self.speed_clamp),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ProfileError::NonPositive {
                    profile: "tuning".to_string(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}
