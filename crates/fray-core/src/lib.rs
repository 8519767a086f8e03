//! Core types and traits for the Fray world server.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace:
//! identifiers, the stat block, the [`Combatant`] capability trait,
//! wire-agnostic message types, and the progression seam.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod id;
pub mod message;
pub mod progression;
pub mod stats;

pub use entity::Combatant;
pub use error::MessageError;
pub use id::{AbilityName, AgentId, EntityId, PlayerId, TickId, ZoneId};
pub use message::{
    AbilityEffect, ActiveZones, AgentSnapshot, CharacterClass, CharacterSelection, ClientMessage,
    Facing, InputState, LevelUp, MoveKeys, PlayerDeath, PlayerRespawn, PlayerSnapshot,
    ServerMessage, TelegraphWarning, Welcome,
};
pub use progression::{LevelCurve, LevelOutcome, Progression, ProgressionState};
pub use stats::Stats;

/// World-space position and velocity type (pixels, +y pointing down).
pub use glam::Vec2;

/// Side length of one map tile in pixels.
pub const TILE_SIZE: f32 = 32.0;
