//! Fray: a zone-sharded world server core for small online action RPGs.
//!
//! This is the facade crate that re-exports the public API of the Fray
//! sub-crates. Depending on `fray` alone is enough for most servers.
//!
//! # Quick start
//!
//! ```rust
//! use fray::prelude::*;
//!
//! // Two 512 px zones side by side.
//! let topology = WorldTopology::new(vec![vec![ZoneId(1), ZoneId(2)]], 512.0).unwrap();
//! let mut server = LockstepServer::new(ServerConfig::default(), topology).unwrap();
//!
//! let sink = JsonLinesSink::new(std::io::sink());
//! let id = server
//!     .coordinator()
//!     .spawn(CharacterSelection { class: CharacterClass::Monk }, Box::new(sink))
//!     .unwrap();
//!
//! let walk_east = InputState {
//!     movement: MoveKeys::from_bits(MoveKeys::RIGHT),
//!     action: false,
//! };
//! server.coordinator().route(ZoneInput { player: id, input: walk_east }).unwrap();
//!
//! let step = server.step_sync();
//! assert_eq!(step.now_ms, 100);
//! assert_eq!(server.coordinator().player_zone(id), Some(ZoneId(1)));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `fray-core` | IDs, stats, wire messages, progression |
//! | [`space`] | `fray-space` | World layout, zone bounds, neighbour lookup |
//! | [`combat`] | `fray-combat` | Ability catalog and resolver |
//! | [`agents`] | `fray-agents` | Hostile agent profiles and state machine |
//! | [`engine`] | `fray-engine` | Zones, coordinator, lockstep and realtime servers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs and wire messages (`fray-core`).
///
/// Contains the [`types::Combatant`] trait that combat targets through,
/// the [`types::ServerMessage`] and [`types::ClientMessage`] protocol
/// enums, and the [`types::Progression`] hook.
pub use fray_core as types;

/// World topology (`fray-space`).
///
/// [`space::WorldTopology`] owns the zone grid and answers which zone
/// owns a position and which zones a player can see.
pub use fray_space as space;

/// Ability resolution (`fray-combat`).
pub use fray_combat as combat;

/// Hostile agents (`fray-agents`).
///
/// [`agents::HostileAgent`] runs the spawn, roam, pursue, telegraph,
/// attack and death cycle for one agent.
pub use fray_agents as agents;

/// Zone tick and server coordination (`fray-engine`).
///
/// [`engine::LockstepServer`] steps every zone on the caller's thread,
/// [`engine::RealtimeServer`] gives each zone its own tick thread.
pub use fray_engine as engine;

/// Common imports for typical Fray usage.
///
/// ```rust
/// use fray::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use fray_core::{
        AbilityName, AgentId, CharacterClass, CharacterSelection, ClientMessage, Combatant,
        EntityId, InputState, MoveKeys, PlayerId, ServerMessage, Stats, Vec2, ZoneId,
    };

    // Space
    pub use fray_space::{WorldLayout, WorldTopology, ZoneBounds};

    // Combat
    pub use fray_combat::{AbilityCatalog, CasterSide};

    // Agents
    pub use fray_agents::{AgentState, HostileAgent, ProfileCatalog};

    // Engine
    pub use fray_engine::{
        ChannelSink, ClientSink, ConfigError, Coordinator, JsonLinesSink, LockstepServer,
        RealtimeServer, ServerConfig, StepReport, SubmitError, TransportError, ZoneInput,
    };
}
