//! Zone simulation and server coordination for Fray.
//!
//! A world is split into [`Zone`]s, each owning the players and hostile
//! agents inside its square and ticking independently. The
//! [`Coordinator`] owns all zones, routes client input to the owning
//! zone and moves players between zones when they cross an edge.
//!
//! Two drivers run the coordinator:
//!
//! - [`LockstepServer`] ticks every zone on the caller's thread, one
//!   interval per call. Deterministic for a given seed.
//! - [`RealtimeServer`] runs one thread per zone at the configured tick
//!   rate plus a migrator thread that applies tick reports.
//!
//! Outbound traffic leaves through the [`ClientSink`] seam; the crate
//! does no network I/O of its own.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod board;
pub mod config;
pub mod coordinator;
pub mod inbox;
pub mod lockstep;
pub mod metrics;
pub mod player;
pub mod realtime;
pub mod rules;
pub mod sink;
mod tick_thread;
pub mod zone;

pub use board::{SnapshotBoard, ZoneSnapshot};
pub use config::{ConfigError, PlayerDefaults, PopulationEntry, ServerConfig, Viewport};
pub use coordinator::Coordinator;
pub use inbox::{Inbox, InboxSender, SubmitError, ZoneInput};
pub use lockstep::{LockstepServer, StepReport};
pub use metrics::TickMetrics;
pub use player::{AbilitySlot, Loadout, Player};
pub use realtime::{RealtimeServer, ShutdownReport};
pub use rules::Rules;
pub use sink::{ChannelSink, ClientSink, JsonLinesSink, TransportError};
pub use zone::{MigrationRequest, TickReport, Zone};
