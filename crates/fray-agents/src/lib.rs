//! Hostile agents for Fray.
//!
//! A [`HostileAgent`] is an explicit state machine
//! (see [`AgentState`]) advanced once per zone tick by
//! [`HostileAgent::update`]. The update reads an [`AgentContext`] built
//! by the zone and returns at most one [`AgentEvent`] for the zone to
//! act on: a telegraph warning to broadcast, a strike to land, or a
//! completed death to reward and remove.
//!
//! Per-tier numbers live in [`AgentProfile`]s, shared by `Arc` between
//! every agent of that tier.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod profile;
pub mod separation;
pub mod state;

pub use agent::{AgentContext, AgentEvent, HostileAgent, XpAward};
pub use profile::{AgentProfile, BehaviorTuning, ProfileCatalog, ProfileError};
pub use separation::SeparationGrid;
pub use state::AgentState;
