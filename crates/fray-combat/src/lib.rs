//! Ability resolution for Fray.
//!
//! Every combat action is data: an [`AbilityDescriptor`] looked up from
//! an [`AbilityCatalog`] by ability name and caster side. One shared
//! resolver handles cost, cooldown, hit testing and damage for all of
//! them; only the impact point differs between melee (caster-relative)
//! and ranged (pre-resolved during a telegraph) delivery.
//!
//! Resolution is two-phase so that a caster and its targets can live in
//! the same collection without aliasing:
//!
//! 1. [`prepare`] checks preconditions against the caster and, on
//!    success, deducts AP and stamps the cooldown, yielding a [`Strike`].
//! 2. [`Strike::apply`] lands the strike on any set of targets and
//!    produces the single [`AbilityEffect`](fray_core::AbilityEffect)
//!    notification.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod descriptor;
pub mod instance;
pub mod resolver;

pub use catalog::{AbilityCatalog, CatalogError};
pub use descriptor::{AbilityDescriptor, CasterSide, Delivery, TargetFilter};
pub use fray_core::AbilityName;
pub use instance::{AbilityInstance, Impact};
pub use resolver::{acquire_target, execute, prepare, AbilityRejection, Strike, StrikeOutcome};
