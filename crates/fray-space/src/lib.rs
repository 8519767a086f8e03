//! World topology for Fray.
//!
//! The world is a rectangular grid of square zones. A [`WorldTopology`]
//! is built once at startup from a zone-id grid (or a named
//! [`WorldLayout`]) and is read-only afterwards, so it can be shared
//! across zone threads behind an `Arc` without locking.
//!
//! # Queries
//!
//! - [`WorldTopology::resolve`]: which zone owns a world position, with a
//!   neighbour probe for void cells
//! - [`WorldTopology::active_zone_set`]: the zones a client at a given
//!   position needs snapshots from
//! - [`WorldTopology::bounds`]: the world-space rectangle of one zone

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bounds;
pub mod direction;
pub mod error;
pub mod layout;
pub mod topology;

pub use bounds::ZoneBounds;
pub use direction::Direction;
pub use error::TopologyError;
pub use layout::WorldLayout;
pub use topology::{ActiveZoneSet, WorldTopology};
