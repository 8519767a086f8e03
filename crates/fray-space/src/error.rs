//! Error types for topology construction.

use fray_core::ZoneId;
use thiserror::Error;

/// Errors arising while building a [`WorldTopology`](crate::WorldTopology).
///
/// All of these are fatal: the server refuses to start with an
/// inconsistent world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TopologyError {
    /// The grid has no rows, no columns, or no non-void cell.
    #[error("world grid must contain at least one zone")]
    EmptyGrid,
    /// A row's length differs from the first row's.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        /// Offending row.
        row: usize,
        /// Length of row 0.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// A zone id appears in more than one cell.
    #[error("zone {zone} appears at {first:?} and {second:?}")]
    DuplicateZone {
        /// The repeated id.
        zone: ZoneId,
        /// `(row, col)` of the first occurrence.
        first: (usize, usize),
        /// `(row, col)` of the second occurrence.
        second: (usize, usize),
    },
    /// A grid cell names a region that the layout does not define.
    #[error("region {name:?} at [{row}][{col}] is not defined")]
    UnknownRegion {
        /// Region name.
        name: String,
        /// Grid row.
        row: usize,
        /// Grid column.
        col: usize,
    },
    /// A region is mapped to the reserved void id 0.
    #[error("region {name:?} uses reserved zone id 0")]
    ReservedZoneId {
        /// Region name.
        name: String,
    },
    /// A neighbour table references a zone that is not in the grid.
    #[error("neighbour {neighbor} of zone {zone} is not defined")]
    UnknownNeighbor {
        /// Zone owning the table.
        zone: ZoneId,
        /// Referenced id.
        neighbor: ZoneId,
    },
    /// Zone side length must be positive and finite.
    #[error("zone size must be positive, got {size}")]
    InvalidZoneSize {
        /// The rejected size.
        size: f32,
    },
    /// The layout document could not be decoded.
    #[error("invalid world layout: {reason}")]
    Parse {
        /// Decoder diagnostic.
        reason: String,
    },
}

impl From<serde_json::Error> for TopologyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse {
            reason: e.to_string(),
        }
    }
}
