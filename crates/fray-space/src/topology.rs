//! The zone grid, neighbour tables and position queries.

use crate::bounds::ZoneBounds;
use crate::direction::Direction;
use crate::error::TopologyError;
use crate::layout::WorldLayout;
use fray_core::{Vec2, ZoneId};
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::info;

/// The current zone followed by up to three neighbours.
pub type ActiveZoneSet = SmallVec<[ZoneId; 4]>;

#[derive(Clone, Debug)]
struct ZoneCell {
    row: usize,
    col: usize,
    bounds: ZoneBounds,
    neighbors: [ZoneId; 8],
}

/// Immutable world grid.
///
/// Zones are square, `zone_size` pixels per side, and zone `(row, col)`
/// has its origin at `(col * zone_size, row * zone_size)`. Neighbour
/// tables hold [`ZoneId::VOID`] where the grid has no zone.
#[derive(Clone, Debug)]
pub struct WorldTopology {
    rows: usize,
    cols: usize,
    grid: Vec<ZoneId>,
    zone_size: f32,
    zones: IndexMap<ZoneId, ZoneCell>,
}

impl WorldTopology {
    /// Build from a row-major zone-id grid. `ZoneId::VOID` marks unused
    /// cells.
    ///
    /// Fails if the grid is empty or ragged, a zone id repeats, or
    /// `zone_size` is not a positive finite number.
    pub fn new(grid: Vec<Vec<ZoneId>>, zone_size: f32) -> Result<Self, TopologyError> {
        if !(zone_size.is_finite() && zone_size > 0.0) {
            return Err(TopologyError::InvalidZoneSize { size: zone_size });
        }
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(TopologyError::EmptyGrid);
        }
        for (row, cells) in grid.iter().enumerate() {
            if cells.len() != cols {
                return Err(TopologyError::RaggedGrid {
                    row,
                    expected: cols,
                    found: cells.len(),
                });
            }
        }
        let flat: Vec<ZoneId> = grid.into_iter().flatten().collect();

        let mut zones: IndexMap<ZoneId, ZoneCell> = IndexMap::new();
        for (i, &id) in flat.iter().enumerate() {
            if id.is_void() {
                continue;
            }
            let (row, col) = (i / cols, i % cols);
            if let Some(prev) = zones.get(&id) {
                return Err(TopologyError::DuplicateZone {
                    zone: id,
                    first: (prev.row, prev.col),
                    second: (row, col),
                });
            }
            let origin = Vec2::new(col as f32 * zone_size, row as f32 * zone_size);
            zones.insert(
                id,
                ZoneCell {
                    row,
                    col,
                    bounds: ZoneBounds::square(origin, zone_size),
                    neighbors: [ZoneId::VOID; 8],
                },
            );
        }
        if zones.is_empty() {
            return Err(TopologyError::EmptyGrid);
        }

        for cell in zones.values_mut() {
            for dir in Direction::ALL {
                let (dr, dc) = dir.offset();
                let r = cell.row as i64 + i64::from(dr);
                let c = cell.col as i64 + i64::from(dc);
                if r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols {
                    cell.neighbors[dir.index()] = flat[r as usize * cols + c as usize];
                }
            }
        }

        let topo = Self {
            rows,
            cols,
            grid: flat,
            zone_size,
            zones,
        };
        topo.validate()?;
        info!(
            rows,
            cols,
            zones = topo.zones.len(),
            zone_size,
            "world topology initialised"
        );
        Ok(topo)
    }

    /// Build from a named layout.
    pub fn from_layout(layout: &WorldLayout) -> Result<Self, TopologyError> {
        Self::new(layout.zone_grid()?, layout.zone_size_px())
    }

    /// Check that every neighbour reference names a defined zone.
    fn validate(&self) -> Result<(), TopologyError> {
        for (&zone, cell) in &self.zones {
            for &neighbor in &cell.neighbors {
                if !neighbor.is_void() && !self.zones.contains_key(&neighbor) {
                    return Err(TopologyError::UnknownNeighbor { zone, neighbor });
                }
            }
        }
        Ok(())
    }

    /// Grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Zone side length in pixels.
    pub fn zone_size(&self) -> f32 {
        self.zone_size
    }

    /// Total world extent in pixels.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.cols as f32 * self.zone_size,
            self.rows as f32 * self.zone_size,
        )
    }

    /// Every defined zone, in row-major grid order.
    pub fn zone_ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.keys().copied()
    }

    /// Number of defined zones.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Whether `zone` is defined.
    pub fn contains(&self, zone: ZoneId) -> bool {
        self.zones.contains_key(&zone)
    }

    /// World-space rectangle of `zone`.
    pub fn bounds(&self, zone: ZoneId) -> Option<ZoneBounds> {
        self.zones.get(&zone).map(|c| c.bounds)
    }

    /// World-space origin of `zone`.
    pub fn origin(&self, zone: ZoneId) -> Option<Vec2> {
        self.bounds(zone).map(|b| b.min)
    }

    /// Neighbour table of `zone` in [`Direction::ALL`] order.
    pub fn neighbors(&self, zone: ZoneId) -> Option<&[ZoneId; 8]> {
        self.zones.get(&zone).map(|c| &c.neighbors)
    }

    /// Neighbour of `zone` in `dir`, or `VOID`.
    pub fn neighbor(&self, zone: ZoneId, dir: Direction) -> ZoneId {
        self.zones
            .get(&zone)
            .map_or(ZoneId::VOID, |c| c.neighbors[dir.index()])
    }

    /// Zone id of the grid cell containing `pos`, or `VOID` outside the
    /// grid.
    pub fn zone_at(&self, pos: Vec2) -> ZoneId {
        let c = (pos.x / self.zone_size).floor();
        let r = (pos.y / self.zone_size).floor();
        if !(c >= 0.0 && r >= 0.0) {
            return ZoneId::VOID;
        }
        let (r, c) = (r as usize, c as usize);
        if r >= self.rows || c >= self.cols {
            return ZoneId::VOID;
        }
        self.grid[r * self.cols + c]
    }

    /// Zone that owns `pos`, given the zone that currently owns the
    /// entity.
    ///
    /// A void cell falls back to a bounds check of `current` and its
    /// neighbours. `None` means the position is outside the world and
    /// the move must be rejected.
    pub fn resolve(&self, current: ZoneId, pos: Vec2) -> Option<ZoneId> {
        let id = self.zone_at(pos);
        if !id.is_void() {
            return Some(id);
        }
        let cell = self.zones.get(&current)?;
        if cell.bounds.contains(pos) {
            return Some(current);
        }
        cell.neighbors
            .iter()
            .copied()
            .filter(|n| !n.is_void())
            .find(|n| self.bounds(*n).is_some_and(|b| b.contains(pos)))
    }

    /// Zones a client at `pos` in `current` needs to see.
    ///
    /// The current zone comes first, followed by the nearer horizontal
    /// neighbour, the nearer vertical neighbour and the diagonal between
    /// them; void neighbours are skipped.
    pub fn active_zone_set(&self, current: ZoneId, pos: Vec2) -> ActiveZoneSet {
        let mut set = ActiveZoneSet::new();
        let Some(cell) = self.zones.get(&current) else {
            return set;
        };
        set.push(current);
        let local = cell.bounds.local(pos);
        let half = self.zone_size / 2.0;
        let horizontal = if local.x < half {
            Direction::West
        } else {
            Direction::East
        };
        let vertical = if local.y < half {
            Direction::North
        } else {
            Direction::South
        };
        let diagonal = Direction::diagonal(vertical, horizontal);
        for dir in [Some(horizontal), Some(vertical), diagonal]
            .into_iter()
            .flatten()
        {
            let n = cell.neighbors[dir.index()];
            if !n.is_void() && !set.contains(&n) {
                set.push(n);
            }
        }
        set
    }
}
