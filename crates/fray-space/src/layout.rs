//! Named-region world layout, as authored alongside the tilemaps.

use crate::error::TopologyError;
use fray_core::{ZoneId, TILE_SIZE};
use indexmap::IndexMap;
use serde::Deserialize;

fn default_void() -> String {
    "void".to_string()
}

fn default_zone_tiles() -> u32 {
    256
}

/// A grid of region names plus the region → zone id mapping.
///
/// ```json
/// {
///   "void": "void",
///   "zoneTiles": 256,
///   "regions": { "meadow": 1, "marsh": 2 },
///   "grid": [["meadow", "marsh"], ["void", "meadow-east"]]
/// }
/// ```
///
/// Cells holding the void name are excluded from the world and from
/// population. Every other cell must name a region in `regions`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldLayout {
    /// Name marking an empty cell.
    #[serde(default = "default_void")]
    pub void: String,
    /// Zone side length in tiles.
    #[serde(default = "default_zone_tiles")]
    pub zone_tiles: u32,
    /// Region name → zone id.
    pub regions: IndexMap<String, ZoneId>,
    /// Row-major grid of region names.
    pub grid: Vec<Vec<String>>,
}

impl WorldLayout {
    /// Decode a layout from JSON.
    pub fn from_json(raw: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Zone side length in pixels.
    pub fn zone_size_px(&self) -> f32 {
        self.zone_tiles as f32 * TILE_SIZE
    }

    /// Translate region names into zone ids.
    pub fn zone_grid(&self) -> Result<Vec<Vec<ZoneId>>, TopologyError> {
        if let Some((name, _)) = self.regions.iter().find(|(_, id)| id.is_void()) {
            return Err(TopologyError::ReservedZoneId { name: name.clone() });
        }
        self.grid
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, name)| {
                        if *name == self.void {
                            return Ok(ZoneId::VOID);
                        }
                        self.regions
                            .get(name)
                            .copied()
                            .ok_or_else(|| TopologyError::UnknownRegion {
                                name: name.clone(),
                                row,
                                col,
                            })
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"{
        "regions": { "meadow": 1, "marsh": 2, "hills": 3 },
        "grid": [["meadow", "marsh"], ["void", "hills"]]
    }"#;

    #[test]
    fn names_resolve_to_ids() {
        let layout = WorldLayout::from_json(LAYOUT).unwrap();
        assert_eq!(layout.zone_size_px(), 8192.0);
        let grid = layout.zone_grid().unwrap();
        assert_eq!(grid[0], vec![ZoneId(1), ZoneId(2)]);
        assert_eq!(grid[1], vec![ZoneId::VOID, ZoneId(3)]);
    }

    #[test]
    fn unknown_region_is_fatal() {
        let mut layout = WorldLayout::from_json(LAYOUT).unwrap();
        layout.grid[1][0] = "swamp".into();
        let err = layout.zone_grid().unwrap_err();
        assert_eq!(
            err,
            TopologyError::UnknownRegion {
                name: "swamp".into(),
                row: 1,
                col: 0
            }
        );
    }

    #[test]
    fn region_mapped_to_void_is_fatal() {
        let mut layout = WorldLayout::from_json(LAYOUT).unwrap();
        layout.regions.insert("abyss".into(), ZoneId(0));
        assert!(matches!(
            layout.zone_grid(),
            Err(TopologyError::ReservedZoneId { .. })
        ));
    }

    #[test]
    fn bad_json_is_parse_error() {
        assert!(matches!(
            WorldLayout::from_json("{"),
            Err(TopologyError::Parse { .. })
        ));
    }
}
