//! Bucketed local repulsion between agents.

use fray_core::{AgentId, Vec2};
use smallvec::SmallVec;
use std::collections::HashMap;

type Bucket = SmallVec<[(AgentId, Vec2); 8]>;

/// Start-of-tick agent positions hashed into square buckets.
///
/// A query only visits the 3×3 block of buckets around the agent, so
/// the cost is proportional to local density rather than zone
/// population.
#[derive(Clone, Debug, Default)]
pub struct SeparationGrid {
    bucket: f32,
    cells: HashMap<(i32, i32), Bucket>,
}

impl SeparationGrid {
    /// Bucket the given positions. `bucket` must be positive.
    pub fn build<I>(bucket: f32, agents: I) -> Self
    where
        I: IntoIterator<Item = (AgentId, Vec2)>,
    {
        let mut grid = Self {
            bucket,
            cells: HashMap::new(),
        };
        for (id, pos) in agents {
            let key = grid.key(pos);
            grid.cells.entry(key).or_default().push((id, pos));
        }
        grid
    }

    fn key(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.bucket).floor() as i32,
            (pos.y / self.bucket).floor() as i32,
        )
    }

    /// Repulsion velocity acting on agent `id` at `pos`.
    ///
    /// Each neighbour closer than `min_separation` pushes away with
    /// speed `strength * (min_separation - d) / min_separation`.
    /// Exactly coincident agents exert no force.
    pub fn repulsion(&self, id: AgentId, pos: Vec2, min_separation: f32, strength: f32) -> Vec2 {
        let (cx, cy) = self.key(pos);
        let mut push = Vec2::ZERO;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &(other, other_pos) in bucket {
                    if other == id {
                        continue;
                    }
                    let away = pos - other_pos;
                    let d = away.length();
                    if d > 0.0 && d < min_separation {
                        push += away / d * (strength * (min_separation - d) / min_separation);
                    }
                }
            }
        }
        push
    }

    /// Number of bucketed agents.
    pub fn len(&self) -> usize {
        self.cells.values().map(SmallVec::len).sum()
    }

    /// Whether no agents were bucketed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
