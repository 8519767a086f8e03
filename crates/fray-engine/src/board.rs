//! Latest published snapshot of every zone.
//!
//! [`SnapshotBoard`] keeps one `Arc<ZoneSnapshot>` slot per zone. Each
//! zone is the single producer of its own slot; any zone may read any
//! other zone's latest snapshot while assembling a player's view of its
//! active zone set.

use fray_core::{AgentSnapshot, PlayerSnapshot, TickId, ZoneId};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Everything a client can see of one zone at the end of a tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneSnapshot {
    /// Publishing zone.
    pub zone: ZoneId,
    /// Tick that produced it.
    pub tick: TickId,
    /// Zone clock when it was taken.
    pub timestamp: u64,
    /// Players owned by the zone.
    pub players: Vec<PlayerSnapshot>,
    /// Agents owned by the zone.
    pub agents: Vec<AgentSnapshot>,
}

/// One slot per zone, fixed at construction.
pub struct SnapshotBoard {
    slots: IndexMap<ZoneId, Mutex<Option<Arc<ZoneSnapshot>>>>,
    publishes: AtomicU64,
}

// Compile-time assertion: SnapshotBoard must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SnapshotBoard>();
};

impl SnapshotBoard {
    /// A board with an empty slot for each of `zones`.
    pub fn new<I: IntoIterator<Item = ZoneId>>(zones: I) -> Self {
        Self {
            slots: zones.into_iter().map(|z| (z, Mutex::new(None))).collect(),
            publishes: AtomicU64::new(0),
        }
    }

    /// Replace the zone's slot and return the snapshot it displaced.
    ///
    /// Snapshots for zones the board was not built with are dropped.
    pub fn publish(&self, snapshot: ZoneSnapshot) -> Option<Arc<ZoneSnapshot>> {
        let slot = self.slots.get(&snapshot.zone)?;
        let arc = Arc::new(snapshot);
        let prev = slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(arc);
        self.publishes.fetch_add(1, Ordering::Relaxed);
        prev
    }

    /// The zone's most recent snapshot, if it has published one.
    pub fn latest(&self, zone: ZoneId) -> Option<Arc<ZoneSnapshot>> {
        self.slots
            .get(&zone)?
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of zones on the board.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the board has no zones.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total number of publishes across all zones.
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }
}
