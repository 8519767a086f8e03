//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`PlayerId`] allocation.
static PLAYER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for unique [`AgentId`] allocation.
static AGENT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies a connected player character.
///
/// Allocated from a process-wide monotonic counter, so an id is never
/// reused even after the player disconnects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Allocate a fresh, unique player id. Thread-safe.
    pub fn next() -> Self {
        Self(PLAYER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Identifies a hostile agent.
///
/// Unique across every zone: agents are allocated from one counter so
/// snapshots merged from several zones never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl AgentId {
    /// Allocate a fresh, unique agent id. Thread-safe.
    pub fn next() -> Self {
        Self(AGENT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// Identifies a zone. `ZoneId(0)` is the void marker.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// The void / unused grid cell.
    pub const VOID: ZoneId = ZoneId(0);

    /// Whether this id is the void marker.
    pub fn is_void(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ZoneId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Any entity an ability can be cast by or land on.
///
/// Serialized as its display string (`player-3`, `agent-17`) so clients
/// can tell the two kinds apart without a separate tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    /// A player character.
    Player(PlayerId),
    /// A hostile agent.
    Agent(AgentId),
}

impl EntityId {
    /// The player id, if this entity is a player.
    pub fn as_player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::Agent(_) => None,
        }
    }

    /// The agent id, if this entity is an agent.
    pub fn as_agent(self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Player(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => id.fmt(f),
            Self::Agent(id) => id.fmt(f),
        }
    }
}

impl From<PlayerId> for EntityId {
    fn from(id: PlayerId) -> Self {
        Self::Player(id)
    }
}

impl From<AgentId> for EntityId {
    fn from(id: AgentId) -> Self {
        Self::Agent(id)
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Monotonically increasing per-zone tick counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Names of the combat actions in the ability catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityName {
    /// Short-range melee arc centred on the caster.
    HammerSwing,
    /// Ranged area burst at a point resolved during the telegraph.
    Fireball,
    /// Wide, AP-costed melee sweep centred on the caster.
    ColossalSweep,
}

impl AbilityName {
    /// Every ability in catalog order.
    pub const ALL: [AbilityName; 3] = [
        AbilityName::HammerSwing,
        AbilityName::Fireball,
        AbilityName::ColossalSweep,
    ];

    /// Wire name of the ability.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HammerSwing => "HammerSwing",
            Self::Fireball => "Fireball",
            Self::ColossalSweep => "ColossalSweep",
        }
    }
}

impl fmt::Display for AbilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
