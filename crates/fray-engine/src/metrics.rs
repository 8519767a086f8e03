//! Per-tick metrics for a zone.

/// Counters and timing collected during a single zone tick.
///
/// Durations are in microseconds. Counts cover this tick only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickMetrics {
    /// Wall-clock time for the whole tick.
    pub total_us: u64,
    /// Time spent draining and applying inputs.
    pub input_us: u64,
    /// Time spent advancing agents.
    pub agents_us: u64,
    /// Time spent assembling and flushing outbound batches.
    pub publish_us: u64,
    /// Inputs applied to a player.
    pub inputs_applied: u32,
    /// Inputs addressed to a player this zone no longer owns.
    pub inputs_misrouted: u32,
    /// Movements rolled back at the world edge or into void.
    pub moves_rejected: u32,
    /// Migration requests raised.
    pub migrations_requested: u32,
    /// Strikes landed by players and agents.
    pub strikes: u32,
    /// Agents spawned by the respawn top-up.
    pub agents_spawned: u32,
    /// Agents removed after their death completed.
    pub agents_expired: u32,
    /// Players dropped after a transport failure.
    pub players_dropped: u32,
    /// Players owned at the end of the tick.
    pub players: u32,
    /// Agents owned at the end of the tick.
    pub agents: u32,
}
