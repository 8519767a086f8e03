//! Agent behavior states.

use std::fmt;

/// Where an agent is in its behavior cycle.
///
/// `Spawn → Roam → Pursue → Telegraph → Attack → Cooldown`, with
/// `Cooldown` branching back to `Roam`, `Pursue` or `Telegraph`.
/// `Death` is terminal and reachable from every state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Materializing; inert.
    Spawn,
    /// Wandering near the spawn point.
    Roam,
    /// Chasing the nearest player.
    Pursue,
    /// Halted and winding up an attack.
    Telegraph,
    /// The attack has fired; recovery animation.
    Attack,
    /// Waiting for the ability to come off cooldown.
    Cooldown,
    /// Dying; removed when the state expires.
    Death,
}

impl AgentState {
    /// Name used in snapshots.
    pub fn name(self) -> &'static str {
        match self {
            Self::Spawn => "Spawn",
            Self::Roam => "Roam",
            Self::Pursue => "Pursue",
            Self::Telegraph => "Telegraph",
            Self::Attack => "Attack",
            Self::Cooldown => "Cooldown",
            Self::Death => "Death",
        }
    }

    /// Whether the agent may move in this state.
    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Roam | Self::Pursue)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
