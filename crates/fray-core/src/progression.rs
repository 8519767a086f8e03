//! Experience and levelling.
//!
//! The simulation only calls [`Progression::add_xp`]; the level curve
//! itself is a pluggable pure function.

use crate::stats::Stats;

/// Per-player progression fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionState {
    /// Current level, starting at 1.
    pub level: u32,
    /// Total XP accumulated.
    pub xp: u32,
    /// XP earned since reaching the current level.
    pub xp_on_level: u32,
    /// XP span between the current and next level.
    pub xp_for_next: u32,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_on_level: 0,
            xp_for_next: 0,
        }
    }
}

/// Result of an XP award.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelOutcome {
    /// Levels gained by this award.
    pub levels_gained: u32,
}

impl LevelOutcome {
    /// Whether at least one level was gained.
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// A level curve consumed by the death-award step.
pub trait Progression: Send + Sync + 'static {
    /// Add `amount` XP, advancing level and stats as the curve dictates.
    fn add_xp(&self, state: &mut ProgressionState, stats: &mut Stats, amount: u32)
        -> LevelOutcome;

    /// Refresh the cached level-span fields without awarding XP.
    fn refresh(&self, state: &mut ProgressionState) {
        let _ = self.add_xp(state, &mut Stats::new(1, 0, 0), 0);
    }
}

/// Polynomial level curve: level `n` requires `base * (n - 1)^growth`
/// total XP. Each level gained multiplies attack power by
/// `attack_growth`.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelCurve {
    totals: Vec<u32>,
    attack_growth: f64,
}

impl LevelCurve {
    /// Highest reachable level of the default curve.
    pub const MAX_LEVEL: u32 = 50;

    /// Build a curve with explicit parameters.
    pub fn new(base: f64, growth: f64, max_level: u32, attack_growth: f64) -> Self {
        let max_level = max_level.max(1);
        // Index 0 is unused so that `totals[level]` reads naturally.
        let totals = (0..=max_level)
            .map(|level| {
                if level == 0 {
                    0
                } else {
                    (base * f64::from(level - 1).powf(growth)) as u32
                }
            })
            .collect();
        Self {
            totals,
            attack_growth,
        }
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        (self.totals.len() - 1) as u32
    }

    /// Total XP required to reach `level`, saturating at the cap.
    pub fn total_for(&self, level: u32) -> u32 {
        let idx = (level as usize).min(self.totals.len() - 1);
        self.totals[idx]
    }
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self::new(100.0, 1.5, Self::MAX_LEVEL, 1.1)
    }
}

impl Progression for LevelCurve {
    fn add_xp(
        &self,
        state: &mut ProgressionState,
        stats: &mut Stats,
        amount: u32,
    ) -> LevelOutcome {
        state.xp = state.xp.saturating_add(amount);
        let mut outcome = LevelOutcome::default();
        while state.level < self.max_level() && state.xp >= self.total_for(state.level + 1) {
            state.level += 1;
            stats.attack_power = (f64::from(stats.attack_power) * self.attack_growth) as i32;
            outcome.levels_gained += 1;
        }
        let current = self.total_for(state.level);
        state.xp_on_level = state.xp - current;
        state.xp_for_next = self.total_for(state.level + 1).saturating_sub(current);
        outcome
    }
}
