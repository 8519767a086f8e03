//! The stat block shared by players and hostile agents.

use serde::{Deserialize, Serialize};

/// Hit points, action points and attack power.
///
/// `hp` may go negative within the tick that kills an entity; the
/// removal/death path clamps it with [`Stats::clamp_hp`] before the
/// entity is snapshotted again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Maximum hit points.
    pub max_hp: i32,
    /// Current hit points.
    pub hp: i32,
    /// Maximum action points.
    pub max_ap: i32,
    /// Current action points.
    pub ap: i32,
    /// Attack power.
    pub attack_power: i32,
}

impl Stats {
    /// A full stat block: HP and AP start at their maxima.
    pub fn new(max_hp: i32, max_ap: i32, attack_power: i32) -> Self {
        Self {
            max_hp,
            hp: max_hp,
            max_ap,
            ap: max_ap,
            attack_power,
        }
    }

    /// Whether HP has been driven to zero or below.
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Subtract `amount` HP. No clamping: see the type-level docs.
    pub fn apply_damage(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Deduct `cost` AP if affordable.
    ///
    /// Returns `false` and leaves AP untouched when `ap < cost`, so AP
    /// can never be driven below zero by an ability.
    pub fn try_spend_ap(&mut self, cost: i32) -> bool {
        if self.ap < cost {
            return false;
        }
        self.ap -= cost;
        true
    }

    /// Restore up to `amount` AP, never exceeding `max_ap`.
    pub fn restore_ap(&mut self, amount: i32) {
        self.ap = (self.ap.saturating_add(amount)).min(self.max_ap);
    }

    /// Clamp HP into `[0, max_hp]`.
    pub fn clamp_hp(&mut self) {
        self.hp = self.hp.clamp(0, self.max_hp);
    }

    /// Refill HP and AP to their maxima.
    pub fn refill(&mut self) {
        self.hp = self.max_hp;
        self.ap = self.max_ap;
    }
}
