//! Active-mitigation ledger and per-day effect aggregation.

use serde::{Deserialize, Serialize};

use crate::data::Mitigation;

/// A mitigation currently in effect, with its remaining lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveMitigation {
    pub mitigation: Mitigation,
    /// Days of effect left, counting the next tick. Instantaneous
    /// mitigations enter with one day.
    pub remaining_days: u32,
    /// Day index the mitigation was activated on.
    pub activation_day: u32,
    /// Set until the one-off exposed shock has been drained by a tick.
    #[serde(default)]
    pub shock_pending: bool,
}

/// Aggregate of all active mitigation effects for one day.
///
/// Multipliers combine as a product, everything else sums. Conflicting
/// intents (e.g. opposite vaccination deltas) simply sum; there is no
/// precedence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEffects {
    pub r_mult: f64,
    pub cost_per_day: f64,
    pub stability_cost_per_day: f64,
    pub vaccination_per_day: f64,
    /// One-off additions to active infections, drained from newly activated
    /// mitigations exactly once.
    pub exposed_shock: f64,
}

impl Default for AggregateEffects {
    fn default() -> Self {
        Self {
            r_mult: 1.0,
            cost_per_day: 0.0,
            stability_cost_per_day: 0.0,
            vaccination_per_day: 0.0,
            exposed_shock: 0.0,
        }
    }
}

/// Tracks which mitigations are in effect and aggregates their numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MitigationLedger {
    active: Vec<ActiveMitigation>,
}

impl MitigationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mitigation to the active set. Its exposed shock is queued and
    /// applied by the first tick that follows, exactly once.
    pub fn activate(&mut self, mitigation: Mitigation, day: u32) {
        let remaining_days = mitigation.duration_days.max(1);
        self.active.push(ActiveMitigation {
            mitigation,
            remaining_days,
            activation_day: day,
            shock_pending: true,
        });
    }

    /// Aggregate today's effects, then age the active set: lifetimes count
    /// down only after the day's effect was counted, and anything reaching
    /// zero expires.
    pub fn tick(&mut self) -> AggregateEffects {
        let mut effects = AggregateEffects::default();
        for entry in &mut self.active {
            effects.r_mult *= entry.mitigation.r_mult;
            effects.cost_per_day += entry.mitigation.cost_per_day;
            effects.stability_cost_per_day += entry.mitigation.stability_cost_per_day;
            effects.vaccination_per_day += entry.mitigation.vaccination_per_day;
            if entry.shock_pending {
                effects.exposed_shock += entry.mitigation.exposed_shock;
                entry.shock_pending = false;
            }
            entry.remaining_days = entry.remaining_days.saturating_sub(1);
        }
        self.active.retain(|entry| entry.remaining_days > 0);
        effects
    }

    /// Clone of the active set, used for per-day history snapshots.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ActiveMitigation> {
        self.active.clone()
    }

    /// Replace the active set from a history snapshot.
    pub fn restore(&mut self, snapshot: Vec<ActiveMitigation>) {
        self.active = snapshot;
    }

    #[must_use]
    pub fn active(&self) -> &[ActiveMitigation] {
        &self.active
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
