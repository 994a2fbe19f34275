//! Immutable per-day snapshots produced by the simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::mitigations::ActiveMitigation;

/// Ids of events that fired on a day; stored inline for the common case.
pub type TriggeredEvents = SmallVec<[String; 4]>;

/// Death counters for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DeathStats {
    pub today: f64,
    /// Monotonically non-decreasing across history.
    pub total: f64,
    /// Rolling mean over the trailing 7 entries (fewer if history is shorter).
    pub avg7_day: f64,
}

/// Monetary accumulator; monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CostStats {
    pub total: f64,
}

/// Epidemiological, economic, and social metrics for one simulated day.
///
/// All fields are kept unrounded so compounding error never accumulates from
/// repeated rounding; use the `reported_*` accessors for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Stats {
    pub new_infections: f64,
    pub cumulative_infections: f64,
    /// Infections that have not yet resolved. Not clamped at zero; the model
    /// preserves the conservation identity over cosmetic non-negativity.
    pub active_infections: f64,
    pub deaths: DeathStats,
    pub costs: CostStats,
    /// Signed scalar, unbounded above; the game-over check owns the floor.
    pub stability: f64,
    /// Fraction of the population vaccinated, kept in [0, 1].
    pub vaccination_rate: f64,
}

impl Stats {
    /// New infections rounded for display.
    #[must_use]
    pub fn reported_new_infections(&self) -> i64 {
        round_for_display(self.new_infections)
    }

    /// Active infections rounded for display.
    #[must_use]
    pub fn reported_active_infections(&self) -> i64 {
        round_for_display(self.active_infections)
    }

    /// Cumulative deaths rounded for display.
    #[must_use]
    pub fn reported_deaths_total(&self) -> i64 {
        round_for_display(self.deaths.total)
    }

    /// Today's deaths rounded for display.
    #[must_use]
    pub fn reported_deaths_today(&self) -> i64 {
        round_for_display(self.deaths.today)
    }
}

fn round_for_display(value: f64) -> i64 {
    let rounded = value.round();
    if rounded >= i64::MAX as f64 {
        i64::MAX
    } else if rounded <= i64::MIN as f64 {
        i64::MIN
    } else {
        rounded as i64
    }
}

/// Immutable snapshot of one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayState {
    pub date: NaiveDate,
    pub stats: Stats,
    /// Ledger snapshot as of the end of this day, including decisions
    /// resolved on it. Backward navigation restores from here.
    #[serde(default)]
    pub active_mitigations: Vec<ActiveMitigation>,
    /// Events that fired this day, in declaration order.
    #[serde(default)]
    pub triggered_events: TriggeredEvents,
}

impl DayState {
    /// Snapshot with no mitigations or triggered events.
    #[must_use]
    pub fn new(date: NaiveDate, stats: Stats) -> Self {
        Self {
            date,
            stats,
            active_mitigations: Vec::new(),
            triggered_events: TriggeredEvents::new(),
        }
    }
}
