//! End-of-game summary export.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::Mitigation;
use crate::game::Game;

/// One mitigation activation, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationRecord {
    pub day_index: u32,
    pub date: NaiveDate,
    pub label: String,
}

/// Serializable digest of a finished (or running) game, suitable for
/// leaderboards and replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub seed: u64,
    /// Simulated days, excluding the seeded initial day.
    pub days: u32,
    pub final_date: NaiveDate,
    pub final_deaths_total: f64,
    pub final_cost_total: f64,
    pub final_stability: f64,
    pub final_vaccination_rate: f64,
    /// Mitigation activations in chronological order.
    pub mitigation_history: Vec<MitigationRecord>,
    /// Every distinct mitigation the scenario's events can apply, so a
    /// reader can interpret the history without the registry.
    pub mitigation_params: Vec<Mitigation>,
}

impl Game {
    /// Export the current run as a summary. Callable at any point, not only
    /// at the terminal state.
    #[must_use]
    pub fn export_summary(&self) -> GameSummary {
        let last = self.current_state();
        GameSummary {
            seed: self.seed(),
            days: (self.history().len() - 1) as u32,
            final_date: last.date,
            final_deaths_total: last.stats.deaths.total,
            final_cost_total: last.stats.costs.total,
            final_stability: last.stats.stability,
            final_vaccination_rate: last.stats.vaccination_rate,
            mitigation_history: self.mitigation_history().to_vec(),
            mitigation_params: self.scenario().registry.mitigation_params(),
        }
    }
}
