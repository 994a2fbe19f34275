//! The discrete epidemic model: one pure step from history to the next
//! day's statistics.
//!
//! The model is SEIR-like with fixed delays rather than rate constants.
//! Carriers are the trailing incubation window of new infections, cases
//! resolve exactly `disease_days` after infection, and immunity wanes
//! `immunity_days` after infection by returning old cases to the
//! susceptible pool.

use crate::mitigations::AggregateEffects;
use crate::scenario::ScenarioConfig;
use crate::state::{CostStats, DayState, DeathStats, Stats};

/// Compute the next day's statistics from the full history so far.
///
/// `history` must be non-empty; day zero is seeded by the orchestrator. The
/// function reads only trailing windows of the history, never mutates it.
#[must_use]
pub fn next_stats(
    history: &[DayState],
    effects: &AggregateEffects,
    scenario: &ScenarioConfig,
) -> Stats {
    let idx = history.len();
    let prev = &history[idx - 1].stats;

    // Living population, eroded by everyone dead as of yesterday.
    let living = (scenario.population - prev.deaths.total).max(1.0);

    let window = scenario.incubation_days.max(1) as usize;
    let carriers: f64 = history
        .iter()
        .rev()
        .take(window)
        .map(|day| day.stats.new_infections)
        .sum();

    let susceptibility = susceptible_fraction(history, carriers, living, scenario);

    let mut daily_rate = scenario.r0;
    if scenario.incubation_days > 0 {
        daily_rate /= f64::from(scenario.incubation_days);
    }
    daily_rate *= effects.r_mult * susceptibility;

    let new_infections = (daily_rate * carriers + effects.exposed_shock).max(0.0);

    // Cases infected disease_days ago resolve today, as deaths or recoveries.
    let resolved = cohort_new_infections(history, scenario.disease_days);
    let deaths_today = scenario.mortality * resolved;
    let deaths_total = prev.deaths.total + deaths_today;

    let active_infections = prev.active_infections + new_infections - resolved;
    let cumulative_infections = prev.cumulative_infections + new_infections;

    Stats {
        new_infections,
        cumulative_infections,
        active_infections,
        deaths: DeathStats {
            today: deaths_today,
            total: deaths_total,
            avg7_day: trailing_death_average(history, deaths_today),
        },
        costs: CostStats {
            total: prev.costs.total + effects.cost_per_day.max(0.0),
        },
        stability: prev.stability - effects.stability_cost_per_day,
        vaccination_rate: (prev.vaccination_rate + effects.vaccination_per_day).clamp(0.0, 1.0),
    }
}

/// Fraction of the living population still susceptible, in [0, 1].
///
/// Everyone infected within the immunity window is excluded; infections
/// older than the window have returned to the susceptible pool. Current
/// carriers count as infected even though today's snapshot is not yet in
/// the history.
fn susceptible_fraction(
    history: &[DayState],
    carriers: f64,
    living: f64,
    scenario: &ScenarioConfig,
) -> f64 {
    let idx = history.len();
    let window = scenario.immunity_days as usize;
    // Cumulative infections as of the day before the window opened; the
    // immune span covers the full `immunity_days` days up to yesterday.
    let cumulative_before_window = if idx > window {
        history[idx - window - 1].stats.cumulative_infections
    } else {
        0.0
    };
    let immune = history[idx - 1].stats.cumulative_infections + carriers
        - cumulative_before_window;
    if immune < living {
        ((living - immune) / living).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// New infections of the cohort `delay` days back, or zero when history is
/// still shorter than the delay.
fn cohort_new_infections(history: &[DayState], delay: u32) -> f64 {
    let idx = history.len();
    let delay = delay as usize;
    if idx >= delay && delay > 0 {
        history[idx - delay].stats.new_infections
    } else {
        0.0
    }
}

/// Mean daily deaths over the trailing 7 days, today included. Early in a
/// run the divisor is the number of days available, not 7.
fn trailing_death_average(history: &[DayState], deaths_today: f64) -> f64 {
    let trailing: f64 = history
        .iter()
        .rev()
        .take(6)
        .map(|day| day.stats.deaths.today)
        .sum();
    let days = (history.len() + 1).min(7) as f64;
    (trailing + deaths_today) / days
}
