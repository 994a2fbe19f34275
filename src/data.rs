//! Event registry data model: mitigations, narrative variants, trigger
//! conditions. Registries are plain data and can be loaded from JSON.

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::state::DayState;

/// Effect descriptor for a player-facing intervention or an event side effect.
///
/// A `duration_days` of zero means an instantaneous one-day effect; the
/// ledger treats it the same as one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    pub label: String,
    #[serde(default)]
    pub duration_days: u32,
    /// Reproduction-number multiplier while active.
    #[serde(default = "default_r_mult")]
    pub r_mult: f64,
    #[serde(default)]
    pub cost_per_day: f64,
    #[serde(default)]
    pub stability_cost_per_day: f64,
    /// Daily vaccination-rate delta (fraction of population, may be negative).
    #[serde(default)]
    pub vaccination_per_day: f64,
    /// One-time additive jump to active infections, applied once on activation.
    #[serde(default)]
    pub exposed_shock: f64,
}

const fn default_r_mult() -> f64 {
    1.0
}

impl Mitigation {
    /// Narrative-only placeholder with no numeric effect.
    #[must_use]
    pub fn noop(label: &str) -> Self {
        Self {
            label: label.to_string(),
            duration_days: 0,
            r_mult: default_r_mult(),
            cost_per_day: 0.0,
            stability_cost_per_day: 0.0,
            vaccination_per_day: 0.0,
            exposed_shock: 0.0,
        }
    }
}

/// One narrative rendition of an event. Title/text/help are opaque payload
/// handed to the embedding application; the engine never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventVariant {
    pub title: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    /// Effects applied immediately when the variant fires, no decision needed.
    #[serde(default)]
    pub effects: Vec<Mitigation>,
    /// Selectable mitigations; a non-empty list makes the event a decision.
    #[serde(default)]
    pub choices: Vec<Mitigation>,
}

impl EventVariant {
    #[must_use]
    pub fn headline(title: &str) -> Self {
        Self {
            title: title.to_string(),
            text: None,
            help: None,
            effects: Vec::new(),
            choices: Vec::new(),
        }
    }

    /// Whether firing this variant halts the simulation for a player choice.
    #[must_use]
    pub fn requires_decision(&self) -> bool {
        !self.choices.is_empty()
    }
}

/// Trigger definition: an ordered set of narrative variants guarded by a
/// condition, with cooldown suppression between fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub condition: Condition,
    /// Minimum day gap before this definition may fire again. Zero means the
    /// definition may fire on any later eligible day.
    #[serde(default)]
    pub cooldown_days: u32,
    pub variants: Vec<EventVariant>,
}

/// Ordered registry of event definitions. Evaluation follows declaration
/// order so probabilistic conditions draw deterministically under a seeded
/// RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventRegistry {
    pub defs: Vec<EventDef>,
}

impl EventRegistry {
    /// Empty registry (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self { defs: Vec::new() }
    }

    /// Load a registry from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid definitions.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn from_defs(defs: Vec<EventDef>) -> Self {
        Self { defs }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// All mitigations reachable from this registry, effects and choices alike.
    #[must_use]
    pub fn mitigation_params(&self) -> Vec<Mitigation> {
        let mut params = Vec::new();
        for def in &self.defs {
            for variant in &def.variants {
                for mitigation in variant.effects.iter().chain(variant.choices.iter()) {
                    if !params.contains(mitigation) {
                        params.push(mitigation.clone());
                    }
                }
            }
        }
        params
    }
}

/// Pure predicate over a day state, possibly consulting the injected RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Deaths recorded today reach a threshold.
    DeathsToday { at_least: f64 },
    /// Trailing 7-day death average reaches a threshold.
    DeathsAvg7Day { at_least: f64 },
    DeathsTotal { at_least: f64 },
    CostTotal { at_least: f64 },
    ActiveInfections { at_least: f64 },
    StabilityAtMost { value: f64 },
    VaccinationAtLeast { rate: f64 },
    /// Fires on the given seasonal calendar day (every year).
    SeasonalDate { mmdd: String },
    /// Uniform-hazard draw inside a seasonal mm-dd window: the chance grows
    /// linearly with days elapsed since the window opened, so the event fires
    /// once at a roughly uniform position inside the window.
    SeasonalWindow { from: String, to: String },
    /// Probabilistic draw on every day strictly after a calendar date.
    AfterDate { date: NaiveDate, chance: f64 },
    /// Unconditional probabilistic draw.
    Chance { p: f64 },
    /// Conjunction; draws are evaluated left to right.
    All { conditions: Vec<Condition> },
}

impl Condition {
    /// Evaluate against a day state with an injected random source.
    pub fn evaluate<R: Rng + ?Sized>(&self, state: &DayState, rng: &mut R) -> bool {
        match self {
            Self::DeathsToday { at_least } => state.stats.deaths.today >= *at_least,
            Self::DeathsAvg7Day { at_least } => state.stats.deaths.avg7_day >= *at_least,
            Self::DeathsTotal { at_least } => state.stats.deaths.total >= *at_least,
            Self::CostTotal { at_least } => state.stats.costs.total >= *at_least,
            Self::ActiveInfections { at_least } => state.stats.active_infections >= *at_least,
            Self::StabilityAtMost { value } => state.stats.stability <= *value,
            Self::VaccinationAtLeast { rate } => state.stats.vaccination_rate >= *rate,
            Self::SeasonalDate { mmdd } => seasonal_day_diff(state.date, mmdd) == Some(0),
            Self::SeasonalWindow { from, to } => seasonal_window_draw(state.date, from, to, rng),
            Self::AfterDate { date, chance } => {
                state.date > *date && rng.gen_range(0.0..1.0) < *chance
            }
            Self::Chance { p } => rng.gen_range(0.0..1.0) < *p,
            Self::All { conditions } => conditions
                .iter()
                .all(|condition| condition.evaluate(state, rng)),
        }
    }
}

fn parse_mmdd(mmdd: &str) -> Option<(u32, u32)> {
    let (month, day) = mmdd.split_once('-')?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some((month, day))
    } else {
        None
    }
}

/// Anchor an mm-dd onto the year of `date`, clamping short months.
fn seasonal_anchor(date: NaiveDate, mmdd: &str) -> Option<NaiveDate> {
    let (month, day) = parse_mmdd(mmdd)?;
    let mut day = day;
    loop {
        if let Some(anchor) = NaiveDate::from_ymd_opt(date.year(), month, day) {
            return Some(anchor);
        }
        if day <= 1 {
            return None;
        }
        day -= 1;
    }
}

/// Signed day distance from the seasonal anchor to `date` within its year.
fn seasonal_day_diff(date: NaiveDate, mmdd: &str) -> Option<i64> {
    let anchor = seasonal_anchor(date, mmdd)?;
    Some((date - anchor).num_days())
}

fn seasonal_window_draw<R: Rng + ?Sized>(
    date: NaiveDate,
    from: &str,
    to: &str,
    rng: &mut R,
) -> bool {
    const YEAR_DAYS: i64 = 365;
    let (Some(since_from), Some(until_to)) =
        (seasonal_day_diff(date, from), seasonal_day_diff(date, to))
    else {
        return false;
    };
    let wrapped = since_from < until_to;
    let (in_window, days_in, interval) = if wrapped {
        // Window spans the new year, e.g. 12-02 .. 02-14.
        let inside = since_from > 0 || until_to <= 0;
        let days_in = if since_from > 0 {
            since_from
        } else {
            since_from + YEAR_DAYS
        };
        (inside, days_in, YEAR_DAYS + (since_from - until_to))
    } else {
        (since_from > 0 && until_to <= 0, since_from, since_from - until_to)
    };
    if !in_window || interval < 0 {
        return false;
    }
    let hazard = days_in as f64 / (interval + 1) as f64;
    rng.gen_range(0.0..1.0) < hazard
}
