//! Scenario configuration: model constants, terminal conditions, and the
//! event registry a simulation runs against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::data::{Condition, EventDef, EventRegistry, EventVariant, Mitigation};

/// Full parameterization of one epidemic scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Baseline reproduction number, pre-mitigation.
    #[serde(default = "ScenarioConfig::default_r0")]
    pub r0: f64,
    /// Days between exposure and becoming infectious.
    #[serde(default = "ScenarioConfig::default_incubation_days")]
    pub incubation_days: u32,
    /// Days an infection remains active before resolving.
    #[serde(default = "ScenarioConfig::default_disease_days")]
    pub disease_days: u32,
    /// Days a resolved case stays out of the susceptible pool.
    #[serde(default = "ScenarioConfig::default_immunity_days")]
    pub immunity_days: u32,
    #[serde(default = "ScenarioConfig::default_mortality")]
    pub mortality: f64,
    #[serde(default = "ScenarioConfig::default_population")]
    pub population: f64,
    #[serde(default = "ScenarioConfig::default_start_infected")]
    pub start_infected: f64,
    #[serde(default = "ScenarioConfig::default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "ScenarioConfig::default_initial_stability")]
    pub initial_stability: f64,
    /// Game over when stability falls to this value or below.
    #[serde(default = "ScenarioConfig::default_stability_floor")]
    pub stability_floor: Option<f64>,
    /// Scenario end; stepping past this date finishes the simulation.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub registry: EventRegistry,
}

impl ScenarioConfig {
    const fn default_r0() -> f64 {
        3.0
    }

    const fn default_incubation_days() -> u32 {
        5
    }

    const fn default_disease_days() -> u32 {
        14
    }

    const fn default_immunity_days() -> u32 {
        90
    }

    const fn default_mortality() -> f64 {
        0.012
    }

    const fn default_population() -> f64 {
        10_690_000.0
    }

    const fn default_start_infected() -> f64 {
        3.0
    }

    fn default_start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid start date")
    }

    const fn default_initial_stability() -> f64 {
        50.0
    }

    const fn default_stability_floor() -> Option<f64> {
        Some(-50.0)
    }

    /// The Czechia scenario with the stock event registry.
    #[must_use]
    pub fn czechia() -> Self {
        Self {
            registry: default_registry(),
            ..Self::default()
        }
    }

    /// Validate configuration invariants before a simulation is built.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError` when any field violates the documented bounds
    /// or the event registry is malformed.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.population > 0.0) {
            return Err(ScenarioError::MinViolation {
                field: "population",
                min: 1.0,
                value: self.population,
            });
        }
        if !(0.0..=self.population).contains(&self.start_infected) {
            return Err(ScenarioError::RangeViolation {
                field: "start_infected",
                min: 0.0,
                max: self.population,
                value: self.start_infected,
            });
        }
        if !(self.r0 >= 0.0) {
            return Err(ScenarioError::MinViolation {
                field: "r0",
                min: 0.0,
                value: self.r0,
            });
        }
        if !(0.0..=1.0).contains(&self.mortality) {
            return Err(ScenarioError::RangeViolation {
                field: "mortality",
                min: 0.0,
                max: 1.0,
                value: self.mortality,
            });
        }
        if self.disease_days == 0 {
            return Err(ScenarioError::MinViolation {
                field: "disease_days",
                min: 1.0,
                value: 0.0,
            });
        }
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            return Err(ScenarioError::EndBeforeStart {
                start: self.start_date,
                end,
            });
        }
        self.validate_registry()
    }

    fn validate_registry(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for def in &self.registry.defs {
            if def.id.trim().is_empty() {
                return Err(ScenarioError::EmptyEventId);
            }
            if !seen.insert(def.id.as_str()) {
                return Err(ScenarioError::DuplicateEventId {
                    id: def.id.clone(),
                });
            }
            if def.variants.is_empty() {
                return Err(ScenarioError::EmptyEventDef {
                    id: def.id.clone(),
                });
            }
            for variant in &def.variants {
                for mitigation in variant.effects.iter().chain(variant.choices.iter()) {
                    if mitigation.cost_per_day < 0.0 {
                        return Err(ScenarioError::NegativeCost {
                            id: def.id.clone(),
                            value: mitigation.cost_per_day,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            r0: Self::default_r0(),
            incubation_days: Self::default_incubation_days(),
            disease_days: Self::default_disease_days(),
            immunity_days: Self::default_immunity_days(),
            mortality: Self::default_mortality(),
            population: Self::default_population(),
            start_infected: Self::default_start_infected(),
            start_date: Self::default_start_date(),
            initial_stability: Self::default_initial_stability(),
            stability_floor: Self::default_stability_floor(),
            end_date: None,
            registry: EventRegistry::empty(),
        }
    }
}

/// Errors raised when scenario invariants are violated. Fatal to the
/// simulation instance being built; nothing is constructed.
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("scenario end date {end} precedes start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("event definition with empty id")]
    EmptyEventId,
    #[error("duplicate event definition id `{id}`")]
    DuplicateEventId { id: String },
    #[error("event definition `{id}` has no narrative variants")]
    EmptyEventDef { id: String },
    #[error("event definition `{id}` carries a negative daily cost {value:.2}")]
    NegativeCost { id: String, value: f64 },
}

fn choice(label: &str) -> Mitigation {
    Mitigation::noop(label)
}

/// The stock registry: state-of-the-nation, panic, seasonal, and vaccination
/// event families. Narrative strings are opaque payload for the embedder.
#[must_use]
pub fn default_registry() -> EventRegistry {
    let mut defs = Vec::new();

    defs.push(EventDef {
        id: "first_death".to_string(),
        condition: Condition::DeathsToday { at_least: 1.0 },
        cooldown_days: 900,
        variants: vec![EventVariant {
            title: "The first casualty".to_string(),
            text: Some("What will the government do?".to_string()),
            help: None,
            effects: Vec::new(),
            choices: vec![
                choice("Nothing"),
                Mitigation {
                    label: "Leaflet campaign".to_string(),
                    duration_days: 14,
                    r_mult: 0.9,
                    cost_per_day: 1_000_000.0,
                    stability_cost_per_day: 0.0,
                    vaccination_per_day: 0.0,
                    exposed_shock: 0.0,
                },
            ],
        }],
    });

    defs.push(EventDef {
        id: "cost_first_billion".to_string(),
        condition: Condition::CostTotal {
            at_least: 1_000_000_000.0,
        },
        cooldown_days: 900,
        variants: vec![EventVariant::headline(
            "Economy: the first billion in costs!",
        )],
    });

    defs.push(EventDef {
        id: "vaccination_half".to_string(),
        condition: Condition::VaccinationAtLeast { rate: 0.5 },
        cooldown_days: 900,
        variants: vec![EventVariant {
            title: "Vaccination on track".to_string(),
            text: Some("Half of the population has been vaccinated.".to_string()),
            help: None,
            effects: Vec::new(),
            choices: Vec::new(),
        }],
    });

    defs.push(EventDef {
        id: "stability_slipping".to_string(),
        condition: Condition::StabilityAtMost { value: 25.0 },
        cooldown_days: 30,
        variants: vec![EventVariant::headline("Trust in the government is falling")],
    });

    defs.push(EventDef {
        id: "stability_frustration".to_string(),
        condition: Condition::StabilityAtMost { value: 0.0 },
        cooldown_days: 30,
        variants: vec![EventVariant::headline(
            "The public is frustrated with the pandemic",
        )],
    });

    defs.push(EventDef {
        id: "stability_critical".to_string(),
        condition: Condition::StabilityAtMost { value: -30.0 },
        cooldown_days: 30,
        variants: vec![EventVariant {
            title: "The opposition calls for resignation!".to_string(),
            text: None,
            help: Some(
                "Social stability is critical. At -50 your game is over.".to_string(),
            ),
            effects: Vec::new(),
            choices: Vec::new(),
        }],
    });

    defs.push(EventDef {
        id: "panic_isolation".to_string(),
        condition: Condition::All {
            conditions: vec![
                Condition::DeathsAvg7Day {
                    at_least: 2500.0 / 7.0,
                },
                Condition::Chance { p: 0.05 },
            ],
        },
        cooldown_days: 14,
        variants: vec![EventVariant {
            title: "Thousands dead in a single week".to_string(),
            text: Some(
                "The critical situation drives people into isolation wherever possible."
                    .to_string(),
            ),
            help: Some("Isolation is costly but sharply reduces R.".to_string()),
            effects: Vec::new(),
            choices: vec![Mitigation {
                label: "OK".to_string(),
                duration_days: 14,
                r_mult: 0.7,
                cost_per_day: 1_095_000_000.0,
                stability_cost_per_day: 0.525,
                vaccination_per_day: 0.0,
                exposed_shock: 0.0,
            }],
        }],
    });

    defs.push(EventDef {
        id: "daily_death_toll".to_string(),
        condition: Condition::DeathsToday { at_least: 10.0 },
        cooldown_days: 7,
        variants: vec![
            EventVariant::headline("The virus killed dozens in a single day"),
            EventVariant::headline("Dozens dead in one day"),
            EventVariant {
                title: "Shock: dozens dead in a single day".to_string(),
                text: Some("The prime minister issued a statement.".to_string()),
                help: None,
                effects: Vec::new(),
                choices: Vec::new(),
            },
        ],
    });

    defs.push(EventDef {
        id: "record_daily_deaths".to_string(),
        condition: Condition::DeathsToday { at_least: 10.0 },
        cooldown_days: 900,
        variants: vec![EventVariant {
            title: "A record number of deaths in one day".to_string(),
            text: None,
            help: Some("Rising death tolls erode social stability.".to_string()),
            effects: Vec::new(),
            choices: vec![Mitigation {
                label: "OK".to_string(),
                duration_days: 1,
                r_mult: 1.0,
                cost_per_day: 0.0,
                stability_cost_per_day: 2.0,
                vaccination_per_day: 0.0,
                exposed_shock: 0.0,
            }],
        }],
    });

    defs.push(EventDef {
        id: "summer_break_start".to_string(),
        condition: Condition::SeasonalDate {
            mmdd: "06-30".to_string(),
        },
        cooldown_days: 90,
        variants: vec![EventVariant {
            title: "School's out".to_string(),
            text: Some("Pupils get their report cards and the holidays begin.".to_string()),
            help: None,
            effects: Vec::new(),
            choices: Vec::new(),
        }],
    });

    defs.push(EventDef {
        id: "summer_break_end".to_string(),
        condition: Condition::SeasonalDate {
            mmdd: "09-01".to_string(),
        },
        cooldown_days: 90,
        variants: vec![EventVariant {
            title: "Back to school".to_string(),
            text: Some("Should we expect the situation to worsen?".to_string()),
            help: None,
            effects: Vec::new(),
            choices: Vec::new(),
        }],
    });

    defs.push(EventDef {
        id: "warm_weather".to_string(),
        condition: Condition::SeasonalWindow {
            from: "05-20".to_string(),
            to: "06-14".to_string(),
        },
        cooldown_days: 90,
        variants: vec![EventVariant::headline(
            "The virus spreads poorly in warm weather",
        )],
    });

    defs.push(EventDef {
        id: "cold_weather".to_string(),
        condition: Condition::SeasonalWindow {
            from: "09-10".to_string(),
            to: "10-09".to_string(),
        },
        cooldown_days: 90,
        variants: vec![EventVariant::headline(
            "Cold weather helps the virus spread, epidemiologists warn",
        )],
    });

    defs.push(EventDef {
        id: "autumn_scandals".to_string(),
        condition: Condition::SeasonalWindow {
            from: "10-15".to_string(),
            to: "12-01".to_string(),
        },
        cooldown_days: 0,
        variants: vec![
            EventVariant {
                title: "Minister breaks his own rules".to_string(),
                text: Some(
                    "Over twenty guests were spotted at a party in his villa.".to_string(),
                ),
                help: None,
                effects: Vec::new(),
                choices: vec![
                    Mitigation {
                        label: "Sack the minister".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 0.0,
                        vaccination_per_day: -0.0001,
                        exposed_shock: 0.0,
                    },
                    Mitigation {
                        label: "Let it slide".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 5.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                ],
            },
            EventVariant {
                title: "Exposed: overpriced contracts worth billions!".to_string(),
                text: Some(
                    "A tracing supplier charges far more than the going rate, yet we depend on them."
                        .to_string(),
                ),
                help: None,
                effects: Vec::new(),
                choices: vec![
                    Mitigation {
                        label: "Keep the supplier".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 5_000_000_000.0,
                        stability_cost_per_day: 0.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                    Mitigation {
                        label: "Switch suppliers".to_string(),
                        duration_days: 1,
                        r_mult: 1.05,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 0.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                ],
            },
            EventVariant {
                title: "Prominent politician refuses to wear a mask".to_string(),
                text: None,
                help: None,
                effects: Vec::new(),
                choices: vec![
                    Mitigation {
                        label: "Let it slide".to_string(),
                        duration_days: 1,
                        r_mult: 1.02,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 0.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 1_500.0,
                    },
                    Mitigation {
                        label: "Punish him like anyone else".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 2.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                ],
            },
        ],
    });

    defs.push(EventDef {
        id: "winter_holidays".to_string(),
        condition: Condition::SeasonalWindow {
            from: "12-02".to_string(),
            to: "02-14".to_string(),
        },
        cooldown_days: 0,
        variants: vec![
            EventVariant {
                title: "Should the ski resorts open?".to_string(),
                text: None,
                help: Some(
                    "Opening adds thousands of infections; closing hurts stability.".to_string(),
                ),
                effects: Vec::new(),
                choices: vec![
                    Mitigation {
                        label: "Open the resorts".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 0.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 3_500.0,
                    },
                    Mitigation {
                        label: "Keep them closed".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 5.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                ],
            },
            EventVariant {
                title: "Christmas under the pandemic".to_string(),
                text: Some(
                    "Rules can be tightened for the holidays, or exemptions granted.".to_string(),
                ),
                help: None,
                effects: Vec::new(),
                choices: vec![
                    Mitigation {
                        label: "Allow midnight mass".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: -2.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 1_000.0,
                    },
                    Mitigation {
                        label: "Allow family gatherings".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: -2.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 1_500.0,
                    },
                    Mitigation {
                        label: "Ban both".to_string(),
                        duration_days: 1,
                        r_mult: 1.0,
                        cost_per_day: 0.0,
                        stability_cost_per_day: 5.0,
                        vaccination_per_day: 0.0,
                        exposed_shock: 0.0,
                    },
                ],
            },
        ],
    });

    defs.push(EventDef {
        id: "vaccine_last_phase".to_string(),
        condition: Condition::SeasonalWindow {
            from: "10-25".to_string(),
            to: "11-25".to_string(),
        },
        cooldown_days: 900,
        variants: vec![EventVariant {
            title: "Vaccine trials enter the final phase".to_string(),
            text: Some(
                "The state ordered millions of doses through a joint purchase.".to_string(),
            ),
            help: Some("A successful vaccine rollout boosts social stability.".to_string()),
            effects: Vec::new(),
            choices: vec![Mitigation {
                label: "OK".to_string(),
                duration_days: 1,
                r_mult: 1.0,
                cost_per_day: 0.0,
                stability_cost_per_day: -10.0,
                vaccination_per_day: 0.0,
                exposed_shock: 0.0,
            }],
        }],
    });

    defs.push(EventDef {
        id: "antivax_hoax".to_string(),
        condition: Condition::AfterDate {
            date: NaiveDate::from_ymd_opt(2021, 1, 10).expect("valid date"),
            chance: 0.02,
        },
        cooldown_days: 7,
        variants: vec![EventVariant {
            title: "A vaccine hoax is spreading".to_string(),
            text: None,
            help: Some("The vaccination rate is slowing down.".to_string()),
            effects: Vec::new(),
            choices: vec![Mitigation {
                label: "OK".to_string(),
                duration_days: 1,
                r_mult: 1.0,
                cost_per_day: 0.0,
                stability_cost_per_day: 0.0,
                vaccination_per_day: -0.0002,
                exposed_shock: 0.0,
            }],
        }],
    });

    EventRegistry::from_defs(defs)
}
