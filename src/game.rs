//! Simulation orchestration: the day loop, playback speed, decision flow,
//! and backward navigation.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::data::EventVariant;
use crate::mitigations::MitigationLedger;
use crate::model;
use crate::rng::day_rng;
use crate::scenario::{ScenarioConfig, ScenarioError};
use crate::scheduler::EventScheduler;
use crate::state::{DayState, Stats, TriggeredEvents};
use crate::summary::MitigationRecord;

/// Playback speed requested by the embedder. The engine itself never sleeps;
/// `Play` and `Fwd` only label the cadence the caller drives. `Max` runs the
/// simulation forward synchronously until it finishes or a decision becomes
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    Paused,
    Play,
    Fwd,
    Rev,
    Max,
    Finished,
}

/// Operational errors from stepping the simulation. All leave the game
/// unchanged; none are fatal to the instance.
#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("a narrative decision is pending; resolve it before advancing")]
    DecisionPending,
    #[error("the simulation has reached its terminal state")]
    Finished,
    #[error("cannot step backward past the initial day")]
    AtInitialDay,
    #[error("no narrative decision is pending")]
    NoPendingDecision,
    #[error("choice index {index} out of range ({available} available)")]
    UnknownChoice { index: usize, available: usize },
}

/// A narrative decision awaiting the player.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDecision {
    pub def_id: String,
    pub variant: EventVariant,
    /// Day index the decision was raised on.
    pub day_index: u32,
}

/// Result of one forward step.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOutcome {
    pub state: DayState,
    /// Ids of events that fired this day, in declaration order.
    pub triggered: TriggeredEvents,
    /// The step raised at least one decision; the game paused itself.
    pub decision_pending: bool,
    /// The step reached a terminal condition.
    pub ended: bool,
}

/// One full simulation instance. Single-threaded by design; embedders that
/// want concurrency wrap the whole game in their own synchronization.
#[derive(Debug, Clone)]
pub struct Game {
    scenario: ScenarioConfig,
    seed: u64,
    history: Vec<DayState>,
    ledger: MitigationLedger,
    scheduler: EventScheduler,
    pending: VecDeque<PendingDecision>,
    speed: Speed,
    /// Speed to restore once all pending decisions are resolved.
    held_speed: Speed,
    mitigation_history: Vec<MitigationRecord>,
}

impl Game {
    /// Build a game from a validated scenario and seed day zero.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError` when the scenario fails validation.
    pub fn new(scenario: ScenarioConfig, seed: u64) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let stats = Stats {
            new_infections: scenario.start_infected,
            cumulative_infections: scenario.start_infected,
            active_infections: scenario.start_infected,
            stability: scenario.initial_stability,
            ..Stats::default()
        };
        let history = vec![DayState::new(scenario.start_date, stats)];
        log::info!(
            "new game: seed {seed}, start {}, population {:.0}",
            scenario.start_date,
            scenario.population
        );
        Ok(Self {
            scenario,
            seed,
            history,
            ledger: MitigationLedger::new(),
            scheduler: EventScheduler::new(),
            pending: VecDeque::new(),
            speed: Speed::Paused,
            held_speed: Speed::Paused,
            mitigation_history: Vec::new(),
        })
    }

    /// Advance the simulation by one day.
    ///
    /// # Errors
    ///
    /// `DecisionPending` when an unresolved decision blocks the step,
    /// `Finished` when the simulation already reached its terminal state.
    pub fn step_forward(&mut self) -> Result<DayOutcome, StepError> {
        if !self.pending.is_empty() {
            return Err(StepError::DecisionPending);
        }
        if self.speed == Speed::Finished {
            return Err(StepError::Finished);
        }

        let day = self.history.len() as u32;
        let effects = self.ledger.tick();
        let stats = model::next_stats(&self.history, &effects, &self.scenario);
        let date = self
            .scenario
            .start_date
            .checked_add_days(Days::new(u64::from(day)))
            .unwrap_or(NaiveDate::MAX);
        let mut day_state = DayState::new(date, stats);

        let mut rng = day_rng(self.seed, day);
        let fired = self
            .scheduler
            .evaluate(day, &day_state, &self.scenario.registry, &mut rng);

        let mut decision_pending = false;
        for event in fired {
            day_state.triggered_events.push(event.def_id.clone());
            for effect in &event.variant.effects {
                self.ledger.activate(effect.clone(), day);
                self.mitigation_history.push(MitigationRecord {
                    day_index: day,
                    date,
                    label: effect.label.clone(),
                });
            }
            if event.requires_decision {
                decision_pending = true;
                self.pending.push_back(PendingDecision {
                    def_id: event.def_id,
                    variant: event.variant,
                    day_index: day,
                });
            }
        }
        if decision_pending {
            self.held_speed = self.speed;
            self.speed = Speed::Paused;
        }

        day_state.active_mitigations = self.ledger.snapshot();
        let ended = self.is_terminal(&day_state);
        let triggered = day_state.triggered_events.clone();
        self.history.push(day_state.clone());
        if ended {
            log::info!("game over on day {day} ({date})");
            self.speed = Speed::Finished;
            self.pending.clear();
            decision_pending = false;
        }
        Ok(DayOutcome {
            state: day_state,
            triggered,
            decision_pending,
            ended,
        })
    }

    /// Rewind the simulation by one day, restoring ledger and scheduler
    /// state so the replayed day is identical to the original pass.
    ///
    /// # Errors
    ///
    /// `AtInitialDay` when only the seeded day remains.
    pub fn step_backward(&mut self) -> Result<&DayState, StepError> {
        if self.history.len() <= 1 {
            return Err(StepError::AtInitialDay);
        }
        self.history.pop();
        let new_len = self.history.len() as u32;
        self.pending.retain(|decision| decision.day_index < new_len);
        self.mitigation_history
            .retain(|record| record.day_index < new_len);
        self.scheduler.rollback(new_len);
        let snapshot = self
            .history
            .last()
            .map(|day| day.active_mitigations.clone())
            .unwrap_or_default();
        self.ledger.restore(snapshot);
        if self.speed == Speed::Finished {
            self.speed = Speed::Paused;
        }
        Ok(self.current_state())
    }

    /// Resolve the oldest pending decision by choice index.
    ///
    /// # Errors
    ///
    /// `NoPendingDecision` when nothing is pending, `UnknownChoice` when the
    /// index does not name a choice of the pending variant.
    pub fn resolve_decision(&mut self, index: usize) -> Result<(), StepError> {
        let Some(decision) = self.pending.front() else {
            return Err(StepError::NoPendingDecision);
        };
        let available = decision.variant.choices.len();
        if index >= available {
            return Err(StepError::UnknownChoice { index, available });
        }
        let decision = self
            .pending
            .pop_front()
            .ok_or(StepError::NoPendingDecision)?;
        let choice = decision.variant.choices[index].clone();
        log::debug!(
            "day {}: decision `{}` resolved with `{}`",
            decision.day_index,
            decision.def_id,
            choice.label
        );
        let date = self.current_state().date;
        self.ledger.activate(choice.clone(), decision.day_index);
        self.mitigation_history.push(MitigationRecord {
            day_index: decision.day_index,
            date,
            label: choice.label,
        });
        // Keep the day snapshot authoritative for backward navigation.
        if let Some(last) = self.history.last_mut() {
            last.active_mitigations = self.ledger.snapshot();
        }
        if self.pending.is_empty() && self.speed == Speed::Paused {
            self.speed = self.held_speed;
            if self.speed == Speed::Max {
                self.run_to_completion();
            }
        }
        Ok(())
    }

    /// Set the playback speed. `Max` synchronously runs the simulation until
    /// it finishes or a decision becomes pending. Ignored once the
    /// simulation has finished; stepping backward is the only way out of the
    /// terminal state.
    pub fn set_speed(&mut self, speed: Speed) {
        if self.speed == Speed::Finished {
            return;
        }
        self.speed = speed;
        self.held_speed = speed;
        if speed == Speed::Max {
            self.run_to_completion();
        }
    }

    /// Step until the terminal state or until a decision becomes pending,
    /// whichever comes first. Pending decisions are left for the caller to
    /// resolve; resolving the last one resumes the run while the held speed
    /// is `Max`.
    ///
    /// The loop has no bound of its own: a scenario with no reachable
    /// terminal condition (no end date, no stability floor, a fading
    /// outbreak) will not return. Configure `end_date` for bounded runs.
    pub fn run_to_completion(&mut self) {
        while self.speed != Speed::Finished && self.pending.is_empty() {
            match self.step_forward() {
                Ok(outcome) if outcome.decision_pending => break,
                Ok(_) => {}
                Err(_) => break,
            }
        }
    }

    fn is_terminal(&self, day: &DayState) -> bool {
        if day.stats.deaths.total >= self.scenario.population {
            return true;
        }
        if let Some(floor) = self.scenario.stability_floor
            && day.stats.stability <= floor
        {
            return true;
        }
        if let Some(end) = self.scenario.end_date
            && day.date >= end
        {
            return true;
        }
        false
    }

    #[must_use]
    pub fn current_state(&self) -> &DayState {
        // History always holds the seeded day zero.
        &self.history[self.history.len() - 1]
    }

    #[must_use]
    pub fn history(&self) -> &[DayState] {
        &self.history
    }

    #[must_use]
    pub fn pending_decision(&self) -> Option<&PendingDecision> {
        self.pending.front()
    }

    #[must_use]
    pub fn speed(&self) -> Speed {
        self.speed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.speed == Speed::Finished
    }

    #[must_use]
    pub fn scenario(&self) -> &ScenarioConfig {
        &self.scenario
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub(crate) fn mitigation_history(&self) -> &[MitigationRecord] {
        &self.mitigation_history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Condition, EventDef, EventRegistry, Mitigation};

    fn quiet_scenario() -> ScenarioConfig {
        ScenarioConfig {
            population: 1_000_000.0,
            start_infected: 10.0,
            ..ScenarioConfig::default()
        }
    }

    fn decision_registry() -> EventRegistry {
        let mut lockdown = Mitigation::noop("lockdown");
        lockdown.duration_days = 14;
        lockdown.r_mult = 0.5;
        EventRegistry::from_defs(vec![EventDef {
            id: "outbreak".to_string(),
            condition: Condition::ActiveInfections { at_least: 1.0 },
            cooldown_days: 900,
            variants: vec![crate::data::EventVariant {
                title: "outbreak".to_string(),
                text: None,
                help: None,
                effects: Vec::new(),
                choices: vec![Mitigation::noop("ignore"), lockdown],
            }],
        }])
    }

    #[test]
    fn new_game_seeds_day_zero() {
        let game = Game::new(quiet_scenario(), 1).unwrap();
        assert_eq!(game.history().len(), 1);
        let day = game.current_state();
        assert_eq!(day.date, game.scenario().start_date);
        assert!((day.stats.active_infections - 10.0).abs() < f64::EPSILON);
        assert!((day.stats.stability - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_scenario_is_rejected() {
        let scenario = ScenarioConfig {
            population: -1.0,
            ..ScenarioConfig::default()
        };
        assert!(Game::new(scenario, 1).is_err());
    }

    #[test]
    fn step_forward_appends_one_day() {
        let mut game = Game::new(quiet_scenario(), 1).unwrap();
        let outcome = game.step_forward().unwrap();
        assert_eq!(game.history().len(), 2);
        assert_eq!(
            outcome.state.date,
            game.scenario().start_date.succ_opt().unwrap()
        );
        assert!(!outcome.ended);
    }

    #[test]
    fn pending_decision_blocks_forward_steps() {
        let scenario = ScenarioConfig {
            registry: decision_registry(),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        let outcome = game.step_forward().unwrap();
        assert!(outcome.decision_pending);
        assert_eq!(game.speed(), Speed::Paused);
        assert_eq!(game.step_forward(), Err(StepError::DecisionPending));

        assert_eq!(
            game.resolve_decision(5),
            Err(StepError::UnknownChoice {
                index: 5,
                available: 2
            })
        );
        game.resolve_decision(1).unwrap();
        assert!(game.pending_decision().is_none());
        game.step_forward().unwrap();
    }

    #[test]
    fn resolve_without_pending_is_an_error() {
        let mut game = Game::new(quiet_scenario(), 1).unwrap();
        assert_eq!(game.resolve_decision(0), Err(StepError::NoPendingDecision));
    }

    #[test]
    fn decision_choice_lands_in_day_snapshot() {
        let scenario = ScenarioConfig {
            registry: decision_registry(),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.step_forward().unwrap();
        game.resolve_decision(1).unwrap();
        let snapshot = &game.current_state().active_mitigations;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].mitigation.label, "lockdown");
    }

    #[test]
    fn backward_stops_at_day_zero() {
        let mut game = Game::new(quiet_scenario(), 1).unwrap();
        assert_eq!(game.step_backward(), Err(StepError::AtInitialDay));
        game.step_forward().unwrap();
        game.step_backward().unwrap();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.step_backward(), Err(StepError::AtInitialDay));
    }

    #[test]
    fn backward_then_forward_replays_identically() {
        let mut game = Game::new(ScenarioConfig::czechia(), 77).unwrap();
        for _ in 0..30 {
            while game.pending_decision().is_some() {
                game.resolve_decision(0).unwrap();
            }
            game.step_forward().unwrap();
        }
        let original = game.history().to_vec();

        for _ in 0..10 {
            game.step_backward().unwrap();
        }
        for _ in 0..10 {
            while game.pending_decision().is_some() {
                game.resolve_decision(0).unwrap();
            }
            game.step_forward().unwrap();
        }
        assert_eq!(game.history(), &original[..]);
    }

    #[test]
    fn max_speed_runs_to_completion() {
        let scenario = ScenarioConfig {
            end_date: Some("2020-03-21".parse().unwrap()),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.set_speed(Speed::Max);
        assert!(game.is_finished());
        assert_eq!(game.current_state().date, "2020-03-21".parse().unwrap());
        assert_eq!(game.step_forward(), Err(StepError::Finished));
    }

    #[test]
    fn run_to_completion_yields_on_pending_decision() {
        let scenario = ScenarioConfig {
            registry: decision_registry(),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.set_speed(Speed::Max);

        // The outbreak decision fires on day 1; the run must stop there and
        // leave the choice to the player, not pick one itself.
        assert!(!game.is_finished());
        assert_eq!(game.history().len(), 2);
        let decision = game.pending_decision().expect("decision left pending");
        assert_eq!(decision.def_id, "outbreak");
        assert!(game.export_summary().mitigation_history.is_empty());
    }

    #[test]
    fn resolving_under_max_speed_resumes_the_run() {
        let scenario = ScenarioConfig {
            registry: decision_registry(),
            end_date: Some("2020-03-21".parse().unwrap()),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.set_speed(Speed::Max);
        assert!(game.pending_decision().is_some());

        game.resolve_decision(0).unwrap();
        assert!(game.is_finished());
        assert_eq!(game.current_state().date, "2020-03-21".parse().unwrap());
    }

    #[test]
    fn stability_floor_ends_the_game() {
        let mut chaos = Mitigation::noop("chaos");
        chaos.duration_days = 365;
        chaos.stability_cost_per_day = 120.0;
        let registry = EventRegistry::from_defs(vec![EventDef {
            id: "chaos".to_string(),
            condition: Condition::ActiveInfections { at_least: 0.0 },
            cooldown_days: 900,
            variants: vec![crate::data::EventVariant {
                title: "chaos".to_string(),
                text: None,
                help: None,
                effects: vec![chaos],
                choices: Vec::new(),
            }],
        }]);
        let scenario = ScenarioConfig {
            registry,
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.step_forward().unwrap();
        let outcome = game.step_forward().unwrap();
        assert!(outcome.ended, "stability {}", game.current_state().stats.stability);
        assert!(game.is_finished());
    }

    #[test]
    fn backward_after_finish_resumes_play() {
        let scenario = ScenarioConfig {
            end_date: Some("2020-03-05".parse().unwrap()),
            ..quiet_scenario()
        };
        let mut game = Game::new(scenario, 1).unwrap();
        game.run_to_completion();
        assert!(game.is_finished());
        game.step_backward().unwrap();
        assert!(!game.is_finished());
        game.step_forward().unwrap();
        assert!(game.is_finished());
    }
}
