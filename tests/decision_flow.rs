//! Decision gating, cooldowns, and backward navigation across the public
//! API, with a minimal custom registry.

use anyhow::Result;
use pandemia_game::{
    Condition, EventDef, EventRegistry, EventVariant, Game, Mitigation, ScenarioConfig, Speed,
    StepError,
};

fn lockdown() -> Mitigation {
    Mitigation {
        label: "lockdown".to_string(),
        duration_days: 14,
        r_mult: 0.5,
        cost_per_day: 1_000_000.0,
        stability_cost_per_day: 0.2,
        vaccination_per_day: 0.0,
        exposed_shock: 0.0,
    }
}

fn outbreak_registry(cooldown_days: u32) -> EventRegistry {
    EventRegistry::from_defs(vec![EventDef {
        id: "outbreak_response".to_string(),
        condition: Condition::ActiveInfections { at_least: 1.0 },
        cooldown_days,
        variants: vec![EventVariant {
            title: "outbreak response".to_string(),
            text: None,
            help: None,
            effects: Vec::new(),
            choices: vec![Mitigation::noop("do nothing"), lockdown()],
        }],
    }])
}

fn scenario(registry: EventRegistry) -> ScenarioConfig {
    ScenarioConfig {
        population: 1_000_000.0,
        start_infected: 100.0,
        registry,
        ..ScenarioConfig::default()
    }
}

#[test]
fn decision_pauses_playback_and_blocks_stepping() -> Result<()> {
    let mut game = Game::new(scenario(outbreak_registry(900)), 5)?;
    game.set_speed(Speed::Play);

    let outcome = game.step_forward()?;
    assert!(outcome.decision_pending);
    assert_eq!(outcome.triggered.as_slice(), ["outbreak_response"]);
    assert_eq!(game.speed(), Speed::Paused);
    assert_eq!(game.step_forward(), Err(StepError::DecisionPending));

    game.resolve_decision(0)?;
    assert_eq!(game.speed(), Speed::Play, "held speed restored after resolve");
    game.step_forward()?;
    Ok(())
}

#[test]
fn chosen_mitigation_takes_effect_the_next_day() -> Result<()> {
    let run = |choice: usize| -> Result<f64> {
        let mut game = Game::new(scenario(outbreak_registry(900)), 5)?;
        game.step_forward()?;
        game.resolve_decision(choice)?;
        for _ in 0..5 {
            game.step_forward()?;
        }
        Ok(game.current_state().stats.cumulative_infections)
    };
    let unmitigated = run(0)?;
    let locked_down = run(1)?;
    assert!(
        locked_down < unmitigated,
        "lockdown must slow the outbreak ({locked_down} vs {unmitigated})"
    );
    Ok(())
}

#[test]
fn cooldown_spaces_repeat_firings() -> Result<()> {
    let mut game = Game::new(scenario(outbreak_registry(10)), 5)?;
    let mut fire_days = Vec::new();
    for day in 1..=25u32 {
        while game.pending_decision().is_some() {
            game.resolve_decision(0)?;
        }
        let outcome = game.step_forward()?;
        if !outcome.triggered.is_empty() {
            fire_days.push(day);
        }
    }
    assert_eq!(fire_days, vec![1, 11, 21]);
    Ok(())
}

#[test]
fn rewinding_past_a_decision_replays_it() -> Result<()> {
    let mut game = Game::new(scenario(outbreak_registry(900)), 5)?;
    game.step_forward()?;
    game.resolve_decision(1)?;
    for _ in 0..5 {
        game.step_forward()?;
    }
    let original = game.history().to_vec();

    // Rewind all the way past the decision day.
    while game.history().len() > 1 {
        game.step_backward()?;
    }
    assert!(game.pending_decision().is_none());
    assert_eq!(game.step_backward(), Err(StepError::AtInitialDay));

    // The event fires again, and the same choice reproduces the same run.
    let outcome = game.step_forward()?;
    assert!(outcome.decision_pending);
    game.resolve_decision(1)?;
    for _ in 0..5 {
        game.step_forward()?;
    }
    assert_eq!(game.history(), &original[..]);
    Ok(())
}

#[test]
fn partial_rewind_keeps_earlier_mitigations_active() -> Result<()> {
    let mut game = Game::new(scenario(outbreak_registry(900)), 5)?;
    game.step_forward()?;
    game.resolve_decision(1)?;
    for _ in 0..5 {
        game.step_forward()?;
    }
    game.step_backward()?;
    game.step_backward()?;

    let active = &game.current_state().active_mitigations;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].mitigation.label, "lockdown");
    Ok(())
}

#[test]
fn summary_records_decision_history() -> Result<()> {
    let mut game = Game::new(scenario(outbreak_registry(900)), 5)?;
    game.step_forward()?;
    game.resolve_decision(1)?;
    for _ in 0..3 {
        game.step_forward()?;
    }

    let summary = game.export_summary();
    assert_eq!(summary.days, 4);
    assert_eq!(summary.mitigation_history.len(), 1);
    assert_eq!(summary.mitigation_history[0].label, "lockdown");
    assert_eq!(summary.mitigation_history[0].day_index, 1);
    assert!(
        summary
            .mitigation_params
            .iter()
            .any(|m| m.label == "lockdown")
    );
    Ok(())
}

#[test]
fn registry_loads_from_json() -> Result<()> {
    let json = r#"{
        "defs": [{
            "id": "toll",
            "condition": { "kind": "deaths_today", "at_least": 10.0 },
            "cooldown_days": 7,
            "variants": [{ "title": "Dozens dead in one day" }]
        }]
    }"#;
    let registry = EventRegistry::from_json(json)?;
    let config = ScenarioConfig {
        registry,
        ..ScenarioConfig::default()
    };
    config.validate()?;
    assert_eq!(config.registry.defs.len(), 1);
    assert_eq!(config.registry.defs[0].cooldown_days, 7);
    Ok(())
}
