//! Event evaluation and firing history.

use rand::Rng;
use std::collections::HashMap;

use crate::data::{EventRegistry, EventVariant};
use crate::state::DayState;

/// An event that fired on the current day, with its chosen variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredEvent {
    pub def_id: String,
    pub variant: EventVariant,
    /// True when the variant offers choices the player must resolve before
    /// the simulation may advance.
    pub requires_decision: bool,
}

/// Evaluates event definitions against day snapshots and remembers when each
/// definition last fired, for cooldown gating and backward navigation.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    /// Fire days per definition id, in ascending order.
    fired: HashMap<String, Vec<u32>>,
}

impl EventScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every definition against the day snapshot, in declaration
    /// order. A definition fires at most once per day, and not while its
    /// cooldown from the previous firing is still running.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        day: u32,
        state: &DayState,
        registry: &EventRegistry,
        rng: &mut R,
    ) -> Vec<FiredEvent> {
        let mut fired = Vec::new();
        for def in &registry.defs {
            if let Some(last) = self.last_fire_day(&def.id)
                && day.saturating_sub(last) < def.cooldown_days.max(1)
            {
                continue;
            }
            if !def.condition.evaluate(state, rng) {
                continue;
            }
            let variant = if def.variants.len() == 1 {
                def.variants[0].clone()
            } else {
                def.variants[rng.gen_range(0..def.variants.len())].clone()
            };
            log::debug!("day {day}: event `{}` fired ({})", def.id, variant.title);
            self.fired.entry(def.id.clone()).or_default().push(day);
            let requires_decision = variant.requires_decision();
            fired.push(FiredEvent {
                def_id: def.id.clone(),
                variant,
                requires_decision,
            });
        }
        fired
    }

    /// Forget firings on day `new_len` and later, so re-stepping forward
    /// after backward navigation sees the same cooldown state as the
    /// original pass.
    pub fn rollback(&mut self, new_len: u32) {
        for days in self.fired.values_mut() {
            days.retain(|&day| day < new_len);
        }
        self.fired.retain(|_, days| !days.is_empty());
    }

    #[must_use]
    pub fn last_fire_day(&self, def_id: &str) -> Option<u32> {
        self.fired.get(def_id).and_then(|days| days.last().copied())
    }
}
