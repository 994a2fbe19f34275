//! Pandemia: a deterministic, replayable epidemic-management game engine.
//!
//! The crate simulates a national epidemic one day at a time. A discrete
//! delay-based model ([`model`]) produces daily statistics, narrative events
//! ([`data`], [`scheduler`]) fire against those statistics, and the player's
//! responses become mitigations ([`mitigations`]) that feed back into the
//! model. The [`game::Game`] orchestrator ties the loop together with
//! playback control, pending-decision gating, and backward navigation.
//!
//! Given the same [`scenario::ScenarioConfig`] and seed, a run is bit-for-bit
//! reproducible, including after rewinding and re-stepping: all randomness
//! derives from per-day streams ([`rng`]).
//!
//! The engine is platform-agnostic and single-threaded. It never sleeps,
//! renders, or performs I/O; embedders drive the tick cadence and own any
//! synchronization.

pub mod data;
pub mod game;
pub mod mitigations;
pub mod model;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod state;
pub mod summary;

pub use data::{Condition, EventDef, EventRegistry, EventVariant, Mitigation};
pub use game::{DayOutcome, Game, PendingDecision, Speed, StepError};
pub use mitigations::{ActiveMitigation, AggregateEffects, MitigationLedger};
pub use scenario::{ScenarioConfig, ScenarioError, default_registry};
pub use scheduler::{EventScheduler, FiredEvent};
pub use state::{CostStats, DayState, DeathStats, Stats, TriggeredEvents};
pub use summary::{GameSummary, MitigationRecord};
