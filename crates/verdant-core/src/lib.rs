//! # Verdant Core
//!
//! Adaptive actuator control loop for aquaponics/greenhouse environments.
//!
//! Sensor readings flow in, get compared against a grower-chosen target
//! profile, and a per-sensor action-value table learns which corrective
//! action (decrease / maintain / increase) historically reduced the error.
//! The chosen action is translated into concrete actuator writes through a
//! static mapping table.
//!
//! ## Key Concepts
//!
//! - **Reading Store**: latest value per sensor key, overwritten on ingest
//! - **History Log**: bounded FIFO ring of timestamped reading snapshots
//! - **Q-Table**: per sensor key, one expected-reward estimate per action
//! - **Actuator Registry**: current state of every controllable device
//! - **Recommendation**: stateless "what should change" query
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Controller                         │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐      │
//! │  │ Ingest   │   │  Tick    │   │ Recommend /      │      │
//! │  │ readings │   │  loop    │   │ snapshots        │      │
//! │  └────┬─────┘   └────┬─────┘   └────────┬─────────┘      │
//! │       │              │                  │                │
//! │  ┌────┴──────────────┴──────────────────┴───────────┐    │
//! │  │  LoopState (readings, history, targets, q-table) │    │
//! │  └────────────────────────┬─────────────────────────┘    │
//! │                           │                              │
//! │  ┌────────────────────────┴─────────────────────────┐    │
//! │  │  ActuatorRegistry (heater, fan, valve, lights…)  │    │
//! │  └──────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport (REST, CLI) is an external collaborator's concern; the
//! controller is a plain `Send + Sync` object shared via `Arc`.

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod infra;

// Re-export core types
pub use config::{ControlConfig, GatewayConfig};
pub use controller::{Controller, ControllerStats, TickOutcome};
pub use domain::action::Action;
pub use domain::actuator::{
    ActuatorEffect, ActuatorKind, ActuatorRegistry, ActuatorSpec, ActuatorState, MappingKind,
    SensorMapping,
};
pub use domain::qtable::{ActionValues, QTable};
pub use domain::recommend::{recommend, Recommendation};
pub use error::{ControlError, Result};
pub use infra::store::{HistoryEntry, HistoryLog, Reading, ReadingStore, TargetStore};

/// Verdant core version
pub const VERDANT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bound on the history ring
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Default learning rate for action-value updates
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default relative band for recommendations (fraction of the target)
pub const DEFAULT_RECOMMEND_THRESHOLD: f64 = 0.05;
