//! The control-loop context
//!
//! One `Controller` owns all mutable loop state. Readings, history,
//! targets, and the action-value table sit behind a single mutex so that
//! `ingest`, `tick`, and `set_target` serialize: within one tick, a key's
//! select/apply/update sequence is a single critical section and two ticks
//! can never interleave on the same key. The actuator registry lives
//! outside the lock (concurrent map, last-writer-wins) so display reads
//! and manual overrides never block the loop.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::ControlConfig;
use crate::domain::action::Action;
use crate::domain::actuator::{ActuatorRegistry, ActuatorState, MappingKind, SensorMapping};
use crate::domain::qtable::QTable;
use crate::domain::recommend::{recommend, Recommendation};
use crate::error::{ControlError, Result};
use crate::infra::store::{HistoryEntry, HistoryLog, ReadingStore, TargetStore};

/// Result of one tick pass
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Keys that had both a reading and a target and were stepped
    pub keys_stepped: usize,
}

/// Counters exposed for dashboards and diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerStats {
    pub mapped_keys: usize,
    pub qtable_rows: usize,
    pub history_len: usize,
    pub history_capacity: usize,
    pub ticks_run: u64,
    pub last_keys_stepped: usize,
}

struct LoopState {
    readings: ReadingStore,
    history: HistoryLog,
    targets: TargetStore,
    qtable: QTable,
    ticks_run: u64,
    last_keys_stepped: usize,
}

/// Adaptive actuator control loop
pub struct Controller {
    config: ControlConfig,
    state: Mutex<LoopState>,
    registry: ActuatorRegistry,
}

impl Controller {
    /// Build a controller from configuration
    ///
    /// Everything is constructed eagerly: the registry gets its default
    /// states, the action-value table gets an all-zeros row per mapped
    /// key, and the target profile starts empty. Invalid configuration is
    /// rejected here, before the controller exists.
    pub fn new(config: ControlConfig) -> Result<Self> {
        if config.history_capacity == 0 {
            return Err(ControlError::Config(
                "history capacity must be positive".to_string(),
            ));
        }
        if !(config.learning_rate > 0.0 && config.learning_rate <= 1.0) {
            return Err(ControlError::Config(format!(
                "learning rate must be in (0, 1], got {}",
                config.learning_rate
            )));
        }
        if !(config.recommend_threshold.is_finite() && config.recommend_threshold >= 0.0) {
            return Err(ControlError::Config(format!(
                "recommend threshold must be a non-negative number, got {}",
                config.recommend_threshold
            )));
        }

        let registry = ActuatorRegistry::new(&config.actuators)?;

        let mut seen = std::collections::HashSet::new();
        for mapping in &config.mappings {
            if !seen.insert(mapping.key.as_str()) {
                return Err(ControlError::Config(format!(
                    "duplicate mapping for sensor key: {}",
                    mapping.key
                )));
            }
            for id in mapping.actuator_ids() {
                if !registry.contains(id) {
                    return Err(ControlError::Config(format!(
                        "mapping for {} references unknown actuator: {}",
                        mapping.key, id
                    )));
                }
            }
        }

        let qtable = QTable::with_keys(config.mapped_keys().map(str::to_string));
        let state = Mutex::new(LoopState {
            readings: ReadingStore::default(),
            history: HistoryLog::new(config.history_capacity),
            targets: TargetStore::default(),
            qtable,
            ticks_run: 0,
            last_keys_stepped: 0,
        });

        info!(
            mapped_keys = config.mappings.len(),
            actuators = config.actuators.len(),
            history_capacity = config.history_capacity,
            "controller initialized"
        );

        Ok(Self {
            config,
            state,
            registry,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Overwrite the latest reading for every key in the batch and append
    /// one history entry holding the full batch. Returns the key count.
    ///
    /// Values are accepted as-is; plausibility gating belongs to the
    /// caller.
    pub fn ingest(&self, readings: HashMap<String, f64>) -> usize {
        let mut state = self.state.lock();
        let count = state.readings.ingest(&readings);
        state.history.append(readings);
        debug!(count, history_len = state.history.len(), "ingested readings");
        count
    }

    /// One synchronous pass over the mapping table
    ///
    /// For every mapped key with both a reading and a target: select the
    /// greedy action, apply it to the actuators, then update the chosen
    /// action's estimate against the same (pre-actuation) reading. Keys
    /// missing either side are skipped silently; an actuator fault on one
    /// key never stops the pass.
    pub fn tick(&self) -> TickOutcome {
        let mut state = self.state.lock();
        let mut stepped = 0;

        for mapping in &self.config.mappings {
            let key = mapping.key.as_str();
            let (value, target) = match (state.readings.get(key), state.targets.get(key)) {
                (Some(v), Some(t)) => (v, t),
                _ => {
                    trace!(key, "skipped: reading or target absent");
                    continue;
                }
            };

            let action = state.qtable.select_action(key);
            self.apply_mapping(mapping, action, target);
            let reward = state.qtable.update_estimate(
                key,
                action,
                value,
                target,
                self.config.learning_rate,
            );
            debug!(key, %action, value, target, reward, "stepped");
            stepped += 1;
        }

        state.ticks_run += 1;
        state.last_keys_stepped = stepped;
        TickOutcome {
            keys_stepped: stepped,
        }
    }

    /// Snapshot of the latest reading per key
    pub fn latest(&self) -> HashMap<String, f64> {
        self.state.lock().readings.snapshot()
    }

    /// At most `limit` most-recent history entries, newest last
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.state.lock().history.recent(limit)
    }

    /// Snapshot of the current target profile
    pub fn target(&self) -> HashMap<String, f64> {
        self.state.lock().targets.snapshot()
    }

    /// Replace the target profile wholesale
    pub fn set_target(&self, targets: HashMap<String, f64>) {
        info!(keys = targets.len(), "target profile replaced");
        self.state.lock().targets.replace(targets);
    }

    /// Qualitative adjustment for a key at the configured threshold
    pub fn recommend(&self, key: &str) -> Recommendation {
        self.recommend_with(key, self.config.recommend_threshold)
    }

    /// Qualitative adjustment for a key at an explicit threshold
    ///
    /// Pure query: touches neither action values nor actuators.
    pub fn recommend_with(&self, key: &str, threshold: f64) -> Recommendation {
        let state = self.state.lock();
        recommend(state.readings.get(key), state.targets.get(key), threshold)
    }

    /// Current state of one actuator
    pub fn read_actuator(&self, id: &str) -> Result<ActuatorState> {
        self.registry.read(id)
    }

    /// Manual override: replace one actuator's state directly
    ///
    /// Bypasses the learning loop entirely; the next tick may overwrite
    /// it again (last-writer-wins).
    pub fn write_actuator(&self, id: &str, state: ActuatorState) -> Result<ActuatorState> {
        let stored = self.registry.write(id, state)?;
        debug!(id, ?stored, "manual actuator override");
        Ok(stored)
    }

    /// Snapshot of every actuator state
    pub fn actuators(&self) -> HashMap<String, ActuatorState> {
        self.registry.snapshot()
    }

    /// Action-value row snapshot for a key, if one exists yet
    pub fn action_values(&self, key: &str) -> Option<crate::domain::qtable::ActionValues> {
        self.state.lock().qtable.row(key)
    }

    /// Loop counters for dashboards
    pub fn stats(&self) -> ControllerStats {
        let state = self.state.lock();
        ControllerStats {
            mapped_keys: self.config.mappings.len(),
            qtable_rows: state.qtable.len(),
            history_len: state.history.len(),
            history_capacity: state.history.capacity(),
            ticks_run: state.ticks_run,
            last_keys_stepped: state.last_keys_stepped,
        }
    }

    fn apply_mapping(&self, mapping: &SensorMapping, action: Action, target: f64) {
        match &mapping.kind {
            MappingKind::ActionDriven { effects } => {
                for effect in effects {
                    let next = effect.state_for(action);
                    if let Err(err) = self.registry.write(effect.actuator(), next) {
                        warn!(key = %mapping.key, actuator = %effect.actuator(), %err,
                            "actuator write failed during tick");
                    }
                }
            }
            MappingKind::TargetSnap { actuator } => {
                if let Err(err) = self.registry.write(actuator, ActuatorState::Percent(target)) {
                    warn!(key = %mapping.key, actuator = %actuator, %err,
                        "target snap failed during tick");
                }
            }
        }
    }
}
