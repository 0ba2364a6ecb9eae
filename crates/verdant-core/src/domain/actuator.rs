//! Actuator registry and the sensor-to-actuator mapping table
//!
//! Each sensor key maps to a fixed, inspectable description of its side
//! effects: either a set of action-driven effects (switches and per-action
//! percentages) or a target-snap that copies the configured target straight
//! into a percent actuator. The registry is the single source of truth for
//! device state; the mapper and direct external writes hit the same map,
//! last writer wins.

use std::collections::HashMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::error::{ControlError, Result};

/// Value kind an actuator accepts, fixed per device by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    /// On/off device (valve, heater, mister)
    Switch,
    /// 0-100 percentage device (fan, grow lights)
    Percent,
}

impl std::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActuatorKind::Switch => write!(f, "switch"),
            ActuatorKind::Percent => write!(f, "percent"),
        }
    }
}

/// Current state of one actuator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActuatorState {
    Switch(bool),
    Percent(f64),
}

impl ActuatorState {
    /// Kind of this state value
    pub fn kind(&self) -> ActuatorKind {
        match self {
            ActuatorState::Switch(_) => ActuatorKind::Switch,
            ActuatorState::Percent(_) => ActuatorKind::Percent,
        }
    }
}

/// One registered device: id, accepted kind, state at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorSpec {
    pub id: String,
    pub kind: ActuatorKind,
    pub default: ActuatorState,
}

impl ActuatorSpec {
    pub fn switch(id: &str, on: bool) -> Self {
        Self {
            id: id.to_string(),
            kind: ActuatorKind::Switch,
            default: ActuatorState::Switch(on),
        }
    }

    pub fn percent(id: &str, value: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: ActuatorKind::Percent,
            default: ActuatorState::Percent(value),
        }
    }
}

/// A single action-driven write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ActuatorEffect {
    /// Switch on exactly when the chosen action matches `when`, off otherwise
    SwitchOn { actuator: String, when: Action },
    /// Fixed percentage per action
    PercentByAction {
        actuator: String,
        decrease: f64,
        maintain: f64,
        increase: f64,
    },
}

impl ActuatorEffect {
    /// Actuator this effect writes to
    pub fn actuator(&self) -> &str {
        match self {
            ActuatorEffect::SwitchOn { actuator, .. } => actuator,
            ActuatorEffect::PercentByAction { actuator, .. } => actuator,
        }
    }

    /// State to write for the chosen action
    pub fn state_for(&self, action: Action) -> ActuatorState {
        match self {
            ActuatorEffect::SwitchOn { when, .. } => ActuatorState::Switch(action == *when),
            ActuatorEffect::PercentByAction {
                decrease,
                maintain,
                increase,
                ..
            } => {
                let pct = match action {
                    Action::Decrease => *decrease,
                    Action::Maintain => *maintain,
                    Action::Increase => *increase,
                };
                ActuatorState::Percent(pct)
            }
        }
    }
}

/// How one sensor key drives its actuators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MappingKind {
    /// Writes derived from the selected action; one key may drive several devices
    ActionDriven { effects: Vec<ActuatorEffect> },
    /// Ignores the action and copies the key's target into a percent actuator
    TargetSnap { actuator: String },
}

/// Mapping table entry for one sensor key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorMapping {
    pub key: String,
    #[serde(flatten)]
    pub kind: MappingKind,
}

impl SensorMapping {
    pub fn action_driven(key: &str, effects: Vec<ActuatorEffect>) -> Self {
        Self {
            key: key.to_string(),
            kind: MappingKind::ActionDriven { effects },
        }
    }

    pub fn target_snap(key: &str, actuator: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: MappingKind::TargetSnap {
                actuator: actuator.to_string(),
            },
        }
    }

    /// Actuator ids this mapping writes to
    pub fn actuator_ids(&self) -> Vec<&str> {
        match &self.kind {
            MappingKind::ActionDriven { effects } => {
                effects.iter().map(|e| e.actuator()).collect()
            }
            MappingKind::TargetSnap { actuator } => vec![actuator.as_str()],
        }
    }
}

/// Registry of every controllable device
///
/// Backed by a concurrent map so display reads and manual overrides never
/// block the tick loop. Every id exists from construction onward; writes
/// replace the stored state wholesale.
#[derive(Debug, Default)]
pub struct ActuatorRegistry {
    states: DashMap<String, ActuatorState>,
    kinds: HashMap<String, ActuatorKind>,
}

impl ActuatorRegistry {
    /// Build the registry from device specs, applying defaults
    pub fn new(specs: &[ActuatorSpec]) -> Result<Self> {
        let mut kinds = HashMap::with_capacity(specs.len());
        let states = DashMap::new();
        for spec in specs {
            if kinds.insert(spec.id.clone(), spec.kind).is_some() {
                return Err(ControlError::Config(format!(
                    "duplicate actuator id: {}",
                    spec.id
                )));
            }
            if spec.default.kind() != spec.kind {
                return Err(ControlError::Config(format!(
                    "default state kind for {} does not match declared kind {}",
                    spec.id, spec.kind
                )));
            }
            if let ActuatorState::Percent(p) = spec.default {
                if !p.is_finite() {
                    return Err(ControlError::Config(format!(
                        "non-finite default percentage for {}: {}",
                        spec.id, p
                    )));
                }
            }
            states.insert(spec.id.clone(), clamp_state(spec.default));
        }
        Ok(Self { states, kinds })
    }

    /// Current state, NotFound on an unknown id
    pub fn read(&self, id: &str) -> Result<ActuatorState> {
        self.states
            .get(id)
            .map(|s| *s)
            .ok_or_else(|| ControlError::ActuatorNotFound(id.to_string()))
    }

    /// Replace the stored state, enforcing the device's fixed kind
    ///
    /// Percentages are clamped to 0-100; non-finite percentages are
    /// rejected. Returns the state actually stored.
    pub fn write(&self, id: &str, state: ActuatorState) -> Result<ActuatorState> {
        let expected = *self
            .kinds
            .get(id)
            .ok_or_else(|| ControlError::ActuatorNotFound(id.to_string()))?;
        if state.kind() != expected {
            return Err(ControlError::StateKindMismatch {
                id: id.to_string(),
                expected,
                supplied: state.kind(),
            });
        }
        if let ActuatorState::Percent(p) = state {
            if !p.is_finite() {
                return Err(ControlError::InvalidPercent {
                    id: id.to_string(),
                    value: p,
                });
            }
        }
        let stored = clamp_state(state);
        self.states.insert(id.to_string(), stored);
        Ok(stored)
    }

    /// True if the id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.kinds.contains_key(id)
    }

    /// Snapshot of every device state
    pub fn snapshot(&self) -> HashMap<String, ActuatorState> {
        self.states
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True if no devices are registered
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

fn clamp_state(state: ActuatorState) -> ActuatorState {
    match state {
        ActuatorState::Percent(p) => ActuatorState::Percent(p.clamp(0.0, 100.0)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ActuatorRegistry {
        ActuatorRegistry::new(&[
            ActuatorSpec::switch("co2_valve", false),
            ActuatorSpec::percent("grow_lights", 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let reg = registry();
        assert_eq!(reg.read("co2_valve").unwrap(), ActuatorState::Switch(false));
        assert_eq!(reg.read("grow_lights").unwrap(), ActuatorState::Percent(0.0));
    }

    #[test]
    fn test_write_then_read() {
        let reg = registry();
        let stored = reg
            .write("grow_lights", ActuatorState::Percent(75.0))
            .unwrap();
        assert_eq!(stored, ActuatorState::Percent(75.0));
        assert_eq!(reg.read("grow_lights").unwrap(), ActuatorState::Percent(75.0));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.read("unknown_device"),
            Err(ControlError::ActuatorNotFound(_))
        ));
        assert!(matches!(
            reg.write("unknown_device", ActuatorState::Switch(true)),
            Err(ControlError::ActuatorNotFound(_))
        ));
    }

    #[test]
    fn test_kind_mismatch_rejected_and_state_unchanged() {
        let reg = registry();
        let err = reg
            .write("grow_lights", ActuatorState::Switch(true))
            .unwrap_err();
        assert!(matches!(err, ControlError::StateKindMismatch { .. }));
        assert_eq!(reg.read("grow_lights").unwrap(), ActuatorState::Percent(0.0));
    }

    #[test]
    fn test_percent_clamped() {
        let reg = registry();
        assert_eq!(
            reg.write("grow_lights", ActuatorState::Percent(150.0)).unwrap(),
            ActuatorState::Percent(100.0)
        );
        assert_eq!(
            reg.write("grow_lights", ActuatorState::Percent(-5.0)).unwrap(),
            ActuatorState::Percent(0.0)
        );
    }

    #[test]
    fn test_non_finite_percent_rejected() {
        let reg = registry();
        assert!(matches!(
            reg.write("grow_lights", ActuatorState::Percent(f64::NAN)),
            Err(ControlError::InvalidPercent { .. })
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = ActuatorRegistry::new(&[
            ActuatorSpec::switch("heater", false),
            ActuatorSpec::switch("heater", true),
        ])
        .unwrap_err();
        assert!(matches!(err, ControlError::Config(_)));
    }

    #[test]
    fn test_state_wire_shape() {
        // The gateway exposes states in this tagged form
        let json = serde_json::to_value(ActuatorState::Percent(75.0)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "percent", "value": 75.0}));
        let state: ActuatorState =
            serde_json::from_value(serde_json::json!({"kind": "switch", "value": true})).unwrap();
        assert_eq!(state, ActuatorState::Switch(true));
    }

    #[test]
    fn test_switch_on_effect() {
        let effect = ActuatorEffect::SwitchOn {
            actuator: "co2_valve".to_string(),
            when: Action::Increase,
        };
        assert_eq!(effect.state_for(Action::Increase), ActuatorState::Switch(true));
        assert_eq!(effect.state_for(Action::Decrease), ActuatorState::Switch(false));
        assert_eq!(effect.state_for(Action::Maintain), ActuatorState::Switch(false));
    }

    #[test]
    fn test_percent_by_action_effect() {
        let effect = ActuatorEffect::PercentByAction {
            actuator: "exhaust_fan".to_string(),
            decrease: 100.0,
            maintain: 0.0,
            increase: 0.0,
        };
        assert_eq!(effect.state_for(Action::Decrease), ActuatorState::Percent(100.0));
        assert_eq!(effect.state_for(Action::Increase), ActuatorState::Percent(0.0));
    }
}
