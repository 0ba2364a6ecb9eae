//! Error types for the control loop
//!
//! Missing readings or targets are deliberately NOT errors: the tick loop
//! skips such keys and `recommend` answers `Unknown`. Errors here are the
//! synchronous failures of a specific operation and never abort a tick
//! pass over other keys.

use thiserror::Error;

use crate::domain::actuator::ActuatorKind;

/// Result type alias using ControlError
pub type Result<T> = std::result::Result<T, ControlError>;

/// Unified error type for control-loop operations
#[derive(Debug, Error)]
pub enum ControlError {
    /// Actuator id is not in the registry
    #[error("Actuator not found: {0}")]
    ActuatorNotFound(String),

    /// Actuator write with a state of the wrong kind
    #[error("Invalid state for actuator {id}: expected {expected}, got {supplied}")]
    StateKindMismatch {
        id: String,
        expected: ActuatorKind,
        supplied: ActuatorKind,
    },

    /// Actuator write with a non-finite percentage
    #[error("Invalid percentage for actuator {id}: {value}")]
    InvalidPercent { id: String, value: f64 },

    /// Configuration rejected at controller construction
    #[error("Configuration error: {0}")]
    Config(String),
}
