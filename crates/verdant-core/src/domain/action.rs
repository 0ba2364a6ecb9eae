//! Control actions
//!
//! The unit of decision for a sensor key. The derived `Ord` gives
//! `Decrease < Maintain < Increase`; greedy selection evaluates actions in
//! that same order, so ties resolve to the earliest action.

use serde::{Deserialize, Serialize};

/// Corrective action for a single sensor key
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Push the reading down
    Decrease,
    /// Leave the actuators where they are
    Maintain,
    /// Push the reading up
    Increase,
}

impl Action {
    /// All actions in tie-break order
    pub const ALL: [Action; 3] = [Action::Decrease, Action::Maintain, Action::Increase];

    /// Position in the tie-break order
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Action::Decrease => 0,
            Action::Maintain => 1,
            Action::Increase => 2,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Decrease => write!(f, "decrease"),
            Action::Maintain => write!(f, "maintain"),
            Action::Increase => write!(f, "increase"),
        }
    }
}
