//! Action-value table
//!
//! Per sensor key, one expected-reward estimate per action. Selection is
//! pure greedy with the fixed tie-break order; updates are single-step
//! incremental interpolation toward the observed reward. There is no next
//! state, no discounting, and no exploration: an action that is never
//! selected keeps its initial estimate forever. That cold-start behavior
//! is part of the contract, not an accident.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Expected-reward estimates for one sensor key, one per action
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActionValues {
    estimates: [f64; 3],
}

impl ActionValues {
    /// Fresh row with all three estimates at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current estimate for an action
    #[inline]
    pub fn estimate(&self, action: Action) -> f64 {
        self.estimates[action.index()]
    }

    /// Greedy action: first in tie-break order attaining the maximum
    pub fn select(&self) -> Action {
        let mut best = Action::Decrease;
        for action in Action::ALL {
            if self.estimate(action) > self.estimate(best) {
                best = action;
            }
        }
        best
    }

    /// Pull an action's estimate toward the observed reward
    ///
    /// `estimate <- estimate + learning_rate * (reward - estimate)`
    pub fn update(&mut self, action: Action, reward: f64, learning_rate: f64) {
        let est = &mut self.estimates[action.index()];
        *est += learning_rate * (reward - *est);
    }
}

/// Action-value rows keyed by sensor
///
/// Rows for every configured sensor key are built eagerly at controller
/// creation; a key that shows up later still gets an all-zeros row on
/// first use. Rows persist for the process lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QTable {
    rows: HashMap<String, ActionValues>,
}

impl QTable {
    /// Table with an all-zeros row for each of the given keys
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: keys
                .into_iter()
                .map(|k| (k.into(), ActionValues::new()))
                .collect(),
        }
    }

    /// Greedy action for a key, creating the row if absent
    pub fn select_action(&mut self, key: &str) -> Action {
        self.row_mut(key).select()
    }

    /// Reward an action from the realized error against the target
    ///
    /// The reward is the negative absolute deviation: zero error is the
    /// best attainable reward, larger deviations are more negative.
    pub fn update_estimate(
        &mut self,
        key: &str,
        action: Action,
        value: f64,
        target: f64,
        learning_rate: f64,
    ) -> f64 {
        let reward = -(value - target).abs();
        self.row_mut(key).update(action, reward, learning_rate);
        reward
    }

    /// Row snapshot for a key, if present
    pub fn row(&self, key: &str) -> Option<ActionValues> {
        self.rows.get(key).copied()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no rows exist
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, key: &str) -> &mut ActionValues {
        self.rows.entry(key.to_string()).or_default()
    }
}
