//! Recommendation engine
//!
//! A stateless diagnostic distinct from the learning loop: it compares the
//! same readings to the same targets but never touches action values or
//! actuators.

use serde::{Deserialize, Serialize};

/// Qualitative adjustment answer for one sensor key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Increase,
    Decrease,
    Maintain,
    /// Reading or target absent for the key
    Unknown,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Increase => write!(f, "increase"),
            Recommendation::Decrease => write!(f, "decrease"),
            Recommendation::Maintain => write!(f, "maintain"),
            Recommendation::Unknown => write!(f, "unknown"),
        }
    }
}

/// Compare a reading against its target within a relative band
///
/// The acceptable band is `threshold * |target|`, falling back to the raw
/// `threshold` when the target is exactly zero. The band boundary is
/// inclusive: a deviation equal to the band still answers `Maintain`.
pub fn recommend(value: Option<f64>, target: Option<f64>, threshold: f64) -> Recommendation {
    let (value, target) = match (value, target) {
        (Some(v), Some(t)) => (v, t),
        _ => return Recommendation::Unknown,
    };

    let delta = (value - target).abs();
    let acceptable = if target != 0.0 {
        threshold * target.abs()
    } else {
        threshold
    };

    if delta <= acceptable {
        Recommendation::Maintain
    } else if value < target {
        Recommendation::Increase
    } else {
        Recommendation::Decrease
    }
}
