//! Control-loop configuration
//!
//! The default profile is the aquaponics rack this system grew up on:
//! temperature drives a heater and an exhaust fan, CO2 a solenoid valve,
//! humidity a mister, and light level snaps the grow lights to the target.
//! The water pump is registered but only driven by manual overrides.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::action::Action;
use crate::domain::actuator::{ActuatorEffect, ActuatorSpec, SensorMapping};

/// Control-loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Bound on the history ring
    pub history_capacity: usize,
    /// Learning rate for action-value updates, in (0, 1]
    pub learning_rate: f64,
    /// Relative band for recommendations
    pub recommend_threshold: f64,
    /// Static sensor-to-actuator mapping table
    pub mappings: Vec<SensorMapping>,
    /// Registered devices and their power-on defaults
    pub actuators: Vec<ActuatorSpec>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            history_capacity: crate::DEFAULT_HISTORY_CAPACITY,
            learning_rate: crate::DEFAULT_LEARNING_RATE,
            recommend_threshold: crate::DEFAULT_RECOMMEND_THRESHOLD,
            mappings: default_mappings(),
            actuators: default_actuators(),
        }
    }
}

impl ControlConfig {
    /// Load configuration from environment variables onto the defaults
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("VERDANT_HISTORY_CAPACITY") {
            if let Ok(v) = val.parse() {
                cfg.history_capacity = v;
            }
        }
        if let Ok(val) = std::env::var("VERDANT_LEARNING_RATE") {
            if let Ok(v) = val.parse() {
                cfg.learning_rate = v;
            }
        }
        if let Ok(val) = std::env::var("VERDANT_RECOMMEND_THRESHOLD") {
            if let Ok(v) = val.parse() {
                cfg.recommend_threshold = v;
            }
        }

        Ok(cfg)
    }

    /// Sensor keys in the mapping table, in table order
    pub fn mapped_keys(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.key.as_str())
    }
}

/// Gateway (REST facade) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
        }
    }
}

impl GatewayConfig {
    /// Load from environment; the platform `PORT` variable takes priority
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }
        if let Ok(host) = std::env::var("VERDANT_HOST") {
            cfg.host = host;
        }
        if let Ok(port) = std::env::var("VERDANT_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }

        Ok(cfg)
    }
}

fn default_mappings() -> Vec<SensorMapping> {
    vec![
        SensorMapping::action_driven(
            "air_temp_c",
            vec![
                ActuatorEffect::SwitchOn {
                    actuator: "heater".to_string(),
                    when: Action::Increase,
                },
                ActuatorEffect::PercentByAction {
                    actuator: "exhaust_fan".to_string(),
                    decrease: 100.0,
                    maintain: 0.0,
                    increase: 0.0,
                },
            ],
        ),
        SensorMapping::action_driven(
            "co2_ppm",
            vec![ActuatorEffect::SwitchOn {
                actuator: "co2_valve".to_string(),
                when: Action::Increase,
            }],
        ),
        SensorMapping::action_driven(
            "humidity_pct",
            vec![ActuatorEffect::SwitchOn {
                actuator: "mister".to_string(),
                when: Action::Increase,
            }],
        ),
        SensorMapping::target_snap("light_pct", "grow_lights"),
    ]
}

fn default_actuators() -> Vec<ActuatorSpec> {
    vec![
        ActuatorSpec::switch("heater", false),
        ActuatorSpec::percent("exhaust_fan", 0.0),
        ActuatorSpec::switch("co2_valve", false),
        ActuatorSpec::switch("mister", false),
        ActuatorSpec::percent("grow_lights", 0.0),
        // Circulation pump runs from process start; manual override only
        ActuatorSpec::switch("water_pump", true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_consistent() {
        let cfg = ControlConfig::default();
        assert_eq!(cfg.history_capacity, 1000);
        assert_eq!(cfg.learning_rate, 0.1);
        assert_eq!(cfg.recommend_threshold, 0.05);

        // Every mapped actuator exists in the registry spec
        let ids: Vec<&str> = cfg.actuators.iter().map(|a| a.id.as_str()).collect();
        for mapping in &cfg.mappings {
            for id in mapping.actuator_ids() {
                assert!(ids.contains(&id), "mapping references unknown actuator {id}");
            }
        }
    }

    #[test]
    fn test_mapped_keys_in_table_order() {
        let cfg = ControlConfig::default();
        let keys: Vec<&str> = cfg.mapped_keys().collect();
        assert_eq!(keys, vec!["air_temp_c", "co2_ppm", "humidity_pct", "light_pct"]);
    }
}
