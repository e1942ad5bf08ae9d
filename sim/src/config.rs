//! Simulation configuration.
//!
//! Every tunable lives in [`SimConfig`]. Missing JSON fields fall back to the
//! defaults, so a config file only needs to name what it changes.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable parameters of a session.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds used by `SimWorld::step`.
    pub fixed_timestep: f32,
    /// Seed of the session RNG.
    pub seed: u64,

    pub player_health: f32,
    pub player_speed: f32,
    pub player_size: f32,

    /// Damage each overlapping enemy deals the player every tick.
    pub contact_damage_per_tick: f32,
    pub pickup_radius: f32,
    /// XP needed for level 2; later thresholds follow `base * level^1.5`.
    pub xp_base: f32,

    /// Difficulty gained per second of survival.
    pub difficulty_rate: f32,
    pub spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Distance from the player at which enemies appear.
    pub spawn_distance: f32,

    pub swarm_base_chance: f32,
    pub swarm_chance_growth: f32,
    pub swarm_max_chance: f32,
    pub swarm_radius: f32,

    pub health_orb_chance: f32,
    pub health_orb_value: f32,

    pub grid_cell_size: f32,
    /// Hold the pipeline while an upgrade offer is pending.
    pub pause_on_level_up: bool,
    /// Number of upgrades presented per offer.
    pub offer_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            seed: 0x5eed,
            player_health: 100.0,
            player_speed: 150.0,
            player_size: 32.0,
            contact_damage_per_tick: 0.5,
            pickup_radius: 50.0,
            xp_base: 10.0,
            difficulty_rate: 1.0 / 60.0,
            spawn_interval: 1.5,
            min_spawn_interval: 0.25,
            spawn_distance: 450.0,
            swarm_base_chance: 0.05,
            swarm_chance_growth: 0.05,
            swarm_max_chance: 0.35,
            swarm_radius: 40.0,
            health_orb_chance: 0.03,
            health_orb_value: 20.0,
            grid_cell_size: 64.0,
            pause_on_level_up: true,
            offer_size: 3,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace every value `validate` would reject with its default.
    pub fn sanitized(mut self) -> Self {
        let defaults = SimConfig::default();

        let positive = [
            ("fixed_timestep", &mut self.fixed_timestep, defaults.fixed_timestep),
            ("player_health", &mut self.player_health, defaults.player_health),
            ("xp_base", &mut self.xp_base, defaults.xp_base),
            ("spawn_interval", &mut self.spawn_interval, defaults.spawn_interval),
            ("min_spawn_interval", &mut self.min_spawn_interval, defaults.min_spawn_interval),
            ("grid_cell_size", &mut self.grid_cell_size, defaults.grid_cell_size),
        ];
        for (field, value, fallback) in positive {
            if !value.is_finite() || *value <= 0.0 {
                log::warn!("config `{}` = {} replaced with {}", field, value, fallback);
                *value = fallback;
            }
        }

        let non_negative = [
            ("player_speed", &mut self.player_speed, defaults.player_speed),
            ("player_size", &mut self.player_size, defaults.player_size),
            (
                "contact_damage_per_tick",
                &mut self.contact_damage_per_tick,
                defaults.contact_damage_per_tick,
            ),
            ("pickup_radius", &mut self.pickup_radius, defaults.pickup_radius),
            ("difficulty_rate", &mut self.difficulty_rate, defaults.difficulty_rate),
            ("spawn_distance", &mut self.spawn_distance, defaults.spawn_distance),
            ("swarm_radius", &mut self.swarm_radius, defaults.swarm_radius),
            ("health_orb_value", &mut self.health_orb_value, defaults.health_orb_value),
        ];
        for (field, value, fallback) in non_negative {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("config `{}` = {} replaced with {}", field, value, fallback);
                *value = fallback;
            }
        }

        let chances = [
            ("swarm_base_chance", &mut self.swarm_base_chance, defaults.swarm_base_chance),
            ("swarm_chance_growth", &mut self.swarm_chance_growth, defaults.swarm_chance_growth),
            ("swarm_max_chance", &mut self.swarm_max_chance, defaults.swarm_max_chance),
            ("health_orb_chance", &mut self.health_orb_chance, defaults.health_orb_chance),
        ];
        for (field, value, fallback) in chances {
            if !(0.0..=1.0).contains(&*value) {
                log::warn!("config `{}` = {} replaced with {}", field, value, fallback);
                *value = fallback;
            }
        }
        self
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("fixed_timestep", self.fixed_timestep),
            ("player_health", self.player_health),
            ("xp_base", self.xp_base),
            ("spawn_interval", self.spawn_interval),
            ("min_spawn_interval", self.min_spawn_interval),
            ("grid_cell_size", self.grid_cell_size),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive finite number, got {value}"),
                });
            }
        }

        let non_negative = [
            ("player_speed", self.player_speed),
            ("player_size", self.player_size),
            ("contact_damage_per_tick", self.contact_damage_per_tick),
            ("pickup_radius", self.pickup_radius),
            ("difficulty_rate", self.difficulty_rate),
            ("spawn_distance", self.spawn_distance),
            ("swarm_radius", self.swarm_radius),
            ("health_orb_value", self.health_orb_value),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative finite number, got {value}"),
                });
            }
        }

        let chances = [
            ("swarm_base_chance", self.swarm_base_chance),
            ("swarm_chance_growth", self.swarm_chance_growth),
            ("swarm_max_chance", self.swarm_max_chance),
            ("health_orb_chance", self.health_orb_chance),
        ];
        for (field, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must lie in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(r#"{ "seed": 42, "spawn_interval": 2.0 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.spawn_interval, 2.0);
        assert_eq!(config.xp_base, SimConfig::default().xp_base);
    }

    #[test]
    fn test_rejects_zero_timestep() {
        let err = SimConfig::from_json_str(r#"{ "fixed_timestep": 0.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "fixed_timestep",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_chance_and_bad_json() {
        assert!(SimConfig::from_json_str(r#"{ "health_orb_chance": 1.5 }"#).is_err());
        assert!(matches!(
            SimConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_sanitized_replaces_unusable_values() {
        let config = SimConfig {
            fixed_timestep: 0.0,
            spawn_interval: 0.0,
            min_spawn_interval: f32::NAN,
            pickup_radius: -5.0,
            health_orb_chance: 2.0,
            seed: 7,
            ..SimConfig::default()
        }
        .sanitized();

        let defaults = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fixed_timestep, defaults.fixed_timestep);
        assert_eq!(config.spawn_interval, defaults.spawn_interval);
        assert_eq!(config.min_spawn_interval, defaults.min_spawn_interval);
        assert_eq!(config.pickup_radius, defaults.pickup_radius);
        assert_eq!(config.health_orb_chance, defaults.health_orb_chance);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("arena_sim_config_{}.json", std::process::id()));
        let mut config = SimConfig::default();
        config.seed = 99;
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        let loaded = SimConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }
}
