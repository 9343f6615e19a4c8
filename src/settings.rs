//! Game tuning and configuration
//!
//! Loaded from a JSON file; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Simulation loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Engine velocity iterations per step
    pub velocity_iterations: usize,
    /// Engine position iterations per step
    pub position_iterations: usize,
    /// Expected new asteroids per second (spawn chance is `rate * dt` per frame)
    pub asteroid_spawn_rate: f32,
    /// Half extents of the rendered region around the ship
    pub view_half_extents: (f32, f32),
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            velocity_iterations: VELOCITY_ITERATIONS,
            position_iterations: POSITION_ITERATIONS,
            asteroid_spawn_rate: 1.0,
            view_half_extents: (VIEW_HALF_WIDTH, VIEW_HALF_HEIGHT),
        }
    }
}

/// Player ship tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipSettings {
    /// Force applied at full forward thrust
    pub thrust_force: f32,
    /// Angular velocity at full turn input (rad/s)
    pub max_angular_velocity: f32,
    /// Seconds between shots
    pub max_cooldown: f32,
    /// Shot speed relative to the ship
    pub shot_speed: f32,
    /// Seconds before a shot expires
    pub shot_ttl: f32,
    /// Laser beam length
    pub laser_range: f32,
    /// Half extent of the tow target search square
    pub towline_reach: f32,
    /// Distance from the hub that ends the round
    pub max_lifeline_range: f32,
}

impl Default for ShipSettings {
    fn default() -> Self {
        Self {
            thrust_force: SHIP_THRUST_FORCE,
            max_angular_velocity: SHIP_MAX_ANGULAR_VELOCITY,
            max_cooldown: SHIP_MAX_COOLDOWN,
            shot_speed: SHOT_SPEED,
            shot_ttl: SHOT_TTL,
            laser_range: LASER_RANGE,
            towline_reach: TOWLINE_REACH,
            max_lifeline_range: MAX_LIFELINE_RANGE,
        }
    }
}

/// Asteroid tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidSettings {
    /// Random radii fall in `[base, 2 * base)`
    pub base_radius: f32,
    /// Asteroids smaller than this vanish instead of splitting
    pub min_split_radius: f32,
    /// Random spawn distances fall in `[d, 2d)` from the hub
    pub spawn_distance: f32,
    /// Random speeds fall in `[s, 2s)`
    pub base_speed: f32,
}

impl Default for AsteroidSettings {
    fn default() -> Self {
        Self {
            base_radius: ASTEROID_BASE_RADIUS,
            min_split_radius: ASTEROID_MIN_SPLIT_RADIUS,
            spawn_distance: ASTEROID_SPAWN_DISTANCE,
            base_speed: ASTEROID_BASE_SPEED,
        }
    }
}

/// All game settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sim: SimSettings,
    pub ship: ShipSettings,
    pub asteroid: AsteroidSettings,
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                })
            }
        }

        positive("sim.dt", self.sim.dt)?;
        if self.sim.velocity_iterations == 0 || self.sim.position_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "sim.*_iterations",
                reason: "iteration counts must be non-zero".to_string(),
            });
        }
        if !(self.sim.asteroid_spawn_rate.is_finite() && self.sim.asteroid_spawn_rate >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "sim.asteroid_spawn_rate",
                reason: format!("must be >= 0, got {}", self.sim.asteroid_spawn_rate),
            });
        }
        positive("sim.view_half_extents.0", self.sim.view_half_extents.0)?;
        positive("sim.view_half_extents.1", self.sim.view_half_extents.1)?;

        positive("ship.max_cooldown", self.ship.max_cooldown)?;
        positive("ship.shot_ttl", self.ship.shot_ttl)?;
        positive("ship.laser_range", self.ship.laser_range)?;
        positive("ship.towline_reach", self.ship.towline_reach)?;
        positive("ship.max_lifeline_range", self.ship.max_lifeline_range)?;

        positive("asteroid.base_radius", self.asteroid.base_radius)?;
        positive("asteroid.min_split_radius", self.asteroid.min_split_radius)?;
        positive("asteroid.spawn_distance", self.asteroid.spawn_distance)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "ship": { "laser_range": 12.5 } }"#).unwrap();
        assert_eq!(settings.ship.laser_range, 12.5);
        assert_eq!(settings.ship.max_cooldown, SHIP_MAX_COOLDOWN);
        assert_eq!(settings.sim, SimSettings::default());
    }

    #[test]
    fn test_validate_rejects_zero_dt() {
        let mut settings = Settings::default();
        settings.sim.dt = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { field: "sim.dt", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut settings = Settings::default();
        settings.sim.position_iterations = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("void_settings_{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.sim.asteroid_spawn_rate = 0.25;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let settings = Settings::load_or_default("/nonexistent/void/settings.json");
        assert_eq!(settings, Settings::default());
    }
}
