//! Void - physics core of a 2D space-survival arcade game
//!
//! Core modules:
//! - `physics`: Thin facade over the rigid-body engine (bodies, joints, queries, contacts)
//! - `sim`: Entities, contact resolution, lifecycle and the per-frame orchestrator
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Spawn and configuration errors

pub mod error;
pub mod physics;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, SpawnError};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the scheduler tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Solver iterations handed to the engine every step
    pub const VELOCITY_ITERATIONS: usize = 10;
    pub const POSITION_ITERATIONS: usize = 8;

    /// Starting power of every entity
    pub const FULL_POWER: f32 = 1.0;

    /// Ship defaults
    pub const SHIP_THRUST_FORCE: f32 = 200.0;
    pub const SHIP_MAX_COOLDOWN: f32 = 0.3;
    pub const SHIP_MAX_ANGULAR_VELOCITY: f32 = 2.0 * std::f32::consts::PI;
    pub const SHIP_DENSITY: f32 = 2.0;

    /// Shot defaults
    pub const SHOT_SPEED: f32 = 20.0;
    pub const SHOT_TTL: f32 = 2.0;
    pub const SHOT_HALF_EXTENT: f32 = 0.2;

    /// Laser beam length along the ship heading
    pub const LASER_RANGE: f32 = 10.0;
    /// Half extent of the square searched for a tow target
    pub const TOWLINE_REACH: f32 = 10.0;
    /// Maximum distance from the hub before the round ends
    pub const MAX_LIFELINE_RANGE: f32 = 50.0;

    /// Hub half extent (square centred on the origin)
    pub const HUB_HALF_EXTENT: f32 = 3.0;

    /// Asteroid defaults
    pub const ASTEROID_BASE_RADIUS: f32 = 3.0;
    pub const ASTEROID_MIN_SPLIT_RADIUS: f32 = 2.0;
    pub const ASTEROID_SPAWN_DISTANCE: f32 = 15.0;
    pub const ASTEROID_BASE_SPEED: f32 = 4.0;
    pub const ASTEROID_VERTICES: usize = 5;

    /// Half extents of the region drawn around the ship
    pub const VIEW_HALF_WIDTH: f32 = 40.0;
    pub const VIEW_HALF_HEIGHT: f32 = 25.0;
}

/// Unit vector a body with the given angle is facing.
///
/// Bodies point along +Y at angle zero, so this is `(-sin, cos)`.
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(-angle.sin(), angle.cos())
}

/// Largest distance from the local origin to any vertex
#[inline]
pub fn bounding_radius(vertices: &[Vec2]) -> f32 {
    vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
}

/// True when every component is finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_heading_points_up_at_zero() {
        let h = heading(0.0);
        assert_relative_eq!(h.x, 0.0);
        assert_relative_eq!(h.y, 1.0);
    }

    #[test]
    fn test_heading_quarter_turn_points_left() {
        let h = heading(FRAC_PI_2);
        assert_relative_eq!(h.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(h.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bounding_radius() {
        let tri = [Vec2::new(-1.0, -1.0), Vec2::new(1.0, -1.0), Vec2::new(0.0, 2.0)];
        assert_relative_eq!(bounding_radius(&tri), 2.0);
        assert_eq!(bounding_radius(&[]), 0.0);
    }

    #[test]
    fn test_is_finite_vec() {
        assert!(is_finite_vec(Vec2::new(1.0, -3.0)));
        assert!(!is_finite_vec(Vec2::new(f32::NAN, 0.0)));
        assert!(!is_finite_vec(Vec2::new(0.0, f32::INFINITY)));
    }
}
