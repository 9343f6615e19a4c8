//! Asteroids: random spawning and splitting

use glam::Vec2;
use rand::Rng;

use super::entity::{EntitySpec, Rgba, Role};
use crate::consts::ASTEROID_VERTICES;
use crate::error::SpawnError;
use crate::heading;
use crate::is_finite_vec;
use crate::physics::{BodyDesc, CollisionFilter, ShapeDesc};
use crate::settings::AsteroidSettings;

/// Asteroid gameplay state
#[derive(Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub radius: f32,
}

/// Parameters for one asteroid before it has a body
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidSpec {
    pub radius: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub color: Rgba,
}

impl AsteroidSpec {
    /// Asteroid with the given geometry and motion; cosmetics are random
    pub fn new<R: Rng>(radius: f32, position: Vec2, velocity: Vec2, rng: &mut R) -> Self {
        Self {
            radius,
            position,
            velocity,
            angle: std::f32::consts::TAU * rng.random::<f32>(),
            angular_velocity: rng.random::<f32>() - 0.5,
            color: [
                0.5 * rng.random::<f32>(),
                0.5 * rng.random::<f32>(),
                0.5 * rng.random::<f32>() + 0.5,
                1.0,
            ],
        }
    }

    /// Fresh asteroid somewhere on the arena periphery, drifting in a random direction
    pub fn random<R: Rng>(rng: &mut R, tuning: &AsteroidSettings) -> Self {
        let radius = tuning.base_radius * (1.0 + rng.random::<f32>());
        let distance = tuning.spawn_distance * (1.0 + rng.random::<f32>());
        let position = heading(std::f32::consts::TAU * rng.random::<f32>()) * distance;
        let speed = tuning.base_speed * (1.0 + rng.random::<f32>());
        let velocity = heading(std::f32::consts::TAU * rng.random::<f32>()) * speed;
        Self::new(radius, position, velocity, rng)
    }

    pub fn validate(&self) -> Result<(), SpawnError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SpawnError::InvalidRadius(self.radius));
        }
        if !is_finite_vec(self.position) {
            return Err(SpawnError::NonFinitePosition(self.position.x, self.position.y));
        }
        if !is_finite_vec(self.velocity) {
            return Err(SpawnError::NonFiniteVelocity(self.velocity.x, self.velocity.y));
        }
        Ok(())
    }

    /// Body and entity spec with a random pentagon outline of the given radius
    pub fn into_entity_spec<R: Rng>(self, rng: &mut R) -> Result<EntitySpec, SpawnError> {
        self.validate()?;
        let outline = random_outline(self.radius, rng);
        let body = BodyDesc::dynamic(ShapeDesc::Polygon(outline), CollisionFilter::ASTEROID)
            .with_position(self.position)
            .with_angle(self.angle)
            .with_velocity(self.velocity)
            .with_angular_velocity(self.angular_velocity);
        Ok(EntitySpec {
            role: Role::Asteroid(Asteroid {
                radius: self.radius,
            }),
            color: self.color,
            body,
        })
    }
}

/// Convex-ish polygon with one vertex in each equal angular sector
pub fn random_outline<R: Rng>(radius: f32, rng: &mut R) -> Vec<Vec2> {
    (0..ASTEROID_VERTICES)
        .map(|i| {
            let angle =
                (i as f32 + rng.random::<f32>()) / ASTEROID_VERTICES as f32 * std::f32::consts::TAU;
            Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Children of an asteroid that was destroyed.
///
/// Below `min_split_radius` nothing is left. Otherwise two pieces whose areas
/// add up to the parent's, touching each other along a random axis through
/// the parent's centre and keeping its velocity.
pub fn split<R: Rng>(
    radius: f32,
    position: Vec2,
    velocity: Vec2,
    min_split_radius: f32,
    rng: &mut R,
) -> Vec<AsteroidSpec> {
    if radius < min_split_radius {
        return Vec::new();
    }
    let fraction = (1.0 + rng.random::<f32>()) / 3.0;
    let radius_1 = radius * fraction.sqrt();
    let radius_2 = (radius * radius - radius_1 * radius_1).max(0.0).sqrt();
    let axis = heading(rng.random::<f32>() * std::f32::consts::TAU);
    let position_1 = position + axis * radius_2;
    let position_2 = position - axis * radius_1;
    vec![
        AsteroidSpec::new(radius_1, position_1, velocity, rng),
        AsteroidSpec::new(radius_2, position_2, velocity, rng),
    ]
}
