//! Physics engine boundary
//!
//! Gameplay code never touches engine types. It holds `BodyHandle`s and
//! `JointHandle`s and talks to the engine only through [`PhysicsWorld`].

pub mod world;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use world::PhysicsWorld;

/// Ship, hub and shots
pub const CATEGORY_CRAFT: u32 = 0x0001;
/// Asteroids
pub const CATEGORY_ASTEROID: u32 = 0x0002;

/// Opaque reference to a rigid body owned by the world.
///
/// Generational: a handle to a destroyed body never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Opaque reference to a joint owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointHandle {
    pub index: u32,
    pub generation: u32,
}

/// Static bodies never move; the hub is the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Fixed,
}

/// Collider geometry in body-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    Polygon(Vec<Vec2>),
    Circle { radius: f32 },
}

impl ShapeDesc {
    /// Axis-aligned square centred on the body origin
    pub fn square(half_extent: f32) -> Self {
        Self::Polygon(vec![
            Vec2::new(-half_extent, -half_extent),
            Vec2::new(half_extent, -half_extent),
            Vec2::new(half_extent, half_extent),
            Vec2::new(-half_extent, half_extent),
        ])
    }

    /// Outline vertices for drawing (circles are approximated)
    pub fn outline(&self) -> Vec<Vec2> {
        match self {
            ShapeDesc::Polygon(vertices) => vertices.clone(),
            ShapeDesc::Circle { radius } => (0..16)
                .map(|i| {
                    let a = i as f32 / 16.0 * std::f32::consts::TAU;
                    Vec2::new(a.cos(), a.sin()) * *radius
                })
                .collect(),
        }
    }
}

/// Which pairs of bodies generate contacts.
///
/// Two bodies touch only when each one's category is in the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const CRAFT: Self = Self {
        category: CATEGORY_CRAFT,
        mask: CATEGORY_ASTEROID,
    };
    pub const ASTEROID: Self = Self {
        category: CATEGORY_ASTEROID,
        mask: CATEGORY_CRAFT,
    };
}

/// Physical material of a body's collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            restitution: 1.0,
            friction: 0.2,
        }
    }
}

/// Everything needed to create a body in one call
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub shape: ShapeDesc,
    pub material: Material,
    pub filter: CollisionFilter,
    /// Continuous collision detection for fast movers
    pub bullet: bool,
}

impl BodyDesc {
    pub fn dynamic(shape: ShapeDesc, filter: CollisionFilter) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            shape,
            material: Material::default(),
            filter,
            bullet: false,
        }
    }

    pub fn fixed(shape: ShapeDesc, filter: CollisionFilter) -> Self {
        Self {
            kind: BodyKind::Fixed,
            ..Self::dynamic(shape, filter)
        }
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, linear_velocity: Vec2) -> Self {
        self.linear_velocity = linear_velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.material.density = density;
        self
    }

    pub fn with_bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }
}

/// Towline between two bodies, anchored at their origins.
///
/// The bodies may drift closer but never further apart than `max_length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDesc {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub max_length: f32,
}

/// Solver iteration counts for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverIterations {
    pub velocity: usize,
    pub position: usize,
}

impl Default for SolverIterations {
    fn default() -> Self {
        Self {
            velocity: crate::consts::VELOCITY_ITERATIONS,
            position: crate::consts::POSITION_ITERATIONS,
        }
    }
}

/// Axis-aligned query region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub min: Vec2,
    pub max: Vec2,
}

impl Region {
    /// Region of the given half extents centred on a point
    pub fn around(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }
}

/// Line segment for raycasts and drawn lines
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    /// Point at `fraction` of the way from start to end
    pub fn point_at(&self, fraction: f32) -> Vec2 {
        self.start + (self.end - self.start) * fraction
    }
}

/// First body hit by a raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// 0 at the segment start, 1 at its end
    pub fraction: f32,
    pub normal: Vec2,
    pub body: BodyHandle,
}

/// Two bodies the engine reported touching during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_outline() {
        let square = ShapeDesc::square(3.0);
        let outline = square.outline();
        assert_eq!(outline.len(), 4);
        assert!(outline.iter().all(|v| v.x.abs() == 3.0 && v.y.abs() == 3.0));
    }

    #[test]
    fn test_segment_point_at() {
        let segment = Segment {
            start: Vec2::new(1.0, 1.0),
            end: Vec2::new(1.0, 11.0),
        };
        assert_eq!(segment.point_at(0.5), Vec2::new(1.0, 6.0));
    }

    #[test]
    fn test_region_around() {
        let region = Region::around(Vec2::new(5.0, -5.0), Vec2::new(10.0, 2.0));
        assert_eq!(region.min, Vec2::new(-5.0, -7.0));
        assert_eq!(region.max, Vec2::new(15.0, -3.0));
    }
}
