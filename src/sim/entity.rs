//! Game entities
//!
//! Every entity owns exactly one physics body. The variant set is closed:
//! gameplay code switches on [`EntityKind`] instead of probing types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::ship::Ship;
use crate::consts::*;
use crate::error::SpawnError;
use crate::is_finite_vec;
use crate::physics::{BodyDesc, BodyHandle, CollisionFilter, PhysicsWorld, ShapeDesc};
use crate::settings::ShipSettings;

/// Stable entity identity, allocated in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// RGBA colour, components in `[0, 1]`
pub type Rgba = [f32; 4];

/// Entity variant discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    Asteroid,
    Hub,
    Shot,
}

/// A projectile fired by the ship
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    /// Seconds until the shot expires
    pub ttl: f32,
}

/// Variant-specific gameplay state
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Ship(Ship),
    Asteroid(Asteroid),
    Hub,
    Shot(Shot),
}

impl Role {
    pub fn kind(&self) -> EntityKind {
        match self {
            Role::Ship(_) => EntityKind::Ship,
            Role::Asteroid(_) => EntityKind::Asteroid,
            Role::Hub => EntityKind::Hub,
            Role::Shot(_) => EntityKind::Shot,
        }
    }
}

/// What one side of a contact does to the other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    None,
    /// Mark the given entity dead
    Kill(EntityId),
}

/// Projectile requested by a ship step, spawned by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub ttl: f32,
}

/// Everything needed to create an entity and its body in one operation
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub role: Role,
    pub color: Rgba,
    pub body: BodyDesc,
}

impl EntitySpec {
    /// The central hub: a fixed square at the origin
    pub fn hub() -> Self {
        Self {
            role: Role::Hub,
            color: [0.5, 0.5, 0.0, 1.0],
            body: BodyDesc::fixed(ShapeDesc::square(HUB_HALF_EXTENT), CollisionFilter::CRAFT),
        }
    }

    pub fn shot(spec: &ShotSpec) -> Self {
        Self {
            role: Role::Shot(Shot { ttl: spec.ttl }),
            color: [1.0, 0.0, 0.0, 1.0],
            body: BodyDesc::dynamic(ShapeDesc::square(SHOT_HALF_EXTENT), CollisionFilter::CRAFT)
                .with_position(spec.position)
                .with_angle(spec.angle)
                .with_velocity(spec.velocity)
                .with_bullet(true),
        }
    }

    /// Reject specs the physics engine must never see
    pub fn validate(&self) -> Result<(), SpawnError> {
        let body = &self.body;
        if !is_finite_vec(body.position) {
            return Err(SpawnError::NonFinitePosition(body.position.x, body.position.y));
        }
        if !is_finite_vec(body.linear_velocity) || !body.angular_velocity.is_finite() {
            return Err(SpawnError::NonFiniteVelocity(
                body.linear_velocity.x,
                body.linear_velocity.y,
            ));
        }
        match &body.shape {
            ShapeDesc::Polygon(vertices) if vertices.len() < 3 => {
                return Err(SpawnError::DegeneratePolygon(vertices.len()));
            }
            ShapeDesc::Polygon(vertices) => {
                if let Some(v) = vertices.iter().find(|v| !is_finite_vec(**v)) {
                    return Err(SpawnError::NonFinitePosition(v.x, v.y));
                }
            }
            ShapeDesc::Circle { radius } => {
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(SpawnError::InvalidRadius(*radius));
                }
            }
        }
        if let Role::Asteroid(asteroid) = &self.role {
            if !(asteroid.radius.is_finite() && asteroid.radius > 0.0) {
                return Err(SpawnError::InvalidRadius(asteroid.radius));
            }
        }
        Ok(())
    }
}

/// A live game object
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    body: BodyHandle,
    alive: bool,
    power: f32,
    pub color: Rgba,
    /// Local-space outline for drawing
    pub outline: Vec<Vec2>,
    pub role: Role,
}

impl Entity {
    pub(crate) fn new(id: EntityId, body: BodyHandle, spec: EntitySpec) -> Self {
        Self {
            id,
            body,
            alive: true,
            power: FULL_POWER,
            color: spec.color,
            outline: spec.body.shape.outline(),
            role: spec.role,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Body created with this entity; never reassigned
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn kind(&self) -> EntityKind {
        self.role.kind()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    /// Set power, clamped to `[0, FULL_POWER]`. Zero or less kills the entity.
    pub fn set_power(&mut self, power: f32) {
        if power <= 0.0 {
            self.alive = false;
        }
        self.power = power.clamp(0.0, FULL_POWER);
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Laser damage: power drops by `dt * fraction` of the beam
    pub fn absorb_beam(&mut self, fraction: f32, dt: f32) {
        let damage = dt * fraction;
        if damage > 0.0 {
            self.set_power(self.power - damage);
        }
    }

    pub fn as_ship(&self) -> Option<&Ship> {
        match &self.role {
            Role::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match &mut self.role {
            Role::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match &self.role {
            Role::Asteroid(asteroid) => Some(asteroid),
            _ => None,
        }
    }

    /// Reaction of this entity to touching `other`.
    ///
    /// Pure: calling it again with the same `other` yields the same reaction,
    /// and applying a `Kill` twice leaves the target just as dead.
    pub fn collide(&self, other: &Entity) -> Reaction {
        match (&self.role, other.kind()) {
            (Role::Hub, EntityKind::Asteroid) => Reaction::Kill(other.id),
            _ => Reaction::None,
        }
    }

    /// Apply this frame's intent. Returns a shot the caller should spawn.
    pub fn step(
        &mut self,
        dt: f32,
        world: &mut PhysicsWorld,
        tuning: &ShipSettings,
    ) -> Option<ShotSpec> {
        match &mut self.role {
            Role::Ship(ship) => ship.step(self.body, dt, world, tuning),
            Role::Shot(shot) => {
                shot.ttl -= dt;
                if shot.ttl <= 0.0 {
                    self.alive = false;
                }
                None
            }
            Role::Asteroid(_) | Role::Hub => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entity(role: Role) -> Entity {
        let spec = EntitySpec {
            role,
            ..EntitySpec::hub()
        };
        Entity::new(EntityId(1), BodyHandle { index: 0, generation: 0 }, spec)
    }

    fn asteroid_entity(id: u32) -> Entity {
        let mut e = entity(Role::Asteroid(Asteroid { radius: 3.0 }));
        e.id = EntityId(id);
        e
    }

    #[test]
    fn test_power_starts_full() {
        let e = entity(Role::Hub);
        assert!(e.is_alive());
        assert_eq!(e.power(), FULL_POWER);
    }

    #[test]
    fn test_zero_power_kills_immediately() {
        let mut e = asteroid_entity(2);
        e.set_power(0.0);
        assert!(!e.is_alive());
        assert_eq!(e.power(), 0.0);
    }

    #[test]
    fn test_power_is_clamped() {
        let mut e = asteroid_entity(2);
        e.set_power(5.0);
        assert_eq!(e.power(), FULL_POWER);
        assert!(e.is_alive());
        e.set_power(-3.0);
        assert_eq!(e.power(), 0.0);
        assert!(!e.is_alive());
    }

    #[test]
    fn test_beam_damage_half_fraction_one_second() {
        let mut e = asteroid_entity(2);
        e.absorb_beam(0.5, 1.0);
        assert!((e.power() - 0.5).abs() < 1e-6);
        assert!(e.is_alive());
    }

    #[test]
    fn test_beam_at_zero_fraction_is_harmless() {
        let mut e = asteroid_entity(2);
        e.absorb_beam(0.0, 1.0);
        assert_eq!(e.power(), FULL_POWER);
    }

    #[test]
    fn test_hub_kills_asteroid_only() {
        let hub = entity(Role::Hub);
        let rock = asteroid_entity(7);
        let shot = entity(Role::Shot(Shot { ttl: 1.0 }));
        assert_eq!(hub.collide(&rock), Reaction::Kill(EntityId(7)));
        assert_eq!(hub.collide(&shot), Reaction::None);
        assert_eq!(rock.collide(&hub), Reaction::None);
    }

    #[test]
    fn test_ship_and_asteroid_ignore_each_other() {
        let ship = entity(Role::Ship(Ship::default()));
        let rock = asteroid_entity(7);
        assert_eq!(ship.collide(&rock), Reaction::None);
        assert_eq!(rock.collide(&ship), Reaction::None);
    }

    #[test]
    fn test_collide_is_repeatable() {
        let hub = entity(Role::Hub);
        let rock = asteroid_entity(7);
        assert_eq!(hub.collide(&rock), hub.collide(&rock));
    }

    #[test]
    fn test_shot_expires() {
        let mut world = PhysicsWorld::new();
        let mut shot = entity(Role::Shot(Shot { ttl: 0.05 }));
        let tuning = ShipSettings::default();
        assert!(shot.step(0.03, &mut world, &tuning).is_none());
        assert!(shot.is_alive());
        shot.step(0.03, &mut world, &tuning);
        assert!(!shot.is_alive());
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        let mut spec = EntitySpec::hub();
        spec.body.position = Vec2::new(f32::NAN, 0.0);
        assert!(matches!(spec.validate(), Err(SpawnError::NonFinitePosition(..))));

        let mut spec = EntitySpec::hub();
        spec.body.linear_velocity = Vec2::new(0.0, f32::INFINITY);
        assert!(matches!(spec.validate(), Err(SpawnError::NonFiniteVelocity(..))));

        let mut spec = EntitySpec::hub();
        spec.body.shape = ShapeDesc::Polygon(vec![Vec2::ZERO, Vec2::X]);
        assert_eq!(spec.validate(), Err(SpawnError::DegeneratePolygon(2)));

        let mut spec = EntitySpec::hub();
        spec.body.shape = ShapeDesc::Circle { radius: 0.0 };
        assert_eq!(spec.validate(), Err(SpawnError::InvalidRadius(0.0)));

        assert!(EntitySpec::hub().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_non_positive_power_means_dead(powers in prop::collection::vec(-2.0f32..2.0, 1..20)) {
            let mut e = asteroid_entity(3);
            for p in powers {
                e.set_power(p);
                if p <= 0.0 {
                    prop_assert!(!e.is_alive());
                }
                if e.power() <= 0.0 {
                    prop_assert!(!e.is_alive());
                }
            }
        }
    }
}
