//! Player ship: thrust, turning, firing and the towline

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::entity::{EntityId, EntityKind, EntitySpec, Role, ShotSpec};
use super::lifecycle::Lifecycle;
use crate::consts::SHIP_DENSITY;
use crate::heading;
use crate::physics::{
    BodyDesc, BodyHandle, CollisionFilter, JointDesc, JointHandle, PhysicsWorld, Region, ShapeDesc,
};
use crate::settings::ShipSettings;

/// Towline currently held by a ship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Towline {
    pub joint: JointHandle,
    pub target: EntityId,
}

/// Ship intent and weapon state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ship {
    /// Thrust scalar, 1 forward, negative for reverse
    pub thrust: f32,
    /// Turn input in `[-1, 1]`, positive is counter-clockwise
    pub turn: f32,
    pub firing: bool,
    /// Seconds until the next shot may fire
    pub cooldown: f32,
    pub towline: Option<Towline>,
}

impl Ship {
    /// Triangle ship at the origin facing `angle`
    pub fn spec(angle: f32) -> EntitySpec {
        let outline = vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(0.0, 2.0),
        ];
        EntitySpec {
            role: Role::Ship(Ship::default()),
            color: [1.0, 1.0, 1.0, 1.0],
            body: BodyDesc::dynamic(ShapeDesc::Polygon(outline), CollisionFilter::CRAFT)
                .with_angle(angle)
                .with_density(SHIP_DENSITY),
        }
    }

    /// Push the body along its heading, set its spin, and fire when ready
    pub fn step(
        &mut self,
        body: BodyHandle,
        dt: f32,
        world: &mut PhysicsWorld,
        tuning: &ShipSettings,
    ) -> Option<ShotSpec> {
        let angle = world.angle(body);
        let direction = heading(angle);
        world.set_force(body, direction * self.thrust * tuning.thrust_force);
        world.set_angular_velocity(body, self.turn * tuning.max_angular_velocity);

        self.cooldown -= dt;
        if self.firing && self.cooldown <= 0.0 {
            self.cooldown = tuning.max_cooldown;
            return Some(ShotSpec {
                position: world.position(body),
                angle,
                velocity: world.linear_velocity(body) + direction * tuning.shot_speed,
                ttl: tuning.shot_ttl,
            });
        }
        None
    }
}

/// Outcome of pressing the towline key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TowlineChange {
    Released(EntityId),
    Attached(EntityId),
    /// Nothing in reach; not an error
    NoTarget,
}

/// Release the ship's towline, or attach one to a random live asteroid in reach.
///
/// Returns `None` if `ship_id` is not a ship.
pub fn toggle_towline<R: Rng>(
    ship_id: EntityId,
    lifecycle: &mut Lifecycle,
    world: &mut PhysicsWorld,
    rng: &mut R,
    tuning: &ShipSettings,
) -> Option<TowlineChange> {
    let ship_entity = lifecycle.get_mut(ship_id)?;
    let ship_body = ship_entity.body();
    let ship = ship_entity.as_ship_mut()?;

    if let Some(towline) = ship.towline.take() {
        world.destroy_joint(towline.joint);
        return Some(TowlineChange::Released(towline.target));
    }

    let position = world.position(ship_body);
    let region = Region::around(position, Vec2::splat(tuning.towline_reach));
    let candidates: Vec<(EntityId, BodyHandle)> = world
        .query_region(region)
        .into_iter()
        .filter_map(|body| lifecycle.entity_for_body(body))
        .filter(|e| e.kind() == EntityKind::Asteroid && e.is_alive())
        .map(|e| (e.id(), e.body()))
        .collect();

    let Some(&(target, target_body)) = candidates.choose(rng) else {
        return Some(TowlineChange::NoTarget);
    };

    let joint = world.create_joint(&JointDesc {
        body_a: ship_body,
        body_b: target_body,
        max_length: position.distance(world.position(target_body)),
    });
    if let Some(ship) = lifecycle.get_mut(ship_id).and_then(|e| e.as_ship_mut()) {
        ship.towline = Some(Towline { joint, target });
    }
    log::debug!("Towline attached to {:?}", target);
    Some(TowlineChange::Attached(target))
}
