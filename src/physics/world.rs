//! Rapier-backed physics world
//!
//! The engine's event handler only queues collision starts. They are turned
//! into body pairs and handed to the contact buffer after the engine returns,
//! so nothing is created or destroyed while the engine is iterating.

use std::num::NonZeroUsize;

use glam::Vec2;
use parking_lot::Mutex;
use rapier2d::prelude::*;

use super::{
    BodyDesc, BodyHandle, BodyKind, CollisionFilter, ContactPair, JointDesc, JointHandle,
    RayHit, Region, Segment, ShapeDesc, SolverIterations,
};
use crate::sim::contact::ContactBuffer;

fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_na(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

impl From<RigidBodyHandle> for BodyHandle {
    fn from(handle: RigidBodyHandle) -> Self {
        let (index, generation) = handle.into_raw_parts();
        Self { index, generation }
    }
}

impl From<BodyHandle> for RigidBodyHandle {
    fn from(handle: BodyHandle) -> Self {
        RigidBodyHandle::from_raw_parts(handle.index, handle.generation)
    }
}

impl From<ImpulseJointHandle> for JointHandle {
    fn from(handle: ImpulseJointHandle) -> Self {
        let (index, generation) = handle.into_raw_parts();
        Self { index, generation }
    }
}

impl From<JointHandle> for ImpulseJointHandle {
    fn from(handle: JointHandle) -> Self {
        ImpulseJointHandle::from_raw_parts(handle.index, handle.generation)
    }
}

impl From<CollisionFilter> for InteractionGroups {
    fn from(filter: CollisionFilter) -> Self {
        InteractionGroups::new(
            Group::from_bits_truncate(filter.category),
            Group::from_bits_truncate(filter.mask),
        )
    }
}

/// Queues collider pairs whose contact started during a step
#[derive(Default)]
struct ContactCollector {
    started: Mutex<Vec<(ColliderHandle, ColliderHandle)>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        std::mem::take(&mut *self.started.lock())
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&rapier2d::geometry::ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            self.started.lock().push((h1, h2));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &rapier2d::geometry::ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Owns every body, collider and joint in the arena
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    collector: ContactCollector,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Empty world without gravity
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: ContactCollector::default(),
        }
    }

    /// Create a body with its single collider
    pub fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let rb = builder
            .translation(to_na(desc.position))
            .rotation(desc.angle)
            .linvel(to_na(desc.linear_velocity))
            .angvel(desc.angular_velocity)
            .ccd_enabled(desc.bullet)
            .build();
        let body_handle = self.bodies.insert(rb);

        let collider = Self::collider_builder(&desc.shape)
            .density(desc.material.density)
            .restitution(desc.material.restitution)
            .friction(desc.material.friction)
            .collision_groups(desc.filter.into())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);

        body_handle.into()
    }

    fn collider_builder(shape: &ShapeDesc) -> ColliderBuilder {
        match shape {
            ShapeDesc::Circle { radius } => ColliderBuilder::ball(*radius),
            ShapeDesc::Polygon(vertices) => {
                let points: Vec<Point<Real>> = vertices.iter().map(|v| point![v.x, v.y]).collect();
                ColliderBuilder::convex_hull(&points).unwrap_or_else(|| {
                    let radius = crate::bounding_radius(vertices).max(f32::EPSILON);
                    log::warn!(
                        "Degenerate polygon ({} vertices), using a ball of radius {}",
                        vertices.len(),
                        radius
                    );
                    ColliderBuilder::ball(radius)
                })
            }
        }
    }

    /// Remove a body, its collider and any joints attached to it
    pub fn destroy_body(&mut self, handle: BodyHandle) {
        let removed = self.bodies.remove(
            handle.into(),
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            Self::stale(handle);
        }
    }

    /// Advance the simulation and record every contact that started into `contacts`.
    ///
    /// The world must not be mutated by the caller until this returns; the
    /// recorded pairs are resolved afterwards.
    pub fn step(&mut self, dt: f32, iterations: SolverIterations, contacts: &mut ContactBuffer) {
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(iterations.velocity).unwrap_or(NonZeroUsize::MIN);
        self.integration_parameters.num_internal_pgs_iterations = iterations.position.max(1);

        contacts.begin_collecting();
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );

        for (c1, c2) in self.collector.drain() {
            if let (Some(body_a), Some(body_b)) = (self.collider_body(c1), self.collider_body(c2)) {
                contacts.record(ContactPair { body_a, body_b });
            }
        }
        contacts.finish_collecting();
    }

    /// Bodies with a collider overlapping the region, each listed once
    pub fn query_region(&self, region: Region) -> Vec<BodyHandle> {
        let aabb = Aabb::new(point![region.min.x, region.min.y], point![region.max.x, region.max.y]);
        let mut found = Vec::new();
        self.query_pipeline
            .colliders_with_aabb_intersecting_aabb(&aabb, |&collider| {
                if let Some(body) = self.collider_body(collider) {
                    if !found.contains(&body) {
                        found.push(body);
                    }
                }
                true
            });
        found
    }

    /// First body along the segment that `filter` interacts with, ignoring `exclude`
    pub fn raycast(
        &self,
        segment: Segment,
        filter: CollisionFilter,
        exclude: Option<BodyHandle>,
    ) -> Option<RayHit> {
        let ray = Ray::new(
            point![segment.start.x, segment.start.y],
            to_na(segment.end - segment.start),
        );
        let mut filter = QueryFilter::default().groups(filter.into());
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body.into());
        }
        // Direction spans the whole segment, so time of impact is the fraction.
        let (collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            false,
            filter,
        )?;
        Some(RayHit {
            fraction: hit.time_of_impact,
            normal: from_na(&hit.normal),
            body: self.collider_body(collider)?,
        })
    }

    /// Attach a towline (rope joint) between two bodies
    pub fn create_joint(&mut self, desc: &JointDesc) -> JointHandle {
        let joint = RopeJointBuilder::new(desc.max_length)
            .local_anchor1(point![0.0, 0.0])
            .local_anchor2(point![0.0, 0.0])
            .build();
        self.impulse_joints
            .insert(desc.body_a.into(), desc.body_b.into(), joint, true)
            .into()
    }

    pub fn destroy_joint(&mut self, handle: JointHandle) {
        if self.impulse_joints.remove(handle.into(), true).is_none() {
            log::error!("Destroying unknown joint {:?}", handle);
            debug_assert!(false, "stale joint handle {handle:?}");
        }
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.into())
    }

    pub fn contains_joint(&self, handle: JointHandle) -> bool {
        self.impulse_joints.get(handle.into()).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    pub fn position(&self, handle: BodyHandle) -> Vec2 {
        self.body(handle)
            .map(|rb| from_na(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn angle(&self, handle: BodyHandle) -> f32 {
        self.body(handle).map(|rb| rb.rotation().angle()).unwrap_or(0.0)
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Vec2 {
        self.body(handle)
            .map(|rb| from_na(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> f32 {
        self.body(handle).map(|rb| rb.angvel()).unwrap_or(0.0)
    }

    /// Replace the force applied during the next step
    pub fn set_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(rb) = self.body_mut(handle) {
            rb.reset_forces(false);
            rb.add_force(to_na(force), true);
        }
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: f32) {
        if let Some(rb) = self.body_mut(handle) {
            rb.set_angvel(angular_velocity, true);
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let rb = self.bodies.get(handle.into());
        if rb.is_none() {
            Self::stale(handle);
        }
        rb
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let rb = self.bodies.get_mut(handle.into());
        if rb.is_none() {
            Self::stale(handle);
        }
        rb
    }

    fn collider_body(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.colliders
            .get(collider)
            .and_then(|c| c.parent())
            .map(BodyHandle::from)
    }

    fn stale(handle: BodyHandle) {
        log::error!("Use of destroyed body {:?}", handle);
        debug_assert!(false, "stale body handle {handle:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Material;

    fn ball(position: Vec2, filter: CollisionFilter) -> BodyDesc {
        BodyDesc::dynamic(ShapeDesc::Circle { radius: 1.0 }, filter).with_position(position)
    }

    fn step_n(world: &mut PhysicsWorld, contacts: &mut ContactBuffer, n: usize) {
        for _ in 0..n {
            world.step(1.0 / 60.0, SolverIterations::default(), contacts);
            contacts.clear();
        }
    }

    #[test]
    fn test_create_and_destroy_body() {
        let mut world = PhysicsWorld::new();
        let body = world.create_body(&ball(Vec2::ZERO, CollisionFilter::CRAFT));
        assert_eq!(world.body_count(), 1);
        assert!(world.contains_body(body));

        world.destroy_body(body);
        assert_eq!(world.body_count(), 0);
        assert!(!world.contains_body(body));
    }

    #[test]
    fn test_body_moves_with_velocity() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let body = world.create_body(
            &ball(Vec2::ZERO, CollisionFilter::CRAFT).with_velocity(Vec2::new(6.0, 0.0)),
        );
        step_n(&mut world, &mut contacts, 60);
        let pos = world.position(body);
        assert!((pos.x - 6.0).abs() < 0.1, "moved to {pos:?}");
        assert!(pos.y.abs() < 1e-3);
    }

    #[test]
    fn test_contact_is_recorded_between_filtered_pair() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let craft = world.create_body(&ball(Vec2::ZERO, CollisionFilter::CRAFT));
        let rock = world.create_body(
            &ball(Vec2::new(4.0, 0.0), CollisionFilter::ASTEROID).with_velocity(Vec2::new(-5.0, 0.0)),
        );

        let mut seen = false;
        for _ in 0..120 {
            world.step(1.0 / 60.0, SolverIterations::default(), &mut contacts);
            seen |= contacts.pairs().iter().any(|p| {
                (p.body_a == craft && p.body_b == rock) || (p.body_a == rock && p.body_b == craft)
            });
            contacts.clear();
        }
        assert!(seen);
    }

    #[test]
    fn test_same_category_never_touches() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        world.create_body(&ball(Vec2::ZERO, CollisionFilter::ASTEROID));
        world.create_body(
            &ball(Vec2::new(4.0, 0.0), CollisionFilter::ASTEROID).with_velocity(Vec2::new(-5.0, 0.0)),
        );

        for _ in 0..120 {
            world.step(1.0 / 60.0, SolverIterations::default(), &mut contacts);
            assert!(contacts.is_empty());
            contacts.clear();
        }
    }

    #[test]
    fn test_raycast_fraction_and_exclusion() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let caster = world.create_body(&ball(Vec2::ZERO, CollisionFilter::CRAFT));
        let target = world.create_body(
            &BodyDesc::fixed(ShapeDesc::square(1.0), CollisionFilter::ASTEROID)
                .with_position(Vec2::new(0.0, 6.0)),
        );
        // Query pipeline is refreshed by the step
        step_n(&mut world, &mut contacts, 1);

        let segment = Segment {
            start: Vec2::ZERO,
            end: Vec2::new(0.0, 10.0),
        };
        let hit = world
            .raycast(segment, CollisionFilter::CRAFT, Some(caster))
            .unwrap();
        assert_eq!(hit.body, target);
        assert!((hit.fraction - 0.5).abs() < 1e-3, "fraction {}", hit.fraction);
        assert!(hit.normal.y < 0.0);

        let miss = Segment {
            start: Vec2::ZERO,
            end: Vec2::new(10.0, 0.0),
        };
        assert!(world.raycast(miss, CollisionFilter::CRAFT, Some(caster)).is_none());
    }

    #[test]
    fn test_raycast_skips_filtered_bodies() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        // A craft-category body in front of the asteroid does not block the ray
        world.create_body(&ball(Vec2::new(0.0, 3.0), CollisionFilter::CRAFT));
        let rock = world.create_body(&ball(Vec2::new(0.0, 8.0), CollisionFilter::ASTEROID));
        step_n(&mut world, &mut contacts, 1);

        let segment = Segment {
            start: Vec2::ZERO,
            end: Vec2::new(0.0, 10.0),
        };
        let hit = world.raycast(segment, CollisionFilter::CRAFT, None).unwrap();
        assert_eq!(hit.body, rock);
        assert!((hit.fraction - 0.7).abs() < 1e-3, "fraction {}", hit.fraction);
    }

    #[test]
    fn test_query_region() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let near = world.create_body(&ball(Vec2::new(2.0, 2.0), CollisionFilter::ASTEROID));
        let far = world.create_body(&ball(Vec2::new(50.0, 0.0), CollisionFilter::ASTEROID));
        step_n(&mut world, &mut contacts, 1);

        let found = world.query_region(Region::around(Vec2::ZERO, Vec2::splat(10.0)));
        assert!(found.contains(&near));
        assert!(!found.contains(&far));
    }

    #[test]
    fn test_create_and_destroy_joint() {
        let mut world = PhysicsWorld::new();
        let a = world.create_body(&ball(Vec2::ZERO, CollisionFilter::CRAFT));
        let b = world.create_body(&ball(Vec2::new(3.0, 0.0), CollisionFilter::ASTEROID));
        let joint = world.create_joint(&JointDesc {
            body_a: a,
            body_b: b,
            max_length: 3.0,
        });
        assert!(world.contains_joint(joint));
        assert_eq!(world.joint_count(), 1);

        world.destroy_joint(joint);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_towline_holds_length() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let anchor = world.create_body(
            &BodyDesc::fixed(ShapeDesc::Circle { radius: 1.0 }, CollisionFilter::CRAFT),
        );
        let towed = world.create_body(
            &BodyDesc::dynamic(ShapeDesc::Circle { radius: 2.0 }, CollisionFilter::ASTEROID)
                .with_position(Vec2::new(5.0, 0.0))
                .with_velocity(Vec2::new(10.0, 0.0)),
        );
        world.create_joint(&JointDesc {
            body_a: anchor,
            body_b: towed,
            max_length: 5.0,
        });

        step_n(&mut world, &mut contacts, 120);
        let distance = world.position(towed).length();
        assert!(distance < 5.25, "towline stretched to {distance}");
    }

    #[test]
    fn test_filters_map_to_interaction_groups() {
        let craft = InteractionGroups::from(CollisionFilter::CRAFT);
        let asteroid = InteractionGroups::from(CollisionFilter::ASTEROID);
        assert!(craft.test(asteroid));
        assert!(asteroid.test(craft));
        assert!(!craft.test(craft));
        assert!(!asteroid.test(asteroid));
    }

    #[test]
    fn test_set_force_accelerates() {
        let mut world = PhysicsWorld::new();
        let mut contacts = ContactBuffer::default();
        let mut desc = ball(Vec2::ZERO, CollisionFilter::CRAFT);
        desc.material = Material::default();
        let body = world.create_body(&desc);

        world.set_force(body, Vec2::new(0.0, 50.0));
        step_n(&mut world, &mut contacts, 10);
        assert!(world.linear_velocity(body).y > 0.0);
    }

    #[test]
    fn test_degenerate_polygon_falls_back_to_ball() {
        let mut world = PhysicsWorld::new();
        let line = ShapeDesc::Polygon(vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]);
        let body = world.create_body(&BodyDesc::dynamic(line, CollisionFilter::CRAFT));
        assert!(world.contains_body(body));
    }
}
