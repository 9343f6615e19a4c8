//! Entity lifetime
//!
//! Owns every entity and the body -> entity side table used to turn engine
//! contacts back into entities. Bodies are only destroyed in
//! [`Lifecycle::destroy_pass`], once per frame after contacts were resolved.

use indexmap::{IndexMap, IndexSet};
use rand::Rng;

use super::asteroid;
use super::entity::{Entity, EntityId, EntitySpec, Role};
use crate::error::SpawnError;
use crate::physics::{BodyHandle, PhysicsWorld};

/// Result of one destroy pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyReport {
    /// Entities whose bodies were destroyed, in candidate order
    pub destroyed: Vec<EntityId>,
    /// Split children created by the pass
    pub spawned: Vec<EntityId>,
}

#[derive(Debug)]
pub struct Lifecycle {
    entities: IndexMap<EntityId, Entity>,
    owners: IndexMap<BodyHandle, EntityId>,
    candidates: IndexSet<EntityId>,
    next_id: u32,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            entities: IndexMap::new(),
            owners: IndexMap::new(),
            candidates: IndexSet::new(),
            next_id: 1,
        }
    }
}

impl Lifecycle {
    /// Validate `spec`, create its body and register the entity
    pub fn spawn(
        &mut self,
        world: &mut PhysicsWorld,
        spec: EntitySpec,
    ) -> Result<EntityId, SpawnError> {
        spec.validate()?;

        let id = EntityId(self.next_id);
        self.next_id += 1;

        let body = world.create_body(&spec.body);
        debug_assert!(
            !self.owners.contains_key(&body),
            "body {body:?} already belongs to an entity"
        );
        self.owners.insert(body, id);
        self.entities.insert(id, Entity::new(id, body, spec));
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Entity that owns `body`
    pub fn owner_of(&self, body: BodyHandle) -> Option<EntityId> {
        self.owners.get(&body).copied()
    }

    pub fn entity_for_body(&self, body: BodyHandle) -> Option<&Entity> {
        self.owner_of(body).and_then(|id| self.get(id))
    }

    /// Entities in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Queue an entity for the next destroy pass. Returns false if already queued.
    pub fn mark_candidate(&mut self, id: EntityId) -> bool {
        self.candidates.insert(id)
    }

    pub fn candidates(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.candidates.iter().copied()
    }

    /// Destroy every dead candidate, splitting asteroids first.
    ///
    /// Live candidates are dropped from the queue untouched. Each body is
    /// destroyed at most once because the candidate set holds each id once
    /// and destroyed entities leave the table.
    pub fn destroy_pass<R: Rng>(
        &mut self,
        world: &mut PhysicsWorld,
        rng: &mut R,
        min_split_radius: f32,
    ) -> DestroyReport {
        let mut report = DestroyReport::default();
        let candidates = std::mem::take(&mut self.candidates);

        for id in candidates {
            let Some(entity) = self.entities.get(&id) else {
                continue;
            };
            if entity.is_alive() {
                continue;
            }
            let body = entity.body();

            self.release_towlines(id, world);

            let children = match self.entities.get(&id).map(|e| &e.role) {
                Some(Role::Asteroid(parent)) => asteroid::split(
                    parent.radius,
                    world.position(body),
                    world.linear_velocity(body),
                    min_split_radius,
                    rng,
                ),
                _ => Vec::new(),
            };

            world.destroy_body(body);
            self.owners.shift_remove(&body);
            self.entities.shift_remove(&id);
            report.destroyed.push(id);

            for child in children {
                match child
                    .into_entity_spec(rng)
                    .and_then(|spec| self.spawn(world, spec))
                {
                    Ok(child_id) => report.spawned.push(child_id),
                    Err(e) => log::warn!("Split of {:?} produced a bad child: {}", id, e),
                }
            }
        }

        if !report.destroyed.is_empty() {
            log::debug!(
                "Destroyed {} entities, spawned {}",
                report.destroyed.len(),
                report.spawned.len()
            );
        }
        report
    }

    /// Remove every towline that ends on `id` or is held by it
    fn release_towlines(&mut self, id: EntityId, world: &mut PhysicsWorld) {
        for entity in self.entities.values_mut() {
            let holder = entity.id();
            let Some(ship) = entity.as_ship_mut() else {
                continue;
            };
            if let Some(towline) = ship.towline {
                if holder == id || towline.target == id {
                    world.destroy_joint(towline.joint);
                    ship.towline = None;
                }
            }
        }
    }
}
