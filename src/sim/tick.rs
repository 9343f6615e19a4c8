//! Fixed timestep game step
//!
//! One call to [`tick`] runs the whole frame to completion: spawn check,
//! intents, laser, world step, contact resolution, destroy pass, buffer reset,
//! then the lifeline check.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::asteroid::AsteroidSpec;
use super::contact::ContactBuffer;
use super::entity::{EntityId, EntityKind, EntitySpec};
use super::lifecycle::Lifecycle;
use super::ship::{Ship, TowlineChange, toggle_towline};
use crate::error::SpawnError;
use crate::heading;
use crate::physics::{CollisionFilter, PhysicsWorld, Segment, SolverIterations};
use crate::settings::Settings;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Forward thrust scalar, negative for reverse
    pub thrust: f32,
    /// Turn input, clamped to `[-1, 1]`
    pub turn: f32,
    /// Fire shots and the laser
    pub firing: bool,
    /// Edge-triggered towline attach/release
    pub toggle_towline: bool,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RoundEnd {
    /// The ship strayed past the lifeline range
    OutOfRange { distance: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RoundStatus {
    Playing,
    /// Terminal; further ticks do nothing
    Over(RoundEnd),
}

impl RoundStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, RoundStatus::Over(_))
    }
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: RoundStatus,
    pub contacts_resolved: usize,
    pub destroyed: Vec<EntityId>,
    pub spawned: Vec<EntityId>,
    pub towline: Option<TowlineChange>,
}

impl TickReport {
    fn idle(status: RoundStatus) -> Self {
        Self {
            status,
            contacts_resolved: 0,
            destroyed: Vec::new(),
            spawned: Vec::new(),
            towline: None,
        }
    }
}

/// A running round: the world, its entities and the RNG driving them
pub struct Game {
    world: PhysicsWorld,
    lifecycle: Lifecycle,
    contacts: ContactBuffer,
    hub: EntityId,
    ship: EntityId,
    rng: Pcg32,
    pub settings: Settings,
    status: RoundStatus,
    laser: Option<Segment>,
    time: f32,
    frame: u64,
    seed: u64,
}

impl Game {
    /// Fresh round with the hub at the origin and the ship on top of it
    pub fn new(seed: u64, settings: Settings) -> Result<Self, SpawnError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = PhysicsWorld::new();
        let mut lifecycle = Lifecycle::default();

        let hub = lifecycle.spawn(&mut world, EntitySpec::hub())?;
        let angle = std::f32::consts::TAU * rng.random::<f32>();
        let ship = lifecycle.spawn(&mut world, Ship::spec(angle))?;
        log::info!("New round (seed {})", seed);

        Ok(Self {
            world,
            lifecycle,
            contacts: ContactBuffer::default(),
            hub,
            ship,
            rng,
            settings,
            status: RoundStatus::Playing,
            laser: None,
            time: 0.0,
            frame: 0,
            seed,
        })
    }

    /// Add an asteroid to the round
    pub fn spawn_asteroid(&mut self, spec: AsteroidSpec) -> Result<EntityId, SpawnError> {
        let spec = spec.into_entity_spec(&mut self.rng)?;
        self.lifecycle.spawn(&mut self.world, spec)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn hub(&self) -> EntityId {
        self.hub
    }

    pub fn ship(&self) -> EntityId {
        self.ship
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    /// Laser beam fired this frame, cut short at the asteroid it hit
    pub fn laser(&self) -> Option<Segment> {
        self.laser
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn ship_position(&self) -> Vec2 {
        self.lifecycle
            .get(self.ship)
            .map(|ship| self.world.position(ship.body()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Ship distance from the hub
    pub fn lifeline_distance(&self) -> f32 {
        let hub = self
            .lifecycle
            .get(self.hub)
            .map(|hub| self.world.position(hub.body()))
            .unwrap_or(Vec2::ZERO);
        self.ship_position().distance(hub)
    }

    /// Share of the lifeline range in use
    pub fn lifeline_fraction(&self) -> f32 {
        self.lifeline_distance() / self.settings.ship.max_lifeline_range
    }

    fn spawn_check(&mut self, dt: f32) -> Option<EntityId> {
        let chance = dt * self.settings.sim.asteroid_spawn_rate;
        if self.rng.random::<f32>() >= chance {
            return None;
        }
        let spec = AsteroidSpec::random(&mut self.rng, &self.settings.asteroid);
        match self.spawn_asteroid(spec) {
            Ok(id) => {
                log::debug!("Asteroid {:?} arrived", id);
                Some(id)
            }
            Err(e) => {
                log::warn!("Asteroid spawn rejected: {}", e);
                None
            }
        }
    }

    fn apply_intents(&mut self, input: &TickInput, dt: f32) -> Vec<EntityId> {
        if let Some(ship) = self
            .lifecycle
            .get_mut(self.ship)
            .and_then(|e| e.as_ship_mut())
        {
            ship.thrust = input.thrust;
            ship.turn = input.turn.clamp(-1.0, 1.0);
            ship.firing = input.firing;
        }

        let mut shots = Vec::new();
        for id in self.lifecycle.ids() {
            let Some(entity) = self.lifecycle.get_mut(id) else {
                continue;
            };
            if let Some(shot) = entity.step(dt, &mut self.world, &self.settings.ship) {
                shots.push(shot);
            }
            if !entity.is_alive() {
                self.lifecycle.mark_candidate(id);
            }
        }

        shots
            .iter()
            .filter_map(|shot| {
                self.lifecycle
                    .spawn(&mut self.world, EntitySpec::shot(shot))
                    .map_err(|e| log::warn!("Shot spawn rejected: {}", e))
                    .ok()
            })
            .collect()
    }

    /// Burn the first asteroid along the ship heading
    fn fire_laser(&mut self, dt: f32) {
        let Some(ship) = self.lifecycle.get(self.ship) else {
            return;
        };
        let body = ship.body();
        let start = self.world.position(body);
        let segment = Segment {
            start,
            end: start + heading(self.world.angle(body)) * self.settings.ship.laser_range,
        };
        self.laser = Some(segment);

        let Some(hit) = self
            .world
            .raycast(segment, CollisionFilter::CRAFT, Some(body))
        else {
            return;
        };
        // The beam stops at whatever it burns
        self.laser = Some(Segment {
            start,
            end: segment.point_at(hit.fraction),
        });
        let Some(id) = self.lifecycle.owner_of(hit.body) else {
            return;
        };
        let Some(target) = self.lifecycle.get_mut(id) else {
            return;
        };
        if target.kind() == EntityKind::Asteroid {
            target.absorb_beam(hit.fraction, dt);
            self.lifecycle.mark_candidate(id);
        }
    }
}

/// Advance the round by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput, dt: f32) -> TickReport {
    if game.status.is_over() {
        return TickReport::idle(game.status);
    }
    game.frame += 1;
    game.time += dt;

    let mut report = TickReport::idle(game.status);
    report.spawned.extend(game.spawn_check(dt));

    if input.toggle_towline {
        report.towline = toggle_towline(
            game.ship,
            &mut game.lifecycle,
            &mut game.world,
            &mut game.rng,
            &game.settings.ship,
        );
    }
    report.spawned.extend(game.apply_intents(input, dt));

    game.laser = None;
    if input.firing {
        game.fire_laser(dt);
    }

    let iterations = SolverIterations {
        velocity: game.settings.sim.velocity_iterations,
        position: game.settings.sim.position_iterations,
    };
    game.world.step(dt, iterations, &mut game.contacts);

    let contacts = game.contacts.resolve(&mut game.lifecycle);
    report.contacts_resolved = contacts.pairs_resolved;

    let destroyed = game.lifecycle.destroy_pass(
        &mut game.world,
        &mut game.rng,
        game.settings.asteroid.min_split_radius,
    );
    report.destroyed = destroyed.destroyed;
    report.spawned.extend(destroyed.spawned);

    game.contacts.clear();

    let distance = game.lifeline_distance();
    if distance > game.settings.ship.max_lifeline_range {
        game.status = RoundStatus::Over(RoundEnd::OutOfRange { distance });
        log::info!(
            "Round over after {:.1}s: ship {:.1} from the hub",
            game.time,
            distance
        );
    }
    report.status = game.status;
    report
}
