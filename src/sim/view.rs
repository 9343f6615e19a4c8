//! Per-frame snapshot for the renderer
//!
//! Read-only: taking a frame never touches the world or the entities.

use glam::Vec2;
use serde::Serialize;

use super::entity::{Entity, EntityId, EntityKind, Rgba};
use super::tick::{Game, RoundStatus};
use crate::bounding_radius;
use crate::physics::{PhysicsWorld, Region, Segment};

const TOWLINE_COLOR: Rgba = [1.0, 0.0, 1.0, 1.0];
const LASER_COLOR: Rgba = [1.0, 0.0, 0.0, 1.0];

/// One entity as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub angle: f32,
    /// Local-space outline, rotate by `angle` then translate by `position`
    pub outline: Vec<Vec2>,
    pub color: Rgba,
    pub power: f32,
}

/// A coloured line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub segment: Segment,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub time: f32,
    /// View centre (the ship)
    pub center: Vec2,
    /// Entities in view, by ascending id
    pub items: Vec<DrawItem>,
    /// Hub to ship, coloured by how much of the range is used
    pub lifeline: Line,
    pub towline: Option<Line>,
    pub laser: Option<Line>,
    pub status: RoundStatus,
}

/// Green at the hub, yellow halfway, red at the end of the range
pub fn lifeline_color(fraction: f32) -> Rgba {
    let f = fraction.clamp(0.0, 1.0);
    if f <= 0.5 {
        [2.0 * f, 1.0, 0.0, 1.0]
    } else {
        [1.0, 1.0 - 2.0 * (f - 0.5), 0.0, 1.0]
    }
}

fn overlaps(region: &Region, position: Vec2, radius: f32) -> bool {
    position.x + radius >= region.min.x
        && position.x - radius <= region.max.x
        && position.y + radius >= region.min.y
        && position.y - radius <= region.max.y
}

fn draw_item(entity: &Entity, world: &PhysicsWorld) -> DrawItem {
    DrawItem {
        id: entity.id(),
        kind: entity.kind(),
        position: world.position(entity.body()),
        angle: world.angle(entity.body()),
        outline: entity.outline.clone(),
        color: entity.color,
        power: entity.power(),
    }
}

impl Game {
    /// Everything the renderer needs for the current frame
    pub fn snapshot(&self) -> Frame {
        let world = self.world();
        let lifecycle = self.lifecycle();
        let center = self.ship_position();
        let (half_w, half_h) = self.settings.sim.view_half_extents;
        let region = Region::around(center, Vec2::new(half_w, half_h));

        let mut items: Vec<DrawItem> = lifecycle
            .iter()
            .filter(|e| {
                overlaps(&region, world.position(e.body()), bounding_radius(&e.outline))
            })
            .map(|e| draw_item(e, world))
            .collect();
        items.sort_by_key(|item| item.id);

        let hub_position = lifecycle
            .get(self.hub())
            .map(|hub| world.position(hub.body()))
            .unwrap_or(Vec2::ZERO);
        let lifeline = Line {
            segment: Segment {
                start: hub_position,
                end: center,
            },
            color: lifeline_color(self.lifeline_fraction()),
        };

        let towline = lifecycle
            .get(self.ship())
            .and_then(|e| e.as_ship())
            .and_then(|ship| ship.towline)
            .and_then(|towline| lifecycle.get(towline.target))
            .map(|target| Line {
                segment: Segment {
                    start: center,
                    end: world.position(target.body()),
                },
                color: TOWLINE_COLOR,
            });

        let laser = self.laser().map(|segment| Line {
            segment,
            color: LASER_COLOR,
        });

        Frame {
            time: self.time(),
            center,
            items,
            lifeline,
            towline,
            laser,
            status: self.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::asteroid::AsteroidSpec;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_lifeline_color_ramp() {
        assert_eq!(lifeline_color(0.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(lifeline_color(0.5), [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(lifeline_color(1.0), [1.0, 0.0, 0.0, 1.0]);
        let c = lifeline_color(0.25);
        assert_relative_eq!(c[0], 0.5);
        assert_relative_eq!(c[1], 1.0);
        // Past the range stays red
        assert_eq!(lifeline_color(3.0), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_snapshot_lists_entities_in_view() {
        let mut game = Game::new(3, Settings::default()).unwrap();
        let mut rng = Pcg32::seed_from_u64(3);
        let near = game
            .spawn_asteroid(AsteroidSpec::new(2.0, Vec2::new(10.0, 0.0), Vec2::ZERO, &mut rng))
            .unwrap();
        let far = game
            .spawn_asteroid(AsteroidSpec::new(2.0, Vec2::new(200.0, 0.0), Vec2::ZERO, &mut rng))
            .unwrap();

        let frame = game.snapshot();
        let ids: Vec<EntityId> = frame.items.iter().map(|i| i.id).collect();
        assert!(ids.contains(&game.hub()));
        assert!(ids.contains(&game.ship()));
        assert!(ids.contains(&near));
        assert!(!ids.contains(&far));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(frame.towline.is_none());
        assert!(frame.laser.is_none());
        assert_eq!(frame.lifeline.color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let game = Game::new(11, Settings::default()).unwrap();
        let json = serde_json::to_string(&game.snapshot()).unwrap();
        assert!(json.contains("\"items\""));
        assert!(json.contains("\"Hub\""));
    }
}
