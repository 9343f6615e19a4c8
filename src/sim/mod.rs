//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - Bodies are destroyed only in the lifecycle pass, never while the world steps

pub mod asteroid;
pub mod contact;
pub mod entity;
pub mod lifecycle;
pub mod ship;
pub mod tick;
pub mod view;

pub use asteroid::{Asteroid, AsteroidSpec, split};
pub use contact::{ContactBuffer, ContactPhase, ContactReport};
pub use entity::{Entity, EntityId, EntityKind, EntitySpec, Reaction, Role, Rgba, Shot, ShotSpec};
pub use lifecycle::{DestroyReport, Lifecycle};
pub use ship::{Ship, Towline, TowlineChange, toggle_towline};
pub use tick::{Game, RoundEnd, RoundStatus, TickInput, TickReport, tick};
pub use view::{DrawItem, Frame, Line, lifeline_color};
