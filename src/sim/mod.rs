//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-unit timestep, clamped per tick
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod state;
pub mod tick;

pub use collision::{circle_contains, circles_overlap, polyline_hits_circle};
pub use events::{EventQueue, Scheduled};
pub use state::{
    Asteroid, AsteroidKind, Banner, Boss, GameEvent, GamePhase, GameState, Laser, LevelSpec,
    LightningBolt, Particle, Rocket, Star, level_spec,
};
pub use tick::{TickInput, tick};
