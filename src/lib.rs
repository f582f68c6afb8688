//! Astro Defender - a shoot-the-asteroids canvas arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, combat, phase machine)
//! - `renderer`: Scene building + Canvas 2D drawing
//! - `assets`: Sprite/audio loading gate
//! - `apod`: Picture-of-the-day client for level backgrounds
//! - `gallery`: Liked pictures + per-level background choices
//! - `audio`: Game-event driven sound playback
//! - `settings`: Player preferences

pub mod apod;
pub mod assets;
pub mod audio;
pub mod gallery;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use gallery::{BackgroundChoices, LikedPictures};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Milliseconds represented by one frame unit (nominal 60 Hz frame)
    pub const FRAME_MS: f64 = 16.67;
    /// Maximum frame units a single tick may absorb (stall protection)
    pub const MAX_FRAME_STEP: f32 = 2.5;

    /// Rocket defaults
    pub const ROCKET_RADIUS: f32 = 20.0;
    /// Movement speed in pixels per frame unit
    pub const ROCKET_MOVE_STEP: f32 = 3.0;
    pub const ROCKET_MAX_HEALTH: f32 = 100.0;
    pub const ROCKET_START_LIVES: u8 = 3;
    /// Laser muzzle offset above the rocket center
    pub const ROCKET_NOSE_OFFSET: f32 = 50.0;

    /// Playfield margins reserved for HUD (counters/lives on top, health
    /// bars on the bottom during the boss level)
    pub const HUD_TOP_MARGIN: f32 = 150.0;
    pub const HUD_BOTTOM_MARGIN: f32 = 150.0;

    /// Laser defaults
    pub const LASER_SPEED: f32 = 5.0;
    pub const LASER_LENGTH: f32 = 15.0;

    /// Asteroid defaults
    pub const ASTEROID_HITS_TO_DESTROY: u32 = 5;
    pub const ASTEROID_MIN_RADIUS: f32 = 15.0;
    pub const ASTEROID_MAX_RADIUS: f32 = 35.0;
    pub const ASTEROID_MIN_SPEED: f32 = 1.0;
    pub const ASTEROID_MAX_SPEED: f32 = 3.0;
    /// Per-tick spawn probability at dt = 1.0
    pub const ASTEROID_SPAWN_CHANCE: f64 = 0.02;
    /// Contact damage on the boss level (levels 1-2 cost a life instead)
    pub const ASTEROID_CONTACT_DAMAGE: f32 = 15.0;

    /// Satellite variant (levels 2-3): larger, slower, same kill credit
    pub const SATELLITE_CHANCE: f64 = 0.25;
    pub const SATELLITE_RADIUS_SCALE: f32 = 2.0;
    pub const SATELLITE_MIN_SPEED: f32 = 1.0;
    pub const SATELLITE_MAX_SPEED: f32 = 2.5;

    /// Boss defaults
    pub const BOSS_RADIUS: f32 = 100.0;
    pub const BOSS_HITS_REQUIRED: u32 = 50;
    /// Frames between counted direct hits
    pub const BOSS_HIT_COOLDOWN: f32 = 30.0;
    /// Radius multiplier applied per counted direct hit
    pub const BOSS_HIT_SHRINK: f32 = 0.98;
    pub const BOSS_CONTACT_DAMAGE: f32 = 30.0;
    pub const BOSS_CONTACT_COOLDOWN: f32 = 30.0;
    /// Bounce speed band, pixels per frame unit
    pub const BOSS_MIN_SPEED: f32 = 4.0;
    pub const BOSS_MAX_SPEED: f32 = 5.0;
    /// Top of the boss bounce band (boss radius is added on top)
    pub const BOSS_BAND_TOP: f32 = 160.0;
    /// Frames after level entry before the boss may fire
    pub const BOSS_READY_DELAY: f64 = 300.0;
    pub const BOSS_FIRE_COOLDOWN_MIN: f32 = 60.0;
    pub const BOSS_FIRE_COOLDOWN_MAX: f32 = 300.0;
    /// Boss health credited per destroyed asteroid, as a fraction of
    /// hits_required (siege damage)
    pub const SIEGE_DAMAGE_FRACTION: f32 = 0.01;

    /// Lightning bolt defaults
    pub const BOLT_SEGMENTS: usize = 8;
    pub const BOLT_JITTER: f32 = 10.0;
    pub const BOLT_LIFETIME: f32 = 50.0;

    /// Freeze status effect
    pub const FREEZE_DURATION: f32 = 60.0;
    pub const FREEZE_DAMAGE_FRACTION: f32 = 0.05;

    /// Feedback timers (frames)
    pub const HIT_FLASH_FRAMES: f32 = 10.0;
    pub const LIFE_BLINK_HALF_PERIOD: f32 = 18.0;
    pub const LIFE_BLINK_FRAMES: f32 = 108.0;

    /// Phase transition delays (frames)
    pub const VICTORY_DELAY: f64 = 180.0;
    pub const GAME_OVER_RESET_DELAY: f64 = 600.0;
    pub const VICTORY_RESET_DELAY: f64 = 3900.0;
    pub const LEVEL_BANNER_FRAMES: f32 = 240.0;

    /// Title screen
    pub const TITLE_BLINK_HALF_PERIOD: f64 = 42.0;
    pub const STAR_COUNT: usize = 100;

    /// Victory celebration sequence
    pub const VICTORY_LASER_SPEED: f32 = 10.0;
    pub const VICTORY_FIRE_COOLDOWN: f32 = 12.0;
    /// Degrees of aim change per frame unit held
    pub const VICTORY_AIM_STEP_DEG: f32 = 1.0;

    /// Explosion particles
    pub const EXPLOSION_PARTICLES: usize = 50;
    pub const BOSS_SCATTER_BURSTS: usize = 30;
}
