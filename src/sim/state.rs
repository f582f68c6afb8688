//! Game state and core simulation types
//!
//! Everything the tick function mutates lives in one explicit [`GameState`]
//! aggregate so tests can construct a state and drive it directly.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::events::EventQueue;
use crate::consts::*;

/// Top-level phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Idle title screen: starfield, blinking prompt, title music
    Title,
    /// Active gameplay, levels 1..=3
    Playing,
    /// Boss cleared, celebration sequence running
    Victory,
    /// Health/lives exhausted; resets to Title after a delay
    GameOver,
}

/// Static per-level configuration
#[derive(Debug, Clone, Copy)]
pub struct LevelSpec {
    /// Kills needed to advance (ignored on the boss level)
    pub kill_target: u32,
    /// Whether this level hosts the boss encounter
    pub boss: bool,
    /// Cap on concurrently active asteroids/satellites
    pub max_asteroids: usize,
    /// Default picture-of-the-day date for the background
    pub background_date: &'static str,
    /// Whether the satellite variant may spawn
    pub satellites: bool,
}

pub const LEVELS: [LevelSpec; 3] = [
    LevelSpec {
        kill_target: 3,
        boss: false,
        max_asteroids: 50,
        background_date: "2024-11-21",
        satellites: false,
    },
    LevelSpec {
        kill_target: 5,
        boss: false,
        max_asteroids: 100,
        background_date: "2024-12-09",
        satellites: true,
    },
    LevelSpec {
        kill_target: 1,
        boss: true,
        max_asteroids: 30,
        background_date: "2024-11-28",
        satellites: true,
    },
];

/// Date used for the title screen background
pub const TITLE_BACKGROUND_DATE: &str = "2024-11-02";

/// Look up the spec for a 1-based level ordinal
pub fn level_spec(level: u32) -> &'static LevelSpec {
    let idx = (level.clamp(1, LEVELS.len() as u32) - 1) as usize;
    &LEVELS[idx]
}

/// Notable things that happened during a tick, drained by the platform
/// layer for audio and other side effects
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    TitleEntered,
    LevelStarted(u32),
    LaserFired,
    AsteroidHit,
    AsteroidDestroyed,
    BossHit,
    BossDestroyed,
    RocketHit,
    LifeLost,
    Frozen,
    GameOverEntered,
    VictoryEntered,
    VictoryLaserFired,
}

/// The player's ship
#[derive(Debug, Clone)]
pub struct Rocket {
    pub pos: Vec2,
    /// Lives counter, the damage model for levels 1-2
    pub lives: u8,
    /// Health 0-100, the damage model for level 3
    pub health: f32,
    /// Remaining frames of the frozen status (0 = not frozen)
    pub freeze_frames: f32,
    /// Remaining frames of the hit/freeze glow
    pub flash_frames: f32,
    /// Remaining frames of the life-loss blink animation
    pub blink_frames: f32,
}

impl Rocket {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            lives: ROCKET_START_LIVES,
            health: ROCKET_MAX_HEALTH,
            freeze_frames: 0.0,
            flash_frames: 0.0,
            blink_frames: 0.0,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_frames > 0.0
    }

    /// Visibility during the life-loss blink (toggles every half period)
    pub fn is_visible(&self) -> bool {
        if self.blink_frames <= 0.0 {
            return true;
        }
        let half_periods = (self.blink_frames / LIFE_BLINK_HALF_PERIOD) as u32;
        half_periods.is_multiple_of(2)
    }
}

/// A player projectile, travelling straight up
#[derive(Debug, Clone, Copy)]
pub struct Laser {
    pub id: u32,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidKind {
    Rock,
    /// Larger and slower; counts the same toward kill totals
    Satellite,
}

/// A falling asteroid or satellite
#[derive(Debug, Clone)]
pub struct Asteroid {
    pub id: u32,
    pub kind: AsteroidKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Fall speed, pixels per frame unit
    pub speed: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub hits: u32,
    pub destroyed: bool,
    /// Remaining frames of the red hit glow
    pub flash_frames: f32,
    /// Which rock sprite to draw (ignored for satellites)
    pub sprite_index: usize,
}

/// The level-3 boss, a bouncing lightning-slinging asteroid
#[derive(Debug, Clone)]
pub struct Boss {
    pub pos: Vec2,
    pub radius: f32,
    pub hits_required: u32,
    /// Accumulated damage, fractional because of siege damage credit
    pub current_hits: f32,
    pub destroyed: bool,
    pub vel: Vec2,
    /// Set by the scheduled ready event; gates lightning fire
    pub ready: bool,
    /// Frames until the next lightning bolt may fire
    pub fire_cooldown: f32,
    /// Frames until a direct laser hit may count again
    pub hit_cooldown: f32,
    /// Frames until body contact may damage the rocket again
    pub contact_cooldown: f32,
    pub flash_frames: f32,
}

impl Boss {
    pub fn spawn(bounds: Vec2, rng: &mut Pcg32) -> Self {
        Self {
            pos: Vec2::new(bounds.x / 2.0, 100.0),
            radius: BOSS_RADIUS,
            hits_required: BOSS_HITS_REQUIRED,
            current_hits: 0.0,
            destroyed: false,
            vel: Vec2::new(
                rng.random_range(0.5..6.5_f32),
                rng.random_range(0.5..1.5_f32),
            ),
            ready: false,
            fire_cooldown: 0.0,
            hit_cooldown: 0.0,
            contact_cooldown: 0.0,
            flash_frames: 0.0,
        }
    }

    /// Fraction of damage taken, 0.0 (fresh) to 1.0 (destroyed)
    pub fn damage_ratio(&self) -> f32 {
        (self.current_hits / self.hits_required as f32).clamp(0.0, 1.0)
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hits >= self.hits_required as f32
    }
}

/// A lightning bolt: a static jittered polyline with a finite lifetime
#[derive(Debug, Clone)]
pub struct LightningBolt {
    pub id: u32,
    pub path: Vec<Vec2>,
    pub life: f32,
    /// A bolt freezes the rocket at most once
    pub struck: bool,
}

/// Visual explosion particle (never gameplay-affecting)
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub life: f32,
    pub max_life: f32,
}

/// Title screen starfield element
#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub base_alpha: f32,
}

/// Level-transition banner text
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub frames: f32,
}

/// A celebration laser fired during the victory sequence
#[derive(Debug, Clone, Copy)]
pub struct CelebrationLaser {
    pub pos: Vec2,
    pub angle: f32,
}

/// Victory-sequence state: player-aimed celebration lasers
#[derive(Debug, Clone, Default)]
pub struct VictoryFx {
    /// Aim angle in radians (0 = rightward)
    pub aim_angle: f32,
    pub fire_cooldown: f32,
    pub lasers: Vec<CelebrationLaser>,
}

/// Complete game state, owned by the tick function
#[derive(Debug, Clone)]
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Current level ordinal, 1-based (meaningful while Playing)
    pub level: u32,
    /// Kills credited toward the current level's target
    pub kills: u32,
    /// Game time in frame units
    pub time: f64,
    /// Playfield size in pixels
    pub bounds: Vec2,
    pub rocket: Rocket,
    pub lasers: Vec<Laser>,
    pub asteroids: Vec<Asteroid>,
    pub boss: Option<Boss>,
    pub bolts: Vec<LightningBolt>,
    /// Pending delayed transitions, cancelled on phase exit
    pub pending: EventQueue,
    /// Per-tick event log, drained by the platform layer
    pub events: Vec<GameEvent>,
    pub particles: Vec<Particle>,
    pub stars: Vec<Star>,
    pub banner: Option<Banner>,
    pub victory_fx: VictoryFx,
    next_id: u32,
}

impl GameState {
    /// Create a fresh state on the title screen
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                pos: Vec2::new(
                    rng.random_range(0.0..bounds.x.max(1.0)),
                    rng.random_range(0.0..bounds.y.max(1.0)),
                ),
                vel: Vec2::new(
                    rng.random_range(-0.25..0.25_f32),
                    rng.random_range(-0.25..0.25_f32),
                ),
                radius: rng.random_range(0.0..1.5_f32),
                base_alpha: rng.random_range(0.5..1.0_f32),
            })
            .collect();

        let mut state = Self {
            seed,
            rng,
            phase: GamePhase::Title,
            level: 1,
            kills: 0,
            time: 0.0,
            bounds,
            rocket: Rocket::new(Vec2::new(bounds.x / 2.0, bounds.y * 0.55)),
            lasers: Vec::new(),
            asteroids: Vec::new(),
            boss: None,
            bolts: Vec::new(),
            pending: EventQueue::new(),
            events: Vec::new(),
            particles: Vec::new(),
            stars,
            banner: None,
            victory_fx: VictoryFx::default(),
            next_id: 1,
        };
        // The platform layer reacts to this by starting the title music
        state.push_event(GameEvent::TitleEntered);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spec(&self) -> &'static LevelSpec {
        level_spec(self.level)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain the per-tick event log for the platform layer
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Kills still needed to clear the current level
    pub fn kills_remaining(&self) -> u32 {
        self.spec().kill_target.saturating_sub(self.kills)
    }
}
