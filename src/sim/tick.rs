//! Per-frame simulation tick
//!
//! One `tick` advances the whole game by `dt` frame units: timers, input,
//! entity movement, combat resolution, spawning, and phase transitions via
//! the scheduled-event queue.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::collision::{circle_contains, circles_overlap, polyline_hits_circle};
use super::events::Scheduled;
use super::state::{
    Asteroid, AsteroidKind, Banner, Boss, CelebrationLaser, GameEvent, GamePhase, GameState, Laser,
    LightningBolt, Particle, VictoryFx, LEVELS, level_spec,
};
use crate::consts::*;

/// Input flags for a single tick
///
/// Directional flags reflect held keys; `fire` and the aim flags are
/// one-shot/held edges cleared by the driver after each tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Fire a laser; doubles as "start" on the title screen
    pub fire: bool,
    /// Victory sequence: rotate the celebration lasers
    pub aim_left: bool,
    pub aim_right: bool,
}

/// Advance the game state by `dt` frame units (1.0 = nominal 60 Hz frame)
///
/// `dt` is clamped to [`MAX_FRAME_STEP`] so a stalled tab cannot teleport
/// entities across the playfield.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_STEP)
    } else {
        0.0
    };
    state.time += dt as f64;

    // Fire whatever transitions came due. A reset replaces the whole state,
    // so stop processing this tick's stale queue afterwards.
    for due in state.pending.drain_due(state.time) {
        if apply_scheduled(state, due) {
            return;
        }
    }

    match state.phase {
        GamePhase::Title => tick_title(state, input, dt),
        GamePhase::Playing => tick_playing(state, input, dt),
        GamePhase::Victory => tick_victory(state, input, dt),
        GamePhase::GameOver => {}
    }

    update_particles(state, dt);

    if let Some(banner) = &mut state.banner {
        banner.frames -= dt;
    }
    if state.banner.as_ref().is_some_and(|b| b.frames <= 0.0) {
        state.banner = None;
    }
}

/// Apply a due scheduled event. Returns true if the state was replaced.
fn apply_scheduled(state: &mut GameState, event: Scheduled) -> bool {
    match event {
        Scheduled::BossReady => {
            if let Some(boss) = state.boss.as_mut() {
                boss.ready = true;
                log::info!("Boss is ready to fire lightning");
            }
            false
        }
        Scheduled::Victory => {
            enter_victory(state);
            false
        }
        Scheduled::ResetToTitle => {
            reset_to_title(state);
            true
        }
    }
}

/// Full reset, equivalent to a process restart: nothing carries over
fn reset_to_title(state: &mut GameState) {
    let seed = state.seed.wrapping_add(1);
    *state = GameState::new(seed, state.bounds);
    log::info!("Reset to title screen");
}

// === Title ===

fn tick_title(state: &mut GameState, input: &TickInput, dt: f32) {
    // Starfield drift with edge wrap
    let bounds = state.bounds;
    for star in &mut state.stars {
        star.pos += star.vel * dt;
        if star.pos.x < 0.0 {
            star.pos.x = bounds.x;
        } else if star.pos.x > bounds.x {
            star.pos.x = 0.0;
        }
        if star.pos.y < 0.0 {
            star.pos.y = bounds.y;
        } else if star.pos.y > bounds.y {
            star.pos.y = 0.0;
        }
    }

    if input.fire {
        load_level(state, 1);
    }
}

// === Level loading ===

fn load_level(state: &mut GameState, level: u32) {
    state.pending.cancel_all();
    state.level = level;
    state.kills = 0;
    state.asteroids.clear();
    state.lasers.clear();
    state.bolts.clear();
    state.boss = None;

    let spec = level_spec(level);
    if spec.boss {
        state.rocket.health = ROCKET_MAX_HEALTH;
        let boss = Boss::spawn(state.bounds, &mut state.rng);
        state.boss = Some(boss);
        state.pending.schedule(state.time + BOSS_READY_DELAY, Scheduled::BossReady);
    }

    state.phase = GamePhase::Playing;
    state.banner = Some(Banner {
        text: format!("Level {level}"),
        frames: LEVEL_BANNER_FRAMES,
    });
    state.push_event(GameEvent::LevelStarted(level));
    log::info!("Loading level {level}");
}

// === Playing ===

fn tick_playing(state: &mut GameState, input: &TickInput, dt: f32) {
    update_rocket_timers(state, dt);

    if !state.rocket.is_frozen() {
        move_rocket(state, input, dt);
    }

    if input.fire {
        fire_laser(state);
    }

    if state.spec().boss {
        update_boss(state, dt);
        if state.phase != GamePhase::Playing {
            return;
        }
        update_bolts(state, dt);
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    advance_asteroids(state, dt);
    advance_lasers(state, dt);
    resolve_laser_hits(state);

    resolve_rocket_collisions(state);
    if state.phase != GamePhase::Playing {
        return;
    }

    // Level advance. The boss-destroyed check in resolve_laser_hits already
    // ran, so a kill that satisfies both targets resolves toward Victory.
    let spec = state.spec();
    if !spec.boss && state.kills >= spec.kill_target && state.level < LEVELS.len() as u32 {
        load_level(state, state.level + 1);
        return;
    }

    maybe_spawn_asteroid(state, dt);
}

fn update_rocket_timers(state: &mut GameState, dt: f32) {
    let rocket = &mut state.rocket;
    if rocket.freeze_frames > 0.0 {
        rocket.freeze_frames -= dt;
        if rocket.freeze_frames <= 0.0 {
            rocket.freeze_frames = 0.0;
            log::debug!("Rocket unfrozen");
        }
    }
    rocket.flash_frames = (rocket.flash_frames - dt).max(0.0);
    rocket.blink_frames = (rocket.blink_frames - dt).max(0.0);
}

fn move_rocket(state: &mut GameState, input: &TickInput, dt: f32) {
    let step = ROCKET_MOVE_STEP * dt;
    let bounds = state.bounds;
    let boss_level = state.spec().boss;
    let rocket = &mut state.rocket;

    if input.left {
        rocket.pos.x = (rocket.pos.x - step).max(0.0);
    }
    if input.right {
        rocket.pos.x = (rocket.pos.x + step).min(bounds.x);
    }
    if input.up {
        rocket.pos.y = (rocket.pos.y - step).max(HUD_TOP_MARGIN + ROCKET_RADIUS);
    }
    if input.down {
        // The boss level reserves the bottom strip for the health bars
        let floor = if boss_level {
            bounds.y - HUD_BOTTOM_MARGIN - ROCKET_RADIUS
        } else {
            bounds.y - ROCKET_RADIUS
        };
        rocket.pos.y = (rocket.pos.y + step).min(floor);
    }
}

fn fire_laser(state: &mut GameState) {
    let id = state.next_entity_id();
    let pos = Vec2::new(state.rocket.pos.x, state.rocket.pos.y - ROCKET_NOSE_OFFSET);
    state.lasers.push(Laser { id, pos });
    state.push_event(GameEvent::LaserFired);
}

// === Boss ===

fn update_boss(state: &mut GameState, dt: f32) {
    let Some(mut boss) = state.boss.take() else {
        return;
    };
    let mut contact_hit = false;
    let mut fired_path: Option<Vec<Vec2>> = None;

    if !boss.destroyed {
        boss.hit_cooldown = (boss.hit_cooldown - dt).max(0.0);
        boss.contact_cooldown = (boss.contact_cooldown - dt).max(0.0);
        boss.flash_frames = (boss.flash_frames - dt).max(0.0);

        // Keep both axes inside the speed band, preserving direction
        boss.vel.x = clamp_bounce_speed(boss.vel.x);
        boss.vel.y = clamp_bounce_speed(boss.vel.y);
        boss.pos += boss.vel * dt;

        // Horizontal edge reflection
        if boss.pos.x < boss.radius {
            boss.pos.x = boss.radius;
            boss.vel.x = boss.vel.x.abs();
        } else if boss.pos.x > state.bounds.x - boss.radius {
            boss.pos.x = state.bounds.x - boss.radius;
            boss.vel.x = -boss.vel.x.abs();
        }

        // Vertical band: below the HUD/health bar, above mid-screen
        let top = BOSS_BAND_TOP + boss.radius;
        let bottom = state.bounds.y * 0.5;
        if boss.pos.y < top {
            boss.pos.y = top;
            boss.vel.y = boss.vel.y.abs();
        } else if boss.pos.y > bottom {
            boss.pos.y = bottom;
            boss.vel.y = -boss.vel.y.abs();
        }

        // Lightning: gated on the ready delay, then a randomized cooldown
        if boss.ready && boss.fire_cooldown <= 0.0 {
            fired_path = Some(lightning_path(boss.pos, state.rocket.pos, &mut state.rng));
            boss.fire_cooldown = state
                .rng
                .random_range(BOSS_FIRE_COOLDOWN_MIN..BOSS_FIRE_COOLDOWN_MAX);
        } else {
            boss.fire_cooldown -= dt;
        }

        if boss.contact_cooldown <= 0.0
            && circles_overlap(boss.pos, boss.radius, state.rocket.pos, ROCKET_RADIUS)
        {
            boss.contact_cooldown = BOSS_CONTACT_COOLDOWN;
            contact_hit = true;
        }
    }

    state.boss = Some(boss);

    if let Some(path) = fired_path {
        let id = state.next_entity_id();
        state.bolts.push(LightningBolt {
            id,
            path,
            life: BOLT_LIFETIME,
            struck: false,
        });
    }
    if contact_hit {
        damage_health(state, BOSS_CONTACT_DAMAGE);
    }
}

#[inline]
fn clamp_bounce_speed(v: f32) -> f32 {
    let sign = if v < 0.0 { -1.0 } else { 1.0 };
    sign * v.abs().clamp(BOSS_MIN_SPEED, BOSS_MAX_SPEED)
}

/// Build the jittered polyline a lightning bolt is drawn and tested along
fn lightning_path(from: Vec2, to: Vec2, rng: &mut rand_pcg::Pcg32) -> Vec<Vec2> {
    let delta = (to - from) / BOLT_SEGMENTS as f32;
    let mut current = from;
    let mut path = Vec::with_capacity(BOLT_SEGMENTS + 1);
    for _ in 0..=BOLT_SEGMENTS {
        let jitter = Vec2::new(
            rng.random_range(-BOLT_JITTER..BOLT_JITTER),
            rng.random_range(-BOLT_JITTER..BOLT_JITTER),
        );
        path.push(current + jitter);
        current += delta;
    }
    path
}

fn update_bolts(state: &mut GameState, dt: f32) {
    let rocket_pos = state.rocket.pos;
    let mut struck = false;

    state.bolts.retain_mut(|bolt| {
        bolt.life -= dt;
        if bolt.life <= 0.0 {
            return false;
        }
        if !bolt.struck && polyline_hits_circle(&bolt.path, rocket_pos, ROCKET_RADIUS) {
            bolt.struck = true;
            struck = true;
        }
        true
    });

    if struck {
        apply_freeze(state);
    }
}

/// Freeze the rocket: suspend movement, apply the percentage health
/// penalty, start the glow. A no-op while already frozen.
fn apply_freeze(state: &mut GameState) {
    if state.rocket.is_frozen() {
        log::debug!("Rocket already frozen; ignoring repeat freeze");
        return;
    }
    state.rocket.freeze_frames = FREEZE_DURATION;
    state.rocket.flash_frames = FREEZE_DURATION;
    state.rocket.health =
        (state.rocket.health - ROCKET_MAX_HEALTH * FREEZE_DAMAGE_FRACTION).max(0.0);
    state.push_event(GameEvent::Frozen);
    log::debug!("Rocket frozen; health now {}", state.rocket.health);

    if state.rocket.health <= 0.0 {
        game_over(state);
    }
}

// === Entity movement ===

fn advance_asteroids(state: &mut GameState, dt: f32) {
    let floor = state.bounds.y;
    state.asteroids.retain_mut(|a| {
        a.pos.y += a.speed * dt;
        a.rotation = (a.rotation + a.rotation_speed * dt).rem_euclid(TAU);
        a.flash_frames = (a.flash_frames - dt).max(0.0);
        // Gone once the center crosses the bottom bound
        a.pos.y <= floor
    });
}

fn advance_lasers(state: &mut GameState, dt: f32) {
    state.lasers.retain_mut(|laser| {
        laser.pos.y -= LASER_SPEED * dt;
        laser.pos.y > 0.0
    });
}

// === Combat resolution ===

fn resolve_laser_hits(state: &mut GameState) {
    // Boss first: it floats above the asteroid field. Lasers are consumed
    // on contact; the hit only counts once per cooldown window.
    let mut boss_hits = 0u32;
    if let Some(boss) = state.boss.as_mut() {
        if !boss.destroyed {
            let lasers = &mut state.lasers;
            lasers.retain(|laser| {
                if circle_contains(boss.pos, boss.radius, laser.pos) {
                    if boss.hit_cooldown <= 0.0 {
                        boss.hit_cooldown = BOSS_HIT_COOLDOWN;
                        boss.current_hits += 1.0;
                        boss.radius *= BOSS_HIT_SHRINK;
                        boss.flash_frames = HIT_FLASH_FRAMES;
                        boss_hits += 1;
                    }
                    return false;
                }
                true
            });
        }
    }
    for _ in 0..boss_hits {
        state.push_event(GameEvent::BossHit);
    }

    // Regular asteroids and satellites
    let mut hit_count = 0u32;
    let mut destroyed: Vec<(Vec2, f32)> = Vec::new();
    {
        let lasers = &mut state.lasers;
        let asteroids = &mut state.asteroids;
        lasers.retain(|laser| {
            for a in asteroids.iter_mut() {
                if !a.destroyed && circle_contains(a.pos, a.radius, laser.pos) {
                    a.hits += 1;
                    a.flash_frames = HIT_FLASH_FRAMES;
                    hit_count += 1;
                    if a.hits >= ASTEROID_HITS_TO_DESTROY {
                        a.destroyed = true;
                        destroyed.push((a.pos, a.radius));
                    }
                    return false;
                }
            }
            true
        });
    }
    for _ in 0..hit_count {
        state.push_event(GameEvent::AsteroidHit);
    }

    // Destroyed entities leave the active set on the same tick
    state.asteroids.retain(|a| !a.destroyed);

    for (pos, radius) in destroyed {
        state.kills += 1;
        state.push_event(GameEvent::AsteroidDestroyed);
        spawn_explosion(state, pos, radius, EXPLOSION_PARTICLES);

        // Siege damage: every kill during the boss encounter chips 1% of
        // the boss's required hits off its remaining health
        if let Some(boss) = state.boss.as_mut() {
            if !boss.destroyed {
                let credit = boss.hits_required as f32 * SIEGE_DAMAGE_FRACTION;
                boss.current_hits =
                    (boss.current_hits + credit).min(boss.hits_required as f32);
            }
        }
    }

    // Defeat check covers both direct hits and siege attrition, and runs
    // before any kill-target bookkeeping so Victory takes priority
    let defeated = state
        .boss
        .as_ref()
        .is_some_and(|b| !b.destroyed && b.is_defeated());
    if defeated {
        destroy_boss(state);
    }
}

fn destroy_boss(state: &mut GameState) {
    let (pos, radius) = {
        let Some(boss) = state.boss.as_mut() else {
            return;
        };
        boss.destroyed = true;
        boss.current_hits = boss.hits_required as f32;
        (boss.pos, boss.radius)
    };

    state.push_event(GameEvent::BossDestroyed);
    spawn_explosion(state, pos, radius, EXPLOSION_PARTICLES);

    // Scattered celebratory bursts across the whole screen
    let bounds = state.bounds;
    for _ in 0..BOSS_SCATTER_BURSTS {
        let p = Vec2::new(
            state.rng.random_range(0.0..bounds.x),
            state.rng.random_range(0.0..bounds.y),
        );
        let r = state.rng.random_range(10.0..30.0_f32);
        spawn_explosion(state, p, r, EXPLOSION_PARTICLES / 2);
    }

    state.pending.cancel_all();
    state
        .pending
        .schedule(state.time + VICTORY_DELAY, Scheduled::Victory);
    log::info!("Boss destroyed; victory scheduled");
}

fn resolve_rocket_collisions(state: &mut GameState) {
    let rocket_pos = state.rocket.pos;
    let boss_level = state.spec().boss;

    let mut collisions = 0u32;
    state.asteroids.retain(|a| {
        if circles_overlap(a.pos, a.radius, rocket_pos, ROCKET_RADIUS) {
            collisions += 1;
            return false;
        }
        true
    });

    for _ in 0..collisions {
        if state.phase != GamePhase::Playing {
            break;
        }
        if boss_level {
            damage_health(state, ASTEROID_CONTACT_DAMAGE);
        } else {
            lose_life(state);
        }
    }
}

/// Levels 1-2 damage model: lose a life, blink, respawn at center
fn lose_life(state: &mut GameState) {
    state.rocket.lives = state.rocket.lives.saturating_sub(1);
    state.rocket.blink_frames = LIFE_BLINK_FRAMES;
    state.rocket.pos = Vec2::new(state.bounds.x / 2.0, state.bounds.y / 2.0);
    state.push_event(GameEvent::LifeLost);
    log::debug!("Life lost; {} remaining", state.rocket.lives);

    if state.rocket.lives == 0 {
        game_over(state);
    }
}

/// Level-3 damage model: subtract health, clamped at zero
fn damage_health(state: &mut GameState, amount: f32) {
    state.rocket.health = (state.rocket.health - amount).max(0.0);
    state.rocket.blink_frames = LIFE_BLINK_FRAMES;
    state.push_event(GameEvent::RocketHit);
    log::debug!("Rocket hit; health now {}", state.rocket.health);

    if state.rocket.health <= 0.0 {
        game_over(state);
    }
}

/// Terminal transition out of Playing. Guarded so overlapping collision
/// checks within one tick cannot trigger it twice.
fn game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.pending.cancel_all();
    state.asteroids.clear();
    state.lasers.clear();
    state.bolts.clear();
    state.boss = None;
    state
        .pending
        .schedule(state.time + GAME_OVER_RESET_DELAY, Scheduled::ResetToTitle);
    state.push_event(GameEvent::GameOverEntered);
    log::info!("Game over on level {}", state.level);
}

// === Victory ===

fn enter_victory(state: &mut GameState) {
    state.phase = GamePhase::Victory;
    state.pending.cancel_all();
    state.asteroids.clear();
    state.lasers.clear();
    state.bolts.clear();
    state.boss = None;
    state.victory_fx = VictoryFx::default();
    state
        .pending
        .schedule(state.time + VICTORY_RESET_DELAY, Scheduled::ResetToTitle);
    state.push_event(GameEvent::VictoryEntered);
    log::info!("Victory!");
}

fn tick_victory(state: &mut GameState, input: &TickInput, dt: f32) {
    let center = Vec2::new(state.bounds.x / 2.0, state.bounds.y / 2.0);
    let vanish = Vec2::new(state.bounds.x / 2.0, state.bounds.y / 1.5);
    let max_fade = state.bounds.length() * 0.35;

    let mut fired = false;
    {
        let fx = &mut state.victory_fx;
        fx.fire_cooldown = (fx.fire_cooldown - dt).max(0.0);

        if input.aim_left {
            fx.aim_angle -= VICTORY_AIM_STEP_DEG.to_radians() * dt;
        }
        if input.aim_right {
            fx.aim_angle += VICTORY_AIM_STEP_DEG.to_radians() * dt;
        }
        if input.fire && fx.fire_cooldown <= 0.0 {
            fx.lasers.push(CelebrationLaser {
                pos: center,
                angle: fx.aim_angle,
            });
            fx.fire_cooldown = VICTORY_FIRE_COOLDOWN;
            fired = true;
        }

        fx.lasers.retain_mut(|laser| {
            let dir = Vec2::new(laser.angle.cos(), laser.angle.sin());
            laser.pos += dir * VICTORY_LASER_SPEED * dt;
            // Fade with distance from the vanishing point; cull once gone
            let taper = 1.0 - laser.pos.distance(vanish) / max_fade;
            taper > 0.0
        });
    }

    if fired {
        state.push_event(GameEvent::VictoryLaserFired);
    }
}

// === Spawning ===

fn maybe_spawn_asteroid(state: &mut GameState, dt: f32) {
    let spec = state.spec();
    if state.asteroids.len() >= spec.max_asteroids {
        return;
    }
    let chance = (ASTEROID_SPAWN_CHANCE * dt as f64).clamp(0.0, 1.0);
    if !state.rng.random_bool(chance) {
        return;
    }
    spawn_asteroid(state);
}

fn spawn_asteroid(state: &mut GameState) {
    let spec = state.spec();
    let satellite = spec.satellites && state.rng.random_bool(SATELLITE_CHANCE);

    let (kind, radius, speed, rotation_speed) = if satellite {
        (
            AsteroidKind::Satellite,
            state
                .rng
                .random_range(ASTEROID_MIN_RADIUS..ASTEROID_MAX_RADIUS)
                * SATELLITE_RADIUS_SCALE,
            state.rng.random_range(SATELLITE_MIN_SPEED..SATELLITE_MAX_SPEED),
            state.rng.random_range(-0.003..0.001_f32),
        )
    } else {
        (
            AsteroidKind::Rock,
            state
                .rng
                .random_range(ASTEROID_MIN_RADIUS..ASTEROID_MAX_RADIUS),
            state.rng.random_range(ASTEROID_MIN_SPEED..ASTEROID_MAX_SPEED),
            state.rng.random_range(-0.002..0.003_f32),
        )
    };

    let id = state.next_entity_id();
    let x = state.rng.random_range(0.0..state.bounds.x);
    let rotation = state.rng.random_range(0.0..TAU);
    let sprite_index = state.rng.random_range(0..4);

    state.asteroids.push(Asteroid {
        id,
        kind,
        pos: Vec2::new(x, -radius),
        radius,
        speed,
        rotation,
        rotation_speed,
        hits: 0,
        destroyed: false,
        flash_frames: 0.0,
        sprite_index,
    });
}

// === Particles ===

fn spawn_explosion(state: &mut GameState, pos: Vec2, base_radius: f32, count: usize) {
    for _ in 0..count {
        let angle = state.rng.random_range(0.0..TAU);
        let speed = state.rng.random_range(2.0..5.0_f32);
        let life = state.rng.random_range(20.0..40.0_f32);
        state.particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            radius: state.rng.random_range(0.5..(base_radius * 0.1).max(0.6)),
            life,
            max_life: life,
        });
    }
}

fn update_particles(state: &mut GameState, dt: f32) {
    state.particles.retain_mut(|p| {
        p.pos += p.vel * dt;
        p.life -= dt;
        p.life > 0.0
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Rocket;
    use proptest::prelude::*;

    const DT: f32 = 1.0;

    fn bounds() -> Vec2 {
        Vec2::new(1280.0, 720.0)
    }

    fn title_state() -> GameState {
        GameState::new(42, bounds())
    }

    fn playing_state(level: u32) -> GameState {
        let mut state = title_state();
        load_level(&mut state, level);
        state
    }

    fn add_asteroid(state: &mut GameState, pos: Vec2, radius: f32, hits: u32) -> u32 {
        let id = state.next_entity_id();
        state.asteroids.push(Asteroid {
            id,
            kind: AsteroidKind::Rock,
            pos,
            radius,
            speed: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            hits,
            destroyed: false,
            flash_frames: 0.0,
            sprite_index: 0,
        });
        id
    }

    fn add_laser_at(state: &mut GameState, pos: Vec2) {
        let id = state.next_entity_id();
        state.lasers.push(Laser { id, pos });
    }

    fn count_events(state: &GameState, wanted: &GameEvent) -> usize {
        state.events.iter().filter(|e| *e == wanted).count()
    }

    #[test]
    fn test_title_starts_level_one_on_fire() {
        let mut state = title_state();
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::Title);

        let start = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &start, DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.level, 1);
        assert_eq!(count_events(&state, &GameEvent::LevelStarted(1)), 1);
        assert!(state.banner.is_some());
    }

    #[test]
    fn test_dt_clamped_to_max_frame_step() {
        let mut state = playing_state(1);
        let before = state.time;
        tick(&mut state, &TickInput::default(), 100.0);
        assert!((state.time - before - MAX_FRAME_STEP as f64).abs() < 1e-9);

        // Movement is bounded by the same clamp
        let mut state = playing_state(1);
        state.rocket.pos = Vec2::new(100.0, 400.0);
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, 1000.0);
        let moved = state.rocket.pos.x - 100.0;
        assert!((moved - ROCKET_MOVE_STEP * MAX_FRAME_STEP).abs() < 1e-3);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let mut state = playing_state(1);
        let before = state.time;
        tick(&mut state, &TickInput::default(), f32::NAN);
        assert_eq!(state.time, before);
    }

    #[test]
    fn test_asteroid_destroyed_at_five_hits_and_removed_same_tick() {
        let mut state = playing_state(1);
        let pos = Vec2::new(600.0, 300.0);
        let id = add_asteroid(&mut state, pos, 30.0, ASTEROID_HITS_TO_DESTROY - 1);
        // The laser advances LASER_SPEED before resolution; aim below center
        add_laser_at(&mut state, pos + Vec2::new(0.0, LASER_SPEED));

        tick(&mut state, &TickInput::default(), DT);

        assert!(state.asteroids.iter().all(|a| a.id != id));
        assert_eq!(state.kills, 1);
        assert_eq!(count_events(&state, &GameEvent::AsteroidDestroyed), 1);
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_four_hits_do_not_destroy() {
        let mut state = playing_state(1);
        let pos = Vec2::new(600.0, 300.0);
        let id = add_asteroid(&mut state, pos, 30.0, 3);
        add_laser_at(&mut state, pos + Vec2::new(0.0, LASER_SPEED));

        tick(&mut state, &TickInput::default(), DT);

        let asteroid = state.asteroids.iter().find(|a| a.id == id).unwrap();
        assert_eq!(asteroid.hits, 4);
        assert_eq!(state.kills, 0);
        assert!(asteroid.flash_frames > 0.0);
    }

    #[test]
    fn test_level_advances_after_exact_kill_target() {
        let mut state = playing_state(1);
        state.kills = level_spec(1).kill_target - 1;
        let pos = Vec2::new(600.0, 300.0);
        add_asteroid(&mut state, pos, 30.0, ASTEROID_HITS_TO_DESTROY - 1);
        add_laser_at(&mut state, pos + Vec2::new(0.0, LASER_SPEED));

        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.level, 2);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.kills, 0);
        assert_eq!(state.banner.as_ref().unwrap().text, "Level 2");
    }

    #[test]
    fn test_boss_level_setup() {
        let state = playing_state(3);
        let boss = state.boss.as_ref().unwrap();
        assert!(!boss.ready);
        assert_eq!(boss.hits_required, BOSS_HITS_REQUIRED);
        assert!(state.pending.contains(Scheduled::BossReady));
        assert_eq!(state.rocket.health, ROCKET_MAX_HEALTH);
    }

    #[test]
    fn test_boss_ready_after_delay() {
        let mut state = playing_state(3);
        // Park the rocket away from the boss bounce band
        state.rocket.pos = Vec2::new(10.0, 650.0);
        let mut ticks = 0;
        while !state.boss.as_ref().unwrap().ready {
            tick(&mut state, &TickInput::default(), DT);
            ticks += 1;
            assert!(ticks < 400, "boss never became ready");
        }
        assert!(ticks as f64 >= BOSS_READY_DELAY);
    }

    #[test]
    fn test_boss_hit_cooldown_counts_one_hit_per_window() {
        let mut state = playing_state(3);
        // Settle the boss inside its bounce band so laser aim is stable
        tick(&mut state, &TickInput::default(), DT);
        let boss_pos = state.boss.as_ref().unwrap().pos;
        // Two lasers inside the boss on the same tick
        add_laser_at(&mut state, boss_pos);
        add_laser_at(&mut state, boss_pos + Vec2::new(1.0, 1.0));

        tick(&mut state, &TickInput::default(), DT);

        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.current_hits, 1.0);
        // Both lasers consumed regardless
        assert!(state.lasers.is_empty());
        assert_eq!(count_events(&state, &GameEvent::BossHit), 1);
    }

    #[test]
    fn test_fifty_direct_hits_destroy_boss_and_schedule_victory() {
        let mut state = playing_state(3);
        // Settle the boss inside its bounce band first
        tick(&mut state, &TickInput::default(), DT);
        for _ in 0..BOSS_HITS_REQUIRED {
            // Respect the cooldown window between counted hits
            let pos = {
                let boss = state.boss.as_mut().unwrap();
                boss.hit_cooldown = 0.0;
                boss.pos
            };
            add_laser_at(&mut state, pos);
            tick(&mut state, &TickInput::default(), DT);
        }

        let boss = state.boss.as_ref().unwrap();
        assert!(boss.destroyed);
        assert!(state.pending.contains(Scheduled::Victory));
        assert_eq!(count_events(&state, &GameEvent::BossDestroyed), 1);

        // Explosion delay elapses, then Victory
        for _ in 0..=(VICTORY_DELAY as u32 + 1) {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.boss.is_none());
        assert!(state.pending.contains(Scheduled::ResetToTitle));
    }

    #[test]
    fn test_siege_damage_can_destroy_boss() {
        let mut state = playing_state(3);
        {
            let boss = state.boss.as_mut().unwrap();
            // One more siege credit (1% of 50 = 0.5) tips it over
            boss.current_hits = boss.hits_required as f32 - 0.4;
        }
        let pos = Vec2::new(200.0, 600.0);
        add_asteroid(&mut state, pos, 30.0, ASTEROID_HITS_TO_DESTROY - 1);
        add_laser_at(&mut state, pos + Vec2::new(0.0, LASER_SPEED));

        tick(&mut state, &TickInput::default(), DT);

        assert!(state.boss.as_ref().unwrap().destroyed);
        assert!(state.pending.contains(Scheduled::Victory));
    }

    #[test]
    fn test_siege_damage_clamped_to_required() {
        let mut state = playing_state(3);
        {
            let boss = state.boss.as_mut().unwrap();
            boss.current_hits = boss.hits_required as f32 - 0.1;
        }
        let pos = Vec2::new(200.0, 600.0);
        add_asteroid(&mut state, pos, 30.0, ASTEROID_HITS_TO_DESTROY - 1);
        add_laser_at(&mut state, pos + Vec2::new(0.0, LASER_SPEED));

        tick(&mut state, &TickInput::default(), DT);

        let boss = state.boss.as_ref().unwrap();
        assert!(boss.current_hits <= boss.hits_required as f32);
    }

    #[test]
    fn test_lightning_freeze_damages_and_freezes() {
        let mut state = playing_state(3);
        let rocket_pos = state.rocket.pos;
        let id = state.next_entity_id();
        state.bolts.push(LightningBolt {
            id,
            path: vec![Vec2::new(100.0, 100.0), rocket_pos],
            life: BOLT_LIFETIME,
            struck: false,
        });

        tick(&mut state, &TickInput::default(), DT);

        assert!(state.rocket.is_frozen());
        assert_eq!(state.rocket.health, 95.0);
        assert_eq!(count_events(&state, &GameEvent::Frozen), 1);
    }

    #[test]
    fn test_freeze_is_idempotent_while_frozen() {
        let mut state = playing_state(3);
        let rocket_pos = state.rocket.pos;
        for _ in 0..2 {
            let id = state.next_entity_id();
            state.bolts.push(LightningBolt {
                id,
                path: vec![rocket_pos],
                life: BOLT_LIFETIME,
                struck: false,
            });
        }

        tick(&mut state, &TickInput::default(), DT);
        // Second bolt next tick, still frozen
        tick(&mut state, &TickInput::default(), DT);

        assert!(state.rocket.is_frozen());
        assert_eq!(state.rocket.health, 95.0);
        assert_eq!(count_events(&state, &GameEvent::Frozen), 1);
    }

    #[test]
    fn test_frozen_rocket_ignores_movement() {
        let mut state = playing_state(3);
        state.rocket.freeze_frames = FREEZE_DURATION;
        let before = state.rocket.pos;
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.rocket.pos, before);

        // Thaw and movement resumes
        state.rocket.freeze_frames = 0.5;
        tick(&mut state, &input, DT);
        tick(&mut state, &input, DT);
        assert!(state.rocket.pos.x > before.x);
    }

    #[test]
    fn test_life_lost_on_collision_and_respawn() {
        let mut state = playing_state(1);
        state.rocket.pos = Vec2::new(300.0, 400.0);
        add_asteroid(&mut state, Vec2::new(300.0, 400.0), 30.0, 0);

        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.rocket.lives, ROCKET_START_LIVES - 1);
        assert_eq!(state.rocket.pos, Vec2::new(640.0, 360.0));
        assert!(state.rocket.blink_frames > 0.0);
        assert_eq!(count_events(&state, &GameEvent::LifeLost), 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_game_over_triggers_exactly_once() {
        let mut state = playing_state(3);
        state.rocket.health = 10.0;
        // Boss overlapping the rocket and an asteroid overlapping it too:
        // two damage sources in the same tick, one terminal transition
        state.rocket.pos = Vec2::new(640.0, 400.0);
        {
            let boss = state.boss.as_mut().unwrap();
            boss.pos = state.rocket.pos;
            boss.contact_cooldown = 0.0;
        }
        let rocket_pos = state.rocket.pos;
        add_asteroid(&mut state, rocket_pos, 40.0, 0);

        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.rocket.health, 0.0);
        assert_eq!(count_events(&state, &GameEvent::GameOverEntered), 1);
        assert!(state.asteroids.is_empty());
        assert!(state.boss.is_none());
        assert!(state.pending.contains(Scheduled::ResetToTitle));
    }

    #[test]
    fn test_lives_exhaustion_triggers_game_over_once() {
        let mut state = playing_state(1);
        state.rocket.lives = 1;
        state.rocket.pos = Vec2::new(300.0, 400.0);
        add_asteroid(&mut state, Vec2::new(300.0, 400.0), 30.0, 0);

        tick(&mut state, &TickInput::default(), DT);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.rocket.lives, 0);
        assert_eq!(count_events(&state, &GameEvent::GameOverEntered), 1);
    }

    #[test]
    fn test_game_over_resets_to_title_after_delay() {
        let mut state = playing_state(1);
        state.rocket.lives = 1;
        state.rocket.pos = Vec2::new(300.0, 400.0);
        add_asteroid(&mut state, Vec2::new(300.0, 400.0), 30.0, 0);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, GamePhase::GameOver);

        for _ in 0..=(GAME_OVER_RESET_DELAY as u32 + 1) {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, GamePhase::Title);
        assert_eq!(state.rocket.lives, ROCKET_START_LIVES);
        assert!(state.pending.is_empty());
    }

    #[test]
    fn test_spawn_never_exceeds_per_level_cap() {
        for level in 1..=3u32 {
            let mut state = playing_state(level);
            let cap = level_spec(level).max_asteroids;
            // Park the rocket out of harm's way and stall asteroid motion
            state.rocket.pos = Vec2::new(10.0, 700.0);
            for _ in 0..2000 {
                for a in &mut state.asteroids {
                    a.speed = 0.0;
                    a.pos.x = 2000.0; // off to the side, no collisions
                }
                tick(&mut state, &TickInput::default(), DT);
                if state.phase != GamePhase::Playing {
                    break;
                }
                assert!(
                    state.asteroids.len() <= cap,
                    "level {level} exceeded cap {cap}"
                );
            }
        }
    }

    #[test]
    fn test_boss_stays_inside_bounce_band() {
        let mut state = playing_state(3);
        state.rocket.pos = Vec2::new(10.0, 640.0);
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), DT);
            if state.phase != GamePhase::Playing {
                break;
            }
            let boss = state.boss.as_ref().unwrap();
            assert!(boss.pos.x >= boss.radius - 1.0);
            assert!(boss.pos.x <= state.bounds.x - boss.radius + 1.0);
            assert!(boss.pos.y >= BOSS_BAND_TOP + boss.radius - 1.0);
            assert!(boss.pos.y <= state.bounds.y * 0.5 + 1.0);
        }
    }

    #[test]
    fn test_victory_sequence_fires_and_culls_lasers() {
        let mut state = playing_state(3);
        // Park the rocket off-field so stray asteroids cannot end the run
        state.rocket.pos = Vec2::new(-500.0, -500.0);
        destroy_boss(&mut state);
        for _ in 0..=(VICTORY_DELAY as u32 + 1) {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, GamePhase::Victory);

        let input = TickInput {
            fire: true,
            aim_right: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.victory_fx.lasers.len(), 1);
        assert!(state.victory_fx.aim_angle > 0.0);
        assert_eq!(count_events(&state, &GameEvent::VictoryLaserFired), 1);

        // Cooldown swallows an immediate second shot
        tick(&mut state, &input, DT);
        assert_eq!(state.victory_fx.lasers.len(), 1);

        // Lasers eventually fade out and are culled
        for _ in 0..2000 {
            tick(&mut state, &TickInput::default(), DT);
            if state.phase != GamePhase::Victory {
                break;
            }
        }
        assert!(state.victory_fx.lasers.is_empty());
    }

    #[test]
    fn test_laser_leaves_screen() {
        let mut state = playing_state(1);
        add_laser_at(&mut state, Vec2::new(100.0, 4.0));
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.lasers.is_empty());
    }

    #[test]
    fn test_asteroid_exits_bottom_bound() {
        let mut state = playing_state(1);
        let id = add_asteroid(&mut state, Vec2::new(100.0, 719.5), 20.0, 0);
        {
            let a = state.asteroids.iter_mut().find(|a| a.id == id).unwrap();
            a.speed = 2.0;
        }
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.asteroids.iter().all(|a| a.id != id));
        // Exiting the bottom is not a kill
        assert_eq!(state.kills, 0);
    }

    #[test]
    fn test_rocket_clamped_to_hud_margins() {
        let mut state = playing_state(1);
        state.rocket.pos = Vec2::new(640.0, HUD_TOP_MARGIN + ROCKET_RADIUS + 1.0);
        let up = TickInput {
            up: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &up, DT);
        }
        assert_eq!(state.rocket.pos.y, HUD_TOP_MARGIN + ROCKET_RADIUS);

        // Boss level also reserves the bottom strip
        let mut state = playing_state(3);
        state.rocket.pos = Vec2::new(10.0, 500.0);
        let down = TickInput {
            down: true,
            ..Default::default()
        };
        for _ in 0..200 {
            tick(&mut state, &down, DT);
            if state.phase != GamePhase::Playing {
                return;
            }
        }
        assert_eq!(
            state.rocket.pos.y,
            state.bounds.y - HUD_BOTTOM_MARGIN - ROCKET_RADIUS
        );
    }

    #[test]
    fn test_lightning_path_shape() {
        let mut state = playing_state(3);
        let path = lightning_path(
            Vec2::new(0.0, 0.0),
            Vec2::new(800.0, 0.0),
            &mut state.rng,
        );
        assert_eq!(path.len(), BOLT_SEGMENTS + 1);
        // Jitter stays within its envelope
        for (i, p) in path.iter().enumerate() {
            let expected_x = i as f32 * 100.0;
            assert!((p.x - expected_x).abs() <= BOLT_JITTER);
            assert!(p.y.abs() <= BOLT_JITTER);
        }
    }

    #[test]
    fn test_determinism_same_seed_same_run() {
        let mut a = GameState::new(777, bounds());
        let mut b = GameState::new(777, bounds());
        let start = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut a, &start, DT);
        tick(&mut b, &start, DT);
        for _ in 0..500 {
            tick(&mut a, &TickInput::default(), DT);
            tick(&mut b, &TickInput::default(), DT);
        }
        assert_eq!(a.asteroids.len(), b.asteroids.len());
        assert_eq!(a.time, b.time);
        for (x, y) in a.asteroids.iter().zip(b.asteroids.iter()) {
            assert_eq!(x.pos, y.pos);
            assert_eq!(x.radius, y.radius);
        }
    }

    #[test]
    fn test_frozen_rocket_can_be_refrozen_after_expiry() {
        let mut state = playing_state(3);
        state.rocket.pos = Vec2::new(640.0, 500.0);
        let rocket_pos = state.rocket.pos;
        let id = state.next_entity_id();
        state.bolts.push(LightningBolt {
            id,
            path: vec![rocket_pos],
            life: 2.0,
            struck: false,
        });
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.rocket.health, 95.0);

        // Let the freeze run out
        for _ in 0..(FREEZE_DURATION as u32 + 2) {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert!(!state.rocket.is_frozen());

        let id = state.next_entity_id();
        let rocket_pos = state.rocket.pos;
        state.bolts.push(LightningBolt {
            id,
            path: vec![rocket_pos],
            life: 2.0,
            struck: false,
        });
        tick(&mut state, &TickInput::default(), DT);
        assert!(state.rocket.is_frozen());
        assert_eq!(state.rocket.health, 90.0);
    }

    proptest! {
        #[test]
        fn prop_time_advance_never_exceeds_clamp(dt in -10.0f32..1000.0) {
            let mut state = playing_state(1);
            let before = state.time;
            tick(&mut state, &TickInput::default(), dt);
            prop_assert!(state.time - before <= MAX_FRAME_STEP as f64 + 1e-9);
            prop_assert!(state.time >= before);
        }

        #[test]
        fn prop_health_and_lives_never_negative(
            damage in proptest::collection::vec(1.0f32..200.0, 1..8)
        ) {
            let mut state = playing_state(3);
            for d in damage {
                damage_health(&mut state, d);
            }
            prop_assert!(state.rocket.health >= 0.0);
            // Terminal transition happened at most once
            let overs = state
                .events
                .iter()
                .filter(|e| **e == GameEvent::GameOverEntered)
                .count();
            prop_assert!(overs <= 1);
        }

        #[test]
        fn prop_rocket_stays_in_playfield(seed in 0u64..5000, steps in 1usize..200) {
            let mut state = GameState::new(seed, Vec2::new(1280.0, 720.0));
            load_level(&mut state, 1);
            let inputs = [
                TickInput { left: true, ..Default::default() },
                TickInput { right: true, ..Default::default() },
                TickInput { up: true, ..Default::default() },
                TickInput { down: true, ..Default::default() },
            ];
            for i in 0..steps {
                tick(&mut state, &inputs[i % inputs.len()], 1.0);
                if state.phase != GamePhase::Playing {
                    break;
                }
                prop_assert!(state.rocket.pos.x >= 0.0);
                prop_assert!(state.rocket.pos.x <= state.bounds.x);
                prop_assert!(state.rocket.pos.y >= HUD_TOP_MARGIN);
                prop_assert!(state.rocket.pos.y <= state.bounds.y);
            }
        }
    }

    #[test]
    fn test_rocket_default_visible() {
        let rocket = Rocket::new(Vec2::ZERO);
        assert!(rocket.is_visible());
        assert!(!rocket.is_frozen());
    }
}
