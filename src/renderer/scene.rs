//! Declarative scene building
//!
//! Converts a [`GameState`] snapshot into a flat draw list. Visual effects
//! (freeze glow, hit flashes, blink) are derived from state flags here -
//! nothing in the game rebinds draw behavior at runtime.

use glam::Vec2;

use crate::assets::SpriteKey;
use crate::consts::*;
use crate::settings::Settings;
use crate::sim::state::{AsteroidKind, GamePhase, GameState};

/// RGBA color; alpha in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// CSS color string for the canvas backend
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

pub const WHITE: Color = Color::rgb(255, 255, 255);
pub const BLACK: Color = Color::rgb(0, 0, 0);
pub const RED: Color = Color::rgb(255, 0, 0);
pub const LIME: Color = Color::rgb(50, 255, 50);
pub const LIGHTNING_BLUE: Color = Color::rgba(173, 216, 230, 0.8);

/// Text fill styles the canvas backend knows how to build
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextStyle {
    Solid(Color),
    /// Hue-cycling horizontal gradient (title, victory text)
    Rainbow { base_hue: f32 },
    /// Orange-gold-red gradient (banner, boss label)
    Sunset,
    /// Cyan-magenta-yellow gradient (counters)
    Neon,
}

#[derive(Debug, Clone)]
pub struct Text {
    pub content: String,
    pub pos: Vec2,
    pub size_px: f32,
    pub style: TextStyle,
    /// Uniform scale applied around `pos` (banner pulse)
    pub scale: f32,
    pub outline: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Sprite {
    pub key: SpriteKey,
    pub pos: Vec2,
    pub size: Vec2,
    pub rotation: f32,
}

/// Filled circle
#[derive(Debug, Clone, Copy)]
pub struct Disc {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
}

/// Soft-edged circle drawn over a sprite (hit flash, freeze aura)
#[derive(Debug, Clone, Copy)]
pub struct Glow {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
}

/// Open polyline (lasers, lightning)
#[derive(Debug, Clone)]
pub struct Stroke {
    pub points: Vec<Vec2>,
    pub width: f32,
    pub color: Color,
    /// Shadow blur color, for lightning glow
    pub shadow: Option<Color>,
}

/// Axis-aligned filled rectangle
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
    pub color: Color,
}

/// Labelled progress bar (health bars)
#[derive(Debug, Clone)]
pub struct Bar {
    pub pos: Vec2,
    pub size: Vec2,
    /// Filled fraction, 0.0..=1.0
    pub fraction: f32,
    pub fill: Color,
}

/// Complete draw list for one frame, in paint order
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: Option<SpriteKey>,
    pub rects: Vec<Rect>,
    pub discs: Vec<Disc>,
    pub sprites: Vec<Sprite>,
    pub glows: Vec<Glow>,
    pub strokes: Vec<Stroke>,
    pub bars: Vec<Bar>,
    pub texts: Vec<Text>,
}

/// Green-to-red interpolation over remaining health fraction, matching the
/// 510-step ramp both health bars use
pub fn health_bar_color(remaining: f32) -> Color {
    let remaining = remaining.clamp(0.0, 1.0);
    let r = (510.0 * (1.0 - remaining)).min(255.0) as u8;
    let g = (510.0 * remaining).min(255.0) as u8;
    Color::rgb(r, g, 0)
}

/// Build the draw list for the current frame
pub fn build_scene(state: &GameState, settings: &Settings) -> Scene {
    let mut scene = Scene::default();
    match state.phase {
        GamePhase::Title => build_title(state, settings, &mut scene),
        GamePhase::Playing => build_playing(state, settings, &mut scene),
        GamePhase::Victory => build_victory(state, &mut scene),
        GamePhase::GameOver => build_game_over(state, &mut scene),
    }
    push_particles(state, settings, &mut scene);
    scene
}

fn build_title(state: &GameState, settings: &Settings, scene: &mut Scene) {
    let bounds = state.bounds;
    scene.background = Some(SpriteKey::TitleBackground);

    if settings.effective_starfield() {
        for star in &state.stars {
            let twinkle =
                ((state.time / 20.0) as f32 + star.pos.x + star.pos.y).sin() * 0.3;
            let alpha = (star.base_alpha + twinkle).clamp(0.0, 1.0);
            scene.discs.push(Disc {
                pos: star.pos,
                radius: star.radius,
                color: WHITE.with_alpha(alpha),
            });
        }
    }

    let base_hue = (state.time % 360.0) as f32;
    scene.texts.push(Text {
        content: "DEFENDER".into(),
        pos: Vec2::new(bounds.x / 2.0, bounds.y / 2.0 - 100.0),
        size_px: 170.0,
        style: TextStyle::Rainbow { base_hue },
        scale: 1.0,
        outline: true,
    });

    // Blinking start prompt
    let half_periods = (state.time / TITLE_BLINK_HALF_PERIOD) as u64;
    if half_periods.is_multiple_of(2) {
        scene.texts.push(Text {
            content: "PRESS SPACE TO DEFEND".into(),
            pos: Vec2::new(bounds.x / 2.0, bounds.y / 2.0 - 40.0),
            size_px: 30.0,
            style: TextStyle::Solid(WHITE),
            scale: 1.0,
            outline: false,
        });
    }

    // Bottom masking bar
    scene.rects.push(Rect {
        pos: Vec2::new(0.0, bounds.y - 100.0),
        size: Vec2::new(bounds.x, 100.0),
        color: BLACK,
    });
}

fn build_playing(state: &GameState, settings: &Settings, scene: &mut Scene) {
    scene.background = Some(SpriteKey::Background);

    push_asteroids(state, settings, scene);
    push_boss(state, settings, scene);
    push_bolts(state, scene);
    push_lasers(state, scene);
    push_rocket(state, settings, scene);
    push_hud(state, scene);
    push_banner(state, settings, scene);
}

fn push_asteroids(state: &GameState, settings: &Settings, scene: &mut Scene) {
    for a in &state.asteroids {
        let key = match a.kind {
            AsteroidKind::Rock => SpriteKey::Asteroid(a.sprite_index),
            AsteroidKind::Satellite => SpriteKey::Satellite,
        };
        scene.sprites.push(Sprite {
            key,
            pos: a.pos,
            size: Vec2::splat(a.radius * 2.0),
            rotation: a.rotation,
        });
        if settings.glow_effects && a.flash_frames > 0.0 {
            let intensity = (200.0 + a.flash_frames * 5.0).min(255.0) as u8;
            scene.glows.push(Glow {
                pos: a.pos,
                radius: a.radius,
                color: Color::rgba(intensity, 0, 0, 0.4),
            });
        }
    }
}

fn push_boss(state: &GameState, settings: &Settings, scene: &mut Scene) {
    let Some(boss) = state.boss.as_ref() else {
        return;
    };
    if boss.destroyed {
        return;
    }

    // Pulsing aura
    let pulse = boss.radius + ((state.time / 3.0).sin() * 10.0) as f32;
    scene.glows.push(Glow {
        pos: boss.pos,
        radius: pulse,
        color: Color::rgba(0, 0, 255, 0.3),
    });

    scene.discs.push(Disc {
        pos: boss.pos,
        radius: boss.radius,
        color: Color::rgb(0, 0, 139),
    });

    if settings.glow_effects && boss.flash_frames > 0.0 {
        scene.glows.push(Glow {
            pos: boss.pos,
            radius: boss.radius,
            color: Color::rgba(255, 80, 0, 0.4),
        });
    }
}

fn push_bolts(state: &GameState, scene: &mut Scene) {
    for bolt in &state.bolts {
        scene.strokes.push(Stroke {
            points: bolt.path.clone(),
            width: 3.0,
            color: LIGHTNING_BLUE,
            shadow: Some(Color::rgb(0, 0, 255)),
        });
    }
}

fn push_lasers(state: &GameState, scene: &mut Scene) {
    for laser in &state.lasers {
        scene.strokes.push(Stroke {
            points: vec![laser.pos, laser.pos - Vec2::new(0.0, LASER_LENGTH)],
            width: 3.0,
            color: LIME,
            shadow: None,
        });
    }
}

fn push_rocket(state: &GameState, settings: &Settings, scene: &mut Scene) {
    let rocket = &state.rocket;
    if !rocket.is_visible() {
        return;
    }

    if settings.glow_effects && rocket.flash_frames > 0.0 {
        // Blue aura while frozen, fading with the timer
        let intensity = (100.0 + rocket.flash_frames * 5.0).min(255.0) as u8;
        scene.glows.push(Glow {
            pos: rocket.pos,
            radius: ROCKET_RADIUS * 2.0,
            color: Color::rgba(0, intensity, 255, 0.6),
        });
    }

    scene.sprites.push(Sprite {
        key: SpriteKey::Rocket,
        pos: rocket.pos,
        // Skinnier than tall, like the source art
        size: Vec2::new(ROCKET_RADIUS * 4.0 * 0.8, ROCKET_RADIUS * 4.0 * 1.5),
        rotation: 0.0,
    });
}

fn push_hud(state: &GameState, scene: &mut Scene) {
    let bounds = state.bounds;
    let spec = state.spec();

    if spec.boss {
        // Boss health bar, top center, drains as damage accumulates
        if let Some(boss) = state.boss.as_ref() {
            let remaining = 1.0 - boss.damage_ratio();
            let size = Vec2::new(bounds.x * 0.5, 30.0);
            let pos = Vec2::new((bounds.x - size.x) / 2.0, 90.0);
            scene.texts.push(Text {
                content: "Boss".into(),
                pos: Vec2::new(bounds.x / 2.0, pos.y - 25.0),
                size_px: 60.0,
                style: TextStyle::Sunset,
                scale: 1.0,
                outline: false,
            });
            scene.bars.push(Bar {
                pos,
                size,
                fraction: remaining,
                fill: health_bar_color(remaining),
            });
        }

        // Rocket health bar above the bottom margin
        let remaining = state.rocket.health / ROCKET_MAX_HEALTH;
        let size = Vec2::new(bounds.x * 0.5, 30.0);
        scene.bars.push(Bar {
            pos: Vec2::new((bounds.x - size.x) / 2.0, bounds.y - 130.0),
            size,
            fraction: remaining,
            fill: health_bar_color(remaining),
        });
        scene.texts.push(Text {
            content: "NASA".into(),
            pos: Vec2::new(bounds.x / 2.0, bounds.y - 40.0),
            size_px: 60.0,
            style: TextStyle::Neon,
            scale: 1.0,
            outline: false,
        });
    } else {
        // Lives row, top center
        let icon = Vec2::new(50.0, 90.0);
        let margin = 10.0;
        let lives = state.rocket.lives as f32;
        let total_width = lives * icon.x + (lives - 1.0).max(0.0) * margin;
        let start_x = (bounds.x - total_width) / 2.0;
        for i in 0..state.rocket.lives {
            scene.sprites.push(Sprite {
                key: SpriteKey::Rocket,
                pos: Vec2::new(
                    start_x + (icon.x + margin) * i as f32 + icon.x / 2.0,
                    20.0 + icon.y / 2.0,
                ),
                size: icon,
                rotation: 0.0,
            });
        }

        // Kill counters
        let top = bounds.y * 0.07;
        scene.texts.push(Text {
            content: format!("Destroyed: {}", state.kills),
            pos: Vec2::new(bounds.x / 2.0 - bounds.x * 0.25, top),
            size_px: 80.0,
            style: TextStyle::Neon,
            scale: 1.0,
            outline: false,
        });
        scene.texts.push(Text {
            content: format!("Remaining: {}", state.kills_remaining()),
            pos: Vec2::new(bounds.x / 2.0 + bounds.x * 0.25, top),
            size_px: 80.0,
            style: TextStyle::Neon,
            scale: 1.0,
            outline: false,
        });
    }
}

fn push_banner(state: &GameState, settings: &Settings, scene: &mut Scene) {
    let Some(banner) = state.banner.as_ref() else {
        return;
    };
    let scale = if settings.reduced_motion {
        1.0
    } else {
        1.0 + ((LEVEL_BANNER_FRAMES - banner.frames) / 10.0).sin() * 0.05
    };
    scene.texts.push(Text {
        content: banner.text.clone(),
        pos: Vec2::new(state.bounds.x / 2.0, state.bounds.y / 2.0 - 40.0),
        size_px: 120.0,
        style: TextStyle::Sunset,
        scale,
        outline: true,
    });
}

fn build_victory(state: &GameState, scene: &mut Scene) {
    let bounds = state.bounds;
    let vanish = Vec2::new(bounds.x / 2.0, bounds.y / 1.5);
    let max_fade = bounds.length() * 0.35;

    scene.rects.push(Rect {
        pos: Vec2::ZERO,
        size: bounds,
        color: BLACK,
    });

    for laser in &state.victory_fx.lasers {
        let taper = (1.0 - laser.pos.distance(vanish) / max_fade).clamp(0.0, 1.0);
        let dir = Vec2::new(laser.angle.cos(), laser.angle.sin());
        scene.strokes.push(Stroke {
            points: vec![laser.pos, laser.pos - dir * 20.0],
            width: (6.0 * taper).max(0.5),
            color: LIME.with_alpha(taper.max(0.1)),
            shadow: None,
        });
    }

    let base_hue = ((state.time * 2.0) % 360.0) as f32;
    scene.texts.push(Text {
        content: "CONGRATULATIONS DEFENDER!!".into(),
        pos: Vec2::new(bounds.x / 2.0, bounds.y / 2.0 - 60.0),
        size_px: 150.0,
        style: TextStyle::Rainbow { base_hue },
        scale: 1.0,
        outline: false,
    });

    if (state.time % 60.0) < 30.0 {
        scene.texts.push(Text {
            content: "CELEBRATE WITH YOUR LASERS!".into(),
            pos: Vec2::new(bounds.x / 2.0, bounds.y / 2.0 + 40.0),
            size_px: 35.0,
            style: TextStyle::Solid(WHITE),
            scale: 1.0,
            outline: false,
        });
    }
}

fn build_game_over(state: &GameState, scene: &mut Scene) {
    scene.rects.push(Rect {
        pos: Vec2::ZERO,
        size: state.bounds,
        color: BLACK,
    });
    scene.texts.push(Text {
        content: "GAME OVER".into(),
        pos: Vec2::new(state.bounds.x / 2.0, state.bounds.y / 2.0),
        size_px: 140.0,
        style: TextStyle::Solid(RED),
        scale: 1.0,
        outline: false,
    });
}

fn push_particles(state: &GameState, settings: &Settings, scene: &mut Scene) {
    let cap = settings.max_particles();
    for (i, p) in state.particles.iter().take(cap).enumerate() {
        let fade = (p.life / p.max_life).clamp(0.0, 1.0);
        // Vary the ember hue deterministically per particle
        let g = ((i * 53) % 256) as u8;
        scene.discs.push(Disc {
            pos: p.pos,
            radius: p.radius,
            color: Color::rgba(255, g, 0, fade),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Banner, Particle};
    use crate::sim::{GameState, TickInput, tick};

    fn bounds() -> Vec2 {
        Vec2::new(1280.0, 720.0)
    }

    fn playing_state(level: u32) -> GameState {
        let mut state = GameState::new(11, bounds());
        let start = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &start, 1.0);
        // Walk forward to the requested level
        while state.level < level {
            state.kills = state.spec().kill_target;
            tick(&mut state, &TickInput::default(), 1.0);
        }
        state
    }

    #[test]
    fn test_title_scene_blinks_prompt() {
        let settings = Settings::default();
        let mut state = GameState::new(11, bounds());

        state.time = 0.0;
        let scene = build_scene(&state, &settings);
        assert!(scene.texts.iter().any(|t| t.content.contains("PRESS SPACE")));

        state.time = TITLE_BLINK_HALF_PERIOD + 1.0;
        let scene = build_scene(&state, &settings);
        assert!(!scene.texts.iter().any(|t| t.content.contains("PRESS SPACE")));
        // The title itself never blinks
        assert!(scene.texts.iter().any(|t| t.content == "DEFENDER"));
    }

    #[test]
    fn test_title_starfield_respects_settings() {
        let state = GameState::new(11, bounds());
        let mut settings = Settings::default();
        assert!(!build_scene(&state, &settings).discs.is_empty());

        settings.reduced_motion = true;
        assert!(build_scene(&state, &settings).discs.is_empty());
    }

    #[test]
    fn test_playing_scene_counters() {
        let settings = Settings::default();
        let mut state = playing_state(1);
        state.kills = 1;
        let scene = build_scene(&state, &settings);
        assert!(scene.texts.iter().any(|t| t.content == "Destroyed: 1"));
        assert!(scene.texts.iter().any(|t| t.content == "Remaining: 2"));
        // Lives row shows one rocket icon per life plus the ship itself
        let rockets = scene
            .sprites
            .iter()
            .filter(|s| s.key == SpriteKey::Rocket)
            .count();
        assert_eq!(rockets, state.rocket.lives as usize + 1);
    }

    #[test]
    fn test_boss_hud_replaces_counters() {
        let settings = Settings::default();
        let mut state = playing_state(3);
        state.boss.as_mut().unwrap().current_hits = 25.0;
        let scene = build_scene(&state, &settings);

        assert!(!scene.texts.iter().any(|t| t.content.starts_with("Destroyed")));
        assert!(scene.texts.iter().any(|t| t.content == "Boss"));
        assert!(scene.texts.iter().any(|t| t.content == "NASA"));
        assert_eq!(scene.bars.len(), 2);
        // Boss bar drains with damage
        assert!((scene.bars[0].fraction - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_health_bar_color_ramp() {
        assert_eq!(health_bar_color(1.0), Color::rgb(0, 255, 0));
        assert_eq!(health_bar_color(0.0), Color::rgb(255, 0, 0));
        let mid = health_bar_color(0.5);
        assert_eq!((mid.r, mid.g), (255, 255));
    }

    #[test]
    fn test_blinking_rocket_is_hidden() {
        let settings = Settings::default();
        let mut state = playing_state(1);
        state.rocket.blink_frames = LIFE_BLINK_HALF_PERIOD * 1.5;
        let scene = build_scene(&state, &settings);
        // Only the lives-row icons remain
        let rockets = scene
            .sprites
            .iter()
            .filter(|s| s.key == SpriteKey::Rocket)
            .count();
        assert_eq!(rockets, state.rocket.lives as usize);
    }

    #[test]
    fn test_particle_cap_applies() {
        let mut settings = Settings::default();
        settings.quality = crate::settings::QualityPreset::Low;
        let mut state = playing_state(1);
        for _ in 0..500 {
            state.particles.push(Particle {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                radius: 1.0,
                life: 10.0,
                max_life: 10.0,
            });
        }
        let scene = build_scene(&state, &settings);
        let particle_discs = scene.discs.len();
        assert!(particle_discs <= settings.max_particles());
    }

    #[test]
    fn test_banner_rendered_with_pulse() {
        let mut settings = Settings::default();
        let mut state = playing_state(1);
        state.banner = Some(Banner {
            text: "Level 1".into(),
            frames: 100.0,
        });
        let scene = build_scene(&state, &settings);
        let banner = scene.texts.iter().find(|t| t.content == "Level 1").unwrap();
        assert!(banner.scale != 1.0);

        settings.reduced_motion = true;
        let scene = build_scene(&state, &settings);
        let banner = scene.texts.iter().find(|t| t.content == "Level 1").unwrap();
        assert_eq!(banner.scale, 1.0);
    }

    #[test]
    fn test_victory_and_game_over_scenes() {
        let settings = Settings::default();
        let mut state = playing_state(1);

        state.phase = crate::sim::GamePhase::Victory;
        state.time = 0.0;
        let scene = build_scene(&state, &settings);
        assert!(scene.texts.iter().any(|t| t.content.contains("CONGRATULATIONS")));
        assert!(scene.texts.iter().any(|t| t.content.contains("CELEBRATE")));

        state.phase = crate::sim::GamePhase::GameOver;
        let scene = build_scene(&state, &settings);
        assert!(scene.texts.iter().any(|t| t.content == "GAME OVER"));
    }

    #[test]
    fn test_color_css() {
        assert_eq!(Color::rgb(255, 0, 0).css(), "rgba(255, 0, 0, 1)");
        assert_eq!(
            Color::rgba(0, 10, 20, 0.5).css(),
            "rgba(0, 10, 20, 0.5)"
        );
    }
}
