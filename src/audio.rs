//! Audio playback driven by simulation events
//!
//! The sim never touches sound directly; it emits [`GameEvent`]s and this
//! module maps them to clip playback and music control. Autoplay rejections
//! and other playback failures are logged and ignored - the game keeps
//! running without the sound.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect clips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Laser,
    Hit,
    Destroy,
    BossHit,
    BossExplosion,
    RocketHit,
    Freeze,
    /// Played on life loss
    OneUp,
}

impl Sfx {
    pub fn source(&self) -> &'static str {
        match self {
            Sfx::Laser => "assets/sound_fx/laser3.wav",
            Sfx::Hit => "assets/sound_fx/hit_sound.wav",
            Sfx::Destroy => "assets/sound_fx/explosion3.wav",
            Sfx::BossHit => "assets/sound_fx/explosion3.wav",
            Sfx::BossExplosion => "assets/sound_fx/huge_explosion.wav",
            Sfx::RocketHit => "assets/sound_fx/rocket_hit.mp3",
            Sfx::Freeze => "assets/sound_fx/rocket_buzz.mp3",
            Sfx::OneUp => "assets/sound_fx/one_up.wav",
        }
    }

    /// Relative clip volume before the settings gain is applied
    pub fn base_volume(&self) -> f32 {
        match self {
            Sfx::Laser => 0.5,
            Sfx::BossHit | Sfx::BossExplosion => 0.6,
            _ => 1.0,
        }
    }
}

/// Music tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicTrack {
    Title,
    Level1,
    Level2,
    Level3,
    GameOver,
    Victory,
}

impl MusicTrack {
    pub fn source(&self) -> &'static str {
        match self {
            MusicTrack::Title => "assets/sound_fx/MEGA.mp3",
            MusicTrack::Level1 => "assets/sound_fx/level1_music.mp3",
            MusicTrack::Level2 => "assets/sound_fx/level2_music.mp3",
            MusicTrack::Level3 => "assets/sound_fx/level3_music.mp3",
            MusicTrack::GameOver => "assets/sound_fx/theme3.wav",
            MusicTrack::Victory => "assets/sound_fx/oneLast.mp3",
        }
    }

    /// Seconds into the track playback should start
    pub fn start_offset(&self) -> f64 {
        match self {
            MusicTrack::Level2 => 5.0,
            MusicTrack::Level3 => 1.0,
            _ => 0.0,
        }
    }

    pub fn looping(&self) -> bool {
        matches!(self, MusicTrack::Title | MusicTrack::Level1 | MusicTrack::Level2 | MusicTrack::Level3)
    }

    pub fn for_level(level: u32) -> MusicTrack {
        match level {
            1 => MusicTrack::Level1,
            2 => MusicTrack::Level2,
            _ => MusicTrack::Level3,
        }
    }
}

/// What the platform audio layer should do in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    PlaySfx(Sfx),
    PlayMusic(MusicTrack),
    StopMusic,
}

/// Map a simulation event to audio commands. Pure, so the mapping is
/// testable without a browser.
pub fn commands_for(event: &GameEvent) -> Vec<AudioCommand> {
    use AudioCommand::*;
    match event {
        GameEvent::TitleEntered => vec![StopMusic, PlayMusic(MusicTrack::Title)],
        GameEvent::LevelStarted(level) => {
            vec![StopMusic, PlayMusic(MusicTrack::for_level(*level))]
        }
        GameEvent::LaserFired | GameEvent::VictoryLaserFired => vec![PlaySfx(Sfx::Laser)],
        GameEvent::AsteroidHit => vec![PlaySfx(Sfx::Hit)],
        GameEvent::AsteroidDestroyed => vec![PlaySfx(Sfx::Destroy)],
        GameEvent::BossHit => vec![PlaySfx(Sfx::BossHit)],
        GameEvent::BossDestroyed => vec![StopMusic, PlaySfx(Sfx::BossExplosion)],
        GameEvent::RocketHit => vec![PlaySfx(Sfx::RocketHit)],
        GameEvent::LifeLost => vec![PlaySfx(Sfx::OneUp)],
        GameEvent::Frozen => vec![PlaySfx(Sfx::Freeze)],
        GameEvent::GameOverEntered => vec![StopMusic, PlayMusic(MusicTrack::GameOver)],
        GameEvent::VictoryEntered => vec![StopMusic, PlayMusic(MusicTrack::Victory)],
    }
}

/// Browser-side audio manager over `HtmlAudioElement` clips
#[cfg(target_arch = "wasm32")]
pub struct AudioManager {
    music: Option<(MusicTrack, web_sys::HtmlAudioElement)>,
    sfx_gain: f32,
    music_gain: f32,
    muted: bool,
}

#[cfg(target_arch = "wasm32")]
impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            music: None,
            sfx_gain: settings.sfx_gain(),
            music_gain: settings.music_gain(),
            muted: false,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some((_, el)) = &self.music {
            el.set_muted(muted);
        }
    }

    /// Apply every command derived from one simulation event
    pub fn handle(&mut self, event: &GameEvent) {
        for command in commands_for(event) {
            match command {
                AudioCommand::PlaySfx(sfx) => self.play_sfx(sfx),
                AudioCommand::PlayMusic(track) => self.play_music(track),
                AudioCommand::StopMusic => self.stop_music(),
            }
        }
    }

    fn play_sfx(&self, sfx: Sfx) {
        if self.muted || self.sfx_gain <= 0.0 {
            return;
        }
        match web_sys::HtmlAudioElement::new_with_src(sfx.source()) {
            Ok(el) => {
                el.set_volume((sfx.base_volume() * self.sfx_gain) as f64);
                Self::play_logged(&el, "sfx");
            }
            Err(_) => log::warn!("Could not create audio element for {sfx:?}"),
        }
    }

    fn play_music(&mut self, track: MusicTrack) {
        self.stop_music();
        if self.music_gain <= 0.0 {
            return;
        }
        match web_sys::HtmlAudioElement::new_with_src(track.source()) {
            Ok(el) => {
                el.set_volume(self.music_gain as f64);
                el.set_loop(track.looping());
                el.set_current_time(track.start_offset());
                el.set_muted(self.muted);
                Self::play_logged(&el, "music");
                self.music = Some((track, el));
            }
            Err(_) => log::warn!("Could not create audio element for {track:?}"),
        }
    }

    fn stop_music(&mut self) {
        if let Some((track, el)) = self.music.take() {
            let _ = el.pause();
            el.set_current_time(0.0);
            log::debug!("Stopped music track {track:?}");
        }
    }

    /// Play, logging asynchronous autoplay rejections instead of surfacing
    /// them - the game continues without the sound
    fn play_logged(el: &web_sys::HtmlAudioElement, what: &'static str) {
        match el.play() {
            Ok(promise) => {
                wasm_bindgen_futures::spawn_local(async move {
                    if wasm_bindgen_futures::JsFuture::from(promise).await.is_err() {
                        log::warn!("Playback rejected for {what}; continuing silently");
                    }
                });
            }
            Err(_) => log::warn!("Playback failed for {what}; continuing silently"),
        }
    }
}

/// Native stub: logs commands instead of playing them
#[cfg(not(target_arch = "wasm32"))]
pub struct AudioManager {
    sfx_gain: f32,
}

#[cfg(not(target_arch = "wasm32"))]
impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            sfx_gain: settings.sfx_gain(),
        }
    }

    pub fn set_muted(&mut self, _muted: bool) {}

    pub fn handle(&mut self, event: &GameEvent) {
        if self.sfx_gain > 0.0 {
            for command in commands_for(event) {
                log::debug!("audio: {command:?}");
            }
        }
    }
}
