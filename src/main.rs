//! Astro Defender entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::KeyboardEvent;

    use astro_defender::apod;
    use astro_defender::assets::web::{SpriteStore, load_bundled_sprites, set_background_url};
    use astro_defender::assets::{LoadGate, SpriteKey};
    use astro_defender::audio::AudioManager;
    use astro_defender::consts::*;
    use astro_defender::renderer::canvas::CanvasRenderer;
    use astro_defender::renderer::scene::{self, TextStyle};
    use astro_defender::renderer::build_scene;
    use astro_defender::sim::state::TITLE_BACKGROUND_DATE;
    use astro_defender::sim::{GameEvent, GameState, TickInput, tick};
    use astro_defender::{BackgroundChoices, Settings};

    /// Held-key flags shared between event listeners and the frame loop
    #[derive(Debug, Default)]
    struct InputState {
        left: bool,
        right: bool,
        up: bool,
        down: bool,
        /// One-shot, set on keydown and cleared after the next tick
        fire: bool,
    }

    impl InputState {
        fn as_tick_input(&self) -> TickInput {
            TickInput {
                left: self.left,
                right: self.right,
                up: self.up,
                down: self.down,
                fire: self.fire,
                // The arrows double as aim controls on the victory screen
                aim_left: self.left,
                aim_right: self.right,
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        choices: BackgroundChoices,
        input: Rc<RefCell<InputState>>,
        gate: Rc<RefCell<LoadGate>>,
        store: Rc<RefCell<SpriteStore>>,
        api_key: Rc<RefCell<Option<String>>>,
        renderer: CanvasRenderer,
        audio: AudioManager,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            if self.last_time == 0.0 {
                self.last_time = time;
                return;
            }
            let dt = ((time - self.last_time) / FRAME_MS) as f32;
            self.last_time = time;

            // Startup barrier: wait until every asset has reported in
            if !self.gate.borrow().all_ready() {
                self.render_loading();
                return;
            }

            let input = {
                let mut held = self.input.borrow_mut();
                let input = held.as_tick_input();
                held.fire = false;
                input
            };
            tick(&mut self.state, &input, dt);

            for event in self.state.take_events() {
                self.audio.handle(&event);
                if let GameEvent::LevelStarted(level) = event {
                    self.request_level_background(level);
                }
            }

            let scene = build_scene(&self.state, &self.settings);
            self.renderer.render(&scene, &self.store.borrow());

            self.track_fps(time);
        }

        fn render_loading(&self) {
            let mut scene = scene::Scene::default();
            scene.texts.push(scene::Text {
                content: "LOADING...".into(),
                pos: self.state.bounds / 2.0,
                size_px: 60.0,
                style: TextStyle::Solid(scene::WHITE),
                scale: 1.0,
                outline: false,
            });
            self.renderer.render(&scene, &self.store.borrow());
        }

        /// Fire-and-forget background fetch for a level, stepping back a
        /// bounded number of days on failure. The level never waits on it.
        fn request_level_background(&self, level: u32) {
            let date = self.choices.date_for_level(level).to_string();
            let gate = self.gate.clone();
            let store = self.store.clone();
            let api_key = self.api_key.clone();

            wasm_bindgen_futures::spawn_local(async move {
                let Some(key) = api_key.borrow().clone() else {
                    log::warn!("No API key; level {level} keeps its current background");
                    gate.borrow_mut().mark_failed(SpriteKey::Background);
                    return;
                };

                let mut current = date;
                for _ in 0..3 {
                    match apod::web::fetch_apod(&current, &key).await {
                        Ok(descriptor) => {
                            let _ = set_background_url(
                                gate.clone(),
                                store.clone(),
                                SpriteKey::Background,
                                &descriptor.url,
                            );
                            return;
                        }
                        Err(err) => {
                            log::warn!("Background fetch for {current} failed: {err}");
                            match apod::previous_date(&current) {
                                Some(prev) => current = prev,
                                None => break,
                            }
                        }
                    }
                }
                // Level proceeds without a picture
                gate.borrow_mut().mark_failed(SpriteKey::Background);
            });
        }

        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 {
                let elapsed = time - oldest;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
            if self.settings.show_fps {
                if let Some(el) = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("hud-fps"))
                {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let canvas: web_sys::HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no #gameCanvas element")
            .dyn_into()
            .expect("#gameCanvas is not a canvas");

        let width = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(1280.0);
        let height = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(720.0);

        let renderer = CanvasRenderer::new(canvas).expect("canvas 2d context");
        renderer.resize(width as u32, height as u32);

        let settings = Settings::load();
        let choices = BackgroundChoices::load();
        let audio = AudioManager::new(&settings);

        let gate = Rc::new(RefCell::new(LoadGate::new()));
        let store = Rc::new(RefCell::new(SpriteStore::default()));
        let api_key = Rc::new(RefCell::new(None::<String>));

        if let Err(err) = load_bundled_sprites(gate.clone(), store.clone()) {
            log::error!("Sprite loading setup failed: {err:?}");
        }

        // Fetch the API key, then the title and level-1 backgrounds.
        // Failures flip the gate flags so startup can proceed regardless.
        {
            let gate = gate.clone();
            let store = store.clone();
            let api_key = api_key.clone();
            let level1_date = choices.date_for_level(1).to_string();
            wasm_bindgen_futures::spawn_local(async move {
                match apod::web::fetch_api_key().await {
                    Ok(key) => {
                        for (sprite, date) in [
                            (SpriteKey::TitleBackground, TITLE_BACKGROUND_DATE),
                            (SpriteKey::Background, level1_date.as_str()),
                        ] {
                            match apod::web::fetch_apod(date, &key).await {
                                Ok(descriptor) => {
                                    let _ = set_background_url(
                                        gate.clone(),
                                        store.clone(),
                                        sprite,
                                        &descriptor.url,
                                    );
                                }
                                Err(err) => {
                                    log::warn!("Startup background {date} failed: {err}");
                                    gate.borrow_mut().mark_failed(sprite);
                                }
                            }
                        }
                        *api_key.borrow_mut() = Some(key);
                    }
                    Err(err) => {
                        log::warn!("API key fetch failed: {err}; backgrounds disabled");
                        let mut gate = gate.borrow_mut();
                        gate.mark_failed(SpriteKey::TitleBackground);
                        gate.mark_failed(SpriteKey::Background);
                    }
                }
            });
        }

        let seed = js_sys::Date::now() as u64;
        let state = GameState::new(seed, Vec2::new(width as f32, height as f32));
        log::info!("Starting with seed {seed}");

        let input = Rc::new(RefCell::new(InputState::default()));
        setup_keyboard(&document, input.clone());

        let game = Rc::new(RefCell::new(Game {
            state,
            settings,
            choices,
            input,
            gate,
            store,
            api_key,
            renderer,
            audio,
            last_time: 0.0,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        setup_mute_on_blur(&window, game.clone());
        start_frame_loop(game);
    }

    fn setup_keyboard(document: &web_sys::Document, input: Rc<RefCell<InputState>>) {
        {
            let input = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut input = input.borrow_mut();
                match event.code().as_str() {
                    "ArrowLeft" | "KeyA" => input.left = true,
                    "ArrowRight" | "KeyD" => input.right = true,
                    "ArrowUp" | "KeyW" => input.up = true,
                    "ArrowDown" | "KeyS" => input.down = true,
                    "Space" => {
                        event.prevent_default();
                        input.fire = true;
                    }
                    _ => {}
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut input = input.borrow_mut();
                match event.code().as_str() {
                    "ArrowLeft" | "KeyA" => input.left = false,
                    "ArrowRight" | "KeyD" => input.right = false,
                    "ArrowUp" | "KeyW" => input.up = false,
                    "ArrowDown" | "KeyS" => input.down = false,
                    _ => {}
                }
            });
            let _ = document
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_mute_on_blur(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().audio.set_muted(false);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn start_frame_loop(game: Rc<RefCell<Game>>) {
        let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();

        *g.borrow_mut() = Some(Closure::new(move |time: f64| {
            game.borrow_mut().frame(time);
            request_animation_frame(f.borrow().as_ref().unwrap());
        }));
        request_animation_frame(g.borrow().as_ref().unwrap());
    }

    fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
        web_sys::window()
            .expect("no window")
            .request_animation_frame(f.as_ref().unchecked_ref())
            .expect("requestAnimationFrame failed");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;

    use astro_defender::Settings;
    use astro_defender::audio::AudioManager;
    use astro_defender::renderer::build_scene;
    use astro_defender::sim::{GamePhase, GameState, TickInput, tick};

    env_logger::init();
    log::info!("Astro Defender (native) starting...");
    log::info!("Native mode runs a headless smoke simulation - serve the web build to play");

    let settings = Settings::load();
    let mut audio = AudioManager::new(&settings);
    let mut state = GameState::new(20241121, Vec2::new(1280.0, 720.0));

    // Start the game, then idle through a couple of minutes of play
    let start = TickInput {
        fire: true,
        ..Default::default()
    };
    tick(&mut state, &start, 1.0);

    for frame in 0..7200u32 {
        let input = TickInput {
            // Drift left and right so the rocket isn't a sitting duck
            left: frame % 240 < 120,
            right: frame % 240 >= 120,
            fire: frame % 30 == 0,
            ..Default::default()
        };
        tick(&mut state, &input, 1.0);
        for event in state.take_events() {
            audio.handle(&event);
        }
        if state.phase != GamePhase::Playing {
            break;
        }
    }

    let scene = build_scene(&state, &settings);
    log::info!(
        "Smoke run ended: phase {:?}, level {}, kills {}, {} asteroids, {} draw texts",
        state.phase,
        state.level,
        state.kills,
        state.asteroids.len(),
        scene.texts.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
