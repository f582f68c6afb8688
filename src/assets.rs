//! Sprite/audio loading gate
//!
//! Assets load fire-and-forget; the game loop polls [`LoadGate::all_ready`]
//! before the first tick. A failed load is logged and then counted as ready
//! so a missing file can never deadlock startup.

use std::collections::HashMap;

/// Every sprite the game draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    Rocket,
    Asteroid(usize),
    Satellite,
    /// Current level background (picture of the day)
    Background,
    /// Title screen background
    TitleBackground,
}

/// Number of distinct rock sprites
pub const ASTEROID_SPRITES: usize = 4;

impl SpriteKey {
    /// Everything that must report in before the loop may start
    pub fn required() -> Vec<SpriteKey> {
        let mut keys = vec![
            SpriteKey::Rocket,
            SpriteKey::Satellite,
            SpriteKey::Background,
            SpriteKey::TitleBackground,
        ];
        for i in 0..ASTEROID_SPRITES {
            keys.push(SpriteKey::Asteroid(i));
        }
        keys
    }

    /// Bundled asset path (backgrounds are fetched, not bundled)
    pub fn source(&self) -> Option<&'static str> {
        match self {
            SpriteKey::Rocket => Some("assets/images/rocket.png"),
            SpriteKey::Satellite => Some("assets/images/satellite.png"),
            SpriteKey::Asteroid(0) => Some("assets/images/asteroid_001.png"),
            SpriteKey::Asteroid(1) => Some("assets/images/asteroid_002.png"),
            SpriteKey::Asteroid(2) => Some("assets/images/asteroid_003.png"),
            SpriteKey::Asteroid(3) => Some("assets/images/asteroid_004.png"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Pending,
    Ready,
    /// Treated as ready by the gate; the sprite just won't draw
    Failed,
}

/// One-time startup barrier over the required asset set
#[derive(Debug)]
pub struct LoadGate {
    states: HashMap<SpriteKey, LoadState>,
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadGate {
    pub fn new() -> Self {
        let states = SpriteKey::required()
            .into_iter()
            .map(|k| (k, LoadState::Pending))
            .collect();
        Self { states }
    }

    /// A gate with everything already marked ready (native/testing)
    pub fn ready() -> Self {
        let mut gate = Self::new();
        for state in gate.states.values_mut() {
            *state = LoadState::Ready;
        }
        gate
    }

    pub fn mark_ready(&mut self, key: SpriteKey) {
        self.states.insert(key, LoadState::Ready);
    }

    /// Record a failure. Counts as loaded for the gate - startup proceeds
    /// without the asset rather than hanging on it.
    pub fn mark_failed(&mut self, key: SpriteKey) {
        log::warn!("Asset {key:?} failed to load; continuing without it");
        self.states.insert(key, LoadState::Failed);
    }

    /// True once the sprite loaded successfully (drawable)
    pub fn is_drawable(&self, key: SpriteKey) -> bool {
        self.states.get(&key) == Some(&LoadState::Ready)
    }

    /// The startup barrier: every required asset has reported in,
    /// successfully or not
    pub fn all_ready(&self) -> bool {
        self.states
            .values()
            .all(|s| *s != LoadState::Pending)
    }
}

/// Wire up browser-side image elements for every bundled sprite
#[cfg(target_arch = "wasm32")]
pub mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::HtmlImageElement;

    use super::{LoadGate, SpriteKey};

    /// Loaded image elements, shared with the canvas renderer
    #[derive(Default)]
    pub struct SpriteStore {
        images: HashMap<SpriteKey, HtmlImageElement>,
    }

    impl SpriteStore {
        pub fn get(&self, key: SpriteKey) -> Option<&HtmlImageElement> {
            self.images.get(&key)
        }

        pub fn insert(&mut self, key: SpriteKey, img: HtmlImageElement) {
            self.images.insert(key, img);
        }
    }

    /// Kick off loads for all bundled sprites, flipping gate flags from
    /// the elements' load/error callbacks.
    pub fn load_bundled_sprites(
        gate: Rc<RefCell<LoadGate>>,
        store: Rc<RefCell<SpriteStore>>,
    ) -> Result<(), wasm_bindgen::JsValue> {
        for key in SpriteKey::required() {
            let Some(src) = key.source() else {
                continue;
            };
            let img = HtmlImageElement::new()?;

            {
                let gate = gate.clone();
                let onload = Closure::<dyn FnMut()>::new(move || {
                    gate.borrow_mut().mark_ready(key);
                });
                img.set_onload(Some(onload.as_ref().unchecked_ref()));
                onload.forget();
            }
            {
                let gate = gate.clone();
                let onerror = Closure::<dyn FnMut()>::new(move || {
                    gate.borrow_mut().mark_failed(key);
                });
                img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                onerror.forget();
            }

            img.set_src(src);
            store.borrow_mut().insert(key, img);
        }
        Ok(())
    }

    /// Point a background slot at a fetched picture URL. Load completion
    /// flips the gate flag; failure is logged and counted as ready.
    pub fn set_background_url(
        gate: Rc<RefCell<LoadGate>>,
        store: Rc<RefCell<SpriteStore>>,
        key: SpriteKey,
        url: &str,
    ) -> Result<(), wasm_bindgen::JsValue> {
        let img = HtmlImageElement::new()?;
        {
            let gate = gate.clone();
            let onload = Closure::<dyn FnMut()>::new(move || {
                gate.borrow_mut().mark_ready(key);
            });
            img.set_onload(Some(onload.as_ref().unchecked_ref()));
            onload.forget();
        }
        {
            let gate = gate.clone();
            let onerror = Closure::<dyn FnMut()>::new(move || {
                gate.borrow_mut().mark_failed(key);
            });
            img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onerror.forget();
        }
        img.set_src(url);
        store.borrow_mut().insert(key, img);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_waits_for_all_assets() {
        let mut gate = LoadGate::new();
        assert!(!gate.all_ready());

        for key in SpriteKey::required() {
            gate.mark_ready(key);
        }
        assert!(gate.all_ready());
    }

    #[test]
    fn test_failure_counts_as_loaded() {
        let mut gate = LoadGate::new();
        for key in SpriteKey::required() {
            gate.mark_failed(key);
        }
        // Gate opens, but nothing is drawable
        assert!(gate.all_ready());
        assert!(!gate.is_drawable(SpriteKey::Rocket));
    }

    #[test]
    fn test_partial_load_keeps_gate_closed() {
        let mut gate = LoadGate::new();
        gate.mark_ready(SpriteKey::Rocket);
        gate.mark_failed(SpriteKey::Satellite);
        assert!(!gate.all_ready());
        assert!(gate.is_drawable(SpriteKey::Rocket));
    }

    #[test]
    fn test_ready_constructor() {
        let gate = LoadGate::ready();
        assert!(gate.all_ready());
        assert!(gate.is_drawable(SpriteKey::Background));
    }

    #[test]
    fn test_required_covers_all_rock_sprites() {
        let required = SpriteKey::required();
        for i in 0..ASTEROID_SPRITES {
            assert!(required.contains(&SpriteKey::Asteroid(i)));
        }
        // Backgrounds are fetched, not bundled
        assert!(SpriteKey::Background.source().is_none());
        assert!(SpriteKey::Asteroid(0).source().is_some());
    }
}
