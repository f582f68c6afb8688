//! Liked pictures and per-level background choices
//!
//! Two small LocalStorage records shared with the picture-of-the-day viewer
//! page: the list of pictures the player liked, and which archive date each
//! game level should use as its background. Plain get/set/overwrite, no
//! versioning or migration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::state::{LEVELS, level_spec};

/// A picture the player liked in the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedPicture {
    /// Archive date, `YYYY-MM-DD`
    pub date: String,
    pub title: String,
    /// Display URL; None when the entry is a video placeholder
    pub url: Option<String>,
    #[serde(rename = "isVideo", default)]
    pub is_video: bool,
}

/// The player's liked-pictures list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LikedPictures {
    pub entries: Vec<LikedPicture>,
}

impl LikedPictures {
    /// LocalStorage key, shared with the viewer page
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "likedImages";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: &str) -> bool {
        self.entries.iter().any(|p| p.date == date)
    }

    /// Add a picture; overwrites an existing like for the same date
    pub fn add(&mut self, picture: LikedPicture) {
        self.remove(&picture.date);
        self.entries.push(picture);
    }

    /// Remove by date. Returns true if something was removed.
    pub fn remove(&mut self, date: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|p| p.date != date);
        self.entries.len() != before
    }

    /// Toggle a like, returning the new liked state
    pub fn toggle(&mut self, picture: LikedPicture) -> bool {
        if self.contains(&picture.date) {
            self.remove(&picture.date);
            false
        } else {
            self.add(picture);
            true
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Load from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(entries) = serde_json::from_str::<Vec<LikedPicture>>(&json) {
                    log::info!("Loaded {} liked pictures", entries.len());
                    return Self { entries };
                }
            }
        }

        log::info!("No liked pictures found, starting fresh");
        Self::new()
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(&self.entries) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Liked pictures saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Chosen background date per level slot, keyed `level1`..`level3`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackgroundChoices {
    #[serde(flatten)]
    slots: BTreeMap<String, String>,
}

impl BackgroundChoices {
    /// LocalStorage key, shared with the viewer page
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "backgrounds";

    pub fn new() -> Self {
        Self::default()
    }

    fn slot_key(level: u32) -> String {
        format!("level{level}")
    }

    /// Record a chosen date for a level slot (overwrites)
    pub fn set(&mut self, level: u32, date: &str) {
        self.slots.insert(Self::slot_key(level), date.to_string());
    }

    /// The chosen date for a level, if any
    pub fn get(&self, level: u32) -> Option<&str> {
        self.slots.get(&Self::slot_key(level)).map(String::as_str)
    }

    /// The date a level should actually use: the player's choice, or the
    /// built-in default for that level
    pub fn date_for_level(&self, level: u32) -> &str {
        debug_assert!(level >= 1 && level <= LEVELS.len() as u32);
        self.get(level)
            .unwrap_or_else(|| level_spec(level).background_date)
    }

    pub fn clear(&mut self, level: u32) {
        self.slots.remove(&Self::slot_key(level));
    }

    /// Load from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(choices) = serde_json::from_str(&json) {
                    return choices;
                }
            }
        }
        Self::new()
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture(date: &str) -> LikedPicture {
        LikedPicture {
            date: date.to_string(),
            title: format!("Picture for {date}"),
            url: Some(format!("https://example.com/{date}.jpg")),
            is_video: false,
        }
    }

    #[test]
    fn test_add_remove_contains() {
        let mut liked = LikedPictures::new();
        assert!(liked.is_empty());

        liked.add(picture("2024-11-21"));
        assert!(liked.contains("2024-11-21"));
        assert_eq!(liked.len(), 1);

        // Re-adding the same date overwrites instead of duplicating
        liked.add(picture("2024-11-21"));
        assert_eq!(liked.len(), 1);

        assert!(liked.remove("2024-11-21"));
        assert!(!liked.remove("2024-11-21"));
        assert!(liked.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut liked = LikedPictures::new();
        assert!(liked.toggle(picture("2024-12-09")));
        assert!(!liked.toggle(picture("2024-12-09")));
        assert!(liked.is_empty());
    }

    #[test]
    fn test_liked_round_trip_matches_viewer_wire_format() {
        let mut liked = LikedPictures::new();
        liked.add(LikedPicture {
            date: "2024-11-28".into(),
            title: "Video day".into(),
            url: None,
            is_video: true,
        });
        let json = serde_json::to_string(&liked.entries).unwrap();
        assert!(json.contains("\"isVideo\":true"));

        let back: Vec<LikedPicture> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, liked.entries);
    }

    #[test]
    fn test_background_choice_overrides_default() {
        let mut choices = BackgroundChoices::new();
        assert_eq!(choices.date_for_level(1), "2024-11-21");
        assert_eq!(choices.date_for_level(3), "2024-11-28");

        choices.set(1, "2020-05-05");
        assert_eq!(choices.date_for_level(1), "2020-05-05");

        choices.clear(1);
        assert_eq!(choices.date_for_level(1), "2024-11-21");
    }

    #[test]
    fn test_background_choices_wire_format() {
        let mut choices = BackgroundChoices::new();
        choices.set(2, "2021-01-02");
        let json = serde_json::to_string(&choices).unwrap();
        // Flat map keyed by slot, the same shape the viewer page writes
        assert_eq!(json, r#"{"level2":"2021-01-02"}"#);

        let back: BackgroundChoices = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(2), Some("2021-01-02"));
    }
}
