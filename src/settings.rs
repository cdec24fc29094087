//! Player preferences
//!
//! Persisted separately from best scores under their own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence::{SETTINGS_KEY, read, write};
use crate::platform::KeyValueStore;

/// Game settings/preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Show FPS counter
    pub show_fps: bool,
    /// Freeze ambient scenery outside of play
    pub reduced_motion: bool,
}

impl Settings {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let Some(json) = read(store, SETTINGS_KEY) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings
            }
            Err(e) => {
                log::warn!("Discarding corrupt settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        match serde_json::to_string(self) {
            Ok(json) => {
                write(store, SETTINGS_KEY, &json);
                log::info!("Settings saved");
            }
            Err(e) => log::warn!("Could not encode settings: {e}"),
        }
    }
}
