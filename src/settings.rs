//! User preferences
//!
//! Persisted in LocalStorage on the web, separate from the engine tuning.

use serde::{Deserialize, Serialize};

/// Player-facing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Procedural music on/off
    pub music_on: bool,

    /// Offer to read the final poem aloud
    pub speech_enabled: bool,

    // === Accessibility ===
    /// Damp fractal pulsing and drift
    pub reduced_motion: bool,

    /// Replay the same room on every run
    pub pinned_seed: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            music_on: true,
            speech_enabled: true,
            reduced_motion: false,
            pinned_seed: None,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "loop_leaks_settings";

    /// Parse stored settings; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                log::warn!("Stored settings unreadable, using defaults");
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Write settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok()).flatten() else {
            log::warn!("LocalStorage unavailable, settings not kept");
            return;
        };
        match self.to_json() {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("LocalStorage refused settings write");
                } else {
                    log::debug!("settings saved: {json}");
                }
            }
            Err(e) => log::warn!("settings not serializable: {e}"),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("no settings store on native, key {} unused", Self::STORAGE_KEY);
        Self::default()
    }

    /// Nothing persists on native; the change only lives for this run
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("settings changed (not persisted): {:?}", self.to_json().ok());
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Flip one on/off preference
    pub fn toggle(&mut self, toggle: Toggle) {
        match toggle {
            Toggle::Music => self.music_on = !self.music_on,
            Toggle::ReducedMotion => self.reduced_motion = !self.reduced_motion,
        }
    }
}

/// On/off preferences that can change mid-run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Music,
    ReducedMotion,
}
