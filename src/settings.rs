//! Page settings and preferences
//!
//! Persisted as JSON in LocalStorage. Unknown or missing fields fall back to
//! their defaults so older saved blobs keep loading.

use serde::{Deserialize, Serialize};

/// Motion preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotionPreference {
    /// Follow `prefers-reduced-motion`
    #[default]
    System,
    Full,
    Reduced,
}

/// Slowest and fastest typing multipliers accepted
pub const MIN_TYPING_SPEED: f64 = 0.25;
pub const MAX_TYPING_SPEED: f64 = 4.0;

/// Page preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub motion: MotionPreference,

    // === Typewriter ===
    /// Multiplier on every typewriter delay (1.0 = as designed, 2.0 = half speed)
    pub typing_speed: f64,

    // === Interactive chapters ===
    /// Run the coin rain simulation
    pub coin_rain: bool,
    /// Run the snake game
    pub snake: bool,

    // === Chat ===
    /// Relay endpoint for the buddy chat
    pub chat_endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            motion: MotionPreference::System,
            typing_speed: 1.0,
            coin_rain: true,
            snake: true,
            chat_endpoint: "/api/buddy-chat".to_string(),
        }
    }
}

impl Settings {
    /// Resolve reduced motion against the browser preference
    pub fn effective_reduced_motion(&self, prefers_reduced: bool) -> bool {
        match self.motion {
            MotionPreference::System => prefers_reduced,
            MotionPreference::Full => false,
            MotionPreference::Reduced => true,
        }
    }

    /// Typing multiplier clamped to a sane range
    pub fn typing_multiplier(&self) -> f64 {
        if self.typing_speed.is_finite() {
            crate::clamp_f64(self.typing_speed, MIN_TYPING_SPEED, MAX_TYPING_SPEED)
        } else {
            1.0
        }
    }

    /// Parse a stored blob; `None` if it is not valid settings JSON
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "pigeon_manifesto_settings";

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
                log::warn!("Ignoring unreadable settings in LocalStorage");
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
