use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use mandelband_render::{CancelPolicy, SchedulerConfig, BAND_HEIGHT, MAX_HISTORY};

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    /// Backing raster width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Backing raster height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Backing pixels per display pixel. Selection coordinates are in
    /// display pixels.
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_band_height")]
    pub band_height: u32,
    /// Compute threads. 0 = one per available core.
    #[serde(default)]
    pub pool_size: usize,
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// How long the headless driver waits for a frame before giving up.
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_pixel_ratio() -> f64 {
    2.0
}
fn default_max_iterations() -> u32 {
    1000
}
fn default_band_height() -> u32 {
    BAND_HEIGHT
}
fn default_history_capacity() -> usize {
    MAX_HISTORY
}
fn default_frame_timeout_ms() -> u64 {
    60_000
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            pixel_ratio: default_pixel_ratio(),
            max_iterations: default_max_iterations(),
            band_height: default_band_height(),
            pool_size: 0,
            cancel_policy: CancelPolicy::default(),
            history_capacity: default_history_capacity(),
            frame_timeout_ms: default_frame_timeout_ms(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load from `path`. A missing or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No preferences file at {}", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                Ok(prefs) => {
                    info!("Loaded preferences from {}", path.display());
                    return prefs;
                }
                Err(e) => error!("Failed to parse preferences: {e}"),
            },
            Err(e) => error!("Failed to read preferences file: {e}"),
        }
        Self::default()
    }

    /// Persist preferences to `path`.
    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            pool_size: self.pool_size,
            band_height: self.band_height,
            cancel_policy: self.cancel_policy,
        }
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}
