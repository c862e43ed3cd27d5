//! Game settings and preferences
//!
//! Presentation and pacing preferences only. Gameplay constants live in
//! [`crate::consts`] and are not configurable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Loop pacing ===
    /// Frame cap for the loop thread (0 = run as fast as possible)
    pub target_fps: u32,
    /// Largest delta (seconds) fed into a single simulation step
    pub max_frame_dt: f32,

    // === Simulation ===
    /// Seed for target speeds (None = seeded from the clock)
    pub seed: Option<u64>,

    // === HUD ===
    /// Draw the time-remaining text
    pub show_time: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all audio
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_frame_dt: 0.25,

            seed: None,

            show_time: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                log::info!("Using default settings ({err})");
                Self::default()
            }
        }
    }

    /// Minimum duration of one frame, if a cap is set
    pub fn frame_budget(&self) -> Option<std::time::Duration> {
        (self.target_fps > 0)
            .then(|| std::time::Duration::from_secs_f64(1.0 / self.target_fps as f64))
    }

    /// Effective volume for sound effects
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Clamp out-of-range values into something the loop can use
    fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        if !self.max_frame_dt.is_finite() || self.max_frame_dt <= 0.0 {
            self.max_frame_dt = Self::default().max_frame_dt;
        }
        self
    }
}
