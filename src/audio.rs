//! Audio interface
//!
//! The simulation only emits sound ids; playback belongs to whatever
//! implements [`AudioPlayer`].

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Sound effect ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// Ball hits a target
    Target,
    /// Cannon fires
    Cannon,
    /// Ball bounces off the blocker
    Blocker,
}

impl SoundId {
    fn index(self) -> usize {
        match self {
            SoundId::Target => 0,
            SoundId::Cannon => 1,
            SoundId::Blocker => 2,
        }
    }
}

/// Fire-and-forget sound playback, shared across threads
pub trait AudioPlayer: Send + Sync {
    /// Play a sound effect. Must not block the caller.
    fn play(&self, sound: SoundId);

    /// Release playback resources. Called only after the loop thread has
    /// been joined.
    fn release(&self) {}
}

/// Audio player that has no output device.
///
/// Applies the volume settings, logs each effect and keeps per-sound play
/// counts. Plays after [`AudioPlayer::release`] are dropped.
pub struct AudioManager {
    volume: f32,
    plays: [AtomicU32; 3],
    released: AtomicBool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            volume: settings.effective_volume(),
            plays: Default::default(),
            released: AtomicBool::new(false),
        }
    }

    /// Number of times `sound` was played
    pub fn play_count(&self, sound: SoundId) -> u32 {
        self.plays[sound.index()].load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl AudioPlayer for AudioManager {
    fn play(&self, sound: SoundId) {
        if self.is_released() {
            log::error!("Sound {sound:?} played after audio release");
            return;
        }
        self.plays[sound.index()].fetch_add(1, Ordering::Relaxed);
        if self.volume <= 0.0 {
            return;
        }
        log::debug!("Play {sound:?} (volume {:.2})", self.volume);
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            log::info!("Audio released");
        }
    }
}
