//! Game state and core simulation types
//!
//! Everything a frame mutates lives in [`GameState`]. Only the loop thread
//! writes to it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cannon::Cannon;
use super::element::GameElement;
use super::geometry::{Rect, ScreenSize};
use crate::aim_angle;
use crate::audio::SoundId;
use crate::consts::*;
use crate::renderer::Color;

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// Terminal until the next new-game reset
    GameOver(Outcome),
}

/// Summary handed to the result presenter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    pub shots_fired: u32,
    pub elapsed_secs: f32,
}

/// Side effects produced during a frame, drained by the loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Sound(SoundId),
    /// Emitted once per game; the loop stops on it
    GameOver(GameResult),
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Geometry the current entities were laid out for
    pub screen: ScreenSize,
    /// Geometry to use at the next new-game (set on resize)
    pending_screen: Option<ScreenSize>,
    pub rng_state: RngState,
    pub phase: GamePhase,
    pub cannon: Cannon,
    pub blocker: GameElement,
    /// Left to right, in creation order
    pub targets: Vec<GameElement>,
    /// Seconds on the countdown clock
    pub time_left: f32,
    pub shots_fired: u32,
    /// Seconds simulated since new-game
    pub total_elapsed: f32,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a running game laid out for `screen`
    pub fn new(screen: ScreenSize, seed: u64) -> Self {
        let mut state = Self {
            screen,
            pending_screen: None,
            rng_state: RngState::new(seed),
            phase: GamePhase::Running,
            cannon: Cannon::new(&screen),
            blocker: Self::spawn_blocker(&screen),
            targets: Vec::new(),
            time_left: INITIAL_TIME,
            shots_fired: 0,
            total_elapsed: 0.0,
            events: Vec::new(),
        };
        state.new_game();
        state
    }

    /// Reinitialize every entity, the clock and the counters.
    ///
    /// Each reset draws target speeds from the next RNG stream.
    pub fn new_game(&mut self) {
        if let Some(screen) = self.pending_screen.take() {
            self.screen = screen;
        }
        let screen = self.screen;

        let mut rng = self.rng_state.to_rng();
        self.rng_state.stream = self.rng_state.stream.wrapping_add(1);

        self.cannon = Cannon::new(&screen);
        self.targets = Self::spawn_targets(&screen, &mut rng);
        self.blocker = Self::spawn_blocker(&screen);
        self.time_left = INITIAL_TIME;
        self.shots_fired = 0;
        self.total_elapsed = 0.0;
        self.phase = GamePhase::Running;
        self.events.clear();

        log::info!(
            "New game on {}x{} ({} targets)",
            screen.width,
            screen.height,
            self.targets.len()
        );
    }

    fn spawn_targets(screen: &ScreenSize, rng: &mut Pcg32) -> Vec<GameElement> {
        let width = TARGET_WIDTH_PERCENT * screen.width;
        let length = TARGET_LENGTH_PERCENT * screen.height;
        let step = (TARGET_WIDTH_PERCENT + TARGET_SPACING_PERCENT) * screen.width;
        let first_x = TARGET_FIRST_X_PERCENT * screen.width;
        let y = (0.5 - TARGET_LENGTH_PERCENT / 2.0) * screen.height;

        (0..TARGET_PIECES)
            .map(|i| {
                let speed = screen.height
                    * rng.random_range(TARGET_MIN_SPEED_PERCENT..=TARGET_MAX_SPEED_PERCENT);
                let color = if i % 2 == 0 {
                    Color::TARGET_DARK
                } else {
                    Color::TARGET_LIGHT
                };
                let x = first_x + step * i as f32;
                // Targets start moving up
                GameElement::target(Rect::new(x, y, width, length), color, -speed, HIT_REWARD)
            })
            .collect()
    }

    fn spawn_blocker(screen: &ScreenSize) -> GameElement {
        let shape = Rect::new(
            BLOCKER_X_PERCENT * screen.width,
            (0.5 - BLOCKER_LENGTH_PERCENT / 2.0) * screen.height,
            BLOCKER_WIDTH_PERCENT * screen.width,
            BLOCKER_LENGTH_PERCENT * screen.height,
        );
        GameElement::blocker(
            shape,
            Color::BLACK,
            BLOCKER_SPEED_PERCENT * screen.height,
            MISS_PENALTY,
        )
    }

    /// Record a new screen size; entities keep their layout until new-game
    pub fn resize(&mut self, screen: ScreenSize) {
        if screen != self.screen {
            self.pending_screen = Some(screen);
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    /// Aim at a pointer position and fire if no ball is on-screen.
    ///
    /// Returns true when a ball was fired. Ignored once the game is over.
    pub fn align_and_fire(&mut self, point: Vec2) -> bool {
        if self.is_game_over() {
            return false;
        }
        self.cannon.align(aim_angle(point, self.screen.height));
        self.fire()
    }

    /// Fire at the current barrel angle
    pub fn fire(&mut self) -> bool {
        if !self.cannon.fire_cannonball() {
            return false;
        }
        self.shots_fired += 1;
        self.events.push(GameEvent::Sound(SoundId::Cannon));
        log::debug!(
            "Shot {} fired at {:.3} rad",
            self.shots_fired,
            self.cannon.angle
        );
        true
    }

    /// Result as it stands now (final once the game is over)
    pub fn result(&self) -> Option<GameResult> {
        match self.phase {
            GamePhase::GameOver(outcome) => Some(GameResult {
                outcome,
                shots_fired: self.shots_fired,
                elapsed_secs: self.total_elapsed,
            }),
            GamePhase::Running => None,
        }
    }

    pub(crate) fn events_mut(&mut self) -> &mut Vec<GameEvent> {
        &mut self.events
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
