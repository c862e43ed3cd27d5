//! Cannon Game - a cannon vs. moving targets arcade simulation
//!
//! Core modules:
//! - `sim`: Simulation (entities, physics, collisions, game state)
//! - `game_loop`: Dedicated update thread and its lifecycle
//! - `renderer`: Drawable snapshot types and the renderer interface
//! - `audio`: Sound ids and the audio player interface
//! - `platform`: Pointer input and result presentation interfaces
//! - `settings`: Presentation-side preferences

pub mod audio;
pub mod error;
pub mod game_loop;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::GameError;
pub use game_loop::{Collaborators, GameLoop, LoopLifecycle};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
///
/// Sizes and speeds are fractions of the screen dimensions; they are applied
/// when a new game is set up.
pub mod consts {
    /// Seconds removed from the clock when the ball hits the blocker
    pub const MISS_PENALTY: f32 = 2.0;
    /// Seconds added to the clock when the ball hits a target
    pub const HIT_REWARD: f32 = 3.0;
    /// Countdown at the start of every game (seconds)
    pub const INITIAL_TIME: f32 = 10.0;

    /// Cannon geometry
    pub const CANNON_BASE_RADIUS_PERCENT: f32 = 3.0 / 40.0; // of height
    pub const CANNON_BARREL_WIDTH_PERCENT: f32 = 3.0 / 40.0; // of height
    pub const CANNON_BARREL_LENGTH_PERCENT: f32 = 1.0 / 10.0; // of width

    /// Cannonball
    pub const CANNONBALL_RADIUS_PERCENT: f32 = 3.0 / 80.0; // of height
    pub const CANNONBALL_SPEED_PERCENT: f32 = 3.0 / 2.0; // of width, per second

    /// Target row
    pub const TARGET_WIDTH_PERCENT: f32 = 1.0 / 40.0; // of width
    pub const TARGET_LENGTH_PERCENT: f32 = 3.0 / 20.0; // of height
    pub const TARGET_FIRST_X_PERCENT: f32 = 3.0 / 5.0; // of width
    pub const TARGET_SPACING_PERCENT: f32 = 1.0 / 60.0; // of width
    pub const TARGET_PIECES: usize = 9;
    pub const TARGET_MIN_SPEED_PERCENT: f32 = 3.0 / 4.0; // of height, per second
    pub const TARGET_MAX_SPEED_PERCENT: f32 = 6.0 / 4.0; // of height, per second

    /// Blocker
    pub const BLOCKER_WIDTH_PERCENT: f32 = 1.0 / 40.0; // of width
    pub const BLOCKER_LENGTH_PERCENT: f32 = 1.0 / 4.0; // of height
    pub const BLOCKER_X_PERCENT: f32 = 1.0 / 2.0; // of width
    pub const BLOCKER_SPEED_PERCENT: f32 = 1.0; // of height, per second

    /// HUD
    pub const TEXT_SIZE_PERCENT: f32 = 1.0 / 18.0; // of height
    pub const TIME_TEXT_POSITION: (f32, f32) = (50.0, 100.0);
}

/// Barrel angle for a pointer position.
///
/// The cannon sits on the left edge at half the screen height. Angle 0 points
/// straight up and positive angles swing toward the right (screen y grows
/// downward).
#[inline]
pub fn aim_angle(point: Vec2, screen_height: f32) -> f32 {
    let center_minus_y = screen_height / 2.0 - point.y;
    point.x.atan2(center_minus_y)
}

/// Unit direction for a barrel angle (same convention as [`aim_angle`])
#[inline]
pub fn barrel_direction(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_aim_angle_straight_right() {
        // Touch level with the cannon: barrel horizontal
        let angle = aim_angle(Vec2::new(500.0, 1000.0), 2000.0);
        assert!((angle - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_aim_angle_above_and_below() {
        let up = aim_angle(Vec2::new(500.0, 500.0), 2000.0);
        let down = aim_angle(Vec2::new(500.0, 1500.0), 2000.0);
        assert!(up > 0.0 && up < FRAC_PI_2);
        assert!(down > FRAC_PI_2);
    }

    #[test]
    fn test_barrel_direction_matches_aim() {
        // Direction for the aim angle points at the touch point
        let point = Vec2::new(300.0, 600.0);
        let dir = barrel_direction(aim_angle(point, 2000.0));
        let expected = (point - Vec2::new(0.0, 1000.0)).normalize();
        assert!((dir - expected).length() < 1e-5);
    }
}
