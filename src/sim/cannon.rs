//! The cannon and its single cannonball

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::ScreenSize;
use super::projectile::Cannonball;
use crate::barrel_direction;
use crate::consts::*;
use crate::renderer::{Color, Drawable};

/// Cannon anchored at the left edge, half-way down the screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cannon {
    pub base: Vec2,
    /// Barrel angle in radians; 0 is straight up
    pub angle: f32,
    pub base_radius: f32,
    pub barrel_length: f32,
    pub barrel_width: f32,
    pub ball_radius: f32,
    pub ball_speed: f32,
    cannonball: Option<Cannonball>,
}

impl Cannon {
    /// Size the cannon for a screen
    pub fn new(screen: &ScreenSize) -> Self {
        Self {
            base: Vec2::new(0.0, screen.height / 2.0),
            // Level with the base, pointing into the playfield
            angle: std::f32::consts::FRAC_PI_2,
            base_radius: CANNON_BASE_RADIUS_PERCENT * screen.height,
            barrel_length: CANNON_BARREL_LENGTH_PERCENT * screen.width,
            barrel_width: CANNON_BARREL_WIDTH_PERCENT * screen.height,
            ball_radius: CANNONBALL_RADIUS_PERCENT * screen.height,
            ball_speed: CANNONBALL_SPEED_PERCENT * screen.width,
            cannonball: None,
        }
    }

    pub fn align(&mut self, angle: f32) {
        self.angle = angle;
    }

    pub fn barrel_end(&self) -> Vec2 {
        self.base + barrel_direction(self.angle) * self.barrel_length
    }

    /// Fire along the barrel. Returns false (and does nothing) while a ball
    /// is still on-screen. An off-screen ball is replaced.
    pub fn fire_cannonball(&mut self) -> bool {
        if self.has_ball_on_screen() {
            return false;
        }
        let vel = barrel_direction(self.angle) * self.ball_speed;
        self.cannonball = Some(Cannonball::new(self.barrel_end(), vel, self.ball_radius));
        true
    }

    pub fn remove_cannonball(&mut self) {
        self.cannonball = None;
    }

    pub fn cannonball(&self) -> Option<&Cannonball> {
        self.cannonball.as_ref()
    }

    pub fn cannonball_mut(&mut self) -> Option<&mut Cannonball> {
        self.cannonball.as_mut()
    }

    pub fn has_ball_on_screen(&self) -> bool {
        self.cannonball.as_ref().is_some_and(Cannonball::is_on_screen)
    }

    /// Barrel then base
    pub fn draw(&self) -> [Drawable; 2] {
        [
            Drawable::Line {
                from: self.base,
                to: self.barrel_end(),
                width: self.barrel_width,
                color: Color::BLACK,
            },
            Drawable::Circle {
                center: self.base,
                radius: self.base_radius,
                color: Color::BLACK,
            },
        ]
    }
}
