//! The cannonball

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::element::GameElement;
use super::geometry::{Rect, ScreenSize};
use crate::renderer::{Color, Drawable};

/// A ball in straight-line flight. No bounce: once its centre leaves the
/// playfield it is off-screen for good.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cannonball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    on_screen: bool,
}

impl Cannonball {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            on_screen: true,
        }
    }

    pub fn update(&mut self, dt: f32, screen: &ScreenSize) {
        if dt <= 0.0 {
            return;
        }
        self.pos += self.vel * dt;
        if !screen.contains(self.pos) {
            self.on_screen = false;
        }
    }

    pub fn is_on_screen(&self) -> bool {
        self.on_screen
    }

    /// Bounding box used for collision tests
    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    pub fn collides_with(&self, element: &GameElement) -> bool {
        self.bounds().intersects(&element.shape)
    }

    /// Send the ball back toward the cannon
    pub fn reverse_velocity_x(&mut self) {
        self.vel.x = -self.vel.x;
    }

    pub fn draw(&self) -> Drawable {
        Drawable::Circle {
            center: self.pos,
            radius: self.radius,
            color: Color::BLACK,
        }
    }
}
