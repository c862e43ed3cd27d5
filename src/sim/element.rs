//! Moving bars: targets and the blocker
//!
//! Both share one record (shape, color, sound, vertical velocity) and differ
//! only in what a hit does, carried by [`ElementKind`].

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, ScreenSize};
use super::state::GameEvent;
use crate::audio::SoundId;
use crate::renderer::{Color, Drawable};

/// What kind of bar this is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Destroyed on hit, adds `hit_reward` seconds
    Target { hit_reward: f32 },
    /// Deflects the ball, removes `miss_penalty` seconds
    Blocker { miss_penalty: f32 },
}

/// Effect of the ball striking an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEffect {
    /// Added to the clock (negative for penalties)
    pub time_delta: f32,
    /// Ball is removed and so is the element
    pub consumes_projectile: bool,
    /// Ball's horizontal velocity is reversed
    pub reflects_projectile: bool,
}

/// A bar moving vertically with a bounce at the top and bottom edges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameElement {
    pub kind: ElementKind,
    pub shape: Rect,
    pub color: Color,
    pub sound: SoundId,
    /// Units per second, positive is downward
    pub velocity_y: f32,
}

impl GameElement {
    pub fn target(shape: Rect, color: Color, velocity_y: f32, hit_reward: f32) -> Self {
        Self {
            kind: ElementKind::Target { hit_reward },
            shape,
            color,
            sound: SoundId::Target,
            velocity_y,
        }
    }

    pub fn blocker(shape: Rect, color: Color, velocity_y: f32, miss_penalty: f32) -> Self {
        Self {
            kind: ElementKind::Blocker { miss_penalty },
            shape,
            color,
            sound: SoundId::Blocker,
            velocity_y,
        }
    }

    /// Advance by `dt` seconds, then bounce if the bar crossed an edge while
    /// heading toward it.
    pub fn update(&mut self, dt: f32, screen: &ScreenSize) {
        if dt <= 0.0 {
            return;
        }
        self.shape.offset(0.0, self.velocity_y * dt);

        let past_top = self.shape.top < 0.0 && self.velocity_y < 0.0;
        let past_bottom = self.shape.bottom > screen.height && self.velocity_y > 0.0;
        if past_top || past_bottom {
            self.velocity_y = -self.velocity_y;
        }
    }

    pub fn draw(&self) -> Drawable {
        Drawable::Rect {
            rect: self.shape,
            color: self.color,
        }
    }

    pub fn play_sound(&self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::Sound(self.sound));
    }

    pub fn on_collision(&self) -> CollisionEffect {
        match self.kind {
            ElementKind::Target { hit_reward } => CollisionEffect {
                time_delta: hit_reward,
                consumes_projectile: true,
                reflects_projectile: false,
            },
            ElementKind::Blocker { miss_penalty } => CollisionEffect {
                time_delta: -miss_penalty,
                consumes_projectile: false,
                reflects_projectile: true,
            },
        }
    }

    pub fn is_target(&self) -> bool {
        matches!(self.kind, ElementKind::Target { .. })
    }
}
