//! Rendering interface
//!
//! The core never touches pixels. Each frame it hands the renderer an
//! ordered list of [`Drawable`]s plus the HUD text.

pub mod snapshot;

pub use snapshot::{RenderFrame, TextOverlay, build_render_frame};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::Rect;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Even-indexed targets
    pub const TARGET_DARK: Color = Color::rgb(0x3f, 0x51, 0xb5);
    /// Odd-indexed targets
    pub const TARGET_LIGHT: Color = Color::rgb(0xff, 0xc1, 0x07);
}

/// A filled primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Drawable {
    Rect { rect: Rect, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    /// Thick line segment (cannon barrel)
    Line { from: Vec2, to: Vec2, width: f32, color: Color },
}

impl Drawable {
    pub fn color(&self) -> Color {
        match self {
            Drawable::Rect { color, .. }
            | Drawable::Circle { color, .. }
            | Drawable::Line { color, .. } => *color,
        }
    }
}

/// Presentation backend, owned by the loop thread while a frame is presented
pub trait Renderer: Send {
    /// HUD text for the frame about to be presented
    fn text_overlay(&mut self, text: &str, position: Vec2, size: f32);

    /// Draw the frame's primitives in order and show the result.
    /// May block briefly on the presentation backend.
    fn present(&mut self, drawables: &[Drawable]);
}

/// Renderer that only logs; used headless
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    last_text: String,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn text_overlay(&mut self, text: &str, _position: Vec2, _size: f32) {
        if text != self.last_text {
            self.last_text.clear();
            self.last_text.push_str(text);
        }
    }

    fn present(&mut self, drawables: &[Drawable]) {
        self.frames += 1;
        // Roughly once a second at 60 FPS
        if self.frames % 60 == 0 {
            log::info!(
                "frame {} | {} drawables | {}",
                self.frames,
                drawables.len(),
                self.last_text
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_renderer_counts_frames() {
        let mut renderer = LogRenderer::new();
        renderer.text_overlay("Time remaining: 10.0", Vec2::ZERO, 12.0);
        renderer.present(&[]);
        renderer.present(&[]);
        assert_eq!(renderer.frames(), 2);
    }
}
