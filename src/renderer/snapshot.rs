//! Per-frame drawable snapshot
//!
//! Built while the loop holds the state lock, then presented after the lock
//! is released so the renderer never blocks the simulation.

use glam::Vec2;

use super::{Color, Drawable};
use crate::consts::{TEXT_SIZE_PERCENT, TIME_TEXT_POSITION};
use crate::sim::{GameState, Rect};

/// HUD text
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub text: String,
    pub position: Vec2,
    pub size: f32,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Back to front
    pub drawables: Vec<Drawable>,
    pub overlay: Option<TextOverlay>,
}

/// Snapshot the state: background, cannon, ball, blocker, targets
pub fn build_render_frame(state: &GameState, show_time: bool) -> RenderFrame {
    let screen = state.screen;
    let mut drawables = Vec::with_capacity(5 + state.targets.len());

    drawables.push(Drawable::Rect {
        rect: Rect::new(0.0, 0.0, screen.width, screen.height),
        color: Color::WHITE,
    });
    drawables.extend(state.cannon.draw());
    if let Some(ball) = state.cannon.cannonball().filter(|b| b.is_on_screen()) {
        drawables.push(ball.draw());
    }
    drawables.push(state.blocker.draw());
    drawables.extend(state.targets.iter().map(|t| t.draw()));

    let overlay = show_time.then(|| TextOverlay {
        text: format!("Time remaining: {:.1}", state.time_left),
        position: Vec2::new(TIME_TEXT_POSITION.0, TIME_TEXT_POSITION.1),
        size: TEXT_SIZE_PERCENT * screen.height,
    });

    RenderFrame { drawables, overlay }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScreenSize;

    fn state() -> GameState {
        GameState::new(ScreenSize::new(1000.0, 2000.0).unwrap(), 11)
    }

    #[test]
    fn test_frame_without_ball() {
        let state = state();
        let frame = build_render_frame(&state, true);
        // background + barrel + base + blocker + 9 targets
        assert_eq!(frame.drawables.len(), 13);
        assert_eq!(frame.drawables[0].color(), Color::WHITE);
        assert_eq!(frame.drawables[3], state.blocker.draw());
        assert_eq!(frame.drawables[4], state.targets[0].draw());

        let overlay = frame.overlay.unwrap();
        assert_eq!(overlay.text, "Time remaining: 10.0");
        assert_eq!(overlay.position, Vec2::new(50.0, 100.0));
    }

    #[test]
    fn test_frame_with_ball_and_no_text() {
        let mut state = state();
        state.fire();
        let frame = build_render_frame(&state, false);
        assert_eq!(frame.drawables.len(), 14);
        assert!(matches!(frame.drawables[3], Drawable::Circle { .. }));
        assert!(frame.overlay.is_none());
    }

    #[test]
    fn test_off_screen_ball_not_drawn() {
        let mut state = state();
        state.fire();
        let screen = state.screen;
        state.cannon.cannonball_mut().unwrap().update(5.0, &screen);
        let frame = build_render_frame(&state, true);
        assert_eq!(frame.drawables.len(), 13);
    }
}
