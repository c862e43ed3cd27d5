//! Platform abstraction layer
//!
//! Interfaces the host provides around the core:
//! - Pointer input (press/drag/release in screen coordinates)
//! - Result presentation when a game ends

use glam::Vec2;

use crate::sim::GameResult;

/// Pointer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Drag,
    Release,
}

/// A pointer event from the input thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub pos: Vec2,
}

impl PointerEvent {
    pub fn press(x: f32, y: f32) -> Self {
        Self {
            action: PointerAction::Press,
            pos: Vec2::new(x, y),
        }
    }

    pub fn drag(x: f32, y: f32) -> Self {
        Self {
            action: PointerAction::Drag,
            pos: Vec2::new(x, y),
        }
    }

    pub fn release(x: f32, y: f32) -> Self {
        Self {
            action: PointerAction::Release,
            pos: Vec2::new(x, y),
        }
    }

    /// Whether this event aims (and possibly fires) the cannon
    pub fn aims(&self) -> bool {
        matches!(self.action, PointerAction::Press | PointerAction::Drag)
    }
}

/// Callback that starts the next game once the player dismisses the result
pub type Acknowledge = Box<dyn FnOnce() + Send + 'static>;

/// Shows the end-of-game result.
///
/// Called from the loop thread after it has stopped simulating, once per
/// game over. Implementations may call `on_acknowledge` right away or hand it
/// to another thread.
pub trait ResultPresenter: Send + Sync {
    fn show_result(&self, result: GameResult, on_acknowledge: Acknowledge);
}

/// Presenter that logs the result and never restarts
#[derive(Debug, Default)]
pub struct LogPresenter;

impl ResultPresenter for LogPresenter {
    fn show_result(&self, result: GameResult, _on_acknowledge: Acknowledge) {
        log::info!(
            "{:?}: {} shots, {:.1}s elapsed",
            result.outcome,
            result.shots_fired,
            result.elapsed_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_press_and_drag_aim() {
        assert!(PointerEvent::press(1.0, 2.0).aims());
        assert!(PointerEvent::drag(1.0, 2.0).aims());
        assert!(!PointerEvent::release(1.0, 2.0).aims());
    }

    #[test]
    fn test_log_presenter_does_not_acknowledge() {
        use crate::sim::Outcome;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        LogPresenter.show_result(
            GameResult {
                outcome: Outcome::Won,
                shots_fired: 3,
                elapsed_secs: 4.5,
            },
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        assert!(!called.load(Ordering::SeqCst));
    }
}
