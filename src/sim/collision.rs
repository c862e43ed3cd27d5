//! Collision resolution between the cannonball and the bars
//!
//! One pass per frame, after positions are updated:
//! 1. An off-screen ball is dropped and nothing else happens.
//! 2. Targets are checked in order; the first hit consumes the ball.
//! 3. A surviving ball is checked against the blocker and deflected.
//!
//! Step 2 runs first so a ball overlapping both a target and the blocker
//! scores the target only.

use super::element::GameElement;
use super::state::GameState;

/// What the resolution pass did this frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionResult {
    /// Index the consumed target had before removal
    pub target_hit: Option<usize>,
    pub blocker_hit: bool,
}

/// Run the resolution pass on `state`
pub fn resolve_collisions(state: &mut GameState) -> CollisionResult {
    let mut result = CollisionResult::default();

    let Some(ball) = state.cannon.cannonball() else {
        return result;
    };
    if !ball.is_on_screen() {
        state.cannon.remove_cannonball();
        return result;
    }

    let target_hit = state.targets.iter().position(|t| ball.collides_with(t));
    if let Some(index) = target_hit {
        let target = state.targets.remove(index);
        apply_hit(state, &target);
        result.target_hit = Some(index);
        log::debug!("Target {index} hit, {} left", state.targets.len());
    }

    let blocker_hit = state
        .cannon
        .cannonball()
        .is_some_and(|ball| ball.collides_with(&state.blocker));
    if blocker_hit {
        let blocker = state.blocker.clone();
        apply_hit(state, &blocker);
        result.blocker_hit = true;
        log::debug!("Blocker hit, {:.2}s left", state.time_left);
    }

    result
}

/// Apply an element's collision effect to the clock and the ball
fn apply_hit(state: &mut GameState, element: &GameElement) {
    let effect = element.on_collision();
    element.play_sound(state.events_mut());
    state.time_left += effect.time_delta;
    if effect.consumes_projectile {
        state.cannon.remove_cannonball();
    } else if effect.reflects_projectile {
        if let Some(ball) = state.cannon.cannonball_mut() {
            ball.reverse_velocity_x();
        }
    }
}
