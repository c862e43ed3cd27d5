//! Per-frame simulation step
//!
//! Order within a frame: move everything, run the clock, resolve collisions,
//! then check for the end of the game.

use super::collision::resolve_collisions;
use super::state::{GameEvent, GamePhase, GameResult, GameState, Outcome};

/// Advance the game by `dt` seconds.
///
/// No-op once the game is over. Returns the result on the frame the game
/// ends.
pub fn tick(state: &mut GameState, dt: f32) -> Option<GameResult> {
    if state.is_game_over() {
        return None;
    }
    update_positions(state, dt);
    resolve_collisions(state);
    check_game_over(state)
}

/// Move the ball and the bars, run the clock
pub fn update_positions(state: &mut GameState, dt: f32) {
    if dt.is_nan() || dt <= 0.0 {
        return;
    }
    let screen = state.screen;

    if let Some(ball) = state.cannon.cannonball_mut() {
        ball.update(dt, &screen);
    }
    state.blocker.update(dt, &screen);
    for target in &mut state.targets {
        target.update(dt, &screen);
    }

    state.total_elapsed += dt;
    state.time_left -= dt;
}

/// End the game if the clock ran out or every target is gone.
///
/// The clock is checked first: a frame that both empties the clock and
/// clears the last target is a loss.
pub fn check_game_over(state: &mut GameState) -> Option<GameResult> {
    if state.is_game_over() {
        return None;
    }

    let outcome = if state.time_left <= 0.0 {
        state.time_left = 0.0;
        Outcome::Lost
    } else if state.targets.is_empty() {
        Outcome::Won
    } else {
        return None;
    };

    state.phase = GamePhase::GameOver(outcome);
    let result = state.result()?;
    state.events_mut().push(GameEvent::GameOver(result));
    log::info!(
        "Game over: {:?} after {} shots in {:.1}s",
        outcome,
        result.shots_fired,
        result.elapsed_secs
    );
    Some(result)
}
