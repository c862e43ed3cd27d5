//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module knows about threads,
//! rendering backends or audio output:
//! - Time advances only through `tick(dt)`
//! - Seeded RNG only
//! - Targets keep their left-to-right creation order

pub mod cannon;
pub mod collision;
pub mod element;
pub mod geometry;
pub mod projectile;
pub mod state;
pub mod tick;

pub use cannon::Cannon;
pub use collision::{CollisionResult, resolve_collisions};
pub use element::{CollisionEffect, ElementKind, GameElement};
pub use geometry::{Rect, ScreenSize, collides};
pub use projectile::Cannonball;
pub use state::{GameEvent, GamePhase, GameResult, GameState, Outcome, RngState};
pub use tick::{check_game_over, tick, update_positions};
