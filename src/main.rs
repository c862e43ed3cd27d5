//! Cannon Game entry point
//!
//! Runs the game loop headless: frames go to the log, a scripted input
//! thread plays the role of the touch screen, and results print to stdout.
//!
//! Usage: `cannon-game [WIDTH HEIGHT [ROUNDS]]`. Settings are read from the
//! JSON file named by `CANNON_SETTINGS`, if set.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;

use cannon_game::audio::AudioManager;
use cannon_game::platform::{Acknowledge, PointerEvent, ResultPresenter};
use cannon_game::renderer::LogRenderer;
use cannon_game::sim::{GameResult, ScreenSize};
use cannon_game::{Collaborators, GameLoop, Settings};

/// Interval between scripted taps
const TAP_INTERVAL: Duration = Duration::from_millis(200);

/// Forwards results to the main thread, which decides whether to play on
struct ChannelPresenter {
    tx: mpsc::Sender<(GameResult, Acknowledge)>,
}

impl ResultPresenter for ChannelPresenter {
    fn show_result(&self, result: GameResult, on_acknowledge: Acknowledge) {
        if self.tx.send((result, on_acknowledge)).is_err() {
            log::warn!("Result dropped: main thread is gone");
        }
    }
}

fn parse_args() -> Result<(ScreenSize, u32)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let number = |i: usize, default: f32| -> Result<f32> {
        match args.get(i) {
            Some(arg) => arg
                .parse()
                .with_context(|| format!("argument {} is not a number: {arg}", i + 1)),
            None => Ok(default),
        }
    };
    let screen = ScreenSize::new(number(0, 1080.0)?, number(1, 1920.0)?)?;
    let rounds = number(2, 2.0)? as u32;
    Ok((screen, rounds.max(1)))
}

fn load_settings() -> Result<Settings> {
    match std::env::var("CANNON_SETTINGS") {
        Ok(path) => {
            Settings::load(&path).with_context(|| format!("loading settings from {path}"))
        }
        Err(_) => Ok(Settings::default()),
    }
}

/// Tap at the nearest target every `TAP_INTERVAL` until told to stop
fn spawn_input(game: GameLoop, done: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !done.load(Ordering::Acquire) {
            let aim = game.with_state(|s| {
                s.targets.first().map(|t| {
                    Vec2::new(
                        (t.shape.left + t.shape.right) / 2.0,
                        (t.shape.top + t.shape.bottom) / 2.0,
                    )
                })
            });
            if let Some(aim) = aim {
                game.handle_pointer(PointerEvent::press(aim.x, aim.y));
            }
            thread::sleep(TAP_INTERVAL);
        }
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (screen, rounds) = parse_args()?;
    let settings = load_settings()?;
    log::info!(
        "Cannon Game (headless) on {}x{}, {} round(s)",
        screen.width,
        screen.height,
        rounds
    );

    let (tx, rx) = mpsc::channel();
    let game = GameLoop::new(
        screen,
        settings.clone(),
        Collaborators {
            renderer: Box::new(LogRenderer::new()),
            audio: Arc::new(AudioManager::new(&settings)),
            presenter: Arc::new(ChannelPresenter { tx }),
        },
    );

    let done = Arc::new(AtomicBool::new(false));
    let input = spawn_input(game.clone(), Arc::clone(&done));

    game.surface_created();
    for round in 1..=rounds {
        let (result, acknowledge) = rx.recv().context("game loop exited without a result")?;
        println!(
            "Round {round}: {:?} - {} shots, {:.1}s",
            result.outcome, result.shots_fired, result.elapsed_secs
        );
        if round < rounds {
            acknowledge();
        }
    }

    done.store(true, Ordering::Release);
    if input.join().is_err() {
        log::error!("Input thread panicked");
    }
    game.surface_destroyed();
    game.shutdown();
    Ok(())
}
