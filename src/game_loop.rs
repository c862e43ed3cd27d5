//! Game loop thread
//!
//! One dedicated thread owns every write to [`GameState`]. Each frame it:
//! measures dt, locks the state, applies queued input commands, ticks the
//! simulation, drains events and builds a [`RenderFrame`]; then it unlocks,
//! plays sounds and presents.
//!
//! Other threads talk to the loop through [`GameLoop`] (cheap to clone):
//! input becomes queued commands, and start/stop are idempotent lifecycle
//! requests. Stopping is cooperative; the caller joins until the thread has
//! exited.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use glam::Vec2;

use crate::audio::AudioPlayer;
use crate::platform::{PointerEvent, ResultPresenter};
use crate::renderer::{RenderFrame, Renderer, build_render_frame};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameResult, GameState, ScreenSize, tick};

/// Loop thread lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopLifecycle {
    Stopped,
    /// Thread spawned, first frame not yet run
    Starting,
    Running,
    /// Stop flag cleared, waiting for the thread to exit
    StopRequested,
}

/// External collaborators driven by the loop
pub struct Collaborators {
    pub renderer: Box<dyn Renderer>,
    pub audio: Arc<dyn AudioPlayer>,
    pub presenter: Arc<dyn ResultPresenter>,
}

/// Input queued for the loop thread
#[derive(Debug, Clone, Copy)]
enum Command {
    AlignAndFire(Vec2),
}

struct Control {
    lifecycle: LoopLifecycle,
    handle: Option<JoinHandle<()>>,
    /// Stop flag of the current thread; each thread gets its own
    running: Option<Arc<AtomicBool>>,
    /// A result is on display and nobody has acknowledged it
    awaiting_ack: bool,
    /// Set by `shutdown`; the loop never starts again
    shut_down: bool,
}

struct Shared {
    state: Mutex<GameState>,
    control: Mutex<Control>,
    renderer: Mutex<Box<dyn Renderer>>,
    audio: Arc<dyn AudioPlayer>,
    presenter: Arc<dyn ResultPresenter>,
    commands_tx: Sender<Command>,
    commands_rx: Mutex<Receiver<Command>>,
    settings: Settings,
    frames: AtomicU64,
}

/// Lock a mutex whose data stays consistent even if a holder panicked
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Recovering poisoned lock");
        PoisonError::into_inner(poisoned)
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Handle to the game loop
#[derive(Clone)]
pub struct GameLoop {
    shared: Arc<Shared>,
}

impl GameLoop {
    /// Set up a new game for `screen`. The thread is not started.
    pub fn new(screen: ScreenSize, settings: Settings, collaborators: Collaborators) -> Self {
        let seed = settings.seed.unwrap_or_else(clock_seed);
        let (commands_tx, commands_rx) = mpsc::channel();
        let shared = Shared {
            state: Mutex::new(GameState::new(screen, seed)),
            control: Mutex::new(Control {
                lifecycle: LoopLifecycle::Stopped,
                handle: None,
                running: None,
                awaiting_ack: false,
                shut_down: false,
            }),
            renderer: Mutex::new(collaborators.renderer),
            audio: collaborators.audio,
            presenter: collaborators.presenter,
            commands_tx,
            commands_rx: Mutex::new(commands_rx),
            settings,
            frames: AtomicU64::new(0),
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Spawn the loop thread. Returns false if it is already running, a
    /// stop is in progress or the loop has been shut down.
    pub fn start(&self) -> bool {
        let mut control = lock(&self.shared.control);
        if control.shut_down {
            log::debug!("Start ignored: game loop shut down");
            return false;
        }
        match control.lifecycle {
            LoopLifecycle::Starting | LoopLifecycle::Running => return false,
            LoopLifecycle::StopRequested => {
                log::warn!("Start ignored: loop is stopping");
                return false;
            }
            LoopLifecycle::Stopped => {}
        }

        // A thread that ended its own game has left the simulation; reap it
        // if it is done, otherwise let it finish on its own
        if let Some(old) = control.handle.take() {
            if old.is_finished() && old.join().is_err() {
                log::error!("Game loop thread panicked");
            }
        }

        let flag = Arc::new(AtomicBool::new(true));
        let shared = Arc::clone(&self.shared);
        let thread_flag = Arc::clone(&flag);
        let spawned = thread::Builder::new()
            .name("game-loop".into())
            .spawn(move || run_loop(shared, thread_flag));

        match spawned {
            Ok(handle) => {
                control.handle = Some(handle);
                control.running = Some(flag);
                control.lifecycle = LoopLifecycle::Starting;
                log::info!("Game loop starting");
                true
            }
            Err(err) => {
                log::error!("Failed to spawn game loop thread: {err}");
                false
            }
        }
    }

    /// Ask the loop to stop and block until its thread has exited.
    /// Safe to call repeatedly and when the loop is not running.
    ///
    /// From the loop thread itself this only requests the stop; the
    /// lifecycle stays `StopRequested` until the thread leaves its loop.
    pub fn stop(&self) {
        let mut joined = false;
        // A thread started while we were joining gets stopped and joined too
        loop {
            let handle = {
                let mut control = lock(&self.shared.control);
                if let Some(flag) = control.running.take() {
                    flag.store(false, Ordering::Release);
                }
                if control.lifecycle != LoopLifecycle::Stopped {
                    control.lifecycle = LoopLifecycle::StopRequested;
                }
                control.handle.take()
            };

            let Some(handle) = handle else { break };
            if handle.thread().id() == thread::current().id() {
                log::debug!("Stop requested from the loop thread");
                return;
            }
            if handle.join().is_err() {
                log::error!("Game loop thread panicked");
            }
            joined = true;
        }

        let mut control = lock(&self.shared.control);
        if control.lifecycle == LoopLifecycle::StopRequested {
            control.lifecycle = LoopLifecycle::Stopped;
        }
        if joined {
            log::info!("Game loop stopped");
        }
    }

    pub fn lifecycle(&self) -> LoopLifecycle {
        lock(&self.shared.control).lifecycle
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.lifecycle(),
            LoopLifecycle::Starting | LoopLifecycle::Running
        )
    }

    /// Reset the simulation. Queued input from the previous game is dropped.
    pub fn new_game(&self) {
        let mut state = lock(&self.shared.state);
        state.new_game();
        let rx = lock(&self.shared.commands_rx);
        let stale = rx.try_iter().count();
        if stale > 0 {
            log::debug!("Discarded {stale} queued commands");
        }
    }

    /// Dismiss the result, start a new game and restart the loop.
    /// Ignored after `shutdown`.
    pub fn acknowledge(&self) {
        {
            let mut control = lock(&self.shared.control);
            if control.shut_down {
                log::debug!("Acknowledge ignored: game loop shut down");
                return;
            }
            control.awaiting_ack = false;
        }
        self.new_game();
        self.start();
    }

    /// Whether a game-over result is waiting for acknowledgement
    pub fn awaiting_acknowledge(&self) -> bool {
        lock(&self.shared.control).awaiting_ack
    }

    /// Queue an aim-and-fire at a screen position; applied on the next frame
    pub fn align_and_fire(&self, point: Vec2) {
        // Receiver lives as long as `shared`, so send cannot fail here
        let _ = self.shared.commands_tx.send(Command::AlignAndFire(point));
    }

    /// Route a pointer event: press and drag aim and fire
    pub fn handle_pointer(&self, event: PointerEvent) {
        if event.aims() {
            self.align_and_fire(event.pos);
        }
    }

    /// New screen geometry; takes effect at the next new game
    pub fn resize(&self, screen: ScreenSize) {
        lock(&self.shared.state).resize(screen);
    }

    /// Run `f` with the state locked
    pub fn with_state<R>(&self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut lock(&self.shared.state))
    }

    /// Frames presented since construction
    pub fn frames(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Drawing surface became available: begin a game unless a result is
    /// still on display
    pub fn surface_created(&self) {
        if self.awaiting_acknowledge() {
            return;
        }
        self.new_game();
        self.start();
    }

    /// Drawing surface is going away
    pub fn surface_destroyed(&self) {
        self.stop();
    }

    /// Stop, join, then release audio. The loop cannot be restarted
    /// afterwards, not even by a pending acknowledge.
    pub fn shutdown(self) {
        lock(&self.shared.control).shut_down = true;
        self.stop();
        self.shared.audio.release();
    }
}

impl Shared {
    /// One simulation step under the state lock
    fn step(&self, dt: f32) -> Option<(RenderFrame, Vec<GameEvent>)> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("Game state lock poisoned, stopping loop");
                return None;
            }
        };

        {
            let rx = lock(&self.commands_rx);
            for command in rx.try_iter() {
                match command {
                    Command::AlignAndFire(point) => {
                        state.align_and_fire(point);
                    }
                }
            }
        }

        tick(&mut state, dt);
        let events = state.drain_events();
        let frame = build_render_frame(&state, self.settings.show_time);
        Some((frame, events))
    }

    fn present(&self, frame: &RenderFrame) {
        let mut renderer = lock(&self.renderer);
        if let Some(overlay) = &frame.overlay {
            renderer.text_overlay(&overlay.text, overlay.position, overlay.size);
        }
        renderer.present(&frame.drawables);
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the loop stopped, unless a newer thread owns the lifecycle.
    ///
    /// `flag` is either still the current one, or `stop` already took it
    /// and left the lifecycle at `StopRequested`.
    fn mark_stopped(&self, flag: &Arc<AtomicBool>, awaiting_ack: bool) {
        flag.store(false, Ordering::Release);
        let mut control = lock(&self.control);
        let current = control
            .running
            .as_ref()
            .is_some_and(|running| Arc::ptr_eq(running, flag));
        if current {
            control.running = None;
        } else if control.running.is_some()
            || control.lifecycle != LoopLifecycle::StopRequested
        {
            return;
        }
        control.lifecycle = LoopLifecycle::Stopped;
        control.awaiting_ack = awaiting_ack;
    }
}

fn run_loop(shared: Arc<Shared>, flag: Arc<AtomicBool>) {
    {
        let mut control = lock(&shared.control);
        let current = control
            .running
            .as_ref()
            .is_some_and(|running| Arc::ptr_eq(running, &flag));
        if current && control.lifecycle == LoopLifecycle::Starting {
            control.lifecycle = LoopLifecycle::Running;
        }
    }

    let max_dt = shared.settings.max_frame_dt;
    let budget = shared.settings.frame_budget();
    let mut previous = Instant::now();

    while flag.load(Ordering::Acquire) {
        let frame_start = Instant::now();
        let dt = frame_start
            .duration_since(previous)
            .as_secs_f32()
            .min(max_dt);
        previous = frame_start;

        let Some((frame, events)) = shared.step(dt) else {
            shared.mark_stopped(&flag, false);
            return;
        };

        let mut finished: Option<GameResult> = None;
        for event in events {
            match event {
                GameEvent::Sound(sound) => shared.audio.play(sound),
                GameEvent::GameOver(result) => finished = Some(result),
            }
        }

        shared.present(&frame);

        if let Some(result) = finished {
            shared.mark_stopped(&flag, true);
            let handle = GameLoop {
                shared: Arc::clone(&shared),
            };
            shared
                .presenter
                .show_result(result, Box::new(move || handle.acknowledge()));
            return;
        }

        if let Some(budget) = budget {
            let elapsed = frame_start.elapsed();
            if elapsed < budget {
                thread::sleep(budget - elapsed);
            }
        }
    }

    shared.mark_stopped(&flag, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundId;
    use crate::platform::Acknowledge;
    use crate::renderer::Drawable;
    use crate::sim::Outcome;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Arc<AtomicU64>,
        last_text: Arc<Mutex<String>>,
    }

    impl Renderer for RecordingRenderer {
        fn text_overlay(&mut self, text: &str, _position: Vec2, _size: f32) {
            *self.last_text.lock().unwrap() = text.to_string();
        }

        fn present(&mut self, _drawables: &[Drawable]) {
            self.frames.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[derive(Default)]
    struct RecordingAudio {
        plays: Mutex<Vec<SoundId>>,
        released: AtomicBool,
        played_after_release: AtomicBool,
    }

    impl AudioPlayer for RecordingAudio {
        fn play(&self, sound: SoundId) {
            if self.released.load(Ordering::Acquire) {
                self.played_after_release.store(true, Ordering::Release);
            }
            self.plays.lock().unwrap().push(sound);
        }

        fn release(&self) {
            self.released.store(true, Ordering::Release);
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        results: Mutex<Vec<GameResult>>,
        pending: Mutex<Option<Acknowledge>>,
        auto_ack: bool,
        /// How long the player looks at the result before an auto ack
        ack_delay: Duration,
    }

    impl ResultPresenter for RecordingPresenter {
        fn show_result(&self, result: GameResult, on_acknowledge: Acknowledge) {
            self.results.lock().unwrap().push(result);
            if self.auto_ack {
                thread::sleep(self.ack_delay);
                on_acknowledge();
            } else {
                *self.pending.lock().unwrap() = Some(on_acknowledge);
            }
        }
    }

    struct Harness {
        game: GameLoop,
        audio: Arc<RecordingAudio>,
        presenter: Arc<RecordingPresenter>,
    }

    fn harness(auto_ack: bool) -> Harness {
        harness_with_delay(auto_ack, Duration::ZERO)
    }

    fn harness_with_delay(auto_ack: bool, ack_delay: Duration) -> Harness {
        let audio = Arc::new(RecordingAudio::default());
        let presenter = Arc::new(RecordingPresenter {
            auto_ack,
            ack_delay,
            ..Default::default()
        });
        let settings = Settings {
            target_fps: 240,
            seed: Some(1),
            ..Default::default()
        };
        let game = GameLoop::new(
            ScreenSize::new(1000.0, 2000.0).unwrap(),
            settings,
            Collaborators {
                renderer: Box::new(RecordingRenderer::default()),
                audio: audio.clone(),
                presenter: presenter.clone(),
            },
        );
        Harness {
            game,
            audio,
            presenter,
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_start_stop_idempotent() {
        let h = harness(false);
        assert_eq!(h.game.lifecycle(), LoopLifecycle::Stopped);

        assert!(h.game.start());
        assert!(!h.game.start());
        assert!(h.game.is_running());
        assert!(wait_for(|| h.game.frames() > 3));
        assert!(wait_for(|| h.game.lifecycle() == LoopLifecycle::Running));

        h.game.stop();
        assert_eq!(h.game.lifecycle(), LoopLifecycle::Stopped);
        let frames = h.game.frames();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(h.game.frames(), frames);

        // Second stop is harmless
        h.game.stop();
        assert_eq!(h.game.lifecycle(), LoopLifecycle::Stopped);

        // And the loop can be started again
        assert!(h.game.start());
        assert!(wait_for(|| h.game.frames() > frames));
        h.game.stop();
    }

    #[test]
    fn test_clock_runs_while_looping() {
        let h = harness(false);
        h.game.start();
        assert!(wait_for(|| h.game.with_state(|s| s.total_elapsed > 0.05)));
        h.game.stop();
        let (time_left, elapsed) = h.game.with_state(|s| (s.time_left, s.total_elapsed));
        assert!((time_left + elapsed - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_rapid_fire_spawns_one_ball() {
        let h = harness(false);
        h.game.start();
        // Nearly straight up along the left edge: nothing to hit for a while
        for _ in 0..5 {
            h.game.align_and_fire(Vec2::new(1.0, 0.0));
        }
        assert!(wait_for(|| h.game.with_state(|s| s.shots_fired == 1)));
        thread::sleep(Duration::from_millis(20));
        h.game.stop();

        assert_eq!(h.game.with_state(|s| s.shots_fired), 1);
        let cannon_sounds = h
            .audio
            .plays
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == SoundId::Cannon)
            .count();
        assert_eq!(cannon_sounds, 1);
    }

    #[test]
    fn test_release_does_not_aim() {
        let h = harness(false);
        h.game.start();
        h.game.handle_pointer(PointerEvent::release(1.0, 0.0));
        h.game.handle_pointer(PointerEvent::press(1.0, 0.0));
        assert!(wait_for(|| h.game.with_state(|s| s.shots_fired == 1)));
        h.game.stop();
    }

    #[test]
    fn test_game_over_stops_loop_and_reports_once() {
        let h = harness(false);
        h.game.with_state(|s| s.time_left = 0.05);
        h.game.start();

        assert!(wait_for(|| !h.presenter.results.lock().unwrap().is_empty()));
        assert!(wait_for(|| h.game.lifecycle() == LoopLifecycle::Stopped));
        assert!(h.game.awaiting_acknowledge());

        let frames = h.game.frames();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(h.game.frames(), frames);

        let results = h.presenter.results.lock().unwrap().clone();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, Outcome::Lost);
        assert_eq!(results[0].shots_fired, 0);
        assert_eq!(h.game.with_state(|s| s.time_left), 0.0);

        // Surface churn while the result is up does not start a game
        h.game.surface_destroyed();
        h.game.surface_created();
        assert_eq!(h.game.lifecycle(), LoopLifecycle::Stopped);

        // Acknowledging starts a fresh game
        let ack = h.presenter.pending.lock().unwrap().take().unwrap();
        ack();
        assert!(h.game.is_running());
        assert!(!h.game.awaiting_acknowledge());
        assert!(wait_for(|| h.game.frames() > frames));
        let (time_left, shots, targets) =
            h.game.with_state(|s| (s.time_left, s.shots_fired, s.targets.len()));
        assert!(time_left > 9.0);
        assert_eq!(shots, 0);
        assert_eq!(targets, 9);
        h.game.stop();
    }

    #[test]
    fn test_acknowledge_from_loop_thread_restarts() {
        let h = harness(true);
        h.game.with_state(|s| s.time_left = 0.02);
        h.game.start();

        assert!(wait_for(|| h.presenter.results.lock().unwrap().len() == 1));
        assert!(wait_for(|| h.game.with_state(|s| s.time_left > 9.0 && !s.is_game_over())));
        assert!(h.game.is_running());
        let frames = h.game.frames();
        assert!(wait_for(|| h.game.frames() > frames));
        h.game.stop();
        assert_eq!(h.game.lifecycle(), LoopLifecycle::Stopped);
    }

    #[test]
    fn test_new_game_discards_queued_fire() {
        let h = harness(false);
        h.game.align_and_fire(Vec2::new(600.0, 1000.0));
        h.game.new_game();
        h.game.start();
        assert!(wait_for(|| h.game.frames() > 5));
        h.game.stop();
        assert_eq!(h.game.with_state(|s| s.shots_fired), 0);
    }

    #[test]
    fn test_shutdown_releases_after_join() {
        let h = harness(false);
        h.game.start();
        h.game.align_and_fire(Vec2::new(1.0, 0.0));
        assert!(wait_for(|| h.game.frames() > 3));

        let game = h.game.clone();
        h.game.shutdown();
        assert_eq!(game.lifecycle(), LoopLifecycle::Stopped);
        assert!(h.audio.released.load(Ordering::Acquire));
        thread::sleep(Duration::from_millis(20));
        assert!(!h.audio.played_after_release.load(Ordering::Acquire));
    }

    #[test]
    fn test_late_acknowledge_after_shutdown_does_not_restart() {
        let h = harness_with_delay(true, Duration::from_millis(100));
        h.game.with_state(|s| s.time_left = 0.02);
        h.game.start();

        // The result is on display and the ack is about to arrive
        assert!(wait_for(|| h.presenter.results.lock().unwrap().len() == 1));
        let game = h.game.clone();
        h.game.shutdown();

        assert_eq!(game.lifecycle(), LoopLifecycle::Stopped);
        assert!(!game.start());
        assert!(h.audio.released.load(Ordering::Acquire));

        let frames = game.frames();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(game.frames(), frames);
        assert_eq!(game.lifecycle(), LoopLifecycle::Stopped);
        assert!(game.with_state(|s| s.is_game_over()));
        assert!(!h.audio.played_after_release.load(Ordering::Acquire));
        assert_eq!(h.presenter.results.lock().unwrap().len(), 1);
    }

    /// Stops the game from inside the loop on the first cannon shot
    #[derive(Default)]
    struct StoppingAudio {
        game: Mutex<Option<GameLoop>>,
        seen: Mutex<Option<(LoopLifecycle, bool)>>,
    }

    impl AudioPlayer for StoppingAudio {
        fn play(&self, sound: SoundId) {
            if sound != SoundId::Cannon {
                return;
            }
            let game = self.game.lock().unwrap().take();
            if let Some(game) = game {
                game.stop();
                let restarted = game.start();
                *self.seen.lock().unwrap() = Some((game.lifecycle(), restarted));
            }
        }
    }

    #[test]
    fn test_stop_from_loop_thread_waits_for_exit() {
        let audio = Arc::new(StoppingAudio::default());
        let settings = Settings {
            target_fps: 240,
            seed: Some(1),
            ..Default::default()
        };
        let game = GameLoop::new(
            ScreenSize::new(1000.0, 2000.0).unwrap(),
            settings,
            Collaborators {
                renderer: Box::new(RecordingRenderer::default()),
                audio: audio.clone(),
                presenter: Arc::new(RecordingPresenter::default()),
            },
        );
        *audio.game.lock().unwrap() = Some(game.clone());

        game.start();
        game.align_and_fire(Vec2::new(1.0, 0.0));

        assert!(wait_for(|| audio.seen.lock().unwrap().is_some()));
        assert_eq!(
            *audio.seen.lock().unwrap(),
            Some((LoopLifecycle::StopRequested, false))
        );
        assert!(wait_for(|| game.lifecycle() == LoopLifecycle::Stopped));

        let frames = game.frames();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(game.frames(), frames);
        game.stop();
        assert_eq!(game.lifecycle(), LoopLifecycle::Stopped);
    }
}
