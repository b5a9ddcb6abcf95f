//! Sky Raid headless runner
//!
//! Drives a session over an in-memory surface with a short scripted input
//! sequence and logs what the session reports. Pass a settings JSON path as
//! the first argument to override the built-in tuning.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use sky_raid::sim::{
    FrameScheduler, HeadlessSurface, InputEvent, Key, Screen, Session, SessionEvent,
};
use sky_raid::{ConfigError, GameSettings};

/// Upper bound on simulated frames
const MAX_FRAMES: u64 = 6_000;

/// Frames between vertical direction changes of the scripted pilot
const SWEEP_FRAMES: u64 = 40;

fn main() -> Result<(), ConfigError> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => GameSettings::load(path)?,
        None => GameSettings::default(),
    };
    log::info!("Sky Raid (headless) starting with seed {:#x}", settings.seed);

    let frame_seconds = settings.tuning.frame_seconds;
    let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
    let mut session = Session::new(settings, Box::new(surface.clone()))?;
    let events = session.subscribe();

    let mut scheduler = FrameScheduler::with_updater(session);
    scheduler.start()?;

    for frame in 0..MAX_FRAMES {
        if let Some(session) = scheduler.updater_mut() {
            for event in scripted_input(frame) {
                session.handle_input(event);
            }
        }
        scheduler.on_frame(frame as f64 * frame_seconds);

        if drain_events(&events) {
            break;
        }
    }

    let ticks = scheduler.ticks_run();
    let frames = scheduler.frames_seen();
    scheduler.stop();
    log::info!(
        "Finished after {ticks} ticks over {frames} frames; {} visuals still attached",
        surface.borrow().attached()
    );
    Ok(())
}

/// Start a run, hold fire and sweep up and down
fn scripted_input(frame: u64) -> Vec<InputEvent> {
    match frame {
        0 => vec![InputEvent::Pressed(Key::Start)],
        1 => vec![InputEvent::Pressed(Key::Fire)],
        f if f % SWEEP_FRAMES == 2 => {
            if (f / SWEEP_FRAMES) % 2 == 0 {
                vec![InputEvent::Released(Key::Down), InputEvent::Pressed(Key::Up)]
            } else {
                vec![InputEvent::Released(Key::Up), InputEvent::Pressed(Key::Down)]
            }
        }
        _ => Vec::new(),
    }
}

/// Log session events; returns true once the run is over
fn drain_events(events: &Receiver<SessionEvent>) -> bool {
    let mut finished = false;
    for event in events.try_iter() {
        match event {
            SessionEvent::ScreenChanged(screen) => {
                log::info!("Screen: {screen:?}");
                finished |= matches!(screen, Screen::Win | Screen::Lose);
            }
            SessionEvent::Hud(hud) => log::debug!("HUD: {hud:?}"),
            SessionEvent::Closed => {
                log::info!("Session closed");
                finished = true;
            }
        }
    }
    finished
}
