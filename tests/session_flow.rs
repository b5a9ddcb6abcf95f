//! End-to-end runs of a session driven by the frame scheduler

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use sky_raid::sim::{
    Category, FrameScheduler, HeadlessSurface, InputEvent, Key, Screen, Session, SessionEvent,
};
use sky_raid::{GameSettings, LevelConfig, LevelGoal};

/// One kill-target level whose enemies span the full screen height, so a
/// player holding fire cannot miss
fn shooting_gallery(kills: u32) -> GameSettings {
    let mut settings = GameSettings::default();
    settings.tuning.enemy.size = Vec2::new(90.0, settings.tuning.screen_height);
    settings.tuning.enemy.fire_chance = 0.0;
    settings.levels = vec![LevelConfig {
        name: "Gallery".to_string(),
        background: "gallery".to_string(),
        goal: LevelGoal::Kills { target: kills },
        enemy_cap: 1,
        enemy_spawn_chance: 1.0,
        escorts: 0,
    }];
    settings
}

fn run_frames(scheduler: &mut FrameScheduler<Session>, from: u64, count: u64) -> u64 {
    let frame_seconds = scheduler
        .updater()
        .map_or(0.05, |s| s.settings().tuning.frame_seconds);
    for frame in from..from + count {
        scheduler.on_frame(frame as f64 * frame_seconds);
    }
    from + count
}

#[test]
fn test_holding_fire_clears_gallery_and_wins() {
    let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
    let mut session = Session::new(shooting_gallery(3), Box::new(surface.clone())).unwrap();
    let events = session.subscribe();
    session.handle_input(InputEvent::Pressed(Key::Start));
    session.handle_input(InputEvent::Pressed(Key::Fire));
    assert_eq!(surface.borrow().background(), Some("gallery"));

    let mut scheduler = FrameScheduler::with_updater(session);
    scheduler.start().unwrap();
    run_frames(&mut scheduler, 0, 1_000);

    let session = scheduler.into_updater().unwrap();
    assert_eq!(session.screen(), Screen::Win);

    let received: Vec<SessionEvent> = events.try_iter().collect();
    let screens: Vec<Screen> = received
        .iter()
        .filter_map(|event| match event {
            SessionEvent::ScreenChanged(screen) => Some(*screen),
            _ => None,
        })
        .collect();
    assert_eq!(screens, vec![Screen::MainMenu, Screen::Level(1), Screen::Win]);

    let best_kills = received
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Hud(hud) => Some(hud.kills),
            _ => None,
        })
        .max();
    assert_eq!(best_kills, Some(3));
    assert_eq!(surface.borrow().attached(), 0);
}

#[test]
fn test_pause_freezes_level_until_resumed() {
    let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
    let mut session = Session::new(shooting_gallery(100), Box::new(surface)).unwrap();
    session.handle_input(InputEvent::Pressed(Key::Start));

    let mut scheduler = FrameScheduler::with_updater(session);
    scheduler.start().unwrap();
    let mut frame = run_frames(&mut scheduler, 0, 10);
    let ticks_before = level_ticks(&scheduler);
    assert_eq!(ticks_before, 10);

    scheduler.pause();
    frame = run_frames(&mut scheduler, frame, 5);
    assert_eq!(level_ticks(&scheduler), ticks_before);

    scheduler.resume();
    run_frames(&mut scheduler, frame, 1);
    assert_eq!(level_ticks(&scheduler), ticks_before + 1);
    assert_eq!(scheduler.frames_seen(), 16);
    assert_eq!(scheduler.ticks_run(), 11);
}

fn level_ticks(scheduler: &FrameScheduler<Session>) -> u64 {
    scheduler
        .updater()
        .and_then(Session::level)
        .map_or(0, |run| run.progress().ticks)
}

#[test]
fn test_exit_mid_level_closes_and_releases_surface() {
    let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
    let mut session = Session::new(GameSettings::default(), Box::new(surface.clone())).unwrap();
    let events = session.subscribe();
    session.handle_input(InputEvent::Pressed(Key::Start));

    let mut scheduler = FrameScheduler::with_updater(session);
    scheduler.start().unwrap();
    run_frames(&mut scheduler, 0, 20);
    assert!(
        scheduler
            .updater()
            .and_then(Session::level)
            .is_some_and(|run| run.registry().len(Category::Player) == 1)
    );

    if let Some(session) = scheduler.updater_mut() {
        session.handle_input(InputEvent::Pressed(Key::Exit));
    }
    run_frames(&mut scheduler, 20, 5);

    let session = scheduler.into_updater().unwrap();
    assert!(session.is_closed());
    assert_eq!(events.try_iter().last(), Some(SessionEvent::Closed));
    assert_eq!(surface.borrow().attached(), 0);
}

#[test]
fn test_settings_from_json_drive_a_session() {
    let json = r#"{
        "seed": 7,
        "levels": [
            {
                "name": "Only",
                "background": "sky",
                "goal": "DefeatPhasedBoss",
                "enemy_cap": 0,
                "enemy_spawn_chance": 0.0
            }
        ]
    }"#;
    let settings = GameSettings::from_json_str(json).unwrap();
    let mut session = Session::new(settings, Box::new(HeadlessSurface::new())).unwrap();
    session.handle_input(InputEvent::Pressed(Key::Start));

    let run = session.level().unwrap();
    assert_eq!(run.registry().len(Category::BossUnit), 1);
    assert_eq!(run.hud().boss_phase, Some(1));
}
