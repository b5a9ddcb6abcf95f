//! Top-level session state machine
//!
//! MainMenu → Level(1) → … → Level(n) → Win, with Lose reachable from any
//! level and Closed reachable from everywhere. Every transition fully tears
//! down the previous state before the next one is built.

use std::sync::mpsc;

use rand::SeedableRng;

use super::context::{FrameContext, SimRng};
use super::input::{InputEvent, InputState, Key};
use super::level::{HudSnapshot, LevelRun, LevelStatus};
use super::scheduler::Updater;
use super::surface::RenderSurface;
use crate::error::ConfigError;
use crate::settings::GameSettings;

/// What the player is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    MainMenu,
    /// 1-based level number
    Level(usize),
    Win,
    Lose,
    /// Terminal
    Closed,
}

/// Notifications for the host's UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ScreenChanged(Screen),
    Hud(HudSnapshot),
    Closed,
}

enum Stage {
    Menu,
    Playing(LevelRun),
    Win,
    Lose,
    Closed,
}

impl Stage {
    fn screen(&self) -> Screen {
        match self {
            Stage::Menu => Screen::MainMenu,
            Stage::Playing(run) => Screen::Level(run.number()),
            Stage::Win => Screen::Win,
            Stage::Lose => Screen::Lose,
            Stage::Closed => Screen::Closed,
        }
    }
}

pub struct Session {
    settings: GameSettings,
    rng: SimRng,
    input: InputState,
    stage: Stage,
    /// Held while no level is running
    surface: Option<Box<dyn RenderSurface>>,
    events: Option<mpsc::Sender<SessionEvent>>,
    last_hud: Option<HudSnapshot>,
    now: f64,
}

impl Session {
    /// Validate settings and open at the main menu
    pub fn new(
        settings: GameSettings,
        surface: Box<dyn RenderSurface>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        if !surface.is_ready() {
            log::error!("Session created against an uninitialized surface");
            return Err(ConfigError::SurfaceNotReady);
        }
        log::info!(
            "Session ready: {} levels, seed {:#x}",
            settings.levels.len(),
            settings.seed
        );
        Ok(Self {
            rng: SimRng::seed_from_u64(settings.seed),
            settings,
            input: InputState::default(),
            stage: Stage::Menu,
            surface: Some(surface),
            events: None,
            last_hud: None,
            now: 0.0,
        })
    }

    /// Single-consumer event stream
    ///
    /// A new subscription replaces (and disconnects) the previous one. The
    /// current screen is sent immediately.
    pub fn subscribe(&mut self) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.events = Some(tx);
        self.emit(SessionEvent::ScreenChanged(self.screen()));
        if let Some(hud) = self.last_hud {
            self.emit(SessionEvent::Hud(hud));
        }
        rx
    }

    pub fn screen(&self) -> Screen {
        self.stage.screen()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.stage, Stage::Closed)
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Keys currently held
    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn level(&self) -> Option<&LevelRun> {
        match &self.stage {
            Stage::Playing(run) => Some(run),
            _ => None,
        }
    }

    pub fn level_mut(&mut self) -> Option<&mut LevelRun> {
        match &mut self.stage {
            Stage::Playing(run) => Some(run),
            _ => None,
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if self.is_closed() {
            return;
        }
        match (event, self.screen()) {
            (InputEvent::Pressed(Key::Exit), _) => self.close(),
            (InputEvent::Pressed(Key::Start), Screen::MainMenu) => self.enter(Screen::Level(1)),
            (InputEvent::Pressed(Key::Start | Key::Menu), Screen::Win | Screen::Lose) => {
                self.enter(Screen::MainMenu)
            }
            (_, Screen::Level(_)) => self.input.apply(event),
            _ => {}
        }
    }

    /// Move to `target`, tearing the current state down first
    ///
    /// Re-entering the active screen is a no-op.
    pub fn enter(&mut self, target: Screen) {
        let current = self.screen();
        if current == target {
            log::warn!("Ignoring transition to {target:?}: already active");
            return;
        }
        if current == Screen::Closed {
            log::warn!("Ignoring transition to {target:?}: session is closed");
            return;
        }
        let unconfigured = match target {
            Screen::Level(number) => !(1..=self.settings.levels.len()).contains(&number),
            _ => false,
        };
        if unconfigured {
            log::warn!("Ignoring transition to {target:?}: level not configured");
            return;
        }

        self.teardown();

        let next = match target {
            Screen::MainMenu => Stage::Menu,
            Screen::Win => Stage::Win,
            Screen::Lose => Stage::Lose,
            Screen::Closed => Stage::Closed,
            Screen::Level(number) => match self.start_level(number) {
                Ok(stage) => stage,
                Err(err) => {
                    // Teardown left the session closed
                    log::error!("Failed to start level {number}: {err}");
                    self.emit(SessionEvent::Closed);
                    return;
                }
            },
        };
        self.stage = next;

        log::info!("Session: {current:?} -> {:?}", self.screen());
        if target == Screen::Closed {
            self.emit(SessionEvent::Closed);
            return;
        }
        self.emit(SessionEvent::ScreenChanged(self.screen()));
        self.publish_hud();
    }

    /// Terminal; safe to call repeatedly
    pub fn close(&mut self) {
        if !self.is_closed() {
            self.enter(Screen::Closed);
        }
    }

    /// Run one tick of the active level
    pub fn tick(&mut self, now: f64) {
        self.now = now;
        let Stage::Playing(run) = &mut self.stage else {
            return;
        };
        let number = run.number();
        let mut frame = FrameContext {
            now,
            rng: &mut self.rng,
            input: &self.input,
            tuning: &self.settings.tuning,
        };
        let status = run.tick(&mut frame);
        self.publish_hud();

        match status {
            LevelStatus::Running => {}
            LevelStatus::PlayerLost => self.enter(Screen::Lose),
            LevelStatus::Completed if number >= self.settings.levels.len() => {
                self.enter(Screen::Win)
            }
            LevelStatus::Completed => self.enter(Screen::Level(number + 1)),
        }
    }

    fn start_level(&mut self, number: usize) -> Result<Stage, ConfigError> {
        let config = number
            .checked_sub(1)
            .and_then(|index| self.settings.levels.get(index))
            .ok_or_else(|| {
                ConfigError::invalid("level", format!("level {number} is not configured"))
            })?;
        let surface = self.surface.take().ok_or(ConfigError::SurfaceNotReady)?;
        let run = LevelRun::new(
            number,
            config,
            surface,
            &self.settings.tuning,
            &mut self.rng,
            self.now,
        )?;
        Ok(Stage::Playing(run))
    }

    /// Release everything the current state owns
    fn teardown(&mut self) {
        let previous = std::mem::replace(&mut self.stage, Stage::Closed);
        if let Stage::Playing(run) = previous {
            self.surface = Some(run.into_surface());
        }
        self.input.clear();
        self.last_hud = None;
    }

    fn publish_hud(&mut self) {
        let Some(hud) = self.level().map(LevelRun::hud) else {
            return;
        };
        if self.last_hud != Some(hud) {
            self.last_hud = Some(hud);
            self.emit(SessionEvent::Hud(hud));
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                log::debug!("Session event receiver dropped");
                self.events = None;
            }
        }
    }
}

impl Updater for Session {
    fn update(&mut self, now: f64) {
        self.tick(now);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc::TryRecvError;

    use glam::Vec2;

    use super::*;
    use crate::settings::{LevelConfig, LevelGoal};
    use crate::sim::entity::Category;
    use crate::sim::factory;
    use crate::sim::surface::HeadlessSurface;

    fn boss_levels(count: usize) -> GameSettings {
        let mut settings = GameSettings::default();
        settings.levels = (1..=count)
            .map(|i| LevelConfig {
                name: format!("Level {i}"),
                background: format!("background{i}"),
                goal: LevelGoal::DefeatPhasedBoss,
                enemy_cap: 0,
                enemy_spawn_chance: 0.0,
                escorts: 0,
            })
            .collect();
        settings
    }

    fn session(settings: GameSettings) -> (Session, Rc<RefCell<HeadlessSurface>>) {
        let surface = Rc::new(RefCell::new(HeadlessSurface::new()));
        let session = Session::new(settings, Box::new(surface.clone())).unwrap();
        (session, surface)
    }

    fn screens(rx: &mpsc::Receiver<SessionEvent>) -> Vec<Screen> {
        rx.try_iter()
            .filter_map(|event| match event {
                SessionEvent::ScreenChanged(screen) => Some(screen),
                _ => None,
            })
            .collect()
    }

    fn defeat_boss(session: &mut Session) {
        let run = session.level_mut().unwrap();
        let (boss, _) = run.registry().boss_units().next().unwrap();
        run.registry_mut().get_mut(boss).unwrap().body.destroy();
    }

    #[test]
    fn test_rejects_invalid_settings_and_surface() {
        let mut empty = GameSettings::default();
        empty.levels.clear();
        let surface = Box::new(HeadlessSurface::new());
        assert!(matches!(Session::new(empty, surface), Err(ConfigError::NoLevels)));

        let surface = Box::new(HeadlessSurface::uninitialized());
        assert!(matches!(
            Session::new(GameSettings::default(), surface),
            Err(ConfigError::SurfaceNotReady)
        ));
    }

    #[test]
    fn test_levels_advance_then_win_then_menu() {
        let (mut session, _surface) = session(boss_levels(2));
        let rx = session.subscribe();

        session.handle_input(InputEvent::Pressed(Key::Start));
        assert_eq!(session.screen(), Screen::Level(1));

        defeat_boss(&mut session);
        session.tick(0.05);
        assert_eq!(session.screen(), Screen::Level(2));

        defeat_boss(&mut session);
        session.tick(0.10);
        assert_eq!(session.screen(), Screen::Win);

        session.handle_input(InputEvent::Pressed(Key::Menu));
        assert_eq!(
            screens(&rx),
            vec![
                Screen::MainMenu,
                Screen::Level(1),
                Screen::Level(2),
                Screen::Win,
                Screen::MainMenu
            ]
        );
    }

    #[test]
    fn test_player_loss_cleans_up_level() {
        let mut settings = boss_levels(1);
        settings.tuning.enemy.breach_damage = 100;
        settings.tuning.enemy.fire_chance = 0.0;
        let (mut session, surface) = session(settings);
        session.handle_input(InputEvent::Pressed(Key::Start));
        session.handle_input(InputEvent::Pressed(Key::Up));
        assert!(session.input().up);

        let tuning = session.settings().tuning.clone();
        let escaping = factory::enemy(&tuning, Vec2::new(-tuning.enemy.size.x + 1.0, 700.0));
        session
            .level_mut()
            .unwrap()
            .registry_mut()
            .register(Category::EnemyUnit, escaping);
        session.tick(0.05);

        assert_eq!(session.screen(), Screen::Lose);
        assert!(session.level().is_none());
        assert_eq!(surface.borrow().attached(), 0);
        assert_eq!(*session.input(), InputState::default());

        session.handle_input(InputEvent::Pressed(Key::Start));
        assert_eq!(session.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_hud_published_on_change_only() {
        let (mut session, _surface) = session(boss_levels(1));
        let rx = session.subscribe();
        session.handle_input(InputEvent::Pressed(Key::Start));
        session.tick(0.05);
        session.tick(0.10);

        let huds: Vec<HudSnapshot> = rx
            .try_iter()
            .filter_map(|event| match event {
                SessionEvent::Hud(hud) => Some(hud),
                _ => None,
            })
            .collect();
        assert_eq!(huds.len(), 1);
        assert_eq!(huds[0].boss_phase, Some(1));
        assert_eq!(huds[0].health, session.settings().tuning.player.health);
    }

    #[test]
    fn test_new_subscription_replaces_previous() {
        let (mut session, _surface) = session(boss_levels(1));
        let first = session.subscribe();
        let second = session.subscribe();

        assert_eq!(first.try_recv(), Ok(SessionEvent::ScreenChanged(Screen::MainMenu)));
        assert_eq!(first.try_recv(), Err(TryRecvError::Disconnected));

        session.handle_input(InputEvent::Pressed(Key::Start));
        assert_eq!(screens(&second), vec![Screen::MainMenu, Screen::Level(1)]);
    }

    #[test]
    fn test_reentering_active_screen_is_noop() {
        let (mut session, _surface) = session(boss_levels(1));
        let rx = session.subscribe();
        let _ = screens(&rx);

        session.enter(Screen::MainMenu);
        assert!(rx.try_recv().is_err());

        session.handle_input(InputEvent::Pressed(Key::Start));
        let player_before = session.level().unwrap().player_id();
        session.enter(Screen::Level(1));
        assert_eq!(session.level().unwrap().player_id(), player_before);
        assert_eq!(screens(&rx), vec![Screen::Level(1)]);
    }

    #[test]
    fn test_unconfigured_level_is_noop() {
        let (mut session, surface) = session(boss_levels(1));
        let rx = session.subscribe();
        let _ = screens(&rx);

        session.enter(Screen::Level(5));
        assert_eq!(session.screen(), Screen::MainMenu);
        assert!(rx.try_recv().is_err());

        session.handle_input(InputEvent::Pressed(Key::Start));
        let player_before = session.level().unwrap().player_id();
        let attached = surface.borrow().attached();
        let _ = screens(&rx);

        session.enter(Screen::Level(0));
        session.enter(Screen::Level(2));
        assert_eq!(session.screen(), Screen::Level(1));
        assert_eq!(session.level().unwrap().player_id(), player_before);
        assert_eq!(surface.borrow().attached(), attached);
        assert!(!session.is_closed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_exit_closes_from_anywhere() {
        let (mut session, surface) = session(boss_levels(1));
        let rx = session.subscribe();
        session.handle_input(InputEvent::Pressed(Key::Start));
        session.handle_input(InputEvent::Pressed(Key::Exit));

        assert!(session.is_closed());
        assert_eq!(surface.borrow().attached(), 0);
        assert_eq!(rx.try_iter().last(), Some(SessionEvent::Closed));

        session.handle_input(InputEvent::Pressed(Key::Start));
        session.close();
        session.tick(1.0);
        assert_eq!(session.screen(), Screen::Closed);
    }

    #[test]
    fn test_menu_ignores_movement_keys() {
        let (mut session, _surface) = session(boss_levels(1));
        session.handle_input(InputEvent::Pressed(Key::Fire));
        assert!(!session.input().fire);
        session.handle_input(InputEvent::Pressed(Key::Start));
        session.handle_input(InputEvent::Pressed(Key::Fire));
        assert!(session.input().fire);
    }
}
