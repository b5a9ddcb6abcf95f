//! Level collaborator and per-level run state
//!
//! A `LevelScript` decides what populates a level and when it is complete.
//! `LevelRun` owns the registry for the lifetime of one level and drives
//! the fixed per-tick order:
//!
//! 1. script spawns
//! 2. behavior update
//! 3. collision resolution
//! 4. breach damage
//! 5. sweep
//! 6. bookkeeping (kills, bosses, HUD)
//! 7. completion check

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionEngine, HitListener};
use super::context::{FrameContext, SimRng};
use super::entity::{Category, DamageOutcome, EntityId};
use super::factory;
use super::registry::{EntityRegistry, Removed};
use super::surface::RenderSurface;
use crate::error::ConfigError;
use crate::settings::{LevelConfig, LevelGoal, Tuning};

/// Running totals a script uses to decide completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelProgress {
    /// Hostile planes destroyed by credited user projectiles
    pub kills: u32,
    /// Boss planes removed after being destroyed or defeated
    pub bosses_defeated: u32,
    /// Enemy planes that escaped past the trailing edge
    pub breaches: u32,
    pub ticks: u64,
}

pub trait LevelScript {
    fn name(&self) -> &str;

    /// Visual key for the level backdrop
    fn background(&self) -> Option<&str> {
        None
    }

    /// Kill count shown on the HUD, if the level has one
    fn kill_target(&self) -> Option<u32> {
        None
    }

    /// Called once after the player is registered
    fn populate(
        &mut self,
        registry: &mut EntityRegistry,
        tuning: &Tuning,
        rng: &mut SimRng,
        now: f64,
    );

    /// Called at the start of every tick
    fn spawn(&mut self, registry: &mut EntityRegistry, tuning: &Tuning, rng: &mut SimRng, now: f64);

    fn is_complete(&self, progress: &LevelProgress) -> bool;
}

/// Level driven entirely by a `LevelConfig`
#[derive(Debug, Clone)]
pub struct StandardLevel {
    config: LevelConfig,
}

impl StandardLevel {
    pub fn new(config: LevelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }
}

impl LevelScript for StandardLevel {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn background(&self) -> Option<&str> {
        Some(&self.config.background)
    }

    fn kill_target(&self) -> Option<u32> {
        match self.config.goal {
            LevelGoal::Kills { target } => Some(target),
            LevelGoal::DefeatBoss | LevelGoal::DefeatPhasedBoss => None,
        }
    }

    fn populate(
        &mut self,
        registry: &mut EntityRegistry,
        tuning: &Tuning,
        rng: &mut SimRng,
        now: f64,
    ) {
        for slot in 0..self.config.escorts {
            registry.register(Category::FriendlyUnit, factory::escort(tuning, slot));
        }
        match self.config.goal {
            LevelGoal::Kills { .. } => {}
            LevelGoal::DefeatBoss => {
                registry.register(Category::BossUnit, factory::boss(tuning, rng, now));
            }
            LevelGoal::DefeatPhasedBoss => {
                registry.register(Category::BossUnit, factory::phased_boss(tuning, now));
            }
        }
    }

    fn spawn(
        &mut self,
        registry: &mut EntityRegistry,
        tuning: &Tuning,
        rng: &mut SimRng,
        _now: f64,
    ) {
        if registry.len(Category::EnemyUnit) >= self.config.enemy_cap {
            return;
        }
        if rng.random::<f64>() >= self.config.enemy_spawn_chance {
            return;
        }
        let max_y = (tuning.screen_height - tuning.enemy.size.y).max(0.0);
        let y = rng.random_range(0.0..=max_y);
        let pos = glam::Vec2::new(tuning.screen_width, y);
        let id = registry.register(Category::EnemyUnit, factory::enemy(tuning, pos));
        log::debug!("Spawned enemy {id} at y={y:.0}");
    }

    fn is_complete(&self, progress: &LevelProgress) -> bool {
        match self.config.goal {
            LevelGoal::Kills { target } => progress.kills >= target,
            LevelGoal::DefeatBoss | LevelGoal::DefeatPhasedBoss => progress.bosses_defeated > 0,
        }
    }
}

/// What the HUD shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudSnapshot {
    /// Player health, 0 once the player is gone
    pub health: i32,
    pub kills: u32,
    pub kill_target: Option<u32>,
    /// Phase number of a multi-phase boss on screen
    pub boss_phase: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Running,
    Completed,
    PlayerLost,
}

/// Per-level hit listener counting credited kills
#[derive(Debug, Default)]
struct KillTally {
    kills: u32,
}

impl HitListener for KillTally {
    fn on_hit(&mut self, owner: EntityId, target: EntityId, outcome: DamageOutcome) {
        if outcome.is_kill() {
            self.kills += 1;
            log::debug!("{owner} shot down {target}");
        }
    }
}

pub struct LevelRun {
    number: usize,
    registry: EntityRegistry,
    engine: CollisionEngine,
    script: Box<dyn LevelScript>,
    tally: KillTally,
    progress: LevelProgress,
    player: EntityId,
}

impl LevelRun {
    /// Start level `number` (1-based) from its config
    pub fn new(
        number: usize,
        config: &LevelConfig,
        surface: Box<dyn RenderSurface>,
        tuning: &Tuning,
        rng: &mut SimRng,
        now: f64,
    ) -> Result<Self, ConfigError> {
        Self::with_script(
            number,
            Box::new(StandardLevel::new(config.clone())),
            surface,
            tuning,
            rng,
            now,
        )
    }

    pub fn with_script(
        number: usize,
        mut script: Box<dyn LevelScript>,
        surface: Box<dyn RenderSurface>,
        tuning: &Tuning,
        rng: &mut SimRng,
        now: f64,
    ) -> Result<Self, ConfigError> {
        let mut registry = EntityRegistry::new(surface)?;
        if let Some(background) = script.background() {
            registry.surface_mut().set_background(background);
        }
        let player = registry.register(Category::Player, factory::player(tuning));
        script.populate(&mut registry, tuning, rng, now);
        log::info!(
            "Level {number} ({}) started with {} entities",
            script.name(),
            registry.total()
        );

        Ok(Self {
            number,
            registry,
            engine: CollisionEngine::default(),
            script,
            tally: KillTally::default(),
            progress: LevelProgress::default(),
            player,
        })
    }

    /// Run one tick in the fixed order
    pub fn tick(&mut self, frame: &mut FrameContext<'_>) -> LevelStatus {
        let now = frame.now;
        self.script.spawn(&mut self.registry, frame.tuning, frame.rng, now);
        self.registry.update_all(frame);
        self.engine.resolve(&mut self.registry, now, &mut self.tally);
        self.apply_breaches(frame.tuning, now);
        let removed = self.registry.sweep_destroyed();
        self.bookkeep(&removed);

        if !self.player_alive() {
            log::info!("Level {} lost after {} ticks", self.number, self.progress.ticks);
            LevelStatus::PlayerLost
        } else if self.script.is_complete(&self.progress) {
            log::info!(
                "Level {} completed after {} ticks",
                self.number,
                self.progress.ticks
            );
            LevelStatus::Completed
        } else {
            LevelStatus::Running
        }
    }

    /// Destroyed enemies past the left edge got through; the player pays
    /// before the sweep so a lethal breach is removed this tick
    fn apply_breaches(&mut self, tuning: &Tuning, now: f64) {
        let breached: Vec<EntityId> = self
            .registry
            .enemy_units()
            .filter(|(_, enemy)| enemy.is_destroyed() && enemy.bounds().max.x < 0.0)
            .map(|(id, _)| id)
            .collect();

        for id in breached {
            self.progress.breaches += 1;
            let damage = tuning.enemy.breach_damage;
            if damage > 0 {
                if let Some(player) = self.registry.get_mut(self.player) {
                    player.take_damage(damage, now);
                }
            }
            log::debug!("Enemy {id} breached the line");
        }
    }

    fn bookkeep(&mut self, removed: &[Removed]) {
        self.progress.ticks += 1;
        self.progress.kills = self.tally.kills;
        self.progress.bosses_defeated += removed
            .iter()
            .filter(|gone| gone.category == Category::BossUnit)
            .count() as u32;
    }

    fn player_alive(&self) -> bool {
        self.registry
            .get(self.player)
            .is_some_and(|player| !player.is_destroyed())
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            health: self
                .registry
                .get(self.player)
                .filter(|player| !player.is_destroyed())
                .and_then(|player| player.health())
                .unwrap_or(0)
                .max(0),
            kills: self.progress.kills,
            kill_target: self.script.kill_target(),
            boss_phase: self
                .registry
                .boss_units()
                .find_map(|(_, boss)| boss.phase())
                .map(|phase| phase.number()),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn progress(&self) -> &LevelProgress {
        &self.progress
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Tear the level down and return the surface it drew on
    pub fn into_surface(self) -> Box<dyn RenderSurface> {
        log::debug!(
            "Cleaning up level {} ({} kills, {} breaches)",
            self.number,
            self.progress.kills,
            self.progress.breaches
        );
        self.registry.into_surface()
    }
}
