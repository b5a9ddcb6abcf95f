//! Game settings and tuning
//!
//! Everything the simulation reads as a number lives here so balance can be
//! adjusted from a JSON file without touching gameplay code. Settings are
//! read once at startup; nothing is written back.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Win condition of a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelGoal {
    /// Shoot down this many enemy planes
    Kills { target: u32 },
    /// Destroy the shielded boss
    DefeatBoss,
    /// Defeat the multi-phase boss in its final phase
    DefeatPhasedBoss,
}

/// One entry of the level sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Visual key handed to the surface on level entry
    pub background: String,
    pub goal: LevelGoal,
    /// Maximum simultaneous enemy planes spawned by the level itself
    pub enemy_cap: usize,
    /// Per-tick chance of spawning an enemy while under the cap
    pub enemy_spawn_chance: f64,
    /// Escort planes flying alongside the player
    #[serde(default)]
    pub escorts: u32,
}

/// Projectile shape and speed for one projectile kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub size: Vec2,
    /// Horizontal velocity in pixels per tick (negative travels left)
    pub speed: f32,
    pub visual: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub user: ProjectileSpec,
    pub enemy: ProjectileSpec,
    pub boss: ProjectileSpec,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            user: ProjectileSpec {
                size: Vec2::new(30.0, 10.0),
                speed: 15.0,
                visual: "fireball".to_string(),
            },
            enemy: ProjectileSpec {
                size: Vec2::new(30.0, 10.0),
                speed: -10.0,
                visual: "enemy_fire".to_string(),
            },
            boss: ProjectileSpec {
                size: Vec2::new(40.0, 15.0),
                speed: -15.0,
                visual: "boss_fire".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: Vec2,
    pub start: Vec2,
    pub health: i32,
    /// Pixels per tick along each held axis
    pub speed: f32,
    /// Minimum seconds between shots while fire is held
    pub fire_interval: f64,
    /// Muzzle position relative to the plane's top-left corner
    pub muzzle: Vec2,
    pub visual: String,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(100.0, 50.0),
            start: Vec2::new(5.0, 300.0),
            health: 5,
            speed: 8.0,
            fire_interval: 0.25,
            muzzle: Vec2::new(100.0, 20.0),
            visual: "user_plane".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub size: Vec2,
    pub health: i32,
    /// Horizontal drift in pixels per tick
    pub drift: f32,
    pub fire_chance: f64,
    pub muzzle: Vec2,
    /// Damage dealt to the player when an enemy slips past the trailing edge
    pub breach_damage: i32,
    pub visual: String,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(90.0, 45.0),
            health: 1,
            drift: -6.0,
            fire_chance: 0.01,
            muzzle: Vec2::new(-10.0, 20.0),
            breach_damage: 1,
            visual: "enemy_plane".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldTuning {
    /// Per-tick activation chance once the cooldown has elapsed
    pub chance: f64,
    /// Seconds after deactivation before the shield may return
    pub min_cooldown: f64,
    /// Longest time the shield stays up
    pub max_duration: f64,
    /// Indicator position relative to the boss's top-left corner
    pub indicator_offset: Vec2,
}

impl Default for ShieldTuning {
    fn default() -> Self {
        Self {
            chance: 0.002,
            min_cooldown: 3.0,
            max_duration: 8.0,
            indicator_offset: Vec2::new(-40.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub size: Vec2,
    pub start: Vec2,
    pub health: i32,
    pub vertical_speed: f32,
    /// Copies of each of {+v, 0, -v} in the move pattern
    pub pattern_repeats: usize,
    /// Ticks a drawn move repeats before the pattern is reshuffled
    pub run_length: u32,
    pub band_min_y: f32,
    pub band_max_y: f32,
    pub fire_chance: f64,
    pub muzzle: Vec2,
    pub shield: ShieldTuning,
    pub visual: String,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(250.0, 110.0),
            start: Vec2::new(1000.0, 300.0),
            health: 100,
            vertical_speed: 8.0,
            pattern_repeats: 5,
            run_length: 10,
            band_min_y: 20.0,
            band_max_y: 600.0,
            fire_chance: 0.04,
            muzzle: Vec2::new(-10.0, 55.0),
            shield: ShieldTuning::default(),
            visual: "boss_plane".to_string(),
        }
    }
}

/// Per-phase numbers of the multi-phase boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTuning {
    /// Health restored on entering the phase
    pub health: i32,
    /// Weakness is exposed once health drops to or below this value
    pub weakness_threshold: i32,
    pub fire_chance: f64,
    /// Seconds between area attacks
    pub area_cooldown: f64,
    /// Seconds between minion summons; `None` disables summoning
    pub summon_cooldown: Option<f64>,
    pub visual: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasedBossTuning {
    pub size: Vec2,
    pub start: Vec2,
    /// Top-left corner of the area the boss must stay inside
    pub band_min: Vec2,
    /// Bottom-right corner of the area the boss must stay inside
    pub band_max: Vec2,
    /// Phase 1 horizontal speed (pixels per tick)
    pub drift_speed: f32,
    /// Phase 2 oscillation amplitude (pixels)
    pub amplitude: f32,
    /// Phase 2 oscillation frequency (Hz)
    pub frequency: f32,
    /// Phase 2 vertical speed (pixels per tick)
    pub vertical_drift: f32,
    /// Phase 3 maximum horizontal speed (pixels per tick)
    pub pursuit_speed: f32,
    pub muzzle: Vec2,
    /// Projectiles in one area attack
    pub area_volley: u32,
    /// Vertical spacing between area attack projectiles
    pub area_spread: f32,
    /// Minion spawn point relative to the boss's top-left corner
    pub minion_offset: Vec2,
    pub phases: [PhaseTuning; 3],
}

impl Default for PhasedBossTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(260.0, 120.0),
            start: Vec2::new(1000.0, 300.0),
            band_min: Vec2::new(600.0, 20.0),
            band_max: Vec2::new(SCREEN_WIDTH - 10.0, SCREEN_HEIGHT - 20.0),
            drift_speed: 2.0,
            amplitude: 150.0,
            frequency: 0.5,
            vertical_drift: 2.0,
            pursuit_speed: 4.0,
            muzzle: Vec2::new(-10.0, 60.0),
            area_volley: 5,
            area_spread: 40.0,
            minion_offset: Vec2::new(-100.0, 0.0),
            phases: [
                PhaseTuning {
                    health: 30,
                    weakness_threshold: 10,
                    fire_chance: 0.03,
                    area_cooldown: 6.0,
                    summon_cooldown: None,
                    visual: "citadel_phase1".to_string(),
                },
                PhaseTuning {
                    health: 40,
                    weakness_threshold: 12,
                    fire_chance: 0.045,
                    area_cooldown: 5.0,
                    summon_cooldown: Some(8.0),
                    visual: "citadel_phase2".to_string(),
                },
                PhaseTuning {
                    health: 50,
                    weakness_threshold: 15,
                    fire_chance: 0.06,
                    area_cooldown: 4.0,
                    summon_cooldown: Some(6.0),
                    visual: "citadel_phase3".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscortTuning {
    pub size: Vec2,
    /// Fixed horizontal position of the escort line
    pub x: f32,
    /// Vertical offset from the player the escort keeps
    pub y_offset: f32,
    pub health: i32,
    pub speed: f32,
    pub fire_chance: f64,
    pub muzzle: Vec2,
    pub visual: String,
}

impl Default for EscortTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(80.0, 40.0),
            x: 150.0,
            y_offset: 90.0,
            health: 3,
            speed: 6.0,
            fire_chance: 0.03,
            muzzle: Vec2::new(80.0, 15.0),
            visual: "escort_plane".to_string(),
        }
    }
}

/// All gameplay numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub screen_width: f32,
    pub screen_height: f32,
    /// Nominal frame length the headless host advances by
    pub frame_seconds: f64,
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub boss: BossTuning,
    pub phased_boss: PhasedBossTuning,
    pub escort: EscortTuning,
    pub projectiles: ProjectileTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            frame_seconds: FRAME_SECONDS,
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            boss: BossTuning::default(),
            phased_boss: PhasedBossTuning::default(),
            escort: EscortTuning::default(),
            projectiles: ProjectileTuning::default(),
        }
    }
}

impl Tuning {
    /// Playfield size
    #[inline]
    pub fn screen(&self) -> Vec2 {
        Vec2::new(self.screen_width, self.screen_height)
    }

    /// Check every number the simulation divides by, draws against or clamps to
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err(ConfigError::invalid("tuning.screen", "must be positive"));
        }
        if self.frame_seconds <= 0.0 {
            return Err(ConfigError::invalid("tuning.frame_seconds", "must be positive"));
        }

        positive_size("tuning.player.size", self.player.size)?;
        positive_size("tuning.enemy.size", self.enemy.size)?;
        positive_size("tuning.boss.size", self.boss.size)?;
        positive_size("tuning.phased_boss.size", self.phased_boss.size)?;
        positive_size("tuning.escort.size", self.escort.size)?;
        positive_size("tuning.projectiles.user.size", self.projectiles.user.size)?;
        positive_size("tuning.projectiles.enemy.size", self.projectiles.enemy.size)?;
        positive_size("tuning.projectiles.boss.size", self.projectiles.boss.size)?;

        positive_health("tuning.player.health", self.player.health)?;
        positive_health("tuning.enemy.health", self.enemy.health)?;
        positive_health("tuning.boss.health", self.boss.health)?;
        positive_health("tuning.escort.health", self.escort.health)?;

        probability("tuning.enemy.fire_chance", self.enemy.fire_chance)?;
        probability("tuning.boss.fire_chance", self.boss.fire_chance)?;
        probability("tuning.boss.shield.chance", self.boss.shield.chance)?;
        probability("tuning.escort.fire_chance", self.escort.fire_chance)?;

        if self.boss.pattern_repeats == 0 {
            return Err(ConfigError::invalid("tuning.boss.pattern_repeats", "must be at least 1"));
        }
        if self.boss.run_length == 0 {
            return Err(ConfigError::invalid("tuning.boss.run_length", "must be at least 1"));
        }
        if self.boss.band_min_y >= self.boss.band_max_y {
            return Err(ConfigError::invalid("tuning.boss.band", "min must be below max"));
        }
        if self.boss.shield.max_duration <= 0.0 {
            return Err(ConfigError::invalid("tuning.boss.shield.max_duration", "must be positive"));
        }

        let phased = &self.phased_boss;
        if phased.band_min.x >= phased.band_max.x || phased.band_min.y >= phased.band_max.y {
            return Err(ConfigError::invalid("tuning.phased_boss.band", "min must be below max"));
        }
        for (i, phase) in phased.phases.iter().enumerate() {
            let field = format!("tuning.phased_boss.phases[{i}]");
            if phase.health <= 0 {
                return Err(ConfigError::invalid(field, "health must be positive"));
            }
            if !(0.0..=1.0).contains(&phase.fire_chance) {
                return Err(ConfigError::invalid(field, "fire_chance must be within [0, 1]"));
            }
            if phase.area_cooldown <= 0.0 || phase.summon_cooldown.is_some_and(|c| c <= 0.0) {
                return Err(ConfigError::invalid(field, "cooldowns must be positive"));
            }
        }

        Ok(())
    }
}

fn positive_size(field: &str, size: Vec2) -> Result<(), ConfigError> {
    if size.x > 0.0 && size.y > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "width and height must be positive"))
    }
}

fn positive_health(field: &str, health: i32) -> Result<(), ConfigError> {
    if health > 0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be positive"))
    }
}

fn probability(field: &str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be within [0, 1]"))
    }
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Seed for the session RNG
    pub seed: u64,
    pub tuning: Tuning,
    /// Level sequence; finishing the last one wins the game
    pub levels: Vec<LevelConfig>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            tuning: Tuning::default(),
            levels: vec![
                LevelConfig {
                    name: "Coastal Skies".to_string(),
                    background: "background1".to_string(),
                    goal: LevelGoal::Kills { target: 10 },
                    enemy_cap: 5,
                    enemy_spawn_chance: 0.2,
                    escorts: 0,
                },
                LevelConfig {
                    name: "Storm Front".to_string(),
                    background: "background2".to_string(),
                    goal: LevelGoal::DefeatBoss,
                    enemy_cap: 2,
                    enemy_spawn_chance: 0.05,
                    escorts: 1,
                },
                LevelConfig {
                    name: "Iron Citadel".to_string(),
                    background: "background3".to_string(),
                    goal: LevelGoal::DefeatPhasedBoss,
                    enemy_cap: 0,
                    enemy_spawn_chance: 0.0,
                    escorts: 1,
                },
            ],
        }
    }
}

impl GameSettings {
    /// Parse and validate settings from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!(
            "Loaded settings from {} ({} levels)",
            path.display(),
            settings.levels.len()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        for (i, level) in self.levels.iter().enumerate() {
            probability(
                &format!("levels[{i}].enemy_spawn_chance"),
                level.enemy_spawn_chance,
            )?;
            if let LevelGoal::Kills { target: 0 } = level.goal {
                return Err(ConfigError::invalid(
                    format!("levels[{i}].goal"),
                    "kill target must be at least 1",
                ));
            }
        }
        self.tuning.validate()
    }
}
