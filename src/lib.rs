//! Sky Raid - simulation core of a side-scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Entity model, registry, collisions, behaviors, boss phases,
//!   frame scheduling and the session state machine
//! - `settings`: Data-driven tuning and level definitions
//! - `error`: Startup configuration errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{GameSettings, LevelConfig, LevelGoal, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal host frame length (20 Hz, one logical tick per frame)
    pub const FRAME_SECONDS: f64 = 0.05;

    /// Playfield dimensions
    pub const SCREEN_WIDTH: f32 = 1300.0;
    pub const SCREEN_HEIGHT: f32 = 750.0;

    /// Damage dealt by a single projectile or plane contact
    pub const CONTACT_DAMAGE: i32 = 1;

    /// Incoming damage multiplier while a boss has its weakness exposed
    pub const WEAKNESS_MULTIPLIER: i32 = 3;

    /// Default run seed
    pub const DEFAULT_SEED: u64 = 0x5eed_5a1d;
}

/// Clamp a point so a box of `size` anchored at it stays inside `[min, max]`
#[inline]
pub fn clamp_to_area(pos: Vec2, size: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    let hi = (max - size).max(min);
    pos.clamp(min, hi)
}
