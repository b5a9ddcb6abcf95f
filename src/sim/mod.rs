//! Simulation module
//!
//! All gameplay logic lives here. Rules the rest of the crate relies on:
//! - One logical tick per host frame, time read from the host clock
//! - Seeded RNG only
//! - Stable iteration order (category order, then registration order)
//! - No rendering or platform dependencies beyond the `RenderSurface` trait

pub mod adversary;
pub mod boss;
pub mod collision;
pub mod context;
pub mod entity;
pub mod factory;
pub mod input;
pub mod level;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod strategy;
pub mod surface;

pub use adversary::{AdversaryState, Phase, PhaseMachine};
pub use boss::{PatternMovement, Shield};
pub use collision::{CollisionEngine, CollisionReport, HitListener, NoopListener, STANDARD_PAIRS};
pub use context::{FrameContext, SimRng, Spawner, TickContext, WorldView};
pub use entity::{
    Aabb, Body, Category, DamageOutcome, Entity, EntityId, EntityKind, FighterPlane, Guard,
    Projectile, ProjectileKind,
};
pub use input::{InputEvent, InputState, Key};
pub use level::{HudSnapshot, LevelProgress, LevelRun, LevelScript, LevelStatus, StandardLevel};
pub use registry::{EntityRegistry, Removed};
pub use scheduler::{FrameScheduler, Updater};
pub use session::{Screen, Session, SessionEvent};
pub use strategy::{Cadence, CadenceFiring, FiringStrategy, MovementStrategy};
pub use surface::{HeadlessSurface, RenderSurface};
