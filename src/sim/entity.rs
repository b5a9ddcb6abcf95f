//! Entity model
//!
//! One concrete `Entity` type covers every simulation object. Behavior is
//! composed from a `Body` (position, bounds, destroyed flag, visual key) and
//! an `EntityKind` that is either a fighter plane with injected strategies or
//! a projectile.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::adversary::{Phase, PhaseMachine};
use super::boss::Shield;
use super::context::TickContext;
use super::strategy::{FiringStrategy, MovementStrategy};

/// Registry-assigned identity (never reused within a registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutually exclusive partitions of live entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Player,
    FriendlyUnit,
    EnemyUnit,
    BossUnit,
    UserProjectile,
    EnemyProjectile,
    BossProjectile,
}

impl Category {
    /// Update order used by the registry
    pub const ALL: [Category; 7] = [
        Category::Player,
        Category::FriendlyUnit,
        Category::EnemyUnit,
        Category::BossUnit,
        Category::UserProjectile,
        Category::EnemyProjectile,
        Category::BossProjectile,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_projectile(self) -> bool {
        matches!(
            self,
            Category::UserProjectile | Category::EnemyProjectile | Category::BossProjectile
        )
    }

    /// Targets that award kill credit when hit by a user projectile
    pub fn is_hostile_plane(self) -> bool {
        matches!(self, Category::EnemyUnit | Category::BossUnit)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Overlap test; boxes that only share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }
}

/// Position, extent and liveness shared by every entity
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pos: Vec2,
    size: Vec2,
    destroyed: bool,
    visual: String,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2, visual: impl Into<String>) -> Self {
        Self {
            pos,
            size,
            destroyed: false,
            visual: visual.into(),
        }
    }

    /// Top-left corner
    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
    }

    pub fn visual(&self) -> &str {
        &self.visual
    }

    pub fn set_visual(&mut self, visual: impl Into<String>) {
        self.visual = visual.into();
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark for removal at the end of the tick (idempotent)
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}

/// Result of applying damage to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already destroyed
    Ignored,
    /// A shield swallowed the hit
    Absorbed,
    /// Health dropped but the target survives
    Damaged,
    /// Target was destroyed by this hit
    Destroyed,
    /// A multi-phase boss ran out of health and entered the given phase
    PhaseAdvanced(Phase),
    /// A multi-phase boss ran out of health in its final phase
    Defeated,
}

impl DamageOutcome {
    /// Whether the hit actually landed on the target
    pub fn landed(self) -> bool {
        !matches!(self, DamageOutcome::Ignored | DamageOutcome::Absorbed)
    }

    /// Whether the target is gone after this hit
    pub fn is_kill(self) -> bool {
        matches!(self, DamageOutcome::Destroyed | DamageOutcome::Defeated)
    }
}

/// Defensive sub-state a fighter plane may carry
#[derive(Debug)]
pub enum Guard {
    None,
    Shield(Shield),
    Phases(PhaseMachine),
}

impl Guard {
    pub fn shield(&self) -> Option<&Shield> {
        match self {
            Guard::Shield(shield) => Some(shield),
            _ => None,
        }
    }

    pub fn phases(&self) -> Option<&PhaseMachine> {
        match self {
            Guard::Phases(machine) => Some(machine),
            _ => None,
        }
    }

    pub fn phases_mut(&mut self) -> Option<&mut PhaseMachine> {
        match self {
            Guard::Phases(machine) => Some(machine),
            _ => None,
        }
    }
}

/// A plane with health and injected behavior
#[derive(Debug)]
pub struct FighterPlane {
    health: i32,
    movement: Box<dyn MovementStrategy>,
    firing: Box<dyn FiringStrategy>,
    guard: Guard,
}

impl FighterPlane {
    pub fn new(
        health: i32,
        movement: Box<dyn MovementStrategy>,
        firing: Box<dyn FiringStrategy>,
    ) -> Self {
        Self {
            health,
            movement,
            firing,
            guard: Guard::None,
        }
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    #[inline]
    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    pub fn guard_mut(&mut self) -> &mut Guard {
        &mut self.guard
    }

    /// Move, run the guard, then fire
    pub fn update(&mut self, body: &mut Body, ctx: &mut TickContext<'_>) {
        if body.is_destroyed() {
            return;
        }
        self.movement.step(body, &self.guard, ctx);
        if let Guard::Shield(shield) = &mut self.guard {
            shield.tick(body, ctx);
        }
        if !body.is_destroyed() {
            self.firing.fire(body, &mut self.guard, ctx);
        }
    }

    /// Apply `amount` damage at time `now`
    pub fn take_damage(&mut self, body: &mut Body, amount: i32, now: f64) -> DamageOutcome {
        if body.is_destroyed() {
            return DamageOutcome::Ignored;
        }

        let amount = match &self.guard {
            Guard::Shield(shield) if shield.is_active() => return DamageOutcome::Absorbed,
            Guard::Phases(machine) => machine.scale_damage(amount),
            _ => amount,
        };

        self.health -= amount;

        if let Guard::Phases(machine) = &mut self.guard {
            machine.observe_health(self.health);
            if self.health <= 0 {
                return match machine.advance(now) {
                    Some(entered) => {
                        self.health = entered.health;
                        body.set_visual(entered.visual);
                        DamageOutcome::PhaseAdvanced(entered.phase)
                    }
                    None => {
                        body.destroy();
                        DamageOutcome::Defeated
                    }
                };
            }
        }

        if self.health <= 0 {
            body.destroy();
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Damaged
        }
    }
}

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    User,
    Enemy,
    Boss,
}

impl ProjectileKind {
    pub fn category(self) -> Category {
        match self {
            ProjectileKind::User => Category::UserProjectile,
            ProjectileKind::Enemy => Category::EnemyProjectile,
            ProjectileKind::Boss => Category::BossProjectile,
        }
    }
}

/// A straight-flying shot
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    /// Horizontal velocity in pixels per tick
    pub velocity: f32,
    /// Firing plane, kept only for kill crediting
    pub owner: Option<EntityId>,
}

impl Projectile {
    /// Fly and self-destroy once fully outside the horizontal bounds
    pub fn advance(&self, body: &mut Body, screen_width: f32) {
        body.translate(Vec2::new(self.velocity, 0.0));
        let bounds = body.bounds();
        if bounds.max.x < 0.0 || bounds.min.x > screen_width {
            body.destroy();
        }
    }
}

#[derive(Debug)]
pub enum EntityKind {
    Fighter(FighterPlane),
    Projectile(Projectile),
}

/// Any positioned, boundable, destructible simulation object
#[derive(Debug)]
pub struct Entity {
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    pub fn fighter(body: Body, plane: FighterPlane) -> Self {
        Self {
            body,
            kind: EntityKind::Fighter(plane),
        }
    }

    pub fn projectile(body: Body, projectile: Projectile) -> Self {
        Self {
            body,
            kind: EntityKind::Projectile(projectile),
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.body.is_destroyed()
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.body.bounds()
    }

    pub fn as_fighter(&self) -> Option<&FighterPlane> {
        match &self.kind {
            EntityKind::Fighter(plane) => Some(plane),
            EntityKind::Projectile(_) => None,
        }
    }

    pub fn as_fighter_mut(&mut self) -> Option<&mut FighterPlane> {
        match &mut self.kind {
            EntityKind::Fighter(plane) => Some(plane),
            EntityKind::Projectile(_) => None,
        }
    }

    pub fn as_projectile(&self) -> Option<&Projectile> {
        match &self.kind {
            EntityKind::Projectile(projectile) => Some(projectile),
            EntityKind::Fighter(_) => None,
        }
    }

    /// Health of a plane, `None` for projectiles
    pub fn health(&self) -> Option<i32> {
        self.as_fighter().map(FighterPlane::health)
    }

    /// Current boss phase, if this is a multi-phase boss
    pub fn phase(&self) -> Option<Phase> {
        self.as_fighter()
            .and_then(|plane| plane.guard().phases())
            .and_then(PhaseMachine::phase)
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        match &mut self.kind {
            EntityKind::Fighter(plane) => plane.update(&mut self.body, ctx),
            EntityKind::Projectile(projectile) => {
                projectile.advance(&mut self.body, ctx.world.screen.x)
            }
        }
    }

    /// Projectiles are destroyed by any hit; planes lose health
    pub fn take_damage(&mut self, amount: i32, now: f64) -> DamageOutcome {
        match &mut self.kind {
            EntityKind::Fighter(plane) => plane.take_damage(&mut self.body, amount, now),
            EntityKind::Projectile(_) => {
                if self.body.is_destroyed() {
                    DamageOutcome::Ignored
                } else {
                    self.body.destroy();
                    DamageOutcome::Destroyed
                }
            }
        }
    }
}
