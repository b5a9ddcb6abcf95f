//! Pluggable movement and firing behavior
//!
//! A fighter plane owns one movement and one firing strategy. Strategies
//! touch the plane only through `Body` accessors; firing creates projectiles
//! by queueing them on the spawner.

pub mod drift;
pub mod escort;
pub mod phased;
pub mod player;

pub use drift::DriftMovement;
pub use escort::EscortMovement;
pub use phased::{PhasedFiring, PhasedMovement};
pub use player::{PlayerFiring, PlayerMovement};

use std::fmt;

use glam::Vec2;
use rand::Rng;

use super::context::{SimRng, TickContext};
use super::entity::{Body, Guard, ProjectileKind};
use super::factory;

/// Per-tick motion policy
pub trait MovementStrategy: fmt::Debug {
    /// Update the position (and only the position) of `body`
    fn step(&mut self, body: &mut Body, guard: &Guard, ctx: &mut TickContext<'_>);
}

/// Per-tick attack policy
pub trait FiringStrategy: fmt::Debug {
    fn fire(&mut self, body: &Body, guard: &mut Guard, ctx: &mut TickContext<'_>);
}

/// How often a plane may fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cadence {
    /// At most once per `seconds`
    Interval { seconds: f64 },
    /// Independent draw every tick
    Chance { per_tick: f64 },
}

/// A cadence plus the bookkeeping needed to enforce it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceGate {
    pub cadence: Cadence,
    last_fired: Option<f64>,
}

impl CadenceGate {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            last_fired: None,
        }
    }

    /// Treat `now` as the last shot, so an interval gate waits a full period
    pub fn stamp(&mut self, now: f64) {
        self.last_fired = Some(now);
    }

    /// Returns true (and records the shot) if firing is allowed this tick
    pub fn try_fire(&mut self, now: f64, rng: &mut SimRng) -> bool {
        let ready = match self.cadence {
            Cadence::Interval { seconds } => self
                .last_fired
                .is_none_or(|last| now - last >= seconds),
            Cadence::Chance { per_tick } => rng.random::<f64>() < per_tick,
        };
        if ready {
            self.last_fired = Some(now);
        }
        ready
    }
}

/// Stays put
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

impl MovementStrategy for Idle {
    fn step(&mut self, _body: &mut Body, _guard: &Guard, _ctx: &mut TickContext<'_>) {}
}

/// Never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl FiringStrategy for Silent {
    fn fire(&mut self, _body: &Body, _guard: &mut Guard, _ctx: &mut TickContext<'_>) {}
}

/// Fires one projectile whenever its cadence allows
#[derive(Debug, Clone)]
pub struct CadenceFiring {
    gate: CadenceGate,
    kind: ProjectileKind,
    /// Muzzle relative to the plane's top-left corner
    muzzle: Vec2,
}

impl CadenceFiring {
    pub fn new(cadence: Cadence, kind: ProjectileKind, muzzle: Vec2) -> Self {
        Self {
            gate: CadenceGate::new(cadence),
            kind,
            muzzle,
        }
    }
}

impl FiringStrategy for CadenceFiring {
    fn fire(&mut self, body: &Body, _guard: &mut Guard, ctx: &mut TickContext<'_>) {
        if body.is_destroyed() || !self.gate.try_fire(ctx.now, ctx.rng) {
            return;
        }
        let shot = factory::projectile(
            ctx.tuning,
            self.kind,
            body.pos() + self.muzzle,
            Some(ctx.self_id),
        );
        ctx.spawner.spawn(self.kind.category(), shot);
    }
}
