//! Player-controlled movement and debounced firing

use glam::Vec2;

use super::{Cadence, CadenceGate, FiringStrategy, MovementStrategy};
use crate::clamp_to_area;
use crate::sim::context::TickContext;
use crate::sim::entity::{Body, Guard, ProjectileKind};
use crate::sim::factory;

/// Velocity follows the held direction keys; the plane never leaves the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerMovement {
    pub speed: f32,
}

impl PlayerMovement {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

impl MovementStrategy for PlayerMovement {
    fn step(&mut self, body: &mut Body, _guard: &Guard, ctx: &mut TickContext<'_>) {
        let velocity = ctx.input.direction() * self.speed;
        if velocity == Vec2::ZERO {
            return;
        }
        let next = clamp_to_area(body.pos() + velocity, body.size(), Vec2::ZERO, ctx.world.screen);
        body.set_pos(next);
    }
}

/// Fires while the fire key is held, at most once per interval
#[derive(Debug, Clone)]
pub struct PlayerFiring {
    gate: CadenceGate,
    muzzle: Vec2,
}

impl PlayerFiring {
    pub fn new(interval: f64, muzzle: Vec2) -> Self {
        Self {
            gate: CadenceGate::new(Cadence::Interval { seconds: interval }),
            muzzle,
        }
    }
}

impl FiringStrategy for PlayerFiring {
    fn fire(&mut self, body: &Body, _guard: &mut Guard, ctx: &mut TickContext<'_>) {
        if !ctx.input.fire || !self.gate.try_fire(ctx.now, ctx.rng) {
            return;
        }
        let shot = factory::projectile(
            ctx.tuning,
            ProjectileKind::User,
            body.pos() + self.muzzle,
            Some(ctx.self_id),
        );
        ctx.spawner.spawn(ProjectileKind::User.category(), shot);
    }
}
