//! Movement and attacks of the multi-phase boss
//!
//! Both strategies read the current phase from the plane's `PhaseMachine`
//! guard. Phase-local cooldowns live in the machine so a phase change resets
//! them in one place.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::{FiringStrategy, MovementStrategy};
use crate::clamp_to_area;
use crate::sim::adversary::Phase;
use crate::sim::context::TickContext;
use crate::sim::entity::{Body, Category, Guard, ProjectileKind};
use crate::sim::factory;

/// Phase 1 drifts, phase 2 oscillates, phase 3 pursues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasedMovement {
    /// Phase 1 horizontal direction (-1 or +1)
    heading_x: f32,
    /// Phase 2 vertical direction (-1 or +1)
    heading_y: f32,
    /// Phase 2 oscillation center, captured on phase entry
    anchor_x: f32,
    seen_phase: Option<Phase>,
}

impl Default for PhasedMovement {
    fn default() -> Self {
        Self {
            heading_x: -1.0,
            heading_y: 1.0,
            anchor_x: 0.0,
            seen_phase: None,
        }
    }
}

impl PhasedMovement {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementStrategy for PhasedMovement {
    fn step(&mut self, body: &mut Body, guard: &Guard, ctx: &mut TickContext<'_>) {
        let Some(machine) = guard.phases() else {
            return;
        };
        let Some(phase) = machine.phase() else {
            return;
        };
        if self.seen_phase != Some(phase) {
            self.anchor_x = body.pos().x;
            self.seen_phase = Some(phase);
        }

        let t = &ctx.tuning.phased_boss;
        let size = body.size();
        let pos = body.pos();
        let max = t.band_max - size;

        let next = match phase {
            Phase::One => {
                let mut x = pos.x + self.heading_x * t.drift_speed;
                if x <= t.band_min.x {
                    x = t.band_min.x;
                    self.heading_x = 1.0;
                } else if x >= max.x {
                    x = max.x;
                    self.heading_x = -1.0;
                }
                Vec2::new(x, pos.y)
            }
            Phase::Two => {
                // Absolute phase-local time: a pause gap jumps, never accumulates
                let elapsed = (ctx.now - machine.entered_at()).max(0.0) as f32;
                let x = self.anchor_x + t.amplitude * (TAU * t.frequency * elapsed).sin();
                let mut y = pos.y + self.heading_y * t.vertical_drift;
                if y <= t.band_min.y {
                    y = t.band_min.y;
                    self.heading_y = 1.0;
                } else if y >= max.y {
                    y = max.y;
                    self.heading_y = -1.0;
                }
                Vec2::new(x, y)
            }
            Phase::Three => match ctx.world.nearest_player(body.center()) {
                Some(target) => {
                    let dx = (target.x - body.center().x).clamp(-t.pursuit_speed, t.pursuit_speed);
                    Vec2::new(pos.x + dx, pos.y)
                }
                None => pos,
            },
        };

        body.set_pos(clamp_to_area(next, size, t.band_min, t.band_max));
    }
}

/// Per-phase shots, cooldown-gated area volleys and minion summons
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhasedFiring;

impl FiringStrategy for PhasedFiring {
    fn fire(&mut self, body: &Body, guard: &mut Guard, ctx: &mut TickContext<'_>) {
        let Some(machine) = guard.phases_mut() else {
            return;
        };
        let Some(fire_chance) = machine.profile().map(|p| p.fire_chance) else {
            return;
        };
        let t = &ctx.tuning.phased_boss;
        let muzzle = body.pos() + t.muzzle;
        let owner = Some(ctx.self_id);
        let category = ProjectileKind::Boss.category();

        if ctx.rng.random::<f64>() < fire_chance {
            let shot = factory::projectile(ctx.tuning, ProjectileKind::Boss, muzzle, owner);
            ctx.spawner.spawn(category, shot);
        }

        if machine.try_area_attack(ctx.now) {
            let volley = t.area_volley.max(1);
            let middle = (volley - 1) as f32 * 0.5;
            for i in 0..volley {
                let offset = Vec2::new(0.0, (i as f32 - middle) * t.area_spread);
                let shot =
                    factory::projectile(ctx.tuning, ProjectileKind::Boss, muzzle + offset, owner);
                ctx.spawner.spawn(category, shot);
            }
            log::debug!("Boss area attack ({volley} projectiles)");
        }

        if machine.try_summon(ctx.now) {
            let minion = factory::enemy(ctx.tuning, body.pos() + t.minion_offset);
            ctx.spawner.spawn(Category::EnemyUnit, minion);
            log::debug!("Boss summoned a minion");
        }
    }
}
