//! Constant horizontal drift (enemy planes and summoned minions)

use glam::Vec2;

use super::MovementStrategy;
use crate::sim::context::TickContext;
use crate::sim::entity::{Body, Guard};

/// Drifts at a fixed velocity and self-destroys once fully past the
/// trailing edge of the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftMovement {
    /// Pixels per tick; negative drifts left
    pub velocity: f32,
}

impl DriftMovement {
    pub fn new(velocity: f32) -> Self {
        Self { velocity }
    }

    /// Whether a body is entirely beyond the edge it is drifting toward
    pub fn is_past_trailing_edge(&self, body: &Body, screen_width: f32) -> bool {
        let bounds = body.bounds();
        if self.velocity < 0.0 {
            bounds.max.x < 0.0
        } else if self.velocity > 0.0 {
            bounds.min.x > screen_width
        } else {
            false
        }
    }
}

impl MovementStrategy for DriftMovement {
    fn step(&mut self, body: &mut Body, _guard: &Guard, ctx: &mut TickContext<'_>) {
        body.translate(Vec2::new(self.velocity, 0.0));
        if self.is_past_trailing_edge(body, ctx.world.screen.x) {
            body.destroy();
        }
    }
}
