//! Escort planes that fly formation with the player

use glam::Vec2;

use super::MovementStrategy;
use crate::clamp_to_area;
use crate::sim::context::TickContext;
use crate::sim::entity::{Body, Guard};

/// Holds a fixed x and chases the nearest player's y plus an offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscortMovement {
    pub x: f32,
    pub y_offset: f32,
    pub speed: f32,
}

impl MovementStrategy for EscortMovement {
    fn step(&mut self, body: &mut Body, _guard: &Guard, ctx: &mut TickContext<'_>) {
        let Some(player) = ctx.world.nearest_player(body.center()) else {
            return;
        };
        let target_y = player.y + self.y_offset - body.size().y * 0.5;
        let dy = (target_y - body.pos().y).clamp(-self.speed, self.speed);
        let next = Vec2::new(self.x, body.pos().y + dy);
        body.set_pos(clamp_to_area(next, body.size(), Vec2::ZERO, ctx.world.screen));
    }
}
