//! Single-phase boss: pattern-driven vertical motion and a timed shield

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::context::{SimRng, TickContext};
use super::entity::{Body, Guard};
use super::strategy::MovementStrategy;
use crate::settings::{BossTuning, ShieldTuning};

/// Vertical moves drawn from a shuffled multiset of {+v, 0, -v}
///
/// Each drawn move repeats for `run_length` ticks, after which the multiset
/// is reshuffled and the pointer advances (wrapping at the end). A move that
/// would leave the vertical band is reverted.
#[derive(Debug, Clone)]
pub struct PatternMovement {
    pattern: Vec<f32>,
    index: usize,
    run: u32,
    run_length: u32,
    band_min_y: f32,
    band_max_y: f32,
}

impl PatternMovement {
    pub fn new(tuning: &BossTuning, rng: &mut SimRng) -> Self {
        let v = tuning.vertical_speed;
        let mut pattern = Vec::with_capacity(tuning.pattern_repeats * 3);
        for _ in 0..tuning.pattern_repeats {
            pattern.extend_from_slice(&[v, -v, 0.0]);
        }
        pattern.shuffle(rng);
        Self::from_pattern(pattern, tuning.run_length, tuning.band_min_y, tuning.band_max_y)
    }

    /// Use an explicit move list (kept in the given order until the first reshuffle)
    pub fn from_pattern(
        pattern: Vec<f32>,
        run_length: u32,
        band_min_y: f32,
        band_max_y: f32,
    ) -> Self {
        Self {
            pattern,
            index: 0,
            run: 0,
            run_length: run_length.max(1),
            band_min_y,
            band_max_y,
        }
    }

    fn next_move(&mut self, rng: &mut SimRng) -> f32 {
        let Some(&current) = self.pattern.get(self.index) else {
            return 0.0;
        };
        self.run += 1;
        if self.run >= self.run_length {
            self.pattern.shuffle(rng);
            self.run = 0;
            self.index += 1;
        }
        if self.index >= self.pattern.len() {
            self.index = 0;
        }
        current
    }
}

impl MovementStrategy for PatternMovement {
    fn step(&mut self, body: &mut Body, _guard: &Guard, ctx: &mut TickContext<'_>) {
        let previous = body.pos();
        let dy = self.next_move(ctx.rng);
        body.translate(Vec2::new(0.0, dy));
        let y = body.pos().y;
        if y < self.band_min_y || y > self.band_max_y {
            body.set_pos(previous);
        }
    }
}

/// Temporary damage immunity with a cosmetic indicator
#[derive(Debug, Clone)]
pub struct Shield {
    active: bool,
    activated_at: f64,
    deactivated_at: f64,
    chance: f64,
    min_cooldown: f64,
    max_duration: f64,
    indicator_offset: Vec2,
}

impl Shield {
    /// A lowered shield whose cooldown starts at `now`
    pub fn new(tuning: &ShieldTuning, now: f64) -> Self {
        Self {
            active: false,
            activated_at: now,
            deactivated_at: now,
            chance: tuning.chance,
            min_cooldown: tuning.min_cooldown,
            max_duration: tuning.max_duration,
            indicator_offset: tuning.indicator_offset,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self, now: f64) {
        if !self.active {
            log::debug!("Shield up at {now:.2}s");
        }
        self.active = true;
        self.activated_at = now;
    }

    pub fn deactivate(&mut self, now: f64) {
        if self.active {
            log::debug!("Shield down at {now:.2}s");
        }
        self.active = false;
        self.deactivated_at = now;
    }

    fn cooldown_elapsed(&self, now: f64) -> bool {
        now - self.deactivated_at >= self.min_cooldown
    }

    /// Expire, maybe raise, and reposition the indicator
    pub fn tick(&mut self, body: &Body, ctx: &mut TickContext<'_>) {
        let now = ctx.now;
        if self.active {
            if now - self.activated_at >= self.max_duration {
                self.deactivate(now);
                ctx.spawner.place_overlay(ctx.self_id, None);
                return;
            }
        } else if self.cooldown_elapsed(now) && ctx.rng.random::<f64>() < self.chance {
            self.activate(now);
        }

        if self.active {
            ctx.spawner
                .place_overlay(ctx.self_id, Some(body.pos() + self.indicator_offset));
        }
    }
}
