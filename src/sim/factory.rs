//! Spawn factories
//!
//! Build fully wired entities from tuning. Callers register the result in
//! the category that matches the returned entity.

use glam::Vec2;

use super::adversary::PhaseMachine;
use super::boss::{PatternMovement, Shield};
use super::context::SimRng;
use super::entity::{Body, Entity, EntityId, FighterPlane, Guard, Projectile, ProjectileKind};
use super::strategy::{
    Cadence, CadenceFiring, DriftMovement, EscortMovement, PhasedFiring, PhasedMovement,
    PlayerFiring, PlayerMovement,
};
use crate::settings::Tuning;

/// Projectile leaving `muzzle`, trailing behind it in the travel direction
pub fn projectile(
    tuning: &Tuning,
    kind: ProjectileKind,
    muzzle: Vec2,
    owner: Option<EntityId>,
) -> Entity {
    let spec = match kind {
        ProjectileKind::User => &tuning.projectiles.user,
        ProjectileKind::Enemy => &tuning.projectiles.enemy,
        ProjectileKind::Boss => &tuning.projectiles.boss,
    };
    let mut pos = muzzle - Vec2::new(0.0, spec.size.y * 0.5);
    if spec.speed < 0.0 {
        pos.x -= spec.size.x;
    }
    Entity::projectile(
        Body::new(pos, spec.size, spec.visual.clone()),
        Projectile {
            kind,
            velocity: spec.speed,
            owner,
        },
    )
}

pub fn player(tuning: &Tuning) -> Entity {
    let t = &tuning.player;
    Entity::fighter(
        Body::new(t.start, t.size, t.visual.clone()),
        FighterPlane::new(
            t.health,
            Box::new(PlayerMovement::new(t.speed)),
            Box::new(PlayerFiring::new(t.fire_interval, t.muzzle)),
        ),
    )
}

/// Drifting enemy plane; also used for boss-summoned minions
pub fn enemy(tuning: &Tuning, pos: Vec2) -> Entity {
    let t = &tuning.enemy;
    Entity::fighter(
        Body::new(pos, t.size, t.visual.clone()),
        FighterPlane::new(
            t.health,
            Box::new(DriftMovement::new(t.drift)),
            Box::new(CadenceFiring::new(
                Cadence::Chance {
                    per_tick: t.fire_chance,
                },
                ProjectileKind::Enemy,
                t.muzzle,
            )),
        ),
    )
}

/// Shielded single-phase boss
pub fn boss(tuning: &Tuning, rng: &mut SimRng, now: f64) -> Entity {
    let t = &tuning.boss;
    Entity::fighter(
        Body::new(t.start, t.size, t.visual.clone()),
        FighterPlane::new(
            t.health,
            Box::new(PatternMovement::new(t, rng)),
            Box::new(CadenceFiring::new(
                Cadence::Chance {
                    per_tick: t.fire_chance,
                },
                ProjectileKind::Boss,
                t.muzzle,
            )),
        )
        .with_guard(Guard::Shield(Shield::new(&t.shield, now))),
    )
}

/// Multi-phase boss entering phase one at `now`
pub fn phased_boss(tuning: &Tuning, now: f64) -> Entity {
    let t = &tuning.phased_boss;
    let machine = PhaseMachine::new(t.phases.clone(), now);
    let opening = machine.opening();
    Entity::fighter(
        Body::new(t.start, t.size, opening.visual),
        FighterPlane::new(
            opening.health,
            Box::new(PhasedMovement::new()),
            Box::new(PhasedFiring),
        )
        .with_guard(Guard::Phases(machine)),
    )
}

/// Friendly escort; `slot` staggers escorts above and below the player
pub fn escort(tuning: &Tuning, slot: u32) -> Entity {
    let t = &tuning.escort;
    let side = if slot % 2 == 0 { 1.0 } else { -1.0 };
    let rank = (slot / 2 + 1) as f32;
    let y_offset = side * rank * t.y_offset;
    let start = Vec2::new(t.x, tuning.player.start.y + y_offset);
    Entity::fighter(
        Body::new(start, t.size, t.visual.clone()),
        FighterPlane::new(
            t.health,
            Box::new(EscortMovement {
                x: t.x,
                y_offset,
                speed: t.speed,
            }),
            Box::new(CadenceFiring::new(
                Cadence::Chance {
                    per_tick: t.fire_chance,
                },
                ProjectileKind::User,
                t.muzzle,
            )),
        ),
    )
}
