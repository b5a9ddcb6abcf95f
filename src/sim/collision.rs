//! Collision detection and response
//!
//! Broad phase is a plain double loop over the two categories of each
//! configured pair. Every intersecting pair damages both members, and a
//! projectile that overlaps several targets damages all of them.

use super::entity::{Aabb, Category, DamageOutcome, EntityId, ProjectileKind};
use super::registry::EntityRegistry;
use crate::consts::CONTACT_DAMAGE;

/// Category pairs checked every tick
pub const STANDARD_PAIRS: [(Category, Category); 9] = [
    (Category::UserProjectile, Category::EnemyUnit),
    (Category::UserProjectile, Category::BossUnit),
    (Category::EnemyProjectile, Category::Player),
    (Category::BossProjectile, Category::Player),
    (Category::EnemyProjectile, Category::FriendlyUnit),
    (Category::BossProjectile, Category::FriendlyUnit),
    (Category::EnemyUnit, Category::Player),
    (Category::EnemyUnit, Category::FriendlyUnit),
    (Category::BossUnit, Category::Player),
];

/// Notified when a user projectile lands damage on a hostile plane
pub trait HitListener {
    fn on_hit(&mut self, owner: EntityId, target: EntityId, outcome: DamageOutcome);
}

impl<F: FnMut(EntityId, EntityId, DamageOutcome)> HitListener for F {
    fn on_hit(&mut self, owner: EntityId, target: EntityId, outcome: DamageOutcome) {
        self(owner, target, outcome)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl HitListener for NoopListener {
    fn on_hit(&mut self, _owner: EntityId, _target: EntityId, _outcome: DamageOutcome) {}
}

/// Counters from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Bounding box tests performed
    pub checks: usize,
    /// Intersecting pairs
    pub hits: usize,
    /// Entities destroyed or defeated by these hits
    pub kills: usize,
    /// Listener notifications
    pub credited: usize,
}

impl CollisionReport {
    pub fn merge(&mut self, other: CollisionReport) {
        self.checks += other.checks;
        self.hits += other.hits;
        self.kills += other.kills;
        self.credited += other.credited;
    }
}

#[derive(Debug, Clone)]
pub struct CollisionEngine {
    pairs: Vec<(Category, Category)>,
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::with_pairs(STANDARD_PAIRS.to_vec())
    }
}

impl CollisionEngine {
    pub fn with_pairs(pairs: Vec<(Category, Category)>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(Category, Category)] {
        &self.pairs
    }

    /// Resolve every configured pair in table order
    pub fn resolve(
        &self,
        registry: &mut EntityRegistry,
        now: f64,
        listener: &mut dyn HitListener,
    ) -> CollisionReport {
        let mut report = CollisionReport::default();
        for &(a, b) in &self.pairs {
            report.merge(Self::resolve_pair(registry, a, b, now, listener));
        }
        report
    }

    /// Test every member of `a` against every member of `b`
    ///
    /// Bounds are captured before any damage is applied, so the result does
    /// not depend on which pair happens to be processed first.
    pub fn resolve_pair(
        registry: &mut EntityRegistry,
        a: Category,
        b: Category,
        now: f64,
        listener: &mut dyn HitListener,
    ) -> CollisionReport {
        let left = bounds_of(registry, a);
        let right = bounds_of(registry, b);
        let mut report = CollisionReport::default();

        for &(a_id, a_box) in &left {
            for &(b_id, b_box) in &right {
                report.checks += 1;
                if !a_box.intersects(&b_box) {
                    continue;
                }
                report.hits += 1;

                let a_outcome = damage(registry, a_id, now);
                let b_outcome = damage(registry, b_id, now);
                report.kills += usize::from(a_outcome.is_kill()) + usize::from(b_outcome.is_kill());

                if b.is_hostile_plane() && b_outcome.landed() {
                    if let Some(owner) = user_owner(registry, a_id) {
                        listener.on_hit(owner, b_id, b_outcome);
                        report.credited += 1;
                    }
                }
                if a.is_hostile_plane() && a_outcome.landed() {
                    if let Some(owner) = user_owner(registry, b_id) {
                        listener.on_hit(owner, a_id, a_outcome);
                        report.credited += 1;
                    }
                }
            }
        }
        report
    }
}

fn bounds_of(registry: &EntityRegistry, category: Category) -> Vec<(EntityId, Aabb)> {
    registry
        .iter(category)
        .map(|(id, entity)| (id, entity.bounds()))
        .collect()
}

fn damage(registry: &mut EntityRegistry, id: EntityId, now: f64) -> DamageOutcome {
    registry
        .get_mut(id)
        .map_or(DamageOutcome::Ignored, |entity| entity.take_damage(CONTACT_DAMAGE, now))
}

/// Owner of a user projectile, if `id` is one
fn user_owner(registry: &EntityRegistry, id: EntityId) -> Option<EntityId> {
    registry
        .get(id)?
        .as_projectile()
        .filter(|p| p.kind == ProjectileKind::User)?
        .owner
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::sim::entity::{Body, Entity, FighterPlane, Projectile};
    use crate::sim::strategy::{Idle, Silent};
    use crate::sim::surface::HeadlessSurface;

    fn registry() -> EntityRegistry {
        EntityRegistry::new(Box::new(HeadlessSurface::new())).unwrap()
    }

    fn plane(pos: Vec2, size: Vec2, health: i32) -> Entity {
        Entity::fighter(
            Body::new(pos, size, "plane"),
            FighterPlane::new(health, Box::new(Idle), Box::new(Silent)),
        )
    }

    fn user_shot(pos: Vec2, owner: Option<EntityId>) -> Entity {
        Entity::projectile(
            Body::new(pos, Vec2::new(20.0, 6.0), "shot"),
            Projectile {
                kind: ProjectileKind::User,
                velocity: 10.0,
                owner,
            },
        )
    }

    #[test]
    fn test_user_projectile_hits_enemy_and_credits_owner() {
        let mut registry = registry();
        let player = registry.register(
            Category::Player,
            plane(Vec2::new(0.0, 0.0), Vec2::new(40.0, 20.0), 5),
        );
        let enemy = registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(500.0, 100.0), Vec2::new(90.0, 45.0), 3),
        );
        let shot = registry.register(
            Category::UserProjectile,
            user_shot(Vec2::new(510.0, 110.0), Some(player)),
        );

        let mut calls = Vec::new();
        let mut listener = |owner: EntityId, target: EntityId, outcome: DamageOutcome| {
            calls.push((owner, target, outcome))
        };
        let report = CollisionEngine::resolve_pair(
            &mut registry,
            Category::UserProjectile,
            Category::EnemyUnit,
            1.0,
            &mut listener,
        );

        assert!(registry.get(shot).unwrap().is_destroyed());
        assert_eq!(registry.get(enemy).unwrap().health(), Some(2));
        assert_eq!(calls, vec![(player, enemy, DamageOutcome::Damaged)]);
        assert_eq!(report.hits, 1);
        assert_eq!(report.credited, 1);
        assert_eq!(report.kills, 1, "the projectile itself");
    }

    #[test]
    fn test_projectile_damages_every_overlapping_target() {
        let mut registry = registry();
        let first = registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(100.0, 100.0), Vec2::new(50.0, 50.0), 1),
        );
        let second = registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(110.0, 100.0), Vec2::new(50.0, 50.0), 1),
        );
        registry.register(
            Category::UserProjectile,
            user_shot(Vec2::new(120.0, 120.0), Some(EntityId(77))),
        );

        let mut credited = Vec::new();
        let mut listener = |_: EntityId, target: EntityId, outcome: DamageOutcome| {
            credited.push((target, outcome.is_kill()))
        };
        CollisionEngine::default().resolve(&mut registry, 0.0, &mut listener);

        assert!(registry.get(first).unwrap().is_destroyed());
        assert!(registry.get(second).unwrap().is_destroyed());
        assert_eq!(credited, vec![(first, true), (second, true)]);
    }

    #[test]
    fn test_unowned_and_hostile_projectiles_are_not_credited() {
        let mut registry = registry();
        let player = registry.register(
            Category::Player,
            plane(Vec2::new(0.0, 0.0), Vec2::new(40.0, 20.0), 5),
        );
        registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(300.0, 0.0), Vec2::new(40.0, 40.0), 5),
        );
        registry.register(Category::UserProjectile, user_shot(Vec2::new(305.0, 5.0), None));
        registry.register(
            Category::EnemyProjectile,
            Entity::projectile(
                Body::new(Vec2::new(10.0, 5.0), Vec2::new(10.0, 4.0), "shot"),
                Projectile {
                    kind: ProjectileKind::Enemy,
                    velocity: -8.0,
                    owner: Some(EntityId(2)),
                },
            ),
        );

        let mut calls = 0;
        let mut listener = |_: EntityId, _: EntityId, _: DamageOutcome| calls += 1;
        let report = CollisionEngine::default().resolve(&mut registry, 0.0, &mut listener);

        assert_eq!(calls, 0);
        assert_eq!(report.hits, 2);
        assert_eq!(registry.get(player).unwrap().health(), Some(4));
    }

    #[test]
    fn test_contact_damages_both_planes() {
        let mut registry = registry();
        let player = registry.register(
            Category::Player,
            plane(Vec2::new(0.0, 0.0), Vec2::new(40.0, 40.0), 5),
        );
        let enemy = registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(20.0, 20.0), Vec2::new(40.0, 40.0), 1),
        );
        CollisionEngine::default().resolve(&mut registry, 0.0, &mut NoopListener);
        assert_eq!(registry.get(player).unwrap().health(), Some(4));
        assert!(registry.get(enemy).unwrap().is_destroyed());
    }

    #[test]
    fn test_destroyed_entities_take_no_further_damage() {
        let mut registry = registry();
        let enemy = registry.register(
            Category::EnemyUnit,
            plane(Vec2::new(0.0, 0.0), Vec2::new(40.0, 40.0), 1),
        );
        for pos in [Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0)] {
            registry.register(Category::UserProjectile, user_shot(pos, Some(EntityId(9))));
        }

        let mut outcomes = Vec::new();
        let mut listener =
            |_: EntityId, _: EntityId, outcome: DamageOutcome| outcomes.push(outcome);
        CollisionEngine::default().resolve(&mut registry, 0.0, &mut listener);

        assert!(registry.get(enemy).unwrap().is_destroyed());
        assert_eq!(outcomes, vec![DamageOutcome::Destroyed]);
    }

    fn arb_boxes() -> impl Strategy<Value = Vec<(f32, f32, f32, f32)>> {
        prop::collection::vec((0f32..400.0, 0f32..400.0, 1f32..80.0, 1f32..80.0), 0..12)
    }

    proptest! {
        #[test]
        fn test_pair_checks_and_damages_each_overlap_once(
            left in arb_boxes(),
            right in arb_boxes(),
        ) {
            const HEALTH: i32 = 1_000;
            let mut registry = registry();
            let enemies: Vec<(EntityId, Aabb)> = left
                .iter()
                .map(|&(x, y, w, h)| {
                    let e = plane(Vec2::new(x, y), Vec2::new(w, h), HEALTH);
                    let bounds = e.bounds();
                    (registry.register(Category::EnemyUnit, e), bounds)
                })
                .collect();
            let players: Vec<(EntityId, Aabb)> = right
                .iter()
                .map(|&(x, y, w, h)| {
                    let e = plane(Vec2::new(x, y), Vec2::new(w, h), HEALTH);
                    let bounds = e.bounds();
                    (registry.register(Category::Player, e), bounds)
                })
                .collect();

            let report = CollisionEngine::resolve_pair(
                &mut registry,
                Category::EnemyUnit,
                Category::Player,
                0.0,
                &mut NoopListener,
            );

            prop_assert_eq!(report.checks, left.len() * right.len());
            let mut expected_hits = 0;
            for (id, bounds) in &enemies {
                let overlaps = players.iter().filter(|(_, b)| bounds.intersects(b)).count();
                expected_hits += overlaps;
                let health = registry.get(*id).unwrap().health();
                prop_assert_eq!(health, Some(HEALTH - overlaps as i32));
            }
            for (id, bounds) in &players {
                let overlaps = enemies.iter().filter(|(_, b)| bounds.intersects(b)).count();
                let health = registry.get(*id).unwrap().health();
                prop_assert_eq!(health, Some(HEALTH - overlaps as i32));
            }
            prop_assert_eq!(report.hits, expected_hits);
        }
    }
}
