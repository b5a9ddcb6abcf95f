//! Entity registry
//!
//! Single source of truth for every live entity, partitioned by category.
//! Storage is keyed by `EntityId` in a `BTreeMap` and each category keeps its
//! members in registration order, so iteration is stable from tick to tick.

use std::collections::BTreeMap;

use glam::Vec2;

use super::context::{FrameContext, Spawner, TickContext, WorldView};
use super::entity::{Aabb, Category, Entity, EntityId, ProjectileKind};
use super::surface::RenderSurface;
use crate::error::ConfigError;

struct Slot {
    category: Category,
    entity: Entity,
}

/// An entity taken out by `sweep_destroyed`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Removed {
    pub id: EntityId,
    pub category: Category,
    pub bounds: Aabb,
    /// Health at removal (`None` for projectiles)
    pub health: Option<i32>,
}

pub struct EntityRegistry {
    slots: BTreeMap<EntityId, Slot>,
    members: [Vec<EntityId>; Category::ALL.len()],
    next_id: u32,
    spawner: Spawner,
    surface: Box<dyn RenderSurface>,
}

impl EntityRegistry {
    /// Fails if the surface has no root to attach visuals to
    pub fn new(surface: Box<dyn RenderSurface>) -> Result<Self, ConfigError> {
        if !surface.is_ready() {
            log::error!("Entity registry created against an uninitialized surface");
            return Err(ConfigError::SurfaceNotReady);
        }
        Ok(Self {
            slots: BTreeMap::new(),
            members: Default::default(),
            next_id: 1,
            spawner: Spawner::new(),
            surface,
        })
    }

    /// Add an entity and attach its visual
    ///
    /// Registration takes the entity by value, so the same entity can never
    /// be filed twice.
    pub fn register(&mut self, category: Category, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.surface.attach(id, entity.body.visual(), entity.bounds());
        self.members[category.index()].push(id);
        self.slots.insert(id, Slot { category, entity });
        log::debug!("Registered {id} as {category:?}");
        id
    }

    /// Re-file an already registered id; a no-op when it is already in `category`
    pub fn adopt(&mut self, id: EntityId, category: Category) -> bool {
        match self.slots.get(&id) {
            Some(slot) if slot.category == category => true,
            Some(slot) => {
                log::warn!(
                    "{id} already belongs to {:?}, not filing it under {category:?}",
                    slot.category
                );
                false
            }
            None => {
                log::warn!("Cannot adopt {id}: not registered");
                false
            }
        }
    }

    /// Remove an entity from `category`; a missing entity is reported and ignored
    pub fn unregister(&mut self, id: EntityId, category: Category) -> Option<Entity> {
        match self.slots.get(&id) {
            Some(slot) if slot.category == category => {}
            Some(slot) => {
                log::warn!(
                    "Cannot unregister {id} from {category:?}: it belongs to {:?}",
                    slot.category
                );
                return None;
            }
            None => {
                log::warn!("Cannot unregister {id} from {category:?}: not registered");
                return None;
            }
        }
        let slot = self.slots.remove(&id)?;
        self.members[category.index()].retain(|member| *member != id);
        self.surface.detach(id);
        Some(slot.entity)
    }

    /// Update every entity once, iterating a snapshot taken before the pass
    ///
    /// Entities spawned during the pass are registered afterwards, so they
    /// take part in collisions this tick but first update next tick. Returns
    /// the number of entities spawned.
    pub fn update_all(&mut self, frame: &mut FrameContext<'_>) -> usize {
        let world = self.world_view(frame.tuning.screen());
        let snapshot: Vec<EntityId> = self.members.iter().flatten().copied().collect();

        for id in snapshot {
            let Some(slot) = self.slots.get_mut(&id) else {
                continue;
            };
            if slot.entity.is_destroyed() {
                continue;
            }
            let mut ctx = TickContext {
                now: frame.now,
                self_id: id,
                rng: &mut *frame.rng,
                input: frame.input,
                tuning: frame.tuning,
                world: &world,
                spawner: &mut self.spawner,
            };
            slot.entity.update(&mut ctx);
            self.surface.sync(id, slot.entity.body.visual(), slot.entity.bounds());
        }

        let spawns: Vec<_> = self.spawner.drain_spawns().collect();
        let spawned = spawns.len();
        for (category, entity) in spawns {
            self.register(category, entity);
        }
        let overlays: Vec<_> = self.spawner.drain_overlays().collect();
        for (owner, at) in overlays {
            self.surface.place_overlay(owner, at);
        }
        spawned
    }

    /// Remove every destroyed entity and detach its visual
    pub fn sweep_destroyed(&mut self) -> Vec<Removed> {
        let doomed: Vec<EntityId> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.entity.is_destroyed())
            .map(|(id, _)| *id)
            .collect();
        if doomed.is_empty() {
            return Vec::new();
        }

        let slots = &self.slots;
        for members in &mut self.members {
            members.retain(|id| slots.get(id).is_some_and(|s| !s.entity.is_destroyed()));
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(slot) = self.slots.remove(&id) {
                self.surface.place_overlay(id, None);
                self.surface.detach(id);
                removed.push(Removed {
                    id,
                    category: slot.category,
                    bounds: slot.entity.bounds(),
                    health: slot.entity.health(),
                });
            }
        }
        log::debug!("Swept {} destroyed entities", removed.len());
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(&id).map(|slot| &slot.entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(&id).map(|slot| &mut slot.entity)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn category_of(&self, id: EntityId) -> Option<Category> {
        self.slots.get(&id).map(|slot| slot.category)
    }

    /// Members of a category in registration order
    pub fn ids(&self, category: Category) -> &[EntityId] {
        &self.members[category.index()]
    }

    pub fn len(&self, category: Category) -> usize {
        self.members[category.index()].len()
    }

    /// Entities across all categories
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self, category: Category) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.members[category.index()]
            .iter()
            .filter_map(|id| self.get(*id).map(|entity| (*id, entity)))
    }

    pub fn players(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter(Category::Player)
    }

    pub fn friendly_units(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter(Category::FriendlyUnit)
    }

    pub fn enemy_units(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter(Category::EnemyUnit)
    }

    pub fn boss_units(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter(Category::BossUnit)
    }

    pub fn projectiles(
        &self,
        kind: ProjectileKind,
    ) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.iter(kind.category())
    }

    /// Snapshot of player positions for strategies
    pub fn world_view(&self, screen: Vec2) -> WorldView {
        WorldView {
            screen,
            players: self
                .players()
                .filter(|(_, e)| !e.is_destroyed())
                .map(|(_, e)| e.body.center())
                .collect(),
        }
    }

    pub fn surface_mut(&mut self) -> &mut dyn RenderSurface {
        self.surface.as_mut()
    }

    /// Detach everything and hand the surface back
    pub fn into_surface(mut self) -> Box<dyn RenderSurface> {
        for id in self.slots.keys() {
            self.surface.place_overlay(*id, None);
            self.surface.detach(*id);
        }
        log::debug!("Registry released {} entities", self.slots.len());
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;
    use crate::settings::Tuning;
    use crate::sim::context::SimRng;
    use crate::sim::entity::{Body, FighterPlane};
    use crate::sim::input::InputState;
    use crate::sim::strategy::{Cadence, CadenceFiring, DriftMovement, Idle, Silent};
    use crate::sim::surface::HeadlessSurface;

    fn shared_surface() -> Rc<RefCell<HeadlessSurface>> {
        Rc::new(RefCell::new(HeadlessSurface::new()))
    }

    fn plane_at(x: f32) -> Entity {
        Entity::fighter(
            Body::new(Vec2::new(x, 100.0), Vec2::new(20.0, 20.0), "plane"),
            FighterPlane::new(1, Box::new(Idle), Box::new(Silent)),
        )
    }

    fn run_update(registry: &mut EntityRegistry, now: f64) -> usize {
        let tuning = Tuning::default();
        let input = InputState::default();
        let mut rng = SimRng::seed_from_u64(11);
        let mut frame = FrameContext {
            now,
            rng: &mut rng,
            input: &input,
            tuning: &tuning,
        };
        registry.update_all(&mut frame)
    }

    #[test]
    fn test_uninitialized_surface_rejected() {
        let result = EntityRegistry::new(Box::new(HeadlessSurface::uninitialized()));
        assert!(matches!(result, Err(ConfigError::SurfaceNotReady)));
    }

    #[test]
    fn test_register_attaches_and_queries() {
        let surface = shared_surface();
        let mut registry = EntityRegistry::new(Box::new(surface.clone())).unwrap();
        let a = registry.register(Category::EnemyUnit, plane_at(0.0));
        let b = registry.register(Category::EnemyUnit, plane_at(50.0));
        let p = registry.register(Category::Player, plane_at(100.0));

        assert_ne!(a, b);
        assert_eq!(registry.ids(Category::EnemyUnit), &[a, b]);
        assert_eq!(registry.players().count(), 1);
        assert_eq!(registry.category_of(p), Some(Category::Player));
        assert_eq!(registry.total(), 3);
        assert_eq!(surface.borrow().attached(), 3);
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let surface = shared_surface();
        let mut registry = EntityRegistry::new(Box::new(surface.clone())).unwrap();
        let id = registry.register(Category::EnemyUnit, plane_at(0.0));

        // Wrong category and unknown id are both tolerated
        assert!(registry.unregister(id, Category::BossUnit).is_none());
        assert!(registry.unregister(EntityId(999), Category::EnemyUnit).is_none());
        assert_eq!(registry.total(), 1);

        assert!(registry.adopt(id, Category::EnemyUnit));
        assert!(!registry.adopt(id, Category::BossUnit));
        assert_eq!(registry.ids(Category::EnemyUnit), &[id]);

        assert!(registry.unregister(id, Category::EnemyUnit).is_some());
        assert!(registry.is_empty());
        assert_eq!(surface.borrow().attached(), 0);
        assert!(registry.unregister(id, Category::EnemyUnit).is_none());
    }

    #[test]
    fn test_spawns_update_from_next_tick() {
        let mut registry = EntityRegistry::new(Box::new(HeadlessSurface::new())).unwrap();
        let shooter = Entity::fighter(
            Body::new(Vec2::new(600.0, 100.0), Vec2::new(20.0, 20.0), "plane"),
            FighterPlane::new(
                1,
                Box::new(Idle),
                Box::new(CadenceFiring::new(
                    Cadence::Interval { seconds: 100.0 },
                    ProjectileKind::Enemy,
                    Vec2::ZERO,
                )),
            ),
        );
        registry.register(Category::EnemyUnit, shooter);

        assert_eq!(run_update(&mut registry, 0.0), 1);
        let (shot_id, shot) = registry.projectiles(ProjectileKind::Enemy).next().unwrap();
        let spawn_x = shot.body.pos().x;

        run_update(&mut registry, 0.05);
        let moved = registry.get(shot_id).unwrap().body.pos().x;
        let speed = Tuning::default().projectiles.enemy.speed;
        assert_eq!(moved, spawn_x + speed);
    }

    #[test]
    fn test_self_destruction_mid_pass_then_sweep() {
        let surface = shared_surface();
        let mut registry = EntityRegistry::new(Box::new(surface.clone())).unwrap();
        let leaving = Entity::fighter(
            Body::new(Vec2::new(-19.0, 100.0), Vec2::new(20.0, 20.0), "enemy"),
            FighterPlane::new(1, Box::new(DriftMovement::new(-3.0)), Box::new(Silent)),
        );
        let id = registry.register(Category::EnemyUnit, leaving);
        let stays = registry.register(Category::EnemyUnit, plane_at(300.0));

        run_update(&mut registry, 0.0);
        assert!(registry.get(id).unwrap().is_destroyed());
        assert_eq!(registry.len(Category::EnemyUnit), 2, "removal waits for the sweep");

        let removed = registry.sweep_destroyed();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, id);
        assert_eq!(removed[0].category, Category::EnemyUnit);
        assert_eq!(registry.ids(Category::EnemyUnit), &[stays]);
        assert!(surface.borrow().get(id).is_none());
    }

    #[test]
    fn test_into_surface_detaches_everything() {
        let surface = shared_surface();
        let mut registry = EntityRegistry::new(Box::new(surface.clone())).unwrap();
        registry.register(Category::Player, plane_at(0.0));
        registry.register(Category::BossUnit, plane_at(10.0));
        let _surface = registry.into_surface();
        assert_eq!(surface.borrow().attached(), 0);
    }

    proptest! {
        #[test]
        fn test_sweep_leaves_no_destroyed_entity(
            layout in prop::collection::vec((0usize..7, any::<bool>()), 0..40)
        ) {
            let surface = shared_surface();
            let mut registry = EntityRegistry::new(Box::new(surface.clone())).unwrap();
            let mut destroyed = Vec::new();
            for (i, (cat, doomed)) in layout.iter().enumerate() {
                let id = registry.register(Category::ALL[*cat], plane_at(i as f32 * 30.0));
                if *doomed {
                    registry.get_mut(id).unwrap().body.destroy();
                    destroyed.push(id);
                }
            }

            let removed = registry.sweep_destroyed();
            prop_assert_eq!(removed.len(), destroyed.len());
            for id in &destroyed {
                prop_assert!(!registry.contains(*id));
                for category in Category::ALL {
                    prop_assert!(!registry.ids(category).contains(id));
                }
                prop_assert!(surface.borrow().get(*id).is_none());
            }
            let live: usize = Category::ALL.iter().map(|c| registry.len(*c)).sum();
            prop_assert_eq!(live, layout.len() - destroyed.len());
            prop_assert_eq!(surface.borrow().attached(), live);
        }
    }
}
