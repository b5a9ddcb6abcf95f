//! Per-tick context handed to entity updates
//!
//! Strategies never see the registry directly. They read a `WorldView`
//! snapshot taken at the start of the tick and queue new entities through
//! the `Spawner`, which the registry drains once every entity has updated.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::entity::{Category, Entity, EntityId};
use super::input::InputState;
use crate::settings::Tuning;

/// RNG used throughout the simulation (seeded per session)
pub type SimRng = Pcg32;

/// Read-only facts about the world, captured before any entity moves
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    pub screen: Vec2,
    /// Center of every live player plane
    pub players: Vec<Vec2>,
}

impl WorldView {
    /// Player center closest to `from`
    pub fn nearest_player(&self, from: Vec2) -> Option<Vec2> {
        self.players.iter().copied().min_by(|a, b| {
            a.distance_squared(from)
                .partial_cmp(&b.distance_squared(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Command buffer for entities and cosmetic overlays created mid-tick
#[derive(Debug, Default)]
pub struct Spawner {
    pending: Vec<(Category, Entity)>,
    overlays: Vec<(EntityId, Option<Vec2>)>,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity; it is registered after the update pass
    pub fn spawn(&mut self, category: Category, entity: Entity) {
        self.pending.push((category, entity));
    }

    /// Place (or hide with `None`) the overlay element owned by `owner`
    pub fn place_overlay(&mut self, owner: EntityId, at: Option<Vec2>) {
        self.overlays.push((owner, at));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn drain_spawns(&mut self) -> impl Iterator<Item = (Category, Entity)> + '_ {
        self.pending.drain(..)
    }

    pub fn drain_overlays(&mut self) -> impl Iterator<Item = (EntityId, Option<Vec2>)> + '_ {
        self.overlays.drain(..)
    }
}

/// Inputs shared by every entity update in one tick
pub struct FrameContext<'a> {
    /// Host clock in seconds
    pub now: f64,
    pub rng: &'a mut SimRng,
    pub input: &'a InputState,
    pub tuning: &'a Tuning,
}

/// What a single entity sees while updating
pub struct TickContext<'a> {
    pub now: f64,
    /// Id of the entity being updated
    pub self_id: EntityId,
    pub rng: &'a mut SimRng,
    pub input: &'a InputState,
    pub tuning: &'a Tuning,
    pub world: &'a WorldView,
    pub spawner: &'a mut Spawner,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_player() {
        let world = WorldView {
            screen: Vec2::new(100.0, 100.0),
            players: vec![Vec2::new(10.0, 10.0), Vec2::new(80.0, 50.0)],
        };
        assert_eq!(
            world.nearest_player(Vec2::new(70.0, 40.0)),
            Some(Vec2::new(80.0, 50.0))
        );
        assert_eq!(WorldView::default().nearest_player(Vec2::ZERO), None);
    }
}
