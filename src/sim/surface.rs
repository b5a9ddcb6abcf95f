//! Rendering collaborator boundary
//!
//! The core never draws. It tells a `RenderSurface` which visuals exist,
//! where they are and when they go away. Visual keys are opaque strings
//! resolved by the host's asset layer.

use std::collections::BTreeMap;

use glam::Vec2;

use super::entity::{Aabb, EntityId};

pub trait RenderSurface {
    /// Whether the root node exists; registries refuse to start otherwise
    fn is_ready(&self) -> bool {
        true
    }

    fn attach(&mut self, id: EntityId, visual: &str, bounds: Aabb);

    fn detach(&mut self, id: EntityId);

    /// Move an attached visual (and swap its key if it changed)
    fn sync(&mut self, _id: EntityId, _visual: &str, _bounds: Aabb) {}

    /// Show, move or hide (`None`) the overlay owned by an entity
    fn place_overlay(&mut self, _owner: EntityId, _at: Option<Vec2>) {}

    fn set_background(&mut self, _visual: &str) {}
}

/// A visual as last reported to the headless surface
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub visual: String,
    pub bounds: Aabb,
}

/// In-memory surface for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    ready: bool,
    placed: BTreeMap<EntityId, Placed>,
    overlays: BTreeMap<EntityId, Vec2>,
    background: Option<String>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    /// A surface whose root was never created
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> usize {
        self.placed.len()
    }

    pub fn get(&self, id: EntityId) -> Option<&Placed> {
        self.placed.get(&id)
    }

    pub fn overlay(&self, owner: EntityId) -> Option<Vec2> {
        self.overlays.get(&owner).copied()
    }

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }
}

impl RenderSurface for HeadlessSurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn attach(&mut self, id: EntityId, visual: &str, bounds: Aabb) {
        self.placed.insert(
            id,
            Placed {
                visual: visual.to_string(),
                bounds,
            },
        );
    }

    fn detach(&mut self, id: EntityId) {
        self.placed.remove(&id);
        self.overlays.remove(&id);
    }

    fn sync(&mut self, id: EntityId, visual: &str, bounds: Aabb) {
        if let Some(placed) = self.placed.get_mut(&id) {
            placed.bounds = bounds;
            if placed.visual != visual {
                placed.visual = visual.to_string();
            }
        }
    }

    fn place_overlay(&mut self, owner: EntityId, at: Option<Vec2>) {
        match at {
            Some(at) => {
                self.overlays.insert(owner, at);
            }
            None => {
                self.overlays.remove(&owner);
            }
        }
    }

    fn set_background(&mut self, visual: &str) {
        self.background = Some(visual.to_string());
    }
}

/// Surface shared with the host so it can inspect what the core attached
impl<S: RenderSurface + ?Sized> RenderSurface for std::rc::Rc<std::cell::RefCell<S>> {
    fn is_ready(&self) -> bool {
        self.borrow().is_ready()
    }

    fn attach(&mut self, id: EntityId, visual: &str, bounds: Aabb) {
        self.borrow_mut().attach(id, visual, bounds);
    }

    fn detach(&mut self, id: EntityId) {
        self.borrow_mut().detach(id);
    }

    fn sync(&mut self, id: EntityId, visual: &str, bounds: Aabb) {
        self.borrow_mut().sync(id, visual, bounds);
    }

    fn place_overlay(&mut self, owner: EntityId, at: Option<Vec2>) {
        self.borrow_mut().place_overlay(owner, at);
    }

    fn set_background(&mut self, visual: &str) {
        self.borrow_mut().set_background(visual);
    }
}
