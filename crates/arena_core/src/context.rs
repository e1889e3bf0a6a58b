//! Per-hook execution context handed to behaviors.

use std::any::Any;

use arena_math::{Transform2D, Vec2};

use crate::behavior::BehaviorKey;
use crate::entity::{Entity, EntityId};
use crate::events::EntityEvent;
use crate::world::World;

/// Context provided to every [`Behavior`](crate::Behavior) hook.
///
/// Holds the world mutably plus the identity of the running behavior: its
/// owning entity (the non-owning back-reference) and its slot. The running
/// behavior is checked out of that slot for the duration of the hook.
pub struct BehaviorCtx<'w> {
    world: &'w mut World,
    entity: EntityId,
    slot: usize,
    key: BehaviorKey,
}

impl<'w> BehaviorCtx<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId, slot: usize, key: BehaviorKey) -> Self {
        Self {
            world,
            entity,
            slot,
            key,
        }
    }

    /// The owning entity's id.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity
    }

    /// The key the running behavior is registered under.
    #[must_use]
    pub fn key(&self) -> BehaviorKey {
        self.key
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// The world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.world
    }

    /// The owning entity.
    #[must_use]
    pub fn entity(&self) -> Option<&Entity> {
        self.world.entity(self.entity)
    }

    /// The owning entity, mutably.
    pub fn entity_mut(&mut self) -> Option<&mut Entity> {
        self.world.entity_mut(self.entity)
    }

    /// The owning entity's transform, or the identity if it is gone.
    #[must_use]
    pub fn transform(&self) -> Transform2D {
        self.entity()
            .map(|e| *e.transform())
            .unwrap_or_default()
    }

    /// The owning entity's position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.transform().position
    }

    /// Move the owning entity.
    pub fn set_position(&mut self, position: Vec2) {
        if let Some(entity) = self.entity_mut() {
            entity.set_position(position);
        }
    }

    /// Emit an event from the owning entity.
    pub fn emit(&mut self, event: EntityEvent) {
        let entity = self.entity;
        self.world.emit(entity, event);
    }

    /// Enable or disable the running behavior. Hooks fire when the current
    /// hook returns.
    pub fn set_enabled(&mut self, enabled: bool) {
        let (entity, slot) = (self.entity, self.slot);
        self.world.set_enabled_at(entity, slot, enabled);
    }

    /// Put the running behavior to sleep or wake it.
    pub fn set_sleeping(&mut self, sleeping: bool) {
        let (entity, slot) = (self.entity, self.slot);
        if let Some(s) = self.world.slot_mut(entity, slot) {
            s.sleeping = sleeping;
        }
    }

    /// Destroy the running behavior. `on_destroy` runs when the current hook
    /// returns; the slot is skipped from now on.
    pub fn destroy_self(&mut self) {
        let (entity, slot) = (self.entity, self.slot);
        self.world.destroy_behavior_at(entity, slot);
    }

    /// Destroy the owning entity.
    pub fn destroy_entity(&mut self) {
        let entity = self.entity;
        self.world.destroy_entity(entity);
    }

    /// Borrow a world resource.
    #[must_use]
    pub fn resource<R: Any>(&self) -> Option<&R> {
        self.world.resources().get::<R>()
    }

    /// Mutably borrow a world resource.
    pub fn resource_mut<R: Any>(&mut self) -> Option<&mut R> {
        self.world.resources_mut().get_mut::<R>()
    }
}
