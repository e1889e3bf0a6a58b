//! World state for the simulation.
//!
//! The [`World`] is the single source of truth for entity state: identity
//! allocation, behavior attachment and lifecycle, per-tick updates in
//! registration and priority order, groups, and shared resources.
//!
//! ## Hook execution
//!
//! Every behavior hook runs with the behavior checked out of its slot
//! (`Option::take`) and a [`BehaviorCtx`] borrowing the whole world. When the
//! hook returns the behavior is checked back in, and any lifecycle change
//! requested while it was out is settled then: a destroyed behavior gets its
//! `on_destroy` and is dropped, a toggled one gets `on_enable`/`on_disable`.
//!
//! ## Mutation during iteration
//!
//! Behaviors attached during a tick land in the entity's pending tail and are
//! first updated on the next tick. Destroyed behaviors are tombstoned, skipped
//! for the rest of the pass, and compacted out after it. Destroyed entities
//! are reaped after the whole world pass.

use std::collections::HashMap;

use arena_math::Transform2D;
use tracing::{debug, warn};

use crate::behavior::{Behavior, BehaviorKey};
use crate::context::BehaviorCtx;
use crate::entity::{BehaviorSlot, Entity, EntityAllocator, EntityId};
use crate::error::WorldError;
use crate::events::EntityEvent;
use crate::group::{Group, GroupId, Groups};
use crate::resources::Resources;

/// The canonical simulation state.
#[derive(Debug, Default)]
pub struct World {
    /// Entity id allocator.
    allocator: EntityAllocator,
    /// Every entity added and not yet reaped.
    entities: HashMap<EntityId, Entity>,
    /// Registration order; defines update order.
    order: Vec<EntityId>,
    /// Group tree.
    groups: Groups,
    /// Type-keyed shared state.
    resources: Resources,
    /// Events waiting for collaborators.
    outbox: Vec<(EntityId, EntityEvent)>,
    /// Priority regressions observed during updates.
    ordering_violations: u64,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Entity lifecycle --

    /// Allocate an entity that is not yet part of the world.
    ///
    /// Queue its behaviors with [`Entity::add_behavior`], then make it live
    /// with [`World::add_entity`].
    pub fn create_entity(&mut self, transform: Transform2D) -> Entity {
        Entity::new(self.allocator.allocate(), transform)
    }

    /// Add an entity to the world, optionally into a group.
    ///
    /// Emits [`EntityEvent::Added`] and initializes every queued behavior in
    /// attachment order (`init`, then `on_enable` if enabled).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`] for an unknown group,
    /// [`WorldError::EntityDestroyed`] or [`WorldError::EntityAlreadyAdded`]
    /// for entities that cannot be added.
    pub fn add_entity(
        &mut self,
        mut entity: Entity,
        group: Option<GroupId>,
    ) -> Result<EntityId, WorldError> {
        let id = entity.id();
        if entity.destroyed {
            return Err(WorldError::EntityDestroyed(id));
        }
        if entity.live || self.entities.contains_key(&id) {
            return Err(WorldError::EntityAlreadyAdded(id));
        }
        if let Some(group_id) = group
            && !self.groups.contains(group_id)
        {
            return Err(WorldError::GroupNotFound(group_id));
        }

        entity.live = true;
        entity.group = group;
        self.entities.insert(id, entity);
        self.order.push(id);
        if let Some(group_id) = group {
            self.groups.attach(group_id, id);
        }
        debug!(entity = %id, ?group, "entity added");

        self.emit(id, EntityEvent::Added);

        // Initialization may attach more behaviors; those are initialized by
        // `add_behavior` directly because the entity is live now.
        let mut idx = 0;
        while let Some(slot) = self.slot(id, idx) {
            if !slot.initialized && !slot.destroyed {
                self.initialize_slot(id, idx);
            }
            if self.entities.get(&id).is_none_or(|e| e.destroyed) {
                break;
            }
            idx += 1;
        }
        Ok(id)
    }

    /// Create an empty entity and add it in one step.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`] for an unknown group.
    pub fn spawn(
        &mut self,
        transform: Transform2D,
        group: Option<GroupId>,
    ) -> Result<EntityId, WorldError> {
        let entity = self.create_entity(transform);
        self.add_entity(entity, group)
    }

    /// Destroy an entity.
    ///
    /// Idempotent. The first call emits [`EntityEvent::Destroyed`], destroys
    /// every behavior in reverse slot order, removes the entity from its
    /// group, and clears its listeners. The entity stays readable (flagged
    /// destroyed) until the end of the current world update.
    ///
    /// Returns `true` if this call destroyed the entity.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        if entity.destroyed {
            return false;
        }
        entity.destroyed = true;
        let group = entity.group.take();
        let slot_count = entity.slots.len();
        debug!(entity = %id, "destroying entity");

        self.emit(id, EntityEvent::Destroyed);
        self.tear_down(id, slot_count);
        if let Some(group_id) = group {
            self.groups.detach(group_id, id);
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.live = false;
            entity.listeners.clear();
        }
        true
    }

    /// Returns a reference to an entity, including destroyed ones awaiting reaping.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns `true` if the entity is in the world and not destroyed.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(|e| !e.destroyed)
    }

    /// Returns `true` if the entity would be updated on the next tick.
    #[must_use]
    pub fn is_updating(&self, id: EntityId) -> bool {
        self.entities.get(&id).is_some_and(|e| {
            !e.destroyed && e.active && !e.group.is_some_and(|g| self.groups.is_paused(g))
        })
    }

    /// Number of live (non-destroyed) entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.values().filter(|e| !e.destroyed).count()
    }

    /// Entity ids in registration (update) order.
    #[must_use]
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Number of entity ids handed out so far.
    #[must_use]
    pub fn allocated_count(&self) -> u64 {
        self.allocator.count()
    }

    // -- Behaviors --

    /// Attach a behavior under its type's default key.
    ///
    /// On a live entity the behavior is initialized immediately; it is first
    /// updated on the entity's next update.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] or [`WorldError::EntityDestroyed`].
    pub fn add_behavior<B: Behavior>(
        &mut self,
        id: EntityId,
        behavior: B,
    ) -> Result<BehaviorKey, WorldError> {
        self.add_behavior_keyed(id, BehaviorKey::of::<B>(), Box::new(behavior))
    }

    /// Attach a boxed behavior under an explicit key.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] or [`WorldError::EntityDestroyed`].
    pub fn add_behavior_keyed(
        &mut self,
        id: EntityId,
        key: BehaviorKey,
        behavior: Box<dyn Behavior>,
    ) -> Result<BehaviorKey, WorldError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        if entity.destroyed {
            return Err(WorldError::EntityDestroyed(id));
        }
        let idx = entity.push_slot(key, behavior);
        debug!(entity = %id, behavior = entity.slots[idx].name, "behavior attached");
        if entity.live {
            self.initialize_slot(id, idx);
        }
        Ok(key)
    }

    /// Returns the authoritative instance of `T` on an entity.
    #[must_use]
    pub fn get<T: Behavior>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)?.get::<T>()
    }

    /// Mutable variant of [`World::get`].
    pub fn get_mut<T: Behavior>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)?.get_mut::<T>()
    }

    /// Get-or-create `T` using its `Default`.
    ///
    /// # Errors
    ///
    /// See [`World::try_require_with`].
    pub fn require<T: Behavior + Default>(&mut self, id: EntityId) -> Result<&mut T, WorldError> {
        self.require_with(id, T::default)
    }

    /// Get-or-create `T` using `make` on a miss.
    ///
    /// # Errors
    ///
    /// See [`World::try_require_with`].
    pub fn require_with<T: Behavior>(
        &mut self,
        id: EntityId,
        make: impl FnOnce() -> T,
    ) -> Result<&mut T, WorldError> {
        self.try_require_with(id, || Ok::<_, WorldError>(make()))
    }

    /// Get-or-create `T` with a fallible constructor.
    ///
    /// # Errors
    ///
    /// Propagates the constructor's error. Returns
    /// [`WorldError::BehaviorBusy`] if the instance is running a hook, and
    /// [`WorldError::BehaviorNotFound`] if a freshly created instance
    /// destroyed itself during `init`.
    pub fn try_require_with<T, E>(
        &mut self,
        id: EntityId,
        make: impl FnOnce() -> Result<T, E>,
    ) -> Result<&mut T, E>
    where
        T: Behavior,
        E: From<WorldError>,
    {
        let key = BehaviorKey::of::<T>();
        let entity = self
            .entities
            .get(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        if entity.destroyed {
            return Err(WorldError::EntityDestroyed(id).into());
        }
        match entity.find_slot(key) {
            Some(idx) if entity.slots[idx].behavior.is_none() => {
                return Err(WorldError::BehaviorBusy { entity: id, key }.into());
            }
            Some(_) => {}
            None => {
                let behavior = make()?;
                self.add_behavior_keyed(id, key, Box::new(behavior))?;
            }
        }
        self.entities
            .get_mut(&id)
            .and_then(|e| e.get_keyed_mut::<T>(key))
            .ok_or_else(|| WorldError::BehaviorNotFound { entity: id, key }.into())
    }

    /// Destroy the authoritative instance of `T`. Returns `true` if one was destroyed.
    pub fn remove<T: Behavior>(&mut self, id: EntityId) -> bool {
        self.remove_keyed(id, BehaviorKey::of::<T>())
    }

    /// Destroy the authoritative instance registered under `key`.
    pub fn remove_keyed(&mut self, id: EntityId, key: BehaviorKey) -> bool {
        match self.entities.get(&id).and_then(|e| e.find_slot(key)) {
            Some(idx) => self.destroy_behavior_at(id, idx),
            None => false,
        }
    }

    /// Run `f` against the authoritative `T` with a context for it.
    ///
    /// # Errors
    ///
    /// See [`World::with_behavior_keyed`].
    pub fn with_behavior<T: Behavior, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T, &mut BehaviorCtx<'_>) -> R,
    ) -> Result<R, WorldError> {
        self.with_behavior_keyed(id, BehaviorKey::of::<T>(), f)
    }

    /// Run `f` against the behavior registered under `key`, downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`], [`WorldError::BehaviorNotFound`]
    /// (also for a type mismatch), or [`WorldError::BehaviorBusy`] when the
    /// behavior is executing a hook further up the call stack.
    pub fn with_behavior_keyed<T: Behavior, R>(
        &mut self,
        id: EntityId,
        key: BehaviorKey,
        f: impl FnOnce(&mut T, &mut BehaviorCtx<'_>) -> R,
    ) -> Result<R, WorldError> {
        let entity = self
            .entities
            .get(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        let idx = entity
            .find_slot(key)
            .ok_or(WorldError::BehaviorNotFound { entity: id, key })?;
        if entity.slots[idx].behavior.is_none() {
            return Err(WorldError::BehaviorBusy { entity: id, key });
        }
        self.with_behavior_at(id, idx, |behavior, ctx| {
            behavior
                .as_any_mut()
                .downcast_mut::<T>()
                .map(|typed| f(typed, ctx))
        })
        .flatten()
        .ok_or(WorldError::BehaviorNotFound { entity: id, key })
    }

    /// Enable or disable the authoritative `T`.
    ///
    /// # Errors
    ///
    /// See [`World::set_enabled_keyed`].
    pub fn set_enabled<T: Behavior>(&mut self, id: EntityId, enabled: bool) -> Result<bool, WorldError> {
        self.set_enabled_keyed(id, BehaviorKey::of::<T>(), enabled)
    }

    /// Enable or disable the behavior under `key`, running `on_enable` or
    /// `on_disable` (deferred until it returns if it is executing).
    ///
    /// Returns `Ok(false)` when the flag already had that value. `init` is
    /// never rerun.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] or [`WorldError::BehaviorNotFound`].
    pub fn set_enabled_keyed(
        &mut self,
        id: EntityId,
        key: BehaviorKey,
        enabled: bool,
    ) -> Result<bool, WorldError> {
        let idx = self
            .entities
            .get(&id)
            .ok_or(WorldError::EntityNotFound(id))?
            .find_slot(key)
            .ok_or(WorldError::BehaviorNotFound { entity: id, key })?;
        Ok(self.set_enabled_at(id, idx, enabled))
    }

    /// Put the behavior under `key` to sleep or wake it. Sleeping behaviors
    /// keep their enabled state but are not updated.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`] or [`WorldError::BehaviorNotFound`].
    pub fn set_sleeping_keyed(
        &mut self,
        id: EntityId,
        key: BehaviorKey,
        sleeping: bool,
    ) -> Result<(), WorldError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        let idx = entity
            .find_slot(key)
            .ok_or(WorldError::BehaviorNotFound { entity: id, key })?;
        entity.slots[idx].sleeping = sleeping;
        Ok(())
    }

    pub(crate) fn set_enabled_at(&mut self, id: EntityId, idx: usize, enabled: bool) -> bool {
        let Some(slot) = self.slot_mut(id, idx) else {
            return false;
        };
        if slot.destroyed || slot.enabled == enabled {
            return false;
        }
        slot.enabled = enabled;
        self.reconcile(id, idx);
        true
    }

    pub(crate) fn destroy_behavior_at(&mut self, id: EntityId, idx: usize) -> bool {
        let Some(slot) = self.slot_mut(id, idx) else {
            return false;
        };
        if slot.destroyed {
            return false;
        }
        slot.destroyed = true;
        debug!(entity = %id, behavior = slot.name, "behavior destroyed");
        // A checked-out behavior is finalized by `checkin`.
        let Some(mut behavior) = slot.behavior.take() else {
            return true;
        };
        slot.finalized = true;
        let key = slot.key;
        if slot.initialized {
            let mut ctx = BehaviorCtx::new(self, id, idx, key);
            behavior.on_destroy(&mut ctx);
        }
        true
    }

    /// Destroy slots `[0, end)` in reverse order. A checked-out slot stops
    /// the walk; its checkin runs its `on_destroy` and resumes below it.
    fn tear_down(&mut self, id: EntityId, end: usize) {
        for idx in (0..end).rev() {
            let checked_out = self
                .slot(id, idx)
                .is_some_and(|slot| !slot.destroyed && slot.behavior.is_none());
            self.destroy_behavior_at(id, idx);
            if checked_out {
                if let Some(entity) = self.entities.get_mut(&id) {
                    entity.teardown_at = Some(idx);
                }
                return;
            }
        }
    }

    fn initialize_slot(&mut self, id: EntityId, idx: usize) {
        match self.slot_mut(id, idx) {
            Some(slot) if !slot.initialized && !slot.destroyed => slot.initialized = true,
            _ => return,
        }
        // `checkin` fires `on_enable` for enabled behaviors.
        self.with_behavior_at(id, idx, |behavior, ctx| behavior.init(ctx));
    }

    /// Check a behavior out, run `f` with a context, and check it back in.
    fn with_behavior_at<R>(
        &mut self,
        id: EntityId,
        idx: usize,
        f: impl FnOnce(&mut dyn Behavior, &mut BehaviorCtx<'_>) -> R,
    ) -> Option<R> {
        let slot = self.slot_mut(id, idx)?;
        let key = slot.key;
        let mut behavior = slot.behavior.take()?;
        let result = {
            let mut ctx = BehaviorCtx::new(self, id, idx, key);
            f(&mut *behavior, &mut ctx)
        };
        self.checkin(id, idx, behavior);
        Some(result)
    }

    fn checkin(&mut self, id: EntityId, idx: usize, mut behavior: Box<dyn Behavior>) {
        let Some(slot) = self.slot_mut(id, idx) else {
            return;
        };
        if slot.destroyed {
            if !slot.finalized {
                slot.finalized = true;
                let key = slot.key;
                if slot.initialized {
                    let mut ctx = BehaviorCtx::new(self, id, idx, key);
                    behavior.on_destroy(&mut ctx);
                }
            }
            if let Some(entity) = self.entities.get_mut(&id)
                && entity.teardown_at == Some(idx)
            {
                entity.teardown_at = None;
                self.tear_down(id, idx);
            }
            return;
        }
        slot.behavior = Some(behavior);
        self.reconcile(id, idx);
    }

    /// Fire `on_enable`/`on_disable` if the enabled flag moved since the last hook.
    fn reconcile(&mut self, id: EntityId, idx: usize) {
        let Some(slot) = self.slot_mut(id, idx) else {
            return;
        };
        if !slot.initialized
            || slot.destroyed
            || slot.behavior.is_none()
            || slot.enabled == slot.hooked_enabled
        {
            return;
        }
        let enable = slot.enabled;
        slot.hooked_enabled = enable;
        self.with_behavior_at(id, idx, |behavior, ctx| {
            if enable {
                behavior.on_enable(ctx);
            } else {
                behavior.on_disable(ctx);
            }
        });
    }

    fn slot(&self, id: EntityId, idx: usize) -> Option<&BehaviorSlot> {
        self.entities.get(&id)?.slots.get(idx)
    }

    pub(crate) fn slot_mut(&mut self, id: EntityId, idx: usize) -> Option<&mut BehaviorSlot> {
        self.entities.get_mut(&id)?.slots.get_mut(idx)
    }

    // -- Tick --

    /// Update every entity once, in registration order, then reap destroyed
    /// entities.
    ///
    /// Entities added during the pass are first updated on the next call.
    pub fn update(&mut self, delta: f32) {
        let count = self.order.len();
        for i in 0..count {
            let id = self.order[i];
            self.update_entity(id, delta);
        }
        self.reap();
    }

    fn update_entity(&mut self, id: EntityId, delta: f32) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        if entity.destroyed || !entity.active {
            return;
        }
        if entity.group.is_some_and(|g| self.groups.is_paused(g)) {
            return;
        }
        entity.flush_pending();
        let live = entity.live_len;

        let mut last_priority = i32::MIN;
        for idx in 0..live {
            let Some(entity) = self.entities.get(&id) else {
                break;
            };
            if entity.destroyed {
                break;
            }
            let Some(slot) = entity.slots.get(idx) else {
                break;
            };
            if slot.destroyed || slot.behavior.is_none() {
                continue;
            }
            if !slot.initialized {
                // Queued with `Entity::add_behavior` after the entity went live.
                self.initialize_slot(id, idx);
                continue;
            }
            if !slot.enabled || slot.sleeping {
                continue;
            }
            let name = slot.name;
            let Some(reported) = self.with_behavior_at(id, idx, |behavior, ctx| {
                let priority = behavior.priority();
                behavior.update(ctx, delta);
                priority
            }) else {
                continue;
            };
            if reported < last_priority {
                warn!(
                    entity = %id,
                    behavior = name,
                    priority = reported,
                    previous = last_priority,
                    "behavior priority regressed during update"
                );
                self.ordering_violations += 1;
            } else {
                last_priority = reported;
            }
        }

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.compact();
        }
    }

    fn reap(&mut self) {
        let entities = &self.entities;
        let reaped: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|id| entities.get(id).is_none_or(|e| e.destroyed))
            .collect();
        if reaped.is_empty() {
            return;
        }
        self.order
            .retain(|id| self.entities.get(id).is_some_and(|e| !e.destroyed));
        for id in reaped {
            self.entities.remove(&id);
            debug!(entity = %id, "entity reaped");
        }
    }

    /// Priority regressions observed so far. Non-zero means a behavior
    /// changed its priority after attachment.
    #[must_use]
    pub fn ordering_violations(&self) -> u64 {
        self.ordering_violations
    }

    // -- Events --

    /// Deliver an event to the entity's listeners and record it in the outbox.
    pub fn emit(&mut self, id: EntityId, event: EntityEvent) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        entity.listeners.dispatch(id, &event);
        self.outbox.push((id, event));
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<(EntityId, EntityEvent)> {
        std::mem::take(&mut self.outbox)
    }

    // -- Groups --

    /// Create a group, optionally nested under `parent`. A child of a paused
    /// group starts paused.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`] for an unknown parent.
    pub fn create_group(&mut self, parent: Option<GroupId>) -> Result<GroupId, WorldError> {
        self.groups.create(parent).ok_or_else(|| match parent {
            Some(parent_id) => WorldError::GroupNotFound(parent_id),
            None => unreachable!("root groups are always created"),
        })
    }

    /// Returns a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Move an entity into `group`, or out of any group with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::EntityNotFound`], [`WorldError::EntityDestroyed`],
    /// or [`WorldError::GroupNotFound`].
    pub fn set_group(&mut self, id: EntityId, group: Option<GroupId>) -> Result<(), WorldError> {
        if let Some(group_id) = group
            && !self.groups.contains(group_id)
        {
            return Err(WorldError::GroupNotFound(group_id));
        }
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        if entity.destroyed {
            return Err(WorldError::EntityDestroyed(id));
        }
        let previous = std::mem::replace(&mut entity.group, group);
        if let Some(old) = previous {
            self.groups.detach(old, id);
        }
        if let Some(new) = group {
            self.groups.attach(new, id);
        }
        Ok(())
    }

    /// Pause a group and its subgroups. Their entities stay alive but are
    /// not updated.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`].
    pub fn pause_group(&mut self, id: GroupId) -> Result<(), WorldError> {
        if self.groups.set_paused(id, true) {
            debug!(group = %id, "group paused");
            Ok(())
        } else {
            Err(WorldError::GroupNotFound(id))
        }
    }

    /// Resume a group and its subgroups.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`].
    pub fn resume_group(&mut self, id: GroupId) -> Result<(), WorldError> {
        if self.groups.set_paused(id, false) {
            debug!(group = %id, "group resumed");
            Ok(())
        } else {
            Err(WorldError::GroupNotFound(id))
        }
    }

    /// Returns `true` if the group exists and is paused.
    #[must_use]
    pub fn is_group_paused(&self, id: GroupId) -> bool {
        self.groups.is_paused(id)
    }

    /// Destroy a group, its subgroups, and every entity they own.
    ///
    /// Returns the number of entities destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::GroupNotFound`].
    pub fn destroy_group(&mut self, id: GroupId) -> Result<usize, WorldError> {
        if !self.groups.contains(id) {
            return Err(WorldError::GroupNotFound(id));
        }
        let owned = self.groups.remove_subtree(id);
        let destroyed = owned
            .into_iter()
            .filter(|&entity| self.destroy_entity(entity))
            .count();
        debug!(group = %id, destroyed, "group destroyed");
        Ok(destroyed)
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // -- Resources --

    /// Shared resources.
    #[must_use]
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Shared resources, mutably.
    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use arena_math::Vec2;

    use super::*;
    use crate::behavior::priority;
    use crate::events::EventKind;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    /// Records every hook it sees.
    struct Probe {
        label: &'static str,
        priority: i32,
        log: Log,
    }

    impl Probe {
        fn new(label: &'static str, priority: i32, log: &Log) -> Self {
            Self {
                label,
                priority,
                log: Rc::clone(log),
            }
        }

        fn record(&self, hook: &str) {
            self.log.borrow_mut().push(format!("{}:{hook}", self.label));
        }
    }

    impl Behavior for Probe {
        fn priority(&self) -> i32 {
            self.priority
        }
        fn init(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.record("init");
        }
        fn on_enable(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.record("enable");
        }
        fn on_disable(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.record("disable");
        }
        fn on_destroy(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.record("destroy");
        }
        fn update(&mut self, _ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            self.record("update");
        }
    }

    fn keyed(world: &mut World, id: EntityId, probe: Probe) -> BehaviorKey {
        let key = BehaviorKey::from_name(probe.label);
        world.add_behavior_keyed(id, key, Box::new(probe)).unwrap()
    }

    fn updates(log: &Log) -> Vec<String> {
        log.borrow()
            .iter()
            .filter(|entry| entry.ends_with(":update"))
            .cloned()
            .collect()
    }

    #[test]
    fn test_queued_behaviors_initialize_on_add() {
        let log = log();
        let mut world = World::new();
        let mut entity = world.create_entity(Transform2D::IDENTITY);
        entity.add_behavior_keyed(BehaviorKey::from_name("a"), Box::new(Probe::new("a", 0, &log)));
        assert!(log.borrow().is_empty());

        world.add_entity(entity, None).unwrap();
        assert_eq!(*log.borrow(), vec!["a:init", "a:enable"]);
    }

    #[test]
    fn test_live_entity_initializes_immediately_but_updates_next_tick() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        keyed(&mut world, id, Probe::new("a", 0, &log));
        assert_eq!(*log.borrow(), vec!["a:init", "a:enable"]);
        assert_eq!(world.entity(id).unwrap().pending_count(), 1);

        world.update(0.1);
        assert_eq!(updates(&log), vec!["a:update"]);
    }

    /// Attaches a sibling during its own update.
    struct Spawner {
        log: Log,
        spawned: bool,
    }

    impl Behavior for Spawner {
        fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            self.log.borrow_mut().push("spawner:update".into());
            if !self.spawned {
                self.spawned = true;
                let id = ctx.entity_id();
                let probe = Probe::new("late", -10, &self.log);
                ctx.world_mut()
                    .add_behavior_keyed(id, BehaviorKey::from_name("late"), Box::new(probe))
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_behavior_added_during_update_runs_next_tick() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world
            .add_behavior(
                id,
                Spawner {
                    log: Rc::clone(&log),
                    spawned: false,
                },
            )
            .unwrap();

        world.update(0.1);
        assert_eq!(updates(&log), vec!["spawner:update"]);

        log.borrow_mut().clear();
        world.update(0.1);
        // The late probe has a lower priority, so it now runs first.
        assert_eq!(updates(&log), vec!["late:update", "spawner:update"]);
    }

    #[test]
    fn test_live_list_sorted_after_every_update() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let priorities = [30, 10, 20, 10, 5, 40, 0, 20];
        for (tick, chunk) in priorities.chunks(3).enumerate() {
            for (n, &p) in chunk.iter().enumerate() {
                let label: &'static str = Box::leak(format!("p{tick}-{n}").into_boxed_str());
                keyed(&mut world, id, Probe::new(label, p, &log));
            }
            world.update(0.016);
            let live = world.entity(id).unwrap().live_priorities();
            assert!(live.windows(2).all(|w| w[0] <= w[1]), "unsorted: {live:?}");
        }
        assert_eq!(world.ordering_violations(), 0);
    }

    /// Destroys itself on its first update.
    struct OneShot {
        log: Log,
        priority: i32,
    }

    impl Behavior for OneShot {
        fn priority(&self) -> i32 {
            self.priority
        }
        fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            self.log.borrow_mut().push("oneshot:update".into());
            ctx.destroy_self();
        }
        fn on_destroy(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.log.borrow_mut().push("oneshot:destroy".into());
        }
    }

    #[test]
    fn test_self_destroy_does_not_skip_or_repeat_siblings() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        keyed(&mut world, id, Probe::new("a", 0, &log));
        world
            .add_behavior(
                id,
                OneShot {
                    log: Rc::clone(&log),
                    priority: 5,
                },
            )
            .unwrap();
        keyed(&mut world, id, Probe::new("b", 10, &log));
        log.borrow_mut().clear();

        world.update(0.1);
        assert_eq!(
            *log.borrow(),
            vec!["a:update", "oneshot:update", "oneshot:destroy", "b:update"]
        );
        assert_eq!(world.entity(id).unwrap().live_priorities(), vec![0, 10]);

        log.borrow_mut().clear();
        world.update(0.1);
        assert_eq!(updates(&log), vec!["a:update", "b:update"]);
    }

    /// Destroys a named sibling during update.
    struct Assassin {
        target: BehaviorKey,
    }

    impl Behavior for Assassin {
        fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            let id = ctx.entity_id();
            ctx.world_mut().remove_keyed(id, self.target);
        }
    }

    #[test]
    fn test_sibling_destroyed_during_update_is_skipped() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world
            .add_behavior(
                id,
                Assassin {
                    target: BehaviorKey::from_name("victim"),
                },
            )
            .unwrap();
        keyed(&mut world, id, Probe::new("victim", 10, &log));
        log.borrow_mut().clear();

        world.update(0.1);
        assert_eq!(*log.borrow(), vec!["victim:destroy"]);
    }

    #[test]
    fn test_destroy_entity_tears_down_in_reverse_order() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        keyed(&mut world, id, Probe::new("a", 0, &log));
        keyed(&mut world, id, Probe::new("b", 10, &log));
        keyed(&mut world, id, Probe::new("c", 20, &log));
        world.update(0.1);
        log.borrow_mut().clear();

        assert!(world.destroy_entity(id));
        assert!(!world.destroy_entity(id));
        assert_eq!(*log.borrow(), vec!["c:destroy", "b:destroy", "a:destroy"]);
    }

    /// Destroys its whole entity during update and logs its own teardown.
    struct Demolisher {
        log: Log,
    }

    impl Behavior for Demolisher {
        fn priority(&self) -> i32 {
            10
        }
        fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            ctx.destroy_entity();
        }
        fn on_destroy(&mut self, _ctx: &mut BehaviorCtx<'_>) {
            self.log.borrow_mut().push("demolisher:destroy".into());
        }
    }

    #[test]
    fn test_entity_destroyed_from_middle_behavior_keeps_reverse_order() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        keyed(&mut world, id, Probe::new("a", 0, &log));
        world
            .add_behavior(id, Demolisher { log: Rc::clone(&log) })
            .unwrap();
        keyed(&mut world, id, Probe::new("c", 20, &log));
        world.update(0.1);
        log.borrow_mut().clear();

        world.update(0.1);
        assert_eq!(
            *log.borrow(),
            vec!["a:update", "c:destroy", "demolisher:destroy", "a:destroy"]
        );
        assert!(world.entity(id).is_none());
    }

    #[test]
    fn test_destroy_event_emitted_once() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        world
            .entity_mut(id)
            .unwrap()
            .on(EventKind::Destroyed, move |_, _| *sink.borrow_mut() += 1);

        world.destroy_entity(id);
        world.destroy_entity(id);
        world.update(0.1);
        assert_eq!(*count.borrow(), 1);

        let destroyed = world
            .drain_events()
            .into_iter()
            .filter(|(_, e)| *e == EntityEvent::Destroyed)
            .count();
        assert_eq!(destroyed, 1);
    }

    #[test]
    fn test_destroyed_entity_is_reaped_after_update() {
        let mut world = World::new();
        let a = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let b = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.destroy_entity(a);
        assert!(world.entity(a).is_some());
        assert!(!world.is_alive(a));

        world.update(0.1);
        assert!(world.entity(a).is_none());
        assert_eq!(world.entity_ids(), &[b]);
        assert_eq!(world.entity_count(), 1);
    }

    /// Destroys its whole entity during update.
    struct SelfDestruct;

    impl Behavior for SelfDestruct {
        fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            ctx.destroy_entity();
        }
    }

    #[test]
    fn test_entity_destroyed_mid_pass_stops_its_update() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, SelfDestruct).unwrap();
        keyed(&mut world, id, Probe::new("after", 10, &log));
        log.borrow_mut().clear();

        world.update(0.1);
        assert_eq!(*log.borrow(), vec!["after:destroy"]);
        assert!(world.entity(id).is_none());
    }

    #[test]
    fn test_entities_update_in_registration_order() {
        let log = log();
        let mut world = World::new();
        for label in ["first", "second", "third"] {
            let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
            keyed(&mut world, id, Probe::new(label, 0, &log));
        }
        log.borrow_mut().clear();
        world.update(0.1);
        assert_eq!(
            updates(&log),
            vec!["first:update", "second:update", "third:update"]
        );
    }

    #[test]
    fn test_disable_enable_does_not_rerun_init() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let key = keyed(&mut world, id, Probe::new("a", 0, &log));
        log.borrow_mut().clear();

        assert_eq!(world.set_enabled_keyed(id, key, false), Ok(true));
        assert_eq!(world.set_enabled_keyed(id, key, false), Ok(false));
        world.update(0.1);
        assert_eq!(world.set_enabled_keyed(id, key, true), Ok(true));
        world.update(0.1);

        assert_eq!(*log.borrow(), vec!["a:disable", "a:enable", "a:update"]);
        assert_eq!(world.entity(id).unwrap().is_enabled(key), Some(true));
    }

    #[test]
    fn test_sleeping_behavior_is_skipped() {
        let log = log();
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let key = keyed(&mut world, id, Probe::new("a", 0, &log));
        world.set_sleeping_keyed(id, key, true).unwrap();
        log.borrow_mut().clear();

        world.update(0.1);
        assert!(log.borrow().is_empty());
        world.set_sleeping_keyed(id, key, false).unwrap();
        world.update(0.1);
        assert_eq!(updates(&log), vec!["a:update"]);
    }

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    impl Behavior for Counter {
        fn update(&mut self, _ctx: &mut BehaviorCtx<'_>, _delta: f32) {
            self.value += 1;
        }
    }

    #[test]
    fn test_get_absent_behavior() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        assert!(world.get::<Counter>(id).is_none());
        assert!(world.get::<Counter>(EntityId::from_raw(999)).is_none());
    }

    #[test]
    fn test_require_is_get_or_create() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.require::<Counter>(id).unwrap().value = 7;
        assert_eq!(world.require::<Counter>(id).unwrap().value, 7);
        assert_eq!(world.entity(id).unwrap().behavior_count(), 1);
    }

    #[derive(Debug, PartialEq)]
    enum BuildError {
        World(WorldError),
        Refused,
    }

    impl From<WorldError> for BuildError {
        fn from(err: WorldError) -> Self {
            Self::World(err)
        }
    }

    #[test]
    fn test_try_require_propagates_constructor_error() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let result = world.try_require_with::<Counter, BuildError>(id, || Err(BuildError::Refused));
        assert_eq!(result.err(), Some(BuildError::Refused));

        let missing = world.try_require_with::<Counter, BuildError>(EntityId::from_raw(42), || {
            Ok(Counter::default())
        });
        assert_eq!(
            missing.err(),
            Some(BuildError::World(WorldError::EntityNotFound(EntityId::from_raw(42))))
        );
    }

    #[test]
    fn test_remove_behavior() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, Counter::default()).unwrap();
        assert!(world.remove::<Counter>(id));
        assert!(!world.remove::<Counter>(id));
        assert!(world.get::<Counter>(id).is_none());
    }

    #[test]
    fn test_with_behavior_reports_busy_for_running_behavior() {
        struct Reentrant {
            result: Option<Result<(), WorldError>>,
        }
        impl Behavior for Reentrant {
            fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
                let id = ctx.entity_id();
                self.result = Some(ctx.world_mut().with_behavior::<Reentrant, _>(id, |_, _| ()));
            }
        }

        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, Reentrant { result: None }).unwrap();
        world.update(0.1);
        let outcome = world.get::<Reentrant>(id).unwrap().result.clone();
        assert_eq!(
            outcome,
            Some(Err(WorldError::BehaviorBusy {
                entity: id,
                key: BehaviorKey::of::<Reentrant>(),
            }))
        );
    }

    /// Reports a priority that changes after attachment.
    struct Drifting {
        priority: Rc<RefCell<i32>>,
    }

    impl Behavior for Drifting {
        fn priority(&self) -> i32 {
            *self.priority.borrow()
        }
    }

    #[test]
    fn test_priority_regression_is_counted() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let shared = Rc::new(RefCell::new(50));
        world
            .add_behavior(
                id,
                Drifting {
                    priority: Rc::clone(&shared),
                },
            )
            .unwrap();
        world.add_behavior(id, Counter::default()).unwrap();
        world.update(0.1);
        assert_eq!(world.ordering_violations(), 0);

        // Counter (priority 0) runs first; Drifting now claims -5.
        *shared.borrow_mut() = -5;
        world.update(0.1);
        assert_eq!(world.ordering_violations(), 1);
        assert_eq!(world.get::<Counter>(id).unwrap().value, 2);
    }

    #[test]
    fn test_paused_group_skips_updates() {
        let mut world = World::new();
        let root = world.create_group(None).unwrap();
        let child = world.create_group(Some(root)).unwrap();
        let id = world.spawn(Transform2D::IDENTITY, Some(child)).unwrap();
        world.add_behavior(id, Counter::default()).unwrap();

        world.pause_group(root).unwrap();
        world.update(0.1);
        assert_eq!(world.get::<Counter>(id).unwrap().value, 0);
        assert!(world.is_alive(id));
        assert!(!world.is_updating(id));

        world.resume_group(root).unwrap();
        world.update(0.1);
        assert_eq!(world.get::<Counter>(id).unwrap().value, 1);
    }

    #[test]
    fn test_destroy_group_is_transitive() {
        let mut world = World::new();
        let root = world.create_group(None).unwrap();
        let child = world.create_group(Some(root)).unwrap();
        let a = world.spawn(Transform2D::IDENTITY, Some(root)).unwrap();
        let b = world.spawn(Transform2D::IDENTITY, Some(child)).unwrap();
        let outside = world.spawn(Transform2D::IDENTITY, None).unwrap();

        assert_eq!(world.destroy_group(root), Ok(2));
        assert!(!world.is_alive(a));
        assert!(!world.is_alive(b));
        assert!(world.is_alive(outside));
        assert_eq!(world.group_count(), 0);
    }

    #[test]
    fn test_destroyed_entity_leaves_group_immediately() {
        let mut world = World::new();
        let group = world.create_group(None).unwrap();
        let id = world.spawn(Transform2D::IDENTITY, Some(group)).unwrap();
        assert_eq!(world.group(group).unwrap().entities, vec![id]);
        world.destroy_entity(id);
        assert!(world.group(group).unwrap().entities.is_empty());
    }

    #[test]
    fn test_entity_belongs_to_one_group() {
        let mut world = World::new();
        let g1 = world.create_group(None).unwrap();
        let g2 = world.create_group(None).unwrap();
        let id = world.spawn(Transform2D::IDENTITY, Some(g1)).unwrap();
        world.set_group(id, Some(g2)).unwrap();
        assert!(world.group(g1).unwrap().entities.is_empty());
        assert_eq!(world.group(g2).unwrap().entities, vec![id]);
        assert_eq!(world.entity(id).unwrap().group(), Some(g2));
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let mut world = World::new();
        let err = world.spawn(Transform2D::IDENTITY, Some(GroupId(77)));
        assert_eq!(err, Err(WorldError::GroupNotFound(GroupId(77))));
    }

    #[test]
    fn test_entity_ids_are_monotonic() {
        let mut world = World::new();
        let a = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.destroy_entity(a);
        world.update(0.1);
        let b = world.spawn(Transform2D::IDENTITY, None).unwrap();
        assert!(b.id() > a.id());
        assert_eq!(world.allocated_count(), 2);
    }

    #[test]
    fn test_add_behavior_to_destroyed_entity_fails() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.destroy_entity(id);
        assert_eq!(
            world.add_behavior(id, Counter::default()),
            Err(WorldError::EntityDestroyed(id))
        );
    }

    #[test]
    fn test_context_moves_entity() {
        struct Push;
        impl Behavior for Push {
            fn priority(&self) -> i32 {
                priority::MOVER
            }
            fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
                let next = ctx.position() + Vec2::new(10.0, 0.0) * delta;
                ctx.set_position(next);
            }
        }

        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, Push).unwrap();
        world.update(0.5);
        assert_eq!(world.entity(id).unwrap().position(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_listeners_cleared_on_destroy() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.entity_mut(id).unwrap().on_any(|_, _| {});
        world.destroy_entity(id);
        assert!(world.entity(id).unwrap().listeners.is_empty());
    }
}
