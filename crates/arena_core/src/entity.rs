//! Entity identity and per-entity behavior storage.
//!
//! An [`Entity`] is an actor: a transform, an ordered list of behavior
//! slots, and a listener channel. Behavior slots are split into a sorted
//! live prefix that the tick updates and a pending tail that is merged at
//! the start of the entity's next update. Destroyed slots stay in place as
//! tombstones until the end of that update.

use std::collections::HashMap;
use std::fmt;

use arena_math::{Transform2D, Vec2};
use serde::{Deserialize, Serialize};

use crate::behavior::{Behavior, BehaviorKey};
use crate::events::{EntityEvent, EventChannel, EventKind, ListenerId};
use crate::group::GroupId;

/// A unique entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The null / invalid entity sentinel.
    pub const INVALID: EntityId = EntityId(0);

    /// Create an entity id from a raw `u64`.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a valid (non-zero) id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates monotonically increasing entity ids.
///
/// Owned by the [`World`](crate::World); never reset during a run, so an id
/// is never reused while the simulation lives.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. Ids start at 1 (0 is [`EntityId::INVALID`]).
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh id.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Returns the number of ids allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage for one attached behavior.
pub(crate) struct BehaviorSlot {
    pub(crate) key: BehaviorKey,
    pub(crate) name: &'static str,
    /// Attachment order, used to pick the authoritative instance of a key.
    pub(crate) seq: u64,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    /// Enabled state the last `on_enable`/`on_disable` hook reported.
    pub(crate) hooked_enabled: bool,
    pub(crate) sleeping: bool,
    pub(crate) initialized: bool,
    pub(crate) destroyed: bool,
    /// `on_destroy` has run; the behavior is gone or about to be dropped.
    pub(crate) finalized: bool,
    /// `None` while a hook of this behavior is executing.
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

/// An actor in the simulation.
///
/// Entities are created with [`World::create_entity`](crate::World::create_entity),
/// configured (behaviors queued with [`Entity::add_behavior`]), and then made
/// live with [`World::add_entity`](crate::World::add_entity).
pub struct Entity {
    id: EntityId,
    transform: Transform2D,
    pub(crate) active: bool,
    pub(crate) destroyed: bool,
    /// Added to a world and not yet destroyed.
    pub(crate) live: bool,
    pub(crate) group: Option<GroupId>,
    pub(crate) slots: Vec<BehaviorSlot>,
    /// Slots `[0, live_len)` are sorted and updated; the rest are pending.
    pub(crate) live_len: usize,
    /// Checked-out slot whose checkin resumes a reverse teardown.
    pub(crate) teardown_at: Option<usize>,
    index: HashMap<BehaviorKey, usize>,
    next_seq: u64,
    pub(crate) listeners: EventChannel,
}

impl Entity {
    pub(crate) fn new(id: EntityId, transform: Transform2D) -> Self {
        Self {
            id,
            transform,
            active: true,
            destroyed: false,
            live: false,
            group: None,
            slots: Vec::new(),
            live_len: 0,
            teardown_at: None,
            index: HashMap::new(),
            next_seq: 0,
            listeners: EventChannel::new(),
        }
    }

    /// Returns the entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the transform.
    #[must_use]
    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    /// Returns the transform mutably.
    pub fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }

    /// Returns the position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Sets the position.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    /// Returns the rotation in radians.
    #[must_use]
    pub fn rotation(&self) -> f32 {
        self.transform.rotation
    }

    /// Sets the rotation in radians.
    pub fn set_rotation(&mut self, rotation: f32) {
        self.transform.rotation = rotation;
    }

    /// Returns the entity's own active flag (group pausing is tracked separately).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sets the entity's own active flag. Inactive entities are not updated.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Returns `true` once the entity has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns `true` while the entity is in a world and not destroyed.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Returns the owning group, if any.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Queue a behavior under its type's default key.
    ///
    /// This is meant for entities that are not yet in a world; queued
    /// behaviors are initialized by [`World::add_entity`](crate::World::add_entity).
    /// On a live entity use [`World::add_behavior`](crate::World::add_behavior)
    /// so `init` runs immediately.
    pub fn add_behavior<B: Behavior>(&mut self, behavior: B) -> BehaviorKey {
        let key = BehaviorKey::of::<B>();
        self.push_slot(key, Box::new(behavior));
        key
    }

    /// Queue a boxed behavior under an explicit key.
    pub fn add_behavior_keyed(&mut self, key: BehaviorKey, behavior: Box<dyn Behavior>) {
        self.push_slot(key, behavior);
    }

    /// Returns the authoritative instance of `T`.
    ///
    /// `None` if it was never added, was destroyed, or is currently running
    /// one of its own hooks.
    #[must_use]
    pub fn get<T: Behavior>(&self) -> Option<&T> {
        self.get_keyed(BehaviorKey::of::<T>())
    }

    /// Mutable variant of [`Entity::get`].
    pub fn get_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        self.get_keyed_mut(BehaviorKey::of::<T>())
    }

    /// Returns the authoritative instance registered under `key`, as `T`.
    #[must_use]
    pub fn get_keyed<T: Behavior>(&self, key: BehaviorKey) -> Option<&T> {
        let idx = self.find_slot(key)?;
        self.slots[idx]
            .behavior
            .as_deref()?
            .as_any()
            .downcast_ref::<T>()
    }

    /// Mutable variant of [`Entity::get_keyed`].
    pub fn get_keyed_mut<T: Behavior>(&mut self, key: BehaviorKey) -> Option<&mut T> {
        let idx = self.find_slot(key)?;
        self.slots[idx]
            .behavior
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Returns `true` if a non-destroyed behavior is registered under `key`.
    #[must_use]
    pub fn has(&self, key: BehaviorKey) -> bool {
        self.find_slot(key).is_some()
    }

    /// Returns the enabled flag of the behavior under `key`.
    #[must_use]
    pub fn is_enabled(&self, key: BehaviorKey) -> Option<bool> {
        self.find_slot(key).map(|idx| self.slots[idx].enabled)
    }

    /// Returns the sleeping flag of the behavior under `key`.
    #[must_use]
    pub fn is_sleeping(&self, key: BehaviorKey) -> Option<bool> {
        self.find_slot(key).map(|idx| self.slots[idx].sleeping)
    }

    /// Number of non-destroyed behaviors, live and pending.
    #[must_use]
    pub fn behavior_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.destroyed).count()
    }

    /// Number of behaviors queued for the next update.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.slots.len() - self.live_len
    }

    /// Priorities of the live, non-destroyed behaviors in update order.
    #[must_use]
    pub fn live_priorities(&self) -> Vec<i32> {
        self.slots[..self.live_len]
            .iter()
            .filter(|s| !s.destroyed)
            .map(|s| s.priority)
            .collect()
    }

    /// Names of the live, non-destroyed behaviors in update order.
    #[must_use]
    pub fn live_names(&self) -> Vec<&'static str> {
        self.slots[..self.live_len]
            .iter()
            .filter(|s| !s.destroyed)
            .map(|s| s.name)
            .collect()
    }

    /// Subscribe to one kind of event.
    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(EntityId, &EntityEvent) + 'static,
    ) -> ListenerId {
        self.listeners.subscribe(Some(kind), listener)
    }

    /// Subscribe to every event.
    pub fn on_any(&mut self, listener: impl FnMut(EntityId, &EntityEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(None, listener)
    }

    /// Unsubscribe. Returns `true` if the listener existed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Deliver an event to this entity's listeners only.
    ///
    /// [`World::emit`](crate::World::emit) also records it in the outbox.
    pub fn emit(&mut self, event: &EntityEvent) {
        let id = self.id;
        self.listeners.dispatch(id, event);
    }

    pub(crate) fn push_slot(&mut self, key: BehaviorKey, behavior: Box<dyn Behavior>) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self.slots.len();
        self.slots.push(BehaviorSlot {
            key,
            name: behavior.name(),
            seq,
            priority: behavior.priority(),
            enabled: true,
            hooked_enabled: false,
            sleeping: false,
            initialized: false,
            destroyed: false,
            finalized: false,
            behavior: Some(behavior),
        });
        self.index.insert(key, idx);
        idx
    }

    /// Locate the authoritative slot for `key`, scanning when the index is stale.
    pub(crate) fn find_slot(&self, key: BehaviorKey) -> Option<usize> {
        if let Some(&idx) = self.index.get(&key)
            && let Some(slot) = self.slots.get(idx)
            && slot.key == key
            && !slot.destroyed
        {
            return Some(idx);
        }
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.key == key && !s.destroyed)
            .max_by_key(|(_, s)| s.seq)
            .map(|(idx, _)| idx)
    }

    /// Merge pending slots into the live list and restore priority order.
    ///
    /// `sort_by_key` is stable, so equal priorities keep attachment order.
    pub(crate) fn flush_pending(&mut self) {
        if self.live_len == self.slots.len() {
            return;
        }
        self.slots.sort_by_key(|s| s.priority);
        self.live_len = self.slots.len();
        self.rebuild_index();
    }

    /// Drop tombstoned slots, keeping order.
    pub(crate) fn compact(&mut self) {
        if !self.slots.iter().any(|s| s.destroyed) {
            return;
        }
        let live_len = self.live_len;
        let mut kept_live = 0;
        let mut position = 0;
        self.slots.retain(|slot| {
            let keep = !slot.destroyed;
            if keep && position < live_len {
                kept_live += 1;
            }
            position += 1;
            keep
        });
        self.live_len = kept_live;
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.destroyed {
                continue;
            }
            let newer = match self.index.get(&slot.key) {
                Some(&existing) => self.slots[existing].seq < slot.seq,
                None => true,
            };
            if newer {
                self.index.insert(slot.key, idx);
            }
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("transform", &self.transform)
            .field("active", &self.active)
            .field("destroyed", &self.destroyed)
            .field("behaviors", &self.behavior_count())
            .finish()
    }
}
