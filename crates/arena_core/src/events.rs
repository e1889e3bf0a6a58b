//! Typed per-entity events.
//!
//! Each [`Entity`](crate::Entity) carries an [`EventChannel`] of listeners.
//! [`World::emit`](crate::World::emit) delivers an event to the entity's
//! matching listeners synchronously and also queues it in the world outbox
//! for collaborators (networking, replay) that drain it once per tick.

use arena_math::Vec2;

use crate::entity::EntityId;

/// Something that happened to an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// The entity was added to the world.
    Added,
    /// The entity was destroyed. Emitted exactly once.
    Destroyed,
    /// A state machine on the entity entered `state`.
    StateEntered(String),
    /// A state machine on the entity left `state`.
    StateExited(String),
    /// A collision bridge on the entity hit something.
    Hit {
        /// The entity on the other side of the contact, when it has a bridge.
        other: Option<EntityId>,
    },
    /// The entity lost hit points.
    Damaged {
        /// Damage applied.
        amount: f32,
        /// Hit points left afterwards.
        remaining: f32,
    },
    /// The entity regained hit points.
    Healed {
        /// Healing applied after clamping.
        amount: f32,
        /// Hit points afterwards.
        current: f32,
    },
    /// The entity was moved instantly.
    Teleported {
        /// Position before the jump.
        from: Vec2,
        /// Position after the jump.
        to: Vec2,
    },
    /// Gameplay-defined event, e.g. a cosmetic trigger.
    Custom(String),
}

/// Discriminant of [`EntityEvent`], used to filter listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`EntityEvent::Added`].
    Added,
    /// [`EntityEvent::Destroyed`].
    Destroyed,
    /// [`EntityEvent::StateEntered`].
    StateEntered,
    /// [`EntityEvent::StateExited`].
    StateExited,
    /// [`EntityEvent::Hit`].
    Hit,
    /// [`EntityEvent::Damaged`].
    Damaged,
    /// [`EntityEvent::Healed`].
    Healed,
    /// [`EntityEvent::Teleported`].
    Teleported,
    /// [`EntityEvent::Custom`].
    Custom,
}

impl EntityEvent {
    /// Returns the event's kind.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Added => EventKind::Added,
            Self::Destroyed => EventKind::Destroyed,
            Self::StateEntered(_) => EventKind::StateEntered,
            Self::StateExited(_) => EventKind::StateExited,
            Self::Hit { .. } => EventKind::Hit,
            Self::Damaged { .. } => EventKind::Damaged,
            Self::Healed { .. } => EventKind::Healed,
            Self::Teleported { .. } => EventKind::Teleported,
            Self::Custom(_) => EventKind::Custom,
        }
    }
}

/// Handle returned by [`Entity::on`](crate::Entity::on), used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(EntityId, &EntityEvent)>;

/// Subscriber list for one entity.
#[derive(Default)]
pub struct EventChannel {
    next_id: u64,
    listeners: Vec<(ListenerId, Option<EventKind>, Listener)>,
}

impl EventChannel {
    /// Create an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one kind of event, or to every event when `kind` is `None`.
    pub fn subscribe(
        &mut self,
        kind: Option<EventKind>,
        listener: impl FnMut(EntityId, &EntityEvent) + 'static,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `true` if it was subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every matching listener, in subscription order.
    pub fn dispatch(&mut self, entity: EntityId, event: &EntityEvent) {
        let kind = event.kind();
        for (_, filter, listener) in &mut self.listeners {
            if filter.is_none_or(|k| k == kind) {
                listener(entity, event);
            }
        }
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Returns the number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
