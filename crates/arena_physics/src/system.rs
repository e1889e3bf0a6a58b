//! The collision updater.
//!
//! Runs once per tick after every behavior update: steps the physics
//! backend, writes pulled body positions back into their entities, and
//! dispatches every reported contact to the bridges on both sides.

use arena_core::{Updater, World};
use tracing::{debug, trace};

use crate::backend::{BodyId, ContactEvent, Physics, PhysicsBackend};
use crate::bridge::Contact;
use crate::registry::{BodyLink, BodyRegistry};

/// Steps physics and dispatches contacts.
#[derive(Debug, Default)]
pub struct CollisionSystem {
    steps: u64,
    dispatched: u64,
    skipped: u64,
}

impl CollisionSystem {
    /// Create the system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `backend` and an empty [`BodyRegistry`] into the world.
    ///
    /// Bridges enabled before this call stay detached until re-enabled.
    pub fn install(world: &mut World, backend: impl PhysicsBackend + 'static) {
        world.resources_mut().insert(Physics::new(backend));
        world.resources_mut().get_or_default::<BodyRegistry>();
    }

    /// Physics steps taken.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Handler invocations so far.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Invocations that found their bridge busy or gone.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn write_back(world: &mut World) {
        let pulled = world
            .resources()
            .get::<BodyRegistry>()
            .map(BodyRegistry::pulled)
            .unwrap_or_default();
        for (body, entity) in pulled {
            let position = world
                .resources()
                .get::<Physics>()
                .and_then(|physics| physics.position(body));
            if let Some(position) = position
                && let Some(target) = world.entity_mut(entity)
            {
                target.set_position(position);
            }
        }
    }

    /// Dispatch one pair: A's handler if A listens for B's category, then
    /// B's handler if B listens for A's. Links are looked up again before
    /// each side, so a handler that removes a body is respected.
    fn dispatch_pair(&mut self, world: &mut World, event: &ContactEvent) {
        let link_a = lookup(world, event.a);
        let link_b = lookup(world, event.b);

        if let Some(a) = link_a
            && a.event_mask.intersects(event.category_b)
        {
            let contact = Contact {
                phase: event.phase,
                body: event.a,
                other_body: event.b,
                other_category: event.category_b,
                other: link_b.map(|b| b.peer()),
                penetration: event.penetration,
            };
            self.invoke(world, &a, &contact);
        }

        if let Some(b) = lookup(world, event.b)
            && b.event_mask.intersects(event.category_a)
        {
            let contact = Contact {
                phase: event.phase,
                body: event.b,
                other_body: event.a,
                other_category: event.category_a,
                other: lookup(world, event.a).or(link_a).map(|a| a.peer()),
                penetration: -event.penetration,
            };
            self.invoke(world, &b, &contact);
        }
    }

    fn invoke(&mut self, world: &mut World, link: &BodyLink, contact: &Contact) {
        match (link.dispatch)(world, link.entity, link.key, contact) {
            Ok(()) => self.dispatched += 1,
            Err(err) => {
                self.skipped += 1;
                debug!(entity = %link.entity, error = %err, "contact not delivered");
            }
        }
    }
}

fn lookup(world: &World, body: BodyId) -> Option<BodyLink> {
    world.resources().get::<BodyRegistry>()?.get(body).copied()
}

impl Updater for CollisionSystem {
    fn name(&self) -> &str {
        "collision"
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        let Some(physics) = world.resources_mut().get_mut::<Physics>() else {
            return;
        };
        let events = physics.step(delta);
        self.steps += 1;
        trace!(events = events.len(), "physics stepped");

        Self::write_back(world);
        for event in &events {
            self.dispatch_pair(world, event);
        }
    }
}
