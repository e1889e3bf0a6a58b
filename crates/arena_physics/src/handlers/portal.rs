use arena_core::{BehaviorCtx, EntityEvent, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bridge::{ColliderBody, Contact, ContactHandler, move_entity};

/// Teleports whatever enters it to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    /// Where touching entities land.
    pub destination: Vec2,
}

impl Portal {
    /// Send touching entities to `destination`.
    #[must_use]
    pub fn new(destination: Vec2) -> Self {
        Self { destination }
    }
}

impl ContactHandler for Portal {
    fn collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        let Some(target) = contact.other_entity() else {
            return;
        };
        let Some(from) = ctx.world().entity(target).map(|e| e.position()) else {
            return;
        };
        let to = self.destination;
        move_entity(ctx.world_mut(), target, to);
        ctx.world_mut()
            .emit(target, EntityEvent::Teleported { from, to });
        debug!(portal = %ctx.entity_id(), %target, "teleported");
    }
}
