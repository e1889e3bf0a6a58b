use arena_core::BehaviorCtx;
use serde::{Deserialize, Serialize};

use crate::bridge::{ColliderBody, Contact, ContactHandler, move_entity};

/// Shoves whatever it touches `strength` units away along the contact
/// normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    /// Displacement applied along the contact normal.
    pub strength: f32,
}

impl Knockback {
    /// Push touching entities by `strength`.
    #[must_use]
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

impl ContactHandler for Knockback {
    fn collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        let Some(target) = contact.other_entity() else {
            return;
        };
        let Some(position) = ctx.world().entity(target).map(|e| e.position()) else {
            return;
        };
        let direction = contact.penetration.normalize_or_zero();
        move_entity(ctx.world_mut(), target, position + direction * self.strength);
    }
}
