use arena_core::BehaviorCtx;
use serde::{Deserialize, Serialize};

use super::strike;
use crate::bridge::{ColliderBody, Contact, ContactHandler};

/// Full damage to targets within `half_angle` radians of the owner's facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeDamage {
    /// Damage dealt inside the cone.
    pub power: f32,
    /// Half the opening angle, in radians.
    pub half_angle: f32,
}

impl ConeDamage {
    /// Cone of `half_angle` around the entity's facing.
    #[must_use]
    pub fn new(power: f32, half_angle: f32) -> Self {
        Self { power, half_angle }
    }
}

impl ContactHandler for ConeDamage {
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
        if ctx.transform().angle_to(position) <= self.half_angle {
            strike(ctx, target, self.power);
        }
    }
}
