use arena_core::BehaviorCtx;
use serde::{Deserialize, Serialize};

use crate::bridge::{ColliderBody, Contact, ContactHandler};
use crate::health::Health;

/// Heals whatever stands in it by `amount` on every active contact.
///
/// Active contacts are reported once per physics sub-step, so the healing
/// rate scales with the sub-step count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealZone {
    /// Hit points restored per sub-step of contact.
    pub amount: f32,
}

impl HealZone {
    /// Heal `amount` per sub-step.
    #[must_use]
    pub fn new(amount: f32) -> Self {
        Self { amount }
    }
}

impl ContactHandler for HealZone {
    fn active_collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        if let Some(target) = contact.other_entity() {
            Health::apply_heal(ctx.world_mut(), target, self.amount);
        }
    }
}
