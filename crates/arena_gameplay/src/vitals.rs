//! Death and respawn for downable entities.

use arena_core::{Behavior, BehaviorCtx};
use arena_fsm::FsmExt;
use arena_physics::Health;
use tracing::{debug, info};

/// Trigger fired when the entity runs out of hit points.
pub const DIE: &str = "die";

/// Watches a downable [`Health`] and fires [`DIE`] on the entity's state
/// machine when it reaches zero. Re-enabling refills health, so a state
/// that enables `Vitals` on entry doubles as the respawn.
#[derive(Debug, Default)]
pub struct Vitals {
    downs: u32,
}

impl Vitals {
    /// A fresh watcher that has not seen a death yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the entity went down.
    #[must_use]
    pub fn downs(&self) -> u32 {
        self.downs
    }
}

impl Behavior for Vitals {
    fn on_enable(&mut self, ctx: &mut BehaviorCtx<'_>) {
        let entity = ctx.entity_id();
        if let Some(health) = ctx.world_mut().get_mut::<Health>(entity) {
            health.restore();
        }
        if self.downs > 0 {
            info!(%entity, downs = self.downs, "respawned");
        }
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
        let entity = ctx.entity_id();
        let down = ctx.world().get::<Health>(entity).is_some_and(Health::is_dead);
        if !down {
            return;
        }
        match ctx.world_mut().trigger(entity, DIE) {
            Ok(outcome) if outcome.accepted() => {
                self.downs += 1;
                info!(%entity, "down");
            }
            Ok(outcome) => debug!(%entity, ?outcome, "death trigger ignored"),
            Err(err) => debug!(%entity, %err, "death trigger failed"),
        }
    }
}
