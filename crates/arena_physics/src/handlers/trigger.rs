use arena_core::{BehaviorCtx, EntityEvent};
use serde::{Deserialize, Serialize};

use crate::bridge::{ColliderBody, Contact, ContactHandler};

/// Emits [`EntityEvent::Custom`] from its owner when something enters.
///
/// A `once` trigger disables its bridge after firing, which also removes
/// its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Tag carried by the emitted [`EntityEvent::Custom`].
    pub event: String,
    /// Disable the trigger after the first fire.
    pub once: bool,
    fired: u32,
}

impl Trigger {
    /// Emit `event` on every contact start.
    #[must_use]
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            once: false,
            fired: 0,
        }
    }

    /// Fire only once.
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// How many times the trigger has fired.
    #[must_use]
    pub fn fired(&self) -> u32 {
        self.fired
    }
}

impl ContactHandler for Trigger {
    fn collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        self.fired += 1;
        ctx.emit(EntityEvent::Custom(self.event.clone()));
        if self.once {
            ctx.set_enabled(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{Transform2D, Vec2};

    use super::*;
    use crate::bridge::Bridge;
    use crate::category::Team;
    use crate::handlers::fixtures::{dummy, engine, zone};

    #[test]
    fn test_once_trigger_fires_once_and_detaches() {
        let mut engine = engine();
        dummy(&mut engine, Vec2::new(0.5, 0.0), 10.0, Team(1));
        dummy(&mut engine, Vec2::new(-0.5, 0.0), 10.0, Team(1));
        let gate = zone(&mut engine, Transform2D::IDENTITY, 1.0, Trigger::new("gate").once());
        engine.world_mut().drain_events();

        engine.tick(0.1);
        let world = engine.world_mut();
        let bridge = world.get::<Bridge<Trigger>>(gate).unwrap();
        assert_eq!(bridge.handler().fired(), 1);
        assert!(bridge.body_id().is_none());
        let custom: Vec<_> = world
            .drain_events()
            .into_iter()
            .filter(|(id, _)| *id == gate)
            .collect();
        assert_eq!(custom, vec![(gate, EntityEvent::Custom("gate".into()))]);
    }

    #[test]
    fn test_repeating_trigger() {
        let mut engine = engine();
        dummy(&mut engine, Vec2::new(0.5, 0.0), 10.0, Team(1));
        let gate = zone(&mut engine, Transform2D::IDENTITY, 1.0, Trigger::new("step"));

        engine.tick(0.1);
        engine.tick(0.1);
        let bridge = engine.world().get::<Bridge<Trigger>>(gate).unwrap();
        // One start contact; continuing contact does not re-fire.
        assert_eq!(bridge.handler().fired(), 1);
        assert!(bridge.body_id().is_some());
    }
}
