use std::collections::BTreeMap;

use arena_core::{BehaviorCtx, EntityEvent};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bridge::{ColliderBody, Contact, ContactHandler};
use crate::category::Team;

/// A capture point.
///
/// Every active contact with a teamed body adds `rate` to that team's
/// progress. The first team to reach `required` takes ownership, progress
/// resets, and the zone emits `captured:<team id>`. The owning team makes
/// no progress on its own point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureZone {
    /// Progress per second for a team alone in the zone.
    pub rate: f32,
    /// Progress needed to capture.
    pub required: f32,
    progress: BTreeMap<Team, f32>,
    owner: Option<Team>,
}

impl CaptureZone {
    /// An unowned zone.
    #[must_use]
    pub fn new(rate: f32, required: f32) -> Self {
        Self {
            rate,
            required,
            progress: BTreeMap::new(),
            owner: None,
        }
    }

    /// Current owner.
    #[must_use]
    pub fn owner(&self) -> Option<Team> {
        self.owner
    }

    /// Progress accumulated by `team`.
    #[must_use]
    pub fn progress(&self, team: Team) -> f32 {
        self.progress.get(&team).copied().unwrap_or(0.0)
    }
}

impl ContactHandler for CaptureZone {
    fn active_collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        let Some(team) = contact.other.and_then(|peer| peer.team) else {
            return;
        };
        if self.owner == Some(team) {
            return;
        }
        let progress = self.progress.entry(team).or_insert(0.0);
        *progress += self.rate;
        if *progress < self.required {
            return;
        }
        self.owner = Some(team);
        self.progress.clear();
        info!(zone = %ctx.entity_id(), %team, "zone captured");
        ctx.emit(EntityEvent::Custom(format!("captured:{}", team.0)));
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{Engine, EntityId, Transform2D, Vec2};

    use super::*;
    use crate::handlers::fixtures::{dummy, engine, zone};
    use crate::{Bridge, CollisionCategory, Inert, Shape};

    fn zone_state(engine: &Engine, id: EntityId) -> CaptureZone {
        engine
            .world()
            .get::<Bridge<CaptureZone>>(id)
            .unwrap()
            .handler()
            .clone()
    }

    #[test]
    fn test_capture_after_required_progress() {
        let mut engine = engine();
        dummy(&mut engine, Vec2::new(0.5, 0.0), 10.0, Team(3));
        let point = zone(&mut engine, Transform2D::IDENTITY, 1.0, CaptureZone::new(1.0, 3.0));
        engine.world_mut().drain_events();

        // The first tick only starts the contact.
        engine.tick(0.1);
        engine.tick(0.1);
        engine.tick(0.1);
        assert_eq!(zone_state(&engine, point).progress(Team(3)), 2.0);
        assert_eq!(zone_state(&engine, point).owner(), None);

        engine.tick(0.1);
        let state = zone_state(&engine, point);
        assert_eq!(state.owner(), Some(Team(3)));
        assert_eq!(state.progress(Team(3)), 0.0);
        assert!(
            engine
                .world_mut()
                .drain_events()
                .contains(&(point, EntityEvent::Custom("captured:3".into())))
        );

        engine.tick(0.1);
        assert_eq!(zone_state(&engine, point).progress(Team(3)), 0.0);
    }

    #[test]
    fn test_untagged_bodies_do_not_capture() {
        let mut engine = engine();
        let world = engine.world_mut();
        let id = world
            .spawn(Transform2D::from_position(Vec2::new(0.5, 0.0)), None)
            .unwrap();
        let body = ColliderBody::new(Shape::Circle { radius: 0.5 }, CollisionCategory::PLAYER)
            .with_event_mask(CollisionCategory::NONE);
        world.add_behavior(id, Bridge::new(body, Inert)).unwrap();
        let point = zone(&mut engine, Transform2D::IDENTITY, 1.0, CaptureZone::new(1.0, 1.0));

        engine.tick(0.1);
        engine.tick(0.1);
        assert_eq!(zone_state(&engine, point).owner(), None);
    }
}
