//! Steering towards waypoints.

use arena_core::{Behavior, BehaviorCtx, EntityEvent, Vec2, priority};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::mover::Mover;

/// Distance at which a waypoint counts as reached.
const ARRIVAL_RADIUS: f32 = 1e-3;

/// Step from `current` towards `target` by at most `max_delta`.
#[inline]
#[must_use]
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let diff = target - current;
    let dist = diff.length();
    if dist <= max_delta || dist == 0.0 {
        target
    } else {
        current + diff / dist * max_delta
    }
}

/// Steers the sibling [`Mover`] through a list of waypoints.
///
/// Runs before the mover, so the velocity it sets is applied the same tick.
/// The last step is shortened so the entity lands on the waypoint instead
/// of overshooting it. A patrolling driver loops; otherwise it stops at the
/// last waypoint and emits `arrived`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Top speed in units per second.
    pub speed: f32,
    waypoints: Vec<Vec2>,
    next: usize,
    patrol: bool,
}

impl Driver {
    /// Head for one point.
    #[must_use]
    pub fn towards(target: Vec2, speed: f32) -> Self {
        Self {
            speed,
            waypoints: vec![target],
            next: 0,
            patrol: false,
        }
    }

    /// Loop through `waypoints`.
    #[must_use]
    pub fn patrol(waypoints: Vec<Vec2>, speed: f32) -> Self {
        Self {
            speed,
            waypoints,
            next: 0,
            patrol: true,
        }
    }

    /// The waypoint being approached.
    #[must_use]
    pub fn target(&self) -> Option<Vec2> {
        self.waypoints.get(self.next).copied()
    }

    fn advance(&mut self) {
        self.next += 1;
        if self.patrol && self.next >= self.waypoints.len() {
            self.next = 0;
        }
    }
}

impl Behavior for Driver {
    fn priority(&self) -> i32 {
        priority::DRIVER
    }

    fn on_disable(&mut self, ctx: &mut BehaviorCtx<'_>) {
        let entity = ctx.entity_id();
        if let Some(mover) = ctx.world_mut().get_mut::<Mover>(entity) {
            mover.velocity = Vec2::ZERO;
        }
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
        let entity = ctx.entity_id();
        let position = ctx.position();
        let mut velocity = Vec2::ZERO;

        if let Some(target) = self.target() {
            if position.distance(target) <= ARRIVAL_RADIUS {
                self.advance();
                trace!(%entity, next = self.next, "waypoint reached");
                if self.target().is_none() {
                    ctx.emit(EntityEvent::Custom("arrived".to_owned()));
                }
            }
            if let Some(target) = self.target()
                && delta > 0.0
            {
                velocity = (move_towards(position, target, self.speed * delta) - position) / delta;
            }
        }

        if let Some(mover) = ctx.world_mut().get_mut::<Mover>(entity) {
            mover.velocity = velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{EntityId, EventKind, Transform2D, World};

    use super::*;

    #[test]
    fn test_move_towards() {
        let origin = Vec2::ZERO;
        assert_eq!(move_towards(origin, Vec2::new(10.0, 0.0), 3.0), Vec2::new(3.0, 0.0));
        assert_eq!(move_towards(origin, Vec2::new(1.0, 0.0), 3.0), Vec2::new(1.0, 0.0));
        assert_eq!(move_towards(origin, origin, 3.0), origin);
    }

    fn driven(driver: Driver) -> (World, EntityId) {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, Mover::default()).unwrap();
        world.add_behavior(id, driver).unwrap();
        (world, id)
    }

    #[test]
    fn test_lands_on_target_and_stops() {
        let (mut world, id) = driven(Driver::towards(Vec2::new(1.5, 0.0), 1.0));
        world.drain_events();
        for _ in 0..4 {
            world.update(0.5);
        }
        assert_eq!(world.entity(id).unwrap().position(), Vec2::new(1.5, 0.0));
        assert_eq!(world.get::<Mover>(id).unwrap().velocity, Vec2::ZERO);
        let arrived = world
            .drain_events()
            .into_iter()
            .filter(|(_, e)| e.kind() == EventKind::Custom)
            .count();
        assert_eq!(arrived, 1);
    }

    #[test]
    fn test_patrol_loops() {
        let points = vec![Vec2::new(1.0, 0.0), Vec2::ZERO];
        let (mut world, id) = driven(Driver::patrol(points, 2.0));
        world.update(0.5);
        assert_eq!(world.entity(id).unwrap().position(), Vec2::new(1.0, 0.0));
        world.update(0.5);
        assert_eq!(world.entity(id).unwrap().position(), Vec2::ZERO);
        world.update(0.5);
        assert_eq!(world.get::<Driver>(id).unwrap().target(), Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_disable_stops_mover() {
        let (mut world, id) = driven(Driver::towards(Vec2::new(10.0, 0.0), 1.0));
        world.update(0.5);
        assert_ne!(world.get::<Mover>(id).unwrap().velocity, Vec2::ZERO);
        world.set_enabled::<Driver>(id, false).unwrap();
        assert_eq!(world.get::<Mover>(id).unwrap().velocity, Vec2::ZERO);
    }
}
