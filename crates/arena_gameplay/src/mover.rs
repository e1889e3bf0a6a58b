//! Velocity integration.

use arena_core::{Behavior, BehaviorCtx, Vec2, priority};
use serde::{Deserialize, Serialize};

/// Moves its entity by `velocity` every tick and faces it along the motion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Mover {
    /// Units per second.
    pub velocity: Vec2,
}

impl Mover {
    /// Move at a constant `velocity`.
    #[must_use]
    pub fn new(velocity: Vec2) -> Self {
        Self { velocity }
    }
}

impl Behavior for Mover {
    fn priority(&self) -> i32 {
        priority::MOVER
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
        if self.velocity == Vec2::ZERO {
            return;
        }
        let velocity = self.velocity;
        if let Some(entity) = ctx.entity_mut() {
            let transform = entity.transform_mut();
            transform.position += velocity * delta;
            transform.rotation = velocity.y.atan2(velocity.x);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use arena_core::{Transform2D, World};

    use super::*;

    #[test]
    fn test_integrates_and_faces_motion() {
        let mut world = World::new();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        world.add_behavior(id, Mover::new(Vec2::new(0.0, 2.0))).unwrap();

        world.update(0.5);
        let entity = world.entity(id).unwrap();
        assert_eq!(entity.position(), Vec2::new(0.0, 1.0));
        assert!((entity.rotation() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_still_mover_keeps_rotation() {
        let mut world = World::new();
        let id = world
            .spawn(Transform2D::IDENTITY.rotated(1.0), None)
            .unwrap();
        world.add_behavior(id, Mover::default()).unwrap();
        world.update(0.5);
        assert_eq!(world.entity(id).unwrap().rotation(), 1.0);
    }
}
