//! Arena bounds and out-of-bounds culling.

use arena_core::{Updater, Vec2, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Axis-aligned arena rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Bounds {
    /// Bounds spanning the two corners.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Check if a point is within bounds.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Check if a point is further than `margin` outside the bounds.
    #[must_use]
    pub fn is_outside(&self, point: Vec2, margin: f32) -> bool {
        point.x + margin < self.min.x
            || point.x - margin > self.max.x
            || point.y + margin < self.min.y
            || point.y - margin > self.max.y
    }

    /// Clamp a point to within bounds.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(-50.0, -50.0, 50.0, 50.0)
    }
}

/// Destroys entities that leave the arena.
#[derive(Debug)]
pub struct BoundsWatcher {
    bounds: Bounds,
    margin: f32,
    culled: u64,
}

impl BoundsWatcher {
    /// Cull entities more than `margin` outside `bounds`.
    #[must_use]
    pub fn new(bounds: Bounds, margin: f32) -> Self {
        Self {
            bounds,
            margin,
            culled: 0,
        }
    }

    /// The rectangle being watched.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Entities destroyed so far.
    #[must_use]
    pub fn culled(&self) -> u64 {
        self.culled
    }
}

impl Updater for BoundsWatcher {
    fn name(&self) -> &str {
        "bounds"
    }

    fn update(&mut self, world: &mut World, _delta: f32) {
        let outside: Vec<_> = world
            .entity_ids()
            .iter()
            .copied()
            .filter(|&id| {
                world
                    .entity(id)
                    .is_some_and(|e| !e.is_destroyed() && self.bounds.is_outside(e.position(), self.margin))
            })
            .collect();
        for id in outside {
            if world.destroy_entity(id) {
                self.culled += 1;
                debug!(entity = %id, "left the arena");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{Engine, Transform2D};

    use super::*;

    #[test]
    fn test_bounds_queries() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(bounds.contains(Vec2::new(5.0, 5.0)));
        assert!(!bounds.contains(Vec2::new(-1.0, 5.0)));
        assert!(!bounds.is_outside(Vec2::new(-1.0, 5.0), 2.0));
        assert!(bounds.is_outside(Vec2::new(-3.0, 5.0), 2.0));
        assert_eq!(bounds.clamp(Vec2::new(12.0, -4.0)), Vec2::new(10.0, 0.0));
        assert_eq!(bounds.center(), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_bounds_from_json() {
        let bounds: Bounds =
            serde_json::from_str(r#"{"min":[-5.0,-5.0],"max":[5.0,5.0]}"#).unwrap();
        assert_eq!(bounds, Bounds::new(-5.0, -5.0, 5.0, 5.0));
    }

    #[test]
    fn test_watcher_culls_escaped_entities() {
        let mut engine = Engine::new();
        engine.add_updater(BoundsWatcher::new(Bounds::new(0.0, 0.0, 10.0, 10.0), 1.0));
        let world = engine.world_mut();
        let inside = world
            .spawn(Transform2D::from_position(Vec2::new(5.0, 5.0)), None)
            .unwrap();
        let escaped = world
            .spawn(Transform2D::from_position(Vec2::new(20.0, 5.0)), None)
            .unwrap();

        engine.tick(0.1);
        assert!(engine.world().is_alive(inside));
        assert!(!engine.world().is_alive(escaped));
        assert_eq!(engine.updater::<BoundsWatcher>().unwrap().culled(), 1);

        // Reaped on the next world update.
        engine.tick(0.1);
        assert!(engine.world().entity(escaped).is_none());
    }
}
