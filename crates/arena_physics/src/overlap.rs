//! A small overlap-only physics world.
//!
//! Circles and axis-aligned rectangles, explicit velocity integration, and
//! contact tracking. There is no collision response: bodies pass through
//! each other and gameplay decides what a contact means.

use std::collections::{BTreeMap, BTreeSet};

use arena_math::Vec2;
use tracing::trace;

use crate::backend::{BodyDesc, BodyId, ContactEvent, ContactPhase, PhysicsBackend, Shape};
use crate::category::{CollisionCategory, filters_allow};
use crate::error::PhysicsError;

#[derive(Debug, Clone)]
struct Body {
    shape: Shape,
    position: Vec2,
    velocity: Vec2,
    category: CollisionCategory,
    mask: CollisionCategory,
    is_static: bool,
}

/// Overlap-only [`PhysicsBackend`].
///
/// Each [`step`](PhysicsBackend::step) is split into `substeps` equal
/// sub-steps. Every sub-step integrates velocities, then reports `Start`
/// for pairs that began touching, `Active` for pairs still touching, and
/// `End` for pairs that separated. Bodies iterate in id order, so the event
/// sequence is deterministic.
#[derive(Debug)]
pub struct OverlapWorld {
    bodies: BTreeMap<BodyId, Body>,
    next_id: u64,
    substeps: u32,
    touching: BTreeSet<(BodyId, BodyId)>,
}

impl OverlapWorld {
    /// An empty world with one sub-step per step.
    #[must_use]
    pub fn new() -> Self {
        Self::with_substeps(1)
    }

    /// An empty world with `substeps` sub-steps per step (at least one).
    #[must_use]
    pub fn with_substeps(substeps: u32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 0,
            substeps: substeps.max(1),
            touching: BTreeSet::new(),
        }
    }

    /// Sub-steps per step.
    #[must_use]
    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    /// Number of pairs touching after the last sub-step.
    #[must_use]
    pub fn touching_pairs(&self) -> usize {
        self.touching.len()
    }

    fn detect(&mut self, events: &mut Vec<ContactEvent>) {
        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        let mut now = BTreeSet::new();

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let (body_a, body_b) = (&self.bodies[&a], &self.bodies[&b]);
                if body_a.is_static && body_b.is_static {
                    continue;
                }
                if !filters_allow(body_a.category, body_a.mask, body_b.category, body_b.mask) {
                    continue;
                }
                let Some(penetration) = penetration(body_a, body_b) else {
                    continue;
                };
                let phase = if self.touching.contains(&(a, b)) {
                    ContactPhase::Active
                } else {
                    ContactPhase::Start
                };
                events.push(ContactEvent {
                    phase,
                    a,
                    b,
                    category_a: body_a.category,
                    category_b: body_b.category,
                    penetration,
                });
                now.insert((a, b));
            }
        }

        for &(a, b) in self.touching.difference(&now) {
            let category = |id| {
                self.bodies
                    .get(&id)
                    .map_or(CollisionCategory::NONE, |body: &Body| body.category)
            };
            events.push(ContactEvent {
                phase: ContactPhase::End,
                a,
                b,
                category_a: category(a),
                category_b: category(b),
                penetration: Vec2::ZERO,
            });
        }
        self.touching = now;
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, PhysicsError> {
        self.bodies.get_mut(&id).ok_or(PhysicsError::UnknownBody(id))
    }
}

impl Default for OverlapWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for OverlapWorld {
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError> {
        desc.shape.validate()?;
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.insert(
            id,
            Body {
                shape: desc.shape,
                position: desc.position,
                velocity: desc.velocity,
                category: desc.category,
                mask: desc.mask,
                is_static: desc.is_static,
            },
        );
        trace!(body = %id, "body added");
        Ok(id)
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        if self.bodies.remove(&id).is_none() {
            return false;
        }
        // Pairs of a removed body end silently.
        self.touching.retain(|&(a, b)| a != id && b != id);
        trace!(body = %id, "body removed");
        true
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), PhysicsError> {
        self.body_mut(id)?.position = position;
        Ok(())
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), PhysicsError> {
        self.body_mut(id)?.velocity = velocity;
        Ok(())
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn step(&mut self, delta: f32) -> Vec<ContactEvent> {
        let dt = delta / self.substeps as f32;
        let mut events = Vec::new();
        for _ in 0..self.substeps {
            for body in self.bodies.values_mut() {
                if !body.is_static {
                    body.position += body.velocity * dt;
                }
            }
            self.detect(&mut events);
        }
        events
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

/// Overlap vector pointing from `a` towards `b`, or `None` if they do not
/// overlap. Its length is the penetration depth.
fn penetration(a: &Body, b: &Body) -> Option<Vec2> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            let offset = b.position - a.position;
            let distance = offset.length();
            let depth = ra + rb - distance;
            if depth <= 0.0 {
                return None;
            }
            let normal = if distance > f32::EPSILON {
                offset / distance
            } else {
                Vec2::X
            };
            Some(normal * depth)
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            let offset = b.position - a.position;
            let overlap = ha + hb - offset.abs();
            if overlap.x <= 0.0 || overlap.y <= 0.0 {
                return None;
            }
            if overlap.x < overlap.y {
                Some(Vec2::new(overlap.x * offset.x.signum(), 0.0))
            } else {
                Some(Vec2::new(0.0, overlap.y * offset.y.signum()))
            }
        }
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_rect(a.position, radius, b.position, half_extents)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect(b.position, radius, a.position, half_extents).map(|p| -p)
        }
    }
}

/// Circle-versus-rectangle overlap, pointing from the circle to the rectangle.
fn circle_rect(center: Vec2, radius: f32, rect: Vec2, half: Vec2) -> Option<Vec2> {
    let local = center - rect;
    let closest = local.clamp(-half, half);
    if closest == local {
        // Centre inside the rectangle: leave through the nearest side.
        let room = half - local.abs();
        let outward = if room.x < room.y {
            Vec2::new(local.x.signum() * (room.x + radius), 0.0)
        } else {
            Vec2::new(0.0, local.y.signum() * (room.y + radius))
        };
        return Some(-outward);
    }
    let diff = local - closest;
    let distance = diff.length();
    if distance >= radius {
        return None;
    }
    Some(-(diff / distance) * (radius - distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(world: &mut OverlapWorld, x: f32, radius: f32) -> BodyId {
        let mut desc = BodyDesc::new(Shape::Circle { radius }, CollisionCategory::PLAYER);
        desc.position = Vec2::new(x, 0.0);
        world.add_body(desc).unwrap()
    }

    fn phases(events: &[ContactEvent]) -> Vec<ContactPhase> {
        events.iter().map(|e| e.phase).collect()
    }

    #[test]
    fn test_start_active_end() {
        let mut world = OverlapWorld::new();
        let a = circle(&mut world, 0.0, 1.0);
        let b = circle(&mut world, 5.0, 1.0);

        assert!(world.step(0.1).is_empty());

        world.set_position(b, Vec2::new(1.5, 0.0)).unwrap();
        let events = world.step(0.1);
        assert_eq!(phases(&events), vec![ContactPhase::Start]);
        assert_eq!((events[0].a, events[0].b), (a, b));

        assert_eq!(phases(&world.step(0.1)), vec![ContactPhase::Active]);

        world.set_position(b, Vec2::new(9.0, 0.0)).unwrap();
        assert_eq!(phases(&world.step(0.1)), vec![ContactPhase::End]);
        assert_eq!(world.touching_pairs(), 0);
    }

    #[test]
    fn test_substeps_report_every_sub_step() {
        let mut world = OverlapWorld::with_substeps(4);
        circle(&mut world, 0.0, 1.0);
        circle(&mut world, 1.0, 1.0);
        let events = world.step(0.1);
        assert_eq!(
            phases(&events),
            vec![
                ContactPhase::Start,
                ContactPhase::Active,
                ContactPhase::Active,
                ContactPhase::Active
            ]
        );
    }

    #[test]
    fn test_velocity_integration() {
        let mut world = OverlapWorld::with_substeps(2);
        let desc = BodyDesc::new(Shape::Circle { radius: 1.0 }, CollisionCategory::PROJECTILE)
            .with_velocity(Vec2::new(10.0, 0.0));
        let id = world.add_body(desc).unwrap();
        world.step(0.5);
        assert_eq!(world.position(id), Some(Vec2::new(5.0, 0.0)));

        let wall = world
            .add_body(BodyDesc::new(Shape::Circle { radius: 1.0 }, CollisionCategory::WALL)
                .with_velocity(Vec2::X)
                .fixed())
            .unwrap();
        world.step(1.0);
        assert_eq!(world.position(wall), Some(Vec2::ZERO));
    }

    #[test]
    fn test_mask_filter_blocks_contact() {
        let mut world = OverlapWorld::new();
        let player = BodyDesc::new(Shape::Circle { radius: 1.0 }, CollisionCategory::PLAYER);
        let ghost = BodyDesc::new(Shape::Circle { radius: 1.0 }, CollisionCategory::WALL)
            .with_mask(CollisionCategory::PROJECTILE);
        world.add_body(player).unwrap();
        world.add_body(ghost).unwrap();
        assert!(world.step(0.1).is_empty());
    }

    #[test]
    fn test_static_pairs_are_skipped() {
        let mut world = OverlapWorld::new();
        let wall = BodyDesc::new(
            Shape::Rect {
                half_extents: Vec2::ONE,
            },
            CollisionCategory::WALL,
        )
        .fixed();
        world.add_body(wall).unwrap();
        world.add_body(wall).unwrap();
        assert!(world.step(0.1).is_empty());
    }

    #[test]
    fn test_penetration_points_from_a_to_b() {
        let mut world = OverlapWorld::new();
        let mut rect = BodyDesc::new(
            Shape::Rect {
                half_extents: Vec2::new(1.0, 1.0),
            },
            CollisionCategory::WALL,
        );
        rect.position = Vec2::new(1.5, 0.0);
        circle(&mut world, 0.0, 1.0);
        world.add_body(rect).unwrap();

        let events = world.step(0.1);
        let pen = events[0].penetration;
        assert!(pen.x > 0.0, "expected +x, got {pen:?}");
        assert!((pen.x - 0.5).abs() < 1e-5);
        assert_eq!(pen.y, 0.0);
    }

    #[test]
    fn test_rect_rect_minimum_axis() {
        let a = Body {
            shape: Shape::Rect {
                half_extents: Vec2::ONE,
            },
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            category: CollisionCategory::WALL,
            mask: CollisionCategory::ALL,
            is_static: false,
        };
        let mut b = a.clone();
        b.position = Vec2::new(0.5, -1.8);
        let pen = penetration(&a, &b).unwrap();
        assert_eq!(pen.x, 0.0);
        assert!((pen.y + 0.2).abs() < 1e-5);

        b.position = Vec2::new(2.5, 0.0);
        assert!(penetration(&a, &b).is_none());
    }

    #[test]
    fn test_remove_body_drops_pairs_silently() {
        let mut world = OverlapWorld::new();
        circle(&mut world, 0.0, 1.0);
        let b = circle(&mut world, 1.0, 1.0);
        world.step(0.1);
        assert!(world.remove_body(b));
        assert!(!world.remove_body(b));
        assert!(world.step(0.1).is_empty());
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_unknown_body() {
        let mut world = OverlapWorld::new();
        assert_eq!(
            world.set_position(BodyId(9), Vec2::ZERO),
            Err(PhysicsError::UnknownBody(BodyId(9)))
        );
        assert!(world.position(BodyId(9)).is_none());
    }
}
