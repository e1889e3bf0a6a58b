//! The physics backend seam.
//!
//! The collision bridge only needs a world that stores bodies, moves them,
//! and reports contact pairs. [`PhysicsBackend`] is that contract;
//! [`OverlapWorld`](crate::OverlapWorld) is the in-tree implementation.

use std::fmt;
use std::ops::{Deref, DerefMut};

use arena_math::Vec2;
use serde::{Deserialize, Serialize};

use crate::category::CollisionCategory;
use crate::error::PhysicsError;

/// Identifier of a body inside a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body({})", self.0)
    }
}

/// Collision shape, centred on the body position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A circle.
    Circle {
        /// Radius.
        radius: f32,
    },
    /// An axis-aligned rectangle.
    Rect {
        /// Half width and half height.
        half_extents: Vec2,
    },
}

impl Shape {
    /// Check that every dimension is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShape`].
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match *self {
            Self::Circle { radius } if !(radius.is_finite() && radius > 0.0) => {
                Err(PhysicsError::InvalidShape("circle radius must be positive"))
            }
            Self::Rect { half_extents }
                if !(half_extents.is_finite() && half_extents.x > 0.0 && half_extents.y > 0.0) =>
            {
                Err(PhysicsError::InvalidShape("rect half extents must be positive"))
            }
            _ => Ok(()),
        }
    }

    /// Radius of the smallest circle containing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Circle { radius } => radius,
            Self::Rect { half_extents } => half_extents.length(),
        }
    }
}

/// Everything a backend needs to create a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Collision shape.
    pub shape: Shape,
    /// Initial position.
    pub position: Vec2,
    /// Initial velocity in units per second.
    pub velocity: Vec2,
    /// Categories this body presents.
    pub category: CollisionCategory,
    /// Categories this body collides with.
    pub mask: CollisionCategory,
    /// Static bodies never integrate velocity.
    pub is_static: bool,
}

impl BodyDesc {
    /// A dynamic body at the origin colliding with everything.
    #[must_use]
    pub fn new(shape: Shape, category: CollisionCategory) -> Self {
        Self {
            shape,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            category,
            mask: CollisionCategory::ALL,
            is_static: false,
        }
    }

    /// Set the physics mask.
    #[must_use]
    pub fn with_mask(mut self, mask: CollisionCategory) -> Self {
        self.mask = mask;
        self
    }

    /// Set the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Mark the body static.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Lifecycle phase of a contact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// The pair started touching during this sub-step.
    Start,
    /// The pair was already touching and still is.
    Active,
    /// The pair stopped touching.
    End,
}

/// One reported contact pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Phase of the pair.
    pub phase: ContactPhase,
    /// First body.
    pub a: BodyId,
    /// Second body.
    pub b: BodyId,
    /// Category of `a` when the contact was detected.
    pub category_a: CollisionCategory,
    /// Category of `b` when the contact was detected.
    pub category_b: CollisionCategory,
    /// Overlap depth along the separating direction, pointing from `a` to
    /// `b`. Zero for `End`.
    pub penetration: Vec2,
}

/// A physics world the collision bridge can drive.
pub trait PhysicsBackend {
    /// Create a body and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShape`] for a degenerate shape.
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError>;

    /// Remove a body. Returns `false` if it did not exist.
    fn remove_body(&mut self, id: BodyId) -> bool;

    /// Teleport a body.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::UnknownBody`].
    fn set_position(&mut self, id: BodyId, position: Vec2) -> Result<(), PhysicsError>;

    /// Current body position.
    fn position(&self, id: BodyId) -> Option<Vec2>;

    /// Set a body's velocity.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::UnknownBody`].
    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<(), PhysicsError>;

    /// Current body velocity.
    fn velocity(&self, id: BodyId) -> Option<Vec2>;

    /// Advance the world by `delta` seconds and return every contact event
    /// raised along the way, in order.
    fn step(&mut self, delta: f32) -> Vec<ContactEvent>;

    /// Number of bodies.
    fn body_count(&self) -> usize;
}

/// World resource holding the active physics backend.
pub struct Physics {
    backend: Box<dyn PhysicsBackend>,
}

impl Physics {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: impl PhysicsBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }
}

impl Deref for Physics {
    type Target = dyn PhysicsBackend;

    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}

impl DerefMut for Physics {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.backend
    }
}

impl fmt::Debug for Physics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Physics")
            .field("bodies", &self.backend.body_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert!(Shape::Circle { radius: 1.0 }.validate().is_ok());
        assert!(Shape::Circle { radius: 0.0 }.validate().is_err());
        assert!(Shape::Circle { radius: f32::NAN }.validate().is_err());
        assert!(
            Shape::Rect {
                half_extents: Vec2::new(1.0, -1.0)
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_body_desc_builders() {
        let desc = BodyDesc::new(Shape::Circle { radius: 2.0 }, CollisionCategory::PLAYER)
            .with_mask(CollisionCategory::WALL)
            .with_velocity(Vec2::X)
            .fixed();
        assert_eq!(desc.mask, CollisionCategory::WALL);
        assert_eq!(desc.velocity, Vec2::X);
        assert!(desc.is_static);
    }

    #[test]
    fn test_bounding_radius() {
        let rect = Shape::Rect {
            half_extents: Vec2::new(3.0, 4.0),
        };
        assert!((rect.bounding_radius() - 5.0).abs() < 1e-6);
    }
}
