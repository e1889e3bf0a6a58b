//! 2D transform.
//!
//! [`Transform2D`] represents position, rotation, and size on the arena
//! plane. Every entity owns exactly one; behaviors read and write it, and
//! collision bridges mirror its position into physics bodies.

use glam::{Mat3, Vec2};
use serde::{Deserialize, Serialize};

/// A 2D transform: position, rotation in radians, and extent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    /// World-space position.
    pub position: Vec2,
    /// Rotation in radians, counter-clockwise from +X.
    pub rotation: f32,
    /// Width and height of the entity.
    pub size: Vec2,
}

impl Transform2D {
    /// The identity transform: origin, no rotation, unit size.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        size: Vec2::ONE,
    };

    /// Create a new transform with the given position and default rotation/size.
    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a new transform with position and size.
    #[must_use]
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            ..Self::IDENTITY
        }
    }

    /// Compute the 3×3 affine matrix for this transform.
    #[must_use]
    pub fn to_matrix(&self) -> Mat3 {
        Mat3::from_scale_angle_translation(self.size, self.rotation, self.position)
    }

    /// Unit vector the transform is facing.
    #[must_use]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// Unsigned angle in radians between the facing direction and `point`.
    ///
    /// Returns `0.0` when `point` coincides with the position.
    #[must_use]
    pub fn angle_to(&self, point: Vec2) -> f32 {
        let offset = point - self.position;
        if offset.length_squared() <= f32::EPSILON {
            return 0.0;
        }
        self.forward().angle_to(offset).abs()
    }

    /// Distance from the position to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Translate the transform by the given offset.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.position += offset;
        self
    }

    /// Rotate the transform by `angle` radians.
    #[must_use]
    pub fn rotated(mut self, angle: f32) -> Self {
        self.rotation += angle;
        self
    }

    /// Apply a uniform scale factor to the size.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.size *= factor;
        self
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
