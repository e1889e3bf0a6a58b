//! # arena_math
//!
//! Math types for the arena simulation kernel. Re-exports [`glam`] for linear
//! algebra and defines [`Transform2D`], the spatial state every entity owns.

pub mod transform;

// Re-export glam types for convenience.
pub use glam::{Mat3, Vec2};

pub use transform::Transform2D;
