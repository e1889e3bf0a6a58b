//! Collision categories and teams.
//!
//! Every body presents one or more category bits. Bodies carry a physics
//! `mask` (which categories they collide with at all) and bridges carry an
//! `event_mask` (which categories they want contact callbacks for).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bit set of collision categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionCategory(pub u32);

impl CollisionCategory {
    /// No categories.
    pub const NONE: Self = Self(0);

    /// Static level geometry.
    pub const WALL: Self = Self(1 << 0);

    /// Bullets, rockets, thrown objects.
    pub const PROJECTILE: Self = Self(1 << 1);

    /// Player-controlled bodies.
    pub const PLAYER: Self = Self(1 << 2);

    /// Non-solid areas: heal zones, capture points, portals, triggers.
    pub const ZONE: Self = Self(1 << 3);

    /// Every category.
    pub const ALL: Self = Self(u32::MAX);

    /// Check if every bit of `other` is set.
    #[inline]
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any bit of `other` is set.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Combine two sets.
    #[inline]
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove the bits of `other`.
    #[inline]
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns `true` if no bit is set.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CollisionCategory {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitAnd for CollisionCategory {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Whether two bodies collide under the mutual mask rule: each one's mask
/// must accept the other's category.
#[inline]
#[must_use]
pub fn filters_allow(
    category_a: CollisionCategory,
    mask_a: CollisionCategory,
    category_b: CollisionCategory,
    mask_b: CollisionCategory,
) -> bool {
    mask_a.intersects(category_b) && mask_b.intersects(category_a)
}

/// A team tag used by contact handlers to skip friendly fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Team(pub u32);

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}
