//! Core [`Behavior`] trait and its type key.
//!
//! A behavior is a unit of per-tick logic attached to an [`Entity`]. The
//! entity owns its behaviors exclusively; a behavior reaches back to its
//! owner only through the [`BehaviorCtx`] handed to every hook.
//!
//! ## Type Identity
//!
//! [`BehaviorKey`] is derived from a **string name** using the FNV-1a 64-bit
//! hash. By default the name is the behavior's Rust type name, which gives
//! every concrete type its own key; callers that want several instances of
//! one type addressable separately register them under explicit names.
//!
//! [`Entity`]: crate::Entity

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::BehaviorCtx;

/// Standard update priorities. Lower values run earlier within a tick.
///
/// Steering runs before integration, integration before the physics body
/// mirror, the mirror before state machines, and state machines before
/// post-processing.
pub mod priority {
    /// Priority used when a behavior does not override [`Behavior::priority`](super::Behavior::priority).
    pub const DEFAULT: i32 = 0;
    /// Steering and intent (e.g. a driver choosing a heading).
    pub const DRIVER: i32 = 5;
    /// Velocity integration into the transform.
    pub const MOVER: i32 = 10;
    /// Mirroring entity transforms into physics bodies.
    pub const BODY_SYNC: i32 = 20;
    /// Finite-state machines.
    pub const FSM: i32 = 30;
    /// Post-processing (lifetimes, cleanup).
    pub const POST: i32 = 40;
}

/// A unique key for a behavior registration, derived from a string name
/// using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BehaviorKey(pub u64);

impl BehaviorKey {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute a [`BehaviorKey`] from a name using FNV-1a 64-bit.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The default key for behavior type `T`.
    #[must_use]
    pub fn of<T: Behavior>() -> Self {
        Self::from_name(std::any::type_name::<T>())
    }
}

impl fmt::Display for BehaviorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behavior({:#018x})", self.0)
    }
}

/// Upcast helper so trait objects can be downcast to their concrete type.
///
/// Blanket-implemented for every `'static` type; call it on `&dyn Behavior`,
/// never on a `Box`, or the box itself is what gets upcast.
pub trait AsAny: Any {
    /// Borrow as [`Any`].
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The core behavior trait.
///
/// Every hook receives a [`BehaviorCtx`] borrowing the world. While a hook
/// runs, the behavior is checked out of its slot: it can mutate its entity,
/// its siblings, and other entities, but it is not reachable through
/// `get` lookups until the hook returns.
///
/// # Examples
///
/// ```rust
/// use arena_core::{Behavior, BehaviorCtx, Vec2, priority};
///
/// struct Drift {
///     velocity: Vec2,
/// }
///
/// impl Behavior for Drift {
///     fn priority(&self) -> i32 {
///         priority::MOVER
///     }
///
///     fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
///         let next = ctx.position() + self.velocity * delta;
///         ctx.set_position(next);
///     }
/// }
/// ```
pub trait Behavior: AsAny {
    /// A human-readable name, used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Update priority. Captured when the behavior is attached; lower runs
    /// earlier.
    fn priority(&self) -> i32 {
        priority::DEFAULT
    }

    /// Runs once when the behavior becomes live on a live entity.
    fn init(&mut self, _ctx: &mut BehaviorCtx<'_>) {}

    /// Runs whenever the enabled flag becomes `true` after init.
    fn on_enable(&mut self, _ctx: &mut BehaviorCtx<'_>) {}

    /// Runs whenever the enabled flag becomes `false` after init.
    fn on_disable(&mut self, _ctx: &mut BehaviorCtx<'_>) {}

    /// Runs once before the behavior is dropped.
    fn on_destroy(&mut self, _ctx: &mut BehaviorCtx<'_>) {}

    /// Per-tick logic. Skipped while disabled, sleeping, or destroyed.
    fn update(&mut self, _ctx: &mut BehaviorCtx<'_>, _delta: f32) {}
}
