//! Timed self-destruction.

use arena_core::{Behavior, BehaviorCtx, priority};
use serde::{Deserialize, Serialize};

/// Destroys its entity once `remaining` seconds have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    remaining: f32,
}

impl Lifetime {
    /// Expire after `seconds`.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

impl Behavior for Lifetime {
    fn priority(&self) -> i32 {
        priority::POST
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            ctx.destroy_entity();
        }
    }
}
