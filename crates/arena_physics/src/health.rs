//! Destructible hit points.

use arena_core::{Behavior, EntityEvent, EntityId, World};
use serde::{Deserialize, Serialize};

/// Hit points of a destructible entity.
///
/// Passive: it never updates. Damage handlers reach it through
/// [`Health::apply_damage`] and [`Health::apply_heal`], which also emit the
/// matching events, and [`Health::reap_if_dead`].
///
/// A downable entity stays in the world at zero hit points; something else
/// (usually a state machine) decides what happens to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
    #[serde(default)]
    downable: bool,
}

impl Health {
    /// Full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            downable: false,
        }
    }

    /// Keep the entity alive at zero hit points.
    #[must_use]
    pub fn downable(mut self) -> Self {
        self.downable = true;
        self
    }

    /// Whether the entity survives at zero hit points.
    #[must_use]
    pub fn is_downable(&self) -> bool {
        self.downable
    }

    /// Hit points left.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Hit points when full.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Returns `true` at zero hit points.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Subtract `amount`, never below zero. Returns what is left.
    pub fn damage(&mut self, amount: f32) -> f32 {
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.current
    }

    /// Add `amount`, never above max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    /// Back to full hit points.
    pub fn restore(&mut self) {
        self.current = self.max;
    }

    /// Damage `target` if it has [`Health`], emitting
    /// [`EntityEvent::Damaged`]. Returns the remaining hit points, or `None`
    /// if the target is not destructible.
    pub fn apply_damage(world: &mut World, target: EntityId, amount: f32) -> Option<f32> {
        if !world.is_alive(target) {
            return None;
        }
        let remaining = world.get_mut::<Health>(target)?.damage(amount);
        world.emit(target, EntityEvent::Damaged { amount, remaining });
        Some(remaining)
    }

    /// Heal `target` if it has [`Health`], emitting [`EntityEvent::Healed`]
    /// when anything was restored. Returns the amount healed.
    pub fn apply_heal(world: &mut World, target: EntityId, amount: f32) -> Option<f32> {
        if !world.is_alive(target) {
            return None;
        }
        let health = world.get_mut::<Health>(target)?;
        let healed = health.heal(amount);
        let current = health.current;
        if healed > 0.0 {
            world.emit(target, EntityEvent::Healed { amount: healed, current });
        }
        Some(healed)
    }

    /// Destroy `target` if it is out of hit points and not downable.
    /// Returns `true` if this call destroyed it.
    pub fn reap_if_dead(world: &mut World, target: EntityId) -> bool {
        let dead = world
            .get::<Health>(target)
            .is_some_and(|health| health.is_dead() && !health.downable);
        dead && world.destroy_entity(target)
    }
}

impl Behavior for Health {}
