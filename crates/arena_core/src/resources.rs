//! Type-keyed shared state stored in the [`World`](crate::World).
//!
//! Subsystems that are not behaviors (the physics backend and body registry,
//! pending state-machine requests) park their state here so behavior hooks
//! can reach it through the context.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A map from type to a single value of that type.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any>>,
}

impl Resources {
    /// Create an empty resource map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the previous value of the same type.
    pub fn insert<R: Any>(&mut self, value: R) -> Option<R> {
        self.values
            .insert(TypeId::of::<R>(), Box::new(value))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Borrow a resource.
    #[must_use]
    pub fn get<R: Any>(&self) -> Option<&R> {
        self.values.get(&TypeId::of::<R>())?.downcast_ref::<R>()
    }

    /// Mutably borrow a resource.
    pub fn get_mut<R: Any>(&mut self) -> Option<&mut R> {
        self.values.get_mut(&TypeId::of::<R>())?.downcast_mut::<R>()
    }

    /// Borrow a resource, inserting `R::default()` first if missing.
    pub fn get_or_default<R: Any + Default>(&mut self) -> &mut R {
        let slot = self
            .values
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(R::default()));
        match slot.downcast_mut::<R>() {
            Some(value) => value,
            None => unreachable!("resource stored under a foreign TypeId"),
        }
    }

    /// Remove a resource.
    pub fn remove<R: Any>(&mut self) -> Option<R> {
        self.values
            .remove(&TypeId::of::<R>())
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Returns `true` if a resource of type `R` is present.
    #[must_use]
    pub fn contains<R: Any>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<R>())
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("count", &self.values.len())
            .finish()
    }
}
