//! Body id to bridge lookup.

use std::collections::HashMap;
use std::fmt;

use arena_core::{BehaviorKey, EntityId, World, WorldError};

use crate::backend::BodyId;
use crate::bridge::{Contact, Peer};
use crate::category::{CollisionCategory, Team};

/// Routes one contact to the bridge behavior registered under `key` on
/// `entity`. Monomorphized per handler type by the bridge that registers it.
pub type Dispatch = fn(&mut World, EntityId, BehaviorKey, &Contact) -> Result<(), WorldError>;

/// What the collision system needs to know about a registered body.
#[derive(Clone, Copy)]
pub struct BodyLink {
    /// Owning entity.
    pub entity: EntityId,
    /// Key of the bridge behavior on that entity.
    pub key: BehaviorKey,
    /// Categories the body presents.
    pub category: CollisionCategory,
    /// Categories the bridge wants contact callbacks for.
    pub event_mask: CollisionCategory,
    /// Team of the owning entity, if any.
    pub team: Option<Team>,
    /// Copy the body position back into the entity after each step.
    pub pull: bool,
    /// Handler entry point.
    pub dispatch: Dispatch,
}

impl BodyLink {
    /// What the other side of a contact sees of this body.
    #[must_use]
    pub fn peer(&self) -> Peer {
        Peer {
            entity: self.entity,
            team: self.team,
            category: self.category,
        }
    }
}

impl fmt::Debug for BodyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyLink")
            .field("entity", &self.entity)
            .field("key", &self.key)
            .field("category", &self.category)
            .field("event_mask", &self.event_mask)
            .field("team", &self.team)
            .field("pull", &self.pull)
            .finish_non_exhaustive()
    }
}

/// World resource mapping live bodies to their bridges.
///
/// A body is present while its bridge is enabled on a live entity.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    links: HashMap<BodyId, BodyLink>,
}

impl BodyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body, replacing any previous link for the same id.
    pub fn register(&mut self, body: BodyId, link: BodyLink) {
        self.links.insert(body, link);
    }

    /// Remove a body. Returns `false` if it was not registered.
    pub fn unregister(&mut self, body: BodyId) -> bool {
        self.links.remove(&body).is_some()
    }

    /// Link for a body.
    #[must_use]
    pub fn get(&self, body: BodyId) -> Option<&BodyLink> {
        self.links.get(&body)
    }

    /// Number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Bodies whose positions are pulled back into their entities, sorted
    /// by body id.
    #[must_use]
    pub fn pulled(&self) -> Vec<(BodyId, EntityId)> {
        let mut pulled: Vec<_> = self
            .links
            .iter()
            .filter(|(_, link)| link.pull)
            .map(|(&body, link)| (body, link.entity))
            .collect();
        pulled.sort_unstable_by_key(|&(body, _)| body);
        pulled
    }

    /// Bodies owned by `entity`.
    #[must_use]
    pub fn bodies_of(&self, entity: EntityId) -> Vec<BodyId> {
        let mut bodies: Vec<_> = self
            .links
            .iter()
            .filter(|(_, link)| link.entity == entity)
            .map(|(&body, _)| body)
            .collect();
        bodies.sort_unstable();
        bodies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut World, _: EntityId, _: BehaviorKey, _: &Contact) -> Result<(), WorldError> {
        Ok(())
    }

    fn link(entity: u64, pull: bool) -> BodyLink {
        BodyLink {
            entity: EntityId(entity),
            key: BehaviorKey::from_name("bridge"),
            category: CollisionCategory::PLAYER,
            event_mask: CollisionCategory::WALL,
            team: Some(Team(1)),
            pull,
            dispatch: noop,
        }
    }

    #[test]
    fn test_register_and_unregister_is_idempotent() {
        let mut registry = BodyRegistry::new();
        registry.register(BodyId(1), link(7, false));
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(BodyId(1)));
        assert!(!registry.unregister(BodyId(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pulled_and_bodies_of() {
        let mut registry = BodyRegistry::new();
        registry.register(BodyId(3), link(7, true));
        registry.register(BodyId(1), link(7, true));
        registry.register(BodyId(2), link(8, false));
        assert_eq!(
            registry.pulled(),
            vec![(BodyId(1), EntityId(7)), (BodyId(3), EntityId(7))]
        );
        assert_eq!(registry.bodies_of(EntityId(7)), vec![BodyId(1), BodyId(3)]);
    }

    #[test]
    fn test_peer_mirrors_link() {
        let peer = link(9, false).peer();
        assert_eq!(peer.entity, EntityId(9));
        assert_eq!(peer.team, Some(Team(1)));
        assert_eq!(peer.category, CollisionCategory::PLAYER);
    }
}
