//! Entity groups.
//!
//! Groups form a tree owned by the [`World`](crate::World). Each group owns
//! a list of entities and child groups and carries a paused flag. Pausing or
//! destroying a group applies to its whole subtree.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A unique group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({})", self.0)
    }
}

/// One node of the group tree.
#[derive(Debug, Clone)]
pub struct Group {
    /// This group's id.
    pub id: GroupId,
    /// Parent group, if nested.
    pub parent: Option<GroupId>,
    /// Child groups in creation order.
    pub children: Vec<GroupId>,
    /// Owned entities in registration order.
    pub entities: Vec<EntityId>,
    /// Paused groups keep their entities but skip updating them.
    pub paused: bool,
}

/// Arena of groups.
#[derive(Debug, Default)]
pub(crate) struct Groups {
    next_id: u64,
    nodes: HashMap<GroupId, Group>,
}

impl Groups {
    pub(crate) fn create(&mut self, parent: Option<GroupId>) -> Option<GroupId> {
        let paused = match parent {
            Some(parent_id) => self.nodes.get(&parent_id)?.paused,
            None => false,
        };
        self.next_id += 1;
        let id = GroupId(self.next_id);
        self.nodes.insert(
            id,
            Group {
                id,
                parent,
                children: Vec::new(),
                entities: Vec::new(),
                paused,
            },
        );
        if let Some(parent_id) = parent
            && let Some(node) = self.nodes.get_mut(&parent_id)
        {
            node.children.push(id);
        }
        Some(id)
    }

    pub(crate) fn get(&self, id: GroupId) -> Option<&Group> {
        self.nodes.get(&id)
    }

    pub(crate) fn contains(&self, id: GroupId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn attach(&mut self, group: GroupId, entity: EntityId) -> bool {
        match self.nodes.get_mut(&group) {
            Some(node) => {
                node.entities.push(entity);
                true
            }
            None => false,
        }
    }

    pub(crate) fn detach(&mut self, group: GroupId, entity: EntityId) {
        if let Some(node) = self.nodes.get_mut(&group) {
            node.entities.retain(|&e| e != entity);
        }
    }

    pub(crate) fn is_paused(&self, group: GroupId) -> bool {
        self.nodes.get(&group).is_some_and(|g| g.paused)
    }

    /// The group and all of its descendants, parents before children.
    pub(crate) fn subtree(&self, root: GroupId) -> Vec<GroupId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn set_paused(&mut self, root: GroupId, paused: bool) -> bool {
        let subtree = self.subtree(root);
        for id in &subtree {
            if let Some(node) = self.nodes.get_mut(id) {
                node.paused = paused;
            }
        }
        !subtree.is_empty()
    }

    /// Remove a subtree's nodes, returning every entity they owned.
    pub(crate) fn remove_subtree(&mut self, root: GroupId) -> Vec<EntityId> {
        let subtree = self.subtree(root);
        if let Some(parent) = self.nodes.get(&root).and_then(|n| n.parent)
            && let Some(parent_node) = self.nodes.get_mut(&parent)
        {
            parent_node.children.retain(|&c| c != root);
        }
        let mut entities = Vec::new();
        for id in subtree {
            if let Some(node) = self.nodes.remove(&id) {
                entities.extend(node.entities);
            }
        }
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_nested() {
        let mut groups = Groups::default();
        let root = groups.create(None).unwrap();
        let child = groups.create(Some(root)).unwrap();
        assert_eq!(groups.get(root).unwrap().children, vec![child]);
        assert_eq!(groups.get(child).unwrap().parent, Some(root));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut groups = Groups::default();
        assert!(groups.create(Some(GroupId(99))).is_none());
    }

    #[test]
    fn test_pause_recurses() {
        let mut groups = Groups::default();
        let root = groups.create(None).unwrap();
        let child = groups.create(Some(root)).unwrap();
        let grandchild = groups.create(Some(child)).unwrap();
        groups.set_paused(root, true);
        assert!(groups.is_paused(grandchild));
        groups.set_paused(child, false);
        assert!(groups.is_paused(root));
        assert!(!groups.is_paused(grandchild));
    }

    #[test]
    fn test_child_of_paused_group_starts_paused() {
        let mut groups = Groups::default();
        let root = groups.create(None).unwrap();
        groups.set_paused(root, true);
        let child = groups.create(Some(root)).unwrap();
        assert!(groups.is_paused(child));
    }

    #[test]
    fn test_remove_subtree_collects_entities() {
        let mut groups = Groups::default();
        let root = groups.create(None).unwrap();
        let child = groups.create(Some(root)).unwrap();
        groups.attach(root, EntityId(1));
        groups.attach(child, EntityId(2));
        let removed = groups.remove_subtree(root);
        assert_eq!(removed, vec![EntityId(1), EntityId(2)]);
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn test_remove_child_unlinks_parent() {
        let mut groups = Groups::default();
        let root = groups.create(None).unwrap();
        let child = groups.create(Some(root)).unwrap();
        groups.remove_subtree(child);
        assert!(groups.get(root).unwrap().children.is_empty());
        assert!(groups.contains(root));
    }
}
