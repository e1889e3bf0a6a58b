//! World-level error types.

use crate::behavior::BehaviorKey;
use crate::entity::EntityId;
use crate::group::GroupId;

/// Errors returned by [`World`](crate::World) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity id is not in the world.
    #[error("{0} not found")]
    EntityNotFound(EntityId),

    /// The entity has already been destroyed.
    #[error("{0} is destroyed")]
    EntityDestroyed(EntityId),

    /// The entity was already added to a world.
    #[error("{0} is already in the world")]
    EntityAlreadyAdded(EntityId),

    /// The group id is not in the world.
    #[error("{0} not found")]
    GroupNotFound(GroupId),

    /// No live behavior is registered under the key.
    #[error("{key} not found on {entity}")]
    BehaviorNotFound {
        /// The entity that was searched.
        entity: EntityId,
        /// The missing key.
        key: BehaviorKey,
    },

    /// The behavior is executing one of its own hooks and cannot be borrowed.
    #[error("{key} on {entity} is executing")]
    BehaviorBusy {
        /// The owning entity.
        entity: EntityId,
        /// The busy behavior.
        key: BehaviorKey,
    },
}
