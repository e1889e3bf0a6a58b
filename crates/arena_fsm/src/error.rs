//! State-machine error types.

use arena_core::{EntityId, WorldError};

/// Errors returned by graph construction and state-machine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsmError {
    /// The machine was used before being attached to a live entity.
    #[error("state machine is not attached to a live entity")]
    NotAttached,

    /// The entity carries no state machine.
    #[error("{0} has no state machine")]
    NoMachine(EntityId),

    /// The machine is executing a hook that is not a transition, so the
    /// request cannot be ranked against anything.
    #[error("state machine on {0} is busy outside a transition")]
    Busy(EntityId),

    /// A state name was declared twice in one graph.
    #[error("state `{0}` is declared twice")]
    DuplicateState(String),

    /// An edge, auto-transition, or initial state names a state the graph
    /// does not have.
    #[error("`{from}` refers to unknown state `{to}`")]
    UnknownTarget {
        /// Where the reference was made (`"initial"` for the initial state).
        from: String,
        /// The missing state.
        to: String,
    },

    /// An auto-transition delay was negative or not finite.
    #[error("auto-transition from `{0}` has an invalid delay")]
    InvalidDelay(String),

    /// A world operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}
