//! Physics error types.

use crate::backend::BodyId;

/// Errors returned by physics backends and bridges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhysicsError {
    /// No [`Physics`](crate::Physics) resource is installed in the world.
    #[error("no physics backend installed")]
    MissingBackend,

    /// The body id is not in the backend.
    #[error("{0} not found")]
    UnknownBody(BodyId),

    /// A shape dimension was zero, negative, or not finite.
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),
}
