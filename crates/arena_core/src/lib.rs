//! # arena_core
//!
//! The entity/behavior kernel of the arena simulation.
//!
//! This crate provides:
//!
//! - [`Entity`]: an actor owning a transform, an ordered list of behaviors,
//!   and a listener channel.
//! - [`Behavior`]: a unit of per-tick logic with a priority and lifecycle
//!   hooks, addressed by [`BehaviorKey`].
//! - [`World`]: the authoritative entity store: identity allocation,
//!   buffered behavior attachment, priority-ordered updates, deferred removal,
//!   groups, and shared resources.
//! - [`Engine`]: the tick driver that updates the world and then every
//!   registered [`Updater`].
//!
//! Everything runs on one thread. Behaviors receive a [`BehaviorCtx`] that
//! borrows the whole world while the running behavior is checked out of its
//! slot, so hooks can freely touch siblings and other entities.

pub mod behavior;
pub mod context;
pub mod engine;
pub mod entity;
pub mod error;
pub mod events;
pub mod group;
pub mod resources;
pub mod world;

pub use arena_math::{Transform2D, Vec2};
pub use behavior::{AsAny, Behavior, BehaviorKey, priority};
pub use context::BehaviorCtx;
pub use engine::{Engine, Updater};
pub use entity::{Entity, EntityAllocator, EntityId};
pub use error::WorldError;
pub use events::{EntityEvent, EventKind, ListenerId};
pub use group::{Group, GroupId};
pub use resources::Resources;
pub use world::World;
