//! # arena_physics
//!
//! The collision bridge between the arena kernel and a physics world.
//!
//! - [`PhysicsBackend`]: the seam to a physics engine. [`OverlapWorld`] is a
//!   small overlap-only implementation with circles, boxes, and sub-steps.
//! - [`Bridge`]: a behavior owning one body. Its [`ContactHandler`] reacts
//!   to contact start, active, and end phases.
//! - [`CollisionSystem`]: the updater that steps physics after the world
//!   update and dispatches each reported pair to both sides, subject to
//!   each bridge's `event_mask`.
//! - [`handlers`]: damage, healing, capture, knockback, portals, triggers.
//!
//! ```rust
//! use arena_core::{Engine, Transform2D, Vec2};
//! use arena_physics::{
//!     Bridge, ColliderBody, Collider, CollisionCategory, CollisionSystem, Health, Inert,
//!     OverlapWorld, Shape,
//! };
//!
//! let mut engine = Engine::new();
//! CollisionSystem::install(engine.world_mut(), OverlapWorld::new());
//! engine.add_updater(CollisionSystem::new());
//!
//! let world = engine.world_mut();
//! let target = world.spawn(Transform2D::from_position(Vec2::new(1.0, 0.0)), None).unwrap();
//! world.add_behavior(target, Health::new(10.0)).unwrap();
//! let hull = ColliderBody::new(Shape::Circle { radius: 1.0 }, CollisionCategory::PLAYER);
//! world.add_behavior(target, Bridge::new(hull, Inert)).unwrap();
//!
//! let shot = world.spawn(Transform2D::IDENTITY, None).unwrap();
//! let tip = ColliderBody::new(Shape::Circle { radius: 0.5 }, CollisionCategory::PROJECTILE);
//! world.add_behavior(shot, Bridge::new(tip, Collider::with_power(3.0))).unwrap();
//!
//! engine.tick(1.0 / 60.0);
//! assert_eq!(engine.world().get::<Health>(target).unwrap().current(), 7.0);
//! assert!(!engine.world().is_alive(shot));
//! ```

pub mod backend;
pub mod bridge;
pub mod category;
pub mod error;
pub mod handlers;
pub mod health;
pub mod overlap;
pub mod registry;
pub mod system;

pub use backend::{BodyDesc, BodyId, ContactEvent, ContactPhase, Physics, PhysicsBackend, Shape};
pub use bridge::{Bridge, ColliderBody, Contact, ContactHandler, Inert, Peer, SyncMode, move_entity};
pub use category::{CollisionCategory, Team, filters_allow};
pub use error::PhysicsError;
pub use handlers::{
    AreaDamage, CaptureZone, Collider, ConeDamage, HealZone, HitCallback, Knockback, Portal,
    Trigger,
};
pub use health::Health;
pub use overlap::OverlapWorld;
pub use registry::{BodyLink, BodyRegistry, Dispatch};
pub use system::CollisionSystem;
