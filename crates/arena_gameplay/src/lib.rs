//! # arena_gameplay
//!
//! Gameplay building blocks on top of the kernel, the state machine, and
//! the collision bridge: movement ([`Mover`], [`Driver`]), timed cleanup
//! ([`Lifetime`]), arena culling ([`BoundsWatcher`]), death and respawn
//! ([`Vitals`]), and the [`factory`] functions that assemble standard
//! entities.

pub mod bounds;
pub mod driver;
pub mod factory;
pub mod lifetime;
pub mod mover;
pub mod vitals;

pub use bounds::{Bounds, BoundsWatcher};
pub use driver::{Driver, move_towards};
pub use factory::{
    ALIVE, DEAD, PLAYER_HEALTH, PLAYER_RADIUS, PLAYER_SPEED, PROJECTILE_LIFETIME,
    PROJECTILE_RADIUS, PlayerBridge, life_cycle, spawn_capture_point, spawn_heal_zone,
    spawn_player, spawn_projectile, spawn_wall,
};
pub use lifetime::Lifetime;
pub use mover::Mover;
pub use vitals::{DIE, Vitals};
