//! Standard entity builds for arena matches.
//!
//! Every factory queues its behaviors on a fresh entity before adding it, so
//! the whole stack initializes together in attachment order.

use std::sync::Arc;

use arena_core::{EntityId, Transform2D, Vec2, World, WorldError};
use arena_fsm::{FsmError, State, StateGraph, StateMachine};
use arena_physics::{
    Bridge, CaptureZone, ColliderBody, Collider, CollisionCategory, HealZone, Health, Inert, Shape,
    Team,
};

use crate::driver::Driver;
use crate::lifetime::Lifetime;
use crate::mover::Mover;
use crate::vitals::{DIE, Vitals};

/// State a player is in while it can move and be hit.
pub const ALIVE: &str = "alive";
/// State a downed player waits in until it respawns.
pub const DEAD: &str = "dead";

/// Radius of a player's body.
pub const PLAYER_RADIUS: f32 = 0.5;
/// Hit points a player spawns and respawns with.
pub const PLAYER_HEALTH: f32 = 100.0;
/// Patrol speed in units per second.
pub const PLAYER_SPEED: f32 = 4.0;
/// Radius of a projectile's body.
pub const PROJECTILE_RADIUS: f32 = 0.15;
/// Seconds a projectile flies before expiring.
pub const PROJECTILE_LIFETIME: f32 = 3.0;

/// The bridge every player carries.
pub type PlayerBridge = Bridge<Collider>;

/// Alive/dead cycle for players. Dying disables movement and the body;
/// after `respawn_delay` seconds the player comes back with full health.
///
/// # Errors
///
/// Returns [`FsmError::InvalidDelay`] for a negative or non-finite delay.
pub fn life_cycle(respawn_delay: f32) -> Result<StateGraph, FsmError> {
    StateGraph::builder()
        .state(
            State::new(ALIVE)
                .enable::<Mover>()
                .enable::<Driver>()
                .enable::<PlayerBridge>()
                .enable::<Vitals>()
                .on(DIE, DEAD),
        )
        .state(
            State::new(DEAD)
                .with_priority(10)
                .disable::<Driver>()
                .disable::<Mover>()
                .disable::<PlayerBridge>()
                .disable::<Vitals>()
                .auto(ALIVE, respawn_delay),
        )
        .build()
}

/// A player patrolling `route`, driven by the [`life_cycle`] graph.
///
/// # Errors
///
/// Returns [`FsmError::UnknownTarget`] if `graph` has no [`ALIVE`] state,
/// or the world error if the entity cannot be added.
pub fn spawn_player(
    world: &mut World,
    graph: &Arc<StateGraph>,
    position: Vec2,
    team: Team,
    route: Vec<Vec2>,
) -> Result<EntityId, FsmError> {
    let machine = StateMachine::starting_in(Arc::clone(graph), ALIVE)?;
    let body = ColliderBody::new(Shape::Circle { radius: PLAYER_RADIUS }, CollisionCategory::PLAYER)
        .with_team(team)
        .with_event_mask(CollisionCategory::WALL);

    let mut entity = world.create_entity(Transform2D::from_position(position));
    entity.add_behavior(Health::new(PLAYER_HEALTH).downable());
    entity.add_behavior(Vitals::new());
    entity.add_behavior(Mover::default());
    entity.add_behavior(Driver::patrol(route, PLAYER_SPEED));
    entity.add_behavior(PlayerBridge::new(body, Collider::new()));
    entity.add_behavior(machine);
    Ok(world.add_entity(entity, None)?)
}

/// A fragile projectile flying at `velocity`, damaging the first enemy or
/// wall it touches.
///
/// # Errors
///
/// Returns [`WorldError`] if the entity cannot be added.
pub fn spawn_projectile(
    world: &mut World,
    position: Vec2,
    velocity: Vec2,
    team: Team,
    power: f32,
) -> Result<EntityId, WorldError> {
    let targets = CollisionCategory::PLAYER | CollisionCategory::WALL;
    let body = ColliderBody::new(
        Shape::Circle {
            radius: PROJECTILE_RADIUS,
        },
        CollisionCategory::PROJECTILE,
    )
    .with_mask(targets)
    .with_event_mask(targets)
    .with_team(team)
    .ignoring_team()
    .pulled(velocity);

    let transform = Transform2D {
        rotation: velocity.y.atan2(velocity.x),
        ..Transform2D::from_position(position)
    };
    let mut entity = world.create_entity(transform);
    entity.add_behavior(Bridge::new(body, Collider::with_power(power).fragile()));
    entity.add_behavior(Lifetime::new(PROJECTILE_LIFETIME));
    world.add_entity(entity, None)
}

/// A static wall centred on `center`.
///
/// # Errors
///
/// Returns [`WorldError`] if the entity cannot be added.
pub fn spawn_wall(world: &mut World, center: Vec2, half_extents: Vec2) -> Result<EntityId, WorldError> {
    let body = ColliderBody::new(Shape::Rect { half_extents }, CollisionCategory::WALL)
        .with_event_mask(CollisionCategory::NONE)
        .fixed();
    let mut entity = world.create_entity(Transform2D::from_position_size(center, half_extents * 2.0));
    entity.add_behavior(Bridge::new(body, Inert));
    world.add_entity(entity, None)
}

/// A heal zone restoring `amount` per physics sub-step to players standing
/// in it, optionally only to one team.
///
/// # Errors
///
/// Returns [`WorldError`] if the entity cannot be added.
pub fn spawn_heal_zone(
    world: &mut World,
    position: Vec2,
    radius: f32,
    amount: f32,
    team: Option<Team>,
) -> Result<EntityId, WorldError> {
    let mut body = ColliderBody::new(Shape::Circle { radius }, CollisionCategory::ZONE)
        .with_mask(CollisionCategory::PLAYER)
        .with_event_mask(CollisionCategory::PLAYER)
        .fixed();
    if let Some(team) = team {
        body = body.only_team(team);
    }
    let mut entity = world.create_entity(Transform2D::from_position(position));
    entity.add_behavior(Bridge::new(body, HealZone::new(amount)));
    world.add_entity(entity, None)
}

/// A capture point.
///
/// # Errors
///
/// Returns [`WorldError`] if the entity cannot be added.
pub fn spawn_capture_point(
    world: &mut World,
    position: Vec2,
    radius: f32,
    rate: f32,
    required: f32,
) -> Result<EntityId, WorldError> {
    let body = ColliderBody::new(Shape::Circle { radius }, CollisionCategory::ZONE)
        .with_mask(CollisionCategory::PLAYER)
        .with_event_mask(CollisionCategory::PLAYER)
        .fixed();
    let mut entity = world.create_entity(Transform2D::from_position(position));
    entity.add_behavior(Bridge::new(body, CaptureZone::new(rate, required)));
    world.add_entity(entity, None)
}
