//! The collision bridge behavior.
//!
//! A [`Bridge`] ties one physics body to an entity. While enabled it owns a
//! body in the [`Physics`] backend and a [`BodyLink`] in the
//! [`BodyRegistry`]; the [`CollisionSystem`](crate::CollisionSystem) routes
//! contact pairs through that link back into the bridge's
//! [`ContactHandler`].

use arena_core::{Behavior, BehaviorCtx, BehaviorKey, EntityId, Vec2, World, WorldError, priority};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{BodyDesc, BodyId, ContactPhase, Physics, Shape};
use crate::category::{CollisionCategory, Team};
use crate::registry::{BodyLink, BodyRegistry};

/// Which side owns the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncMode {
    /// The entity drives: its position is pushed into the body every tick.
    #[default]
    Push,
    /// Pushed like [`SyncMode::Push`], then the body position is written
    /// back into the entity after every physics step.
    Pull,
}

/// Body description and filters carried by a bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderBody {
    /// Collision shape.
    pub shape: Shape,
    /// Categories the body presents.
    pub category: CollisionCategory,
    /// Categories the body physically collides with.
    pub mask: CollisionCategory,
    /// Categories that produce handler callbacks.
    pub event_mask: CollisionCategory,
    /// Team of the owner.
    pub team: Option<Team>,
    /// Skip contacts with the same team.
    pub ignore_team: bool,
    /// Accept contacts only from this team.
    pub only_team: Option<Team>,
    /// Position ownership.
    pub sync: SyncMode,
    /// Static bodies never move in the backend.
    pub is_static: bool,
    /// Initial body velocity.
    pub velocity: Vec2,
    #[serde(skip)]
    body: Option<BodyId>,
}

impl ColliderBody {
    /// A body presenting `category`, colliding with and listening to everything.
    #[must_use]
    pub fn new(shape: Shape, category: CollisionCategory) -> Self {
        Self {
            shape,
            category,
            mask: CollisionCategory::ALL,
            event_mask: CollisionCategory::ALL,
            team: None,
            ignore_team: false,
            only_team: None,
            sync: SyncMode::Push,
            is_static: false,
            velocity: Vec2::ZERO,
            body: None,
        }
    }

    /// Set the physics mask.
    #[must_use]
    pub fn with_mask(mut self, mask: CollisionCategory) -> Self {
        self.mask = mask;
        self
    }

    /// Set the categories that produce callbacks.
    #[must_use]
    pub fn with_event_mask(mut self, event_mask: CollisionCategory) -> Self {
        self.event_mask = event_mask;
        self
    }

    /// Set the owner's team.
    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    /// Skip contacts with bodies of the same team.
    #[must_use]
    pub fn ignoring_team(mut self) -> Self {
        self.ignore_team = true;
        self
    }

    /// Accept contacts only from `team`.
    #[must_use]
    pub fn only_team(mut self, team: Team) -> Self {
        self.only_team = Some(team);
        self
    }

    /// Let the body drive the entity position, starting at `velocity`.
    #[must_use]
    pub fn pulled(mut self, velocity: Vec2) -> Self {
        self.sync = SyncMode::Pull;
        self.velocity = velocity;
        self
    }

    /// Mark the body static.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Backend id while attached.
    #[must_use]
    pub fn body_id(&self) -> Option<BodyId> {
        self.body
    }

    /// Backend description for a body at `position`.
    #[must_use]
    pub fn desc(&self, position: Vec2) -> BodyDesc {
        BodyDesc {
            shape: self.shape,
            position,
            velocity: self.velocity,
            category: self.category,
            mask: self.mask,
            is_static: self.is_static,
        }
    }

    /// Team filter: `false` when the other side is on the same team and
    /// `ignore_team` is set, or when `only_team` is set and the other side
    /// is not on it.
    #[must_use]
    pub fn accepts(&self, contact: &Contact) -> bool {
        let other_team = contact.other.and_then(|peer| peer.team);
        if self.ignore_team && self.team.is_some() && self.team == other_team {
            return false;
        }
        match self.only_team {
            Some(team) => other_team == Some(team),
            None => true,
        }
    }
}

/// The other side of a contact, when it has a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer {
    /// Owning entity.
    pub entity: EntityId,
    /// Its team.
    pub team: Option<Team>,
    /// Categories its body presents.
    pub category: CollisionCategory,
}

/// One contact as seen from one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Phase of the pair.
    pub phase: ContactPhase,
    /// This side's body.
    pub body: BodyId,
    /// The other body.
    pub other_body: BodyId,
    /// Categories of the other body.
    pub other_category: CollisionCategory,
    /// The other side's bridge, if it has one.
    pub other: Option<Peer>,
    /// Overlap vector from this body towards the other.
    pub penetration: Vec2,
}

impl Contact {
    /// The other entity, if the other body has a bridge.
    #[must_use]
    pub fn other_entity(&self) -> Option<EntityId> {
        self.other.map(|peer| peer.entity)
    }
}

/// Gameplay reaction to contacts. Every hook defaults to doing nothing.
///
/// Hooks run with the bridge checked out, so `ctx` can freely reach the
/// owning entity and the other side.
pub trait ContactHandler: 'static {
    /// A pair started touching.
    fn collide(&mut self, _ctx: &mut BehaviorCtx<'_>, _body: &ColliderBody, _contact: &Contact) {}

    /// A pair is still touching. Reported once per physics sub-step.
    fn active_collide(
        &mut self,
        _ctx: &mut BehaviorCtx<'_>,
        _body: &ColliderBody,
        _contact: &Contact,
    ) {
    }

    /// A pair stopped touching.
    fn end_collide(&mut self, _ctx: &mut BehaviorCtx<'_>, _body: &ColliderBody, _contact: &Contact) {}
}

/// Handler that ignores every contact. Useful for walls and other bodies
/// that only exist to be hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl ContactHandler for Inert {}

/// Behavior owning one physics body and routing its contacts to `H`.
#[derive(Debug)]
pub struct Bridge<H: ContactHandler> {
    body: ColliderBody,
    handler: H,
}

impl<H: ContactHandler> Bridge<H> {
    /// Create a bridge. The body is created when the bridge is enabled.
    #[must_use]
    pub fn new(body: ColliderBody, handler: H) -> Self {
        Self { body, handler }
    }

    /// Body description and filters.
    #[must_use]
    pub fn body(&self) -> &ColliderBody {
        &self.body
    }

    /// Backend id while attached.
    #[must_use]
    pub fn body_id(&self) -> Option<BodyId> {
        self.body.body
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    fn attach(&mut self, ctx: &mut BehaviorCtx<'_>) {
        if self.body.body.is_some() {
            return;
        }
        let entity = ctx.entity_id();
        let desc = self.body.desc(ctx.position());
        let Some(physics) = ctx.resource_mut::<Physics>() else {
            warn!(%entity, "bridge without a physics backend");
            return;
        };
        let body = match physics.add_body(desc) {
            Ok(body) => body,
            Err(err) => {
                warn!(%entity, error = %err, "failed to create body");
                return;
            }
        };
        self.body.body = Some(body);

        let link = BodyLink {
            entity,
            key: ctx.key(),
            category: self.body.category,
            event_mask: self.body.event_mask,
            team: self.body.team,
            pull: self.body.sync == SyncMode::Pull,
            dispatch: dispatch::<H>,
        };
        ctx.world_mut()
            .resources_mut()
            .get_or_default::<BodyRegistry>()
            .register(body, link);
        debug!(%entity, %body, "body attached");
    }

    fn detach(&mut self, ctx: &mut BehaviorCtx<'_>) {
        let Some(body) = self.body.body.take() else {
            return;
        };
        if let Some(physics) = ctx.resource_mut::<Physics>() {
            physics.remove_body(body);
        }
        if let Some(registry) = ctx.resource_mut::<BodyRegistry>() {
            registry.unregister(body);
        }
        debug!(entity = %ctx.entity_id(), %body, "body detached");
    }

    fn handle(&mut self, ctx: &mut BehaviorCtx<'_>, contact: &Contact) {
        let Self { body, handler } = self;
        match contact.phase {
            ContactPhase::Start => handler.collide(ctx, body, contact),
            ContactPhase::Active => handler.active_collide(ctx, body, contact),
            ContactPhase::End => handler.end_collide(ctx, body, contact),
        }
    }
}

impl<H: ContactHandler> Behavior for Bridge<H> {
    fn priority(&self) -> i32 {
        priority::BODY_SYNC
    }

    fn on_enable(&mut self, ctx: &mut BehaviorCtx<'_>) {
        self.attach(ctx);
    }

    fn on_disable(&mut self, ctx: &mut BehaviorCtx<'_>) {
        self.detach(ctx);
    }

    fn on_destroy(&mut self, ctx: &mut BehaviorCtx<'_>) {
        self.detach(ctx);
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, _delta: f32) {
        let Some(body) = self.body.body else {
            return;
        };
        let (entity, position) = (ctx.entity_id(), ctx.position());
        if let Some(physics) = ctx.resource_mut::<Physics>()
            && let Err(err) = physics.set_position(body, position)
        {
            warn!(%entity, error = %err, "failed to push body position");
        }
    }
}

fn dispatch<H: ContactHandler>(
    world: &mut World,
    entity: EntityId,
    key: BehaviorKey,
    contact: &Contact,
) -> Result<(), WorldError> {
    world.with_behavior_keyed::<Bridge<H>, _>(entity, key, |bridge, ctx| bridge.handle(ctx, contact))
}

/// Move an entity and every body it owns.
pub fn move_entity(world: &mut World, entity: EntityId, position: Vec2) {
    let Some(target) = world.entity_mut(entity) else {
        return;
    };
    target.set_position(position);
    let bodies = world
        .resources()
        .get::<BodyRegistry>()
        .map(|registry| registry.bodies_of(entity))
        .unwrap_or_default();
    if let Some(physics) = world.resources_mut().get_mut::<Physics>() {
        for body in bodies {
            if let Err(err) = physics.set_position(body, position) {
                debug!(%entity, error = %err, "stale body while moving entity");
            }
        }
    }
}
