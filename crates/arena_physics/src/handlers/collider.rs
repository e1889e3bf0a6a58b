use arena_core::{BehaviorCtx, EntityEvent};
use tracing::debug;

use crate::bridge::{ColliderBody, Contact, ContactHandler};
use crate::health::Health;

/// Called for every accepted hit, before damage is applied.
pub type HitCallback = Box<dyn FnMut(&mut BehaviorCtx<'_>, &Contact)>;

/// The default contact reaction.
///
/// On contact start: apply the team filter, emit [`EntityEvent::Hit`], run
/// the hit callback, then, when carrying `power` and the other side has
/// [`Health`], damage it, destroy the instigator, and destroy the target
/// once its health reaches zero unless it is downable. A `fragile` collider also destroys itself
/// on any accepted hit that dealt no damage.
#[derive(Default)]
pub struct Collider {
    /// Damage dealt to destructible targets.
    pub power: f32,
    /// Destroy the owner on any accepted hit.
    pub fragile: bool,
    on_hit: Option<HitCallback>,
}

impl Collider {
    /// A collider that deals no damage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A damaging collider.
    #[must_use]
    pub fn with_power(power: f32) -> Self {
        Self {
            power,
            ..Self::default()
        }
    }

    /// Destroy the owner on any accepted hit.
    #[must_use]
    pub fn fragile(mut self) -> Self {
        self.fragile = true;
        self
    }

    /// Set the hit callback.
    #[must_use]
    pub fn on_hit(mut self, callback: impl FnMut(&mut BehaviorCtx<'_>, &Contact) + 'static) -> Self {
        self.on_hit = Some(Box::new(callback));
        self
    }
}

impl ContactHandler for Collider {
    fn collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        let other = contact.other_entity();
        ctx.emit(EntityEvent::Hit { other });
        if let Some(callback) = self.on_hit.as_mut() {
            callback(ctx, contact);
        }

        if self.power > 0.0
            && let Some(target) = other
            && let Some(remaining) = Health::apply_damage(ctx.world_mut(), target, self.power)
        {
            debug!(instigator = %ctx.entity_id(), %target, remaining, "hit");
            ctx.destroy_entity();
            Health::reap_if_dead(ctx.world_mut(), target);
            return;
        }
        if self.fragile {
            ctx.destroy_entity();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use arena_core::{Engine, EntityId, EventKind, Transform2D, Vec2};

    use super::*;
    use crate::backend::Shape;
    use crate::bridge::{Bridge, Inert};
    use crate::category::{CollisionCategory, Team};
    use crate::handlers::fixtures::engine;

    fn target(engine: &mut Engine, x: f32, hp: f32, team: Team) -> EntityId {
        let world = engine.world_mut();
        let id = world
            .spawn(Transform2D::from_position(Vec2::new(x, 0.0)), None)
            .unwrap();
        world.add_behavior(id, Health::new(hp)).unwrap();
        let body = ColliderBody::new(Shape::Circle { radius: 1.0 }, CollisionCategory::PLAYER)
            .with_team(team)
            .with_event_mask(CollisionCategory::NONE);
        world.add_behavior(id, Bridge::new(body, Inert)).unwrap();
        id
    }

    fn bullet(engine: &mut Engine, collider: Collider, team: Team) -> EntityId {
        let world = engine.world_mut();
        let id = world.spawn(Transform2D::IDENTITY, None).unwrap();
        let body = ColliderBody::new(Shape::Circle { radius: 0.5 }, CollisionCategory::PROJECTILE)
            .with_team(team)
            .ignoring_team();
        world.add_behavior(id, Bridge::new(body, collider)).unwrap();
        id
    }

    #[test]
    fn test_damage_destroys_instigator() {
        let mut engine = engine();
        let victim = target(&mut engine, 1.0, 10.0, Team(2));
        let shot = bullet(&mut engine, Collider::with_power(4.0), Team(1));

        engine.tick(0.1);
        let world = engine.world();
        assert!(!world.is_alive(shot));
        assert_eq!(world.get::<Health>(victim).unwrap().current(), 6.0);
        assert!(world.is_alive(victim));
    }

    #[test]
    fn test_lethal_hit_destroys_target() {
        let mut engine = engine();
        let victim = target(&mut engine, 1.0, 3.0, Team(2));
        bullet(&mut engine, Collider::with_power(4.0), Team(1));

        engine.tick(0.1);
        assert!(!engine.world().is_alive(victim));
    }

    #[test]
    fn test_downable_target_survives_lethal_hit() {
        let mut engine = engine();
        let victim = target(&mut engine, 1.0, 3.0, Team(2));
        *engine.world_mut().get_mut::<Health>(victim).unwrap() = Health::new(3.0).downable();
        bullet(&mut engine, Collider::with_power(4.0), Team(1));

        engine.tick(0.1);
        let world = engine.world();
        assert!(world.is_alive(victim));
        assert!(world.get::<Health>(victim).unwrap().is_dead());
    }

    #[test]
    fn test_same_team_is_ignored() {
        let mut engine = engine();
        let friend = target(&mut engine, 1.0, 10.0, Team(1));
        let shot = bullet(&mut engine, Collider::with_power(4.0).fragile(), Team(1));

        engine.tick(0.1);
        let world = engine.world();
        assert!(world.is_alive(shot));
        assert_eq!(world.get::<Health>(friend).unwrap().current(), 10.0);
    }

    #[test]
    fn test_hit_event_and_callback() {
        let mut engine = engine();
        let victim = target(&mut engine, 1.0, 10.0, Team(2));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let collider = Collider::new().on_hit(move |_, contact| {
            sink.borrow_mut().push(contact.other_entity());
        });
        let shot = bullet(&mut engine, collider, Team(1));
        engine.world_mut().drain_events();

        engine.tick(0.1);
        assert_eq!(*seen.borrow(), vec![Some(victim)]);
        let hits: Vec<_> = engine
            .world_mut()
            .drain_events()
            .into_iter()
            .filter(|(_, event)| event.kind() == EventKind::Hit)
            .collect();
        assert_eq!(hits, vec![(shot, EntityEvent::Hit { other: Some(victim) })]);
        // No power and not fragile: the collider survives.
        assert!(engine.world().is_alive(shot));
    }

    #[test]
    fn test_fragile_dies_on_walls() {
        let mut engine = engine();
        let world = engine.world_mut();
        let wall = world
            .spawn(Transform2D::from_position(Vec2::new(1.0, 0.0)), None)
            .unwrap();
        let body = ColliderBody::new(
            Shape::Rect {
                half_extents: Vec2::ONE,
            },
            CollisionCategory::WALL,
        )
        .fixed()
        .with_event_mask(CollisionCategory::NONE);
        world.add_behavior(wall, Bridge::new(body, Inert)).unwrap();
        let shot = bullet(&mut engine, Collider::with_power(5.0).fragile(), Team(1));

        engine.tick(0.1);
        assert!(!engine.world().is_alive(shot));
        assert!(engine.world().is_alive(wall));
    }
}
