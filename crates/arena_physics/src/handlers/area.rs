use arena_core::BehaviorCtx;
use serde::{Deserialize, Serialize};

use super::strike;
use crate::bridge::{ColliderBody, Contact, ContactHandler};

/// Damage that falls off linearly with distance from the owner's centre.
///
/// Full `power` at the centre, zero at `radius` and beyond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaDamage {
    /// Damage at the centre.
    pub power: f32,
    /// Distance at which damage reaches zero.
    pub radius: f32,
}

impl AreaDamage {
    /// Area damage of `power`, fading out at `radius`.
    #[must_use]
    pub fn new(power: f32, radius: f32) -> Self {
        Self { power, radius }
    }

    /// Damage dealt at `distance` from the centre.
    #[must_use]
    pub fn falloff(&self, distance: f32) -> f32 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        self.power * (1.0 - distance / self.radius).clamp(0.0, 1.0)
    }
}

impl ContactHandler for AreaDamage {
    fn collide(&mut self, ctx: &mut BehaviorCtx<'_>, body: &ColliderBody, contact: &Contact) {
        if !body.accepts(contact) {
            return;
        }
        let Some(target) = contact.other_entity() else {
            return;
        };
        let Some(position) = ctx.world().entity(target).map(|e| e.position()) else {
            return;
        };
        let amount = self.falloff(ctx.transform().distance_to(position));
        if amount > 0.0 {
            strike(ctx, target, amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{Transform2D, Vec2};

    use super::*;
    use crate::category::Team;
    use crate::handlers::fixtures::{dummy, engine, hp, zone};

    #[test]
    fn test_linear_falloff() {
        let area = AreaDamage::new(10.0, 4.0);
        assert_eq!(area.falloff(0.0), 10.0);
        assert_eq!(area.falloff(2.0), 5.0);
        assert_eq!(area.falloff(4.0), 0.0);
        assert_eq!(area.falloff(9.0), 0.0);
    }

    #[test]
    fn test_damage_scales_with_distance() {
        let mut engine = engine();
        let near = dummy(&mut engine, Vec2::new(1.0, 0.0), 20.0, Team(1));
        let far = dummy(&mut engine, Vec2::new(0.0, 3.0), 20.0, Team(1));
        zone(&mut engine, Transform2D::IDENTITY, 4.0, AreaDamage::new(8.0, 4.0));

        engine.tick(0.1);
        assert_eq!(hp(&engine, near), 14.0);
        assert_eq!(hp(&engine, far), 18.0);

        // Start events only: lingering in the area does not stack.
        engine.tick(0.1);
        assert_eq!(hp(&engine, near), 14.0);
    }
}
