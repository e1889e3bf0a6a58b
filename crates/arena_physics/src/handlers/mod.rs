//! Gameplay contact handlers.
//!
//! Each handler plugs into a [`Bridge`](crate::Bridge). [`Collider`] is the
//! default projectile/body reaction; the rest are bespoke effects.

mod area;
mod capture;
mod collider;
mod cone;
mod heal;
mod knockback;
mod portal;
mod trigger;

pub use area::AreaDamage;
pub use capture::CaptureZone;
pub use collider::{Collider, HitCallback};
pub use cone::ConeDamage;
pub use heal::HealZone;
pub use knockback::Knockback;
pub use portal::Portal;
pub use trigger::Trigger;

use arena_core::{BehaviorCtx, EntityId};

use crate::health::Health;

/// Damage `target` and reap it at zero health. Returns the remaining hit
/// points, or `None` if the target is not destructible.
fn strike(ctx: &mut BehaviorCtx<'_>, target: EntityId, amount: f32) -> Option<f32> {
    let remaining = Health::apply_damage(ctx.world_mut(), target, amount)?;
    Health::reap_if_dead(ctx.world_mut(), target);
    Some(remaining)
}
