//! Status effects: poison damage ticks and slow timers.

use crate::combat::apply_damage;
use crate::components::*;
use crate::session::DeltaTime;
use bevy_ecs::prelude::*;

/// System that advances poison and deals its damage in fixed half-second ticks.
///
/// Damage goes through the shared armor-aware damage function. The component
/// is removed once its duration runs out.
pub fn poison_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut query: Query<(Entity, &mut Poisoned, &mut Health, Option<&Armor>)>,
) {
    for (entity, mut poison, mut health, armor) in query.iter_mut() {
        if !health.is_alive() {
            continue;
        }
        let raw = poison.advance(dt.0);
        if raw > 0.0 {
            apply_damage(&mut health, armor, raw);
        }
        if poison.is_expired() {
            commands.entity(entity).remove::<Poisoned>();
        }
    }
}

/// System that holds slowed enemies at their reduced speed and restores the
/// original speed exactly when the slow ends.
pub fn slow_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut query: Query<(Entity, &mut Slowed, &mut Velocity)>,
) {
    let delta = finite_or(dt.0, 0.0).max(0.0);
    for (entity, mut slow, mut vel) in query.iter_mut() {
        slow.remaining -= delta;
        if slow.remaining <= 0.0 {
            vel.max_speed = slow.original_speed;
            commands.entity(entity).remove::<Slowed>();
        } else {
            vel.max_speed = slow.slowed_speed();
        }
    }
}
