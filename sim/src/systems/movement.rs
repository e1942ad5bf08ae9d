//! Movement stage: player input, enemy steering, then velocity to position.

use crate::components::*;
use crate::session::{DeltaTime, PlayerInput};
use bevy_ecs::prelude::*;

/// System that turns the input direction into the player's velocity.
///
/// The direction is normalized, so diagonal input is not faster.
pub fn player_input_system(
    input: Option<Res<PlayerInput>>,
    mut query: Query<&mut Velocity, With<Player>>,
) {
    let (x, y) = input.map(|i| (i.x, i.y)).unwrap_or_default();
    for mut vel in query.iter_mut() {
        vel.steer_toward(finite_or(x, 0.0), finite_or(y, 0.0));
    }
}

/// System that points every enemy according to its AI behavior.
pub fn ai_steering_system(
    player: Query<&Position, With<Player>>,
    mut enemies: Query<(&Position, &mut Velocity, &Ai), (With<Enemy>, Without<Player>)>,
) {
    let Ok(target) = player.get_single() else {
        return;
    };

    for (pos, mut vel, ai) in enemies.iter_mut() {
        let dx = target.x - pos.x;
        let dy = target.y - pos.y;

        match ai.behavior {
            AiBehavior::ChasePlayer => vel.steer_toward(dx, dy),
            AiBehavior::Circle { radius } => {
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > radius {
                    vel.steer_toward(dx, dy);
                } else {
                    // Orbit counter-clockwise around the player.
                    vel.steer_toward(-dy, dx);
                }
            }
            AiBehavior::Idle => {
                vel.vx = 0.0;
                vel.vy = 0.0;
            }
        }
    }
}

/// System that clamps velocity to its cap and applies it to position.
pub fn movement_system(dt: Res<DeltaTime>, mut query: Query<(&mut Position, &mut Velocity)>) {
    let delta = finite_or(dt.0, 0.0).max(0.0);
    for (mut pos, mut vel) in query.iter_mut() {
        vel.clamp_to_max();
        pos.x += vel.vx * delta;
        pos.y += vel.vy * delta;
    }
}
