//! ECS Systems for the arena survival simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Stage Order
//!
//! Every tick runs six stages, chained in this order on a single thread:
//!
//! **Movement** - input, steering, integration, then the spatial grid rebuild:
//! - `player_input_system`, `ai_steering_system`, `movement_system`
//! - `spatial_grid_update_system`
//!
//! **Status** - `poison_system`, `slow_system`
//!
//! **Cast** - `spell_cast_system` (spawns projectiles)
//!
//! **Collision** - `projectile_collision_system`, `contact_damage_system`,
//! `enemy_death_system` (spawns orbs)
//!
//! **Leveling** - `orb_pickup_system`, `level_up_system`, `upgrade_offer_system`
//!
//! **Spawning** - `difficulty_system`, `spawner_system` (spawns enemies)
//!
//! Commands queued in one stage are applied at the sync point before the
//! next, so projectiles cast this tick collide this tick and orbs dropped this
//! tick can be picked up this tick. Enemies spawned at the end of a tick act
//! from the next tick on.

pub mod casting;
pub mod collision;
pub mod leveling;
pub mod movement;
pub mod spawner;
pub mod status;

pub use casting::*;
pub use collision::*;
pub use leveling::*;
pub use movement::*;
pub use spawner::*;
pub use status::*;

use crate::spatial::spatial_grid_update_system;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

/// The per-tick stages, in execution order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    Movement,
    Status,
    Cast,
    Collision,
    Leveling,
    Spawning,
}

/// Build the single-threaded tick schedule.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);

    schedule.configure_sets(
        (
            SimSet::Movement,
            SimSet::Status,
            SimSet::Cast,
            SimSet::Collision,
            SimSet::Leveling,
            SimSet::Spawning,
        )
            .chain(),
    );

    schedule.add_systems(
        (
            player_input_system,
            ai_steering_system,
            movement_system,
            spatial_grid_update_system,
        )
            .chain()
            .in_set(SimSet::Movement),
    );
    schedule.add_systems((poison_system, slow_system).chain().in_set(SimSet::Status));
    schedule.add_systems(spell_cast_system.in_set(SimSet::Cast));
    schedule.add_systems(
        (
            projectile_collision_system,
            contact_damage_system,
            enemy_death_system,
        )
            .chain()
            .in_set(SimSet::Collision),
    );
    schedule.add_systems(
        (orb_pickup_system, level_up_system, upgrade_offer_system)
            .chain()
            .in_set(SimSet::Leveling),
    );
    schedule.add_systems(
        (difficulty_system, spawner_system)
            .chain()
            .in_set(SimSet::Spawning),
    );

    schedule
}
