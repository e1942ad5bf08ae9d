//! Cast stage: ticks spell cooldowns and fires ready spells.

use crate::components::*;
use crate::session::DeltaTime;
use crate::spatial::SpatialGrid;
use crate::spells::{apply_modifiers, build_projectiles, SpellBook};
use crate::upgrades::Build;
use bevy_ecs::prelude::*;

/// System that advances every cooldown, then casts each ready spell at the
/// live enemy nearest to the player.
///
/// ## Data Access
/// - Reads: DeltaTime, Build, SpatialGrid, Position (player), Health (enemies)
/// - Writes: SpellBook
/// - Spawns: projectiles, visible to the collision stage of the same tick
pub fn spell_cast_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    build: Res<Build>,
    grid: Res<SpatialGrid>,
    mut book: ResMut<SpellBook>,
    player: Query<&Position, With<Player>>,
    enemies: Query<&Health, With<Enemy>>,
) {
    for spell in book.iter_mut() {
        spell.tick(dt.0);
    }

    let Ok(origin) = player.get_single() else {
        return;
    };
    // Poison may have killed grid entries earlier this tick.
    let Some(target) = grid.nearest(origin.x, origin.y, f32::INFINITY, |entry| {
        enemies
            .get(entry.entity)
            .map(|health| health.is_alive())
            .unwrap_or(false)
    }) else {
        return;
    };
    let target = Position::new(target.x, target.y);

    for spell in book.iter_mut() {
        if !spell.is_ready() {
            continue;
        }
        let specs = apply_modifiers(build_projectiles(spell.kind, *origin, target, &build), &build);
        log::trace!("{} cast, {} projectiles", spell.kind.name(), specs.len());
        for spec in specs {
            spec.spawn(&mut commands);
        }
        spell.trigger();
    }
}
