//! Spawning stage: difficulty curve, spawn timer and enemy waves.

use crate::components::*;
use crate::config::SimConfig;
use crate::enemies::{tier_for, EnemyKind, SpawnTier};
use crate::session::{DeltaTime, SessionClock, SimRng};
use bevy_ecs::prelude::*;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Most spawn events resolved in one pass; any further backlog is dropped.
pub const MAX_SPAWNS_PER_PASS: u32 = 16;

/// Difficulty and spawn timer state.
#[derive(Resource, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpawnDirector {
    pub difficulty: f32,
    /// Seconds accumulated toward the next spawn.
    pub timer: f32,
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self {
            difficulty: 1.0,
            timer: 0.0,
        }
    }
}

/// Difficulty after `elapsed` seconds.
pub fn difficulty_at(elapsed: f32, rate: f32) -> f32 {
    finite_or(1.0 + elapsed.max(0.0) * rate, 1.0).max(1.0)
}

/// Seconds between spawns at `difficulty`. Always positive.
pub fn spawn_interval(config: &SimConfig, difficulty: f32) -> f32 {
    let interval = (config.spawn_interval / difficulty.max(1.0)).max(config.min_spawn_interval);
    if interval.is_finite() && interval > 0.0 {
        interval
    } else {
        SimConfig::default().min_spawn_interval
    }
}

/// Chance that a spawn becomes a swarm.
pub fn swarm_chance(config: &SimConfig, difficulty: f32) -> f32 {
    (config.swarm_base_chance + (difficulty - 1.0).max(0.0) * config.swarm_chance_growth)
        .min(config.swarm_max_chance)
}

/// Spawn one enemy of `kind` through commands.
pub fn spawn_enemy(commands: &mut Commands, kind: EnemyKind, x: f32, y: f32, difficulty: f32) -> Entity {
    let (bundle, armor) = kind.bundle(x, y, difficulty);
    let mut entity = commands.spawn(bundle);
    if let Some(armor) = armor {
        entity.insert(armor);
    }
    entity.id()
}

fn pick_kind(tier: &SpawnTier, rng: &mut Pcg32) -> EnemyKind {
    match WeightedIndex::new(tier.weights.iter().map(|(_, weight)| *weight)) {
        Ok(dist) => tier.weights[dist.sample(rng)].0,
        Err(_) => tier.swarm_kind,
    }
}

/// System that recomputes difficulty from the survival clock.
pub fn difficulty_system(
    config: Res<SimConfig>,
    clock: Res<SessionClock>,
    mut director: ResMut<SpawnDirector>,
) {
    director.difficulty = difficulty_at(clock.elapsed, config.difficulty_rate);
}

/// System that spawns enemies on a ring around the player.
///
/// Each spawn is either a single enemy drawn from the weighted table of the
/// current tier or, with the swarm chance, 3 to 5 enemies of the tier's swarm
/// kind spaced evenly on a small circle.
pub fn spawner_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut director: ResMut<SpawnDirector>,
    mut rng: ResMut<SimRng>,
    player: Query<&Position, With<Player>>,
) {
    let Ok(center) = player.get_single() else {
        return;
    };
    let difficulty = director.difficulty;
    let interval = spawn_interval(&config, difficulty);

    let rng = &mut rng.0;
    director.timer += finite_or(dt.0, 0.0).max(0.0);
    let due = (director.timer / interval).floor();
    director.timer = (director.timer - due * interval).clamp(0.0, interval);
    let spawns = if due > MAX_SPAWNS_PER_PASS as f32 {
        log::warn!("Spawn backlog of {} capped at {}", due, MAX_SPAWNS_PER_PASS);
        MAX_SPAWNS_PER_PASS
    } else {
        due as u32
    };

    for _ in 0..spawns {
        let angle = rng.random_range(0.0..TAU);
        let x = center.x + angle.cos() * config.spawn_distance;
        let y = center.y + angle.sin() * config.spawn_distance;
        let tier = tier_for(difficulty);

        if rng.random::<f32>() < swarm_chance(&config, difficulty) {
            let count = rng.random_range(3..=5u32);
            let offset = rng.random_range(0.0..TAU);
            for i in 0..count {
                let theta = offset + TAU * i as f32 / count as f32;
                spawn_enemy(
                    &mut commands,
                    tier.swarm_kind,
                    x + theta.cos() * config.swarm_radius,
                    y + theta.sin() * config.swarm_radius,
                    difficulty,
                );
            }
            log::debug!(
                "Swarm of {} {} at difficulty {:.2}",
                count,
                tier.swarm_kind.name(),
                difficulty
            );
        } else {
            spawn_enemy(&mut commands, pick_kind(tier, rng), x, y, difficulty);
        }
    }
}
