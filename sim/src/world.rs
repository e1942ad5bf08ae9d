//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable, read-only view of the
//! simulation state for render and UI collaborators.

use crate::components::*;
use crate::enemies::EnemyKind;
use crate::session::SessionClock;
use crate::spells::{SpellBook, SpellKind};
use crate::systems::spawner::SpawnDirector;
use crate::upgrades::{UpgradeKind, UpgradeQueue};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: f32,
    pub health_max: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: u64,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub health_max: f32,
    pub size: f32,
    pub tint: (f32, f32, f32),
    pub slowed: bool,
    pub poisoned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub spell: SpellKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub tint: (f32, f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbKind {
    Xp,
    Health,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbSnapshot {
    pub id: u64,
    pub kind: OrbKind,
    pub x: f32,
    pub y: f32,
    pub value: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellSnapshot {
    pub kind: SpellKind,
    pub cooldown: f32,
    pub ready: bool,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Survival time in seconds.
    pub time: f32,
    pub paused: bool,
    pub game_over: bool,
    pub difficulty: f32,
    pub player: Option<PlayerSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub orbs: Vec<OrbSnapshot>,
    pub spells: Vec<SpellSnapshot>,
    /// Upgrades waiting for a choice; empty when nothing is pending.
    pub pending_offer: Vec<UpgradeKind>,
}

fn size_of(footprint: Option<&Footprint>) -> f32 {
    footprint.map(|f| f.width.max(f.height)).unwrap_or(0.0)
}

fn rgb(tint: Option<&Tint>) -> (f32, f32, f32) {
    let tint = tint.copied().unwrap_or_default();
    (tint.r, tint.g, tint.b)
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, paused: bool) -> Self {
        let clock = world.get_resource::<SessionClock>().copied().unwrap_or_default();
        let difficulty = world
            .get_resource::<SpawnDirector>()
            .map(|d| d.difficulty)
            .unwrap_or(1.0);

        let player = world
            .query_filtered::<(&Position, &Velocity, &Health, &Player, Option<&Footprint>), With<Player>>()
            .iter(world)
            .next()
            .map(|(pos, vel, health, stats, footprint)| PlayerSnapshot {
                x: pos.x,
                y: pos.y,
                vx: vel.vx,
                vy: vel.vy,
                health: health.current,
                health_max: health.max,
                level: stats.level,
                xp: stats.xp,
                xp_to_next: stats.xp_to_next,
                size: size_of(footprint),
            });

        let mut enemies: Vec<EnemySnapshot> = world
            .query::<(
                Entity,
                &Enemy,
                &Position,
                &Health,
                Option<&Footprint>,
                Option<&Tint>,
                Has<Slowed>,
                Has<Poisoned>,
            )>()
            .iter(world)
            .map(|(entity, enemy, pos, health, footprint, tint, slowed, poisoned)| EnemySnapshot {
                id: entity.to_bits(),
                kind: enemy.kind,
                x: pos.x,
                y: pos.y,
                health: health.current,
                health_max: health.max,
                size: size_of(footprint),
                tint: rgb(tint),
                slowed,
                poisoned,
            })
            .collect();
        enemies.sort_by_key(|e| e.id);

        let mut projectiles: Vec<ProjectileSnapshot> = world
            .query::<(Entity, &Projectile, &Position, &Velocity, Option<&Footprint>, Option<&Tint>)>()
            .iter(world)
            .map(|(entity, projectile, pos, vel, footprint, tint)| ProjectileSnapshot {
                id: entity.to_bits(),
                spell: projectile.spell,
                x: pos.x,
                y: pos.y,
                vx: vel.vx,
                vy: vel.vy,
                size: size_of(footprint),
                tint: rgb(tint),
            })
            .collect();
        projectiles.sort_by_key(|p| p.id);

        let mut orbs: Vec<OrbSnapshot> = world
            .query::<(Entity, &XpOrb, &Position)>()
            .iter(world)
            .map(|(entity, orb, pos)| OrbSnapshot {
                id: entity.to_bits(),
                kind: OrbKind::Xp,
                x: pos.x,
                y: pos.y,
                value: orb.value,
            })
            .collect();
        orbs.extend(
            world
                .query::<(Entity, &HealthOrb, &Position)>()
                .iter(world)
                .map(|(entity, orb, pos)| OrbSnapshot {
                    id: entity.to_bits(),
                    kind: OrbKind::Health,
                    x: pos.x,
                    y: pos.y,
                    value: orb.value,
                }),
        );
        orbs.sort_by_key(|o| o.id);

        let spells = world
            .get_resource::<SpellBook>()
            .map(|book| {
                book.iter()
                    .map(|spell| SpellSnapshot {
                        kind: spell.kind,
                        cooldown: spell.cooldown,
                        ready: spell.is_ready(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let pending_offer = world
            .get_resource::<UpgradeQueue>()
            .map(|queue| queue.offer.clone())
            .unwrap_or_default();

        Self {
            tick: clock.tick,
            time: clock.elapsed,
            paused,
            game_over: clock.game_over,
            difficulty,
            player,
            enemies,
            projectiles,
            orbs,
            spells,
            pending_offer,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON (for debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
