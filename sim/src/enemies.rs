//! Enemy archetypes and the difficulty-tiered spawn table.

use crate::components::*;
use serde::{Deserialize, Serialize};

/// Closed set of enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Slime,
    Bat,
    Skeleton,
    Golem,
    Wraith,
}

/// Base stats of an archetype at difficulty 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    pub speed: f32,
    pub size: f32,
    pub xp: f32,
    pub armor: f32,
    pub behavior: AiBehavior,
    pub tint: Tint,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Slime,
        EnemyKind::Bat,
        EnemyKind::Skeleton,
        EnemyKind::Golem,
        EnemyKind::Wraith,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Slime => "Slime",
            EnemyKind::Bat => "Bat",
            EnemyKind::Skeleton => "Skeleton",
            EnemyKind::Golem => "Golem",
            EnemyKind::Wraith => "Wraith",
        }
    }

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Slime => EnemyStats {
                health: 20.0,
                speed: 55.0,
                size: 28.0,
                xp: 1.0,
                armor: 0.0,
                behavior: AiBehavior::ChasePlayer,
                tint: Tint::rgb(0.4, 0.9, 0.3),
            },
            EnemyKind::Bat => EnemyStats {
                health: 12.0,
                speed: 95.0,
                size: 20.0,
                xp: 1.0,
                armor: 0.0,
                behavior: AiBehavior::Circle { radius: 60.0 },
                tint: Tint::rgb(0.5, 0.3, 0.6),
            },
            EnemyKind::Skeleton => EnemyStats {
                health: 40.0,
                speed: 70.0,
                size: 30.0,
                xp: 3.0,
                armor: 0.1,
                behavior: AiBehavior::ChasePlayer,
                tint: Tint::rgb(0.9, 0.9, 0.85),
            },
            EnemyKind::Golem => EnemyStats {
                health: 120.0,
                speed: 40.0,
                size: 48.0,
                xp: 8.0,
                armor: 0.3,
                behavior: AiBehavior::ChasePlayer,
                tint: Tint::rgb(0.55, 0.45, 0.35),
            },
            EnemyKind::Wraith => EnemyStats {
                health: 70.0,
                speed: 110.0,
                size: 32.0,
                xp: 6.0,
                armor: 0.0,
                behavior: AiBehavior::Circle { radius: 90.0 },
                tint: Tint::rgb(0.6, 0.8, 1.0),
            },
        }
    }

    /// Build the components of this archetype scaled for `difficulty`.
    ///
    /// Health scales linearly; speed scales at a quarter of that rate.
    pub fn bundle(self, x: f32, y: f32, difficulty: f32) -> (EnemyBundle, Option<Armor>) {
        let stats = self.stats();
        let difficulty = finite_or(difficulty, 1.0).max(1.0);
        let speed = stats.speed * speed_scale(difficulty);

        let bundle = EnemyBundle {
            enemy: Enemy {
                kind: self,
                xp_value: stats.xp,
            },
            position: Position::new(x, y),
            velocity: Velocity::default().with_max_speed(speed),
            health: Health::new(stats.health * difficulty),
            footprint: Footprint::square(stats.size),
            tint: stats.tint,
            ai: Ai {
                behavior: stats.behavior,
            },
        };
        let armor = (stats.armor > 0.0).then(|| Armor::new(stats.armor));
        (bundle, armor)
    }
}

/// Enemy speed multiplier for a difficulty value.
pub fn speed_scale(difficulty: f32) -> f32 {
    1.0 + (difficulty - 1.0).max(0.0) * 0.25
}

/// One row of the spawn table.
#[derive(Debug, Clone, Copy)]
pub struct SpawnTier {
    /// Lowest difficulty at which this tier applies.
    pub min_difficulty: f32,
    pub weights: &'static [(EnemyKind, u32)],
    /// Weaker archetype used for radial swarms.
    pub swarm_kind: EnemyKind,
}

pub const SPAWN_TIERS: [SpawnTier; 4] = [
    SpawnTier {
        min_difficulty: 0.0,
        weights: &[(EnemyKind::Slime, 70), (EnemyKind::Bat, 30)],
        swarm_kind: EnemyKind::Slime,
    },
    SpawnTier {
        min_difficulty: 1.5,
        weights: &[
            (EnemyKind::Slime, 40),
            (EnemyKind::Bat, 35),
            (EnemyKind::Skeleton, 25),
        ],
        swarm_kind: EnemyKind::Bat,
    },
    SpawnTier {
        min_difficulty: 2.5,
        weights: &[
            (EnemyKind::Slime, 20),
            (EnemyKind::Bat, 30),
            (EnemyKind::Skeleton, 30),
            (EnemyKind::Golem, 20),
        ],
        swarm_kind: EnemyKind::Bat,
    },
    SpawnTier {
        min_difficulty: 4.0,
        weights: &[
            (EnemyKind::Bat, 20),
            (EnemyKind::Skeleton, 30),
            (EnemyKind::Golem, 30),
            (EnemyKind::Wraith, 20),
        ],
        swarm_kind: EnemyKind::Skeleton,
    },
];

/// Highest tier whose threshold `difficulty` has reached.
pub fn tier_for(difficulty: f32) -> &'static SpawnTier {
    SPAWN_TIERS
        .iter()
        .rev()
        .find(|tier| difficulty >= tier.min_difficulty)
        .unwrap_or(&SPAWN_TIERS[0])
}
