//! Session-wide resources shared by the systems.

use bevy_ecs::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Delta time resource for systems.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

impl Default for DeltaTime {
    fn default() -> Self {
        Self(1.0 / 60.0)
    }
}

/// Tick counter and survival clock.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionClock {
    pub tick: u64,
    /// Seconds survived so far.
    pub elapsed: f32,
    /// Set once the player dies without a revive; never cleared.
    pub game_over: bool,
}

impl SessionClock {
    pub fn advance(&mut self, dt: f32) {
        self.tick = self.tick.wrapping_add(1);
        self.elapsed += dt;
    }
}

/// Seeded RNG every random choice in the simulation draws from.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub Pcg32);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }
}

/// Direction requested by the input collaborator, not yet normalized.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub x: f32,
    pub y: f32,
}

/// Events the simulation reports to listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimNotification {
    LevelUp { level: u32 },
    GameOver { survival_time: f32, level: u32 },
}

/// Notifications raised during a tick, drained by `SimWorld` afterwards.
#[derive(Resource, Debug, Clone, Default)]
pub struct Notifications(pub Vec<SimNotification>);

impl Notifications {
    pub fn push(&mut self, notification: SimNotification) {
        self.0.push(notification);
    }

    pub fn drain(&mut self) -> Vec<SimNotification> {
        std::mem::take(&mut self.0)
    }
}
