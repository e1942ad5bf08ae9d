//! Arena Survival - Simulation Core
//!
//! A deterministic, fixed-timestep ECS simulation of a real-time arena
//! survival game: a player fends off escalating enemy waves with auto-cast
//! spells shaped by a growing stack of upgrades.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod combat;
pub mod components;
pub mod config;
pub mod enemies;
pub mod persistence;
pub mod session;
pub mod spatial;
pub mod spells;
pub mod systems;
pub mod upgrades;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::{ConfigError, SimConfig};
pub use enemies::EnemyKind;
pub use persistence::{BestRecordStore, JsonFileRecordStore, MemoryRecordStore, RecordError};
pub use session::{DeltaTime, SimNotification};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use spells::{SpellBook, SpellKind};
pub use systems::SimSet;
pub use upgrades::{Build, ModifierFlags, UpgradeKind};
pub use world::Snapshot;
