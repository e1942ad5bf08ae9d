//! Public API for the simulation.
//!
//! This module provides the main interface for render, UI and input
//! collaborators to drive the simulation.
//!
//! ## Fixed Timestep
//!
//! The simulation uses a fixed timestep internally (default 60 Hz). When
//! `step(dt)` is called, the simulation accumulates time and runs fixed
//! updates as needed, so contact damage and other per-tick effects do not
//! depend on the caller's frame rate. `tick(dt)` runs exactly one pass with
//! the given delta for callers that manage time themselves.
//!
//! ## Halting
//!
//! No pass runs while the session is paused, after game over, or while an
//! upgrade offer is waiting and `pause_on_level_up` is set.

use crate::components::*;
use crate::config::{ConfigError, SimConfig};
use crate::enemies::EnemyKind;
use crate::persistence::{BestRecordStore, RecordError};
use crate::session::*;
use crate::spatial::SpatialGrid;
use crate::spells::SpellBook;
use crate::systems::spawner::SpawnDirector;
use crate::systems::{build_schedule, xp_threshold};
use crate::upgrades::{apply_upgrade, Build, UpgradeKind, UpgradeQueue};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// Most fixed updates a single `step` runs; time beyond that is dropped.
pub const MAX_UPDATES_PER_STEP: u32 = 240;

/// Callback receiving simulation notifications.
pub type Listener = Box<dyn FnMut(&SimNotification)>;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing a session
/// - Stepping the simulation forward
/// - Extracting state snapshots
/// - Feeding input and resolving upgrade choices
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    player: Entity,
    paused: bool,
    /// Accumulated time for fixed timestep.
    time_accumulator: f32,
    listeners: Vec<Listener>,
}

impl SimWorld {
    /// Create a session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a session after validating `config`.
    pub fn try_with_config(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Create a session with custom configuration.
    ///
    /// Values `SimConfig::validate` would reject are replaced with defaults.
    pub fn with_config(config: SimConfig) -> Self {
        let config = config.sanitized();
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(SpatialGrid::new(config.grid_cell_size));
        world.insert_resource(SessionClock::default());
        world.insert_resource(SimRng::seeded(config.seed));
        world.insert_resource(PlayerInput::default());
        world.insert_resource(Notifications::default());
        world.insert_resource(SpellBook::starting());
        world.insert_resource(Build::default());
        world.insert_resource(UpgradeQueue::default());
        world.insert_resource(SpawnDirector::default());

        let player = world
            .spawn(PlayerBundle::new(
                0.0,
                0.0,
                config.player_health,
                config.player_speed,
                config.player_size,
                xp_threshold(config.xp_base, 1),
            ))
            .id();

        log::info!("Session started (seed {:#x})", config.seed);
        world.insert_resource(config);

        Self {
            world,
            schedule: build_schedule(),
            player,
            paused: false,
            time_accumulator: 0.0,
            listeners: Vec::new(),
        }
    }

    fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// Whether a pass would run right now.
    pub fn is_running(&self) -> bool {
        !self.paused && !self.is_game_over() && !self.awaiting_choice()
    }

    fn awaiting_choice(&self) -> bool {
        self.config().pause_on_level_up && self.world.resource::<UpgradeQueue>().is_waiting()
    }

    /// Step the simulation forward by `dt` seconds of wall time.
    ///
    /// Returns the number of fixed updates that ran.
    pub fn step(&mut self, dt: f32) -> u32 {
        if !self.is_running() {
            return 0;
        }
        let mut fixed_dt = self.config().fixed_timestep;
        if !fixed_dt.is_finite() || fixed_dt <= 0.0 {
            fixed_dt = SimConfig::default().fixed_timestep;
        }

        self.time_accumulator += finite_or(dt, 0.0).max(0.0);

        let mut ran = 0;
        while self.time_accumulator >= fixed_dt {
            if ran == MAX_UPDATES_PER_STEP {
                log::warn!(
                    "Dropping {:.3}s of simulation time after {} updates",
                    self.time_accumulator,
                    ran
                );
                self.time_accumulator = 0.0;
                break;
            }
            self.time_accumulator -= fixed_dt;
            self.fixed_update(fixed_dt);
            ran += 1;
            if !self.is_running() {
                // Leftover time is dropped rather than replayed after resuming.
                self.time_accumulator = 0.0;
                break;
            }
        }
        ran
    }

    /// Run exactly one pass with `dt`. Returns false if the session is halted.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.is_running() {
            return false;
        }
        self.fixed_update(finite_or(dt, 0.0).max(0.0));
        true
    }

    fn fixed_update(&mut self, dt: f32) {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        self.world.resource_mut::<SessionClock>().advance(dt);

        self.schedule.run(&mut self.world);

        self.dispatch_notifications();
    }

    fn dispatch_notifications(&mut self) {
        let notifications = self.world.resource_mut::<Notifications>().drain();
        for notification in &notifications {
            for listener in self.listeners.iter_mut() {
                listener(notification);
            }
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.world.resource::<SessionClock>().game_over
    }

    /// Register a listener for level-up and game-over notifications.
    pub fn add_listener(&mut self, listener: impl FnMut(&SimNotification) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Set the desired movement direction. Any magnitude is normalized.
    pub fn set_player_input(&mut self, x: f32, y: f32) {
        *self.world.resource_mut::<PlayerInput>() = PlayerInput {
            x: finite_or(x, 0.0),
            y: finite_or(y, 0.0),
        };
    }

    /// Upgrades currently offered; empty when no choice is pending.
    pub fn pending_offer(&self) -> &[UpgradeKind] {
        &self.world.resource::<UpgradeQueue>().offer
    }

    /// Take one of the offered upgrades. Returns false if `kind` is not on offer.
    pub fn choose_upgrade(&mut self, kind: UpgradeKind) -> bool {
        if !self.pending_offer().contains(&kind) {
            return false;
        }
        self.world.resource_mut::<UpgradeQueue>().offer.clear();
        let applied = apply_upgrade(&mut self.world, kind);
        self.refill_offer();
        applied
    }

    /// Decline the current offer.
    pub fn skip_upgrade(&mut self) {
        self.world.resource_mut::<UpgradeQueue>().offer.clear();
        self.refill_offer();
    }

    fn refill_offer(&mut self) {
        let count = self.config().offer_size;
        self.world.resource_scope(|world, mut queue: Mut<UpgradeQueue>| {
            let build = world.resource::<Build>().clone();
            let book = world.resource::<SpellBook>().clone();
            let mut rng = world.resource_mut::<SimRng>();
            queue.refill(&build, &book, &mut rng.0, count);
        });
    }

    /// Spawn an enemy directly, scaled for the current difficulty.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, x: f32, y: f32) -> Entity {
        let difficulty = self.world.resource::<SpawnDirector>().difficulty;
        let (bundle, armor) = kind.bundle(x, y, difficulty);
        let mut entity = self.world.spawn(bundle);
        if let Some(armor) = armor {
            entity.insert(armor);
        }
        entity.id()
    }

    /// Report the finished run to a best-record store.
    pub fn end_session(&self, store: &mut dyn BestRecordStore) -> Result<bool, RecordError> {
        store.check_and_save(self.level(), self.survival_time())
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.paused)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.world.resource::<SessionClock>().tick
    }

    /// Seconds survived so far.
    pub fn survival_time(&self) -> f32 {
        self.world.resource::<SessionClock>().elapsed
    }

    pub fn level(&self) -> u32 {
        self.world.get::<Player>(self.player).map(|p| p.level).unwrap_or(1)
    }

    pub fn difficulty(&self) -> f32 {
        self.world.resource::<SpawnDirector>().difficulty
    }

    pub fn player_entity(&self) -> Entity {
        self.player
    }

    pub fn build(&self) -> &Build {
        self.world.resource::<Build>()
    }

    pub fn spell_book(&self) -> &SpellBook {
        self.world.resource::<SpellBook>()
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimConfig {
        SimConfig {
            spawn_interval: 1000.0,
            min_spawn_interval: 1000.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_new_world() {
        let sim = SimWorld::new();
        assert_eq!(sim.current_tick(), 0);
        assert_eq!(sim.level(), 1);
        assert_eq!(sim.spell_book().len(), 1);
    }

    #[test]
    fn test_step_uses_fixed_timestep() {
        let mut sim = SimWorld::with_config(quiet_config());
        assert_eq!(sim.step(1.0 / 30.0 + 1e-4), 2);
        assert_eq!(sim.current_tick(), 2);
        assert_eq!(sim.step(0.001), 0);
    }

    #[test]
    fn test_pause_skips_pipeline() {
        let mut sim = SimWorld::with_config(quiet_config());
        sim.pause();
        assert_eq!(sim.step(1.0), 0);
        assert!(!sim.tick(0.1));
        assert_eq!(sim.current_tick(), 0);

        sim.resume();
        assert!(sim.tick(0.1));
        assert_eq!(sim.current_tick(), 1);
    }

    #[test]
    fn test_input_moves_player() {
        let mut sim = SimWorld::with_config(quiet_config());
        sim.set_player_input(1.0, 0.0);
        sim.tick(1.0);

        let snapshot = sim.snapshot();
        let player = snapshot.player.unwrap();
        assert!((player.x - sim.config().player_speed).abs() < 1e-3);
    }

    #[test]
    fn test_huge_step_is_bounded() {
        let mut sim = SimWorld::with_config(quiet_config());
        assert_eq!(sim.step(1.0e8), MAX_UPDATES_PER_STEP);
        assert_eq!(sim.current_tick(), MAX_UPDATES_PER_STEP as u64);
        // The backlog was dropped, not carried into the next call.
        assert_eq!(sim.step(0.001), 0);
    }

    #[test]
    fn test_unusable_config_values_fall_back_to_defaults() {
        let mut sim = SimWorld::with_config(SimConfig {
            fixed_timestep: 0.0,
            spawn_interval: 0.0,
            min_spawn_interval: 0.0,
            ..SimConfig::default()
        });
        assert_eq!(sim.config().fixed_timestep, SimConfig::default().fixed_timestep);
        assert_eq!(sim.step(1.0 / 30.0 + 1e-4), 2);

        // Zeroed after construction through direct world access.
        sim.world_mut().resource_mut::<SimConfig>().fixed_timestep = 0.0;
        assert_eq!(sim.step(1.0 / 60.0 + 1e-4), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            fixed_timestep: -1.0,
            ..SimConfig::default()
        };
        assert!(SimWorld::try_with_config(config).is_err());
    }

    #[test]
    fn test_choose_upgrade_requires_offer() {
        let mut sim = SimWorld::with_config(quiet_config());
        assert!(!sim.choose_upgrade(UpgradeKind::Vitality));

        sim.world_mut().resource_mut::<UpgradeQueue>().offer = vec![UpgradeKind::Vitality];
        assert!(!sim.is_running());
        assert!(sim.choose_upgrade(UpgradeKind::Vitality));
        assert!(sim.is_running());
        assert_eq!(sim.build().stacks(UpgradeKind::Vitality), 1);
    }

    #[test]
    fn test_snapshot_json() {
        let mut sim = SimWorld::with_config(quiet_config());
        sim.spawn_enemy(EnemyKind::Bat, 200.0, 0.0);
        let json = sim.snapshot_json();
        assert!(json.contains("enemies"));
        assert!(json.contains("Bat"));
    }
}
