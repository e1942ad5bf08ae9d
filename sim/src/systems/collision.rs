//! Collision stage: projectile hits, contact damage and the corpse sweep.
//!
//! The stage runs three systems in a fixed order:
//!
//! 1. `projectile_collision_system` - lifetime, direct hits, status effects,
//!    chain propagation, pierce bookkeeping and explosions on destroy.
//! 2. `contact_damage_system` - overlapping enemies hurt the player once per
//!    tick each; handles revive and game over.
//! 3. `enemy_death_system` - despawns dead enemies and drops their orbs,
//!    resolving death bursts as a worklist.
//!
//! Enemies killed earlier in a pass keep their entity until the sweep but have
//! zero health, so every lookup below filters on `is_alive`. Projectiles
//! destroyed in a pass are tracked in a local removed set.

use crate::combat::{apply_damage, discs_overlap, explosion_damage};
use crate::components::*;
use crate::config::SimConfig;
use crate::session::{DeltaTime, Notifications, SessionClock, SimNotification, SimRng};
use crate::spatial::SpatialGrid;
use crate::upgrades::{Build, ModifierFlags, DEATH_BURST_DAMAGE, DEATH_BURST_RADIUS};
use bevy_ecs::prelude::*;
use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};

/// Fraction of max health restored by a revive.
pub const REVIVE_HEALTH_FRACTION: f32 = 0.5;

type ProjectileItems = (
    &'static mut Projectile,
    &'static mut HitHistory,
    &'static Position,
    Option<&'static Footprint>,
    Option<&'static CollisionRadius>,
    Option<&'static mut Pierce>,
    Option<&'static mut Chain>,
    Option<&'static Explosive>,
    Option<&'static SlowOnHit>,
    Option<&'static PoisonOnHit>,
);

type EnemyItems = (
    &'static Position,
    &'static mut Health,
    Option<&'static Armor>,
    Option<&'static mut Velocity>,
    Option<&'static mut Slowed>,
    Option<&'static mut Poisoned>,
);

type EnemyQuery<'w, 's> =
    Query<'w, 's, EnemyItems, (With<Enemy>, Without<Projectile>, Without<Player>)>;

/// Status effects for enemies that did not carry the component yet.
/// Inserted through commands once the pass is over.
#[derive(Default)]
struct PendingStatus {
    slowed: HashMap<Entity, Slowed>,
    poisoned: HashMap<Entity, Poisoned>,
}

impl PendingStatus {
    fn flush(self, commands: &mut Commands) {
        let mut slowed: Vec<_> = self.slowed.into_iter().collect();
        slowed.sort_by_key(|(entity, _)| *entity);
        for (entity, slow) in slowed {
            commands.entity(entity).try_insert(slow);
        }

        let mut poisoned: Vec<_> = self.poisoned.into_iter().collect();
        poisoned.sort_by_key(|(entity, _)| *entity);
        for (entity, poison) in poisoned {
            commands.entity(entity).try_insert(poison);
        }
    }
}

fn is_live(enemies: &EnemyQuery, entity: Entity) -> bool {
    enemies
        .get(entity)
        .map(|(_, health, ..)| health.is_alive())
        .unwrap_or(false)
}

fn damage_enemy(enemies: &mut EnemyQuery, entity: Entity, amount: f32) -> f32 {
    match enemies.get_mut(entity) {
        Ok((_, mut health, armor, ..)) => apply_damage(&mut health, armor, amount),
        Err(_) => 0.0,
    }
}

fn apply_slow(enemies: &mut EnemyQuery, pending: &mut PendingStatus, entity: Entity, slow: &SlowOnHit) {
    // Slow acts on max speed, so enemies that never move cannot be slowed.
    let Ok((_, _, _, Some(mut vel), existing, _)) = enemies.get_mut(entity) else {
        return;
    };
    match existing {
        Some(mut active) => {
            active.reapply(slow.amount, slow.duration);
            vel.max_speed = active.slowed_speed();
        }
        None => {
            let active = pending
                .slowed
                .entry(entity)
                .and_modify(|active| active.reapply(slow.amount, slow.duration))
                .or_insert_with(|| Slowed::new(slow.amount, slow.duration, vel.max_speed));
            vel.max_speed = active.slowed_speed();
        }
    }
}

fn apply_poison(
    enemies: &mut EnemyQuery,
    pending: &mut PendingStatus,
    entity: Entity,
    poison: &PoisonOnHit,
) {
    let Ok((.., existing)) = enemies.get_mut(entity) else {
        return;
    };
    match existing {
        Some(mut active) => active.reapply(poison.dps, poison.duration),
        None => {
            pending
                .poisoned
                .entry(entity)
                .and_modify(|active| active.reapply(poison.dps, poison.duration))
                .or_insert_with(|| Poisoned::new(poison.dps, poison.duration));
        }
    }
}

/// Enemies caught in an explosion and the damage each takes, closest first.
pub fn explosion_targets(
    grid: &SpatialGrid,
    x: f32,
    y: f32,
    radius: f32,
    damage: f32,
) -> Vec<(Entity, f32)> {
    if !radius.is_finite() || radius <= 0.0 {
        return Vec::new();
    }
    grid.query_radius(x, y, radius)
        .into_iter()
        .map(|entry| {
            let dist = ((entry.x - x).powi(2) + (entry.y - y).powi(2)).sqrt();
            (entry.entity, explosion_damage(damage, radius, dist))
        })
        .filter(|(_, amount)| *amount > 0.0)
        .collect()
}

/// System that resolves projectile lifetime and projectile/enemy overlaps.
///
/// ## Data Access
/// - Reads: DeltaTime, SpatialGrid
/// - Writes: Projectile, HitHistory, Pierce, Chain, Health/Velocity/Slowed/Poisoned (enemies)
/// - Despawns: expired and spent projectiles
pub fn projectile_collision_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    mut projectiles: Query<(Entity, ProjectileItems), Without<Enemy>>,
    mut enemies: EnemyQuery,
) {
    let delta = finite_or(dt.0, 0.0).max(0.0);
    let mut pending = PendingStatus::default();
    let mut removed: HashSet<Entity> = HashSet::new();

    let mut order: Vec<Entity> = projectiles.iter().map(|(entity, _)| entity).collect();
    order.sort();

    for projectile_entity in order {
        if removed.contains(&projectile_entity) {
            continue;
        }
        let Ok((_, items)) = projectiles.get_mut(projectile_entity) else {
            continue;
        };
        let (
            mut projectile,
            mut history,
            pos,
            footprint,
            radius,
            mut pierce,
            mut chain,
            explosive,
            slow,
            poison,
        ) = items;

        projectile.elapsed += delta;
        if projectile.is_expired() {
            removed.insert(projectile_entity);
            commands.entity(projectile_entity).despawn();
            continue;
        }

        let radius = collision_radius(footprint, radius);
        let mut destroyed = false;

        for candidate in grid.query_overlapping(pos.x, pos.y, radius) {
            let target = candidate.entity;
            if history.enemies.contains(&target) || !is_live(&enemies, target) {
                continue;
            }
            // The grid snapshot predates this stage; confirm against the live position.
            let Ok((enemy_pos, ..)) = enemies.get(target) else {
                continue;
            };
            if !discs_overlap(pos, radius, enemy_pos, candidate.radius) {
                continue;
            }
            let impact = *enemy_pos;

            history.enemies.insert(target);
            damage_enemy(&mut enemies, target, projectile.damage);
            if let Some(slow) = slow {
                apply_slow(&mut enemies, &mut pending, target, slow);
            }
            if let Some(poison) = poison {
                apply_poison(&mut enemies, &mut pending, target, poison);
            }

            if let Some(chain) = chain.as_deref_mut() {
                chain.visited.insert(target);
                if chain.remaining > 0 {
                    let next = grid.nearest(impact.x, impact.y, chain.range, |entry| {
                        !chain.visited.contains(&entry.entity) && is_live(&enemies, entry.entity)
                    });
                    if let Some(next) = next {
                        damage_enemy(&mut enemies, next.entity, chain.damage);
                        chain.visited.insert(next.entity);
                        history.enemies.insert(next.entity);
                        chain.remaining -= 1;
                    }
                }
            }

            let spent = match pierce.as_deref_mut() {
                Some(pierce) => !pierce.consume(),
                None => true,
            };
            if spent {
                destroyed = true;
                break;
            }
        }

        if destroyed {
            if let Some(explosive) = explosive {
                for (entity, amount) in
                    explosion_targets(&grid, pos.x, pos.y, explosive.radius, explosive.damage)
                {
                    if is_live(&enemies, entity) {
                        damage_enemy(&mut enemies, entity, amount);
                    }
                }
            }
            removed.insert(projectile_entity);
            commands.entity(projectile_entity).despawn();
        }
    }

    pending.flush(&mut commands);
}

/// System that applies contact damage from every overlapping enemy.
///
/// Each live enemy touching the player deals `contact_damage_per_tick` once
/// per tick. A lethal tick spends a revive charge if the build has one;
/// otherwise the session ends and `GameOver` is raised exactly once.
pub fn contact_damage_system(
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    mut build: ResMut<Build>,
    mut clock: ResMut<SessionClock>,
    mut notifications: ResMut<Notifications>,
    mut player: Query<
        (
            &Player,
            &Position,
            &mut Health,
            Option<&Armor>,
            Option<&Footprint>,
            Option<&CollisionRadius>,
        ),
        Without<Enemy>,
    >,
    enemies: Query<(&Position, &Health), (With<Enemy>, Without<Player>)>,
) {
    if clock.game_over {
        return;
    }
    let Ok((stats, pos, mut health, armor, footprint, radius)) = player.get_single_mut() else {
        return;
    };
    let radius = collision_radius(footprint, radius);

    let touching = grid
        .query_overlapping(pos.x, pos.y, radius)
        .into_iter()
        .filter(|entry| match enemies.get(entry.entity) {
            Ok((enemy_pos, enemy_health)) => {
                enemy_health.is_alive() && discs_overlap(pos, radius, enemy_pos, entry.radius)
            }
            Err(_) => false,
        })
        .count();

    for _ in 0..touching {
        apply_damage(&mut health, armor, config.contact_damage_per_tick);
    }

    if health.is_alive() {
        return;
    }
    if build.has_flag(ModifierFlags::REVIVE) && build.consume_revive() {
        health.current = health.max * REVIVE_HEALTH_FRACTION;
        log::info!("Second wind: revived at {:.0} health", health.current);
        return;
    }

    clock.game_over = true;
    log::info!(
        "Game over at level {} after {:.1}s",
        stats.level,
        clock.elapsed
    );
    notifications.push(SimNotification::GameOver {
        survival_time: clock.elapsed,
        level: stats.level,
    });
}

/// System that sweeps dead enemies.
///
/// Each corpse drops an XP orb and may drop a health orb. With the death
/// burst flag it also explodes; enemies killed by a burst join the worklist
/// and are swept in the same pass.
pub fn enemy_death_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    build: Res<Build>,
    grid: Res<SpatialGrid>,
    mut rng: ResMut<SimRng>,
    mut enemies: Query<(Entity, &Enemy, &Position, &mut Health, Option<&Armor>)>,
) {
    let mut worklist: VecDeque<Entity> = {
        let mut dead: Vec<Entity> = enemies
            .iter()
            .filter(|(_, _, _, health, _)| !health.is_alive())
            .map(|(entity, ..)| entity)
            .collect();
        dead.sort();
        dead.into()
    };
    let mut swept: HashSet<Entity> = HashSet::new();
    let death_burst = build.has_flag(ModifierFlags::DEATH_EXPLOSION);
    let xp_multiplier = build.xp_drop_multiplier();

    while let Some(entity) = worklist.pop_front() {
        if !swept.insert(entity) {
            continue;
        }
        let Ok((_, enemy, pos, ..)) = enemies.get(entity) else {
            continue;
        };
        let (x, y) = (pos.x, pos.y);
        let xp = enemy.xp_value * xp_multiplier;

        commands.entity(entity).despawn();
        commands.spawn(XpOrbBundle::new(x, y, xp));

        if rng.0.random::<f32>() < config.health_orb_chance {
            commands.spawn(HealthOrbBundle::new(x + 8.0, y, config.health_orb_value));
        }

        if death_burst {
            for (target, amount) in
                explosion_targets(&grid, x, y, DEATH_BURST_RADIUS, DEATH_BURST_DAMAGE)
            {
                if swept.contains(&target) {
                    continue;
                }
                let Ok((_, _, _, mut health, armor)) = enemies.get_mut(target) else {
                    continue;
                };
                if !health.is_alive() {
                    continue;
                }
                apply_damage(&mut health, armor, amount);
                if !health.is_alive() {
                    worklist.push_back(target);
                }
            }
        }
    }

    if !swept.is_empty() {
        log::debug!("Swept {} dead enemies", swept.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;
    use crate::spells::SpellKind;

    fn base_world() -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0 / 60.0));
        world.insert_resource(SpatialGrid::new(64.0));
        world.insert_resource(SimConfig {
            health_orb_chance: 0.0,
            ..SimConfig::default()
        });
        world.insert_resource(Build::default());
        world.insert_resource(SessionClock::default());
        world.insert_resource(Notifications::default());
        world.insert_resource(SimRng::seeded(1));
        world
    }

    fn dummy(world: &mut World, x: f32, y: f32, health: f32) -> Entity {
        let (mut bundle, _) = crate::enemies::EnemyKind::Slime.bundle(x, y, 1.0);
        bundle.health = Health::new(health);
        bundle.footprint = Footprint::square(20.0);
        world.spawn(bundle).id()
    }

    fn projectile(world: &mut World, x: f32, y: f32, damage: f32) -> EntityWorldMut<'_> {
        world.spawn((
            Projectile {
                damage,
                lifetime: 5.0,
                elapsed: 0.0,
                spell: SpellKind::MagicMissile,
            },
            HitHistory::default(),
            Position::new(x, y),
            Velocity::default(),
            Footprint::square(10.0),
        ))
    }

    fn collide(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, projectile_collision_system).chain());
        schedule.run(world);
    }

    fn projectiles_left(world: &mut World) -> usize {
        world.query::<&Projectile>().iter(world).count()
    }

    #[test]
    fn test_plain_projectile_dies_on_first_hit() {
        let mut world = base_world();
        let a = dummy(&mut world, 0.0, 0.0, 100.0);
        let b = dummy(&mut world, 5.0, 0.0, 100.0);
        projectile(&mut world, 2.0, 0.0, 10.0);

        collide(&mut world);

        let hurt = [a, b]
            .iter()
            .filter(|e| world.get::<Health>(**e).unwrap().current < 100.0)
            .count();
        assert_eq!(hurt, 1);
        assert_eq!(projectiles_left(&mut world), 0);
    }

    #[test]
    fn test_pierce_n_hits_at_most_n_plus_one() {
        let mut world = base_world();
        let enemies: Vec<Entity> = (0..5).map(|i| dummy(&mut world, i as f32 * 2.0, 0.0, 100.0)).collect();
        projectile(&mut world, 4.0, 0.0, 10.0).insert(Pierce::new(2));

        collide(&mut world);

        let hurt = enemies
            .iter()
            .filter(|e| world.get::<Health>(**e).unwrap().current < 100.0)
            .count();
        assert_eq!(hurt, 3);
        assert_eq!(projectiles_left(&mut world), 0);
    }

    #[test]
    fn test_piercing_projectile_never_rehits_across_ticks() {
        let mut world = base_world();
        let enemy = dummy(&mut world, 0.0, 0.0, 100.0);
        projectile(&mut world, 0.0, 0.0, 10.0).insert(Pierce::new(3));

        for _ in 0..5 {
            collide(&mut world);
        }

        assert_eq!(world.get::<Health>(enemy).unwrap().current, 90.0);
        let pierce = *world.query::<&Pierce>().single(&world);
        assert_eq!(pierce.remaining, 2);
    }

    #[test]
    fn test_chain_jumps_to_nearest_unvisited() {
        let mut world = base_world();
        let primary = dummy(&mut world, 0.0, 0.0, 100.0);
        let near = dummy(&mut world, 60.0, 0.0, 100.0);
        let far = dummy(&mut world, 120.0, 0.0, 100.0);
        projectile(&mut world, 0.0, 0.0, 10.0).insert((Chain::new(3, 100.0, 5.0), Pierce::new(5)));

        collide(&mut world);

        assert_eq!(world.get::<Health>(primary).unwrap().current, 90.0);
        assert_eq!(world.get::<Health>(near).unwrap().current, 95.0);
        // One propagation per primary hit.
        assert_eq!(world.get::<Health>(far).unwrap().current, 100.0);

        let chain = world.query::<&Chain>().single(&world).clone();
        assert_eq!(chain.remaining, 2);
        assert!(chain.visited.contains(&primary));
        assert!(chain.visited.contains(&near));
    }

    #[test]
    fn test_chain_never_rehits_the_same_enemy() {
        let mut world = base_world();
        let a = dummy(&mut world, 0.0, 0.0, 1000.0);
        let b = dummy(&mut world, 30.0, 0.0, 1000.0);
        // Drifts across both enemies over several ticks.
        projectile(&mut world, 0.0, 0.0, 10.0).insert((Chain::new(5, 100.0, 5.0), Pierce::new(5)));

        for step in 0..6 {
            if step == 3 {
                let mut pos = world.query_filtered::<&mut Position, With<Projectile>>();
                pos.single_mut(&mut world).x = 30.0;
            }
            collide(&mut world);
        }

        // Each enemy is damaged exactly once: a directly, b by the chain.
        assert_eq!(world.get::<Health>(a).unwrap().current, 990.0);
        assert_eq!(world.get::<Health>(b).unwrap().current, 995.0);
    }

    #[test]
    fn test_chain_in_dense_cluster_hits_each_enemy_once() {
        let mut world = base_world();
        let cluster: Vec<Entity> = (0..20)
            .map(|i| dummy(&mut world, (i % 5) as f32 * 12.0, (i / 5) as f32 * 12.0, 1000.0))
            .collect();
        projectile(&mut world, 0.0, 0.0, 10.0).insert((Chain::new(50, 100.0, 5.0), Pierce::new(100)));

        // Sweep the projectile over every enemy, one per tick, then linger.
        for tick in 0..30 {
            let target = cluster[tick % cluster.len()];
            let spot = *world.get::<Position>(target).unwrap();
            let mut pos = world.query_filtered::<&mut Position, With<Projectile>>();
            *pos.single_mut(&mut world) = spot;
            collide(&mut world);
        }

        for enemy in &cluster {
            let lost = 1000.0 - world.get::<Health>(*enemy).unwrap().current;
            assert!(lost == 10.0 || lost == 5.0, "enemy lost {lost}");
        }
    }

    #[test]
    fn test_immobile_enemy_still_takes_hits() {
        let mut world = base_world();
        let turret = world
            .spawn((
                Enemy {
                    kind: crate::enemies::EnemyKind::Golem,
                    xp_value: 1.0,
                },
                Position::new(0.0, 0.0),
                Health::new(100.0),
                Footprint::square(20.0),
            ))
            .id();
        projectile(&mut world, 0.0, 0.0, 10.0).insert(SlowOnHit {
            amount: 0.5,
            duration: 1.0,
        });

        collide(&mut world);

        assert_eq!(world.get::<Health>(turret).unwrap().current, 90.0);
        assert!(world.get::<Slowed>(turret).is_none());
        assert_eq!(projectiles_left(&mut world), 0);
    }

    #[test]
    fn test_explosive_detonates_on_hit_not_on_expiry() {
        let mut world = base_world();
        let target = dummy(&mut world, 0.0, 0.0, 100.0);
        let bystander = dummy(&mut world, 30.0, 0.0, 100.0);
        projectile(&mut world, 0.0, 0.0, 10.0).insert(Explosive {
            radius: 60.0,
            damage: 20.0,
        });

        collide(&mut world);

        assert_eq!(world.get::<Health>(target).unwrap().current, 70.0);
        assert_eq!(world.get::<Health>(bystander).unwrap().current, 90.0);

        let mut world = base_world();
        let bystander = dummy(&mut world, 200.0, 0.0, 100.0);
        {
            let mut expiring = projectile(&mut world, 0.0, 0.0, 10.0);
            expiring.insert(Explosive {
                radius: 500.0,
                damage: 20.0,
            });
            expiring.get_mut::<Projectile>().unwrap().lifetime = 0.0;
        }

        collide(&mut world);
        assert_eq!(world.get::<Health>(bystander).unwrap().current, 100.0);
        assert_eq!(projectiles_left(&mut world), 0);
    }

    #[test]
    fn test_status_effects_are_applied_and_merged() {
        let mut world = base_world();
        let enemy = dummy(&mut world, 0.0, 0.0, 100.0);
        let original = world.get::<Velocity>(enemy).unwrap().max_speed;
        projectile(&mut world, 0.0, 0.0, 1.0).insert((
            SlowOnHit {
                amount: 0.5,
                duration: 1.0,
            },
            PoisonOnHit {
                dps: 4.0,
                duration: 2.0,
            },
        ));
        projectile(&mut world, 0.0, 0.0, 1.0).insert(PoisonOnHit {
            dps: 6.0,
            duration: 3.0,
        });

        collide(&mut world);

        let slowed = *world.get::<Slowed>(enemy).unwrap();
        assert_eq!(slowed.original_speed, original);
        assert!((world.get::<Velocity>(enemy).unwrap().max_speed - original * 0.5).abs() < 1e-4);

        let poisoned = *world.get::<Poisoned>(enemy).unwrap();
        assert_eq!(poisoned.dps, 10.0);
        assert_eq!(poisoned.remaining, 3.0);
    }

    #[test]
    fn test_contact_damage_five_ticks() {
        let mut world = base_world();
        world.spawn(PlayerBundle::new(0.0, 0.0, 100.0, 100.0, 32.0, 10.0));
        dummy(&mut world, 10.0, 0.0, 100.0);
        dummy(&mut world, -10.0, 0.0, 100.0);

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, contact_damage_system).chain());
        for _ in 0..5 {
            schedule.run(&mut world);
        }

        let health = *world.query_filtered::<&Health, With<Player>>().single(&world);
        // Two enemies, 0.5 per enemy per tick.
        assert!((health.current - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_revive_then_game_over_once() {
        let mut world = base_world();
        world.resource_mut::<Build>().acquire(crate::upgrades::UpgradeKind::SecondWind);
        world.insert_resource(SimConfig {
            contact_damage_per_tick: 100.0,
            ..SimConfig::default()
        });
        world.spawn(PlayerBundle::new(0.0, 0.0, 100.0, 100.0, 32.0, 10.0));
        dummy(&mut world, 0.0, 0.0, 100.0);

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, contact_damage_system).chain());

        schedule.run(&mut world);
        let health = *world.query_filtered::<&Health, With<Player>>().single(&world);
        assert_eq!(health.current, 50.0);
        assert!(!world.resource::<SessionClock>().game_over);

        schedule.run(&mut world);
        schedule.run(&mut world);
        assert!(world.resource::<SessionClock>().game_over);
        let notes = world.resource_mut::<Notifications>().drain();
        assert_eq!(notes.len(), 1);
        assert!(matches!(notes[0], SimNotification::GameOver { level: 1, .. }));
    }

    #[test]
    fn test_death_sweep_drops_orbs() {
        let mut world = base_world();
        let dead = dummy(&mut world, 5.0, 5.0, 0.0);
        let alive = dummy(&mut world, 500.0, 0.0, 10.0);
        world.get_mut::<Health>(dead).unwrap().current = 0.0;

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, enemy_death_system).chain());
        schedule.run(&mut world);

        assert!(world.get::<Enemy>(dead).is_none());
        assert!(world.get::<Enemy>(alive).is_some());
        let orbs: Vec<XpOrb> = world.query::<&XpOrb>().iter(&world).copied().collect();
        assert_eq!(orbs.len(), 1);
        assert_eq!(orbs[0].value, 1.0);
    }

    #[test]
    fn test_death_burst_cascades() {
        let mut world = base_world();
        world.resource_mut::<Build>().acquire(crate::upgrades::UpgradeKind::DeathBurst);
        let first = dummy(&mut world, 0.0, 0.0, 10.0);
        let second = dummy(&mut world, 10.0, 0.0, 5.0);
        let third = dummy(&mut world, 20.0, 0.0, 5.0);
        let survivor = dummy(&mut world, 45.0, 0.0, 100.0);

        let mut grid_only = Schedule::default();
        grid_only.add_systems(spatial_grid_update_system);
        grid_only.run(&mut world);
        world.get_mut::<Health>(first).unwrap().current = 0.0;

        let mut sweep = Schedule::default();
        sweep.add_systems(enemy_death_system);
        sweep.run(&mut world);

        for entity in [first, second, third] {
            assert!(world.get::<Enemy>(entity).is_none());
        }
        assert!(world.get::<Health>(survivor).unwrap().current < 100.0);
        assert_eq!(world.query::<&XpOrb>().iter(&world).count(), 3);
    }
}
