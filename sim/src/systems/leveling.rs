//! Leveling stage: orb pickup, the XP curve and upgrade offers.

use crate::components::*;
use crate::config::SimConfig;
use crate::session::{Notifications, SimNotification, SimRng};
use crate::spells::{SpellBook, MIN_COOLDOWN};
use crate::upgrades::{Build, UpgradeQueue};
use bevy_ecs::prelude::*;

/// Player max speed never grows past this multiple of its base.
pub const MAX_SPEED_FACTOR: f32 = 2.0;

/// Max speed gained per level, as a fraction of base speed.
pub const LEVEL_SPEED_GAIN: f32 = 0.05;

/// Spell cooldowns are multiplied by this on every level-up.
pub const LEVEL_COOLDOWN_FACTOR: f32 = 0.95;

/// Most levels granted in one pass; leftover XP stays banked for the next.
pub const MAX_LEVELS_PER_PASS: u32 = 100;

/// Levels at which the next locked spell is equipped.
pub const SPELL_UNLOCK_LEVELS: [u32; 4] = [3, 5, 8, 12];

/// XP needed to leave `level`.
pub fn xp_threshold(base: f32, level: u32) -> f32 {
    base * (level.max(1) as f32).powf(1.5)
}

/// System that collects orbs inside the player's pickup radius.
pub fn orb_pickup_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    build: Res<Build>,
    mut player: Query<(&Position, &mut Player, &mut Health)>,
    xp_orbs: Query<(Entity, &Position, &XpOrb), Without<Player>>,
    health_orbs: Query<(Entity, &Position, &HealthOrb), Without<Player>>,
) {
    let Ok((pos, mut stats, mut health)) = player.get_single_mut() else {
        return;
    };
    let reach = config.pickup_radius * build.pickup_multiplier();
    let gain = build.xp_gain_multiplier();

    for (entity, orb_pos, orb) in xp_orbs.iter() {
        if pos.distance_to(orb_pos) <= reach {
            stats.xp += finite_or(orb.value, 0.0).max(0.0) * gain;
            commands.entity(entity).despawn();
        }
    }

    for (entity, orb_pos, orb) in health_orbs.iter() {
        if pos.distance_to(orb_pos) <= reach {
            health.heal(orb.value);
            commands.entity(entity).despawn();
        }
    }
}

/// System that converts banked XP into levels.
///
/// Repeats while the player has enough XP, so one large pickup can grant
/// several levels in the same tick. Each level raises a `LevelUp`
/// notification and queues one upgrade choice.
pub fn level_up_system(
    config: Res<SimConfig>,
    mut book: ResMut<SpellBook>,
    mut queue: ResMut<UpgradeQueue>,
    mut notifications: ResMut<Notifications>,
    mut player: Query<(&mut Player, &mut Health, &mut Velocity)>,
) {
    let Ok((mut stats, mut health, mut vel)) = player.get_single_mut() else {
        return;
    };

    let mut gained = 0;
    while gained < MAX_LEVELS_PER_PASS && stats.xp_to_next > 0.0 && stats.xp >= stats.xp_to_next {
        gained += 1;
        stats.xp -= stats.xp_to_next;
        stats.level += 1;
        stats.xp_to_next = xp_threshold(config.xp_base, stats.level);

        health.restore_full();
        let cap = stats.base_speed * MAX_SPEED_FACTOR;
        vel.max_speed = (vel.max_speed + stats.base_speed * LEVEL_SPEED_GAIN).min(cap);
        for spell in book.iter_mut() {
            spell.shrink_cooldown(LEVEL_COOLDOWN_FACTOR, MIN_COOLDOWN);
        }

        log::info!("Level up: {}", stats.level);
        if SPELL_UNLOCK_LEVELS.contains(&stats.level) {
            if let Some(spell) = book.next_locked() {
                book.equip(spell);
                log::info!("Unlocked {} at level {}", spell.name(), stats.level);
            }
        }

        notifications.push(SimNotification::LevelUp { level: stats.level });
        queue.pending += 1;
    }
}

/// System that rolls an upgrade offer for queued level-ups.
pub fn upgrade_offer_system(
    config: Res<SimConfig>,
    build: Res<Build>,
    book: Res<SpellBook>,
    mut rng: ResMut<SimRng>,
    mut queue: ResMut<UpgradeQueue>,
) {
    if queue.pending == 0 || queue.is_waiting() {
        return;
    }
    queue.refill(&build, &book, &mut rng.0, config.offer_size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::SpellKind;

    fn leveling_world(xp: f32) -> World {
        let mut world = World::new();
        world.insert_resource(SimConfig::default());
        world.insert_resource(Build::default());
        world.insert_resource(SpellBook::starting());
        world.insert_resource(UpgradeQueue::default());
        world.insert_resource(Notifications::default());
        world.insert_resource(SimRng::seeded(3));

        let base = SimConfig::default().xp_base;
        let mut player = PlayerBundle::new(0.0, 0.0, 100.0, 100.0, 32.0, xp_threshold(base, 1));
        player.player.xp = xp;
        player.health.current = 10.0;
        world.spawn(player);
        world
    }

    fn run_leveling(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((orb_pickup_system, level_up_system, upgrade_offer_system).chain());
        schedule.run(world);
    }

    fn player(world: &mut World) -> (Player, Health, Velocity) {
        let (p, h, v) = world
            .query::<(&Player, &Health, &Velocity)>()
            .single(world);
        (*p, *h, *v)
    }

    #[test]
    fn test_xp_curve() {
        assert_eq!(xp_threshold(10.0, 1), 10.0);
        assert!((xp_threshold(10.0, 4) - 80.0).abs() < 1e-3);
        for level in 1..50 {
            assert!(xp_threshold(10.0, level + 1) > xp_threshold(10.0, level));
        }
    }

    #[test]
    fn test_single_level_up() {
        let mut world = leveling_world(12.0);
        run_leveling(&mut world);

        let (stats, health, vel) = player(&mut world);
        assert_eq!(stats.level, 2);
        assert!((stats.xp - 2.0).abs() < 1e-4);
        assert!((stats.xp_to_next - xp_threshold(10.0, 2)).abs() < 1e-4);
        assert_eq!(health.current, health.max);
        assert!((vel.max_speed - 105.0).abs() < 1e-4);

        let cooldown = world.resource::<SpellBook>().get(SpellKind::MagicMissile).unwrap().cooldown;
        assert!((cooldown - 0.95).abs() < 1e-5);

        let notes = world.resource_mut::<Notifications>().drain();
        assert_eq!(notes, vec![SimNotification::LevelUp { level: 2 }]);
        assert_eq!(world.resource::<UpgradeQueue>().offer.len(), 3);
    }

    #[test]
    fn test_large_pickup_grants_several_levels_and_unlocks() {
        let mut world = leveling_world(0.0);
        world.spawn(XpOrbBundle::new(5.0, 0.0, 50.0));
        run_leveling(&mut world);

        // 10 + 28.28 = 38.28 reaches level 3; 51.96 more would be needed for 4.
        let (stats, ..) = player(&mut world);
        assert_eq!(stats.level, 3);
        assert_eq!(world.query::<&XpOrb>().iter(&world).count(), 0);
        assert!(world.resource::<SpellBook>().has(SpellKind::Fireball));

        let queue = world.resource::<UpgradeQueue>();
        assert!(queue.is_waiting());
        assert_eq!(queue.pending, 1);
        assert_eq!(world.resource_mut::<Notifications>().drain().len(), 2);
    }

    #[test]
    fn test_enormous_xp_is_granted_in_bounded_batches() {
        let mut world = leveling_world(1.0e30);
        run_leveling(&mut world);
        assert_eq!(player(&mut world).0.level, 1 + MAX_LEVELS_PER_PASS);

        run_leveling(&mut world);
        assert_eq!(player(&mut world).0.level, 1 + 2 * MAX_LEVELS_PER_PASS);
    }

    #[test]
    fn test_speed_growth_is_capped() {
        let mut world = leveling_world(100_000.0);
        run_leveling(&mut world);

        let (stats, _, vel) = player(&mut world);
        assert!(stats.level > 20);
        assert_eq!(vel.max_speed, 200.0);
    }

    #[test]
    fn test_orbs_outside_reach_stay() {
        let mut world = leveling_world(0.0);
        world.spawn(XpOrbBundle::new(500.0, 0.0, 5.0));
        world.spawn(HealthOrbBundle::new(10.0, 0.0, 20.0));
        run_leveling(&mut world);

        let (stats, health, _) = player(&mut world);
        assert_eq!(stats.xp, 0.0);
        assert_eq!(health.current, 30.0);
        assert_eq!(world.query::<&XpOrb>().iter(&world).count(), 1);
        assert_eq!(world.query::<&HealthOrb>().iter(&world).count(), 0);
    }
}
