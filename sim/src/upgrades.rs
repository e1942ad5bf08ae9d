//! Upgrades and the player's accumulated build.
//!
//! Every upgrade is a variant of the closed [`UpgradeKind`] enum. Its behavior
//! is described by a small function table on the enum (`name`, `max_stacks`,
//! `spell`, `can_offer`) plus [`apply_upgrade`], which folds an acquisition
//! into the [`Build`] and the player entity.

use crate::components::*;
use crate::spells::{SpellBook, SpellKind};
use crate::systems::leveling::MAX_SPEED_FACTOR;
use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::BitOr;

pub const SIZE_PER_STACK: f32 = 0.30;
pub const SPEED_PER_STACK: f32 = 0.20;
pub const POWER_PER_STACK: f32 = 0.15;
pub const TOXIC_DPS_PER_STACK: f32 = 3.0;
pub const TOXIC_DURATION: f32 = 3.0;
pub const PLATING_PER_STACK: f32 = 0.1;
pub const VITALITY_PER_STACK: f32 = 20.0;
pub const SWIFTNESS_PER_STACK: f32 = 0.10;
pub const MAGNET_PER_STACK: f32 = 0.30;
pub const WISDOM_PER_STACK: f32 = 0.20;
pub const GREED_PER_STACK: f32 = 0.25;

/// Radius and damage of the death burst granted by [`UpgradeKind::DeathBurst`].
pub const DEATH_BURST_RADIUS: f32 = 50.0;
pub const DEATH_BURST_DAMAGE: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Multishot,
    ProjectileSize,
    ProjectileSpeed,
    Power,
    ToxicCoating,
    BlastRadius,
    ChainReach,
    DeepFreeze,
    Piercing,
    Plating,
    Vitality,
    Swiftness,
    Magnet,
    Wisdom,
    Greed,
    DeathBurst,
    SecondWind,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 17] = [
        UpgradeKind::Multishot,
        UpgradeKind::ProjectileSize,
        UpgradeKind::ProjectileSpeed,
        UpgradeKind::Power,
        UpgradeKind::ToxicCoating,
        UpgradeKind::BlastRadius,
        UpgradeKind::ChainReach,
        UpgradeKind::DeepFreeze,
        UpgradeKind::Piercing,
        UpgradeKind::Plating,
        UpgradeKind::Vitality,
        UpgradeKind::Swiftness,
        UpgradeKind::Magnet,
        UpgradeKind::Wisdom,
        UpgradeKind::Greed,
        UpgradeKind::DeathBurst,
        UpgradeKind::SecondWind,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::Multishot => "Multishot",
            UpgradeKind::ProjectileSize => "Big Spells",
            UpgradeKind::ProjectileSpeed => "Swift Spells",
            UpgradeKind::Power => "Power",
            UpgradeKind::ToxicCoating => "Toxic Coating",
            UpgradeKind::BlastRadius => "Blast Radius",
            UpgradeKind::ChainReach => "Chain Reach",
            UpgradeKind::DeepFreeze => "Deep Freeze",
            UpgradeKind::Piercing => "Piercing",
            UpgradeKind::Plating => "Plating",
            UpgradeKind::Vitality => "Vitality",
            UpgradeKind::Swiftness => "Swiftness",
            UpgradeKind::Magnet => "Magnet",
            UpgradeKind::Wisdom => "Wisdom",
            UpgradeKind::Greed => "Greed",
            UpgradeKind::DeathBurst => "Death Burst",
            UpgradeKind::SecondWind => "Second Wind",
        }
    }

    pub fn max_stacks(self) -> u32 {
        match self {
            UpgradeKind::Multishot => 4,
            UpgradeKind::Piercing => 3,
            UpgradeKind::Plating => 5,
            UpgradeKind::DeepFreeze => 4,
            UpgradeKind::DeathBurst | UpgradeKind::SecondWind => 1,
            _ => 5,
        }
    }

    /// The spell an upgrade is keyed to, if any.
    pub fn spell(self) -> Option<SpellKind> {
        match self {
            UpgradeKind::BlastRadius => Some(SpellKind::Fireball),
            UpgradeKind::ChainReach => Some(SpellKind::ChainLightning),
            UpgradeKind::DeepFreeze => Some(SpellKind::FrostShards),
            _ => None,
        }
    }

    /// Capability flags granted while this upgrade is held.
    pub fn flags(self) -> ModifierFlags {
        match self {
            UpgradeKind::DeathBurst => ModifierFlags::DEATH_EXPLOSION,
            UpgradeKind::ToxicCoating => ModifierFlags::POISON_ON_HIT,
            UpgradeKind::Piercing => ModifierFlags::PIERCING,
            _ => ModifierFlags::NONE,
        }
    }

    pub fn can_offer(self, build: &Build, book: &SpellBook) -> bool {
        if build.stacks(self) >= self.max_stacks() {
            return false;
        }
        match self.spell() {
            Some(spell) => book.has(spell),
            None => true,
        }
    }
}

// ============================================================================
// MODIFIER FLAGS
// ============================================================================

/// Typed capability set computed when upgrades are acquired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierFlags(u32);

impl ModifierFlags {
    pub const NONE: Self = Self(0);
    pub const DEATH_EXPLOSION: Self = Self(1 << 0);
    pub const REVIVE: Self = Self(1 << 1);
    pub const POISON_ON_HIT: Self = Self(1 << 2);
    pub const PIERCING: Self = Self(1 << 3);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ModifierFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Everything the player has acquired this session.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Build {
    stacks: HashMap<UpgradeKind, u32>,
    flags: ModifierFlags,
    revive_charges: u32,
}

impl Build {
    pub fn stacks(&self, kind: UpgradeKind) -> u32 {
        self.stacks.get(&kind).copied().unwrap_or(0)
    }

    pub fn flags(&self) -> ModifierFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: ModifierFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn revive_charges(&self) -> u32 {
        self.revive_charges
    }

    /// Add one stack of `kind`, returning the new stack count.
    pub fn acquire(&mut self, kind: UpgradeKind) -> u32 {
        let count = self.stacks.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;

        if kind == UpgradeKind::SecondWind {
            self.revive_charges += 1;
        }
        self.recompute_flags();
        count
    }

    /// Spend a revive charge if one is left.
    pub fn consume_revive(&mut self) -> bool {
        if self.revive_charges == 0 {
            return false;
        }
        self.revive_charges -= 1;
        self.recompute_flags();
        true
    }

    fn recompute_flags(&mut self) {
        let mut flags = ModifierFlags::NONE;
        for (kind, count) in &self.stacks {
            if *count > 0 {
                flags.insert(kind.flags());
            }
        }
        if self.revive_charges > 0 {
            flags.insert(ModifierFlags::REVIVE);
        }
        self.flags = flags;
    }

    pub fn multishot(&self) -> u32 {
        self.stacks(UpgradeKind::Multishot)
    }

    pub fn size_multiplier(&self) -> f32 {
        1.0 + SIZE_PER_STACK * self.stacks(UpgradeKind::ProjectileSize) as f32
    }

    pub fn speed_multiplier(&self) -> f32 {
        1.0 + SPEED_PER_STACK * self.stacks(UpgradeKind::ProjectileSpeed) as f32
    }

    pub fn damage_multiplier(&self) -> f32 {
        1.0 + POWER_PER_STACK * self.stacks(UpgradeKind::Power) as f32
    }

    /// Poison every projectile carries from the universal damage-over-time upgrade.
    pub fn damage_over_time(&self) -> Option<PoisonOnHit> {
        let stacks = self.stacks(UpgradeKind::ToxicCoating);
        (stacks > 0).then(|| PoisonOnHit {
            dps: TOXIC_DPS_PER_STACK * stacks as f32,
            duration: TOXIC_DURATION,
        })
    }

    pub fn pierce_bonus(&self) -> i32 {
        self.stacks(UpgradeKind::Piercing) as i32
    }

    pub fn pickup_multiplier(&self) -> f32 {
        1.0 + MAGNET_PER_STACK * self.stacks(UpgradeKind::Magnet) as f32
    }

    pub fn xp_gain_multiplier(&self) -> f32 {
        1.0 + WISDOM_PER_STACK * self.stacks(UpgradeKind::Wisdom) as f32
    }

    pub fn xp_drop_multiplier(&self) -> f32 {
        1.0 + GREED_PER_STACK * self.stacks(UpgradeKind::Greed) as f32
    }
}

/// Upgrade choices waiting on the collaborator.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpgradeQueue {
    /// Level-ups not yet turned into a choice.
    pub pending: u32,
    /// Choices currently on offer; empty when nothing is pending.
    pub offer: Vec<UpgradeKind>,
}

impl UpgradeQueue {
    pub fn is_waiting(&self) -> bool {
        !self.offer.is_empty()
    }

    /// Turn pending level-ups into an offer if none is showing.
    ///
    /// A level-up whose roll comes back empty is skipped.
    pub fn refill<R: Rng + ?Sized>(
        &mut self,
        build: &Build,
        book: &SpellBook,
        rng: &mut R,
        count: usize,
    ) {
        while self.offer.is_empty() && self.pending > 0 {
            self.pending -= 1;
            self.offer = roll_offer(build, book, rng, count);
            if self.offer.is_empty() {
                log::debug!("No upgrades left to offer, skipping");
            }
        }
    }
}

/// Draw up to `count` distinct offerable upgrades.
pub fn roll_offer<R: Rng + ?Sized>(
    build: &Build,
    book: &SpellBook,
    rng: &mut R,
    count: usize,
) -> Vec<UpgradeKind> {
    let mut candidates: Vec<UpgradeKind> = UpgradeKind::ALL
        .iter()
        .copied()
        .filter(|kind| kind.can_offer(build, book))
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

/// Acquire `kind` and push its effect onto the player entity.
///
/// Returns false when the upgrade is already at its stack limit or no build
/// exists in the world.
pub fn apply_upgrade(world: &mut World, kind: UpgradeKind) -> bool {
    {
        let Some(mut build) = world.get_resource_mut::<Build>() else {
            return false;
        };
        if build.stacks(kind) >= kind.max_stacks() {
            return false;
        }
        build.acquire(kind);
    }

    let mut players =
        world.query_filtered::<(&Player, &mut Health, &mut Velocity, Option<&mut Armor>), With<Player>>();
    for (player, mut health, mut velocity, armor) in players.iter_mut(world) {
        match kind {
            UpgradeKind::Plating => {
                if let Some(mut armor) = armor {
                    armor.stack(PLATING_PER_STACK);
                }
            }
            UpgradeKind::Vitality => health.raise_max(VITALITY_PER_STACK),
            UpgradeKind::Swiftness => {
                let cap = player.base_speed * MAX_SPEED_FACTOR;
                velocity.max_speed =
                    (velocity.max_speed + player.base_speed * SWIFTNESS_PER_STACK).min(cap);
            }
            _ => {}
        }
    }

    log::info!("Upgrade acquired: {}", kind.name());
    true
}
