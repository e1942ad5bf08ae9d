//! Spells: cooldown state machine, projectile factories and the upgrade
//! modifier pipeline.
//!
//! A cast goes through three steps:
//!
//! 1. `build_projectiles` - the spell-specific factory produces one or more
//!    [`ProjectileSpec`]s aimed at the target.
//! 2. `apply_modifiers` - the build's upgrades are folded in, in a fixed order
//!    (multishot, size, speed, damage-over-time, spell-specific, pierce).
//! 3. `ProjectileSpec::spawn` - the finished spec becomes an entity.
//!
//! Every modifier is applied before the projectile exists in the world; no
//! later system revisits them.

use crate::components::*;
use crate::upgrades::{Build, ModifierFlags, UpgradeKind};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Angle between neighbouring multishot copies, in radians.
pub const MULTISHOT_SPREAD: f32 = 0.2;

/// Cooldowns never shrink below this many seconds.
pub const MIN_COOLDOWN: f32 = 0.1;

/// Angle between the shards of a frost volley, in radians.
const FROST_FAN_SPREAD: f32 = 0.26;

/// Closed set of castable spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellKind {
    MagicMissile,
    Fireball,
    ChainLightning,
    FrostShards,
    VenomDart,
}

/// Base numbers of a spell before upgrades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellStats {
    pub cooldown: f32,
    pub damage: f32,
    pub speed: f32,
    pub size: f32,
    pub lifetime: f32,
}

impl SpellKind {
    pub const ALL: [SpellKind; 5] = [
        SpellKind::MagicMissile,
        SpellKind::Fireball,
        SpellKind::ChainLightning,
        SpellKind::FrostShards,
        SpellKind::VenomDart,
    ];

    /// Order in which milestone levels unlock new spells.
    pub const UNLOCK_ORDER: [SpellKind; 4] = [
        SpellKind::Fireball,
        SpellKind::ChainLightning,
        SpellKind::FrostShards,
        SpellKind::VenomDart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpellKind::MagicMissile => "Magic Missile",
            SpellKind::Fireball => "Fireball",
            SpellKind::ChainLightning => "Chain Lightning",
            SpellKind::FrostShards => "Frost Shards",
            SpellKind::VenomDart => "Venom Dart",
        }
    }

    pub fn stats(self) -> SpellStats {
        match self {
            SpellKind::MagicMissile => SpellStats {
                cooldown: 1.0,
                damage: 10.0,
                speed: 320.0,
                size: 12.0,
                lifetime: 2.0,
            },
            SpellKind::Fireball => SpellStats {
                cooldown: 2.5,
                damage: 15.0,
                speed: 220.0,
                size: 20.0,
                lifetime: 2.5,
            },
            SpellKind::ChainLightning => SpellStats {
                cooldown: 1.8,
                damage: 12.0,
                speed: 420.0,
                size: 10.0,
                lifetime: 1.5,
            },
            SpellKind::FrostShards => SpellStats {
                cooldown: 1.5,
                damage: 6.0,
                speed: 280.0,
                size: 10.0,
                lifetime: 1.8,
            },
            SpellKind::VenomDart => SpellStats {
                cooldown: 1.2,
                damage: 4.0,
                speed: 360.0,
                size: 8.0,
                lifetime: 2.0,
            },
        }
    }

    pub fn tint(self) -> Tint {
        match self {
            SpellKind::MagicMissile => Tint::rgb(0.7, 0.5, 1.0),
            SpellKind::Fireball => Tint::rgb(1.0, 0.45, 0.1),
            SpellKind::ChainLightning => Tint::rgb(1.0, 1.0, 0.3),
            SpellKind::FrostShards => Tint::rgb(0.5, 0.85, 1.0),
            SpellKind::VenomDart => Tint::rgb(0.3, 0.9, 0.2),
        }
    }
}

// ============================================================================
// COOLDOWN STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CooldownState {
    Ready,
    Cooling { remaining: f32 },
}

/// A spell slot on the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquippedSpell {
    pub kind: SpellKind,
    /// Current cooldown length, shrunk by level-ups.
    pub cooldown: f32,
    pub state: CooldownState,
}

impl EquippedSpell {
    pub fn new(kind: SpellKind) -> Self {
        Self {
            kind,
            cooldown: kind.stats().cooldown,
            state: CooldownState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, CooldownState::Ready)
    }

    pub fn tick(&mut self, dt: f32) {
        if let CooldownState::Cooling { remaining } = self.state {
            let remaining = remaining - finite_or(dt, 0.0).max(0.0);
            self.state = if remaining <= 0.0 {
                CooldownState::Ready
            } else {
                CooldownState::Cooling { remaining }
            };
        }
    }

    /// Start the cooldown after a cast.
    pub fn trigger(&mut self) {
        self.state = if self.cooldown > 0.0 {
            CooldownState::Cooling {
                remaining: self.cooldown,
            }
        } else {
            CooldownState::Ready
        };
    }

    pub fn shrink_cooldown(&mut self, factor: f32, min: f32) {
        let shrunk = finite_or(self.cooldown * factor, min);
        self.cooldown = shrunk.max(min);
    }
}

/// The player's equipped spells, ticked and cast by the controller system.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellBook {
    spells: Vec<EquippedSpell>,
}

impl SpellBook {
    /// A book holding the starting spell.
    pub fn starting() -> Self {
        let mut book = Self::default();
        book.equip(SpellKind::MagicMissile);
        book
    }

    /// Equip a spell. Returns false if it was already equipped.
    pub fn equip(&mut self, kind: SpellKind) -> bool {
        if self.has(kind) {
            return false;
        }
        self.spells.push(EquippedSpell::new(kind));
        true
    }

    pub fn has(&self, kind: SpellKind) -> bool {
        self.spells.iter().any(|s| s.kind == kind)
    }

    /// Next spell a milestone level would unlock.
    pub fn next_locked(&self) -> Option<SpellKind> {
        SpellKind::UNLOCK_ORDER
            .iter()
            .copied()
            .find(|kind| !self.has(*kind))
    }

    pub fn get(&self, kind: SpellKind) -> Option<&EquippedSpell> {
        self.spells.iter().find(|s| s.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EquippedSpell> {
        self.spells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut EquippedSpell> {
        self.spells.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }
}

// ============================================================================
// PROJECTILE FACTORY
// ============================================================================

/// A projectile that has not been spawned yet.
#[derive(Debug, Clone)]
pub struct ProjectileSpec {
    pub spell: SpellKind,
    pub x: f32,
    pub y: f32,
    /// Heading in radians.
    pub angle: f32,
    pub speed: f32,
    pub size: f32,
    pub damage: f32,
    pub lifetime: f32,
    pub pierce: Option<Pierce>,
    pub chain: Option<Chain>,
    pub explosive: Option<Explosive>,
    pub slow: Option<SlowOnHit>,
    pub poison: Option<PoisonOnHit>,
}

impl ProjectileSpec {
    fn base(kind: SpellKind, origin: Position, angle: f32, build: &Build) -> Self {
        let stats = kind.stats();
        Self {
            spell: kind,
            x: origin.x,
            y: origin.y,
            angle,
            speed: stats.speed,
            size: stats.size,
            damage: stats.damage * build.damage_multiplier(),
            lifetime: stats.lifetime,
            pierce: None,
            chain: None,
            explosive: None,
            slow: None,
            poison: None,
        }
    }

    /// Turn the spec into a live projectile entity.
    pub fn spawn(self, commands: &mut Commands) -> Entity {
        let speed = finite_or(self.speed, 0.0).max(0.0);
        let angle = finite_or(self.angle, 0.0);
        let velocity = Velocity::new(angle.cos() * speed, angle.sin() * speed).with_max_speed(speed);

        let mut entity = commands.spawn((
            Projectile {
                damage: finite_or(self.damage, 0.0).max(0.0),
                lifetime: finite_or(self.lifetime, 0.0).max(0.0),
                elapsed: 0.0,
                spell: self.spell,
            },
            HitHistory::default(),
            Position::new(self.x, self.y),
            velocity,
            Footprint::square(finite_or(self.size, 0.0).max(0.0)),
            self.spell.tint(),
        ));
        if let Some(pierce) = self.pierce {
            entity.insert(pierce);
        }
        if let Some(chain) = self.chain {
            entity.insert(chain);
        }
        if let Some(explosive) = self.explosive {
            entity.insert(explosive);
        }
        if let Some(slow) = self.slow {
            entity.insert(slow);
        }
        if let Some(poison) = self.poison {
            entity.insert(poison);
        }
        entity.id()
    }
}

/// Build the unmodified projectiles of one cast of `kind` from `origin` at `target`.
pub fn build_projectiles(
    kind: SpellKind,
    origin: Position,
    target: Position,
    build: &Build,
) -> Vec<ProjectileSpec> {
    let angle = finite_or((target.y - origin.y).atan2(target.x - origin.x), 0.0);
    let power = build.damage_multiplier();

    match kind {
        SpellKind::MagicMissile => vec![ProjectileSpec::base(kind, origin, angle, build)],
        SpellKind::Fireball => {
            let mut spec = ProjectileSpec::base(kind, origin, angle, build);
            spec.explosive = Some(Explosive {
                radius: 60.0,
                damage: 20.0 * power,
            });
            vec![spec]
        }
        SpellKind::ChainLightning => {
            let mut spec = ProjectileSpec::base(kind, origin, angle, build);
            spec.chain = Some(Chain::new(3, 150.0, 8.0 * power));
            vec![spec]
        }
        SpellKind::FrostShards => [-FROST_FAN_SPREAD, 0.0, FROST_FAN_SPREAD]
            .iter()
            .map(|offset| {
                let mut spec = ProjectileSpec::base(kind, origin, angle + offset, build);
                spec.slow = Some(SlowOnHit {
                    amount: 0.4,
                    duration: 2.0,
                });
                spec
            })
            .collect(),
        SpellKind::VenomDart => {
            let mut spec = ProjectileSpec::base(kind, origin, angle, build);
            spec.poison = Some(PoisonOnHit {
                dps: 6.0,
                duration: 3.0,
            });
            spec.pierce = Some(Pierce::new(1));
            vec![spec]
        }
    }
}

/// Heading offset of the `index`-th multishot copy (1-based): +1, -1, +2, -2 spreads.
pub fn multishot_offset(index: u32) -> f32 {
    let step = index.div_ceil(2) as f32;
    let sign = if index % 2 == 1 { 1.0 } else { -1.0 };
    sign * step * MULTISHOT_SPREAD
}

/// Run the upgrade pipeline over freshly built projectiles.
pub fn apply_modifiers(specs: Vec<ProjectileSpec>, build: &Build) -> Vec<ProjectileSpec> {
    // Multishot duplicates rather than mutating.
    let copies = build.multishot();
    let mut out = Vec::with_capacity(specs.len() * (copies as usize + 1));
    for spec in specs {
        let duplicates: Vec<ProjectileSpec> = (1..=copies)
            .map(|index| {
                let mut copy = spec.clone();
                copy.angle += multishot_offset(index);
                copy
            })
            .collect();
        out.push(spec);
        out.extend(duplicates);
    }

    let size = build.size_multiplier();
    let speed = build.speed_multiplier();
    let dot = if build.has_flag(ModifierFlags::POISON_ON_HIT) {
        build.damage_over_time()
    } else {
        None
    };
    let pierce_bonus = if build.has_flag(ModifierFlags::PIERCING) {
        build.pierce_bonus()
    } else {
        0
    };

    for spec in out.iter_mut() {
        spec.size *= size;
        spec.speed *= speed;

        if let Some(dot) = dot {
            match spec.poison.as_mut() {
                Some(poison) => {
                    poison.dps += dot.dps;
                    poison.duration = poison.duration.max(dot.duration);
                }
                None => spec.poison = Some(dot),
            }
        }

        apply_spell_modifiers(spec, build);

        if pierce_bonus > 0 {
            match spec.pierce.as_mut() {
                Some(pierce) => pierce.add(pierce_bonus),
                None => spec.pierce = Some(Pierce::new(pierce_bonus)),
            }
        }
    }
    out
}

/// Upgrades that only touch one spell.
fn apply_spell_modifiers(spec: &mut ProjectileSpec, build: &Build) {
    match spec.spell {
        SpellKind::Fireball => {
            let stacks = build.stacks(UpgradeKind::BlastRadius) as f32;
            if let Some(explosive) = spec.explosive.as_mut() {
                explosive.radius *= 1.0 + 0.25 * stacks;
                explosive.damage *= 1.0 + 0.20 * stacks;
            }
        }
        SpellKind::ChainLightning => {
            let stacks = build.stacks(UpgradeKind::ChainReach);
            if let Some(chain) = spec.chain.as_mut() {
                chain.remaining += stacks;
                chain.range *= 1.0 + 0.2 * stacks as f32;
            }
        }
        SpellKind::FrostShards => {
            let stacks = build.stacks(UpgradeKind::DeepFreeze) as f32;
            if let Some(slow) = spec.slow.as_mut() {
                slow.amount = (slow.amount + 0.1 * stacks).min(0.8);
                slow.duration += 0.5 * stacks;
            }
        }
        SpellKind::MagicMissile | SpellKind::VenomDart => {}
    }
}
