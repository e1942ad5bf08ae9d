//! ECS Components for the arena survival simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::enemies::EnemyKind;
use crate::spells::SpellKind;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Largest armor reduction, just short of full immunity.
pub const MAX_ARMOR_REDUCTION: f32 = 1.0 - f32::EPSILON;

/// Poison deals its damage in fixed increments of this many seconds.
pub const POISON_TICK_INTERVAL: f32 = 0.5;

/// Float slack when comparing the poison accumulator against a tick boundary.
const TICK_EPSILON: f32 = 1e-4;

/// Replace NaN/infinite values with a fallback.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in the arena.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// 2D velocity vector with a speed cap.
///
/// A `max_speed` of zero or less means the vector is not capped.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
    pub max_speed: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy, max_speed: 0.0 }
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed;
        self
    }

    pub fn magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    /// Unit direction of this velocity, or zero when standing still.
    pub fn direction(&self) -> (f32, f32) {
        let mag = self.magnitude();
        if mag < 0.0001 || !mag.is_finite() {
            (0.0, 0.0)
        } else {
            (self.vx / mag, self.vy / mag)
        }
    }

    /// Point the velocity along `(dx, dy)` at full `max_speed`.
    pub fn steer_toward(&mut self, dx: f32, dy: f32) {
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < 0.0001 || !dist.is_finite() {
            self.vx = 0.0;
            self.vy = 0.0;
        } else {
            self.vx = dx / dist * self.max_speed;
            self.vy = dy / dist * self.max_speed;
        }
    }

    /// Scale the vector down so it never exceeds `max_speed`.
    pub fn clamp_to_max(&mut self) {
        if !self.vx.is_finite() || !self.vy.is_finite() {
            self.vx = 0.0;
            self.vy = 0.0;
            return;
        }
        if self.max_speed <= 0.0 {
            return;
        }
        let mag = self.magnitude();
        if mag > self.max_speed {
            let scale = self.max_speed / mag;
            self.vx *= scale;
            self.vy *= scale;
        }
    }
}

/// Visual footprint, also the fallback source of the collision radius.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

impl Footprint {
    pub fn square(size: f32) -> Self {
        Self { width: size, height: size }
    }
}

/// Explicit collision radius; takes precedence over the footprint.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRadius(pub f32);

/// Render tint carried for collaborators only.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Tint {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

/// Resolve the collision radius of an entity.
pub fn collision_radius(footprint: Option<&Footprint>, explicit: Option<&CollisionRadius>) -> f32 {
    let radius = match (explicit, footprint) {
        (Some(r), _) => r.0,
        (None, Some(f)) => f.width.max(f.height) / 2.0,
        (None, None) => 0.0,
    };
    finite_or(radius, 0.0).max(0.0)
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Health of the player or an enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = finite_or(max, 1.0).max(0.0);
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        let amount = finite_or(amount, 0.0).max(0.0);
        self.current = (self.current - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        let amount = finite_or(amount, 0.0).max(0.0);
        self.current = (self.current + amount).min(self.max);
    }

    pub fn restore_full(&mut self) {
        self.current = self.max;
    }

    /// Grow max health and heal by the same amount.
    pub fn raise_max(&mut self, amount: f32) {
        let amount = finite_or(amount, 0.0).max(0.0);
        self.max += amount;
        self.current = (self.current + amount).min(self.max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Fractional damage reduction. Stacks add up, capped below 1.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub reduction: f32,
}

impl Armor {
    pub fn new(reduction: f32) -> Self {
        Self {
            reduction: finite_or(reduction, 0.0).clamp(0.0, MAX_ARMOR_REDUCTION),
        }
    }

    pub fn stack(&mut self, reduction: f32) {
        *self = Self::new(self.reduction + finite_or(reduction, 0.0));
    }

    /// Damage left after armor.
    pub fn mitigate(&self, amount: f32) -> f32 {
        let reduction = finite_or(self.reduction, 0.0).clamp(0.0, MAX_ARMOR_REDUCTION);
        amount * (1.0 - reduction)
    }
}

/// A live spell projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub damage: f32,
    /// Seconds the projectile may live.
    pub lifetime: f32,
    /// Seconds it has lived so far.
    pub elapsed: f32,
    pub spell: SpellKind,
}

impl Projectile {
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.lifetime
    }
}

/// Enemies a projectile already struck. A projectile never strikes the same
/// enemy twice, even while it keeps overlapping across ticks.
#[derive(Component, Debug, Clone, Default)]
pub struct HitHistory {
    pub enemies: HashSet<Entity>,
}

/// Remaining enemy hits past the first.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pierce {
    pub remaining: i32,
    pub max: i32,
}

impl Pierce {
    pub fn new(count: i32) -> Self {
        let count = count.max(0);
        Self { remaining: count, max: count }
    }

    /// Raise both counters by `bonus`.
    pub fn add(&mut self, bonus: i32) {
        let bonus = bonus.max(0);
        self.remaining += bonus;
        self.max += bonus;
    }

    /// Spend one pierce. Returns false once the projectile is used up.
    pub fn consume(&mut self) -> bool {
        self.remaining -= 1;
        self.remaining >= 0
    }
}

/// Arcs secondary damage to nearby enemies after a hit.
#[derive(Component, Debug, Clone, Default)]
pub struct Chain {
    pub remaining: u32,
    pub range: f32,
    pub damage: f32,
    /// Enemies already struck during this projectile's life.
    pub visited: HashSet<Entity>,
}

impl Chain {
    pub fn new(remaining: u32, range: f32, damage: f32) -> Self {
        Self {
            remaining,
            range,
            damage,
            visited: HashSet::new(),
        }
    }
}

/// Area damage with linear falloff.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosive {
    pub radius: f32,
    pub damage: f32,
}

/// Slow carried by a projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlowOnHit {
    pub amount: f32,
    pub duration: f32,
}

/// Active slow on an enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slowed {
    pub amount: f32,
    pub remaining: f32,
    /// Max speed before the first slow landed, restored on expiry.
    pub original_speed: f32,
}

impl Slowed {
    pub fn new(amount: f32, duration: f32, original_speed: f32) -> Self {
        Self {
            amount: finite_or(amount, 0.0).clamp(0.0, 1.0),
            remaining: finite_or(duration, 0.0).max(0.0),
            original_speed,
        }
    }

    /// Refresh with another slow. The recorded original speed never changes.
    pub fn reapply(&mut self, amount: f32, duration: f32) {
        self.amount = self.amount.max(finite_or(amount, 0.0).clamp(0.0, 1.0));
        self.remaining = self.remaining.max(finite_or(duration, 0.0));
    }

    pub fn slowed_speed(&self) -> f32 {
        self.original_speed * (1.0 - self.amount)
    }
}

/// Poison carried by a projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoisonOnHit {
    pub dps: f32,
    pub duration: f32,
}

/// Active poison on an enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Poisoned {
    pub dps: f32,
    pub remaining: f32,
    /// Time accumulated toward the next damage tick.
    pub tick_timer: f32,
}

impl Poisoned {
    pub fn new(dps: f32, duration: f32) -> Self {
        Self {
            dps: finite_or(dps, 0.0).max(0.0),
            remaining: finite_or(duration, 0.0).max(0.0),
            tick_timer: 0.0,
        }
    }

    /// DPS adds up; duration takes the longer of the two.
    pub fn reapply(&mut self, dps: f32, duration: f32) {
        self.dps += finite_or(dps, 0.0).max(0.0);
        self.remaining = self.remaining.max(finite_or(duration, 0.0));
    }

    /// Advance by `dt` and return the raw damage of every tick boundary crossed.
    ///
    /// Only boundaries inside the remaining duration count, so one huge step
    /// deals the same damage as many small ones.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = finite_or(dt, 0.0).max(0.0);
        let window = dt.min(self.remaining.max(0.0));
        self.remaining -= dt;

        let elapsed = self.tick_timer + window;
        let ticks = ((elapsed + TICK_EPSILON) / POISON_TICK_INTERVAL).floor();
        self.tick_timer = (elapsed - ticks * POISON_TICK_INTERVAL).max(0.0);
        ticks * self.dps * POISON_TICK_INTERVAL
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= TICK_EPSILON
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Marks a hostile entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    /// XP dropped on death before build multipliers.
    pub xp_value: f32,
}

/// The player's progression.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub xp: f32,
    pub xp_to_next: f32,
    pub level: u32,
    /// Max speed at level 1; growth is capped relative to it.
    pub base_speed: f32,
}

impl Player {
    pub fn new(xp_to_next: f32, base_speed: f32) -> Self {
        Self {
            xp: 0.0,
            xp_to_next,
            level: 1,
            base_speed,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpOrb {
    pub value: f32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthOrb {
    pub value: f32,
}

// ============================================================================
// AI COMPONENTS
// ============================================================================

/// Steering behavior of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AiBehavior {
    /// Head straight at the player.
    #[default]
    ChasePlayer,
    /// Close in to `radius`, then circle the player.
    Circle { radius: f32 },
    /// Stand still.
    Idle,
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub behavior: AiBehavior,
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning the player entity.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: Player,
    pub position: Position,
    pub velocity: Velocity,
    pub health: Health,
    pub armor: Armor,
    pub footprint: Footprint,
    pub tint: Tint,
}

impl PlayerBundle {
    pub fn new(x: f32, y: f32, max_health: f32, speed: f32, size: f32, xp_to_next: f32) -> Self {
        Self {
            player: Player::new(xp_to_next, speed),
            position: Position::new(x, y),
            velocity: Velocity::default().with_max_speed(speed),
            health: Health::new(max_health),
            armor: Armor::default(),
            footprint: Footprint::square(size),
            tint: Tint::rgb(0.3, 0.6, 1.0),
        }
    }
}

/// Bundle for spawning an enemy entity.
#[derive(Bundle)]
pub struct EnemyBundle {
    pub enemy: Enemy,
    pub position: Position,
    pub velocity: Velocity,
    pub health: Health,
    pub footprint: Footprint,
    pub tint: Tint,
    pub ai: Ai,
}

/// Bundle for spawning an XP orb.
#[derive(Bundle)]
pub struct XpOrbBundle {
    pub orb: XpOrb,
    pub position: Position,
    pub footprint: Footprint,
    pub tint: Tint,
}

impl XpOrbBundle {
    pub fn new(x: f32, y: f32, value: f32) -> Self {
        Self {
            orb: XpOrb { value },
            position: Position::new(x, y),
            footprint: Footprint::square(10.0),
            tint: Tint::rgb(0.2, 1.0, 0.4),
        }
    }
}

/// Bundle for spawning a health orb.
#[derive(Bundle)]
pub struct HealthOrbBundle {
    pub orb: HealthOrb,
    pub position: Position,
    pub footprint: Footprint,
    pub tint: Tint,
}

impl HealthOrbBundle {
    pub fn new(x: f32, y: f32, value: f32) -> Self {
        Self {
            orb: HealthOrb { value },
            position: Position::new(x, y),
            footprint: Footprint::square(12.0),
            tint: Tint::rgb(1.0, 0.2, 0.3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_radius_prefers_explicit() {
        let footprint = Footprint { width: 20.0, height: 40.0 };
        assert_eq!(collision_radius(Some(&footprint), None), 20.0);
        assert_eq!(
            collision_radius(Some(&footprint), Some(&CollisionRadius(5.0))),
            5.0
        );
        assert_eq!(collision_radius(None, None), 0.0);
    }

    #[test]
    fn test_health_never_negative() {
        let mut health = Health::new(10.0);
        health.damage(25.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());

        health.damage(f32::NAN);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_armor_stacks_additively() {
        let mut armor = Armor::new(0.2);
        armor.stack(0.2);
        assert!((armor.reduction - 0.4).abs() < 1e-6);

        armor.stack(5.0);
        assert_eq!(armor.reduction, MAX_ARMOR_REDUCTION);
    }

    #[test]
    fn test_pierce_counts_down() {
        let mut pierce = Pierce::new(1);
        assert!(pierce.consume());
        assert!(!pierce.consume());
        assert_eq!(pierce.remaining, -1);

        let mut pierce = Pierce::new(0);
        pierce.add(2);
        assert_eq!(pierce.remaining, 2);
        assert_eq!(pierce.max, 2);
    }

    #[test]
    fn test_poison_reapply_extends_and_adds() {
        let mut poison = Poisoned::new(10.0, 2.0);
        poison.reapply(5.0, 1.0);
        assert_eq!(poison.dps, 15.0);
        assert_eq!(poison.remaining, 2.0);

        poison.reapply(0.0, 4.0);
        assert_eq!(poison.remaining, 4.0);
    }

    #[test]
    fn test_poison_advance_handles_large_steps() {
        let mut poison = Poisoned::new(10.0, 2.0);
        let damage = poison.advance(1.2);
        assert!((damage - 10.0).abs() < 1e-5);
        assert!((poison.tick_timer - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_poison_advance_stops_at_duration() {
        let mut poison = Poisoned::new(10.0, 2.0);
        let damage = poison.advance(1.0e8);
        assert!((damage - 20.0).abs() < 1e-4);
        assert!(poison.is_expired());
        assert_eq!(poison.advance(1.0e8), 0.0);
    }

    #[test]
    fn test_slow_keeps_original_speed() {
        let mut slow = Slowed::new(0.5, 1.0, 100.0);
        slow.reapply(0.3, 3.0);
        assert_eq!(slow.original_speed, 100.0);
        assert_eq!(slow.amount, 0.5);
        assert_eq!(slow.remaining, 3.0);
        assert_eq!(slow.slowed_speed(), 50.0);
    }

    #[test]
    fn test_velocity_clamps_to_max() {
        let mut vel = Velocity::new(30.0, 40.0).with_max_speed(10.0);
        vel.clamp_to_max();
        assert!((vel.magnitude() - 10.0).abs() < 1e-4);

        let mut vel = Velocity::new(f32::NAN, 1.0);
        vel.clamp_to_max();
        assert_eq!(vel.magnitude(), 0.0);
    }
}
