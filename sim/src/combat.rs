//! Damage formulas shared by every damage source.

use crate::components::*;

/// Apply `amount` to `health` after armor. Returns the damage actually dealt.
///
/// Non-finite or negative amounts deal nothing.
pub fn apply_damage(health: &mut Health, armor: Option<&Armor>, amount: f32) -> f32 {
    let amount = finite_or(amount, 0.0).max(0.0);
    let mitigated = match armor {
        Some(armor) => armor.mitigate(amount),
        None => amount,
    };
    let before = health.current;
    health.damage(mitigated);
    before - health.current
}

/// Damage an explosion deals at `distance` from its center.
///
/// Linear falloff from full damage at the center to zero at the radius.
pub fn explosion_damage(base: f32, radius: f32, distance: f32) -> f32 {
    let base = finite_or(base, 0.0).max(0.0);
    if !radius.is_finite() || radius <= 0.0 || !distance.is_finite() {
        return 0.0;
    }
    let distance = distance.max(0.0);
    if distance >= radius {
        return 0.0;
    }
    base * (1.0 - distance / radius)
}

/// Whether two discs overlap. Touching edges do not count.
#[inline]
pub fn discs_overlap(a: &Position, ra: f32, b: &Position, rb: f32) -> bool {
    a.distance_to(b) < ra + rb
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_armor_mitigates() {
        let mut health = Health::new(100.0);
        let dealt = apply_damage(&mut health, Some(&Armor::new(0.25)), 20.0);
        assert_eq!(dealt, 15.0);
        assert_eq!(health.current, 85.0);
    }

    #[test]
    fn test_heavy_armor_uses_exact_reduction() {
        let mut health = Health::new(100.0);
        let dealt = apply_damage(&mut health, Some(&Armor::new(0.95)), 100.0);
        assert!((dealt - 5.0).abs() < 1e-4, "dealt {dealt}");
    }

    #[test]
    fn test_overkill_reports_remaining_health() {
        let mut health = Health::new(10.0);
        assert_eq!(apply_damage(&mut health, None, 50.0), 10.0);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_explosion_falloff() {
        assert_eq!(explosion_damage(20.0, 60.0, 0.0), 20.0);
        assert_eq!(explosion_damage(20.0, 60.0, 30.0), 10.0);
        assert_eq!(explosion_damage(20.0, 60.0, 60.0), 0.0);
        assert_eq!(explosion_damage(20.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_discs_overlap_is_strict() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(10.0, 0.0);
        assert!(discs_overlap(&a, 6.0, &b, 5.0));
        assert!(!discs_overlap(&a, 5.0, &b, 5.0));
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_bounds(
            max in 1.0f32..1000.0,
            reduction in -1.0f32..2.0,
            hits in prop::collection::vec(-50.0f32..500.0, 0..20),
        ) {
            let mut health = Health::new(max);
            let armor = Armor::new(reduction);
            for amount in hits {
                let dealt = apply_damage(&mut health, Some(&armor), amount);
                prop_assert!(dealt >= 0.0);
                prop_assert!(health.current >= 0.0 && health.current <= health.max);
            }
        }

        #[test]
        fn prop_armor_formula(amount in 0.0f32..1000.0, reduction in 0.0f32..1.0) {
            let mut health = Health::new(10_000.0);
            let dealt = apply_damage(&mut health, Some(&Armor::new(reduction)), amount);
            prop_assert!((dealt - amount * (1.0 - reduction)).abs() < 1e-2);
        }

        #[test]
        fn prop_explosion_never_exceeds_base(
            base in 0.0f32..500.0,
            radius in -10.0f32..200.0,
            distance in 0.0f32..400.0,
        ) {
            let damage = explosion_damage(base, radius, distance);
            prop_assert!(damage >= 0.0 && damage <= base);
            if distance >= radius {
                prop_assert_eq!(damage, 0.0);
            }
        }
    }
}
