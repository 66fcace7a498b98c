//! Damage rolls
//!
//! The pre-HP half of the pipeline: global multiplier, base crit, and the
//! independent bonus crit from a Critical enchant.

use rand::Rng;

use super::enchant::{tier_params, EnchantKind};
use super::{roll_chance, HitSource};
use crate::player::Modifiers;

/// Outcome of the pre-HP damage steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: f32,
    pub crit: bool,
}

/// Roll final damage for a hit from `source` with the player's `modifiers`
pub fn roll_damage(source: &HitSource, modifiers: &Modifiers, rng: &mut impl Rng) -> DamageRoll {
    let mut damage = source.damage * modifiers.damage_mult;
    let mut crit = false;

    if source.can_crit {
        if roll_chance(rng, modifiers.crit_chance) {
            damage *= modifiers.crit_multiplier();
            crit = true;
        }

        if let Some(enchant) = source.enchant.filter(|e| e.kind == EnchantKind::Critical) {
            if let Some(tier) = tier_params(enchant.kind, enchant.tier) {
                if roll_chance(rng, tier.chance) {
                    damage *= tier.percent;
                    crit = true;
                }
            }
        }
    }

    DamageRoll {
        damage: damage.max(0.0),
        crit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Enchant;
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn no_crit() -> Modifiers {
        Modifiers {
            crit_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_damage_multiplier() {
        let mut rng = StdRng::seed_from_u64(1);
        let modifiers = Modifiers {
            damage_mult: 1.5,
            ..no_crit()
        };
        let roll = roll_damage(&HitSource::new(10.0, Vec2::ZERO), &modifiers, &mut rng);
        assert_eq!(roll.damage, 15.0);
        assert!(!roll.crit);
    }

    #[test]
    fn test_guaranteed_crit_uses_bonus() {
        let mut rng = StdRng::seed_from_u64(2);
        let modifiers = Modifiers {
            crit_chance: 1.0,
            crit_bonus: 0.5,
            ..Default::default()
        };
        let roll = roll_damage(&HitSource::new(10.0, Vec2::ZERO), &modifiers, &mut rng);
        assert!(roll.crit);
        assert_eq!(roll.damage, 20.0);
    }

    #[test]
    fn test_passive_never_crits() {
        let mut rng = StdRng::seed_from_u64(3);
        let modifiers = Modifiers {
            crit_chance: 1.0,
            ..Default::default()
        };
        let roll = roll_damage(&HitSource::passive(10.0, Vec2::ZERO), &modifiers, &mut rng);
        assert!(!roll.crit);
        assert_eq!(roll.damage, 10.0);
    }

    #[test]
    fn test_critical_enchant_rolls_independently() {
        let mut rng = StdRng::seed_from_u64(4);
        let source = HitSource::new(10.0, Vec2::ZERO).with_enchant(Some(Enchant::new(
            EnchantKind::Critical,
            1,
        )));
        let mut crits = 0;
        for _ in 0..2000 {
            if roll_damage(&source, &no_crit(), &mut rng).crit {
                crits += 1;
            }
        }
        // tier 1 bonus crit chance is 10%
        assert!(crits > 100 && crits < 320, "crits = {}", crits);
    }
}
