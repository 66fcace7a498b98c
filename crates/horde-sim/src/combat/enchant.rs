//! Enchants: proc-based secondary effects attached to an ability's hits
//!
//! Tier parameters come from a static table; a kind/tier pair with no entry
//! resolves as a no-op.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::resolver::{CombatContext, CombatResolver, HitOutcome};
use super::{roll_chance, BURN_INTERVAL};
use crate::ability::zone::Zone;
use crate::targeting::{enemies_in_radius, nearest_enemy};

pub const MAX_ENCHANT_TIER: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnchantKind {
    Burning,
    Freezing,
    Vampiric,
    Piercing,
    Chain,
    Explosive,
    Toxic,
    Critical,
}

impl EnchantKind {
    pub const ALL: [EnchantKind; 8] = [
        Self::Burning,
        Self::Freezing,
        Self::Vampiric,
        Self::Piercing,
        Self::Chain,
        Self::Explosive,
        Self::Toxic,
        Self::Critical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Burning => "Burning",
            Self::Freezing => "Freezing",
            Self::Vampiric => "Vampiric",
            Self::Piercing => "Piercing",
            Self::Chain => "Chain",
            Self::Explosive => "Explosive",
            Self::Toxic => "Toxic",
            Self::Critical => "Critical",
        }
    }
}

/// An enchant kind at a tier, attached to one ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enchant {
    pub kind: EnchantKind,
    pub tier: u8,
}

impl Enchant {
    pub fn new(kind: EnchantKind, tier: u8) -> Self {
        Self {
            kind,
            tier: tier.clamp(1, MAX_ENCHANT_TIER),
        }
    }
}

/// Numbers for one kind at one tier. Fields a kind doesn't use are zero.
///
/// | Kind      | chance      | percent              | duration  | count        | radius  | stun |
/// |-----------|-------------|----------------------|-----------|--------------|---------|------|
/// | Burning   |             | burn tick / hit      | burn      |              |         |      |
/// | Freezing  | hard freeze | slow multiplier      | freeze    |              |         |      |
/// | Vampiric  |             | heal / hit           |           |              |         |      |
/// | Piercing  |             | retention per pierce |           | extra pierce |         |      |
/// | Chain     |             | bounce / hit         |           | bounces      | reach   | yes  |
/// | Explosive |             | splash / hit         |           |              | splash  |      |
/// | Toxic     | cloud spawn | cloud tick / hit     | cloud     |              | cloud   |      |
/// | Critical  | bonus crit  | bonus crit mult.     |           |              |         |      |
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnchantTier {
    pub chance: f32,
    pub percent: f32,
    pub duration: f32,
    pub count: u32,
    pub radius: f32,
    pub stun: f32,
}

pub fn tier_params(kind: EnchantKind, tier: u8) -> Option<EnchantTier> {
    let t = EnchantTier::default();
    let params = match (kind, tier) {
        (EnchantKind::Burning, 1) => EnchantTier {
            percent: 0.2,
            duration: 3.0,
            ..t
        },
        (EnchantKind::Burning, 2) => EnchantTier {
            percent: 0.3,
            duration: 3.5,
            ..t
        },
        (EnchantKind::Burning, 3) => EnchantTier {
            percent: 0.4,
            duration: 4.0,
            ..t
        },

        (EnchantKind::Freezing, 1) => EnchantTier {
            chance: 0.10,
            percent: 0.6,
            duration: 1.0,
            ..t
        },
        (EnchantKind::Freezing, 2) => EnchantTier {
            chance: 0.15,
            percent: 0.5,
            duration: 1.25,
            ..t
        },
        (EnchantKind::Freezing, 3) => EnchantTier {
            chance: 0.20,
            percent: 0.4,
            duration: 1.5,
            ..t
        },

        (EnchantKind::Vampiric, 1) => EnchantTier {
            percent: 0.05,
            ..t
        },
        (EnchantKind::Vampiric, 2) => EnchantTier {
            percent: 0.08,
            ..t
        },
        (EnchantKind::Vampiric, 3) => EnchantTier {
            percent: 0.12,
            ..t
        },

        (EnchantKind::Piercing, 1) => EnchantTier {
            percent: 0.7,
            count: 1,
            ..t
        },
        (EnchantKind::Piercing, 2) => EnchantTier {
            percent: 0.8,
            count: 2,
            ..t
        },
        (EnchantKind::Piercing, 3) => EnchantTier {
            percent: 0.9,
            count: 3,
            ..t
        },

        (EnchantKind::Chain, 1) => EnchantTier {
            percent: 0.4,
            count: 1,
            radius: 160.0,
            ..t
        },
        (EnchantKind::Chain, 2) => EnchantTier {
            percent: 0.5,
            count: 2,
            radius: 180.0,
            stun: 0.3,
            ..t
        },
        (EnchantKind::Chain, 3) => EnchantTier {
            percent: 0.6,
            count: 3,
            radius: 200.0,
            stun: 0.6,
            ..t
        },

        (EnchantKind::Explosive, 1) => EnchantTier {
            percent: 0.5,
            radius: 60.0,
            ..t
        },
        (EnchantKind::Explosive, 2) => EnchantTier {
            percent: 0.6,
            radius: 75.0,
            ..t
        },
        (EnchantKind::Explosive, 3) => EnchantTier {
            percent: 0.75,
            radius: 90.0,
            ..t
        },

        (EnchantKind::Toxic, 1) => EnchantTier {
            chance: 0.25,
            percent: 0.15,
            duration: 3.0,
            radius: 50.0,
            ..t
        },
        (EnchantKind::Toxic, 2) => EnchantTier {
            chance: 0.35,
            percent: 0.2,
            duration: 4.0,
            radius: 60.0,
            ..t
        },
        (EnchantKind::Toxic, 3) => EnchantTier {
            chance: 0.5,
            percent: 0.25,
            duration: 5.0,
            radius: 70.0,
            ..t
        },

        (EnchantKind::Critical, 1) => EnchantTier {
            chance: 0.10,
            percent: 1.5,
            ..t
        },
        (EnchantKind::Critical, 2) => EnchantTier {
            chance: 0.15,
            percent: 1.75,
            ..t
        },
        (EnchantKind::Critical, 3) => EnchantTier {
            chance: 0.20,
            percent: 2.0,
            ..t
        },

        _ => return None,
    };
    Some(params)
}

/// Post-HP enchant effects. Piercing is applied upstream when the projectile
/// spawns and Critical during the damage roll, so both are no-ops here.
pub(super) fn resolve(
    resolver: &mut CombatResolver,
    ctx: &mut CombatContext<'_>,
    outcome: &HitOutcome,
    enchant: Enchant,
) {
    let Some(tier) = tier_params(enchant.kind, enchant.tier) else {
        debug!("No tier {} entry for {} enchant", enchant.tier, enchant.kind.name());
        return;
    };

    match enchant.kind {
        EnchantKind::Burning => {
            if let Some(enemy) = ctx.enemies.get_mut(outcome.target).filter(|e| e.is_alive()) {
                enemy
                    .status
                    .apply_dot(outcome.damage * tier.percent, BURN_INTERVAL, tier.duration);
            }
        }
        EnchantKind::Freezing => {
            if outcome.killed {
                return;
            }
            let hard_freeze = roll_chance(ctx.rng, tier.chance);
            if let Some(enemy) = ctx.enemies.get_mut(outcome.target) {
                if hard_freeze {
                    enemy.status.apply_freeze(tier.duration);
                } else {
                    enemy.status.apply_slow(tier.percent, tier.duration * 2.0);
                }
            }
        }
        EnchantKind::Vampiric => {
            ctx.player.heal(outcome.damage * tier.percent);
        }
        EnchantKind::Piercing | EnchantKind::Critical => {}
        EnchantKind::Chain => chain(resolver, ctx, outcome, &tier),
        EnchantKind::Explosive => {
            let splash = outcome.damage * tier.percent;
            for id in enemies_in_radius(ctx.enemies, outcome.position, tier.radius) {
                if id != outcome.target {
                    resolver.apply_damage(ctx, id, splash, false);
                }
            }
        }
        EnchantKind::Toxic => {
            if roll_chance(ctx.rng, tier.chance) {
                ctx.effects.zones.push(Zone::toxic_cloud(
                    outcome.position,
                    tier.radius,
                    outcome.damage * tier.percent,
                    tier.duration,
                ));
            }
        }
    }
}

/// Bounce to up to `count` nearest untouched enemies, each taking a share of
/// the original hit.
///
/// Each bounce searches from the enemy the previous bounce struck, not from
/// the primary target, so a chain can walk along a line of enemies further
/// than `radius` from where it started.
fn chain(
    resolver: &mut CombatResolver,
    ctx: &mut CombatContext<'_>,
    outcome: &HitOutcome,
    tier: &EnchantTier,
) {
    let bounce_damage = outcome.damage * tier.percent;
    let mut visited = vec![outcome.target];
    let mut from = outcome.position;

    for _ in 0..tier.count {
        let Some((next, position)) = nearest_enemy(ctx.enemies, from, tier.radius, &visited) else {
            break;
        };
        visited.push(next);

        let bounce = resolver.apply_damage(ctx, next, bounce_damage, false);
        if tier.stun > 0.0 && bounce.is_some_and(|b| !b.killed) {
            if let Some(enemy) = ctx.enemies.get_mut(next) {
                enemy.status.apply_stun(tier.stun);
            }
        }
        from = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_all_tiers() {
        for kind in EnchantKind::ALL {
            for tier in 1..=MAX_ENCHANT_TIER {
                assert!(tier_params(kind, tier).is_some(), "{} {}", kind.name(), tier);
            }
        }
    }

    #[test]
    fn test_missing_tier_is_none() {
        assert!(tier_params(EnchantKind::Chain, 0).is_none());
        assert!(tier_params(EnchantKind::Chain, 4).is_none());
    }

    #[test]
    fn test_chain_stun_escalates() {
        let stuns: Vec<f32> = (1..=3)
            .map(|t| tier_params(EnchantKind::Chain, t).unwrap().stun)
            .collect();
        assert_eq!(stuns[0], 0.0);
        assert!(stuns[2] > stuns[1] && stuns[1] > stuns[0]);
    }

    #[test]
    fn test_enchant_tier_clamped() {
        assert_eq!(Enchant::new(EnchantKind::Toxic, 9).tier, MAX_ENCHANT_TIER);
        assert_eq!(Enchant::new(EnchantKind::Toxic, 0).tier, 1);
    }
}
