//! Combat: hit sources, the damage pipeline, enchants, and death
//!
//! Damage pipeline per hit:
//! base damage -> global damage multiplier -> crit roll -> apply to HP ->
//! life-steal -> secondary procs (burn, slow) -> enchant dispatch.

pub mod damage;
pub mod enchant;
pub mod resolver;

use glam::Vec2;
use rand::Rng;

use crate::ability::AbilityId;
use crate::enemy::EnemyId;
use crate::status::StatusEffectSet;

pub use damage::{roll_damage, DamageRoll};
pub use enchant::{Enchant, EnchantKind, EnchantTier, MAX_ENCHANT_TIER};
pub use resolver::{CombatContext, CombatEffects, CombatResolver, HitOutcome, SpawnRequest};

/// Seconds between burn ticks for every burn source
pub const BURN_INTERVAL: f32 = 0.5;

/// Status effects a hit applies to a surviving target. Zero means "none".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusPayload {
    pub slow_multiplier: f32,
    pub slow_duration: f32,
    pub freeze_duration: f32,
    pub stun_duration: f32,
    /// Knockback speed, pushed away from the hit origin
    pub knockback_speed: f32,
    pub knockback_duration: f32,
    pub burn_damage: f32,
    pub burn_duration: f32,
    pub poison_damage: f32,
    pub poison_duration: f32,
}

impl StatusPayload {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `status` on a target standing at `target_pos`
    pub fn apply(&self, status: &mut StatusEffectSet, origin: Vec2, target_pos: Vec2) {
        if self.slow_duration > 0.0 {
            status.apply_slow(self.slow_multiplier, self.slow_duration);
        }
        if self.freeze_duration > 0.0 {
            status.apply_freeze(self.freeze_duration);
        }
        if self.stun_duration > 0.0 {
            status.apply_stun(self.stun_duration);
        }
        if self.knockback_duration > 0.0 && self.knockback_speed > 0.0 {
            if let Some(dir) = horde_core::math::direction_to(origin, target_pos) {
                status.apply_knockback(dir * self.knockback_speed, self.knockback_duration);
            }
        }
        if self.burn_duration > 0.0 {
            status.apply_dot(self.burn_damage, BURN_INTERVAL, self.burn_duration);
        }
        if self.poison_duration > 0.0 {
            status.apply_poison(self.poison_damage, self.poison_duration);
        }
    }
}

/// Everything the resolver needs to know about where a hit came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitSource {
    pub damage: f32,
    /// Where the hit originated, used for knockback direction
    pub origin: Vec2,
    pub ability: Option<AbilityId>,
    pub enchant: Option<Enchant>,
    pub status: StatusPayload,
    pub can_crit: bool,
    /// Whether life-steal, secondary procs and enchants run
    pub procs: bool,
}

impl HitSource {
    /// A plain hit that crits and procs
    pub fn new(damage: f32, origin: Vec2) -> Self {
        Self {
            damage,
            origin,
            ability: None,
            enchant: None,
            status: StatusPayload::default(),
            can_crit: true,
            procs: true,
        }
    }

    /// Damage that never crits or procs (zone ticks, reactive bursts)
    pub fn passive(damage: f32, origin: Vec2) -> Self {
        Self {
            can_crit: false,
            procs: false,
            ..Self::new(damage, origin)
        }
    }

    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_enchant(mut self, enchant: Option<Enchant>) -> Self {
        self.enchant = enchant;
        self
    }

    pub fn with_status(mut self, status: StatusPayload) -> Self {
        self.status = status;
        self
    }
}

/// A hit waiting for resolution in the combat phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingHit {
    pub target: EnemyId,
    pub source: HitSource,
}

/// Roll a probability. Non-positive chances never draw from the RNG.
pub fn roll_chance(rng: &mut impl Rng, chance: f32) -> bool {
    chance > 0.0 && rng.gen::<f32>() < chance
}
