//! Enemy types, spawn stats, and per-instance state
//!
//! Every enemy type maps to one [`Archetype`], and the archetype selects the
//! update function from the strategy table in [`behavior`].

pub mod behavior;
pub mod boss;

use glam::Vec2;
use horde_core::Handle;
use serde::{Deserialize, Serialize};

use crate::difficulty;
use crate::status::StatusEffectSet;

pub use behavior::{behavior_for, update_agent, AgentContext, BehaviorRequest, BehaviorState};

/// Pool handle of a live enemy
pub type EnemyId = Handle;

pub const ELITE_HP_MULT: f32 = 2.5;
pub const ELITE_DAMAGE_MULT: f32 = 1.5;
pub const ELITE_SPEED_MULT: f32 = 1.1;
pub const ELITE_XP_MULT: u32 = 3;
pub const ELITE_RADIUS_MULT: f32 = 1.3;

/// Visibility of a phasing enemy while intangible
pub const INTANGIBLE_OPACITY: f32 = 0.35;

/// Behavioral category of an enemy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Chase,
    BurstCharge,
    Ranged,
    Split,
    Swarm,
    Summon,
    Phase,
    Leap,
    BossA,
    BossB,
}

/// Authored enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    Shambler,
    Swarmer,
    Runner,
    Brute,
    Charger,
    Spitter,
    Splitter,
    Splitling,
    Summoner,
    Wraith,
    Leaper,
    Warlord,
    Lich,
}

/// Wave-one stats of an enemy type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseStats {
    pub hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub xp: u32,
    pub radius: f32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 13] = [
        Self::Shambler,
        Self::Swarmer,
        Self::Runner,
        Self::Brute,
        Self::Charger,
        Self::Spitter,
        Self::Splitter,
        Self::Splitling,
        Self::Summoner,
        Self::Wraith,
        Self::Leaper,
        Self::Warlord,
        Self::Lich,
    ];

    pub fn archetype(self) -> Archetype {
        match self {
            Self::Shambler | Self::Runner | Self::Brute => Archetype::Chase,
            Self::Swarmer | Self::Splitling => Archetype::Swarm,
            Self::Charger => Archetype::BurstCharge,
            Self::Spitter => Archetype::Ranged,
            Self::Splitter => Archetype::Split,
            Self::Summoner => Archetype::Summon,
            Self::Wraith => Archetype::Phase,
            Self::Leaper => Archetype::Leap,
            Self::Warlord => Archetype::BossA,
            Self::Lich => Archetype::BossB,
        }
    }

    pub fn base_stats(self) -> BaseStats {
        let (hp, speed, damage, xp, radius) = match self {
            Self::Shambler => (20.0, 55.0, 8.0, 1, 12.0),
            Self::Swarmer => (8.0, 95.0, 4.0, 1, 8.0),
            Self::Runner => (12.0, 125.0, 5.0, 1, 10.0),
            Self::Brute => (90.0, 40.0, 18.0, 5, 20.0),
            Self::Charger => (35.0, 60.0, 14.0, 3, 14.0),
            Self::Spitter => (18.0, 50.0, 10.0, 2, 12.0),
            Self::Splitter => (40.0, 50.0, 10.0, 3, 16.0),
            Self::Splitling => (10.0, 90.0, 5.0, 1, 8.0),
            Self::Summoner => (45.0, 45.0, 6.0, 5, 14.0),
            Self::Wraith => (25.0, 70.0, 9.0, 2, 12.0),
            Self::Leaper => (30.0, 65.0, 12.0, 3, 12.0),
            Self::Warlord => (2500.0, 60.0, 30.0, 100, 40.0),
            Self::Lich => (6000.0, 50.0, 25.0, 250, 36.0),
        };
        BaseStats {
            hp,
            speed,
            damage,
            xp,
            radius,
        }
    }

    pub fn is_boss(self) -> bool {
        matches!(self.archetype(), Archetype::BossA | Archetype::BossB)
    }

    /// Lower-tier type and count spawned when this type dies
    pub fn split_into(self) -> Option<(EnemyKind, u32)> {
        match self {
            Self::Splitter => Some((Self::Splitling, 3)),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shambler => "Shambler",
            Self::Swarmer => "Swarmer",
            Self::Runner => "Runner",
            Self::Brute => "Brute",
            Self::Charger => "Charger",
            Self::Spitter => "Spitter",
            Self::Splitter => "Splitter",
            Self::Splitling => "Splitling",
            Self::Summoner => "Summoner",
            Self::Wraith => "Wraith",
            Self::Leaper => "Leaper",
            Self::Warlord => "Warlord",
            Self::Lich => "Lich",
        }
    }
}

/// A live enemy in the pool
#[derive(Debug, Clone)]
pub struct EnemyInstance {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub xp_value: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub elite: bool,
    /// Intangible enemies are skipped by hit detection
    pub tangible: bool,
    pub opacity: f32,
    pub behavior: BehaviorState,
    pub status: StatusEffectSet,
}

impl EnemyInstance {
    /// Build an enemy with stats scaled for `wave`
    pub fn spawn(id: EnemyId, kind: EnemyKind, position: Vec2, wave: u32, elite: bool) -> Self {
        let base = kind.base_stats();
        let mut enemy = Self {
            id,
            kind,
            hp: difficulty::scale_hp(base.hp, wave),
            max_hp: 0.0,
            speed: difficulty::scale_speed(base.speed, wave),
            damage: difficulty::scale_damage(base.damage, wave),
            xp_value: base.xp,
            position,
            velocity: Vec2::ZERO,
            radius: base.radius,
            elite,
            tangible: true,
            opacity: 1.0,
            behavior: BehaviorState::for_archetype(kind.archetype()),
            status: StatusEffectSet::default(),
        };
        if elite {
            enemy.hp *= ELITE_HP_MULT;
            enemy.damage *= ELITE_DAMAGE_MULT;
            enemy.speed *= ELITE_SPEED_MULT;
            enemy.xp_value *= ELITE_XP_MULT;
            enemy.radius *= ELITE_RADIUS_MULT;
        }
        enemy.max_hp = enemy.hp;
        enemy
    }

    /// Build a boss with a fixed HP, bypassing wave scaling for HP
    pub fn spawn_boss(id: EnemyId, kind: EnemyKind, position: Vec2, wave: u32, hp: f32) -> Self {
        let mut enemy = Self::spawn(id, kind, position, wave, false);
        enemy.hp = hp;
        enemy.max_hp = hp;
        enemy
    }

    pub fn archetype(&self) -> Archetype {
        self.kind.archetype()
    }

    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            0.0
        } else {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        }
    }

    /// Whether hit detection may target this enemy
    pub fn can_be_hit(&self) -> bool {
        self.tangible && self.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> EnemyId {
        Handle::from_raw(0, 0)
    }

    #[test]
    fn test_every_kind_has_stats() {
        for kind in EnemyKind::ALL {
            let stats = kind.base_stats();
            assert!(stats.hp > 0.0, "{}", kind.name());
            assert!(stats.radius > 0.0);
        }
    }

    #[test]
    fn test_spawn_scales_with_wave() {
        let early = EnemyInstance::spawn(id(), EnemyKind::Shambler, Vec2::ZERO, 1, false);
        let late = EnemyInstance::spawn(id(), EnemyKind::Shambler, Vec2::ZERO, 10, false);
        assert!(late.max_hp > early.max_hp);
        assert!(late.damage > early.damage);
        assert_eq!(early.hp, early.max_hp);
    }

    #[test]
    fn test_elite_multiplies_stats() {
        let normal = EnemyInstance::spawn(id(), EnemyKind::Brute, Vec2::ZERO, 3, false);
        let elite = EnemyInstance::spawn(id(), EnemyKind::Brute, Vec2::ZERO, 3, true);
        assert!((elite.max_hp - normal.max_hp * ELITE_HP_MULT).abs() < 1e-3);
        assert_eq!(elite.xp_value, normal.xp_value * ELITE_XP_MULT);
    }

    #[test]
    fn test_boss_hp_override() {
        let boss = EnemyInstance::spawn_boss(id(), EnemyKind::Warlord, Vec2::ZERO, 5, 3000.0);
        assert_eq!(boss.hp, 3000.0);
        assert_eq!(boss.max_hp, 3000.0);
        assert!(boss.is_boss());
    }

    #[test]
    fn test_alive_boundary() {
        let mut enemy = EnemyInstance::spawn(id(), EnemyKind::Swarmer, Vec2::ZERO, 1, false);
        enemy.hp = 0.0;
        assert!(!enemy.is_alive());
        assert!(!enemy.can_be_hit());
    }
}
