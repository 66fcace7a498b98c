//! Player state, modifiers, and progression
//!
//! The level curve comes from [`crate::difficulty::xp_required`]. Modifiers
//! are the only thing enhancements mutate directly; abilities are granted and
//! levelled through the ability engine.

use std::collections::BTreeMap;

use glam::Vec2;
use horde_core::math::normalized;
use serde::{Deserialize, Serialize};

use crate::ability::AbilityId;
use crate::config::PlayerConfig;
use crate::difficulty;

/// Upper bound on the cooldown reduction modifiers can reach
pub const MIN_COOLDOWN_MULT: f32 = 0.25;

/// Multipliers and proc chances applied to everything the player does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub damage_mult: f32,
    pub crit_chance: f32,
    /// Added to the base 1.5x crit multiplier
    pub crit_bonus: f32,
    /// Fraction of damage dealt returned as healing
    pub life_steal: f32,
    pub cooldown_mult: f32,
    pub speed_mult: f32,
    /// Flat damage reduction per hit taken
    pub armor: f32,
    /// HP per second
    pub regen: f32,
    pub xp_mult: f32,
    pub burn_chance: f32,
    pub slow_chance: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            damage_mult: 1.0,
            crit_chance: 0.05,
            crit_bonus: 0.0,
            life_steal: 0.0,
            cooldown_mult: 1.0,
            speed_mult: 1.0,
            armor: 0.0,
            regen: 0.0,
            xp_mult: 1.0,
            burn_chance: 0.0,
            slow_chance: 0.0,
        }
    }
}

/// A single modifier enhancement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModifierBoost {
    Damage(f32),
    CritChance(f32),
    CritBonus(f32),
    LifeSteal(f32),
    /// Fractional cooldown reduction, e.g. 0.1 = 10% faster
    Cooldown(f32),
    Speed(f32),
    Armor(f32),
    Regen(f32),
    Experience(f32),
    BurnChance(f32),
    SlowChance(f32),
    MaxHp(f32),
}

impl Modifiers {
    /// Apply a boost. `MaxHp` is handled by [`PlayerState::apply_boost`].
    pub fn apply(&mut self, boost: ModifierBoost) {
        match boost {
            ModifierBoost::Damage(v) => self.damage_mult += v,
            ModifierBoost::CritChance(v) => self.crit_chance = (self.crit_chance + v).min(1.0),
            ModifierBoost::CritBonus(v) => self.crit_bonus += v,
            ModifierBoost::LifeSteal(v) => self.life_steal = (self.life_steal + v).min(1.0),
            ModifierBoost::Cooldown(v) => {
                self.cooldown_mult = (self.cooldown_mult * (1.0 - v)).max(MIN_COOLDOWN_MULT)
            }
            ModifierBoost::Speed(v) => self.speed_mult += v,
            ModifierBoost::Armor(v) => self.armor += v,
            ModifierBoost::Regen(v) => self.regen += v,
            ModifierBoost::Experience(v) => self.xp_mult += v,
            ModifierBoost::BurnChance(v) => self.burn_chance = (self.burn_chance + v).min(1.0),
            ModifierBoost::SlowChance(v) => self.slow_chance = (self.slow_chance + v).min(1.0),
            ModifierBoost::MaxHp(_) => {}
        }
    }

    /// Crit multiplier on a successful roll
    pub fn crit_multiplier(&self) -> f32 {
        1.5 + self.crit_bonus
    }
}

/// Things the pickup collaborator reports as collected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pickup {
    Experience(u32),
    Heal(f32),
}

/// Starting loadouts, chosen before the session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    /// Sturdy melee: shockwave pulse and armor
    Warden,
    /// Caster: homing bolts and faster cooldowns
    Arcanist,
    /// Skirmisher: dash strike and crits
    Stalker,
}

impl Job {
    pub fn starting_ability(self) -> AbilityId {
        match self {
            Self::Warden => AbilityId::Shockwave,
            Self::Arcanist => AbilityId::ArcaneBolt,
            Self::Stalker => AbilityId::DashStrike,
        }
    }

    pub fn starting_boosts(self) -> &'static [ModifierBoost] {
        match self {
            Self::Warden => &[ModifierBoost::Armor(2.0), ModifierBoost::MaxHp(30.0)],
            Self::Arcanist => &[ModifierBoost::Cooldown(0.1), ModifierBoost::Experience(0.1)],
            Self::Stalker => &[ModifierBoost::CritChance(0.1), ModifierBoost::Speed(0.1)],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Warden => "Warden",
            Self::Arcanist => "Arcanist",
            Self::Stalker => "Stalker",
        }
    }
}

/// The player character as the simulation sees it
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub hp: f32,
    pub max_hp: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub modifiers: Modifiers,
    /// Owned abilities and their levels
    pub abilities: BTreeMap<AbilityId, u32>,
    pub position: Vec2,
    /// Last non-zero movement direction
    pub facing: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    /// Desired movement from the input collaborator
    pub move_input: Vec2,
    /// Set while a reposition ability is committed
    pub invulnerable: bool,
    /// Set while a reposition ability owns movement
    pub control_locked: bool,
    /// Movement scale imposed by charging abilities
    pub move_speed_scale: f32,
    /// Remaining contact-damage immunity
    pub hurt_cooldown: f32,
    regen_carry: f32,
}

impl PlayerState {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            hp: config.max_hp,
            max_hp: config.max_hp,
            level: 1,
            xp: 0,
            xp_to_next: difficulty::xp_required(1),
            modifiers: Modifiers::default(),
            abilities: BTreeMap::new(),
            position: Vec2::ZERO,
            facing: Vec2::X,
            radius: config.radius,
            base_speed: config.move_speed,
            move_input: Vec2::ZERO,
            invulnerable: false,
            control_locked: false,
            move_speed_scale: 1.0,
            hurt_cooldown: 0.0,
            regen_carry: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_at_max_hp(&self) -> bool {
        self.hp >= self.max_hp
    }

    /// Heal up to max HP. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if amount <= 0.0 || !self.is_alive() {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Take a hit after armor. Invulnerability negates it; anything that gets
    /// through deals at least 1. Returns the damage applied.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if self.invulnerable || amount <= 0.0 || !self.is_alive() {
            return 0.0;
        }
        let applied = (amount - self.modifiers.armor).max(1.0).min(self.hp);
        self.hp = (self.hp - applied).max(0.0);
        applied
    }

    /// Add experience (after the XP multiplier). Returns every level reached.
    pub fn add_xp(&mut self, amount: u32) -> Vec<u32> {
        let gained = (amount as f32 * self.modifiers.xp_mult).floor() as u32;
        self.xp += gained;

        let mut levels = Vec::new();
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = difficulty::xp_required(self.level);
            levels.push(self.level);
        }
        levels
    }

    pub fn apply_boost(&mut self, boost: ModifierBoost) {
        if let ModifierBoost::MaxHp(amount) = boost {
            self.max_hp += amount;
            self.hp += amount;
        } else {
            self.modifiers.apply(boost);
        }
    }

    pub fn ability_level(&self, id: AbilityId) -> u32 {
        self.abilities.get(&id).copied().unwrap_or(0)
    }

    pub fn move_speed(&self) -> f32 {
        self.base_speed * self.modifiers.speed_mult * self.move_speed_scale
    }

    /// Apply movement input unless an ability owns movement.
    pub fn step_movement(&mut self, dt: f32) {
        if self.control_locked {
            return;
        }
        if let Some(dir) = normalized(self.move_input) {
            self.position += dir * self.move_speed() * dt;
            self.facing = dir;
        }
    }

    /// Regenerate HP from the regen modifier. Returns the HP restored.
    pub fn tick_regen(&mut self, dt: f32) -> f32 {
        if self.modifiers.regen <= 0.0 || self.is_at_max_hp() {
            self.regen_carry = 0.0;
            return 0.0;
        }
        self.regen_carry += self.modifiers.regen * dt;
        if self.regen_carry < 1.0 {
            return 0.0;
        }
        let whole = self.regen_carry.floor();
        self.regen_carry -= whole;
        self.heal(whole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(&PlayerConfig::default())
    }

    #[test]
    fn test_add_xp_levels_up() {
        let mut p = player();
        let needed = p.xp_to_next;
        assert!(p.add_xp(needed - 1).is_empty());
        assert_eq!(p.add_xp(1), vec![2]);
        assert_eq!(p.xp, 0);
        assert_eq!(p.xp_to_next, difficulty::xp_required(2));
    }

    #[test]
    fn test_add_xp_multiple_levels() {
        let mut p = player();
        let levels = p.add_xp(10_000);
        assert!(levels.len() > 2);
        assert_eq!(*levels.last().unwrap(), p.level);
        assert!(p.xp < p.xp_to_next);
    }

    #[test]
    fn test_xp_multiplier() {
        let mut p = player();
        p.modifiers.xp_mult = 1.5;
        p.add_xp(10);
        assert_eq!(p.xp, 15);
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut p = player();
        p.hp = p.max_hp - 3.0;
        assert_eq!(p.heal(10.0), 3.0);
        assert!(p.is_at_max_hp());
    }

    #[test]
    fn test_armor_and_minimum_damage() {
        let mut p = player();
        p.modifiers.armor = 5.0;
        assert_eq!(p.take_damage(12.0), 7.0);
        assert_eq!(p.take_damage(2.0), 1.0);
    }

    #[test]
    fn test_invulnerable_takes_nothing() {
        let mut p = player();
        p.invulnerable = true;
        assert_eq!(p.take_damage(50.0), 0.0);
        assert_eq!(p.hp, p.max_hp);
    }

    #[test]
    fn test_damage_never_below_zero() {
        let mut p = player();
        p.take_damage(10_000.0);
        assert_eq!(p.hp, 0.0);
        assert!(!p.is_alive());
    }

    #[test]
    fn test_control_lock_blocks_movement() {
        let mut p = player();
        p.move_input = Vec2::new(1.0, 0.0);
        p.control_locked = true;
        p.step_movement(1.0);
        assert_eq!(p.position, Vec2::ZERO);

        p.control_locked = false;
        p.step_movement(1.0);
        assert!(p.position.x > 0.0);
    }

    #[test]
    fn test_cooldown_boost_is_floored() {
        let mut m = Modifiers::default();
        for _ in 0..20 {
            m.apply(ModifierBoost::Cooldown(0.3));
        }
        assert_eq!(m.cooldown_mult, MIN_COOLDOWN_MULT);
    }

    #[test]
    fn test_regen_whole_points() {
        let mut p = player();
        p.hp = 50.0;
        p.modifiers.regen = 2.0;
        let mut healed = 0.0;
        for _ in 0..4 {
            healed += p.tick_regen(0.25);
        }
        assert_eq!(healed, 2.0);
    }
}
