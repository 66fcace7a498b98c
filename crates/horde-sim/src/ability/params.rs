//! Per-ability, per-level parameter table
//!
//! Read-only once loaded. A missing ability or level resolves to `None`,
//! which the engine treats as "skip this ability for the tick".
//!
//! TOML layout:
//!
//! ```toml
//! [[ability]]
//! id = "Shockwave"
//!
//! [[ability.levels]]
//! damage = 18.0
//! cooldown = 2.4
//! radius = 100.0
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AbilityId;
use crate::combat::StatusPayload;
use crate::error::{SimError, SimResult};

/// Seconds a knockback from an ability hit lasts
pub const KNOCKBACK_DURATION: f32 = 0.2;

/// Named numbers one ability level hands to its shape. Unused fields stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelParams {
    pub damage: f32,
    pub cooldown: f32,
    /// Hit radius (pulse, landing, projectile body, blade, bite)
    pub radius: f32,
    pub range: f32,
    pub count: u32,
    pub speed: f32,
    pub lifetime: f32,
    pub pierce: u32,
    /// Total cone width in radians for multi-projectile volleys
    pub spread: f32,
    pub heal: f32,

    pub charge_time: f32,
    pub commit_time: f32,
    pub distance: f32,
    /// Player movement scale while charging
    pub charge_slow: f32,

    pub slow: f32,
    pub slow_duration: f32,
    pub freeze: f32,
    pub stun: f32,
    pub knockback: f32,
    pub burn_damage: f32,
    pub burn_duration: f32,
    pub poison_damage: f32,
    pub poison_duration: f32,

    pub orbit_radius: f32,
    /// Radians per second
    pub angular_speed: f32,
    pub hit_interval: f32,

    pub zone_damage: f32,
    pub zone_radius: f32,
    pub zone_duration: f32,
    pub tick_interval: f32,

    pub internal_cooldown: f32,
}

impl LevelParams {
    /// Status effects these params put on a surviving target
    pub fn status(&self) -> StatusPayload {
        StatusPayload {
            slow_multiplier: self.slow,
            slow_duration: self.slow_duration,
            freeze_duration: self.freeze,
            stun_duration: self.stun,
            knockback_speed: self.knockback,
            knockback_duration: if self.knockback > 0.0 { KNOCKBACK_DURATION } else { 0.0 },
            burn_damage: self.burn_damage,
            burn_duration: self.burn_duration,
            poison_damage: self.poison_damage,
            poison_duration: self.poison_duration,
        }
    }

    pub fn has_zone(&self) -> bool {
        self.zone_duration > 0.0 && self.zone_radius > 0.0
    }
}

#[derive(Debug, Deserialize)]
struct ParamFile {
    #[serde(default)]
    ability: Vec<AbilityEntry>,
}

#[derive(Debug, Deserialize)]
struct AbilityEntry {
    id: AbilityId,
    levels: Vec<LevelParams>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTable {
    levels: BTreeMap<AbilityId, Vec<LevelParams>>,
}

impl Default for ParamTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ParamTable {
    pub fn empty() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        let file: ParamFile = toml::from_str(content).map_err(|source| SimError::Parse {
            what: "ability table",
            source,
        })?;

        let mut table = Self::empty();
        for entry in file.ability {
            if table.levels.insert(entry.id, entry.levels).is_some() {
                return Err(SimError::InvalidAbilityTable(format!(
                    "{:?} is listed twice",
                    entry.id
                )));
            }
        }
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> SimResult<()> {
        for (id, levels) in &self.levels {
            if levels.is_empty() {
                return Err(SimError::InvalidAbilityTable(format!("{:?} has no levels", id)));
            }
            for (i, params) in levels.iter().enumerate() {
                if params.cooldown < 0.0 || params.damage < 0.0 || params.radius < 0.0 {
                    return Err(SimError::InvalidAbilityTable(format!(
                        "{:?} level {} has a negative value",
                        id,
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, id: AbilityId, levels: Vec<LevelParams>) {
        self.levels.insert(id, levels);
    }

    /// Parameters for `id` at `level` (1-based)
    pub fn get(&self, id: AbilityId, level: u32) -> Option<&LevelParams> {
        let index = level.checked_sub(1)? as usize;
        self.levels.get(&id)?.get(index)
    }

    pub fn max_level(&self, id: AbilityId) -> Option<u32> {
        self.levels.get(&id).map(|levels| levels.len() as u32)
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for id in AbilityId::ALL {
            let levels = (1..=BUILTIN_LEVELS).map(|level| builtin_level(id, level)).collect();
            table.insert(id, levels);
        }
        table
    }
}

const BUILTIN_LEVELS: u32 = 5;

fn builtin_level(id: AbilityId, level: u32) -> LevelParams {
    let l = level as f32;
    let base = LevelParams::default();
    match id {
        AbilityId::Shockwave => LevelParams {
            damage: 12.0 + 6.0 * l,
            cooldown: 2.6 - 0.15 * l,
            radius: 90.0 + 10.0 * l,
            knockback: 260.0,
            ..base
        },
        AbilityId::Smite => LevelParams {
            damage: 30.0 + 12.0 * l,
            cooldown: 3.0,
            radius: 40.0,
            range: 420.0,
            stun: 0.5 + 0.1 * l,
            ..base
        },
        AbilityId::Meteor => LevelParams {
            damage: 45.0 + 15.0 * l,
            cooldown: 4.5 - 0.2 * l,
            radius: 70.0 + 5.0 * l,
            range: 260.0,
            burn_damage: 3.0 + l,
            burn_duration: 3.0,
            ..base
        },
        AbilityId::DashStrike => LevelParams {
            damage: 30.0 + 10.0 * l,
            cooldown: 5.0 - 0.25 * l,
            radius: 70.0,
            range: 300.0,
            charge_time: 0.35,
            commit_time: 0.25,
            distance: 160.0 + 20.0 * l,
            charge_slow: 0.4,
            stun: 0.3,
            ..base
        },
        AbilityId::Skyfall => LevelParams {
            damage: 45.0 + 15.0 * l,
            cooldown: 8.0 - 0.4 * l,
            radius: 110.0,
            range: 350.0,
            charge_time: 0.6,
            commit_time: 0.5,
            distance: 220.0,
            charge_slow: 0.3,
            knockback: 200.0,
            zone_damage: 6.0 + 3.0 * l,
            zone_radius: 90.0,
            zone_duration: 3.0,
            tick_interval: 0.5,
            ..base
        },
        AbilityId::ArcaneBolt => LevelParams {
            damage: 14.0 + 5.0 * l,
            cooldown: 1.2 - 0.05 * l,
            radius: 8.0,
            range: 500.0,
            count: 1 + level / 2,
            speed: 420.0,
            lifetime: 1.6,
            pierce: if level >= 4 { 1 } else { 0 },
            spread: 0.2,
            ..base
        },
        AbilityId::ScatterShot => LevelParams {
            damage: 8.0 + 3.0 * l,
            cooldown: 1.8,
            radius: 6.0,
            range: 320.0,
            count: 3 + level,
            speed: 380.0,
            lifetime: 0.9,
            spread: 0.9,
            ..base
        },
        AbilityId::Miasma => LevelParams {
            cooldown: 6.0 - 0.3 * l,
            range: 300.0,
            slow: 0.7,
            slow_duration: 1.0,
            poison_damage: 2.0 + l,
            poison_duration: 2.0,
            zone_damage: 5.0 + 2.0 * l,
            zone_radius: 80.0 + 10.0 * l,
            zone_duration: 4.0 + 0.5 * l,
            tick_interval: 0.5,
            ..base
        },
        AbilityId::OrbitingBlades => LevelParams {
            damage: 10.0 + 4.0 * l,
            radius: 12.0,
            orbit_radius: 70.0,
            angular_speed: 3.0,
            hit_interval: 0.5,
            ..base
        },
        AbilityId::SpiritWolf => LevelParams {
            damage: 14.0 + 5.0 * l,
            cooldown: 1.1 - 0.05 * l,
            radius: 30.0,
            range: 260.0,
            speed: 320.0,
            orbit_radius: 60.0,
            angular_speed: 1.5,
            ..base
        },
        AbilityId::Renewal => LevelParams {
            cooldown: 8.0 - 0.5 * l,
            heal: 6.0 + 3.0 * l,
            ..base
        },
        AbilityId::Retribution => LevelParams {
            damage: 20.0 + 8.0 * l,
            radius: 120.0,
            knockback: 200.0,
            internal_cooldown: 1.5,
            ..base
        },
        AbilityId::Overcharge => LevelParams {
            damage: 12.0 + 6.0 * l,
            radius: 60.0,
            internal_cooldown: 0.8,
            ..base
        },
    }
}
