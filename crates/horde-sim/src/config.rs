//! Simulation configuration
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! max_enemies = 600
//!
//! [director]
//! max_active = 450
//!
//! [director.elite]
//! per_wave = 0.01
//! ```

use horde_core::ClockConfig;
use serde::{Deserialize, Serialize};

use crate::enemy::EnemyKind;
use crate::error::{SimError, SimResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub clock: ClockConfig,
    /// Enemy pool capacity
    pub max_enemies: usize,
    /// Projectile pool capacity, shared by player and enemy shots
    pub max_projectiles: usize,
    /// Enemies further than this from the player are culled
    pub cull_distance: f32,
    pub player: PlayerConfig,
    pub director: DirectorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            max_enemies: 400,
            max_projectiles: 600,
            cull_distance: 1800.0,
            player: PlayerConfig::default(),
            director: DirectorConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(content).map_err(|source| SimError::Parse {
            what: "simulation config",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.max_enemies == 0 {
            return Err(SimError::InvalidConfig("max_enemies must be positive".into()));
        }
        if self.director.max_active > self.max_enemies {
            return Err(SimError::InvalidConfig(format!(
                "director.max_active ({}) exceeds max_enemies ({})",
                self.director.max_active, self.max_enemies
            )));
        }
        if self.clock.fixed_timestep <= 0.0 {
            return Err(SimError::InvalidConfig("clock.fixed_timestep must be positive".into()));
        }
        let max_chance = self.director.elite.max_chance;
        if !(0.0..=1.0).contains(&max_chance) {
            return Err(SimError::InvalidConfig(format!(
                "director.elite.max_chance ({}) must be within 0..=1",
                max_chance
            )));
        }
        if let Some(swarm) = &self.director.swarm_rush {
            let timings = [
                swarm.min_interval,
                swarm.max_interval,
                swarm.min_duration,
                swarm.max_duration,
            ];
            if timings.iter().any(|t| !t.is_finite()) {
                return Err(SimError::InvalidConfig("swarm_rush timings must be finite".into()));
            }
            if swarm.min_interval > swarm.max_interval || swarm.min_duration > swarm.max_duration {
                return Err(SimError::InvalidConfig("swarm_rush ranges are inverted".into()));
            }
            if !swarm.spread.is_finite() || swarm.spread < 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "director.swarm_rush.spread ({}) must be finite and non-negative",
                    swarm.spread
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_hp: f32,
    pub move_speed: f32,
    pub radius: f32,
    /// Seconds of contact-damage immunity after being hit
    pub hurt_cooldown: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            move_speed: 150.0,
            radius: 14.0,
            hurt_cooldown: 0.5,
        }
    }
}

/// Wave director tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Hard cap on simultaneously active enemies
    pub max_active: usize,
    /// Distance from the player at which enemies appear
    pub spawn_radius: f32,
    /// Seconds between one wave clearing and the next starting
    pub intermission: f32,
    /// Seconds into a boss wave before the boss appears
    pub boss_delay: f32,
    pub elite: EliteConfig,
    pub filler: Option<FillerConfig>,
    pub swarm_rush: Option<SwarmRushConfig>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            max_active: 300,
            spawn_radius: 650.0,
            intermission: 5.0,
            boss_delay: 10.0,
            elite: EliteConfig::default(),
            filler: Some(FillerConfig::default()),
            swarm_rush: Some(SwarmRushConfig::default()),
        }
    }
}

impl DirectorConfig {
    /// Authored wave groups only, no filler, no swarm rush, no elites
    pub fn waves_only() -> Self {
        Self {
            elite: EliteConfig {
                base_chance: 0.0,
                per_wave: 0.0,
                max_chance: 0.0,
            },
            filler: None,
            swarm_rush: None,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EliteConfig {
    pub base_chance: f32,
    pub per_wave: f32,
    pub max_chance: f32,
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            base_chance: 0.01,
            per_wave: 0.005,
            max_chance: 0.25,
        }
    }
}

impl EliteConfig {
    /// Probability that a regular spawn on `wave` is elite
    pub fn chance(&self, wave: u32) -> f32 {
        (self.base_chance + wave as f32 * self.per_wave).clamp(0.0, self.max_chance)
    }
}

/// Background spawning that keeps the arena from going quiet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// Spawns per second on wave 1
    pub base_rate: f32,
    pub rate_per_wave: f32,
    /// Rotated through in order
    pub kinds: Vec<EnemyKind>,
    /// Active count below which a burst fires
    pub low_threshold: usize,
    pub burst_count: u32,
    pub burst_cooldown: f32,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.5,
            rate_per_wave: 0.15,
            kinds: vec![EnemyKind::Shambler, EnemyKind::Swarmer, EnemyKind::Runner],
            low_threshold: 6,
            burst_count: 8,
            burst_cooldown: 3.0,
        }
    }
}

impl FillerConfig {
    pub fn rate(&self, wave: u32) -> f32 {
        self.base_rate + self.rate_per_wave * wave.saturating_sub(1) as f32
    }
}

/// Periodic burst of fast enemies from a single direction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmRushConfig {
    pub min_interval: f32,
    pub max_interval: f32,
    pub min_duration: f32,
    pub max_duration: f32,
    /// Spawns per second while a rush is active
    pub rate: f32,
    /// Half-width of the spawn funnel in radians
    pub spread: f32,
    pub kinds: Vec<EnemyKind>,
}

impl Default for SwarmRushConfig {
    fn default() -> Self {
        Self {
            min_interval: 60.0,
            max_interval: 90.0,
            min_duration: 8.0,
            max_duration: 12.0,
            rate: 6.0,
            spread: 0.35,
            kinds: vec![EnemyKind::Swarmer, EnemyKind::Runner],
        }
    }
}
