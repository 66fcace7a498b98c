//! Authored waves and the director that plays them
//!
//! The wave table is static and read-only once loaded. TOML layout:
//!
//! ```toml
//! [[wave]]
//! wave = 1
//! duration_ms = 60000
//!
//! [[wave.groups]]
//! kind = "Shambler"
//! count = 70
//! spawn_rate = 4.0
//!
//! [[wave]]
//! wave = 2
//! duration_ms = 90000
//! boss = { kind = "Warlord", hp = 3000.0 }
//! ```

pub mod director;

use serde::{Deserialize, Serialize};

use crate::enemy::EnemyKind;
use crate::error::{SimError, SimResult};

pub use director::{DirectorPhase, GroupProgress, SpawnWorld, WaveDirector};

/// One spawn group inside a wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub kind: EnemyKind,
    pub count: u32,
    /// Spawns per second once the delay has passed
    pub spawn_rate: f32,
    /// Milliseconds into the wave before this group starts
    #[serde(default)]
    pub delay_ms: u32,
}

impl SpawnGroup {
    pub const fn new(kind: EnemyKind, count: u32, spawn_rate: f32, delay_ms: u32) -> Self {
        Self {
            kind,
            count,
            spawn_rate,
            delay_ms,
        }
    }
}

/// A boss spawned with fixed HP instead of the scaled value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossSpec {
    pub kind: EnemyKind,
    pub hp: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    pub wave: u32,
    pub duration_ms: u32,
    #[serde(default)]
    pub groups: Vec<SpawnGroup>,
    #[serde(default)]
    pub boss: Option<BossSpec>,
}

impl WaveDefinition {
    pub fn is_boss_wave(&self) -> bool {
        self.boss.is_some()
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_ms as f32 / 1000.0
    }

    /// Spawns the authored groups add up to, boss excluded
    pub fn group_total(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

#[derive(Debug, Deserialize)]
struct WaveFile {
    #[serde(default)]
    wave: Vec<WaveDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveTable {
    waves: Vec<WaveDefinition>,
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WaveTable {
    pub fn new(waves: Vec<WaveDefinition>) -> SimResult<Self> {
        let table = Self { waves };
        table.validate()?;
        Ok(table)
    }

    pub fn from_toml_str(content: &str) -> SimResult<Self> {
        let file: WaveFile = toml::from_str(content).map_err(|source| SimError::Parse {
            what: "wave table",
            source,
        })?;
        Self::new(file.wave)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.waves.is_empty() {
            return Err(SimError::InvalidWaveTable("no waves".into()));
        }
        for (i, wave) in self.waves.iter().enumerate() {
            let expected = i as u32 + 1;
            if wave.wave != expected {
                return Err(SimError::InvalidWaveTable(format!(
                    "wave {} found where wave {} was expected",
                    wave.wave, expected
                )));
            }
            let bad_rate = wave
                .groups
                .iter()
                .find(|g| !g.spawn_rate.is_finite() || g.spawn_rate < 0.0);
            if let Some(group) = bad_rate {
                return Err(SimError::InvalidWaveTable(format!(
                    "wave {} has an invalid spawn rate for {}",
                    wave.wave,
                    group.kind.name()
                )));
            }
            if let Some(boss) = &wave.boss {
                if !boss.kind.is_boss() {
                    return Err(SimError::InvalidWaveTable(format!(
                        "wave {} boss {} is not a boss type",
                        wave.wave,
                        boss.kind.name()
                    )));
                }
                if boss.hp <= 0.0 {
                    return Err(SimError::InvalidWaveTable(format!(
                        "wave {} boss HP must be positive",
                        wave.wave
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn waves(&self) -> &[WaveDefinition] {
        &self.waves
    }

    /// Definition for 1-based `wave`
    pub fn get(&self, wave: u32) -> Option<&WaveDefinition> {
        self.waves.get(wave.checked_sub(1)? as usize)
    }

    pub fn builtin() -> Self {
        use EnemyKind::*;

        let wave =
            |wave, duration_ms, groups: &[SpawnGroup], boss: Option<BossSpec>| WaveDefinition {
                wave,
                duration_ms,
                groups: groups.to_vec(),
                boss,
            };

        Self {
            waves: vec![
                wave(
                    1,
                    60_000,
                    &[
                        SpawnGroup::new(Shambler, 70, 4.0, 0),
                        SpawnGroup::new(Swarmer, 20, 2.0, 8_000),
                    ],
                    None,
                ),
                wave(
                    2,
                    60_000,
                    &[
                        SpawnGroup::new(Shambler, 60, 3.0, 0),
                        SpawnGroup::new(Runner, 25, 1.5, 5_000),
                        SpawnGroup::new(Swarmer, 30, 2.5, 15_000),
                    ],
                    None,
                ),
                wave(
                    3,
                    75_000,
                    &[
                        SpawnGroup::new(Shambler, 50, 3.0, 0),
                        SpawnGroup::new(Brute, 10, 0.5, 10_000),
                        SpawnGroup::new(Spitter, 12, 0.6, 20_000),
                        SpawnGroup::new(Charger, 8, 0.4, 30_000),
                    ],
                    None,
                ),
                wave(
                    4,
                    75_000,
                    &[
                        SpawnGroup::new(Runner, 40, 2.0, 0),
                        SpawnGroup::new(Splitter, 15, 0.7, 0),
                        SpawnGroup::new(Leaper, 10, 0.5, 15_000),
                        SpawnGroup::new(Wraith, 10, 0.5, 25_000),
                    ],
                    None,
                ),
                wave(
                    5,
                    90_000,
                    &[
                        SpawnGroup::new(Shambler, 40, 2.0, 0),
                        SpawnGroup::new(Brute, 8, 0.4, 20_000),
                    ],
                    Some(BossSpec {
                        kind: Warlord,
                        hp: 3000.0,
                    }),
                ),
                wave(
                    6,
                    75_000,
                    &[
                        SpawnGroup::new(Swarmer, 80, 5.0, 0),
                        SpawnGroup::new(Summoner, 6, 0.3, 10_000),
                        SpawnGroup::new(Spitter, 15, 0.8, 20_000),
                    ],
                    None,
                ),
                wave(
                    7,
                    90_000,
                    &[
                        SpawnGroup::new(Brute, 20, 0.8, 0),
                        SpawnGroup::new(Charger, 15, 0.6, 0),
                        SpawnGroup::new(Wraith, 20, 0.8, 20_000),
                        SpawnGroup::new(Splitter, 20, 0.8, 30_000),
                    ],
                    None,
                ),
                wave(
                    8,
                    90_000,
                    &[
                        SpawnGroup::new(Leaper, 25, 1.0, 0),
                        SpawnGroup::new(Runner, 60, 3.0, 0),
                        SpawnGroup::new(Summoner, 10, 0.4, 30_000),
                    ],
                    None,
                ),
                wave(
                    9,
                    100_000,
                    &[
                        SpawnGroup::new(Shambler, 100, 5.0, 0),
                        SpawnGroup::new(Brute, 25, 1.0, 0),
                        SpawnGroup::new(Spitter, 25, 1.0, 0),
                        SpawnGroup::new(Wraith, 25, 1.0, 30_000),
                    ],
                    None,
                ),
                wave(
                    10,
                    120_000,
                    &[
                        SpawnGroup::new(Swarmer, 60, 3.0, 0),
                        SpawnGroup::new(Runner, 40, 2.0, 0),
                        SpawnGroup::new(Brute, 15, 0.6, 40_000),
                    ],
                    Some(BossSpec {
                        kind: Lich,
                        hp: 8000.0,
                    }),
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let table = WaveTable::builtin();
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 10);
        for (i, wave) in table.waves().iter().enumerate() {
            assert_eq!(wave.wave, i as u32 + 1);
        }
    }

    #[test]
    fn test_builtin_first_wave() {
        let table = WaveTable::builtin();
        let first = table.get(1).unwrap();
        assert_eq!(first.group_total(), 90);
        assert!(!first.is_boss_wave());
        assert_eq!(first.groups[1].delay_ms, 8_000);
    }

    #[test]
    fn test_builtin_boss_waves() {
        let table = WaveTable::builtin();
        let boss = table.get(5).unwrap().boss.unwrap();
        assert_eq!(boss.kind, EnemyKind::Warlord);
        assert_eq!(boss.hp, 3000.0);
        assert!(table.get(10).unwrap().is_boss_wave());
        assert!(table.get(11).is_none());
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_parse_toml() {
        let table = WaveTable::from_toml_str(
            r#"
            [[wave]]
            wave = 1
            duration_ms = 30000

            [[wave.groups]]
            kind = "Runner"
            count = 10
            spawn_rate = 1.0
            delay_ms = 500

            [[wave]]
            wave = 2
            duration_ms = 45000
            boss = { kind = "Lich", hp = 1200.0 }
            "#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().groups[0].kind, EnemyKind::Runner);
        assert_eq!(table.get(2).unwrap().boss.unwrap().hp, 1200.0);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let result = WaveTable::from_toml_str(
            r#"
            [[wave]]
            wave = 2
            duration_ms = 1000
            "#,
        );
        assert!(matches!(result, Err(SimError::InvalidWaveTable(_))));
    }

    #[test]
    fn test_non_boss_kind_rejected() {
        let result = WaveTable::new(vec![WaveDefinition {
            wave: 1,
            duration_ms: 1000,
            groups: Vec::new(),
            boss: Some(BossSpec {
                kind: EnemyKind::Brute,
                hp: 100.0,
            }),
        }]);
        assert!(result.is_err());
    }
}
