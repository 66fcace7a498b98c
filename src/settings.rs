//! Runner settings with persistence
//!
//! Settings live in `~/.config/horde/settings.toml` unless a path is given on
//! the command line. The `[simulation]` table is a full [`SimConfig`], so a
//! settings file can retune the director or player without a separate
//! config file:
//!
//! ```toml
//! [session]
//! seed = 12
//! job = "Stalker"
//!
//! [simulation.director]
//! max_active = 200
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use horde_sim::{Job, SimConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const SETTINGS_FILE: &str = "settings.toml";

/// All runner settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    pub session: SessionSettings,
    /// Used unless `session.config_path` points at another file
    pub simulation: SimConfig,
    pub report: ReportSettings,
}

impl RunnerSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("horde").join(SETTINGS_FILE))
    }

    /// Load from the default location. A missing or unusable file falls back
    /// to defaults so a bad settings file never blocks a run.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("{:#}, using defaults", e);
            Self::default()
        })
    }

    /// Load from an explicit path. Unlike [`load`](Self::load), every problem
    /// is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {:?}", path))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Invalid settings {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.simulation.validate()?;
        Ok(settings)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::default_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.simulation
            .validate()
            .context("Refusing to save an invalid simulation config")?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// What to simulate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Fixed seed, or a fresh one per run when unset
    pub seed: Option<u64>,
    /// Simulated seconds before the run is stopped
    pub duration_secs: f32,
    pub job: Job,
    /// Simulation config file that replaces the `[simulation]` table
    pub config_path: Option<PathBuf>,
    /// Optional TOML overrides for the built-in tables
    pub waves_path: Option<PathBuf>,
    pub abilities_path: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: None,
            duration_secs: 900.0,
            job: Job::Warden,
            config_path: None,
            waves_path: None,
            abilities_path: None,
        }
    }
}

/// Run report output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// JSON report destination; no report when unset
    pub output_path: Option<PathBuf>,
    pub print_summary: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_path: None,
            print_summary: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = RunnerSettings::parse(
            r#"
            [session]
            seed = 12
            job = "Stalker"
            "#,
        )
        .unwrap();
        assert_eq!(settings.session.seed, Some(12));
        assert_eq!(settings.session.job, Job::Stalker);
        assert_eq!(settings.session.duration_secs, 900.0);
        assert_eq!(settings.simulation.max_enemies, SimConfig::default().max_enemies);
        assert!(settings.report.print_summary);
    }

    #[test]
    fn test_simulation_table_overrides_config() {
        let settings = RunnerSettings::parse(
            r#"
            [simulation.director]
            max_active = 120

            [simulation.player]
            max_hp = 250.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.simulation.director.max_active, 120);
        assert_eq!(settings.simulation.player.max_hp, 250.0);
        assert_eq!(settings.simulation.player.hurt_cooldown, 0.5);
    }

    #[test]
    fn test_invalid_simulation_table_rejected() {
        let result = RunnerSettings::parse(
            r#"
            [simulation.director.elite]
            max_chance = -0.1
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_then_load_from_path() {
        let dir = std::env::temp_dir().join(format!("horde-settings-{}", std::process::id()));
        let path = dir.join(SETTINGS_FILE);

        let mut settings = RunnerSettings::default();
        settings.session.seed = Some(3);
        settings.simulation.director.max_active = 90;
        settings.report.output_path = Some(PathBuf::from("run.json"));
        settings.save_to(&path).unwrap();

        let back = RunnerSettings::load_from(&path).unwrap();
        assert_eq!(back.session.seed, Some(3));
        assert_eq!(back.simulation.director.max_active, 90);
        assert_eq!(back.report.output_path, Some(PathBuf::from("run.json")));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let path = std::env::temp_dir().join("horde-settings-does-not-exist.toml");
        assert!(RunnerSettings::load_from(&path).is_err());
    }
}
