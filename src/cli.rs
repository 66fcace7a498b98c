//! Command-line interface for the Horde session runner
//!
//! Flags override the persisted settings for one run.

use std::path::PathBuf;

use clap::Parser;
use horde_sim::Job;

use crate::settings::RunnerSettings;

/// Headless wave-survival session runner
#[derive(Parser, Debug)]
#[command(name = "horde")]
#[command(about = "Run a seeded wave-survival session with a scripted player")]
#[command(version)]
pub struct Args {
    /// RNG seed; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum simulated session length in seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Starting job: warden, arcanist or stalker
    #[arg(long, value_parser = parse_job)]
    pub job: Option<Job>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long, value_name = "SETTINGS_FILE")]
    pub settings: Option<PathBuf>,

    /// Simulation config TOML, replacing the settings file's `[simulation]`
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Wave table TOML
    #[arg(long, value_name = "WAVES_FILE")]
    pub waves: Option<PathBuf>,

    /// Ability parameter table TOML
    #[arg(long, value_name = "ABILITIES_FILE")]
    pub abilities: Option<PathBuf>,

    /// Write a JSON run report here
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Persist the effective settings for future runs
    #[arg(long)]
    pub save_settings: bool,
}

impl Args {
    /// Overlay explicit flags onto loaded settings
    pub fn apply_to(&self, settings: &mut RunnerSettings) {
        let session = &mut settings.session;
        if self.seed.is_some() {
            session.seed = self.seed;
        }
        if let Some(duration) = self.duration {
            session.duration_secs = duration;
        }
        if let Some(job) = self.job {
            session.job = job;
        }
        if self.config.is_some() {
            session.config_path = self.config.clone();
        }
        if self.waves.is_some() {
            session.waves_path = self.waves.clone();
        }
        if self.abilities.is_some() {
            session.abilities_path = self.abilities.clone();
        }
        if self.output.is_some() {
            settings.report.output_path = self.output.clone();
        }
    }
}

fn parse_job(value: &str) -> Result<Job, String> {
    match value.to_ascii_lowercase().as_str() {
        "warden" => Ok(Job::Warden),
        "arcanist" => Ok(Job::Arcanist),
        "stalker" => Ok(Job::Stalker),
        other => Err(format!("unknown job '{}'", other)),
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}
