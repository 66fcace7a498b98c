//! Horde - headless runner for the wave-survival simulation
//!
//! Runs one seeded session with a scripted player and reports the outcome.

mod cli;
mod runner;
mod settings;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::RunnerSettings;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let args = cli::parse_args();
    let mut settings = match &args.settings {
        Some(path) => RunnerSettings::load_from(path)?,
        None => RunnerSettings::load(),
    };
    args.apply_to(&mut settings);
    if args.save_settings {
        match &args.settings {
            Some(path) => settings.save_to(path),
            None => settings.save(),
        }
        .context("Failed to save settings")?;
    }

    let seed = settings.session.seed.unwrap_or_else(rand::random);
    info!("Starting Horde session with seed {}", seed);

    let sim = runner::build_simulation(&settings, seed)?;
    let report = runner::run(sim, seed, settings.session.duration_secs);

    if settings.report.print_summary {
        report.print_summary();
    }
    if let Some(path) = &settings.report.output_path {
        report.write(path)?;
    }

    info!("Shutdown complete");
    Ok(())
}
