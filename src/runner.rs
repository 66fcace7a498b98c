//! Headless session execution
//!
//! Drives a [`Simulation`] frame by frame with a scripted player standing in
//! for the input and pickup collaborators, and collects a run report.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use glam::Vec2;
use horde_sim::{
    AbilityId, Enchant, EnchantKind, Enhancement, Job, ModifierBoost, ParamTable, Pickup,
    SessionPhase, SimConfig, SimEvent, Simulation, WaveTable,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::settings::RunnerSettings;

/// Raw frame delta fed to the simulation clock
const FRAME_DELTA: f32 = 1.0 / 60.0;
/// Enemies closer than this push the autopilot away
const DANGER_RADIUS: f32 = 220.0;
/// Distance from the arena origin the autopilot tries to circle at
const KITE_RADIUS: f32 = 300.0;

const BOOSTS: [ModifierBoost; 8] = [
    ModifierBoost::Damage(0.1),
    ModifierBoost::CritChance(0.05),
    ModifierBoost::LifeSteal(0.02),
    ModifierBoost::Cooldown(0.08),
    ModifierBoost::Speed(0.05),
    ModifierBoost::Armor(1.0),
    ModifierBoost::Regen(0.5),
    ModifierBoost::MaxHp(15.0),
];

/// Build a session from settings, loading any table overrides from disk
pub fn build_simulation(settings: &RunnerSettings, seed: u64) -> Result<Simulation> {
    let session = &settings.session;
    let config = match &session.config_path {
        Some(path) => {
            SimConfig::from_toml_str(&read(path)?).context("Invalid simulation config")?
        }
        None => settings.simulation.clone(),
    };
    let waves = match &session.waves_path {
        Some(path) => WaveTable::from_toml_str(&read(path)?).context("Invalid wave table")?,
        None => WaveTable::builtin(),
    };
    let params = match &session.abilities_path {
        Some(path) => ParamTable::from_toml_str(&read(path)?).context("Invalid ability table")?,
        None => ParamTable::builtin(),
    };

    let mut sim =
        Simulation::new(config, waves, params, seed).context("Failed to build simulation")?;
    sim.select_job(session.job)?;
    Ok(sim)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Steers the player: away from nearby enemies, otherwise around a ring
struct Autopilot {
    orbit: f32,
}

impl Autopilot {
    fn steer(&mut self, sim: &Simulation) -> Vec2 {
        let position = sim.player().position;
        let mut push = Vec2::ZERO;
        for (_, enemy) in sim.enemies().iter() {
            let away = position - enemy.position;
            let distance_sq = away.length_squared().max(1.0);
            if distance_sq < DANGER_RADIUS * DANGER_RADIUS {
                push += away / distance_sq;
            }
        }

        self.orbit += FRAME_DELTA * 0.4;
        let waypoint = Vec2::new(self.orbit.cos(), self.orbit.sin()) * KITE_RADIUS;
        let drift = (waypoint - position).normalize_or_zero();

        if push == Vec2::ZERO {
            drift
        } else {
            // sidestep along the threat instead of backing straight off
            let flee = push.normalize_or_zero();
            flee + flee.perp() * 0.5 + drift * 0.25
        }
    }
}

/// One wave as seen by the runner
#[derive(Debug, Clone, Serialize)]
pub struct WaveRecord {
    pub wave: u32,
    pub boss_wave: bool,
    pub started_at: f32,
    pub cleared_at: Option<f32>,
}

/// Everything worth knowing about a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub job: Job,
    pub outcome: SessionPhase,
    pub duration_secs: f32,
    pub wave_reached: u32,
    pub player_level: u32,
    pub final_hp: f32,
    pub kills: u64,
    pub elites_killed: u64,
    pub bosses_killed: u64,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub crits: u64,
    pub abilities: BTreeMap<AbilityId, u32>,
    pub enhancements: Vec<Enhancement>,
    pub waves: Vec<WaveRecord>,
    pub event_counts: BTreeMap<String, u64>,
}

impl RunReport {
    fn new(seed: u64, job: Job) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            job,
            outcome: SessionPhase::Setup,
            duration_secs: 0.0,
            wave_reached: 0,
            player_level: 1,
            final_hp: 0.0,
            kills: 0,
            elites_killed: 0,
            bosses_killed: 0,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            crits: 0,
            abilities: BTreeMap::new(),
            enhancements: Vec::new(),
            waves: Vec::new(),
            event_counts: BTreeMap::new(),
        }
    }

    /// Fold one event into the tallies. Returns XP to hand back as a pickup.
    fn record(&mut self, event: &SimEvent, now: f32) -> u32 {
        *self.event_counts.entry(event.name().to_string()).or_default() += 1;
        match event {
            SimEvent::EnemyKilled(kill) => {
                self.kills += 1;
                self.elites_killed += u64::from(kill.was_elite);
                self.bosses_killed += u64::from(kill.was_boss);
                return kill.xp_value;
            }
            SimEvent::EnemyHit { damage, .. } | SimEvent::StatusDamageTick { damage, .. } => {
                self.damage_dealt += damage;
            }
            SimEvent::PlayerDamaged { amount } => self.damage_taken += amount,
            SimEvent::CritLanded { .. } => self.crits += 1,
            SimEvent::WaveStarted { wave, boss_wave } => self.waves.push(WaveRecord {
                wave: *wave,
                boss_wave: *boss_wave,
                started_at: now,
                cleared_at: None,
            }),
            SimEvent::WaveCleared { wave } => {
                if let Some(record) = self.waves.iter_mut().find(|w| w.wave == *wave) {
                    record.cleared_at = Some(now);
                }
            }
            _ => {}
        }
        0
    }

    pub fn print_summary(&self) {
        println!("=== Horde run (seed {}) ===", self.seed);
        println!("Job:        {}", self.job.name());
        println!("Outcome:    {:?} after {:.1}s", self.outcome, self.duration_secs);
        println!("Wave:       {}", self.wave_reached);
        println!("Level:      {} ({:.0} HP left)", self.player_level, self.final_hp);
        println!(
            "Kills:      {} ({} elite, {} boss)",
            self.kills, self.elites_killed, self.bosses_killed
        );
        println!(
            "Damage:     {:.0} dealt, {:.0} taken, {} crits",
            self.damage_dealt, self.damage_taken, self.crits
        );
        for (id, level) in &self.abilities {
            println!("  {:<16} lv {}", id.name(), level);
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote run report to {:?}", path);
        Ok(())
    }
}

/// Pick a reward for one level-up: usually an ability, sometimes an
/// enchant on something owned, otherwise a stat boost.
fn choose_enhancement(sim: &Simulation, rng: &mut StdRng) -> Enhancement {
    let engine = sim.abilities();
    let roll: f32 = rng.gen();

    if roll < 0.5 {
        let levelable: Vec<AbilityId> = AbilityId::ALL
            .iter()
            .copied()
            .filter(|&id| {
                let max = engine.table().max_level(id).unwrap_or(0);
                engine.ability(id).map_or(max > 0, |a| a.level < max)
            })
            .collect();
        if let Some(&id) = levelable.choose(rng) {
            return Enhancement::Ability(id);
        }
    } else if roll < 0.65 {
        let owned: Vec<AbilityId> = engine.abilities().iter().map(|a| a.id).collect();
        if let (Some(&ability), Some(&kind)) = (owned.choose(rng), EnchantKind::ALL.choose(rng)) {
            return Enhancement::Enchant {
                ability,
                enchant: Enchant::new(kind, 1),
            };
        }
    }

    let boost = BOOSTS.choose(rng).copied().unwrap_or(ModifierBoost::MaxHp(15.0));
    Enhancement::Modifier(boost)
}

/// Run the session until it ends or `duration_secs` of simulated time pass
pub fn run(mut sim: Simulation, seed: u64, duration_secs: f32) -> RunReport {
    let job = sim.job().unwrap_or(Job::Warden);
    let mut report = RunReport::new(seed, job);
    let mut rng = StdRng::seed_from_u64(seed.rotate_left(17));
    let mut autopilot = Autopilot { orbit: 0.0 };

    sim.start();
    info!("Running {} for up to {:.0}s", job.name(), duration_secs);

    while !sim.phase().is_over() && sim.elapsed() < duration_secs {
        let steer = autopilot.steer(&sim);
        sim.set_move_input(steer);
        sim.update(FRAME_DELTA);

        let now = sim.elapsed();
        let mut xp = 0;
        let events: Vec<SimEvent> = sim.drain_events().collect();
        for event in &events {
            xp += report.record(event, now);
        }

        if xp > 0 {
            let levels = sim.collect_pickup(Pickup::Experience(xp));
            for _ in levels {
                let enhancement = choose_enhancement(&sim, &mut rng);
                match sim.apply_enhancement(enhancement) {
                    Ok(()) => {
                        debug!("Picked {:?}", enhancement);
                        report.enhancements.push(enhancement);
                    }
                    Err(e) => warn!("Enhancement {:?} rejected: {}", enhancement, e),
                }
            }
            for event in sim.drain_events() {
                report.record(&event, now);
            }
        }
    }

    report.outcome = sim.phase();
    report.duration_secs = sim.elapsed();
    report.wave_reached = sim.current_wave();
    report.player_level = sim.player().level;
    report.final_hp = sim.player().hp;
    report.abilities = sim.player().abilities.clone();
    report
}
