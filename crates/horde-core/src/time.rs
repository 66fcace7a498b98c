//! Simulation clock
//!
//! Turns raw frame deltas into a whole number of fixed simulation steps.
//! A paused clock accumulates nothing, so every timer driven by it freezes
//! and resumes exactly where it left off.

use serde::{Deserialize, Serialize};

/// Configuration for the simulation clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// How many simulated seconds pass per real second
    pub time_scale: f32,
    /// Fixed simulation step (in seconds)
    pub fixed_timestep: f32,
    /// Maximum raw delta accepted per frame, to prevent a spiral of death
    pub max_delta_time: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            fixed_timestep: 1.0 / 60.0,
            max_delta_time: 0.25,
        }
    }
}

/// Simulation time tracking
#[derive(Debug, Clone)]
pub struct SimClock {
    pub config: ClockConfig,
    /// Simulated seconds since the session started (excludes paused time)
    pub total_time: f64,
    /// Scaled delta of the last frame, zero while paused
    pub delta_time: f32,
    /// Number of fixed steps handed out so far
    pub tick_count: u64,
    paused: bool,
    accumulator: f32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl SimClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            total_time: 0.0,
            delta_time: 0.0,
            tick_count: 0,
            paused: false,
            accumulator: 0.0,
        }
    }

    /// Feed the raw delta of the previous frame into the clock
    pub fn update(&mut self, raw_delta: f32) {
        if self.paused || !raw_delta.is_finite() || raw_delta <= 0.0 {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = raw_delta.min(self.config.max_delta_time) * self.config.time_scale;
        self.total_time += self.delta_time as f64;
        self.accumulator += self.delta_time;
    }

    /// Drain the accumulator into fixed steps. Always zero while paused.
    pub fn fixed_steps(&mut self) -> u32 {
        if self.paused {
            return 0;
        }
        let step = self.step();
        let mut steps = 0;
        while self.accumulator >= step {
            self.accumulator -= step;
            steps += 1;
        }
        self.tick_count += steps as u64;
        steps
    }

    /// Length of one fixed step in seconds
    pub fn step(&self) -> f32 {
        self.config.fixed_timestep.max(1e-4)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}
