//! Horde Core - Foundational types for the Horde simulation
//!
//! This crate provides the leaf types shared by the simulation:
//! - 2D math primitives (re-exported from glam) and safe direction helpers
//! - Generational handles and fixed-capacity object pools
//! - A pausable fixed-step simulation clock

pub mod math;
pub mod pool;
pub mod time;

pub use glam::Vec2;
pub use pool::{Handle, Pool};
pub use time::{ClockConfig, SimClock};
