//! Horde Sim - Simulation core for a wave-survival action game
//!
//! Decides what spawns, how every enemy moves and attacks, how player
//! abilities resolve over time, and how damage and status effects
//! propagate. Rendering, audio, input and pickups are collaborators that
//! talk to [`Simulation`] through inbound requests and drained events.
//!
//! Each fixed tick runs in a strict order: spawning, status decay, enemy
//! behavior, abilities, then collision-triggered combat resolution.

pub mod ability;
pub mod combat;
pub mod config;
pub mod difficulty;
pub mod enemy;
pub mod error;
pub mod events;
pub mod player;
pub mod projectile;
pub mod sim;
pub mod status;
pub mod targeting;
pub mod wave;

/// Seeded RNG owned by the simulation; every random decision draws from it
pub type SimRng = rand::rngs::StdRng;

pub use ability::{AbilityEngine, AbilityId, ParamTable, Shape};
pub use combat::{CombatResolver, Enchant, EnchantKind, HitSource};
pub use config::{DirectorConfig, SimConfig};
pub use enemy::{Archetype, EnemyId, EnemyInstance, EnemyKind};
pub use error::{SimError, SimResult};
pub use events::{EventQueue, KillReport, SimEvent};
pub use player::{Job, ModifierBoost, Modifiers, Pickup, PlayerState};
pub use sim::{Enhancement, SessionPhase, Simulation};
pub use status::StatusEffectSet;
pub use wave::{WaveDefinition, WaveDirector, WaveTable};
