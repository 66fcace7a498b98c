//! Errors for the fallible, out-of-loop operations
//!
//! The tick loop itself never fails; these cover table loading and inbound
//! requests that arrive at the wrong time.

use crate::ability::AbilityId;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid wave table: {0}")]
    InvalidWaveTable(String),

    #[error("Invalid ability table: {0}")]
    InvalidAbilityTable(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("A job can only be selected before the session starts")]
    SessionStarted,

    #[error("{0:?} is already at max level")]
    AbilityMaxed(AbilityId),

    #[error("{0:?} must be owned before it can be enchanted")]
    AbilityNotOwned(AbilityId),
}

pub type SimResult<T> = Result<T, SimError>;
