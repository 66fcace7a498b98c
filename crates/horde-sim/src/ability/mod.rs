//! Player abilities
//!
//! Every ability is one of a handful of reusable shapes sharing a
//! level-indexed parameter table. The engine dispatches once per shape per
//! tick; reactive abilities skip the tick dispatch and fire from events.

pub mod engine;
pub mod familiar;
pub mod orbital;
pub mod params;
pub mod reposition;
pub mod zone;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::{Enchant, HitSource, StatusPayload};

pub use engine::{AbilityEngine, AbilityWorld};
pub use familiar::FamiliarState;
pub use orbital::OrbitalRing;
pub use params::{LevelParams, ParamTable};
pub use reposition::{RepositionLock, RepositionPhase, RepositionState};
pub use zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    Shockwave,
    Smite,
    Meteor,
    DashStrike,
    Skyfall,
    ArcaneBolt,
    ScatterShot,
    Miasma,
    OrbitingBlades,
    SpiritWolf,
    Renewal,
    Retribution,
    Overcharge,
}

impl AbilityId {
    pub const ALL: [AbilityId; 13] = [
        Self::Shockwave,
        Self::Smite,
        Self::Meteor,
        Self::DashStrike,
        Self::Skyfall,
        Self::ArcaneBolt,
        Self::ScatterShot,
        Self::Miasma,
        Self::OrbitingBlades,
        Self::SpiritWolf,
        Self::Renewal,
        Self::Retribution,
        Self::Overcharge,
    ];

    pub fn shape(self) -> Shape {
        match self {
            Self::Shockwave => Shape::InstantPulse(Anchor::Player),
            Self::Smite => Shape::InstantPulse(Anchor::NearestEnemy),
            Self::Meteor => Shape::InstantPulse(Anchor::RandomNearby),
            Self::DashStrike | Self::Skyfall => Shape::ChargeAndReposition,
            Self::ArcaneBolt | Self::ScatterShot => Shape::Projectile,
            Self::Miasma => Shape::PersistentZone,
            Self::OrbitingBlades => Shape::Orbital,
            Self::SpiritWolf => Shape::Familiar,
            Self::Renewal => Shape::PeriodicSelfHeal,
            Self::Retribution => Shape::Reactive(ReactiveTrigger::PlayerDamaged),
            Self::Overcharge => Shape::Reactive(ReactiveTrigger::CriticalHit),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Shockwave => "Shockwave",
            Self::Smite => "Smite",
            Self::Meteor => "Meteor",
            Self::DashStrike => "Dash Strike",
            Self::Skyfall => "Skyfall",
            Self::ArcaneBolt => "Arcane Bolt",
            Self::ScatterShot => "Scatter Shot",
            Self::Miasma => "Miasma",
            Self::OrbitingBlades => "Orbiting Blades",
            Self::SpiritWolf => "Spirit Wolf",
            Self::Renewal => "Renewal",
            Self::Retribution => "Retribution",
            Self::Overcharge => "Overcharge",
        }
    }
}

/// Where an instant pulse is centered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Player,
    NearestEnemy,
    /// A random point within range of the player
    RandomNearby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactiveTrigger {
    PlayerDamaged,
    CriticalHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    InstantPulse(Anchor),
    ChargeAndReposition,
    Projectile,
    PersistentZone,
    Orbital,
    Familiar,
    PeriodicSelfHeal,
    Reactive(ReactiveTrigger),
}

/// Per-shape runtime state
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeState {
    /// Pulse, projectile and zone-placing abilities
    Cooldown { remaining: f32 },
    Reposition(RepositionState),
    Orbital(OrbitalRing),
    Familiar(FamiliarState),
    SelfHeal { timer: f32 },
    Reactive { internal_cooldown: f32 },
}

impl ShapeState {
    fn for_shape(shape: Shape, level: u32, player_position: Vec2) -> Self {
        match shape {
            Shape::InstantPulse(_) | Shape::Projectile | Shape::PersistentZone => {
                Self::Cooldown { remaining: 0.0 }
            }
            Shape::ChargeAndReposition => Self::Reposition(RepositionState::default()),
            Shape::Orbital => Self::Orbital(OrbitalRing::new(level)),
            Shape::Familiar => Self::Familiar(FamiliarState::new(player_position)),
            Shape::PeriodicSelfHeal => Self::SelfHeal { timer: 0.0 },
            Shape::Reactive(_) => Self::Reactive {
                internal_cooldown: 0.0,
            },
        }
    }
}

/// An owned ability at a level
#[derive(Debug, Clone, PartialEq)]
pub struct Ability {
    pub id: AbilityId,
    pub level: u32,
    pub enchant: Option<Enchant>,
    pub state: ShapeState,
}

impl Ability {
    pub fn new(id: AbilityId, player_position: Vec2) -> Self {
        Self {
            id,
            level: 1,
            enchant: None,
            state: ShapeState::for_shape(id.shape(), 1, player_position),
        }
    }

    pub fn shape(&self) -> Shape {
        self.id.shape()
    }

    pub fn template(&self, params: &LevelParams) -> HitTemplate {
        HitTemplate {
            ability: self.id,
            enchant: self.enchant,
            status: params.status(),
        }
    }
}

/// What every hit from one ability at one level shares
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTemplate {
    pub ability: AbilityId,
    pub enchant: Option<Enchant>,
    pub status: StatusPayload,
}

impl HitTemplate {
    pub fn at(&self, damage: f32, origin: Vec2) -> HitSource {
        HitSource::new(damage, origin)
            .with_ability(self.ability)
            .with_enchant(self.enchant)
            .with_status(self.status)
    }
}
