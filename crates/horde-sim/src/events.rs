//! Outbound notifications
//!
//! The simulation is the only producer. Collaborators (rendering, audio, UI,
//! stats) drain the queue once per frame and never block the tick loop.

use glam::Vec2;

use crate::enemy::{EnemyId, EnemyKind};
use crate::player::Pickup;

/// Everything collaborators need to react to a kill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillReport {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub position: Vec2,
    pub xp_value: u32,
    pub was_elite: bool,
    pub was_boss: bool,
}

/// Source of a status damage tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusDamageKind {
    Burn,
    Poison,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    EnemySpawned {
        id: EnemyId,
        kind: EnemyKind,
        position: Vec2,
        elite: bool,
    },
    EnemyHit {
        id: EnemyId,
        damage: f32,
        crit: bool,
        position: Vec2,
    },
    EnemyKilled(KillReport),
    PlayerHealthChanged {
        hp: f32,
        max_hp: f32,
    },
    PlayerDamaged {
        amount: f32,
    },
    PlayerDied,
    LevelUp {
        level: u32,
    },
    WaveStarted {
        wave: u32,
        boss_wave: bool,
    },
    WaveCleared {
        wave: u32,
    },
    BossSpawned {
        id: EnemyId,
        kind: EnemyKind,
        hp: f32,
    },
    CritLanded {
        target: EnemyId,
        damage: f32,
        position: Vec2,
    },
    StatusDamageTick {
        id: EnemyId,
        damage: f32,
        kind: StatusDamageKind,
    },
    ItemCollected {
        pickup: Pickup,
    },
    SwarmRushStarted {
        angle: f32,
        duration: f32,
    },
    CameraShake {
        intensity: f32,
        duration: f32,
    },
    GameWon,
}

impl SimEvent {
    /// Short name for logs and run reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnemySpawned { .. } => "enemy_spawned",
            Self::EnemyHit { .. } => "enemy_hit",
            Self::EnemyKilled(_) => "enemy_killed",
            Self::PlayerHealthChanged { .. } => "player_health_changed",
            Self::PlayerDamaged { .. } => "player_damaged",
            Self::PlayerDied => "player_died",
            Self::LevelUp { .. } => "level_up",
            Self::WaveStarted { .. } => "wave_started",
            Self::WaveCleared { .. } => "wave_cleared",
            Self::BossSpawned { .. } => "boss_spawned",
            Self::CritLanded { .. } => "crit_landed",
            Self::StatusDamageTick { .. } => "status_damage_tick",
            Self::ItemCollected { .. } => "item_collected",
            Self::SwarmRushStarted { .. } => "swarm_rush_started",
            Self::CameraShake { .. } => "camera_shake",
            Self::GameWon => "game_won",
        }
    }
}

/// Per-tick notification buffer owned by the simulation
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Hand every pending event to the caller, leaving the queue empty
    pub fn drain(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = EventQueue::new();
        queue.push(SimEvent::WaveStarted {
            wave: 1,
            boss_wave: false,
        });
        queue.push(SimEvent::GameWon);
        assert_eq!(queue.len(), 2);

        let names: Vec<&str> = queue.drain().map(|e| e.name()).collect();
        assert_eq!(names, vec!["wave_started", "game_won"]);
        assert!(queue.is_empty());
    }
}
