//! Stationary damage zones
//!
//! A zone ticks on its own interval, independent of whatever spawned it, and
//! disappears when its lifetime runs out. Any number may coexist.

use glam::Vec2;

use super::{AbilityId, LevelParams};
use crate::combat::{HitSource, PendingHit, StatusPayload};
use crate::enemy::EnemyInstance;
use crate::targeting::enemies_in_radius;
use horde_core::Pool;

/// Seconds between toxic cloud ticks
pub const TOXIC_TICK_INTERVAL: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub position: Vec2,
    pub radius: f32,
    /// Damage per tick to everything inside
    pub damage: f32,
    pub tick_interval: f32,
    pub lifetime: f32,
    pub status: StatusPayload,
    pub ability: Option<AbilityId>,
    tick_timer: f32,
}

impl Zone {
    pub fn new(
        position: Vec2,
        radius: f32,
        damage: f32,
        tick_interval: f32,
        lifetime: f32,
    ) -> Self {
        Self {
            position,
            radius,
            damage,
            tick_interval: tick_interval.max(0.05),
            lifetime,
            status: StatusPayload::default(),
            ability: None,
            tick_timer: 0.0,
        }
    }

    /// Zone described by an ability level's `zone_*` params
    pub fn from_params(ability: AbilityId, position: Vec2, params: &LevelParams) -> Self {
        Self {
            status: params.status(),
            ability: Some(ability),
            ..Self::new(
                position,
                params.zone_radius,
                params.zone_damage,
                params.tick_interval,
                params.zone_duration,
            )
        }
    }

    /// Cloud left behind by the Toxic enchant
    pub fn toxic_cloud(position: Vec2, radius: f32, damage: f32, lifetime: f32) -> Self {
        Self::new(position, radius, damage, TOXIC_TICK_INTERVAL, lifetime)
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    /// Advance timers. Returns true when the zone should deal damage now.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.lifetime -= dt;
        self.tick_timer -= dt;
        if self.tick_timer <= 0.0 {
            self.tick_timer += self.tick_interval;
            true
        } else {
            false
        }
    }

    /// Queue a hit on every enemy inside
    pub fn strike(&self, enemies: &Pool<EnemyInstance>, hits: &mut Vec<PendingHit>) {
        let mut source = HitSource::passive(self.damage, self.position).with_status(self.status);
        source.ability = self.ability;
        for target in enemies_in_radius(enemies, self.position, self.radius) {
            hits.push(PendingHit { target, source });
        }
    }
}
