//! Orbiting instances around the player
//!
//! The ring always holds one orb per ability level. A level change tears the
//! ring down and rebuilds it so the orbs stay evenly spaced.

use std::f32::consts::TAU;

use glam::Vec2;
use horde_core::math::point_on_circle;

use super::{AbilityWorld, HitTemplate, LevelParams};
use crate::combat::PendingHit;
use crate::targeting::enemies_in_radius;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orb {
    /// Seconds until this orb may hit again
    pub hit_timer: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbitalRing {
    /// Rotation of the first orb in radians
    pub angle: f32,
    pub orbs: Vec<Orb>,
}

impl OrbitalRing {
    pub fn new(count: u32) -> Self {
        let mut ring = Self::default();
        ring.rebuild(count);
        ring
    }

    pub fn rebuild(&mut self, count: u32) {
        self.angle = 0.0;
        self.orbs = vec![Orb::default(); count as usize];
    }

    pub fn len(&self) -> usize {
        self.orbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }

    /// World position of orb `index` around `center`
    pub fn orb_position(&self, index: usize, center: Vec2, radius: f32) -> Vec2 {
        let spacing = TAU / self.orbs.len().max(1) as f32;
        point_on_circle(center, radius, self.angle + spacing * index as f32)
    }
}

pub(super) fn update(
    ring: &mut OrbitalRing,
    template: &HitTemplate,
    params: &LevelParams,
    world: &mut AbilityWorld<'_>,
) {
    ring.angle = (ring.angle + params.angular_speed * world.dt) % TAU;

    for index in 0..ring.orbs.len() {
        let position = ring.orb_position(index, world.player.position, params.orbit_radius);
        let orb = &mut ring.orbs[index];
        orb.hit_timer -= world.dt;
        if orb.hit_timer > 0.0 {
            continue;
        }

        let targets = enemies_in_radius(world.enemies, position, params.radius);
        if targets.is_empty() {
            orb.hit_timer = 0.0;
            continue;
        }
        for target in targets {
            world.hits.push(PendingHit {
                target,
                source: template.at(params.damage, position),
            });
        }
        orb.hit_timer = params.hit_interval;
    }
}
