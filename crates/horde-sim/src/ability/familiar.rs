//! A single companion that circles the player and bites nearby enemies

use glam::Vec2;
use horde_core::math::{direction_to, point_on_circle};

use super::{AbilityWorld, HitTemplate, LevelParams};
use crate::combat::PendingHit;
use crate::targeting::{enemies_in_radius, nearest_enemy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamiliarState {
    pub position: Vec2,
    pub orbit_angle: f32,
    /// Seconds until the next attack is allowed
    pub attack_timer: f32,
}

impl FamiliarState {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            orbit_angle: 0.0,
            attack_timer: 0.0,
        }
    }
}

pub(super) fn update(
    familiar: &mut FamiliarState,
    template: &HitTemplate,
    params: &LevelParams,
    cooldown: f32,
    world: &mut AbilityWorld<'_>,
) {
    familiar.orbit_angle += params.angular_speed * world.dt;
    let home = point_on_circle(world.player.position, params.orbit_radius, familiar.orbit_angle);
    if let Some(dir) = direction_to(familiar.position, home) {
        let step = params.speed * world.dt;
        let distance = familiar.position.distance(home);
        familiar.position += dir * step.min(distance);
    }

    familiar.attack_timer = (familiar.attack_timer - world.dt).max(0.0);
    if familiar.attack_timer > 0.0 {
        return;
    }

    let nearest = nearest_enemy(world.enemies, familiar.position, params.range, &[]);
    let Some((_, target_pos)) = nearest else {
        return;
    };

    // lunge onto the target and bite everything under it
    familiar.position = target_pos;
    for target in enemies_in_radius(world.enemies, target_pos, params.radius) {
        world.hits.push(PendingHit {
            target,
            source: template.at(params.damage, target_pos),
        });
    }
    familiar.attack_timer = cooldown;
}
