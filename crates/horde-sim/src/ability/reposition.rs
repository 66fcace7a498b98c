//! Charge-and-reposition abilities
//!
//! Ready -> Charging -> Committed -> (landing) -> Ready. Phases are polled
//! every tick from explicit state and cannot be cancelled once begun. The
//! landing parameters are snapshotted when charging starts so a phase in
//! flight always completes.
//!
//! All reposition abilities share one [`RepositionLock`]: while any of them
//! is charging or committed, and for [`REPOSITION_GAP`] seconds after it
//! lands, no other may begin charging.

use glam::Vec2;
use horde_core::math::ease_in;
use tracing::debug;

use super::engine::effective_cooldown;
use super::{AbilityId, AbilityWorld, HitTemplate, LevelParams, Zone};
use crate::combat::{Enchant, PendingHit};
use crate::targeting::{enemies_in_radius, nearest_enemy};

/// Minimum seconds between one reposition landing and the next charge
pub const REPOSITION_GAP: f32 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RepositionLock {
    remaining: f32,
    holder: Option<AbilityId>,
}

impl RepositionLock {
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn can_begin(&self, id: AbilityId) -> bool {
        self.remaining <= 0.0 && self.holder.map_or(true, |holder| holder == id)
    }

    pub fn is_locked(&self) -> bool {
        self.remaining > 0.0 || self.holder.is_some()
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn holder(&self) -> Option<AbilityId> {
        self.holder
    }

    fn acquire(&mut self, id: AbilityId) {
        self.holder = Some(id);
    }

    fn release(&mut self) {
        self.holder = None;
        self.remaining = REPOSITION_GAP;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepositionPhase {
    Ready,
    /// Slowed, anchored to the live player position
    Charging { elapsed: f32, anchor: Vec2 },
    /// Invulnerable and travelling from `from` to `to`
    Committed { elapsed: f32, from: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepositionState {
    pub phase: RepositionPhase,
    pub cooldown: f32,
    snapshot: LevelParams,
}

impl Default for RepositionState {
    fn default() -> Self {
        Self {
            phase: RepositionPhase::Ready,
            cooldown: 0.0,
            snapshot: LevelParams::default(),
        }
    }
}

impl RepositionState {
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, RepositionPhase::Ready)
    }
}

pub(super) fn update(
    state: &mut RepositionState,
    id: AbilityId,
    enchant: Option<Enchant>,
    params: Option<&LevelParams>,
    lock: &mut RepositionLock,
    zones: &mut Vec<Zone>,
    world: &mut AbilityWorld<'_>,
) {
    match state.phase {
        RepositionPhase::Ready => {
            state.cooldown = (state.cooldown - world.dt).max(0.0);
            let Some(params) = params else {
                return;
            };
            if state.cooldown > 0.0 || !lock.can_begin(id) {
                return;
            }
            if params.range > 0.0
                && nearest_enemy(world.enemies, world.player.position, params.range, &[]).is_none()
            {
                return;
            }

            debug!("{} charging", id.name());
            state.snapshot = *params;
            state.phase = RepositionPhase::Charging {
                elapsed: 0.0,
                anchor: world.player.position,
            };
            lock.acquire(id);
            world.player.move_speed_scale = charge_scale(&state.snapshot);
        }
        RepositionPhase::Charging { elapsed, .. } => {
            let elapsed = elapsed + world.dt;
            if elapsed < state.snapshot.charge_time {
                state.phase = RepositionPhase::Charging {
                    elapsed,
                    anchor: world.player.position,
                };
                world.player.move_speed_scale = charge_scale(&state.snapshot);
                return;
            }

            let from = world.player.position;
            let to = from + world.player.facing * state.snapshot.distance;
            world.player.move_speed_scale = 1.0;
            world.player.invulnerable = true;
            world.player.control_locked = true;
            state.phase = RepositionPhase::Committed {
                elapsed: 0.0,
                from,
                to,
            };
        }
        RepositionPhase::Committed { elapsed, from, to } => {
            let elapsed = elapsed + world.dt;
            let t = if state.snapshot.commit_time > 0.0 {
                elapsed / state.snapshot.commit_time
            } else {
                1.0
            };

            if t < 1.0 {
                world.player.position = from.lerp(to, ease_in(t));
                state.phase = RepositionPhase::Committed { elapsed, from, to };
                return;
            }

            land(state, id, enchant, to, lock, zones, world);
        }
    }
}

fn charge_scale(params: &LevelParams) -> f32 {
    if params.charge_slow > 0.0 {
        params.charge_slow
    } else {
        1.0
    }
}

fn land(
    state: &mut RepositionState,
    id: AbilityId,
    enchant: Option<Enchant>,
    at: Vec2,
    lock: &mut RepositionLock,
    zones: &mut Vec<Zone>,
    world: &mut AbilityWorld<'_>,
) {
    let snapshot = state.snapshot;
    world.player.position = at;
    world.player.invulnerable = false;
    world.player.control_locked = false;

    let template = HitTemplate {
        ability: id,
        enchant,
        status: snapshot.status(),
    };
    for target in enemies_in_radius(world.enemies, at, snapshot.radius) {
        world.hits.push(PendingHit {
            target,
            source: template.at(snapshot.damage, at),
        });
    }
    if snapshot.has_zone() {
        zones.push(Zone::from_params(id, at, &snapshot));
    }

    debug!("{} landed", id.name());
    lock.release();
    state.cooldown = effective_cooldown(snapshot.cooldown, world.player);
    state.phase = RepositionPhase::Ready;
}
