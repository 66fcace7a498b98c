//! Boss composite machines
//!
//! The Warlord (BossA) layers a telegraphed charge over a periodic summon.
//! The Lich (BossB) picks one of three phases from its HP ratio on every
//! tick; the phase is never latched, so healing back over a threshold
//! returns it to the earlier phase.

use std::f32::consts::TAU;

use glam::Vec2;
use horde_core::math::{direction_to, unit_from_angle};

use super::behavior::{
    advance_charge, flee, seek, AgentContext, BehaviorRequest, BehaviorState, ChargePhase,
    ChargeState, ChargeTuning, ENEMY_PROJECTILE_SPEED,
};
use super::{EnemyInstance, EnemyKind};

pub const WARLORD_CHARGE_TUNING: ChargeTuning = ChargeTuning {
    windup: 4.0,
    telegraph: 1.2,
    dash_time: 1.0,
    dash_speed_mult: 3.5,
    recover: 1.0,
    approach_speed_mult: 1.0,
};
pub const WARLORD_SUMMON_INTERVAL: f32 = 8.0;
pub const WARLORD_SUMMON_COUNT: u32 = 4;
pub const WARLORD_SHAKE_INTENSITY: f32 = 0.6;
pub const WARLORD_SHAKE_DURATION: f32 = 0.5;

/// HP ratio above which the Lich is in [`LichPhase::Barrage`]
pub const LICH_BARRAGE_THRESHOLD: f32 = 0.66;
/// HP ratio below which the Lich is in [`LichPhase::Frenzy`]
pub const LICH_FRENZY_THRESHOLD: f32 = 0.33;
pub const LICH_RING_INTERVAL: f32 = 3.0;
pub const LICH_RING_COUNT: u32 = 12;
pub const LICH_CONJURE_INTERVAL: f32 = 5.0;
pub const LICH_CONJURE_COUNT: u32 = 6;
pub const LICH_FRENZY_FIRE_INTERVAL: f32 = 0.6;
pub const LICH_FRENZY_SUMMON_INTERVAL: f32 = 8.0;
pub const LICH_FRENZY_SUMMON_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossAState {
    pub charge: ChargeState,
    pub summon_timer: f32,
}

impl Default for BossAState {
    fn default() -> Self {
        Self {
            charge: ChargeState::new(&WARLORD_CHARGE_TUNING),
            summon_timer: WARLORD_SUMMON_INTERVAL,
        }
    }
}

/// HP-gated Lich phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LichPhase {
    /// Approach while firing projectile rings
    Barrage,
    /// Retreat and mass-summon
    Conjure,
    /// Aggressive approach, rapid aimed fire, continued summons
    Frenzy,
}

impl LichPhase {
    pub fn from_hp_ratio(ratio: f32) -> Self {
        if ratio > LICH_BARRAGE_THRESHOLD {
            Self::Barrage
        } else if ratio >= LICH_FRENZY_THRESHOLD {
            Self::Conjure
        } else {
            Self::Frenzy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossBState {
    pub phase: LichPhase,
    pub fire_timer: f32,
    pub summon_timer: f32,
    /// Ring volleys fired so far; alternates the ring offset
    pub volleys: u32,
}

impl Default for BossBState {
    fn default() -> Self {
        Self {
            phase: LichPhase::Barrage,
            fire_timer: LICH_RING_INTERVAL,
            summon_timer: LICH_CONJURE_INTERVAL,
            volleys: 0,
        }
    }
}

pub(crate) fn boss_a(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut state = match enemy.behavior {
        BehaviorState::BossA(state) => state,
        _ => BossAState::default(),
    };

    if advance_charge(&mut state.charge, enemy, ctx, &WARLORD_CHARGE_TUNING) {
        ctx.requests.push(BehaviorRequest::CameraShake {
            intensity: WARLORD_SHAKE_INTENSITY,
            duration: WARLORD_SHAKE_DURATION,
        });
    }

    // no summoning mid-dash
    state.summon_timer -= ctx.dt;
    if state.summon_timer <= 0.0 && state.charge.phase != ChargePhase::Dash {
        ctx.requests.push(BehaviorRequest::SpawnMinions {
            kind: EnemyKind::Shambler,
            count: WARLORD_SUMMON_COUNT,
            around: enemy.position,
        });
        state.summon_timer = WARLORD_SUMMON_INTERVAL;
    }

    enemy.behavior = BehaviorState::BossA(state);
}

pub(crate) fn boss_b(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut state = match enemy.behavior {
        BehaviorState::BossB(state) => state,
        _ => BossBState::default(),
    };

    state.phase = LichPhase::from_hp_ratio(enemy.hp_ratio());
    state.fire_timer -= ctx.dt;
    state.summon_timer -= ctx.dt;
    let speed = enemy.speed * ctx.speed_scale;

    match state.phase {
        LichPhase::Barrage => {
            seek(enemy, ctx.target, speed * 0.7, ctx.dt);
            if state.fire_timer <= 0.0 {
                fire_ring(enemy, ctx, state.volleys);
                state.volleys += 1;
                state.fire_timer = LICH_RING_INTERVAL;
            }
        }
        LichPhase::Conjure => {
            flee(enemy, ctx.target, speed, ctx.dt);
            if state.summon_timer <= 0.0 {
                ctx.requests.push(BehaviorRequest::SpawnMinions {
                    kind: EnemyKind::Swarmer,
                    count: LICH_CONJURE_COUNT,
                    around: enemy.position,
                });
                state.summon_timer = LICH_CONJURE_INTERVAL;
            }
        }
        LichPhase::Frenzy => {
            seek(enemy, ctx.target, speed * 1.4, ctx.dt);
            state.fire_timer = state.fire_timer.min(LICH_FRENZY_FIRE_INTERVAL);
            if state.fire_timer <= 0.0 {
                if let Some(direction) = direction_to(enemy.position, ctx.target) {
                    ctx.requests.push(BehaviorRequest::FireProjectile {
                        origin: enemy.position,
                        direction,
                        speed: ENEMY_PROJECTILE_SPEED * 1.3,
                        damage: enemy.damage,
                    });
                }
                state.fire_timer = LICH_FRENZY_FIRE_INTERVAL;
            }
            if state.summon_timer <= 0.0 {
                ctx.requests.push(BehaviorRequest::SpawnMinions {
                    kind: EnemyKind::Runner,
                    count: LICH_FRENZY_SUMMON_COUNT,
                    around: enemy.position,
                });
                state.summon_timer = LICH_FRENZY_SUMMON_INTERVAL;
            }
        }
    }

    enemy.behavior = BehaviorState::BossB(state);
}

fn fire_ring(enemy: &EnemyInstance, ctx: &mut AgentContext<'_>, volley: u32) {
    let step = TAU / LICH_RING_COUNT as f32;
    let offset = if volley % 2 == 0 { 0.0 } else { step * 0.5 };
    for i in 0..LICH_RING_COUNT {
        let direction: Vec2 = unit_from_angle(offset + step * i as f32);
        ctx.requests.push(BehaviorRequest::FireProjectile {
            origin: enemy.position,
            direction,
            speed: ENEMY_PROJECTILE_SPEED,
            damage: enemy.damage,
        });
    }
}
