//! Archetype strategy table
//!
//! Each archetype maps to a plain update function. Updates move the enemy
//! and push [`BehaviorRequest`]s for anything that touches the rest of the
//! world (projectiles, minions, camera shake); they never act on
//! collaborators directly.

use glam::Vec2;
use horde_core::math::{direction_to, unit_from_angle};

use super::boss::{self, BossAState, BossBState};
use super::{Archetype, EnemyInstance, EnemyKind, INTANGIBLE_OPACITY};

/// Side effects an enemy asks the simulation to perform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorRequest {
    FireProjectile {
        origin: Vec2,
        direction: Vec2,
        speed: f32,
        damage: f32,
    },
    SpawnMinions {
        kind: EnemyKind,
        count: u32,
        around: Vec2,
    },
    CameraShake {
        intensity: f32,
        duration: f32,
    },
}

/// Inputs and output buffer for one agent update
pub struct AgentContext<'a> {
    pub target: Vec2,
    pub dt: f32,
    /// Speed multiplier from the status model (slow)
    pub speed_scale: f32,
    pub requests: &'a mut Vec<BehaviorRequest>,
}

impl<'a> AgentContext<'a> {
    pub fn new(target: Vec2, dt: f32, requests: &'a mut Vec<BehaviorRequest>) -> Self {
        Self {
            target,
            dt,
            speed_scale: 1.0,
            requests,
        }
    }
}

/// Strategy signature shared by every archetype
pub type BehaviorFn = fn(&mut EnemyInstance, &mut AgentContext<'_>);

/// Pacing of a telegraphed dash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeTuning {
    /// Seconds spent approaching before the next telegraph
    pub windup: f32,
    pub telegraph: f32,
    pub dash_time: f32,
    pub dash_speed_mult: f32,
    pub recover: f32,
    /// Approach speed as a multiple of base speed
    pub approach_speed_mult: f32,
}

pub const BURST_CHARGE_TUNING: ChargeTuning = ChargeTuning {
    windup: 2.5,
    telegraph: 0.8,
    dash_time: 0.6,
    dash_speed_mult: 4.0,
    recover: 0.5,
    approach_speed_mult: 1.0,
};

pub const LEAP_TUNING: ChargeTuning = ChargeTuning {
    windup: 1.6,
    telegraph: 0.5,
    dash_time: 0.35,
    dash_speed_mult: 5.5,
    recover: 0.9,
    approach_speed_mult: 0.8,
};

pub const RANGED_MIN_DISTANCE: f32 = 170.0;
pub const RANGED_MAX_DISTANCE: f32 = 260.0;
pub const RANGED_FIRE_INTERVAL: f32 = 2.2;
pub const ENEMY_PROJECTILE_SPEED: f32 = 220.0;

pub const SUMMON_MIN_DISTANCE: f32 = 220.0;
pub const SUMMON_MAX_DISTANCE: f32 = 320.0;
pub const SUMMON_INTERVAL: f32 = 6.0;
pub const SUMMON_COUNT: u32 = 3;

pub const PHASE_TOGGLE_INTERVAL: f32 = 2.5;

const SWARM_WEAVE_FREQUENCY: f32 = 4.0;
const SWARM_WEAVE_ANGLE: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargePhase {
    Approach,
    Telegraph,
    Dash,
    Recover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeState {
    pub phase: ChargePhase,
    pub timer: f32,
    pub dash_dir: Vec2,
}

impl ChargeState {
    pub fn new(tuning: &ChargeTuning) -> Self {
        Self {
            phase: ChargePhase::Approach,
            timer: tuning.windup,
            dash_dir: Vec2::ZERO,
        }
    }
}

/// Behavior-local timers, one variant per archetype family
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorState {
    Pursue,
    Swarm { weave_phase: f32 },
    Charge(ChargeState),
    Ranged { fire_timer: f32 },
    Summon { summon_timer: f32 },
    Phase { toggle_timer: f32 },
    BossA(BossAState),
    BossB(BossBState),
}

impl BehaviorState {
    pub fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Chase | Archetype::Split => Self::Pursue,
            Archetype::Swarm => Self::Swarm { weave_phase: 0.0 },
            Archetype::BurstCharge => Self::Charge(ChargeState::new(&BURST_CHARGE_TUNING)),
            Archetype::Leap => Self::Charge(ChargeState::new(&LEAP_TUNING)),
            Archetype::Ranged => Self::Ranged {
                fire_timer: RANGED_FIRE_INTERVAL,
            },
            Archetype::Summon => Self::Summon {
                summon_timer: SUMMON_INTERVAL,
            },
            Archetype::Phase => Self::Phase {
                toggle_timer: PHASE_TOGGLE_INTERVAL,
            },
            Archetype::BossA => Self::BossA(BossAState::default()),
            Archetype::BossB => Self::BossB(BossBState::default()),
        }
    }
}

/// Look up the update function for an archetype
pub fn behavior_for(archetype: Archetype) -> BehaviorFn {
    match archetype {
        Archetype::Chase | Archetype::Split => chase,
        Archetype::Swarm => swarm,
        Archetype::BurstCharge => burst_charge,
        Archetype::Leap => leap,
        Archetype::Ranged => ranged,
        Archetype::Summon => summon,
        Archetype::Phase => phase,
        Archetype::BossA => boss::boss_a,
        Archetype::BossB => boss::boss_b,
    }
}

/// Run one enemy for one tick.
///
/// Knocked-back, stunned and frozen enemies skip their archetype entirely;
/// the status model decides their velocity instead.
pub fn update_agent(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let gate = enemy.status.gate();
    if gate.skips_behavior() {
        enemy.velocity = gate.forced_velocity();
        enemy.position += enemy.velocity * ctx.dt;
        return;
    }
    ctx.speed_scale = gate.speed_multiplier();
    behavior_for(enemy.archetype())(enemy, ctx);
}

/// Move toward `target` at `speed`. Standing on the target means no movement.
pub(crate) fn seek(enemy: &mut EnemyInstance, target: Vec2, speed: f32, dt: f32) {
    enemy.velocity = direction_to(enemy.position, target).map_or(Vec2::ZERO, |dir| dir * speed);
    enemy.position += enemy.velocity * dt;
}

pub(crate) fn flee(enemy: &mut EnemyInstance, threat: Vec2, speed: f32, dt: f32) {
    enemy.velocity = direction_to(threat, enemy.position).map_or(Vec2::ZERO, |dir| dir * speed);
    enemy.position += enemy.velocity * dt;
}

pub(crate) fn halt(enemy: &mut EnemyInstance) {
    enemy.velocity = Vec2::ZERO;
}

/// Approach when too far, back off when too close, hold inside the band.
pub(crate) fn hold_band(enemy: &mut EnemyInstance, ctx: &AgentContext<'_>, min: f32, max: f32) {
    let distance = enemy.position.distance(ctx.target);
    let speed = enemy.speed * ctx.speed_scale;
    if distance > max {
        seek(enemy, ctx.target, speed, ctx.dt);
    } else if distance < min {
        flee(enemy, ctx.target, speed, ctx.dt);
    } else {
        halt(enemy);
    }
}

/// Advance a telegraphed dash. Returns true on the tick the dash begins.
pub(crate) fn advance_charge(
    state: &mut ChargeState,
    enemy: &mut EnemyInstance,
    ctx: &AgentContext<'_>,
    tuning: &ChargeTuning,
) -> bool {
    state.timer -= ctx.dt;
    let mut dash_started = false;
    match state.phase {
        ChargePhase::Approach => {
            let speed = enemy.speed * tuning.approach_speed_mult * ctx.speed_scale;
            seek(enemy, ctx.target, speed, ctx.dt);
            if state.timer <= 0.0 {
                state.phase = ChargePhase::Telegraph;
                state.timer = tuning.telegraph;
                state.dash_dir = direction_to(enemy.position, ctx.target).unwrap_or(Vec2::ZERO);
                halt(enemy);
            }
        }
        ChargePhase::Telegraph => {
            halt(enemy);
            if state.timer <= 0.0 {
                state.phase = ChargePhase::Dash;
                state.timer = tuning.dash_time;
                dash_started = true;
            }
        }
        ChargePhase::Dash => {
            enemy.velocity =
                state.dash_dir * enemy.speed * tuning.dash_speed_mult * ctx.speed_scale;
            enemy.position += enemy.velocity * ctx.dt;
            if state.timer <= 0.0 {
                state.phase = ChargePhase::Recover;
                state.timer = tuning.recover;
                halt(enemy);
            }
        }
        ChargePhase::Recover => {
            halt(enemy);
            if state.timer <= 0.0 {
                state.phase = ChargePhase::Approach;
                state.timer = tuning.windup;
            }
        }
    }
    dash_started
}

fn chase(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let speed = enemy.speed * ctx.speed_scale;
    seek(enemy, ctx.target, speed, ctx.dt);
}

fn swarm(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut weave_phase = match enemy.behavior {
        BehaviorState::Swarm { weave_phase } => weave_phase,
        // offset by slot so a pack doesn't weave in lockstep
        _ => enemy.id.index() as f32,
    };
    weave_phase += ctx.dt * SWARM_WEAVE_FREQUENCY;

    let speed = enemy.speed * ctx.speed_scale;
    enemy.velocity = match direction_to(enemy.position, ctx.target) {
        Some(dir) => dir.rotate(unit_from_angle(weave_phase.sin() * SWARM_WEAVE_ANGLE)) * speed,
        None => Vec2::ZERO,
    };
    enemy.position += enemy.velocity * ctx.dt;
    enemy.behavior = BehaviorState::Swarm { weave_phase };
}

fn charge_with(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>, tuning: &ChargeTuning) {
    let mut state = match enemy.behavior {
        BehaviorState::Charge(state) => state,
        _ => ChargeState::new(tuning),
    };
    advance_charge(&mut state, enemy, ctx, tuning);
    enemy.behavior = BehaviorState::Charge(state);
}

fn burst_charge(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    charge_with(enemy, ctx, &BURST_CHARGE_TUNING);
}

fn leap(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    charge_with(enemy, ctx, &LEAP_TUNING);
}

fn ranged(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut fire_timer = match enemy.behavior {
        BehaviorState::Ranged { fire_timer } => fire_timer,
        _ => RANGED_FIRE_INTERVAL,
    };

    hold_band(enemy, ctx, RANGED_MIN_DISTANCE, RANGED_MAX_DISTANCE);

    fire_timer = (fire_timer - ctx.dt).max(0.0);
    let in_range = enemy.position.distance(ctx.target) <= RANGED_MAX_DISTANCE * 1.25;
    if fire_timer <= 0.0 && in_range {
        if let Some(direction) = direction_to(enemy.position, ctx.target) {
            ctx.requests.push(BehaviorRequest::FireProjectile {
                origin: enemy.position,
                direction,
                speed: ENEMY_PROJECTILE_SPEED,
                damage: enemy.damage,
            });
        }
        fire_timer = RANGED_FIRE_INTERVAL;
    }
    enemy.behavior = BehaviorState::Ranged { fire_timer };
}

fn summon(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut summon_timer = match enemy.behavior {
        BehaviorState::Summon { summon_timer } => summon_timer,
        _ => SUMMON_INTERVAL,
    };

    hold_band(enemy, ctx, SUMMON_MIN_DISTANCE, SUMMON_MAX_DISTANCE);

    summon_timer -= ctx.dt;
    if summon_timer <= 0.0 {
        ctx.requests.push(BehaviorRequest::SpawnMinions {
            kind: EnemyKind::Swarmer,
            count: SUMMON_COUNT,
            around: enemy.position,
        });
        summon_timer = SUMMON_INTERVAL;
    }
    enemy.behavior = BehaviorState::Summon { summon_timer };
}

fn phase(enemy: &mut EnemyInstance, ctx: &mut AgentContext<'_>) {
    let mut toggle_timer = match enemy.behavior {
        BehaviorState::Phase { toggle_timer } => toggle_timer,
        _ => PHASE_TOGGLE_INTERVAL,
    };

    toggle_timer -= ctx.dt;
    if toggle_timer <= 0.0 {
        enemy.tangible = !enemy.tangible;
        enemy.opacity = if enemy.tangible { 1.0 } else { INTANGIBLE_OPACITY };
        toggle_timer = PHASE_TOGGLE_INTERVAL;
    }

    let speed = enemy.speed * ctx.speed_scale;
    seek(enemy, ctx.target, speed, ctx.dt);
    enemy.behavior = BehaviorState::Phase { toggle_timer };
}
