//! Status effects carried by every enemy
//!
//! Movement-affecting effects resolve by precedence each tick:
//! knockback > stun > freeze > slow. Burn and poison are independent
//! damage-over-time bookkeeping that runs alongside whichever movement
//! state is active.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Seconds between poison ticks
pub const POISON_INTERVAL: f32 = 1.0;
/// Slowest a slow can make a target, as a speed multiplier
pub const MIN_SLOW_MULTIPLIER: f32 = 0.1;

/// A burn-style damage-over-time effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOverTime {
    /// Damage per tick
    pub damage: f32,
    /// Seconds between ticks
    pub interval: f32,
    /// Total lifetime in seconds
    pub duration: f32,
    /// Seconds since application
    pub elapsed: f32,
    tick_timer: f32,
}

impl DamageOverTime {
    pub fn new(damage: f32, interval: f32, duration: f32) -> Self {
        Self {
            damage,
            interval: interval.max(0.05),
            duration,
            elapsed: 0.0,
            tick_timer: 0.0,
        }
    }

    fn tick(&mut self, delta: f32) -> f32 {
        self.elapsed += delta;
        self.tick_timer += delta;
        let mut dealt = 0.0;
        while self.tick_timer >= self.interval {
            self.tick_timer -= self.interval;
            dealt += self.damage;
        }
        dealt
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// The movement state that wins this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementGate {
    /// Velocity forced by the knockback impulse
    Knockback(Vec2),
    Stunned,
    Frozen,
    /// Archetype runs with speed scaled by the multiplier
    Slowed(f32),
    Free,
}

impl MovementGate {
    /// Whether the archetype update is skipped entirely this tick
    pub fn skips_behavior(&self) -> bool {
        matches!(self, Self::Knockback(_) | Self::Stunned | Self::Frozen)
    }

    /// Multiplier applied to archetype movement speed
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Self::Slowed(multiplier) => *multiplier,
            Self::Free => 1.0,
            _ => 0.0,
        }
    }

    /// Velocity the status model forces when the archetype is skipped
    pub fn forced_velocity(&self) -> Vec2 {
        match self {
            Self::Knockback(velocity) => *velocity,
            _ => Vec2::ZERO,
        }
    }
}

/// Single dominant visual for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusVisual {
    Normal,
    Knockback,
    Stunned,
    Frozen,
    Burning,
    Poisoned,
    Slowed,
}

/// Damage produced by one status tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusTick {
    pub burn_damage: f32,
    pub poison_damage: f32,
}

impl StatusTick {
    pub fn total(&self) -> f32 {
        self.burn_damage + self.poison_damage
    }
}

/// Independent timed status fields of one enemy
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffectSet {
    pub slow_multiplier: f32,
    pub slow_timer: f32,
    pub frozen: bool,
    pub freeze_timer: f32,
    pub stunned: bool,
    pub stun_timer: f32,
    pub knockback_timer: f32,
    pub knockback_velocity: Vec2,
    pub dot: Option<DamageOverTime>,
    pub poisoned: bool,
    pub poison_timer: f32,
    pub poison_damage: f32,
    poison_tick_timer: f32,
}

impl Default for StatusEffectSet {
    fn default() -> Self {
        Self {
            slow_multiplier: 1.0,
            slow_timer: 0.0,
            frozen: false,
            freeze_timer: 0.0,
            stunned: false,
            stun_timer: 0.0,
            knockback_timer: 0.0,
            knockback_velocity: Vec2::ZERO,
            dot: None,
            poisoned: false,
            poison_timer: 0.0,
            poison_damage: 0.0,
            poison_tick_timer: 0.0,
        }
    }
}

impl StatusEffectSet {
    /// Apply a slow. The strongest multiplier and the longest timer win.
    /// Ignored while frozen.
    pub fn apply_slow(&mut self, multiplier: f32, duration: f32) {
        if self.frozen || duration <= 0.0 {
            return;
        }
        let multiplier = multiplier.clamp(MIN_SLOW_MULTIPLIER, 1.0);
        if self.slow_timer > 0.0 {
            self.slow_multiplier = self.slow_multiplier.min(multiplier);
            self.slow_timer = self.slow_timer.max(duration);
        } else {
            self.slow_multiplier = multiplier;
            self.slow_timer = duration;
        }
    }

    /// Hard freeze. Clears any active slow.
    pub fn apply_freeze(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.frozen = true;
        self.freeze_timer = self.freeze_timer.max(duration);
        self.slow_multiplier = 1.0;
        self.slow_timer = 0.0;
    }

    pub fn apply_stun(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.stunned = true;
        self.stun_timer = self.stun_timer.max(duration);
    }

    /// Push the target with `velocity` for `duration` seconds. A new knockback
    /// replaces the current impulse.
    pub fn apply_knockback(&mut self, velocity: Vec2, duration: f32) {
        if duration <= 0.0 || !velocity.is_finite() {
            return;
        }
        self.knockback_velocity = velocity;
        self.knockback_timer = duration;
    }

    /// Apply a burn. Replaces the current one only when `damage` is at least
    /// the current tick damage. Returns whether it was applied.
    pub fn apply_dot(&mut self, damage: f32, interval: f32, duration: f32) -> bool {
        if duration <= 0.0 || damage <= 0.0 {
            return false;
        }
        if let Some(current) = &self.dot {
            if damage < current.damage {
                return false;
            }
        }
        self.dot = Some(DamageOverTime::new(damage, interval, duration));
        true
    }

    pub fn apply_poison(&mut self, damage_per_tick: f32, duration: f32) {
        if duration <= 0.0 || damage_per_tick <= 0.0 {
            return;
        }
        if !self.poisoned {
            self.poison_tick_timer = 0.0;
        }
        self.poisoned = true;
        self.poison_timer = self.poison_timer.max(duration);
        self.poison_damage = self.poison_damage.max(damage_per_tick);
    }

    /// Advance every timer by `delta` and collect damage-over-time.
    ///
    /// Knockback suspends the stun/freeze/slow timers until it expires.
    /// Burn and poison always tick.
    pub fn tick(&mut self, delta: f32) -> StatusTick {
        if self.knockback_timer > 0.0 {
            self.knockback_timer -= delta;
            if self.knockback_timer <= 0.0 {
                self.knockback_timer = 0.0;
                self.knockback_velocity = Vec2::ZERO;
            }
        } else {
            if self.stunned {
                self.stun_timer -= delta;
                if self.stun_timer <= 0.0 {
                    self.stunned = false;
                    self.stun_timer = 0.0;
                }
            }
            if self.frozen {
                self.freeze_timer -= delta;
                if self.freeze_timer <= 0.0 {
                    self.frozen = false;
                    self.freeze_timer = 0.0;
                }
            }
            if self.slow_timer > 0.0 {
                self.slow_timer -= delta;
                if self.slow_timer <= 0.0 {
                    self.slow_timer = 0.0;
                    self.slow_multiplier = 1.0;
                }
            }
        }

        let mut result = StatusTick::default();

        if let Some(dot) = &mut self.dot {
            result.burn_damage = dot.tick(delta);
            if dot.is_expired() {
                self.dot = None;
            }
        }

        if self.poisoned {
            self.poison_timer -= delta;
            self.poison_tick_timer += delta;
            while self.poison_tick_timer >= POISON_INTERVAL {
                self.poison_tick_timer -= POISON_INTERVAL;
                result.poison_damage += self.poison_damage;
            }
            if self.poison_timer <= 0.0 {
                self.poisoned = false;
                self.poison_timer = 0.0;
                self.poison_damage = 0.0;
                self.poison_tick_timer = 0.0;
            }
        }

        result
    }

    /// Resolve which movement state wins this tick
    pub fn gate(&self) -> MovementGate {
        if self.knockback_timer > 0.0 {
            MovementGate::Knockback(self.knockback_velocity)
        } else if self.stunned {
            MovementGate::Stunned
        } else if self.frozen {
            MovementGate::Frozen
        } else if self.slow_timer > 0.0 {
            MovementGate::Slowed(self.slow_multiplier)
        } else {
            MovementGate::Free
        }
    }

    /// The single status a renderer should show. Freeze hides burn, poison and slow.
    pub fn visual(&self) -> StatusVisual {
        match self.gate() {
            MovementGate::Knockback(_) => StatusVisual::Knockback,
            MovementGate::Stunned => StatusVisual::Stunned,
            MovementGate::Frozen => StatusVisual::Frozen,
            _ if self.is_burning() => StatusVisual::Burning,
            _ if self.poisoned => StatusVisual::Poisoned,
            MovementGate::Slowed(_) => StatusVisual::Slowed,
            MovementGate::Free => StatusVisual::Normal,
        }
    }

    pub fn is_burning(&self) -> bool {
        self.dot.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_free() {
        let status = StatusEffectSet::default();
        assert_eq!(status.gate(), MovementGate::Free);
        assert_eq!(status.visual(), StatusVisual::Normal);
    }

    #[test]
    fn test_precedence_order() {
        let mut status = StatusEffectSet::default();
        status.apply_slow(0.5, 5.0);
        assert_eq!(status.gate(), MovementGate::Slowed(0.5));

        status.apply_freeze(3.0);
        assert_eq!(status.gate(), MovementGate::Frozen);

        status.apply_stun(2.0);
        assert_eq!(status.gate(), MovementGate::Stunned);

        status.apply_knockback(Vec2::new(10.0, 0.0), 0.5);
        assert_eq!(status.gate(), MovementGate::Knockback(Vec2::new(10.0, 0.0)));
        assert!(status.gate().skips_behavior());
    }

    #[test]
    fn test_freeze_clears_slow() {
        let mut status = StatusEffectSet::default();
        status.apply_slow(0.4, 5.0);
        status.apply_freeze(1.0);
        assert_eq!(status.slow_timer, 0.0);

        status.apply_slow(0.4, 5.0);
        assert_eq!(status.slow_timer, 0.0);
    }

    #[test]
    fn test_knockback_suspends_other_timers() {
        let mut status = StatusEffectSet::default();
        status.apply_stun(1.0);
        status.apply_knockback(Vec2::X, 0.5);

        status.tick(0.25);
        assert_eq!(status.stun_timer, 1.0);

        status.tick(0.25);
        assert_eq!(status.knockback_timer, 0.0);
        assert_eq!(status.gate(), MovementGate::Stunned);

        status.tick(0.5);
        assert!((status.stun_timer - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_stun_lets_other_timers_tick() {
        let mut status = StatusEffectSet::default();
        status.apply_stun(2.0);
        status.apply_freeze(0.5);
        status.tick(0.5);
        assert!(!status.frozen);
        assert!(status.stunned);
    }

    #[test]
    fn test_dot_not_downgraded() {
        let mut status = StatusEffectSet::default();
        assert!(status.apply_dot(10.0, 0.5, 3.0));
        status.tick(1.0);

        assert!(!status.apply_dot(5.0, 0.25, 10.0));
        let dot = status.dot.unwrap();
        assert_eq!(dot.damage, 10.0);
        assert_eq!(dot.duration, 3.0);
        assert!((dot.elapsed - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_dot_equal_damage_replaces_all_fields() {
        let mut status = StatusEffectSet::default();
        status.apply_dot(10.0, 0.5, 3.0);
        status.tick(1.0);

        assert!(status.apply_dot(10.0, 1.0, 6.0));
        let dot = status.dot.unwrap();
        assert_eq!(dot.interval, 1.0);
        assert_eq!(dot.duration, 6.0);
        assert_eq!(dot.elapsed, 0.0);
    }

    #[test]
    fn test_dot_ticks_and_expires() {
        let mut status = StatusEffectSet::default();
        status.apply_dot(4.0, 0.5, 1.0);
        let mut total = 0.0;
        for _ in 0..4 {
            total += status.tick(0.25).burn_damage;
        }
        assert_eq!(total, 8.0);
        assert!(status.dot.is_none());
    }

    #[test]
    fn test_burn_and_poison_tick_while_frozen() {
        let mut status = StatusEffectSet::default();
        status.apply_dot(3.0, 0.5, 5.0);
        status.apply_poison(2.0, 5.0);
        status.apply_freeze(5.0);

        let tick = status.tick(1.0);
        assert_eq!(tick.burn_damage, 6.0);
        assert_eq!(tick.poison_damage, 2.0);
        assert_eq!(status.visual(), StatusVisual::Frozen);
    }

    #[test]
    fn test_slow_keeps_strongest() {
        let mut status = StatusEffectSet::default();
        status.apply_slow(0.5, 1.0);
        status.apply_slow(0.8, 3.0);
        assert_eq!(status.slow_multiplier, 0.5);
        assert_eq!(status.slow_timer, 3.0);
        assert_eq!(status.gate().speed_multiplier(), 0.5);
    }
}
