//! Difficulty scaling
//!
//! Pure functions mapping a base stat and a wave number to the stat an enemy
//! spawns with, plus the experience curve used by player progression.

/// HP growth per wave past the first, as a fraction of base HP
pub const HP_GROWTH_PER_WAVE: f32 = 0.15;
/// Speed growth per wave past the first, as a fraction of base speed
pub const SPEED_GROWTH_PER_WAVE: f32 = 0.02;
/// Damage growth per wave past the first, as a fraction of base damage
pub const DAMAGE_GROWTH_PER_WAVE: f32 = 0.08;

/// Flat XP needed for every level
pub const XP_BASE: f32 = 5.0;
/// Linear XP term per level
pub const XP_LINEAR: f32 = 10.0;
/// Coefficient of the power term
pub const XP_POWER_COEFF: f32 = 1.5;
/// Exponent of the power term
pub const XP_EXPONENT: f32 = 1.8;

fn linear(base: f32, wave: u32, slope: f32) -> f32 {
    let waves_past_first = wave.saturating_sub(1) as f32;
    base * (1.0 + slope * waves_past_first)
}

/// HP an enemy with `base` HP spawns with on `wave`
pub fn scale_hp(base: f32, wave: u32) -> f32 {
    linear(base, wave, HP_GROWTH_PER_WAVE)
}

/// Movement speed an enemy with `base` speed spawns with on `wave`
pub fn scale_speed(base: f32, wave: u32) -> f32 {
    linear(base, wave, SPEED_GROWTH_PER_WAVE)
}

/// Contact/projectile damage an enemy with `base` damage deals on `wave`
pub fn scale_damage(base: f32, wave: u32) -> f32 {
    linear(base, wave, DAMAGE_GROWTH_PER_WAVE)
}

/// Experience needed to advance from `level` to `level + 1`
pub fn xp_required(level: u32) -> u32 {
    let level = level.max(1) as f32;
    (XP_BASE + XP_LINEAR * level + XP_POWER_COEFF * level.powf(XP_EXPONENT)).floor() as u32
}
