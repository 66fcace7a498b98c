//! Direction and geometry helpers on `Vec2`

use glam::Vec2;

/// Distances below this are treated as "already there".
pub const MIN_DIRECTION_LENGTH: f32 = 1e-3;

/// Unit direction from `from` to `to`, or `None` when the points coincide.
pub fn direction_to(from: Vec2, to: Vec2) -> Option<Vec2> {
    normalized(to - from)
}

/// Normalize `v`, treating near-zero vectors as no direction at all.
pub fn normalized(v: Vec2) -> Option<Vec2> {
    if !v.is_finite() || v.length_squared() < MIN_DIRECTION_LENGTH * MIN_DIRECTION_LENGTH {
        None
    } else {
        Some(v.normalize())
    }
}

/// Unit vector pointing at `angle` radians.
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Point on a circle of `radius` around `center`.
pub fn point_on_circle(center: Vec2, radius: f32, angle: f32) -> Vec2 {
    center + unit_from_angle(angle) * radius
}

/// Whether two circles overlap.
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

/// Quadratic ease-in over `t` in `[0, 1]`.
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to_zero_distance() {
        let p = Vec2::new(3.0, 4.0);
        assert!(direction_to(p, p).is_none());
        assert!(direction_to(p, p + Vec2::splat(1e-5)).is_none());
    }

    #[test]
    fn test_direction_to_is_unit() {
        let dir = direction_to(Vec2::ZERO, Vec2::new(3.0, 4.0)).unwrap();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!((dir.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_normalized_rejects_nan() {
        assert!(normalized(Vec2::new(f32::NAN, 1.0)).is_none());
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 0.5));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(1.6, 0.0), 0.5));
    }

    #[test]
    fn test_ease_in_bounds() {
        assert_eq!(ease_in(0.0), 0.0);
        assert_eq!(ease_in(1.0), 1.0);
        assert_eq!(ease_in(2.0), 1.0);
        assert!(ease_in(0.5) < 0.5);
    }
}
