//! Spatial queries over the enemy pool
//!
//! Linear scans; the pool is small enough that a broadphase is not worth it.

use glam::Vec2;
use horde_core::math::circles_overlap;
use horde_core::Pool;

use crate::enemy::{EnemyId, EnemyInstance};

/// Nearest hittable enemy within `max_range` of `from`, skipping `exclude`.
pub fn nearest_enemy(
    enemies: &Pool<EnemyInstance>,
    from: Vec2,
    max_range: f32,
    exclude: &[EnemyId],
) -> Option<(EnemyId, Vec2)> {
    let max_sq = max_range * max_range;
    enemies
        .iter()
        .filter(|(id, enemy)| enemy.can_be_hit() && !exclude.contains(id))
        .map(|(id, enemy)| (id, enemy.position, enemy.position.distance_squared(from)))
        .filter(|(_, _, dist_sq)| *dist_sq <= max_sq)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(id, position, _)| (id, position))
}

/// Every hittable enemy whose body overlaps the circle at `center`.
pub fn enemies_in_radius(enemies: &Pool<EnemyInstance>, center: Vec2, radius: f32) -> Vec<EnemyId> {
    enemies
        .iter()
        .filter(|(_, enemy)| {
            enemy.can_be_hit() && circles_overlap(center, radius, enemy.position, enemy.radius)
        })
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::EnemyKind;

    fn pool_with(positions: &[Vec2]) -> (Pool<EnemyInstance>, Vec<EnemyId>) {
        let mut pool = Pool::with_capacity(16);
        let ids = positions
            .iter()
            .map(|&p| {
                pool.activate_with(|id| EnemyInstance::spawn(id, EnemyKind::Shambler, p, 1, false))
                    .unwrap()
            })
            .collect();
        (pool, ids)
    }

    #[test]
    fn test_nearest_respects_exclude_and_range() {
        let (pool, ids) = pool_with(&[Vec2::new(10.0, 0.0), Vec2::new(50.0, 0.0)]);
        assert_eq!(nearest_enemy(&pool, Vec2::ZERO, 100.0, &[]).map(|n| n.0), Some(ids[0]));
        assert_eq!(
            nearest_enemy(&pool, Vec2::ZERO, 100.0, &[ids[0]]).map(|n| n.0),
            Some(ids[1])
        );
        assert!(nearest_enemy(&pool, Vec2::ZERO, 5.0, &[]).is_none());
    }

    #[test]
    fn test_nearest_skips_intangible() {
        let (mut pool, ids) = pool_with(&[Vec2::new(10.0, 0.0), Vec2::new(50.0, 0.0)]);
        pool.get_mut(ids[0]).unwrap().tangible = false;
        assert_eq!(nearest_enemy(&pool, Vec2::ZERO, 100.0, &[]).map(|n| n.0), Some(ids[1]));
    }

    #[test]
    fn test_radius_includes_body() {
        let (pool, ids) = pool_with(&[Vec2::new(20.0, 0.0), Vec2::new(200.0, 0.0)]);
        // Shambler radius 12 reaches into a radius-10 circle at 20 units
        assert_eq!(enemies_in_radius(&pool, Vec2::ZERO, 10.0), vec![ids[0]]);
    }
}
