//! Logical projectiles shared by player abilities and enemy attacks
//!
//! Both owners live in one fixed-capacity pool. A player projectile damages
//! each enemy at most once and despawns when its lifetime or hit budget runs
//! out; an enemy projectile despawns on its first contact with the player.

use glam::Vec2;
use horde_core::math::circles_overlap;
use horde_core::Pool;

use crate::combat::enchant::{tier_params, EnchantKind};
use crate::combat::{HitSource, PendingHit};
use crate::enemy::{EnemyId, EnemyInstance};

pub const ENEMY_PROJECTILE_RADIUS: f32 = 6.0;
pub const ENEMY_PROJECTILE_LIFETIME: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileOwner {
    /// Fired by a player ability; carries the hit template
    Player(HitSource),
    Enemy,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub owner: ProjectileOwner,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Damage of the next hit
    pub damage: f32,
    /// Seconds left before despawn
    pub lifetime: f32,
    /// Targets it may still hit
    pub remaining_hits: u32,
    /// Damage kept after each pierce
    pub retention: f32,
    hit: Vec<EnemyId>,
}

impl Projectile {
    /// A player projectile. A Piercing enchant on `source` adds to the hit
    /// budget and sets the per-pierce retention.
    pub fn player(
        source: HitSource,
        position: Vec2,
        velocity: Vec2,
        radius: f32,
        lifetime: f32,
        pierce: u32,
    ) -> Self {
        let mut remaining_hits = 1 + pierce;
        let mut retention = 1.0;
        if let Some(enchant) = source.enchant.filter(|e| e.kind == EnchantKind::Piercing) {
            if let Some(tier) = tier_params(enchant.kind, enchant.tier) {
                remaining_hits += tier.count;
                retention = tier.percent;
            }
        }

        Self {
            owner: ProjectileOwner::Player(source),
            position,
            velocity,
            radius,
            damage: source.damage,
            lifetime,
            remaining_hits,
            retention,
            hit: Vec::new(),
        }
    }

    pub fn enemy(position: Vec2, velocity: Vec2, damage: f32) -> Self {
        Self {
            owner: ProjectileOwner::Enemy,
            position,
            velocity,
            radius: ENEMY_PROJECTILE_RADIUS,
            damage,
            lifetime: ENEMY_PROJECTILE_LIFETIME,
            remaining_hits: 1,
            retention: 1.0,
            hit: Vec::new(),
        }
    }

    pub fn is_player_owned(&self) -> bool {
        matches!(self.owner, ProjectileOwner::Player(_))
    }

    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.lifetime -= dt;
    }

    pub fn has_hit(&self, id: EnemyId) -> bool {
        self.hit.contains(&id)
    }

    /// Record a hit on `id` and return the hit to resolve
    fn register_hit(&mut self, id: EnemyId) -> Option<PendingHit> {
        let ProjectileOwner::Player(template) = self.owner else {
            return None;
        };
        if self.remaining_hits == 0 || self.has_hit(id) {
            return None;
        }

        let source = HitSource {
            damage: self.damage,
            origin: self.position,
            ..template
        };
        self.hit.push(id);
        self.remaining_hits -= 1;
        self.damage *= self.retention;
        Some(PendingHit { target: id, source })
    }

    pub fn is_spent(&self) -> bool {
        self.lifetime <= 0.0 || self.remaining_hits == 0
    }
}

/// Move every projectile and despawn expired ones
pub fn advance_all(projectiles: &mut Pool<Projectile>, dt: f32) {
    let mut expired = Vec::new();
    for (id, projectile) in projectiles.iter_mut() {
        projectile.advance(dt);
        if projectile.lifetime <= 0.0 {
            expired.push(id);
        }
    }
    for id in expired {
        projectiles.deactivate(id);
    }
}

/// Overlap player projectiles with hittable enemies, queueing hits and
/// despawning projectiles whose hit budget is exhausted.
pub fn collect_enemy_hits(
    projectiles: &mut Pool<Projectile>,
    enemies: &Pool<EnemyInstance>,
    hits: &mut Vec<PendingHit>,
) {
    let mut spent = Vec::new();
    for (id, projectile) in projectiles.iter_mut() {
        if !projectile.is_player_owned() {
            continue;
        }
        for (enemy_id, enemy) in enemies.iter() {
            if projectile.remaining_hits == 0 {
                break;
            }
            let touching = circles_overlap(
                projectile.position,
                projectile.radius,
                enemy.position,
                enemy.radius,
            );
            if !enemy.can_be_hit() || !touching {
                continue;
            }
            if let Some(hit) = projectile.register_hit(enemy_id) {
                hits.push(hit);
            }
        }
        if projectile.is_spent() {
            spent.push(id);
        }
    }
    for id in spent {
        projectiles.deactivate(id);
    }
}

/// Total damage from enemy projectiles touching the player this tick. Each
/// touching projectile despawns.
pub fn collect_player_hits(
    projectiles: &mut Pool<Projectile>,
    player_position: Vec2,
    player_radius: f32,
) -> f32 {
    let touching: Vec<_> = projectiles
        .iter()
        .filter(|(_, p)| {
            !p.is_player_owned()
                && circles_overlap(p.position, p.radius, player_position, player_radius)
        })
        .map(|(id, p)| (id, p.damage))
        .collect();

    let mut total = 0.0;
    for (id, damage) in touching {
        projectiles.deactivate(id);
        total += damage;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Enchant;
    use crate::enemy::EnemyKind;

    fn enemies_at(positions: &[Vec2]) -> (Pool<EnemyInstance>, Vec<EnemyId>) {
        let mut pool = Pool::with_capacity(8);
        let ids = positions
            .iter()
            .map(|&p| {
                pool.activate_with(|id| EnemyInstance::spawn(id, EnemyKind::Brute, p, 1, false))
                    .unwrap()
            })
            .collect();
        (pool, ids)
    }

    #[test]
    fn test_single_hit_despawns() {
        let (enemies, ids) = enemies_at(&[Vec2::ZERO, Vec2::new(4.0, 0.0)]);
        let mut projectiles = Pool::with_capacity(4);
        projectiles.activate(Projectile::player(
            HitSource::new(10.0, Vec2::ZERO),
            Vec2::ZERO,
            Vec2::X,
            5.0,
            2.0,
            0,
        ));

        let mut hits = Vec::new();
        collect_enemy_hits(&mut projectiles, &enemies, &mut hits);
        assert_eq!(hits.len(), 1);
        assert!(ids.contains(&hits[0].target));
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_never_hits_same_target_twice() {
        let (enemies, _) = enemies_at(&[Vec2::ZERO]);
        let mut projectiles = Pool::with_capacity(4);
        projectiles.activate(Projectile::player(
            HitSource::new(10.0, Vec2::ZERO),
            Vec2::ZERO,
            Vec2::ZERO,
            5.0,
            2.0,
            3,
        ));

        let mut hits = Vec::new();
        collect_enemy_hits(&mut projectiles, &enemies, &mut hits);
        collect_enemy_hits(&mut projectiles, &enemies, &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(projectiles.len(), 1);
    }

    #[test]
    fn test_piercing_enchant_extends_and_decays() {
        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Piercing, 2)));
        let mut projectile = Projectile::player(source, Vec2::ZERO, Vec2::X, 5.0, 2.0, 0);
        assert_eq!(projectile.remaining_hits, 3);

        let (_, ids) = enemies_at(&[Vec2::ZERO, Vec2::ZERO]);
        let first = projectile.register_hit(ids[0]).unwrap();
        let second = projectile.register_hit(ids[1]).unwrap();
        assert_eq!(first.source.damage, 100.0);
        assert_eq!(second.source.damage, 80.0);
    }

    #[test]
    fn test_lifetime_expiry() {
        let mut projectiles = Pool::with_capacity(2);
        projectiles.activate(Projectile::enemy(Vec2::ZERO, Vec2::X, 5.0));
        advance_all(&mut projectiles, 1.0);
        assert_eq!(projectiles.len(), 1);
        advance_all(&mut projectiles, ENEMY_PROJECTILE_LIFETIME);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_enemy_projectile_hits_player_once() {
        let mut projectiles = Pool::with_capacity(2);
        projectiles.activate(Projectile::enemy(Vec2::ZERO, Vec2::ZERO, 7.0));
        assert_eq!(collect_player_hits(&mut projectiles, Vec2::new(10.0, 0.0), 14.0), 7.0);
        assert_eq!(collect_player_hits(&mut projectiles, Vec2::new(10.0, 0.0), 14.0), 0.0);
    }
}
