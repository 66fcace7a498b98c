//! Combat resolver: applies hits, runs procs, and owns the death transition

use std::collections::VecDeque;

use glam::Vec2;
use horde_core::Pool;
use tracing::{debug, info};

use super::{enchant, roll_chance, roll_damage, PendingHit, BURN_INTERVAL};
use crate::ability::zone::Zone;
use crate::enemy::{EnemyId, EnemyInstance, EnemyKind};
use crate::events::{EventQueue, KillReport, SimEvent, StatusDamageKind};
use crate::player::PlayerState;
use crate::SimRng;

/// Burn applied by the burn-chance modifier, as a fraction of the hit per tick
pub const PROC_BURN_FRACTION: f32 = 0.25;
pub const PROC_BURN_DURATION: f32 = 3.0;
pub const PROC_SLOW_MULTIPLIER: f32 = 0.6;
pub const PROC_SLOW_DURATION: f32 = 2.0;

/// Result of one resolved hit on one target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub target: EnemyId,
    pub damage: f32,
    pub crit: bool,
    pub killed: bool,
    pub position: Vec2,
}

/// Enemies to spawn around a point (split children, minions)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: EnemyKind,
    pub count: u32,
    pub around: Vec2,
}

/// Side effects combat hands back to the simulation for later phases
#[derive(Debug, Default)]
pub struct CombatEffects {
    pub spawns: Vec<SpawnRequest>,
    pub zones: Vec<Zone>,
    /// Where critical hits landed this tick
    pub crit_positions: Vec<Vec2>,
    pub player_damaged: bool,
}

impl CombatEffects {
    pub fn clear(&mut self) {
        self.spawns.clear();
        self.zones.clear();
        self.crit_positions.clear();
        self.player_damaged = false;
    }
}

/// Mutable world slice combat operates on
pub struct CombatContext<'a> {
    pub enemies: &'a mut Pool<EnemyInstance>,
    pub player: &'a mut PlayerState,
    pub events: &'a mut EventQueue,
    pub rng: &'a mut SimRng,
    pub effects: &'a mut CombatEffects,
}

/// Resolves hits against enemies and damage against the player.
///
/// Deaths are queued and processed once the outermost resolution finishes,
/// so on-death effects that cause further deaths extend the queue instead
/// of recursing.
#[derive(Debug, Default)]
pub struct CombatResolver {
    pending_deaths: VecDeque<EnemyId>,
    resolving_deaths: bool,
    kills: u64,
}

impl CombatResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total enemies killed by combat this session
    pub fn kills(&self) -> u64 {
        self.kills
    }

    /// Run the full pipeline for one hit. Returns `None` when the target is
    /// gone or cannot currently be hit.
    pub fn resolve_hit(
        &mut self,
        ctx: &mut CombatContext<'_>,
        hit: &PendingHit,
    ) -> Option<HitOutcome> {
        if !ctx.enemies.get(hit.target).is_some_and(|e| e.can_be_hit()) {
            return None;
        }

        let roll = roll_damage(&hit.source, &ctx.player.modifiers, ctx.rng);
        let outcome = self.apply_damage(ctx, hit.target, roll.damage, roll.crit)?;

        if outcome.crit {
            ctx.events.push(SimEvent::CritLanded {
                target: outcome.target,
                damage: outcome.damage,
                position: outcome.position,
            });
            ctx.effects.crit_positions.push(outcome.position);
        }

        if !outcome.killed && !hit.source.status.is_empty() {
            if let Some(enemy) = ctx.enemies.get_mut(hit.target) {
                let position = enemy.position;
                hit.source.status.apply(&mut enemy.status, hit.source.origin, position);
            }
        }

        if hit.source.procs {
            self.life_steal(ctx, outcome.damage);
            self.secondary_procs(ctx, &outcome);
            if let Some(enchant) = hit.source.enchant {
                enchant::resolve(self, ctx, &outcome, enchant);
            }
        }

        self.flush_deaths(ctx);
        Some(outcome)
    }

    /// Subtract `amount` from a live enemy's HP and queue its death at zero.
    /// No crit, procs or enchants.
    pub fn apply_damage(
        &mut self,
        ctx: &mut CombatContext<'_>,
        target: EnemyId,
        amount: f32,
        crit: bool,
    ) -> Option<HitOutcome> {
        let enemy = ctx.enemies.get_mut(target)?;
        if !enemy.is_alive() {
            return None;
        }

        enemy.hp = (enemy.hp - amount).max(0.0);
        let killed = enemy.hp <= 0.0;
        let position = enemy.position;

        ctx.events.push(SimEvent::EnemyHit {
            id: target,
            damage: amount,
            crit,
            position,
        });
        if killed {
            self.queue_death(target);
        }

        Some(HitOutcome {
            target,
            damage: amount,
            crit,
            killed,
            position,
        })
    }

    /// Apply a burn or poison tick. Returns true if it killed the target.
    pub fn apply_status_damage(
        &mut self,
        ctx: &mut CombatContext<'_>,
        target: EnemyId,
        amount: f32,
        kind: StatusDamageKind,
    ) -> bool {
        if amount <= 0.0 {
            return false;
        }
        let Some(enemy) = ctx.enemies.get_mut(target) else {
            return false;
        };
        if !enemy.is_alive() {
            return false;
        }

        enemy.hp = (enemy.hp - amount).max(0.0);
        let killed = enemy.hp <= 0.0;
        ctx.events.push(SimEvent::StatusDamageTick {
            id: target,
            damage: amount,
            kind,
        });
        if killed {
            self.queue_death(target);
            self.flush_deaths(ctx);
        }
        killed
    }

    /// Damage the player. Returns the damage actually applied.
    pub fn damage_player(&mut self, ctx: &mut CombatContext<'_>, amount: f32) -> f32 {
        let was_alive = ctx.player.is_alive();
        let applied = ctx.player.take_damage(amount);
        if applied <= 0.0 {
            return 0.0;
        }

        ctx.events.push(SimEvent::PlayerDamaged { amount: applied });
        ctx.effects.player_damaged = true;

        if was_alive && !ctx.player.is_alive() {
            info!("Player died at level {}", ctx.player.level);
            ctx.events.push(SimEvent::PlayerDied);
        }
        applied
    }

    fn life_steal(&mut self, ctx: &mut CombatContext<'_>, damage: f32) {
        let heal = (damage * ctx.player.modifiers.life_steal).floor();
        if heal >= 1.0 {
            ctx.player.heal(heal);
        }
    }

    fn secondary_procs(&mut self, ctx: &mut CombatContext<'_>, outcome: &HitOutcome) {
        if outcome.killed {
            return;
        }
        let burn = roll_chance(ctx.rng, ctx.player.modifiers.burn_chance);
        let slow = roll_chance(ctx.rng, ctx.player.modifiers.slow_chance);
        if !burn && !slow {
            return;
        }

        if let Some(enemy) = ctx.enemies.get_mut(outcome.target) {
            if burn {
                enemy.status.apply_dot(
                    outcome.damage * PROC_BURN_FRACTION,
                    BURN_INTERVAL,
                    PROC_BURN_DURATION,
                );
            }
            if slow {
                enemy.status.apply_slow(PROC_SLOW_MULTIPLIER, PROC_SLOW_DURATION);
            }
        }
    }

    fn queue_death(&mut self, id: EnemyId) {
        if !self.pending_deaths.contains(&id) {
            self.pending_deaths.push_back(id);
        }
    }

    fn flush_deaths(&mut self, ctx: &mut CombatContext<'_>) {
        if self.resolving_deaths {
            return;
        }
        self.resolving_deaths = true;
        while let Some(id) = self.pending_deaths.pop_front() {
            self.kill(ctx, id);
        }
        self.resolving_deaths = false;
    }

    fn kill(&mut self, ctx: &mut CombatContext<'_>, id: EnemyId) {
        let Some(enemy) = ctx.enemies.deactivate(id) else {
            return;
        };
        self.kills += 1;

        let report = KillReport {
            id,
            kind: enemy.kind,
            position: enemy.position,
            xp_value: enemy.xp_value,
            was_elite: enemy.elite,
            was_boss: enemy.is_boss(),
        };
        if report.was_boss {
            info!("Boss {} defeated", enemy.kind.name());
        } else {
            debug!("{} {} killed", enemy.kind.name(), id);
        }
        ctx.events.push(SimEvent::EnemyKilled(report));

        if let Some((kind, count)) = enemy.kind.split_into() {
            ctx.effects.spawns.push(SpawnRequest {
                kind,
                count,
                around: enemy.position,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{Enchant, EnchantKind, HitSource, StatusPayload};
    use crate::config::PlayerConfig;
    use rand::SeedableRng;

    struct World {
        enemies: Pool<EnemyInstance>,
        player: PlayerState,
        events: EventQueue,
        rng: SimRng,
        effects: CombatEffects,
    }

    impl World {
        fn new() -> Self {
            let mut player = PlayerState::new(&PlayerConfig::default());
            player.modifiers.crit_chance = 0.0;
            Self {
                enemies: Pool::with_capacity(32),
                player,
                events: EventQueue::new(),
                rng: SimRng::seed_from_u64(7),
                effects: CombatEffects::default(),
            }
        }

        fn spawn(&mut self, kind: EnemyKind, position: Vec2, hp: f32) -> EnemyId {
            let id = self
                .enemies
                .activate_with(|id| EnemyInstance::spawn(id, kind, position, 1, false))
                .unwrap();
            let enemy = self.enemies.get_mut(id).unwrap();
            enemy.hp = hp;
            enemy.max_hp = hp;
            id
        }

        fn ctx(&mut self) -> CombatContext<'_> {
            CombatContext {
                enemies: &mut self.enemies,
                player: &mut self.player,
                events: &mut self.events,
                rng: &mut self.rng,
                effects: &mut self.effects,
            }
        }

        fn hit(
            &mut self,
            resolver: &mut CombatResolver,
            target: EnemyId,
            source: HitSource,
        ) -> Option<HitOutcome> {
            resolver.resolve_hit(&mut self.ctx(), &PendingHit { target, source })
        }

        fn kills(&self) -> Vec<KillReport> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    SimEvent::EnemyKilled(report) => Some(*report),
                    _ => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_exact_zero_hp_dies() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Shambler, Vec2::ZERO, 10.0);

        let outcome = world.hit(&mut resolver, id, HitSource::new(10.0, Vec2::ZERO)).unwrap();
        assert!(outcome.killed);
        assert!(!world.enemies.contains(id));
        assert_eq!(world.kills().len(), 1);
        assert_eq!(resolver.kills(), 1);
    }

    #[test]
    fn test_hp_clamped_at_zero() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Brute, Vec2::ZERO, 10.0);
        let mut ctx = world.ctx();
        let outcome = resolver.apply_damage(&mut ctx, id, 500.0, false).unwrap();
        assert!(outcome.killed);
    }

    #[test]
    fn test_life_steal_floors() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        world.player.hp = 50.0;
        world.player.modifiers.life_steal = 0.1;
        let id = world.spawn(EnemyKind::Brute, Vec2::ZERO, 500.0);

        world.hit(&mut resolver, id, HitSource::new(50.0, Vec2::ZERO));
        assert_eq!(world.player.hp, 55.0);

        world.hit(&mut resolver, id, HitSource::new(19.0, Vec2::ZERO));
        assert_eq!(world.player.hp, 56.0);
    }

    #[test]
    fn test_passive_hit_skips_life_steal() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        world.player.hp = 50.0;
        world.player.modifiers.life_steal = 0.5;
        let id = world.spawn(EnemyKind::Brute, Vec2::ZERO, 500.0);
        world.hit(&mut resolver, id, HitSource::passive(50.0, Vec2::ZERO));
        assert_eq!(world.player.hp, 50.0);
    }

    #[test]
    fn test_chain_tier_one_bounces_once_to_nearest() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let primary = world.spawn(EnemyKind::Brute, Vec2::ZERO, 1000.0);
        let near = world.spawn(EnemyKind::Brute, Vec2::new(60.0, 0.0), 1000.0);
        let far = world.spawn(EnemyKind::Brute, Vec2::new(120.0, 0.0), 1000.0);

        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Chain, 1)));
        world.hit(&mut resolver, primary, source);

        assert_eq!(world.enemies.get(primary).unwrap().hp, 900.0);
        assert_eq!(world.enemies.get(near).unwrap().hp, 960.0);
        assert_eq!(world.enemies.get(far).unwrap().hp, 1000.0);
    }

    #[test]
    fn test_chain_hops_from_previous_bounce() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let primary = world.spawn(EnemyKind::Brute, Vec2::ZERO, 1000.0);
        let first = world.spawn(EnemyKind::Brute, Vec2::new(170.0, 0.0), 1000.0);
        // out of reach of the primary, within reach of the first bounce
        let second = world.spawn(EnemyKind::Brute, Vec2::new(340.0, 0.0), 1000.0);

        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Chain, 2)));
        world.hit(&mut resolver, primary, source);

        assert_eq!(world.enemies.get(primary).unwrap().hp, 900.0);
        assert_eq!(world.enemies.get(first).unwrap().hp, 950.0);
        assert_eq!(world.enemies.get(second).unwrap().hp, 950.0);
    }

    #[test]
    fn test_chain_never_revisits() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let primary = world.spawn(EnemyKind::Brute, Vec2::ZERO, 1000.0);
        let other = world.spawn(EnemyKind::Brute, Vec2::new(50.0, 0.0), 1000.0);

        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Chain, 3)));
        world.hit(&mut resolver, primary, source);

        // three bounces available, only one untouched target
        assert_eq!(world.enemies.get(primary).unwrap().hp, 900.0);
        assert_eq!(world.enemies.get(other).unwrap().hp, 940.0);
        assert!(world.enemies.get(other).unwrap().status.stunned);
    }

    #[test]
    fn test_explosive_excludes_primary() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let primary = world.spawn(EnemyKind::Shambler, Vec2::ZERO, 1000.0);
        let close = world.spawn(EnemyKind::Shambler, Vec2::new(30.0, 0.0), 1000.0);
        let distant = world.spawn(EnemyKind::Shambler, Vec2::new(300.0, 0.0), 1000.0);

        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Explosive, 1)));
        world.hit(&mut resolver, primary, source);

        assert_eq!(world.enemies.get(primary).unwrap().hp, 900.0);
        assert_eq!(world.enemies.get(close).unwrap().hp, 950.0);
        assert_eq!(world.enemies.get(distant).unwrap().hp, 1000.0);
    }

    #[test]
    fn test_burning_enchant_refresh_rule() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Brute, Vec2::ZERO, 1000.0);
        let burning = Some(Enchant::new(EnchantKind::Burning, 1));

        world.hit(&mut resolver, id, HitSource::new(100.0, Vec2::ZERO).with_enchant(burning));
        assert_eq!(world.enemies.get(id).unwrap().status.dot.unwrap().damage, 20.0);

        world.hit(&mut resolver, id, HitSource::new(50.0, Vec2::ZERO).with_enchant(burning));
        assert_eq!(world.enemies.get(id).unwrap().status.dot.unwrap().damage, 20.0);
    }

    #[test]
    fn test_split_requests_children() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Splitter, Vec2::new(5.0, 5.0), 10.0);
        world.hit(&mut resolver, id, HitSource::new(50.0, Vec2::ZERO));

        assert_eq!(
            world.effects.spawns,
            vec![SpawnRequest {
                kind: EnemyKind::Splitling,
                count: 3,
                around: Vec2::new(5.0, 5.0),
            }]
        );
    }

    #[test]
    fn test_chain_kills_are_reported_once() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let primary = world.spawn(EnemyKind::Splitter, Vec2::ZERO, 10.0);
        world.spawn(EnemyKind::Splitter, Vec2::new(40.0, 0.0), 10.0);

        let source = HitSource::new(100.0, Vec2::ZERO)
            .with_enchant(Some(Enchant::new(EnchantKind::Chain, 1)));
        world.hit(&mut resolver, primary, source);

        assert_eq!(world.kills().len(), 2);
        assert_eq!(world.effects.spawns.len(), 2);
        assert!(world.enemies.is_empty());
    }

    #[test]
    fn test_status_payload_applies_to_survivor() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Brute, Vec2::new(10.0, 0.0), 1000.0);
        let source = HitSource::new(1.0, Vec2::ZERO).with_status(StatusPayload {
            stun_duration: 1.0,
            knockback_speed: 200.0,
            knockback_duration: 0.2,
            ..Default::default()
        });
        world.hit(&mut resolver, id, source);
        let status = &world.enemies.get(id).unwrap().status;
        assert!(status.stunned);
        assert!(status.knockback_velocity.x > 0.0);
    }

    #[test]
    fn test_intangible_target_not_hit() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Wraith, Vec2::ZERO, 100.0);
        world.enemies.get_mut(id).unwrap().tangible = false;
        assert!(world.hit(&mut resolver, id, HitSource::new(50.0, Vec2::ZERO)).is_none());
        assert_eq!(world.enemies.get(id).unwrap().hp, 100.0);
    }

    #[test]
    fn test_status_damage_can_kill() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let id = world.spawn(EnemyKind::Swarmer, Vec2::ZERO, 3.0);
        let mut ctx = world.ctx();
        assert!(resolver.apply_status_damage(&mut ctx, id, 3.0, StatusDamageKind::Burn));
        assert!(!world.enemies.contains(id));
    }

    #[test]
    fn test_player_death_event() {
        let mut world = World::new();
        let mut resolver = CombatResolver::new();
        let mut ctx = world.ctx();
        resolver.damage_player(&mut ctx, 1000.0);
        assert!(ctx.effects.player_damaged);
        assert!(world.events.iter().any(|e| *e == SimEvent::PlayerDied));
    }
}
