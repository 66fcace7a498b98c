//! The simulation: owns every subsystem and runs them in a fixed order
//!
//! Per tick: player movement and regen, spawning, status decay, enemy
//! behavior, abilities, projectile and contact collisions, hit resolution,
//! reactive abilities, combat side effects, culling, outcome.
//!
//! Hits resolved between ticks (from an external collision collaborator)
//! leave their side effects pending until the next tick applies them.

use glam::Vec2;
use horde_core::math::{circles_overlap, normalized};
use horde_core::{Pool, SimClock};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::ability::{AbilityEngine, AbilityId, AbilityWorld, ParamTable};
use crate::combat::{CombatContext, CombatEffects, CombatResolver, Enchant, HitOutcome, PendingHit};
use crate::config::SimConfig;
use crate::enemy::{update_agent, AgentContext, BehaviorRequest, EnemyId, EnemyInstance, EnemyKind};
use crate::error::{SimError, SimResult};
use crate::events::{EventQueue, SimEvent, StatusDamageKind};
use crate::player::{Job, ModifierBoost, Pickup, PlayerState};
use crate::projectile::{self, Projectile};
use crate::wave::{SpawnWorld, WaveDirector, WaveTable};
use crate::SimRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Before `start`; a job may still be chosen
    Setup,
    Running,
    Won,
    Lost,
}

impl SessionPhase {
    pub fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// A level-up reward chosen by the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Enhancement {
    Modifier(ModifierBoost),
    /// Grant at level 1, or raise by one
    Ability(AbilityId),
    Enchant { ability: AbilityId, enchant: Enchant },
}

pub struct Simulation {
    config: SimConfig,
    clock: SimClock,
    rng: SimRng,
    phase: SessionPhase,
    job: Option<Job>,
    player: PlayerState,
    enemies: Pool<EnemyInstance>,
    projectiles: Pool<Projectile>,
    director: WaveDirector,
    engine: AbilityEngine,
    resolver: CombatResolver,
    events: EventQueue,
    effects: CombatEffects,
    hits: Vec<PendingHit>,
    requests: Vec<BehaviorRequest>,
    elapsed: f32,
}

impl Simulation {
    /// Build a session from validated tables. `seed` drives every random
    /// decision the session makes.
    pub fn new(
        config: SimConfig,
        waves: WaveTable,
        params: ParamTable,
        seed: u64,
    ) -> SimResult<Self> {
        config.validate()?;
        waves.validate()?;
        params.validate()?;
        Ok(Self::build(config, waves, params, seed))
    }

    /// Default config with the built-in wave and ability tables
    pub fn with_defaults(seed: u64) -> Self {
        Self::build(SimConfig::default(), WaveTable::builtin(), ParamTable::builtin(), seed)
    }

    fn build(config: SimConfig, waves: WaveTable, params: ParamTable, seed: u64) -> Self {
        Self {
            clock: SimClock::new(config.clock.clone()),
            rng: SimRng::seed_from_u64(seed),
            phase: SessionPhase::Setup,
            job: None,
            player: PlayerState::new(&config.player),
            enemies: Pool::with_capacity(config.max_enemies),
            projectiles: Pool::with_capacity(config.max_projectiles),
            director: WaveDirector::new(waves, config.director.clone()),
            engine: AbilityEngine::new(params),
            resolver: CombatResolver::new(),
            events: EventQueue::new(),
            effects: CombatEffects::default(),
            hits: Vec::new(),
            requests: Vec::new(),
            elapsed: 0.0,
            config,
        }
    }

    // --- inbound requests ---

    /// Choose the starting job. Only allowed before `start`.
    pub fn select_job(&mut self, job: Job) -> SimResult<()> {
        if self.phase != SessionPhase::Setup {
            return Err(SimError::SessionStarted);
        }
        self.job = Some(job);
        Ok(())
    }

    /// Apply the chosen job and begin wave 1
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Setup {
            return;
        }

        match self.job {
            Some(job) => {
                for &boost in job.starting_boosts() {
                    self.player.apply_boost(boost);
                }
                let starting = job.starting_ability();
                if let Err(e) = self.engine.grant_or_level(starting, &mut self.player) {
                    warn!("Could not grant starting ability for {}: {}", job.name(), e);
                }
                info!("Session started as {}", job.name());
            }
            None => info!("Session started without a job"),
        }

        self.phase = SessionPhase::Running;
        self.events.push(SimEvent::PlayerHealthChanged {
            hp: self.player.hp,
            max_hp: self.player.max_hp,
        });

        let mut world = SpawnWorld {
            enemies: &mut self.enemies,
            events: &mut self.events,
            rng: &mut self.rng,
            player_position: self.player.position,
        };
        self.director.start(&mut world);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Apply a level-up reward. Fails when the ability is maxed or the
    /// enchant target is not owned; nothing changes in that case.
    pub fn apply_enhancement(&mut self, enhancement: Enhancement) -> SimResult<()> {
        match enhancement {
            Enhancement::Modifier(boost) => {
                self.player.apply_boost(boost);
                if matches!(boost, ModifierBoost::MaxHp(_)) {
                    self.events.push(SimEvent::PlayerHealthChanged {
                        hp: self.player.hp,
                        max_hp: self.player.max_hp,
                    });
                }
            }
            Enhancement::Ability(id) => {
                self.engine.grant_or_level(id, &mut self.player)?;
            }
            Enhancement::Enchant { ability, enchant } => {
                self.engine.attach_enchant(ability, enchant)?;
            }
        }
        Ok(())
    }

    /// Desired movement direction from the input collaborator
    pub fn set_move_input(&mut self, direction: Vec2) {
        self.player.move_input = normalized(direction).unwrap_or(Vec2::ZERO);
    }

    /// Reported by the pickup collaborator. Returns the levels reached.
    pub fn collect_pickup(&mut self, pickup: Pickup) -> Vec<u32> {
        if self.phase.is_over() {
            return Vec::new();
        }

        let levels = match pickup {
            Pickup::Experience(amount) => self.player.add_xp(amount),
            Pickup::Heal(amount) => {
                if self.player.heal(amount) > 0.0 {
                    self.events.push(SimEvent::PlayerHealthChanged {
                        hp: self.player.hp,
                        max_hp: self.player.max_hp,
                    });
                }
                Vec::new()
            }
        };

        self.events.push(SimEvent::ItemCollected { pickup });
        for &level in &levels {
            info!("Reached level {}", level);
            self.events.push(SimEvent::LevelUp { level });
        }
        levels
    }

    /// Spawn outside the wave schedule, subject to the same cap
    pub fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        position: Option<Vec2>,
        elite: Option<bool>,
    ) -> Option<EnemyId> {
        let mut world = SpawnWorld {
            enemies: &mut self.enemies,
            events: &mut self.events,
            rng: &mut self.rng,
            player_position: self.player.position,
        };
        self.director.spawn_enemy(&mut world, kind, position, elite)
    }

    /// Resolve a hit reported by an external collision collaborator
    pub fn resolve_hit(&mut self, hit: PendingHit) -> Option<HitOutcome> {
        let mut ctx = CombatContext {
            enemies: &mut self.enemies,
            player: &mut self.player,
            events: &mut self.events,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };
        self.resolver.resolve_hit(&mut ctx, &hit)
    }

    /// Notifications produced since the last drain
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SimEvent> {
        self.events.drain()
    }

    // --- tick loop ---

    /// Feed one frame's raw delta. Runs as many fixed ticks as have accumulated.
    pub fn update(&mut self, raw_delta: f32) {
        self.clock.update(raw_delta);
        let steps = self.clock.fixed_steps();
        let dt = self.clock.step();
        for _ in 0..steps {
            if self.phase != SessionPhase::Running {
                break;
            }
            self.tick(dt);
        }
    }

    /// Run exactly one tick of `dt` seconds. Does nothing while paused or
    /// outside a running session.
    pub fn tick(&mut self, dt: f32) {
        if self.clock.is_paused() || self.phase != SessionPhase::Running {
            return;
        }

        let hp_before = (self.player.hp, self.player.max_hp);
        self.elapsed += dt;

        self.player.hurt_cooldown = (self.player.hurt_cooldown - dt).max(0.0);
        self.player.step_movement(dt);
        self.player.tick_regen(dt);

        let mut world = SpawnWorld {
            enemies: &mut self.enemies,
            events: &mut self.events,
            rng: &mut self.rng,
            player_position: self.player.position,
        };
        self.director.update(dt, &mut world);

        self.tick_status(dt);
        self.tick_behavior(dt);

        let mut world = AbilityWorld {
            player: &mut self.player,
            enemies: &self.enemies,
            projectiles: &mut self.projectiles,
            rng: &mut self.rng,
            hits: &mut self.hits,
            dt,
        };
        self.engine.tick(&mut world);

        projectile::advance_all(&mut self.projectiles, dt);
        projectile::collect_enemy_hits(&mut self.projectiles, &self.enemies, &mut self.hits);
        self.resolve_pending_hits();
        self.damage_player_on_contact();

        self.fire_reactive_abilities(dt);
        self.apply_combat_effects();
        self.cull_distant();
        self.effects.clear();

        if (self.player.hp, self.player.max_hp) != hp_before {
            self.events.push(SimEvent::PlayerHealthChanged {
                hp: self.player.hp,
                max_hp: self.player.max_hp,
            });
        }
        self.check_outcome();
    }

    fn tick_status(&mut self, dt: f32) {
        let mut damage = Vec::new();
        for (id, enemy) in self.enemies.iter_mut() {
            let tick = enemy.status.tick(dt);
            if tick.burn_damage > 0.0 {
                damage.push((id, tick.burn_damage, StatusDamageKind::Burn));
            }
            if tick.poison_damage > 0.0 {
                damage.push((id, tick.poison_damage, StatusDamageKind::Poison));
            }
        }

        let mut ctx = CombatContext {
            enemies: &mut self.enemies,
            player: &mut self.player,
            events: &mut self.events,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };
        for (id, amount, kind) in damage {
            self.resolver.apply_status_damage(&mut ctx, id, amount, kind);
        }
    }

    fn tick_behavior(&mut self, dt: f32) {
        let target = self.player.position;
        for (_, enemy) in self.enemies.iter_mut() {
            let mut ctx = AgentContext::new(target, dt, &mut self.requests);
            update_agent(enemy, &mut ctx);
        }

        let requests = std::mem::take(&mut self.requests);
        for request in &requests {
            match *request {
                BehaviorRequest::FireProjectile {
                    origin,
                    direction,
                    speed,
                    damage,
                } => {
                    let shot = Projectile::enemy(origin, direction * speed, damage);
                    if self.projectiles.activate(shot).is_none() {
                        trace!("Enemy projectile dropped, pool full");
                    }
                }
                BehaviorRequest::SpawnMinions { kind, count, around } => {
                    let mut world = SpawnWorld {
                        enemies: &mut self.enemies,
                        events: &mut self.events,
                        rng: &mut self.rng,
                        player_position: self.player.position,
                    };
                    self.director.spawn_around(&mut world, kind, count, around);
                }
                BehaviorRequest::CameraShake { intensity, duration } => {
                    self.events.push(SimEvent::CameraShake { intensity, duration });
                }
            }
        }
        self.requests = requests;
        self.requests.clear();
    }

    fn resolve_pending_hits(&mut self) {
        let mut ctx = CombatContext {
            enemies: &mut self.enemies,
            player: &mut self.player,
            events: &mut self.events,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };
        for hit in self.hits.drain(..) {
            self.resolver.resolve_hit(&mut ctx, &hit);
        }
    }

    /// Enemy projectiles always land; body contact respects the i-frame window
    fn damage_player_on_contact(&mut self) {
        let position = self.player.position;
        let radius = self.player.radius;
        let shot_damage = projectile::collect_player_hits(&mut self.projectiles, position, radius);

        let contact_damage = if self.player.hurt_cooldown > 0.0 {
            0.0
        } else {
            self.enemies
                .iter()
                .filter(|(_, e)| e.tangible && e.is_alive())
                .filter(|(_, e)| circles_overlap(e.position, e.radius, position, radius))
                .map(|(_, e)| e.damage)
                .fold(0.0, f32::max)
        };

        let mut ctx = CombatContext {
            enemies: &mut self.enemies,
            player: &mut self.player,
            events: &mut self.events,
            rng: &mut self.rng,
            effects: &mut self.effects,
        };
        if shot_damage > 0.0 {
            self.resolver.damage_player(&mut ctx, shot_damage);
        }
        if contact_damage > 0.0 && self.resolver.damage_player(&mut ctx, contact_damage) > 0.0 {
            ctx.player.hurt_cooldown = self.config.player.hurt_cooldown;
        }
    }

    fn fire_reactive_abilities(&mut self, dt: f32) {
        let crits = std::mem::take(&mut self.effects.crit_positions);
        if !self.effects.player_damaged && crits.is_empty() {
            return;
        }

        let mut world = AbilityWorld {
            player: &mut self.player,
            enemies: &self.enemies,
            projectiles: &mut self.projectiles,
            rng: &mut self.rng,
            hits: &mut self.hits,
            dt,
        };
        if self.effects.player_damaged {
            self.engine.on_player_damaged(&mut world);
        }
        for at in crits {
            self.engine.on_critical_hit(at, &mut world);
        }
        self.resolve_pending_hits();
    }

    fn apply_combat_effects(&mut self) {
        for zone in self.effects.zones.drain(..) {
            self.engine.add_zone(zone);
        }

        let mut world = SpawnWorld {
            enemies: &mut self.enemies,
            events: &mut self.events,
            rng: &mut self.rng,
            player_position: self.player.position,
        };
        for spawn in self.effects.spawns.drain(..) {
            self.director.spawn_around(&mut world, spawn.kind, spawn.count, spawn.around);
        }
    }

    /// Deactivate far-away enemies without a kill notification. Bosses stay.
    fn cull_distant(&mut self) {
        let center = self.player.position;
        let limit = self.config.cull_distance * self.config.cull_distance;
        let culled: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|(_, e)| !e.is_boss() && e.position.distance_squared(center) > limit)
            .map(|(id, _)| id)
            .collect();

        if !culled.is_empty() {
            debug!("Culled {} distant enemies", culled.len());
        }
        for id in culled {
            self.enemies.deactivate(id);
        }
    }

    fn check_outcome(&mut self) {
        if !self.player.is_alive() {
            info!(
                "Session lost on wave {} after {:.1}s",
                self.director.current_wave(),
                self.elapsed
            );
            self.phase = SessionPhase::Lost;
        } else if self.director.all_waves_complete() {
            info!("Session won after {:.1}s", self.elapsed);
            self.phase = SessionPhase::Won;
        }
    }

    // --- accessors ---

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn job(&self) -> Option<Job> {
        self.job
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// For collaborators that own the player's body (and for tests)
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn enemies(&self) -> &Pool<EnemyInstance> {
        &self.enemies
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyInstance> {
        self.enemies.get(id)
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut EnemyInstance> {
        self.enemies.get_mut(id)
    }

    pub fn projectiles(&self) -> &Pool<Projectile> {
        &self.projectiles
    }

    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    pub fn abilities(&self) -> &AbilityEngine {
        &self.engine
    }

    pub fn current_wave(&self) -> u32 {
        self.director.current_wave()
    }

    pub fn kills(&self) -> u64 {
        self.resolver.kills()
    }

    /// Simulated seconds of running ticks
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectorConfig;
    use crate::wave::WaveDefinition;

    fn quiet_waves() -> WaveTable {
        WaveTable::new(vec![WaveDefinition {
            wave: 1,
            duration_ms: 600_000,
            groups: Vec::new(),
            boss: None,
        }])
        .unwrap()
    }

    fn quiet_sim() -> Simulation {
        let config = SimConfig {
            director: DirectorConfig::waves_only(),
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config, quiet_waves(), ParamTable::builtin(), 1).unwrap();
        sim.start();
        sim.drain_events().for_each(drop);
        sim
    }

    #[test]
    fn test_job_only_before_start() {
        let mut sim = Simulation::with_defaults(1);
        sim.select_job(Job::Warden).unwrap();
        sim.start();
        assert_eq!(sim.phase(), SessionPhase::Running);
        assert!(sim.abilities().owns(AbilityId::Shockwave));
        assert_eq!(sim.player().max_hp, 130.0);
        assert!(matches!(sim.select_job(Job::Stalker), Err(SimError::SessionStarted)));
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut sim = quiet_sim();
        let id = sim
            .spawn_enemy(EnemyKind::Shambler, Some(Vec2::new(300.0, 0.0)), Some(false))
            .unwrap();
        let before = sim.enemy(id).unwrap().position;

        sim.pause();
        sim.update(0.1);
        sim.tick(0.1);
        assert_eq!(sim.enemy(id).unwrap().position, before);
        assert_eq!(sim.elapsed(), 0.0);

        sim.resume();
        sim.tick(0.1);
        assert_ne!(sim.enemy(id).unwrap().position, before);
    }

    #[test]
    fn test_contact_damage_uses_iframes() {
        let mut sim = quiet_sim();
        let id = sim.spawn_enemy(EnemyKind::Brute, Some(Vec2::ZERO), Some(false)).unwrap();
        let damage = sim.enemy(id).unwrap().damage;

        sim.tick(0.01);
        let after_first = sim.player().hp;
        assert_eq!(after_first, 100.0 - damage);
        sim.tick(0.01);
        assert_eq!(sim.player().hp, after_first);

        let events: Vec<_> = sim.drain_events().collect();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SimEvent::PlayerDamaged { .. }))
                .count(),
            1
        );
        assert!(events.iter().any(|e| matches!(e, SimEvent::PlayerHealthChanged { .. })));
    }

    #[test]
    fn test_invulnerable_player_takes_nothing() {
        let mut sim = quiet_sim();
        sim.spawn_enemy(EnemyKind::Brute, Some(Vec2::ZERO), Some(false));
        sim.player_mut().invulnerable = true;
        sim.tick(0.01);
        assert_eq!(sim.player().hp, 100.0);
    }

    #[test]
    fn test_death_ends_session() {
        let mut sim = quiet_sim();
        sim.player_mut().hp = 1.0;
        sim.spawn_enemy(EnemyKind::Brute, Some(Vec2::ZERO), Some(false));
        sim.tick(0.01);

        assert_eq!(sim.phase(), SessionPhase::Lost);
        assert_eq!(sim.player().hp, 0.0);
        assert!(sim.drain_events().any(|e| e == SimEvent::PlayerDied));

        let elapsed = sim.elapsed();
        sim.tick(0.01);
        assert_eq!(sim.elapsed(), elapsed);
    }

    #[test]
    fn test_pickup_levels_up() {
        let mut sim = quiet_sim();
        let needed = sim.player().xp_to_next;
        let levels = sim.collect_pickup(Pickup::Experience(needed));
        assert_eq!(levels, vec![2]);

        let events: Vec<_> = sim.drain_events().collect();
        assert!(events.contains(&SimEvent::LevelUp { level: 2 }));
        assert!(events.contains(&SimEvent::ItemCollected {
            pickup: Pickup::Experience(needed)
        }));
    }

    #[test]
    fn test_enhancements() {
        let mut sim = quiet_sim();
        sim.apply_enhancement(Enhancement::Ability(AbilityId::Smite)).unwrap();
        sim.apply_enhancement(Enhancement::Ability(AbilityId::Smite)).unwrap();
        assert_eq!(sim.player().ability_level(AbilityId::Smite), 2);

        let chain = Enchant::new(crate::combat::EnchantKind::Chain, 1);
        assert!(sim
            .apply_enhancement(Enhancement::Enchant {
                ability: AbilityId::Meteor,
                enchant: chain,
            })
            .is_err());
        sim.apply_enhancement(Enhancement::Enchant {
            ability: AbilityId::Smite,
            enchant: chain,
        })
        .unwrap();

        sim.apply_enhancement(Enhancement::Modifier(ModifierBoost::MaxHp(20.0))).unwrap();
        assert_eq!(sim.player().max_hp, 120.0);
    }

    #[test]
    fn test_cull_skips_bosses_and_reports_nothing() {
        let mut sim = quiet_sim();
        let far = Vec2::new(5000.0, 0.0);
        let grunt = sim.spawn_enemy(EnemyKind::Shambler, Some(far), Some(false)).unwrap();
        let boss = sim.spawn_enemy(EnemyKind::Warlord, Some(far), Some(false)).unwrap();
        sim.drain_events().for_each(drop);

        sim.tick(0.01);
        assert!(sim.enemy(grunt).is_none());
        assert!(sim.enemy(boss).is_some());
        assert!(!sim.drain_events().any(|e| matches!(e, SimEvent::EnemyKilled(_))));
    }

    #[test]
    fn test_enemy_projectile_hits_player() {
        let mut sim = quiet_sim();
        sim.projectiles.activate(Projectile::enemy(Vec2::new(5.0, 0.0), Vec2::ZERO, 12.0));
        sim.player_mut().hurt_cooldown = 10.0;
        sim.tick(0.01);
        assert_eq!(sim.player().hp, 88.0);
        assert!(sim.projectiles().is_empty());
    }

    #[test]
    fn test_split_spawns_children_on_death() {
        let mut sim = quiet_sim();
        sim.player_mut().modifiers.crit_chance = 0.0;
        let id = sim
            .spawn_enemy(EnemyKind::Splitter, Some(Vec2::new(400.0, 0.0)), Some(false))
            .unwrap();
        let hp = sim.enemy(id).unwrap().hp;

        let outcome = sim
            .resolve_hit(PendingHit {
                target: id,
                source: crate::combat::HitSource::new(hp, Vec2::ZERO),
            })
            .unwrap();
        assert!(outcome.killed);

        sim.tick(0.01);
        let (child, count) = EnemyKind::Splitter.split_into().unwrap();
        assert_eq!(
            sim.enemies().iter().filter(|(_, e)| e.kind == child).count(),
            count as usize
        );
    }
}
