//! Wave director: spawn scheduling, filler, swarm rushes, bosses, and wave
//! progression
//!
//! Idle -> Active -> Intermission -> Active -> ... -> Complete. Filler and
//! swarm rushes run alongside whichever wave phase is current.

use std::f32::consts::TAU;

use glam::Vec2;
use horde_core::math::point_on_circle;
use horde_core::Pool;
use rand::Rng;
use tracing::{debug, info, trace};

use super::{WaveDefinition, WaveTable};
use crate::combat::roll_chance;
use crate::config::DirectorConfig;
use crate::enemy::{EnemyId, EnemyInstance, EnemyKind};
use crate::events::{EventQueue, SimEvent};
use crate::SimRng;

/// Radius minions and split children scatter around their origin
pub const CLUSTER_RADIUS: f32 = 24.0;

/// The parts of the world spawning touches
pub struct SpawnWorld<'a> {
    pub enemies: &'a mut Pool<EnemyInstance>,
    pub events: &'a mut EventQueue,
    pub rng: &'a mut SimRng,
    pub player_position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectorPhase {
    Idle,
    Active { elapsed: f32 },
    Intermission { remaining: f32 },
    Complete,
}

/// Spawn bookkeeping for one group of the current wave
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupProgress {
    pub spawned: u32,
    pub accumulator: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct BossProgress {
    spawned: Option<EnemyId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct FillerState {
    accumulator: f32,
    rotation: usize,
    burst_cooldown: f32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveRush {
    remaining: f32,
    angle: f32,
    accumulator: f32,
    rotation: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct SwarmState {
    next_in: f32,
    active: Option<ActiveRush>,
}

#[derive(Debug, Clone)]
pub struct WaveDirector {
    table: WaveTable,
    config: DirectorConfig,
    phase: DirectorPhase,
    wave_index: usize,
    groups: Vec<GroupProgress>,
    boss: BossProgress,
    filler: FillerState,
    swarm: SwarmState,
    all_waves_complete: bool,
}

impl WaveDirector {
    pub fn new(table: WaveTable, config: DirectorConfig) -> Self {
        Self {
            table,
            config,
            phase: DirectorPhase::Idle,
            wave_index: 0,
            groups: Vec::new(),
            boss: BossProgress::default(),
            filler: FillerState::default(),
            swarm: SwarmState::default(),
            all_waves_complete: false,
        }
    }

    pub fn phase(&self) -> DirectorPhase {
        self.phase
    }

    pub fn table(&self) -> &WaveTable {
        &self.table
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn all_waves_complete(&self) -> bool {
        self.all_waves_complete
    }

    pub fn group_progress(&self) -> &[GroupProgress] {
        &self.groups
    }

    /// The wave being played (or just cleared). 0 before `start`.
    pub fn current_wave(&self) -> u32 {
        match self.phase {
            DirectorPhase::Idle => 0,
            _ => self.current_definition().map_or(self.table.len() as u32, |def| def.wave),
        }
    }

    pub fn current_definition(&self) -> Option<&WaveDefinition> {
        self.table.waves().get(self.wave_index)
    }

    pub fn boss_id(&self) -> Option<EnemyId> {
        self.boss.spawned
    }

    /// Begin wave 1
    pub fn start(&mut self, world: &mut SpawnWorld<'_>) {
        if self.phase != DirectorPhase::Idle {
            return;
        }
        self.schedule_rush(world.rng);
        self.begin_wave(0, world);
    }

    pub fn update(&mut self, dt: f32, world: &mut SpawnWorld<'_>) {
        match self.phase {
            DirectorPhase::Idle | DirectorPhase::Complete => return,
            DirectorPhase::Active { elapsed } => {
                let elapsed = elapsed + dt;
                self.phase = DirectorPhase::Active { elapsed };
                self.spawn_groups(elapsed, dt, world);
                self.update_boss(elapsed, world);

                let duration = self.current_definition().map_or(0.0, WaveDefinition::duration_secs);
                if elapsed >= duration && self.boss_defeated(world.enemies) {
                    self.clear_wave(world);
                }
            }
            DirectorPhase::Intermission { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.begin_wave(self.wave_index + 1, world);
                } else {
                    self.phase = DirectorPhase::Intermission { remaining };
                }
            }
        }

        if self.phase != DirectorPhase::Complete {
            self.update_filler(dt, world);
            self.update_swarm(dt, world);
        }
    }

    /// Spawn one enemy scaled to the current wave. `position` defaults to a
    /// random point on the spawn ring, `elite` to a roll against the elite
    /// chance. Returns `None` when the active cap or the pool is full.
    pub fn spawn_enemy(
        &mut self,
        world: &mut SpawnWorld<'_>,
        kind: EnemyKind,
        position: Option<Vec2>,
        elite: Option<bool>,
    ) -> Option<EnemyId> {
        spawn_scaled(&self.config, self.current_wave().max(1), world, kind, position, elite)
    }

    /// Spawn up to `count` non-elite enemies clustered around `around`.
    /// Returns how many actually spawned.
    pub fn spawn_around(
        &mut self,
        world: &mut SpawnWorld<'_>,
        kind: EnemyKind,
        count: u32,
        around: Vec2,
    ) -> u32 {
        let mut spawned = 0;
        for _ in 0..count {
            let angle = world.rng.gen_range(0.0..TAU);
            let distance = world.rng.gen_range(0.0..=CLUSTER_RADIUS);
            let position = point_on_circle(around, distance, angle);
            if self.spawn_enemy(world, kind, Some(position), Some(false)).is_none() {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    fn begin_wave(&mut self, index: usize, world: &mut SpawnWorld<'_>) {
        self.wave_index = index;
        let Some(def) = self.table.waves().get(index) else {
            self.complete(world);
            return;
        };

        self.groups = vec![GroupProgress::default(); def.groups.len()];
        self.boss = BossProgress::default();
        self.phase = DirectorPhase::Active { elapsed: 0.0 };

        info!(
            "Wave {} started{}",
            def.wave,
            if def.is_boss_wave() { " (boss wave)" } else { "" }
        );
        world.events.push(SimEvent::WaveStarted {
            wave: def.wave,
            boss_wave: def.is_boss_wave(),
        });
    }

    fn clear_wave(&mut self, world: &mut SpawnWorld<'_>) {
        let wave = self.current_wave();
        info!("Wave {} cleared", wave);
        world.events.push(SimEvent::WaveCleared { wave });

        if self.wave_index + 1 >= self.table.len() {
            self.wave_index += 1;
            self.complete(world);
        } else {
            self.phase = DirectorPhase::Intermission {
                remaining: self.config.intermission,
            };
        }
    }

    fn complete(&mut self, world: &mut SpawnWorld<'_>) {
        if self.all_waves_complete {
            return;
        }
        self.all_waves_complete = true;
        self.phase = DirectorPhase::Complete;
        self.swarm.active = None;
        info!("All waves complete");
        world.events.push(SimEvent::GameWon);
    }

    fn spawn_groups(&mut self, elapsed: f32, dt: f32, world: &mut SpawnWorld<'_>) {
        let Some(def) = self.table.waves().get(self.wave_index) else {
            return;
        };
        let wave = def.wave;
        let elapsed_ms = elapsed * 1000.0;

        for (group, progress) in def.groups.iter().zip(self.groups.iter_mut()) {
            if elapsed_ms < group.delay_ms as f32 || progress.spawned >= group.count {
                continue;
            }

            progress.accumulator += group.spawn_rate * dt;
            let due = (progress.accumulator.floor() as u32).min(group.count - progress.spawned);

            let mut spawned = 0;
            for _ in 0..due {
                if spawn_scaled(&self.config, wave, world, group.kind, None, None).is_none() {
                    break;
                }
                spawned += 1;
            }
            progress.spawned += spawned;
            progress.accumulator -= spawned as f32;
        }
    }

    fn update_boss(&mut self, elapsed: f32, world: &mut SpawnWorld<'_>) {
        let Some(def) = self.table.waves().get(self.wave_index) else {
            return;
        };
        let Some(boss) = def.boss else {
            return;
        };
        if self.boss.spawned.is_some() || elapsed < self.config.boss_delay {
            return;
        }
        if world.enemies.len() >= self.config.max_active {
            trace!("Boss spawn deferred, active cap reached");
            return;
        }

        let position = ring_position(world, self.config.spawn_radius);
        let wave = def.wave;
        let Some(id) = world
            .enemies
            .activate_with(|id| EnemyInstance::spawn_boss(id, boss.kind, position, wave, boss.hp))
        else {
            trace!("Boss spawn deferred, enemy pool full");
            return;
        };

        self.boss.spawned = Some(id);
        info!("Boss {} spawned with {} HP", boss.kind.name(), boss.hp);
        world.events.push(SimEvent::EnemySpawned {
            id,
            kind: boss.kind,
            position,
            elite: false,
        });
        world.events.push(SimEvent::BossSpawned {
            id,
            kind: boss.kind,
            hp: boss.hp,
        });
    }

    /// True for non-boss waves, and for boss waves once the boss has spawned and died
    fn boss_defeated(&self, enemies: &Pool<EnemyInstance>) -> bool {
        let boss_wave = self.current_definition().is_some_and(WaveDefinition::is_boss_wave);
        if !boss_wave {
            return true;
        }
        self.boss.spawned.is_some_and(|id| !enemies.contains(id))
    }

    fn update_filler(&mut self, dt: f32, world: &mut SpawnWorld<'_>) {
        let Some(filler) = &self.config.filler else {
            return;
        };
        if filler.kinds.is_empty() {
            return;
        }
        let wave = self.current_wave().max(1);
        self.filler.burst_cooldown = (self.filler.burst_cooldown - dt).max(0.0);

        if world.enemies.len() < filler.low_threshold && self.filler.burst_cooldown <= 0.0 {
            debug!("Filler burst of {}", filler.burst_count);
            for _ in 0..filler.burst_count {
                let kind = filler.kinds[self.filler.rotation % filler.kinds.len()];
                self.filler.rotation += 1;
                if spawn_scaled(&self.config, wave, world, kind, None, None).is_none() {
                    break;
                }
            }
            self.filler.burst_cooldown = filler.burst_cooldown;
            return;
        }

        self.filler.accumulator += filler.rate(wave) * dt;
        while self.filler.accumulator >= 1.0 {
            let kind = filler.kinds[self.filler.rotation % filler.kinds.len()];
            if spawn_scaled(&self.config, wave, world, kind, None, None).is_none() {
                self.filler.accumulator = self.filler.accumulator.min(1.0);
                break;
            }
            self.filler.rotation += 1;
            self.filler.accumulator -= 1.0;
        }
    }

    fn schedule_rush(&mut self, rng: &mut SimRng) {
        if let Some(rush) = &self.config.swarm_rush {
            self.swarm.next_in = rng.gen_range(rush.min_interval..=rush.max_interval);
        }
    }

    fn update_swarm(&mut self, dt: f32, world: &mut SpawnWorld<'_>) {
        let Some(config) = &self.config.swarm_rush else {
            return;
        };
        let wave = self.current_wave().max(1);

        if self.swarm.active.is_none() {
            self.swarm.next_in -= dt;
            if self.swarm.next_in <= 0.0 {
                let angle = world.rng.gen_range(0.0..TAU);
                let duration = world.rng.gen_range(config.min_duration..=config.max_duration);
                self.swarm.active = Some(ActiveRush {
                    remaining: duration,
                    angle,
                    accumulator: 0.0,
                    rotation: 0,
                });
                info!("Swarm rush for {:.1}s", duration);
                world.events.push(SimEvent::SwarmRushStarted { angle, duration });
            }
            return;
        }
        let Some(rush) = &mut self.swarm.active else {
            return;
        };

        rush.remaining -= dt;
        rush.accumulator += config.rate * dt;
        while rush.accumulator >= 1.0 && !config.kinds.is_empty() {
            rush.accumulator -= 1.0;
            let kind = config.kinds[rush.rotation % config.kinds.len()];
            rush.rotation += 1;
            let angle = rush.angle + world.rng.gen_range(-config.spread..=config.spread);
            let position = point_on_circle(world.player_position, self.config.spawn_radius, angle);
            if spawn_scaled(&self.config, wave, world, kind, Some(position), None).is_none() {
                break;
            }
        }

        if rush.remaining <= 0.0 {
            debug!("Swarm rush ended");
            self.swarm.active = None;
            self.swarm.next_in = world.rng.gen_range(config.min_interval..=config.max_interval);
        }
    }
}

fn ring_position(world: &mut SpawnWorld<'_>, radius: f32) -> Vec2 {
    let angle = world.rng.gen_range(0.0..TAU);
    point_on_circle(world.player_position, radius, angle)
}

fn spawn_scaled(
    config: &DirectorConfig,
    wave: u32,
    world: &mut SpawnWorld<'_>,
    kind: EnemyKind,
    position: Option<Vec2>,
    elite: Option<bool>,
) -> Option<EnemyId> {
    if world.enemies.len() >= config.max_active {
        trace!("Spawn of {} dropped, active cap reached", kind.name());
        return None;
    }

    let position = match position {
        Some(position) => position,
        None => ring_position(world, config.spawn_radius),
    };
    let elite = match elite {
        Some(elite) => elite,
        None => roll_chance(world.rng, config.elite.chance(wave)),
    };

    let id = world
        .enemies
        .activate_with(|id| EnemyInstance::spawn(id, kind, position, wave, elite))?;
    world.events.push(SimEvent::EnemySpawned {
        id,
        kind,
        position,
        elite,
    });
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FillerConfig, SwarmRushConfig};
    use crate::wave::{BossSpec, SpawnGroup, WaveDefinition};
    use rand::SeedableRng;

    struct Arena {
        enemies: Pool<EnemyInstance>,
        events: EventQueue,
        rng: SimRng,
    }

    impl Arena {
        fn new(capacity: usize) -> Self {
            Self {
                enemies: Pool::with_capacity(capacity),
                events: EventQueue::new(),
                rng: SimRng::seed_from_u64(3),
            }
        }

        fn world(&mut self) -> SpawnWorld<'_> {
            SpawnWorld {
                enemies: &mut self.enemies,
                events: &mut self.events,
                rng: &mut self.rng,
                player_position: Vec2::ZERO,
            }
        }

        fn count(&self, pred: impl Fn(&SimEvent) -> bool) -> usize {
            self.events.iter().filter(|e| pred(e)).count()
        }
    }

    fn one_wave(groups: Vec<SpawnGroup>, boss: Option<BossSpec>, duration_ms: u32) -> WaveTable {
        WaveTable::new(vec![WaveDefinition {
            wave: 1,
            duration_ms,
            groups,
            boss,
        }])
        .unwrap()
    }

    fn waves_only(max_active: usize) -> DirectorConfig {
        DirectorConfig {
            max_active,
            ..DirectorConfig::waves_only()
        }
    }

    #[test]
    fn test_accumulator_spawns_floor() {
        let table = one_wave(vec![SpawnGroup::new(EnemyKind::Shambler, 10, 2.0, 0)], None, 60_000);
        let mut director = WaveDirector::new(table, waves_only(100));
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(0.25, &mut arena.world());
        assert_eq!(arena.enemies.len(), 0);
        director.update(0.25, &mut arena.world());
        assert_eq!(arena.enemies.len(), 1);
        director.update(1.0, &mut arena.world());
        assert_eq!(arena.enemies.len(), 3);
    }

    #[test]
    fn test_group_capped_by_count() {
        let table = one_wave(vec![SpawnGroup::new(EnemyKind::Shambler, 5, 100.0, 0)], None, 60_000);
        let mut director = WaveDirector::new(table, waves_only(100));
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(1.0, &mut arena.world());
        director.update(1.0, &mut arena.world());
        assert_eq!(arena.enemies.len(), 5);
        assert_eq!(director.group_progress()[0].spawned, 5);
    }

    #[test]
    fn test_delay_gates_group() {
        let groups = vec![SpawnGroup::new(EnemyKind::Runner, 5, 10.0, 2_000)];
        let table = one_wave(groups, None, 60_000);
        let mut director = WaveDirector::new(table, waves_only(100));
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(1.5, &mut arena.world());
        assert!(arena.enemies.is_empty());
        director.update(1.0, &mut arena.world());
        assert!(!arena.enemies.is_empty());
    }

    #[test]
    fn test_active_cap_and_pool_exhaustion_are_silent() {
        let groups = vec![SpawnGroup::new(EnemyKind::Shambler, 50, 100.0, 0)];
        let table = one_wave(groups, None, 60_000);
        let mut director = WaveDirector::new(table, waves_only(8));
        let mut arena = Arena::new(4);

        director.start(&mut arena.world());
        director.update(1.0, &mut arena.world());
        assert_eq!(arena.enemies.len(), 4);
        assert!(director
            .spawn_enemy(&mut arena.world(), EnemyKind::Brute, None, None)
            .is_none());
    }

    #[test]
    fn test_boss_hp_override_and_single_spawn() {
        let boss = BossSpec {
            kind: EnemyKind::Warlord,
            hp: 3000.0,
        };
        let table = one_wave(Vec::new(), Some(boss), 1_000);
        let config = DirectorConfig {
            boss_delay: 2.0,
            ..waves_only(100)
        };
        let mut director = WaveDirector::new(table, config);
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(1.0, &mut arena.world());
        assert!(director.boss_id().is_none());
        for _ in 0..10 {
            director.update(1.0, &mut arena.world());
        }

        let id = director.boss_id().unwrap();
        let instance = arena.enemies.get(id).unwrap();
        assert_eq!(instance.hp, 3000.0);
        assert_eq!(instance.max_hp, 3000.0);
        assert_eq!(arena.count(|e| matches!(e, SimEvent::BossSpawned { .. })), 1);
        // duration has passed but the boss still lives
        assert!(matches!(director.phase(), DirectorPhase::Active { .. }));

        arena.enemies.deactivate(id);
        director.update(0.1, &mut arena.world());
        assert!(director.all_waves_complete());
        assert_eq!(arena.count(|e| *e == SimEvent::GameWon), 1);
    }

    #[test]
    fn test_progression_and_game_won() {
        let table = WaveTable::new(vec![
            WaveDefinition {
                wave: 1,
                duration_ms: 1_000,
                groups: Vec::new(),
                boss: None,
            },
            WaveDefinition {
                wave: 2,
                duration_ms: 1_000,
                groups: Vec::new(),
                boss: None,
            },
        ])
        .unwrap();
        let config = DirectorConfig {
            intermission: 0.5,
            ..waves_only(100)
        };
        let mut director = WaveDirector::new(table, config);
        let mut arena = Arena::new(10);

        assert_eq!(director.current_wave(), 0);
        director.start(&mut arena.world());
        assert_eq!(director.current_wave(), 1);

        director.update(1.0, &mut arena.world());
        assert!(matches!(director.phase(), DirectorPhase::Intermission { .. }));
        director.update(0.5, &mut arena.world());
        assert_eq!(director.current_wave(), 2);
        director.update(1.0, &mut arena.world());
        assert_eq!(director.phase(), DirectorPhase::Complete);

        let started: Vec<u32> = arena
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::WaveStarted { wave, .. } => Some(*wave),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![1, 2]);
        assert_eq!(arena.count(|e| *e == SimEvent::GameWon), 1);

        // nothing happens once complete
        director.update(10.0, &mut arena.world());
        assert_eq!(arena.count(|e| *e == SimEvent::GameWon), 1);
    }

    #[test]
    fn test_filler_bursts_when_quiet() {
        let table = one_wave(Vec::new(), None, 60_000);
        let config = DirectorConfig {
            filler: Some(FillerConfig::default()),
            ..waves_only(100)
        };
        let burst = FillerConfig::default().burst_count as usize;
        let mut director = WaveDirector::new(table, config);
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(0.1, &mut arena.world());
        assert_eq!(arena.enemies.len(), burst);
    }

    #[test]
    fn test_swarm_rush_fires_and_reschedules() {
        let table = one_wave(Vec::new(), None, 600_000);
        let rush = SwarmRushConfig {
            min_interval: 1.0,
            max_interval: 1.0,
            min_duration: 2.0,
            max_duration: 2.0,
            rate: 5.0,
            ..SwarmRushConfig::default()
        };
        let config = DirectorConfig {
            swarm_rush: Some(rush),
            ..waves_only(100)
        };
        let mut director = WaveDirector::new(table, config);
        let mut arena = Arena::new(100);

        director.start(&mut arena.world());
        director.update(1.0, &mut arena.world());
        assert_eq!(arena.count(|e| matches!(e, SimEvent::SwarmRushStarted { .. })), 1);

        for _ in 0..4 {
            director.update(0.5, &mut arena.world());
        }
        assert_eq!(arena.enemies.len(), 10);
        assert!(arena
            .enemies
            .iter()
            .all(|(_, e)| matches!(e.kind, EnemyKind::Swarmer | EnemyKind::Runner)));

        director.update(1.0, &mut arena.world());
        assert_eq!(arena.count(|e| matches!(e, SimEvent::SwarmRushStarted { .. })), 2);
    }

    #[test]
    fn test_elite_override() {
        let table = one_wave(Vec::new(), None, 60_000);
        let mut director = WaveDirector::new(table, waves_only(100));
        let mut arena = Arena::new(10);
        director.start(&mut arena.world());

        let id = director
            .spawn_enemy(&mut arena.world(), EnemyKind::Brute, Some(Vec2::ONE), Some(true))
            .unwrap();
        let enemy = arena.enemies.get(id).unwrap();
        assert!(enemy.elite);
        assert_eq!(enemy.position, Vec2::ONE);
    }
}
