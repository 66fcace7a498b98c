//! Ability engine: owns every granted ability, the live zones, and the
//! shared reposition lock, and dispatches each ability by shape once per tick.
//!
//! Abilities never touch enemy HP. They queue [`PendingHit`]s that the
//! combat phase resolves after the engine has run.

use std::f32::consts::TAU;

use glam::Vec2;
use horde_core::math::{direction_to, point_on_circle, unit_from_angle};
use horde_core::Pool;
use rand::Rng;
use tracing::{info, trace, warn};

use super::{
    familiar, orbital, reposition, Ability, AbilityId, Anchor, HitTemplate, LevelParams, ParamTable,
    ReactiveTrigger, RepositionLock, Shape, ShapeState, Zone,
};
use crate::combat::{Enchant, HitSource, PendingHit};
use crate::enemy::EnemyInstance;
use crate::error::{SimError, SimResult};
use crate::player::PlayerState;
use crate::projectile::Projectile;
use crate::targeting::{enemies_in_radius, nearest_enemy};
use crate::SimRng;

/// Floor on any scaled cooldown, in seconds
pub const MIN_COOLDOWN: f32 = 0.15;
/// How soon a self-heal re-checks after finding the player at full HP
pub const HEAL_PEEK: f32 = 0.5;

/// Cooldown after the player's cooldown multiplier, clamped to [`MIN_COOLDOWN`]
pub fn effective_cooldown(base: f32, player: &PlayerState) -> f32 {
    (base * player.modifiers.cooldown_mult).max(MIN_COOLDOWN)
}

/// The slice of the world abilities read and write during a tick
pub struct AbilityWorld<'a> {
    pub player: &'a mut PlayerState,
    pub enemies: &'a Pool<EnemyInstance>,
    pub projectiles: &'a mut Pool<Projectile>,
    pub rng: &'a mut SimRng,
    /// Output: hits for the combat phase
    pub hits: &'a mut Vec<PendingHit>,
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct AbilityEngine {
    table: ParamTable,
    abilities: Vec<Ability>,
    zones: Vec<Zone>,
    lock: RepositionLock,
}

impl AbilityEngine {
    pub fn new(table: ParamTable) -> Self {
        Self {
            table,
            abilities: Vec::new(),
            zones: Vec::new(),
            lock: RepositionLock::default(),
        }
    }

    pub fn table(&self) -> &ParamTable {
        &self.table
    }

    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    pub fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.id == id)
    }

    pub fn owns(&self, id: AbilityId) -> bool {
        self.ability(id).is_some()
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn lock(&self) -> &RepositionLock {
        &self.lock
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    /// Whether a reposition ability currently owns the player's movement
    pub fn is_repositioning(&self) -> bool {
        self.abilities.iter().any(|a| match &a.state {
            ShapeState::Reposition(state) => state.is_active(),
            _ => false,
        })
    }

    /// Grant `id` at level 1 or raise it by one. Returns the new level.
    ///
    /// An ability with no table entry can be granted but never levelled,
    /// and stays idle.
    pub fn grant_or_level(&mut self, id: AbilityId, player: &mut PlayerState) -> SimResult<u32> {
        let max_level = self.table.max_level(id).unwrap_or(1);

        let level = match self.abilities.iter_mut().find(|a| a.id == id) {
            Some(ability) => {
                if ability.level >= max_level {
                    return Err(SimError::AbilityMaxed(id));
                }
                ability.level += 1;
                if let ShapeState::Orbital(ring) = &mut ability.state {
                    ring.rebuild(ability.level);
                }
                ability.level
            }
            None => {
                if self.table.get(id, 1).is_none() {
                    warn!("{} has no parameter table entry and will stay idle", id.name());
                }
                self.abilities.push(Ability::new(id, player.position));
                1
            }
        };

        player.abilities.insert(id, level);
        info!("{} is now level {}", id.name(), level);
        Ok(level)
    }

    /// Attach `enchant` to an owned ability. The same kind again upgrades
    /// the tier; a different kind replaces it.
    pub fn attach_enchant(&mut self, id: AbilityId, enchant: Enchant) -> SimResult<Enchant> {
        let ability = self
            .abilities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(SimError::AbilityNotOwned(id))?;

        let attached = match ability.enchant {
            Some(current) if current.kind == enchant.kind => {
                Enchant::new(enchant.kind, current.tier.saturating_add(1).max(enchant.tier))
            }
            _ => enchant,
        };
        ability.enchant = Some(attached);
        info!("{} enchanted with {} {}", id.name(), attached.kind.name(), attached.tier);
        Ok(attached)
    }

    /// Run one tick of every ability and zone
    pub fn tick(&mut self, world: &mut AbilityWorld<'_>) {
        let Self {
            table,
            abilities,
            zones,
            lock,
        } = self;

        lock.tick(world.dt);
        tick_zones(zones, world);

        for ability in abilities.iter_mut() {
            let params = table.get(ability.id, ability.level);

            if let ShapeState::Reposition(state) = &mut ability.state {
                reposition::update(state, ability.id, ability.enchant, params, lock, zones, world);
                continue;
            }

            let Some(params) = params else {
                trace!("{} level {} has no params, skipping", ability.id.name(), ability.level);
                continue;
            };
            let template = ability.template(params);
            let shape = ability.shape();

            match &mut ability.state {
                ShapeState::Cooldown { remaining } => {
                    *remaining = (*remaining - world.dt).max(0.0);
                    if *remaining > 0.0 {
                        continue;
                    }
                    let fired = match shape {
                        Shape::InstantPulse(anchor) => pulse(anchor, &template, params, world),
                        Shape::Projectile => fire_projectiles(&template, params, world),
                        Shape::PersistentZone => {
                            zones.push(place_zone(template.ability, params, world));
                            true
                        }
                        _ => false,
                    };
                    if fired {
                        *remaining = effective_cooldown(params.cooldown, world.player);
                    }
                }
                ShapeState::Orbital(ring) => {
                    if ring.len() != ability.level as usize {
                        ring.rebuild(ability.level);
                    }
                    orbital::update(ring, &template, params, world);
                }
                ShapeState::Familiar(state) => {
                    let cooldown = effective_cooldown(params.cooldown, world.player);
                    familiar::update(state, &template, params, cooldown, world);
                }
                ShapeState::SelfHeal { timer } => {
                    *timer -= world.dt;
                    if *timer > 0.0 {
                        continue;
                    }
                    if world.player.is_at_max_hp() {
                        *timer = HEAL_PEEK;
                    } else {
                        world.player.heal(params.heal);
                        *timer = effective_cooldown(params.cooldown, world.player);
                    }
                }
                ShapeState::Reactive { internal_cooldown } => {
                    *internal_cooldown = (*internal_cooldown - world.dt).max(0.0);
                }
                ShapeState::Reposition(_) => {}
            }
        }
    }

    /// The player just took damage
    pub fn on_player_damaged(&mut self, world: &mut AbilityWorld<'_>) -> bool {
        let center = world.player.position;
        self.fire_reactive(ReactiveTrigger::PlayerDamaged, center, world)
    }

    /// The player landed a critical hit at `at`
    pub fn on_critical_hit(&mut self, at: Vec2, world: &mut AbilityWorld<'_>) -> bool {
        self.fire_reactive(ReactiveTrigger::CriticalHit, at, world)
    }

    fn fire_reactive(
        &mut self,
        trigger: ReactiveTrigger,
        center: Vec2,
        world: &mut AbilityWorld<'_>,
    ) -> bool {
        let mut fired = false;
        for ability in self.abilities.iter_mut() {
            if ability.shape() != Shape::Reactive(trigger) {
                continue;
            }
            let Some(params) = self.table.get(ability.id, ability.level) else {
                continue;
            };
            let ShapeState::Reactive { internal_cooldown } = &mut ability.state else {
                continue;
            };
            if *internal_cooldown > 0.0 {
                continue;
            }

            *internal_cooldown = params.internal_cooldown;
            // passive so a reactive burst can never crit into another trigger
            let source = HitSource::passive(params.damage, center)
                .with_ability(ability.id)
                .with_status(params.status());
            for target in enemies_in_radius(world.enemies, center, params.radius) {
                world.hits.push(PendingHit { target, source });
            }
            fired = true;
        }
        fired
    }
}

fn tick_zones(zones: &mut Vec<Zone>, world: &mut AbilityWorld<'_>) {
    for zone in zones.iter_mut() {
        if zone.tick(world.dt) {
            zone.strike(world.enemies, world.hits);
        }
    }
    zones.retain(|zone| !zone.is_expired());
}

/// Returns false when there was nothing to anchor on, leaving the ability ready.
fn pulse(
    anchor: Anchor,
    template: &HitTemplate,
    params: &LevelParams,
    world: &mut AbilityWorld<'_>,
) -> bool {
    let center = match anchor {
        Anchor::Player => world.player.position,
        Anchor::NearestEnemy => {
            match nearest_enemy(world.enemies, world.player.position, params.range, &[]) {
                Some((_, position)) => position,
                None => return false,
            }
        }
        Anchor::RandomNearby => {
            let angle = world.rng.gen_range(0.0..TAU);
            let distance = world.rng.gen_range(0.0..=params.range.max(0.0));
            point_on_circle(world.player.position, distance, angle)
        }
    };

    for target in enemies_in_radius(world.enemies, center, params.radius) {
        world.hits.push(PendingHit {
            target,
            source: template.at(params.damage, center),
        });
    }
    true
}

fn fire_projectiles(
    template: &HitTemplate,
    params: &LevelParams,
    world: &mut AbilityWorld<'_>,
) -> bool {
    let origin = world.player.position;
    let Some((_, target)) = nearest_enemy(world.enemies, origin, params.range, &[]) else {
        return false;
    };
    let aim = direction_to(origin, target).unwrap_or(world.player.facing);
    let base_angle = aim.y.atan2(aim.x);

    let count = params.count.max(1);
    for i in 0..count {
        let offset = if count == 1 {
            0.0
        } else {
            -params.spread / 2.0 + params.spread * i as f32 / (count - 1) as f32
        };
        let velocity = unit_from_angle(base_angle + offset) * params.speed;
        let projectile = Projectile::player(
            template.at(params.damage, origin),
            origin,
            velocity,
            params.radius,
            params.lifetime,
            params.pierce,
        );
        if world.projectiles.activate(projectile).is_none() {
            trace!("Projectile pool exhausted");
            break;
        }
    }
    true
}

/// Zones land on the nearest enemy in range, or under the player
fn place_zone(id: AbilityId, params: &LevelParams, world: &AbilityWorld<'_>) -> Zone {
    let center = nearest_enemy(world.enemies, world.player.position, params.range, &[])
        .map(|(_, position)| position)
        .unwrap_or(world.player.position);
    Zone::from_params(id, center, params)
}
