//! Battle arena and fixed-tick orchestrator.
//!
//! The battle owns every unit and projectile and advances them in a fixed
//! phase order:
//!
//! 1. **Cooldowns** - every weapon counts down one tick
//! 2. **Units** - path steering, then power/heat/motion state machines, then
//!    the resulting displacement
//! 3. **Weapons** - queued triggers, then due salvo launches
//! 4. **Projectiles** - guidance, movement and lifespan
//! 5. **Collisions** - hits, damage, removal of destroyed units and spent
//!    projectiles
//!
//! Later phases read state written by earlier ones: a mech that overheats
//! in phase 2 cannot fire in phase 3 of the same tick.
//!
//! # Determinism
//!
//! - Iteration is always in sorted [`EntityId`] order
//! - No system randomness: each projectile is seeded from the battle seed
//!   and its own id
//! - Same inputs always produce the same [`Battle::state_hash`]
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use mech_core::battle::{Battle, SpawnParams};
//! use mech_core::config::SimConfig;
//! use mech_core::entity::EntityState;
//! use mech_core::units::{UnitState, UnitVariant, Vehicle};
//!
//! let mut battle = Battle::new(SimConfig::default(), 7);
//! let unit = UnitState::new("Scout", EntityState::new(DVec2::ZERO, 10.0, 5.0));
//! let id = battle.spawn_unit(
//!     UnitVariant::Vehicle(Vehicle::new(unit)),
//!     SpawnParams { team: 1, ..Default::default() },
//! );
//!
//! battle.tick();
//! assert_eq!(battle.get_tick(), 1);
//! assert!(battle.unit(id).is_some());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::SimConfig;
use crate::data::UnitData;
use crate::entity::{Entity, EntityId, EntityState};
use crate::error::{Result, SimError};
use crate::math::segment_distance;
use crate::pathfinding::PathFollower;
use crate::projectile::Projectile;
use crate::units::{Mech, PowerState, Unit, UnitVariant};
use crate::weapon::Launch;

/// Id-keyed storage with deterministic iteration via [`sorted_ids`](Self::sorted_ids).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStorage<T> {
    entities: HashMap<EntityId, T>,
}

impl<T> Default for EntityStorage<T> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }
}

impl<T> EntityStorage<T> {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under an id allocated by the battle.
    pub fn insert(&mut self, id: EntityId, value: T) {
        self.entities.insert(id, value);
    }

    /// Remove by id.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entities.remove(&id)
    }

    /// Look up by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Look up mutably by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)
    }

    /// Check if an id is present.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids in ascending order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.entities.iter()
    }
}

/// Placement and allegiance for a newly spawned unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnParams {
    /// Horizontal position.
    pub position: DVec2,
    /// Elevation.
    pub position_z: f64,
    /// Facing.
    pub heading: f64,
    /// Team. Units never damage their own team.
    pub team: u32,
    /// Player-controlled flag.
    pub is_player: bool,
}

/// A projectile leaving a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotEvent {
    /// Firing unit.
    pub unit: EntityId,
    /// Armament index.
    pub weapon: usize,
    /// New projectile.
    pub projectile: EntityId,
}

/// A projectile striking a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    /// Projectile that hit.
    pub projectile: EntityId,
    /// Unit that fired it, if known.
    pub source: Option<EntityId>,
    /// Unit that was struck.
    pub target: EntityId,
    /// Damage applied.
    pub damage: f64,
    /// Whether the shot had decayed into extreme range.
    pub extreme_range: bool,
}

/// A mech changing power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerTransition {
    /// The mech.
    pub unit: EntityId,
    /// State before the tick.
    pub from: PowerState,
    /// State after the tick.
    pub to: PowerState,
}

/// Events generated during one tick, for effects, audio and HUD layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// Projectiles launched.
    pub shots: Vec<ShotEvent>,
    /// Projectile hits.
    pub hits: Vec<HitEvent>,
    /// Units destroyed and removed.
    pub destroyed: Vec<EntityId>,
    /// Projectiles that ran out of lifespan without hitting.
    pub expired: Vec<EntityId>,
    /// Mech power state changes.
    pub power_transitions: Vec<PowerTransition>,
}

/// The authoritative battle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battle {
    tick: u64,
    seed: u64,
    next_id: u64,
    config: SimConfig,
    units: EntityStorage<UnitVariant>,
    projectiles: EntityStorage<Projectile>,
    followers: BTreeMap<EntityId, PathFollower>,
    queued_triggers: Vec<(EntityId, usize)>,
}

impl Battle {
    /// Create an empty battle. `seed` drives every projectile's RNG.
    #[must_use]
    pub fn new(config: SimConfig, seed: u64) -> Self {
        Self {
            tick: 0,
            seed,
            next_id: 1,
            config,
            units: EntityStorage::new(),
            projectiles: EntityStorage::new(),
            followers: BTreeMap::new(),
            queued_triggers: Vec::new(),
        }
    }

    /// Ticks elapsed.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Battle seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulation configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// All units.
    #[must_use]
    pub fn units(&self) -> &EntityStorage<UnitVariant> {
        &self.units
    }

    /// All projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &EntityStorage<Projectile> {
        &self.projectiles
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&UnitVariant> {
        self.units.get(id)
    }

    /// Look up a unit mutably, for steering and turret control.
    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut UnitVariant> {
        self.units.get_mut(id)
    }

    /// Look up a projectile.
    #[must_use]
    pub fn projectile(&self, id: EntityId) -> Option<&Projectile> {
        self.projectiles.get(id)
    }

    /// Look up any entity's spatial record.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityState> {
        self.units
            .get(id)
            .map(Entity::entity)
            .or_else(|| self.projectiles.get(id).map(Entity::entity))
    }

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place a unit in the battle and return its id.
    pub fn spawn_unit(&mut self, mut unit: UnitVariant, params: SpawnParams) -> EntityId {
        let id = self.alloc_id();
        let state = unit.unit_mut();
        state.team = params.team;
        state.is_player = params.is_player;
        state.entity.position = params.position;
        state.entity.position_z = params.position_z.max(0.0);
        state.entity.set_heading(params.heading);
        trace!(unit = %id, name = %state.name, team = params.team, "Unit spawned");
        self.units.insert(id, unit);
        id
    }

    /// Build a unit from a resource description and spawn it.
    ///
    /// # Errors
    ///
    /// Propagates construction errors from [`UnitVariant::from_data`].
    pub fn spawn_from_data(&mut self, data: &UnitData, params: SpawnParams) -> Result<EntityId> {
        let unit = UnitVariant::from_data(data, &self.config)?;
        Ok(self.spawn_unit(unit, params))
    }

    /// Remove a unit without destroying it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if the unit doesn't exist.
    pub fn despawn_unit(&mut self, id: EntityId) -> Result<UnitVariant> {
        self.followers.remove(&id);
        self.units.remove(id).ok_or(SimError::EntityNotFound(id))
    }

    fn require_unit(&mut self, id: EntityId) -> Result<&mut UnitVariant> {
        self.units.get_mut(id).ok_or(SimError::EntityNotFound(id))
    }

    /// Designate a unit's target. The target is not required to exist.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if the unit doesn't exist.
    pub fn set_target(&mut self, unit: EntityId, target: Option<EntityId>) -> Result<()> {
        self.require_unit(unit)?.set_target(target);
        Ok(())
    }

    /// Queue a weapon trigger for the next tick's weapon phase.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] for an unknown unit or
    /// [`SimError::InvalidWeaponIndex`] for a bad index.
    pub fn queue_trigger(&mut self, unit: EntityId, index: usize) -> Result<()> {
        let u = self.require_unit(unit)?;
        let count = u.armament().len();
        if index >= count {
            return Err(SimError::InvalidWeaponIndex {
                unit: u.name().to_owned(),
                index,
                count,
            });
        }
        self.queued_triggers.push((unit, index));
        Ok(())
    }

    /// Queue every weapon that is ready to fire.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] for an unknown unit.
    pub fn queue_ready_weapons(&mut self, unit: EntityId) -> Result<usize> {
        let u = self.require_unit(unit)?;
        let ready: Vec<usize> = u
            .armament()
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_ready())
            .map(|(i, _)| i)
            .collect();
        let count = ready.len();
        self.queued_triggers.extend(ready.into_iter().map(|i| (unit, i)));
        Ok(count)
    }

    /// Start steering a unit along waypoints.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] if the unit doesn't exist.
    pub fn set_path(&mut self, unit: EntityId, follower: PathFollower) -> Result<()> {
        self.require_unit(unit)?;
        self.followers.insert(unit, follower);
        Ok(())
    }

    /// Active path follower for a unit.
    #[must_use]
    pub fn path(&self, unit: EntityId) -> Option<&PathFollower> {
        self.followers.get(&unit)
    }

    /// Request a manual mech shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] or [`SimError::NotAMech`].
    pub fn power_off(&mut self, id: EntityId) -> Result<()> {
        mech_mut(&mut self.units, id)?.power_off(&self.config);
        Ok(())
    }

    /// Request a mech power-up.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] or [`SimError::NotAMech`].
    pub fn power_on(&mut self, id: EntityId) -> Result<()> {
        mech_mut(&mut self.units, id)?.power_on(&self.config);
        Ok(())
    }

    /// Fire or cut a mech's jump jets. Returns the resulting jet state.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EntityNotFound`] or [`SimError::NotAMech`].
    pub fn set_jump_jets(&mut self, id: EntityId, active: bool) -> Result<bool> {
        Ok(mech_mut(&mut self.units, id)?.set_jump_jets_active(active))
    }

    /// Teams that still have at least one unit.
    #[must_use]
    pub fn teams_alive(&self) -> BTreeSet<u32> {
        self.units.iter().map(|(_, u)| u.unit().team).collect()
    }

    /// Collision-volume centers of every unit.
    fn unit_centers(&self) -> HashMap<EntityId, DVec3> {
        self.units
            .iter()
            .map(|(&id, u)| {
                let e = u.entity();
                let (lo, hi) = e.vertical_extent();
                (id, e.position.extend((lo + hi) / 2.0))
            })
            .collect()
    }

    /// Advance the battle by one tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        let unit_ids = self.units.sorted_ids();

        // 1. Cooldowns
        for &id in &unit_ids {
            if let Some(unit) = self.units.get_mut(id) {
                unit.decrease_cooldowns(1.0);
            }
        }

        // 2. Units
        self.run_unit_phase(&unit_ids, &mut events);

        // 3. Weapons
        self.run_weapon_phase(&unit_ids, &mut events);

        // 4. Projectiles
        let sweeps = self.run_projectile_phase();

        // 5. Collisions and removal
        self.run_collision_phase(&unit_ids, &sweeps, &mut events);

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            debug!(tick = self.tick, state_hash = hash, "Battle state hash");
        }

        events
    }

    fn run_unit_phase(&mut self, unit_ids: &[EntityId], events: &mut TickEvents) {
        for &id in unit_ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };

            if let Some(follower) = self.followers.get_mut(&id) {
                follower.steer(unit);
                if follower.is_finished() {
                    self.followers.remove(&id);
                }
            }

            let before = unit.power_state();
            if unit.update(&self.config) {
                let delta = unit.motion_delta();
                let e = unit.entity_mut();
                e.position += delta.truncate();
                e.position_z = (e.position_z + delta.z).max(0.0);
            }
            let after = unit.power_state();

            if let (Some(from), Some(to)) = (before, after) {
                if from != to {
                    debug!(unit = %id, ?from, ?to, "Mech power transition");
                    events.power_transitions.push(PowerTransition { unit: id, from, to });
                }
            }
        }
    }

    fn run_weapon_phase(&mut self, unit_ids: &[EntityId], events: &mut TickEvents) {
        for (id, index) in std::mem::take(&mut self.queued_triggers) {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            match unit.trigger_weapon(index) {
                Ok(true) => trace!(unit = %id, weapon = index, "Weapon triggered"),
                Ok(false) => {}
                Err(err) => trace!(unit = %id, %err, "Trigger dropped"),
            }
        }

        let centers = self.unit_centers();
        for &id in unit_ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            if !unit.can_fire() {
                for weapon in &mut unit.unit_mut().armament {
                    if weapon.salvo_pending() {
                        trace!(unit = %id, weapon = %weapon.short_name, "Salvo cancelled");
                        weapon.cancel_salvo();
                    }
                }
                continue;
            }
            let origin = unit.unit().cockpit_position();
            let heading = unit.unit().fire_heading();
            let team = unit.unit().team;
            let target = unit.target();
            let pitch = target
                .and_then(|t| centers.get(&t))
                .map_or(0.0, |aim| {
                    let d = *aim - origin;
                    d.z.atan2(d.truncate().length())
                });

            for (index, weapon) in unit.unit_mut().armament.iter_mut().enumerate() {
                for _ in 0..weapon.due_launches() {
                    let pid = EntityId(self.next_id);
                    self.next_id += 1;
                    let projectile = weapon.spawn_projectile(&Launch {
                        origin: origin.truncate(),
                        origin_z: origin.z,
                        heading,
                        pitch,
                        parent: id,
                        team,
                        target,
                        seed: projectile_seed(self.seed, pid),
                    });
                    trace!(unit = %id, weapon = %weapon.short_name, projectile = %pid, "Projectile spawned");
                    self.projectiles.insert(pid, projectile);
                    events.shots.push(ShotEvent {
                        unit: id,
                        weapon: index,
                        projectile: pid,
                    });
                }
            }
        }
    }

    /// Move every projectile; returns each one's position before the move.
    fn run_projectile_phase(&mut self) -> Vec<(EntityId, DVec3)> {
        let centers = self.unit_centers();
        let ids = self.projectiles.sorted_ids();
        let mut sweeps = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(projectile) = self.projectiles.get_mut(id) else {
                continue;
            };
            let before = projectile.entity.position_3d();
            let target = projectile.target.and_then(|t| centers.get(&t).copied());
            projectile.update(target);
            sweeps.push((id, before));
        }
        sweeps
    }

    fn run_collision_phase(
        &mut self,
        unit_ids: &[EntityId],
        sweeps: &[(EntityId, DVec3)],
        events: &mut TickEvents,
    ) {
        for &(pid, before) in sweeps {
            let Some(projectile) = self.projectiles.get_mut(pid) else {
                continue;
            };
            if projectile.is_destroyed() {
                continue;
            }
            for &uid in unit_ids {
                let Some(unit) = self.units.get_mut(uid) else {
                    continue;
                };
                if unit.unit().team == projectile.team
                    || projectile.entity.parent == Some(uid)
                    || unit.entity().is_destroyed()
                    || !sweep_hits(before, &projectile.entity, unit.entity())
                {
                    continue;
                }

                let damage = projectile.damage();
                unit.apply_damage(damage);
                trace!(projectile = %pid, target = %uid, damage, "Projectile hit");
                events.hits.push(HitEvent {
                    projectile: pid,
                    source: projectile.entity.parent,
                    target: uid,
                    damage,
                    extreme_range: projectile.in_extreme_range(),
                });
                projectile.destroy();
                break;
            }
        }

        for &id in unit_ids {
            let destroyed = self
                .units
                .get(id)
                .is_some_and(|u| u.entity().is_destroyed());
            if destroyed {
                if let Some(unit) = self.units.remove(id) {
                    debug!(unit = %id, name = %unit.name(), "Unit destroyed");
                }
                self.followers.remove(&id);
                events.destroyed.push(id);
            }
        }

        for id in self.projectiles.sorted_ids() {
            let spent = self.projectiles.get(id).map(|p| (p.is_spent(), p.is_destroyed()));
            if let Some((true, destroyed)) = spent {
                self.projectiles.remove(id);
                if !destroyed {
                    events.expired.push(id);
                }
            }
        }
    }

    /// Hash of the full battle state, for desync and determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.next_id.hash(&mut hasher);

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            id.hash(&mut hasher);
            let u = unit.unit();
            u.team.hash(&mut hasher);
            hash_entity(&u.entity, &mut hasher);
            u.heat.to_bits().hash(&mut hasher);
            u.target.hash(&mut hasher);
            u.target_relative_heading.to_bits().hash(&mut hasher);
            u.target_velocity.to_bits().hash(&mut hasher);
            u.turret_angle.to_bits().hash(&mut hasher);
            unit.power_state().hash(&mut hasher);
            for weapon in &u.armament {
                weapon.cooldown().to_bits().hash(&mut hasher);
                if let Some((remaining, delay)) = weapon.salvo() {
                    remaining.hash(&mut hasher);
                    delay.to_bits().hash(&mut hasher);
                }
            }
            for (ammo_type, bin) in u.ammo.iter() {
                ammo_type.hash(&mut hasher);
                bin.count.hash(&mut hasher);
            }
            if let Some(mech) = unit.as_mech() {
                mech.jump_jets_active().hash(&mut hasher);
                mech.jump_jet_duration().to_bits().hash(&mut hasher);
                mech.power_on_timer().hash(&mut hasher);
                mech.power_off_timer().hash(&mut hasher);
            }
        }

        let ids = self.projectiles.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            let Some(p) = self.projectiles.get(id) else {
                continue;
            };
            id.hash(&mut hasher);
            hash_entity(&p.entity, &mut hasher);
            p.team.hash(&mut hasher);
            p.lifespan().to_bits().hash(&mut hasher);
            p.in_extreme_range().hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Encode the battle for replay or save games.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Snapshot`] if encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SimError::Snapshot(format!("Failed to serialize battle: {e}")))
    }

    /// Decode a battle produced by [`snapshot`](Self::snapshot).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Snapshot`] if decoding fails.
    pub fn restore(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SimError::Snapshot(format!("Failed to deserialize battle: {e}")))
    }
}

impl Default for Battle {
    fn default() -> Self {
        Self::new(SimConfig::default(), 0)
    }
}

fn mech_mut(units: &mut EntityStorage<UnitVariant>, id: EntityId) -> Result<&mut Mech> {
    units
        .get_mut(id)
        .ok_or(SimError::EntityNotFound(id))?
        .as_mech_mut()
        .ok_or(SimError::NotAMech(id))
}

fn hash_entity(e: &EntityState, hasher: &mut DefaultHasher) {
    e.position.x.to_bits().hash(hasher);
    e.position.y.to_bits().hash(hasher);
    e.position_z.to_bits().hash(hasher);
    e.heading.to_bits().hash(hasher);
    e.pitch.to_bits().hash(hasher);
    e.velocity.to_bits().hash(hasher);
    e.velocity_z.to_bits().hash(hasher);
    e.armor.to_bits().hash(hasher);
    e.structure.to_bits().hash(hasher);
}

/// Per-projectile RNG seed (splitmix64 over the battle seed and id).
fn projectile_seed(seed: u64, id: EntityId) -> u64 {
    let mut z = seed ^ id.0.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Cylinder test of a projectile's path this tick against a unit.
///
/// Horizontally the projectile sweeps a capsule from `before` to its current
/// position; vertically it covers its collision span at both ends.
fn sweep_hits(before: DVec3, projectile: &EntityState, target: &EntityState) -> bool {
    let reach = projectile.collision_radius + target.collision_radius;
    let path = segment_distance(target.position, before.truncate(), projectile.position);
    if path > reach {
        return false;
    }

    let (lo, hi) = projectile.vertical_extent();
    let below = lo - projectile.position_z;
    let above = hi - projectile.position_z;
    let p_lo = before.z.min(projectile.position_z) + below;
    let p_hi = before.z.max(projectile.position_z) + above;
    let (t_lo, t_hi) = target.vertical_extent();
    p_lo <= t_hi && t_lo <= p_hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::WeaponData;
    use crate::units::{UnitState, Vehicle};
    use crate::weapon::{TechBase, Weapon, WeaponFamily};

    fn laser() -> WeaponData {
        WeaponData {
            name: "Medium Laser".into(),
            short_name: "ML".into(),
            tech_base: TechBase::InnerSphere,
            family: WeaponFamily::Energy,
            tonnage: 1.0,
            damage: 5.0,
            heat: 3.0,
            distance: 300.0,
            extreme_distance: Some(600.0),
            velocity: 600.0,
            cooldown: 1.0,
            projectile_count: 1,
            projectile_delay: 0.0,
            projectile_radius: 0.1,
            projectile_height: 0.1,
            max_velocity: None,
            acceleration: 0.0,
            ammo: None,
            lock_on: None,
        }
    }

    fn hull(name: &str, armor: f64, structure: f64) -> UnitState {
        let entity = EntityState::new(DVec2::ZERO, armor, structure).with_collision(0.5, 1.0);
        let mut unit = UnitState::new(name, entity).with_mobility(0.2, 0.05);
        unit.cockpit_offset = DVec2::new(0.0, 0.5);
        unit
    }

    fn gunner(weapon: &WeaponData) -> UnitVariant {
        let config = SimConfig::default();
        let w = Weapon::from_data(weapon, [0.0, 0.0], &config).unwrap();
        UnitVariant::Vehicle(Vehicle::new(hull("Gunner", 20.0, 10.0).with_weapon(w)))
    }

    fn dummy(armor: f64, structure: f64) -> UnitVariant {
        UnitVariant::Vehicle(Vehicle::new(hull("Target", armor, structure)))
    }

    fn at(x: f64, team: u32) -> SpawnParams {
        SpawnParams {
            position: DVec2::new(x, 0.0),
            team,
            ..Default::default()
        }
    }

    /// Gunner at the origin facing a target 30 units down +x.
    fn duel(target_team: u32, armor: f64, structure: f64) -> (Battle, EntityId, EntityId) {
        let mut battle = Battle::new(SimConfig::default(), 1);
        let shooter = battle.spawn_unit(gunner(&laser()), at(0.0, 1));
        let target = battle.spawn_unit(dummy(armor, structure), at(30.0, target_team));
        battle.set_target(shooter, Some(target)).unwrap();
        (battle, shooter, target)
    }

    #[test]
    fn test_tick_increments() {
        let mut battle = Battle::default();
        assert_eq!(battle.get_tick(), 0);
        battle.tick();
        battle.tick();
        assert_eq!(battle.get_tick(), 2);
    }

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let (mut battle, shooter, target) = duel(2, 20.0, 10.0);
        assert_ne!(shooter, target);
        battle.queue_trigger(shooter, 0).unwrap();
        let events = battle.tick();
        assert_eq!(events.shots.len(), 1);
        let pid = events.shots[0].projectile;
        assert!(pid > target);
        assert!(battle.projectile(pid).is_some());
        assert!(battle.entity(pid).is_some());
    }

    #[test]
    fn test_laser_hits_enemy() {
        let (mut battle, shooter, target) = duel(2, 20.0, 10.0);
        battle.queue_trigger(shooter, 0).unwrap();

        let mut hits = Vec::new();
        for _ in 0..5 {
            hits.extend(battle.tick().hits);
        }
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, target);
        assert_eq!(hits[0].source, Some(shooter));
        assert_eq!(hits[0].damage, 5.0);
        assert!(!hits[0].extreme_range);

        assert_eq!(battle.unit(target).unwrap().entity().armor, 15.0);
        assert!(battle.projectiles().is_empty());
        assert_eq!(battle.unit(shooter).unwrap().heat(), 3.0);
    }

    #[test]
    fn test_no_friendly_fire() {
        let (mut battle, shooter, target) = duel(1, 20.0, 10.0);
        battle.queue_trigger(shooter, 0).unwrap();

        let mut expired = Vec::new();
        for _ in 0..70 {
            let events = battle.tick();
            assert!(events.hits.is_empty());
            expired.extend(events.expired);
        }
        assert_eq!(expired.len(), 1);
        assert_eq!(battle.unit(target).unwrap().entity().armor, 20.0);
    }

    #[test]
    fn test_destroyed_unit_removed() {
        let (mut battle, shooter, target) = duel(2, 0.0, 3.0);
        battle.queue_trigger(shooter, 0).unwrap();

        let mut destroyed = Vec::new();
        for _ in 0..5 {
            destroyed.extend(battle.tick().destroyed);
        }
        assert_eq!(destroyed, vec![target]);
        assert!(battle.unit(target).is_none());
        assert_eq!(battle.teams_alive(), BTreeSet::from([1]));
    }

    #[test]
    fn test_overheated_mech_cannot_fire_same_tick() {
        let config = SimConfig::default();
        let w = Weapon::from_data(&laser(), [0.0, 0.0], &config).unwrap();
        let mut mech = Mech::new(hull("Hot Mech", 20.0, 10.0).with_weapon(w), 0, &config);
        mech.unit.heat = config.heat.overheat_threshold;

        let mut battle = Battle::new(config, 3);
        let id = battle.spawn_unit(UnitVariant::Mech(mech), at(0.0, 1));
        battle.queue_trigger(id, 0).unwrap();

        let events = battle.tick();
        assert!(events.shots.is_empty());
        assert_eq!(
            events.power_transitions,
            vec![PowerTransition {
                unit: id,
                from: PowerState::On,
                to: PowerState::OffHeat,
            }]
        );
        assert_eq!(battle.unit(id).unwrap().armament()[0].cooldown(), 0.0);
    }

    #[test]
    fn test_salvo_spreads_over_ticks() {
        let mut srm = laser();
        srm.family = WeaponFamily::Missile;
        srm.projectile_count = 3;
        srm.projectile_delay = 0.05;

        let mut battle = Battle::new(SimConfig::default(), 9);
        let id = battle.spawn_unit(gunner(&srm), at(0.0, 1));
        battle.queue_trigger(id, 0).unwrap();

        let shots: Vec<usize> = (0..7).map(|_| battle.tick().shots.len()).collect();
        assert_eq!(shots, vec![1, 0, 0, 1, 0, 0, 1]);

        let tubes: BTreeSet<(u64, u64)> = battle
            .projectiles()
            .iter()
            .map(|(_, p)| (p.entity.position.y.to_bits(), p.entity.position_z.to_bits()))
            .collect();
        // each missile left from a different tube
        assert_eq!(tubes.len(), 3);
    }

    #[test]
    fn test_shutdown_cancels_salvo() {
        let config = SimConfig::default();
        let mut srm = laser();
        srm.family = WeaponFamily::Missile;
        srm.projectile_count = 3;
        srm.projectile_delay = 0.05;
        let w = Weapon::from_data(&srm, [0.0, 0.0], &config).unwrap();
        let mut mech = Mech::new(hull("Hot Mech", 20.0, 10.0).with_weapon(w), 0, &config);
        mech.unit.heat = config.heat.overheat_threshold - 1.0;

        let mut battle = Battle::new(config, 4);
        let id = battle.spawn_unit(UnitVariant::Mech(mech), at(0.0, 1));
        battle.queue_trigger(id, 0).unwrap();

        // first missile leaves, the heat pushes the mech over the threshold
        assert_eq!(battle.tick().shots.len(), 1);
        let events = battle.tick();
        assert_eq!(events.power_transitions[0].to, PowerState::OffHeat);
        assert!(events.shots.is_empty());
        assert!(!battle.unit(id).unwrap().armament()[0].salvo_pending());

        for _ in 0..10 {
            assert!(battle.tick().shots.is_empty());
        }
    }

    #[test]
    fn test_hash_tracks_salvo_progress() {
        let mut srm = laser();
        srm.family = WeaponFamily::Missile;
        srm.projectile_count = 3;
        srm.projectile_delay = 0.05;

        let mut battle = Battle::new(SimConfig::default(), 9);
        let id = battle.spawn_unit(gunner(&srm), at(0.0, 1));
        battle.queue_trigger(id, 0).unwrap();
        battle.tick();

        // same salvo, one tick further along
        let mut ahead = battle.clone();
        let weapon = &mut ahead.unit_mut(id).unwrap().unit_mut().armament[0];
        assert_eq!(weapon.due_launches(), 0);
        assert!(weapon.salvo_pending());
        assert_ne!(battle.state_hash(), ahead.state_hash());
    }

    #[test]
    fn test_queue_trigger_validates() {
        let (mut battle, shooter, _) = duel(2, 20.0, 10.0);
        assert!(matches!(
            battle.queue_trigger(shooter, 4),
            Err(SimError::InvalidWeaponIndex { index: 4, count: 1, .. })
        ));
        assert!(matches!(
            battle.queue_trigger(EntityId(999), 0),
            Err(SimError::EntityNotFound(EntityId(999)))
        ));
        assert!(matches!(battle.power_off(shooter), Err(SimError::NotAMech(_))));
    }

    #[test]
    fn test_path_follower_drives_unit() {
        let mut battle = Battle::default();
        let id = battle.spawn_unit(dummy(1.0, 1.0), at(0.5, 1));
        battle
            .set_path(id, PathFollower::new(vec![DVec2::new(5.5, 0.0)], 0.1, 0.25))
            .unwrap();

        for _ in 0..200 {
            battle.tick();
        }
        let pos = battle.unit(id).unwrap().position();
        // arrives, then coasts to a stop
        assert!(pos.x > 5.25 && pos.x < 7.0, "stopped at {pos}");
        assert!(pos.y.abs() < 1e-9);
        assert!(battle.path(id).is_none());
    }

    #[test]
    fn test_deterministic_hash() {
        let run = || {
            let (mut battle, shooter, _) = duel(2, 20.0, 10.0);
            battle.queue_trigger(shooter, 0).unwrap();
            for _ in 0..10 {
                battle.tick();
            }
            battle.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (mut battle, shooter, _) = duel(2, 20.0, 10.0);
        battle.queue_trigger(shooter, 0).unwrap();
        battle.tick();

        let bytes = battle.snapshot().unwrap();
        let mut restored = Battle::restore(&bytes).unwrap();
        assert_eq!(battle.get_tick(), restored.get_tick());
        assert_eq!(battle.state_hash(), restored.state_hash());

        for _ in 0..5 {
            battle.tick();
            restored.tick();
        }
        assert_eq!(battle.state_hash(), restored.state_hash());
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(matches!(Battle::restore(&[1, 2, 3]), Err(SimError::Snapshot(_))));
    }

    #[test]
    fn test_sweep_catches_fast_projectile() {
        let target = EntityState::new(DVec2::new(5.0, 0.0), 1.0, 1.0).with_collision(0.5, 1.0);
        let mut shot = EntityState::default().with_collision(0.1, 0.1);
        shot.position = DVec2::new(10.0, 0.0);
        shot.position_z = 0.5;
        assert!(sweep_hits(DVec3::new(0.0, 0.0, 0.5), &shot, &target));

        shot.position_z = 3.0;
        assert!(!sweep_hits(DVec3::new(0.0, 0.0, 3.0), &shot, &target));
    }
}
