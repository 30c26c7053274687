//! Combat units: shared unit state, the [`Unit`] capability trait and the
//! concrete variants stored by the battle arena.
//!
//! Every variant embeds a [`UnitState`] by value. Behaviour that differs per
//! kind (power sequencing, flight, immobility) lives in the variant's
//! [`Unit::update`] and [`Unit::motion_delta`]; everything else is provided
//! by the trait on top of the shared state.

// Implements [`Entity`] for a variant wrapping a `unit: UnitState` field.
macro_rules! impl_entity {
    ($ty:ty) => {
        impl $crate::entity::Entity for $ty {
            fn entity(&self) -> &$crate::entity::EntityState {
                &self.unit.entity
            }

            fn entity_mut(&mut self) -> &mut $crate::entity::EntityState {
                &mut self.unit.entity
            }
        }
    };
}

mod emplacement;
mod infantry;
mod mech;
mod vehicle;
mod vtol;

pub use emplacement::Emplacement;
pub use infantry::Infantry;
pub use mech::{Mech, PowerState};
pub use vehicle::Vehicle;
pub use vtol::Vtol;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::ammo::AmmoStock;
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::entity::{Entity, EntityId, EntityState};
use crate::error::{Result, SimError};
use crate::math::{approach, clamp_angle, direction};
use crate::weapon::Weapon;

/// Remaining turn below which the whole remainder is applied in one tick.
const TURN_EPSILON: f64 = 1e-9;

/// Concrete unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Battle mech with power, heat and jump jets.
    Mech,
    /// Tracked or wheeled ground vehicle.
    Vehicle,
    /// Vertical take-off aircraft.
    Vtol,
    /// Foot or battle-armor platoon.
    Infantry,
    /// Stationary turret or bunker.
    Emplacement,
}

/// Heat sink kind. The discriminant is the dissipation multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeatSinkType {
    /// No heat sinks.
    None,
    /// Standard heat sinks.
    #[default]
    Single,
    /// Double heat sinks.
    Double,
}

impl HeatSinkType {
    /// Dissipation multiplier.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Single => 1.0,
            Self::Double => 2.0,
        }
    }
}

/// Heat removed per tick: `seconds_per_tick / 4 × heat_sinks × factor`.
#[must_use]
pub fn heat_dissipation_per_tick(heat_sinks: u32, kind: HeatSinkType, config: &SimConfig) -> f64 {
    config.seconds_per_tick() / 4.0 * f64::from(heat_sinks) * kind.factor()
}

/// State shared by every unit kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitState {
    /// Spatial and damage record.
    pub entity: EntityState,
    /// Display name.
    pub name: String,
    /// Mass in tons.
    pub tonnage: f64,
    /// Current heat. Not clamped above.
    pub heat: f64,
    /// Heat removed per tick.
    pub heat_dissipation: f64,
    /// Number of heat sinks.
    pub heat_sinks: u32,
    /// Heat sink kind.
    pub heat_sink_type: HeatSinkType,
    /// Mounted weapons, in mount order.
    pub armament: Vec<Weapon>,
    /// Carried ammunition.
    pub ammo: AmmoStock,
    /// Designated target.
    pub target: Option<EntityId>,
    /// Turn rate at standstill, radians per tick.
    pub max_turn_rate: f64,
    /// Heading change still to be applied, radians.
    pub target_relative_heading: f64,
    /// Horizontal speed the unit accelerates toward.
    pub target_velocity: f64,
    /// Vertical speed the unit accelerates toward.
    pub target_velocity_z: f64,
    /// Top horizontal speed, world units per tick.
    pub max_velocity: f64,
    /// Top vertical speed, world units per tick.
    pub max_velocity_z: f64,
    /// Elevation ceiling, world units.
    pub max_elevation: f64,
    /// Whether weapons are turret mounted.
    pub has_turret: bool,
    /// Turret angle relative to the hull, radians.
    pub turret_angle: f64,
    /// Player-controlled flag.
    pub is_player: bool,
    /// Owning team, for friendly-fire exclusion.
    pub team: u32,
    /// Cockpit position relative to the unit origin (lateral, vertical).
    pub cockpit_offset: DVec2,
}

impl UnitState {
    /// Create an unarmed, stationary unit around an entity record.
    #[must_use]
    pub fn new(name: impl Into<String>, entity: EntityState) -> Self {
        Self {
            entity,
            name: name.into(),
            tonnage: 0.0,
            heat: 0.0,
            heat_dissipation: 0.0,
            heat_sinks: 0,
            heat_sink_type: HeatSinkType::Single,
            armament: Vec::new(),
            ammo: AmmoStock::new(),
            target: None,
            max_turn_rate: 0.0,
            target_relative_heading: 0.0,
            target_velocity: 0.0,
            target_velocity_z: 0.0,
            max_velocity: 0.0,
            max_velocity_z: 0.0,
            max_elevation: 0.0,
            has_turret: false,
            turret_angle: 0.0,
            is_player: false,
            team: 0,
            cockpit_offset: DVec2::ZERO,
        }
    }

    /// Builder method to set top speed and standstill turn rate (per tick).
    #[must_use]
    pub fn with_mobility(mut self, max_velocity: f64, max_turn_rate: f64) -> Self {
        self.max_velocity = max_velocity.max(0.0);
        self.max_turn_rate = max_turn_rate.max(0.0);
        self
    }

    /// Builder method to set heat sinks.
    #[must_use]
    pub fn with_heat_sinks(mut self, count: u32, kind: HeatSinkType, config: &SimConfig) -> Self {
        self.heat_sinks = count;
        self.heat_sink_type = kind;
        self.heat_dissipation = heat_dissipation_per_tick(count, kind, config);
        self
    }

    /// Builder method to mount a weapon.
    #[must_use]
    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.armament.push(weapon);
        self
    }

    /// Build the shared state from a resource description.
    ///
    /// Each ammo entry contributes `tons × per_ton` rounds, with `per_ton`
    /// taken from the first mounted weapon using that ammo type.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        let entity = EntityState::new(DVec2::ZERO, data.armor, data.structure)
            .with_collision(
                config.meters_to_units(data.collision_radius),
                config.meters_to_units(data.collision_height),
            )
            .with_anchor(data.anchor);

        let armament = data
            .armament
            .iter()
            .map(|a| Weapon::from_data(&a.weapon, a.offset, config))
            .collect::<Result<Vec<_>>>()?;

        let mut ammo = AmmoStock::new();
        for entry in &data.ammo {
            let per_ton = data.rounds_per_ton(entry.ammo_type).ok_or_else(|| {
                SimError::invalid_resource(
                    &data.name,
                    format!("no mounted weapon uses {:?} ammo", entry.ammo_type),
                )
            })?;
            let rounds = (entry.tons.max(0.0) * f64::from(per_ton)).round() as u32;
            ammo.add_rounds(entry.ammo_type, rounds);
        }

        Ok(Self {
            entity,
            name: data.name.clone(),
            tonnage: data.tonnage,
            heat: 0.0,
            heat_dissipation: heat_dissipation_per_tick(
                data.heat_sinks,
                data.heat_sink_type,
                config,
            ),
            heat_sinks: data.heat_sinks,
            heat_sink_type: data.heat_sink_type,
            armament,
            ammo,
            target: None,
            max_turn_rate: data.turn_rate.to_radians() / f64::from(config.tick_rate),
            target_relative_heading: 0.0,
            target_velocity: 0.0,
            target_velocity_z: 0.0,
            max_velocity: config.kph_to_units_per_tick(data.speed),
            max_velocity_z: config.kph_to_units_per_tick(data.vertical_speed),
            max_elevation: config.motion.max_jump_elevation,
            has_turret: data.has_turret,
            turret_angle: 0.0,
            is_player: false,
            team: 0,
            cockpit_offset: DVec2::from(data.cockpit_offset) / config.meters_per_unit,
        })
    }

    /// Turn rate at the current speed. Halves linearly from standstill to
    /// top speed.
    #[must_use]
    pub fn turn_rate(&self) -> f64 {
        if self.max_velocity <= 0.0 {
            return self.max_turn_rate;
        }
        let fraction = (self.entity.velocity.abs() / self.max_velocity).min(1.0);
        self.max_turn_rate * (1.0 - 0.5 * fraction)
    }

    /// True when any motion or motion target is nonzero.
    #[must_use]
    pub fn has_motion(&self) -> bool {
        self.target_relative_heading != 0.0
            || self.entity.velocity != 0.0
            || self.target_velocity != 0.0
            || self.entity.velocity_z != 0.0
            || self.target_velocity_z != 0.0
            || self.entity.position_z > 0.0
    }

    /// Whether the last integration left anything that moves the unit.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.target_relative_heading != 0.0
            || self.entity.velocity != 0.0
            || self.entity.velocity_z != 0.0
            || self.entity.position_z > 0.0
    }

    /// Remove one tick of heat, floored at 0.
    pub fn dissipate_heat(&mut self) {
        self.heat = (self.heat - self.heat_dissipation).max(0.0);
    }

    /// Move horizontal velocity one step toward its target.
    pub fn integrate_velocity(&mut self, config: &SimConfig) {
        self.entity.velocity = approach(
            self.entity.velocity,
            self.target_velocity,
            config.motion.velocity_delta,
        );
    }

    /// Spend up to one tick of turn rate on the outstanding heading change.
    ///
    /// Returns true if the heading changed.
    pub fn integrate_heading(&mut self) -> bool {
        let remaining = self.target_relative_heading;
        if remaining == 0.0 {
            return false;
        }
        let rate = self.turn_rate();
        let step = if remaining.abs() <= rate + TURN_EPSILON {
            remaining
        } else {
            rate.copysign(remaining)
        };
        self.entity.set_heading(self.entity.heading + step);
        self.target_relative_heading = if step == remaining {
            0.0
        } else {
            remaining - step
        };
        step != 0.0
    }

    /// Zero vertical speed at the ground while descending, and at the
    /// ceiling while climbing.
    pub fn clamp_vertical(&mut self) {
        let e = &mut self.entity;
        if e.position_z <= 0.0 && e.velocity_z < 0.0 {
            e.velocity_z = 0.0;
        }
        if e.position_z >= self.max_elevation && e.velocity_z > 0.0 {
            e.velocity_z = 0.0;
        }
    }

    /// Ground-unit integration: velocity then heading.
    ///
    /// Skipped entirely, returning false, when nothing is moving or targeted.
    pub fn integrate_ground(&mut self, config: &SimConfig) -> bool {
        if !self.has_motion() {
            return false;
        }
        self.integrate_velocity(config);
        let turned = self.integrate_heading();
        turned || self.is_moving()
    }

    /// Displacement for one tick along `heading` at `velocity`, plus
    /// vertical speed, with elevation kept within `[0, max_elevation]`.
    #[must_use]
    pub fn displacement(&self, heading: f64, velocity: f64) -> DVec3 {
        let z = self.entity.position_z;
        let ceiling = self.max_elevation.max(z);
        let dz = (z + self.entity.velocity_z).clamp(0.0, ceiling) - z;
        (direction(heading) * velocity).extend(dz)
    }

    /// Direction weapons fire in: hull heading plus turret angle.
    #[must_use]
    pub fn fire_heading(&self) -> f64 {
        clamp_angle(self.entity.heading + self.turret_angle)
    }

    /// Cockpit position in world space.
    #[must_use]
    pub fn cockpit_position(&self) -> DVec3 {
        let heading = self.fire_heading();
        let right = DVec2::new(heading.sin(), -heading.cos());
        (self.entity.position + right * self.cockpit_offset.x)
            .extend(self.entity.position_z + self.cockpit_offset.y)
    }
}

/// Capability set of every combat unit.
pub trait Unit: Entity {
    /// Shared unit state.
    fn unit(&self) -> &UnitState;

    /// Mutable shared unit state.
    fn unit_mut(&mut self) -> &mut UnitState;

    /// Concrete kind.
    fn unit_type(&self) -> UnitType;

    /// Advance one tick of power, heat and motion state.
    ///
    /// Returns true when the arena needs to apply [`motion_delta`](Self::motion_delta).
    fn update(&mut self, config: &SimConfig) -> bool;

    /// World displacement for the current tick.
    fn motion_delta(&self) -> DVec3 {
        let u = self.unit();
        u.displacement(u.entity.heading, u.entity.velocity)
    }

    /// Whether weapons may be triggered right now.
    fn can_fire(&self) -> bool {
        true
    }

    /// Mech power state, if the unit has one.
    fn power_state(&self) -> Option<PowerState> {
        None
    }

    /// Name.
    fn name(&self) -> &str {
        &self.unit().name
    }

    /// Queue a heading change, wrapped into (-π, π].
    fn set_target_relative_heading(&mut self, heading: f64) {
        self.unit_mut().target_relative_heading = clamp_angle(heading);
    }

    /// Set the horizontal speed target, bounded by top speed.
    fn set_target_velocity(&mut self, velocity: f64) {
        let u = self.unit_mut();
        u.target_velocity = velocity.clamp(-u.max_velocity, u.max_velocity);
    }

    /// Set the vertical speed target, bounded by top vertical speed.
    fn set_target_velocity_z(&mut self, velocity: f64) {
        let u = self.unit_mut();
        u.target_velocity_z = velocity.clamp(-u.max_velocity_z, u.max_velocity_z);
    }

    /// Aim the turret relative to the hull. Ignored without a turret.
    fn set_turret_angle(&mut self, angle: f64) {
        let u = self.unit_mut();
        if u.has_turret {
            u.turret_angle = clamp_angle(angle);
        }
    }

    /// Designate a weapon and sensor target.
    fn set_target(&mut self, target: Option<EntityId>) {
        self.unit_mut().target = target;
    }

    /// Designated target.
    fn target(&self) -> Option<EntityId> {
        self.unit().target
    }

    /// Current heat.
    fn heat(&self) -> f64 {
        self.unit().heat
    }

    /// Add heat.
    fn add_heat(&mut self, heat: f64) {
        self.unit_mut().heat += heat;
    }

    /// Mounted weapons.
    fn armament(&self) -> &[Weapon] {
        &self.unit().armament
    }

    /// Count down every weapon's cooldown.
    fn decrease_cooldowns(&mut self, amount: f64) {
        for weapon in &mut self.unit_mut().armament {
            weapon.decrease_cooldown(amount);
        }
    }

    /// Fire the weapon at `index`.
    ///
    /// `Ok(false)` with no side effect when the weapon is cooling down, the
    /// unit cannot fire, a lock-on weapon has no target, or ammo is short.
    /// On success ammo is spent (one round per projectile), the cooldown is
    /// reset, heat is added and a salvo is queued on the weapon.
    fn trigger_weapon(&mut self, index: usize) -> Result<bool> {
        let can_fire = self.can_fire();
        let u = self.unit_mut();
        let count = u.armament.len();
        let Some(weapon) = u.armament.get_mut(index) else {
            return Err(SimError::InvalidWeaponIndex {
                unit: u.name.clone(),
                index,
                count,
            });
        };

        if !can_fire || !weapon.is_ready() {
            return Ok(false);
        }
        if weapon.lock_on().is_some_and(|l| l.required) && u.target.is_none() {
            return Ok(false);
        }
        let rounds = weapon.projectile_count;
        if let Some(ammo) = weapon.ammo {
            if !u.ammo.has(ammo.ammo_type, rounds) {
                return Ok(false);
            }
        }
        if !weapon.trigger() {
            return Ok(false);
        }
        if let Some(ammo) = weapon.ammo {
            u.ammo.consume(ammo.ammo_type, rounds);
        }
        u.heat += weapon.heat;
        Ok(true)
    }
}

/// Any concrete unit, as stored by the battle arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UnitVariant {
    /// Battle mech.
    Mech(Mech),
    /// Ground vehicle.
    Vehicle(Vehicle),
    /// VTOL aircraft.
    Vtol(Vtol),
    /// Infantry platoon.
    Infantry(Infantry),
    /// Stationary emplacement.
    Emplacement(Emplacement),
}

macro_rules! dispatch {
    ($self:expr, $unit:ident => $body:expr) => {
        match $self {
            UnitVariant::Mech($unit) => $body,
            UnitVariant::Vehicle($unit) => $body,
            UnitVariant::Vtol($unit) => $body,
            UnitVariant::Infantry($unit) => $body,
            UnitVariant::Emplacement($unit) => $body,
        }
    };
}

impl UnitVariant {
    /// Build whichever variant the resource's `unit_type` names.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        Ok(match data.unit_type {
            UnitType::Mech => Self::Mech(Mech::from_data(data, config)?),
            UnitType::Vehicle => Self::Vehicle(Vehicle::from_data(data, config)?),
            UnitType::Vtol => Self::Vtol(Vtol::from_data(data, config)?),
            UnitType::Infantry => Self::Infantry(Infantry::from_data(data, config)?),
            UnitType::Emplacement => Self::Emplacement(Emplacement::from_data(data, config)?),
        })
    }

    /// The mech, if this is one.
    #[must_use]
    pub fn as_mech(&self) -> Option<&Mech> {
        match self {
            Self::Mech(mech) => Some(mech),
            _ => None,
        }
    }

    /// The mech, mutably, if this is one.
    pub fn as_mech_mut(&mut self) -> Option<&mut Mech> {
        match self {
            Self::Mech(mech) => Some(mech),
            _ => None,
        }
    }
}

impl Entity for UnitVariant {
    fn entity(&self) -> &EntityState {
        dispatch!(self, u => u.entity())
    }

    fn entity_mut(&mut self) -> &mut EntityState {
        dispatch!(self, u => u.entity_mut())
    }
}

impl Unit for UnitVariant {
    fn unit(&self) -> &UnitState {
        dispatch!(self, u => u.unit())
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        dispatch!(self, u => u.unit_mut())
    }

    fn unit_type(&self) -> UnitType {
        dispatch!(self, u => u.unit_type())
    }

    fn update(&mut self, config: &SimConfig) -> bool {
        dispatch!(self, u => u.update(config))
    }

    fn motion_delta(&self) -> DVec3 {
        dispatch!(self, u => u.motion_delta())
    }

    fn can_fire(&self) -> bool {
        dispatch!(self, u => u.can_fire())
    }

    fn power_state(&self) -> Option<PowerState> {
        dispatch!(self, u => u.power_state())
    }

    fn set_target_relative_heading(&mut self, heading: f64) {
        dispatch!(self, u => u.set_target_relative_heading(heading));
    }
}

/// Check a resource names the expected kind before building it.
fn expect_type(data: &UnitData, expected: UnitType) -> Result<()> {
    if data.unit_type == expected {
        Ok(())
    } else {
        Err(SimError::invalid_resource(
            &data.name,
            format!("unit_type is {:?}, expected {expected:?}", data.unit_type),
        ))
    }
}
