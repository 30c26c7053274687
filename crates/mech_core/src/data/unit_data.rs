//! Unit resource descriptions.

use serde::{Deserialize, Serialize};

use super::WeaponData;
use crate::ammo::AmmoType;
use crate::entity::Anchor;
use crate::units::{HeatSinkType, UnitType};

/// One mounted weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmamentData {
    /// Weapon definition.
    pub weapon: WeaponData,
    /// Mount offset relative to the cockpit, in meters.
    #[serde(default)]
    pub offset: [f64; 2],
}

/// Tons of one ammo type carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmmoData {
    /// Ammo type.
    pub ammo_type: AmmoType,
    /// Tons carried.
    pub tons: f64,
}

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Timber Wolf Prime",
///     unit_type: Mech,
///     tonnage: 75.0,
///     armor: 230.0,
///     structure: 114.0,
///     speed: 86.4,
///     turn_rate: 90.0,
///     heat_sinks: 15,
///     heat_sink_type: Double,
///     collision_radius: 0.4,
///     collision_height: 0.9,
///     armament: [ArmamentData(weapon: WeaponData(/* ... */), offset: (0.3, 0.1))],
///     ammo: [AmmoData(ammo_type: Lrm, tons: 2.5)],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Display name.
    pub name: String,

    /// Which concrete unit this describes.
    pub unit_type: UnitType,

    /// Mass in tons.
    pub tonnage: f64,

    /// Armor points.
    pub armor: f64,

    /// Internal structure points.
    pub structure: f64,

    /// Top ground speed in kilometers per hour.
    #[serde(default)]
    pub speed: f64,

    /// Top vertical speed in kilometers per hour (VTOL only).
    #[serde(default)]
    pub vertical_speed: f64,

    /// Turn rate at standstill in degrees per second.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f64,

    /// Number of heat sinks.
    #[serde(default)]
    pub heat_sinks: u32,

    /// Heat sink kind.
    #[serde(default)]
    pub heat_sink_type: HeatSinkType,

    /// Number of jump jets (mech only).
    #[serde(default)]
    pub jump_jets: u32,

    /// Collision cylinder radius in meters.
    pub collision_radius: f64,

    /// Collision cylinder height in meters.
    pub collision_height: f64,

    /// Collision volume alignment.
    #[serde(default)]
    pub anchor: Anchor,

    /// Cockpit position relative to the unit origin, in meters.
    #[serde(default)]
    pub cockpit_offset: [f64; 2],

    /// Whether weapons sit on an independently aimed turret.
    #[serde(default)]
    pub has_turret: bool,

    /// Mounted weapons in mount order.
    #[serde(default)]
    pub armament: Vec<ArmamentData>,

    /// Ammunition carried.
    #[serde(default)]
    pub ammo: Vec<AmmoData>,
}

const fn default_turn_rate() -> f64 {
    90.0
}

impl UnitData {
    /// Total tonnage of mounted weapons.
    #[must_use]
    pub fn armament_tonnage(&self) -> f64 {
        self.armament.iter().map(|a| a.weapon.tonnage).sum()
    }

    /// Rounds per ton for an ammo type, from the first weapon that uses it.
    #[must_use]
    pub fn rounds_per_ton(&self, ammo_type: AmmoType) -> Option<u32> {
        self.armament
            .iter()
            .filter_map(|a| a.weapon.ammo)
            .find(|a| a.ammo_type == ammo_type)
            .map(|a| a.per_ton)
    }
}
