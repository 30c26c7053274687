//! Weapon resource descriptions.

use serde::{Deserialize, Serialize};

use crate::ammo::AmmoType;
use crate::weapon::{TechBase, WeaponFamily};

/// Ammunition a weapon draws when fired.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponAmmoData {
    /// Which bin the weapon draws from.
    pub ammo_type: AmmoType,
    /// Rounds per ton of this ammo.
    pub per_ton: u32,
}

/// Missile lock-on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockOnData {
    /// Whether the weapon needs a lock before it will fire.
    #[serde(default)]
    pub required: bool,
    /// Guidance turn rate in degrees per second.
    pub turn_rate: f64,
    /// Spread radius of a missile group around the aim point, in meters.
    pub group_radius: f64,
}

/// Data-driven weapon definition.
///
/// # Example RON
///
/// ```ron
/// WeaponData(
///     name: "Long Range Missile 10",
///     short_name: "LRM-10",
///     family: Missile,
///     tonnage: 5.0,
///     damage: 10.0,
///     heat: 4.0,
///     distance: 630.0,
///     velocity: 160.0,
///     cooldown: 4.0,
///     projectile_count: 10,
///     projectile_delay: 0.05,
///     ammo: Some(WeaponAmmoData(ammo_type: Lrm, per_ton: 120)),
///     lock_on: Some(LockOnData(required: false, turn_rate: 90.0, group_radius: 3.0)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    /// Display name.
    pub name: String,

    /// Short display name.
    pub short_name: String,

    /// Technology base.
    #[serde(default)]
    pub tech_base: TechBase,

    /// Energy, ballistic or missile.
    pub family: WeaponFamily,

    /// Mass in tons.
    pub tonnage: f64,

    /// Damage per trigger, split across projectiles.
    pub damage: f64,

    /// Heat added to the firing unit per trigger.
    pub heat: f64,

    /// Optimal range in meters.
    pub distance: f64,

    /// Extreme range in meters. Defaults to twice `distance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extreme_distance: Option<f64>,

    /// Projectile speed in meters per second.
    pub velocity: f64,

    /// Seconds between triggers.
    pub cooldown: f64,

    /// Projectiles launched per trigger.
    #[serde(default = "default_projectile_count")]
    pub projectile_count: u32,

    /// Seconds between projectiles of one salvo.
    #[serde(default)]
    pub projectile_delay: f64,

    /// Projectile collision radius in meters.
    #[serde(default = "default_projectile_radius")]
    pub projectile_radius: f64,

    /// Projectile collision height in meters.
    #[serde(default = "default_projectile_radius")]
    pub projectile_height: f64,

    /// Top projectile speed in meters per second. Defaults to `velocity`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_velocity: Option<f64>,

    /// Projectile acceleration in meters per second squared.
    #[serde(default)]
    pub acceleration: f64,

    /// Ammunition drawn per projectile (None for energy weapons).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo: Option<WeaponAmmoData>,

    /// Lock-on guidance (missiles only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_on: Option<LockOnData>,
}

const fn default_projectile_count() -> u32 {
    1
}

const fn default_projectile_radius() -> f64 {
    0.1
}

impl WeaponData {
    /// Extreme range, falling back to twice the optimal range.
    #[must_use]
    pub fn effective_extreme_distance(&self) -> f64 {
        match self.extreme_distance {
            Some(d) if d > 0.0 => d,
            _ => 2.0 * self.distance,
        }
    }

    /// True when the weapon draws ammunition.
    #[must_use]
    pub fn uses_ammo(&self) -> bool {
        self.family != WeaponFamily::Energy && self.ammo.is_some_and(|a| a.per_ton > 0)
    }
}
