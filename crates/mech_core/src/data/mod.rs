//! Resource descriptions for units and weapons.
//!
//! These are pure data types, deserializable from RON. Loading files and
//! schema validation belong to the caller; the factories in [`crate::units`]
//! and [`crate::weapon`] only reject descriptions that cannot produce a
//! working unit or weapon.

mod unit_data;
mod weapon_data;

pub use unit_data::{AmmoData, ArmamentData, UnitData};
pub use weapon_data::{LockOnData, WeaponAmmoData, WeaponData};
