//! # Mech Core
//!
//! Deterministic combat simulation core for mechs, vehicles and their
//! projectiles.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (each projectile owns a seeded RNG)
//!
//! This separation enables:
//! - Headless batch simulation
//! - Replay and save games via [`battle::Battle::snapshot`]
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`battle`] - Entity arena and fixed-tick orchestrator
//! - [`units`] - Mechs, vehicles, VTOLs, infantry and emplacements
//! - [`weapon`] - Weapons, salvos and missile tubes
//! - [`projectile`] - Projectile flight, guidance and damage falloff
//! - [`entity`] - Spatial and damage state shared by everything
//! - [`data`] - Serializable weapon and unit resources
//! - [`pathfinding`] - Grid A* and waypoint following
//! - [`math`] - Angle and geometry helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ammo;
pub mod battle;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod math;
pub mod pathfinding;
pub mod projectile;
pub mod units;
pub mod weapon;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ammo::{AmmoStock, AmmoType};
    pub use crate::battle::{
        Battle, HitEvent, PowerTransition, ShotEvent, SpawnParams, TickEvents,
    };
    pub use crate::config::SimConfig;
    pub use crate::data::{UnitData, WeaponData};
    pub use crate::entity::{Anchor, Entity, EntityId, EntityState};
    pub use crate::error::{Result, SimError};
    pub use crate::pathfinding::{find_path, smooth_path, NavGrid, PathFollower};
    pub use crate::projectile::Projectile;
    pub use crate::units::{PowerState, Unit, UnitType, UnitVariant};
    pub use crate::weapon::{Weapon, WeaponFamily};
}
