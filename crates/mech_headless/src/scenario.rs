//! Scenario loading and battle setup.
//!
//! A scenario is a RON file holding a weapon list, unit templates that mount
//! those weapons by short name, and placements of units on teams. Targets are
//! fixed in the file: a placement names the index of the placement it shoots
//! at.

use std::path::Path;

use glam::DVec2;
use mech_core::battle::{Battle, SpawnParams};
use mech_core::config::SimConfig;
use mech_core::data::{ArmamentData, UnitData, WeaponData};
use mech_core::entity::EntityId;
use mech_core::error::SimError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// A template mounts a weapon the scenario doesn't define.
    #[error("Unit '{unit}' mounts unknown weapon '{weapon}'")]
    UnknownWeapon {
        /// Template name.
        unit: String,
        /// Weapon short name.
        weapon: String,
    },
    /// A placement names a unit template the scenario doesn't define.
    #[error("Placement {index} uses unknown unit '{unit}'")]
    UnknownUnit {
        /// Placement index.
        index: usize,
        /// Template name.
        unit: String,
    },
    /// A placement targets a placement index that doesn't exist.
    #[error("Placement {index} targets missing placement {target}")]
    BadTarget {
        /// Placement index.
        index: usize,
        /// Target index.
        target: usize,
    },
    /// The core rejected a unit description.
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// A weapon mount on a unit template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mount {
    /// Weapon short name.
    pub weapon: String,
    /// Offset from the cockpit (lateral, vertical), meters.
    #[serde(default)]
    pub offset: [f64; 2],
}

/// A unit description plus the weapons it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Hull description. Its `armament` is extended by `loadout`.
    pub unit: UnitData,
    /// Weapons to mount.
    #[serde(default)]
    pub loadout: Vec<Mount>,
}

/// A unit on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Template name.
    pub unit: String,
    /// Team.
    pub team: u32,
    /// Position (x, y), world units.
    pub position: (f64, f64),
    /// Heading, degrees.
    #[serde(default)]
    pub heading: f64,
    /// Starting elevation, world units.
    #[serde(default)]
    pub elevation: f64,
    /// Index of the placement this unit fires at.
    #[serde(default)]
    pub target: Option<usize>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Tick limit.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    /// Simulation tuning.
    #[serde(default)]
    pub config: SimConfig,
    /// Weapon definitions.
    pub weapons: Vec<WeaponData>,
    /// Unit templates.
    pub units: Vec<UnitTemplate>,
    /// Units on the field.
    pub placements: Vec<Placement>,
}

const fn default_max_ticks() -> u64 {
    // 5 minutes at 60 tps
    18_000
}

/// A built battle with ids in placement order.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// The battle, at tick 0.
    pub battle: Battle,
    /// Spawned unit per placement.
    pub units: Vec<EntityId>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a template's loadout into a full unit description.
    pub fn unit_data(&self, name: &str) -> Result<Option<UnitData>, ScenarioError> {
        let Some(template) = self.units.iter().find(|t| t.unit.name == name) else {
            return Ok(None);
        };
        let mut data = template.unit.clone();
        for mount in &template.loadout {
            let weapon = self
                .weapons
                .iter()
                .find(|w| w.short_name == mount.weapon)
                .ok_or_else(|| ScenarioError::UnknownWeapon {
                    unit: name.to_string(),
                    weapon: mount.weapon.clone(),
                })?;
            data.armament.push(ArmamentData {
                weapon: weapon.clone(),
                offset: mount.offset,
            });
        }
        Ok(Some(data))
    }

    /// Spawn every placement into a fresh battle and assign targets.
    pub fn deploy(&self, seed: u64) -> Result<Deployment, ScenarioError> {
        let mut battle = Battle::new(self.config.clone(), seed);
        let mut units = Vec::with_capacity(self.placements.len());

        for (index, placement) in self.placements.iter().enumerate() {
            let data = self
                .unit_data(&placement.unit)?
                .ok_or_else(|| ScenarioError::UnknownUnit {
                    index,
                    unit: placement.unit.clone(),
                })?;
            let id = battle.spawn_from_data(
                &data,
                SpawnParams {
                    position: DVec2::new(placement.position.0, placement.position.1),
                    position_z: placement.elevation,
                    heading: placement.heading.to_radians(),
                    team: placement.team,
                    is_player: false,
                },
            )?;
            units.push(id);
        }

        for (index, placement) in self.placements.iter().enumerate() {
            if let Some(target) = placement.target {
                let target_id = *units
                    .get(target)
                    .ok_or(ScenarioError::BadTarget { index, target })?;
                battle.set_target(units[index], Some(target_id))?;
            }
        }

        Ok(Deployment { battle, units })
    }
}
