//! Stationary emplacements: turrets, bunkers, gun towers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{expect_type, Unit, UnitState, UnitType};
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::error::Result;

/// An emplacement. Never moves, but its turret can still be aimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emplacement {
    /// Shared unit state.
    pub unit: UnitState,
}

impl_entity!(Emplacement);

impl Emplacement {
    /// Wrap shared unit state, stripping all mobility.
    #[must_use]
    pub fn new(mut unit: UnitState) -> Self {
        unit.max_velocity = 0.0;
        unit.max_velocity_z = 0.0;
        unit.max_turn_rate = 0.0;
        unit.target_velocity = 0.0;
        unit.target_velocity_z = 0.0;
        unit.target_relative_heading = 0.0;
        unit.entity.velocity = 0.0;
        unit.entity.velocity_z = 0.0;
        Self { unit }
    }

    /// Build an emplacement from a resource description.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        expect_type(data, UnitType::Emplacement)?;
        Ok(Self::new(UnitState::from_data(data, config)?))
    }
}

impl Unit for Emplacement {
    fn unit(&self) -> &UnitState {
        &self.unit
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        &mut self.unit
    }

    fn unit_type(&self) -> UnitType {
        UnitType::Emplacement
    }

    fn update(&mut self, _config: &SimConfig) -> bool {
        self.unit.dissipate_heat();
        false
    }

    fn motion_delta(&self) -> DVec3 {
        DVec3::ZERO
    }

    fn set_target_relative_heading(&mut self, _heading: f64) {}
}
