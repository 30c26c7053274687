//! Tracked and wheeled ground vehicles.

use serde::{Deserialize, Serialize};

use super::{expect_type, Unit, UnitState, UnitType};
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::error::Result;

/// A ground vehicle. No power state; weapons may sit on a turret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Shared unit state.
    pub unit: UnitState,
}

impl_entity!(Vehicle);

impl Vehicle {
    /// Wrap shared unit state.
    #[must_use]
    pub fn new(unit: UnitState) -> Self {
        Self { unit }
    }

    /// Build a vehicle from a resource description.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        expect_type(data, UnitType::Vehicle)?;
        let mut unit = UnitState::from_data(data, config)?;
        unit.max_velocity_z = 0.0;
        Ok(Self::new(unit))
    }
}

impl Unit for Vehicle {
    fn unit(&self) -> &UnitState {
        &self.unit
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        &mut self.unit
    }

    fn unit_type(&self) -> UnitType {
        UnitType::Vehicle
    }

    fn update(&mut self, config: &SimConfig) -> bool {
        self.unit.dissipate_heat();
        self.unit.integrate_ground(config)
    }
}
