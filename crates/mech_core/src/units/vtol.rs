//! VTOL aircraft: ground-style horizontal motion plus controlled climb and
//! descent.

use serde::{Deserialize, Serialize};

use super::{expect_type, Unit, UnitState, UnitType};
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::error::Result;
use crate::math::approach;

/// A VTOL. Vertical speed eases toward its target by `ascent_delta` both
/// ways and elevation stays within `[0, max_elevation]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vtol {
    /// Shared unit state.
    pub unit: UnitState,
}

impl_entity!(Vtol);

impl Vtol {
    /// Wrap shared unit state.
    #[must_use]
    pub fn new(unit: UnitState) -> Self {
        Self { unit }
    }

    /// Build a VTOL from a resource description.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        expect_type(data, UnitType::Vtol)?;
        Ok(Self::new(UnitState::from_data(data, config)?))
    }
}

impl Unit for Vtol {
    fn unit(&self) -> &UnitState {
        &self.unit
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        &mut self.unit
    }

    fn unit_type(&self) -> UnitType {
        UnitType::Vtol
    }

    fn update(&mut self, config: &SimConfig) -> bool {
        self.unit.dissipate_heat();
        if !self.unit.has_motion() {
            return false;
        }
        self.unit.integrate_velocity(config);

        let e = &mut self.unit.entity;
        e.velocity_z = approach(
            e.velocity_z,
            self.unit.target_velocity_z,
            config.motion.ascent_delta,
        );
        self.unit.clamp_vertical();

        let turned = self.unit.integrate_heading();
        turned || self.unit.is_moving()
    }
}
