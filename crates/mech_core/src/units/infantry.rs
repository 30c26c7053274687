//! Infantry platoons.

use serde::{Deserialize, Serialize};

use super::{expect_type, Unit, UnitState, UnitType};
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::error::Result;

/// Infantry. Ground motion only; weapons always face the heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Infantry {
    /// Shared unit state.
    pub unit: UnitState,
}

impl_entity!(Infantry);

impl Infantry {
    /// Wrap shared unit state. Any turret flag is cleared.
    #[must_use]
    pub fn new(mut unit: UnitState) -> Self {
        unit.has_turret = false;
        unit.turret_angle = 0.0;
        unit.max_velocity_z = 0.0;
        Self { unit }
    }

    /// Build infantry from a resource description.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        expect_type(data, UnitType::Infantry)?;
        Ok(Self::new(UnitState::from_data(data, config)?))
    }
}

impl Unit for Infantry {
    fn unit(&self) -> &UnitState {
        &self.unit
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        &mut self.unit
    }

    fn unit_type(&self) -> UnitType {
        UnitType::Infantry
    }

    fn update(&mut self, config: &SimConfig) -> bool {
        self.unit.dissipate_heat();
        self.unit.integrate_ground(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityState;

    #[test]
    fn test_never_has_turret() {
        let mut unit = UnitState::new("Test Platoon", EntityState::default()).with_mobility(0.02, 0.1);
        unit.has_turret = true;
        let mut platoon = Infantry::new(unit);
        platoon.set_turret_angle(1.0);
        assert_eq!(platoon.unit.turret_angle, 0.0);
    }

    #[test]
    fn test_walks() {
        let config = SimConfig::default();
        let unit = UnitState::new("Test Platoon", EntityState::default()).with_mobility(0.02, 0.1);
        let mut platoon = Infantry::new(unit);
        platoon.set_target_velocity(0.02);
        assert!(platoon.update(&config));
        assert!(platoon.motion_delta().x > 0.0);
    }
}
