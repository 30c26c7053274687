//! Battle mechs: power sequencing, heat shutdown and jump jets.
//!
//! Each tick runs, in order:
//!
//! 1. the power state machine (overheat shutdown, power-down and power-up
//!    sequences),
//! 2. control lockout while not [`PowerState::On`],
//! 3. jump-jet fuel and the airborne motion snapshot,
//! 4. heat dissipation,
//! 5. motion integration, skipped when nothing moves.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{expect_type, Unit, UnitState, UnitType};
use crate::config::SimConfig;
use crate::data::UnitData;
use crate::error::Result;
use crate::math::approach;

/// Mech power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerState {
    /// Powered and controllable.
    On,
    /// Forced shutdown after overheating.
    OffHeat,
    /// Manual shutdown.
    Off,
}

/// A battle mech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mech {
    /// Shared unit state.
    pub unit: UnitState,
    jump_jets: u32,
    /// Jet fuel spent, seconds.
    jump_jet_duration: f64,
    max_jump_jet_duration: f64,
    jump_jets_active: bool,
    jump_jet_heading: f64,
    jump_jet_velocity: f64,
    powered: PowerState,
    power_on_timer: u32,
    power_off_timer: u32,
}

impl_entity!(Mech);

impl Mech {
    /// Create a powered mech with `jump_jets` jets.
    #[must_use]
    pub fn new(unit: UnitState, jump_jets: u32, config: &SimConfig) -> Self {
        let mut unit = unit;
        if jump_jets > 0 {
            unit.max_velocity_z = config.motion.jump_jet_velocity_z;
            unit.max_elevation = config.motion.max_jump_elevation;
        }
        Self {
            unit,
            jump_jets,
            jump_jet_duration: 0.0,
            max_jump_jet_duration: 2.0 * f64::from(jump_jets),
            jump_jets_active: false,
            jump_jet_heading: 0.0,
            jump_jet_velocity: 0.0,
            powered: PowerState::On,
            power_on_timer: 0,
            power_off_timer: 0,
        }
    }

    /// Build a mech from a resource description.
    pub fn from_data(data: &UnitData, config: &SimConfig) -> Result<Self> {
        expect_type(data, UnitType::Mech)?;
        Ok(Self::new(UnitState::from_data(data, config)?, data.jump_jets, config))
    }

    /// Current power state.
    #[must_use]
    pub fn powered(&self) -> PowerState {
        self.powered
    }

    /// Ticks left in the power-up sequence.
    #[must_use]
    pub fn power_on_timer(&self) -> u32 {
        self.power_on_timer
    }

    /// Ticks left in the power-down sequence.
    #[must_use]
    pub fn power_off_timer(&self) -> u32 {
        self.power_off_timer
    }

    /// Jump jets mounted.
    #[must_use]
    pub fn jump_jets(&self) -> u32 {
        self.jump_jets
    }

    /// Whether jets are firing.
    #[must_use]
    pub fn jump_jets_active(&self) -> bool {
        self.jump_jets_active
    }

    /// Jet fuel spent, seconds.
    #[must_use]
    pub fn jump_jet_duration(&self) -> f64 {
        self.jump_jet_duration
    }

    /// Jet fuel capacity, seconds.
    #[must_use]
    pub fn max_jump_jet_duration(&self) -> f64 {
        self.max_jump_jet_duration
    }

    /// Remaining jet fuel as a fraction, for HUD bars.
    #[must_use]
    pub fn jump_jet_fuel_ratio(&self) -> f64 {
        if self.max_jump_jet_duration <= 0.0 {
            0.0
        } else {
            1.0 - self.jump_jet_duration / self.max_jump_jet_duration
        }
    }

    /// Heading and speed captured while the jets last fired.
    #[must_use]
    pub fn jump_jet_motion(&self) -> (f64, f64) {
        (self.jump_jet_heading, self.jump_jet_velocity)
    }

    /// True once heat has reached the configured threshold.
    #[must_use]
    pub fn is_overheated(&self, config: &SimConfig) -> bool {
        self.unit.heat >= config.heat.overheat_threshold
    }

    /// Fire or cut the jets. Firing is refused while unpowered, without
    /// jets, or with no fuel left. Returns the resulting jet state.
    ///
    /// Jets climb toward the vertical target speed; with no target set,
    /// firing them asks for full climb.
    pub fn set_jump_jets_active(&mut self, active: bool) -> bool {
        self.jump_jets_active = active
            && self.powered == PowerState::On
            && self.jump_jets > 0
            && self.jump_jet_duration < self.max_jump_jet_duration;
        if self.jump_jets_active && self.unit.target_velocity_z == 0.0 {
            self.unit.target_velocity_z = self.unit.max_velocity_z;
        }
        self.jump_jets_active
    }

    /// Request a manual shutdown. Ignored unless powered and not already
    /// shutting down.
    pub fn power_off(&mut self, config: &SimConfig) {
        if self.powered != PowerState::On || self.power_off_timer > 0 {
            return;
        }
        self.power_on_timer = 0;
        self.power_off_timer = config.power_off_ticks();
        if self.power_off_timer == 0 {
            self.powered = PowerState::Off;
        }
    }

    /// Request power-up from any off state. Ignored while a sequence runs.
    pub fn power_on(&mut self, config: &SimConfig) {
        if self.powered == PowerState::On || self.power_on_timer > 0 || self.power_off_timer > 0 {
            return;
        }
        self.start_power_on(config);
    }

    fn start_power_on(&mut self, config: &SimConfig) {
        self.power_on_timer = config.power_on_ticks();
        if self.power_on_timer == 0 {
            self.powered = PowerState::On;
        }
    }

    fn update_power(&mut self, config: &SimConfig) {
        let overheated = self.is_overheated(config);
        if self.powered == PowerState::On && overheated {
            self.powered = PowerState::OffHeat;
            self.power_on_timer = 0;
            self.power_off_timer = 0;
        } else if self.power_off_timer > 0 {
            self.power_off_timer -= 1;
            if self.power_off_timer == 0 {
                self.powered = PowerState::Off;
            }
        } else if overheated {
            // stay down until the heat clears
        } else if self.powered == PowerState::OffHeat && self.power_on_timer == 0 {
            self.start_power_on(config);
        } else if self.power_on_timer > 0 {
            self.power_on_timer -= 1;
            if self.power_on_timer == 0 {
                self.powered = PowerState::On;
            }
        }
    }

    fn update_jump_jets(&mut self, config: &SimConfig) {
        let airborne = self.unit.entity.position_z > 0.0;
        if self.jump_jets_active {
            self.jump_jet_duration += config.seconds_per_tick();
            self.jump_jet_heading = self.unit.entity.heading;
            self.jump_jet_velocity = self.unit.entity.velocity;
            if self.jump_jet_duration >= self.max_jump_jet_duration {
                self.jump_jet_duration = self.max_jump_jet_duration;
                self.jump_jets_active = false;
                debug!(mech = %self.unit.name, "Jump jet fuel exhausted");
            }
        } else if airborne {
            let drag = config.motion.gravity * self.unit.tonnage / 100.0;
            self.jump_jet_velocity = approach(self.jump_jet_velocity, 0.0, drag);
        } else {
            let recharge = config.motion.jump_jet_recharge_rate
                * f64::from(self.jump_jets)
                * config.seconds_per_tick();
            self.jump_jet_duration = (self.jump_jet_duration - recharge).max(0.0);
        }
    }

    fn integrate_vertical(&mut self, config: &SimConfig) {
        let e = &mut self.unit.entity;
        if self.jump_jets_active {
            e.velocity_z = approach(
                e.velocity_z,
                self.unit.target_velocity_z,
                config.motion.ascent_delta,
            );
        } else if e.position_z > 0.0 || e.velocity_z > 0.0 {
            e.velocity_z -= config.motion.gravity;
        }
        self.unit.clamp_vertical();
    }
}

impl Unit for Mech {
    fn unit(&self) -> &UnitState {
        &self.unit
    }

    fn unit_mut(&mut self) -> &mut UnitState {
        &mut self.unit
    }

    fn unit_type(&self) -> UnitType {
        UnitType::Mech
    }

    fn update(&mut self, config: &SimConfig) -> bool {
        self.update_power(config);

        if self.powered != PowerState::On {
            self.jump_jets_active = false;
            self.unit.target_relative_heading = 0.0;
            self.unit.target_velocity = 0.0;
            self.unit.target_velocity_z = 0.0;
        }

        self.update_jump_jets(config);
        self.unit.dissipate_heat();

        if !self.jump_jets_active && !self.unit.has_motion() {
            return false;
        }
        self.unit.integrate_velocity(config);
        self.integrate_vertical(config);
        let turned = self.unit.integrate_heading();
        turned || self.unit.is_moving()
    }

    fn motion_delta(&self) -> DVec3 {
        if self.unit.entity.position_z > 0.0 {
            self.unit
                .displacement(self.jump_jet_heading, self.jump_jet_velocity)
        } else {
            self.unit
                .displacement(self.unit.entity.heading, self.unit.entity.velocity)
        }
    }

    fn can_fire(&self) -> bool {
        self.powered == PowerState::On
    }

    fn power_state(&self) -> Option<PowerState> {
        Some(self.powered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityState;
    use crate::units::HeatSinkType;

    fn test_mech(jump_jets: u32) -> Mech {
        let config = SimConfig::default();
        let unit = UnitState::new("Test Mech", EntityState::new(Default::default(), 100.0, 50.0))
            .with_mobility(0.2, 0.05)
            .with_heat_sinks(10, HeatSinkType::Single, &config);
        let mut mech = Mech::new(unit, jump_jets, &config);
        mech.unit.tonnage = 50.0;
        mech
    }

    #[test]
    fn test_heading_debt_carried_across_ticks() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        mech.set_target_relative_heading(1.0);

        assert!(mech.update(&config));
        assert!((mech.unit.entity.heading - 0.05).abs() < 1e-12);
        assert!((mech.unit.target_relative_heading - 0.95).abs() < 1e-12);

        for _ in 1..20 {
            mech.update(&config);
        }
        assert!((mech.unit.entity.heading - 1.0).abs() < 1e-9);
        assert_eq!(mech.unit.target_relative_heading, 0.0);
    }

    #[test]
    fn test_stationary_mech_skips_motion() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        assert!(!mech.update(&config));
        assert_eq!(mech.unit.entity.position_z, 0.0);
    }

    #[test]
    fn test_velocity_steps_toward_target() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        mech.set_target_velocity(0.01);
        assert!(mech.update(&config));
        assert!((mech.unit.entity.velocity - 0.004).abs() < 1e-12);
        mech.update(&config);
        mech.update(&config);
        assert!((mech.unit.entity.velocity - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_overheat_shuts_down_same_tick() {
        let config = SimConfig::default();
        let mut mech = test_mech(2);
        mech.set_target_velocity(0.1);
        mech.set_target_relative_heading(0.5);
        assert!(mech.set_jump_jets_active(true));
        mech.unit.heat = config.heat.overheat_threshold;

        mech.update(&config);
        assert_eq!(mech.powered(), PowerState::OffHeat);
        assert!(!mech.jump_jets_active());
        assert_eq!(mech.unit.target_velocity, 0.0);
        assert_eq!(mech.unit.target_velocity_z, 0.0);
        assert_eq!(mech.unit.target_relative_heading, 0.0);
        assert!(!mech.can_fire());
    }

    #[test]
    fn test_restarts_after_heat_clears() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        mech.unit.heat = 150.0;
        mech.update(&config);
        assert_eq!(mech.powered(), PowerState::OffHeat);

        // still hot: no power-on sequence yet
        mech.update(&config);
        assert_eq!(mech.power_on_timer(), 0);

        mech.unit.heat = 0.0;
        mech.update(&config);
        assert_eq!(mech.power_on_timer(), config.power_on_ticks());

        for _ in 0..config.power_on_ticks() - 1 {
            mech.update(&config);
        }
        assert_eq!(mech.powered(), PowerState::OffHeat);
        mech.update(&config);
        assert_eq!(mech.powered(), PowerState::On);
    }

    #[test]
    fn test_manual_power_cycle() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);

        mech.power_off(&config);
        assert_eq!(mech.power_off_timer(), config.power_off_ticks());
        for _ in 0..config.power_off_ticks() {
            assert_eq!(mech.powered(), PowerState::On);
            mech.update(&config);
        }
        assert_eq!(mech.powered(), PowerState::Off);

        // a manual shutdown never restarts by itself
        mech.update(&config);
        assert_eq!(mech.power_on_timer(), 0);

        mech.power_on(&config);
        for _ in 0..config.power_on_ticks() {
            mech.update(&config);
        }
        assert_eq!(mech.powered(), PowerState::On);
    }

    #[test]
    fn test_overheat_during_power_down() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        mech.power_off(&config);
        mech.update(&config);
        mech.unit.heat = 150.0;
        mech.update(&config);
        assert_eq!(mech.powered(), PowerState::OffHeat);
        assert_eq!(mech.power_off_timer(), 0);
    }

    #[test]
    fn test_heat_dissipates_to_zero() {
        let config = SimConfig::default();
        let mut mech = test_mech(0);
        mech.unit.heat = 0.01;
        mech.update(&config);
        assert_eq!(mech.unit.heat, 0.0);

        mech.unit.heat = 10.0;
        mech.update(&config);
        assert!((mech.unit.heat - (10.0 - 10.0 / 240.0)).abs() < 1e-12);
    }

    #[test]
    fn test_jump_jets_refused_without_jets_or_power() {
        let config = SimConfig::default();
        let mut grounded = test_mech(0);
        assert!(!grounded.set_jump_jets_active(true));

        let mut mech = test_mech(2);
        mech.power_off(&config);
        for _ in 0..config.power_off_ticks() {
            mech.update(&config);
        }
        assert!(!mech.set_jump_jets_active(true));
    }

    #[test]
    fn test_jump_jets_climb_and_burn_fuel() {
        let config = SimConfig::default();
        let mut mech = test_mech(1);
        assert_eq!(mech.max_jump_jet_duration(), 2.0);
        mech.set_jump_jets_active(true);

        assert!(mech.update(&config));
        assert!((mech.unit.entity.velocity_z - 0.008).abs() < 1e-12);
        assert!((mech.jump_jet_duration() - 1.0 / 60.0).abs() < 1e-12);
        assert!(mech.motion_delta().z > 0.0);
    }

    #[test]
    fn test_jump_jets_cut_out_when_fuel_spent() {
        let config = SimConfig::default();
        let mut mech = test_mech(1);
        mech.set_jump_jets_active(true);
        let mut ticks = 0;
        while mech.jump_jets_active() {
            mech.update(&config);
            ticks += 1;
            assert!(ticks <= 121);
        }
        assert!(ticks >= 119);
        assert_eq!(mech.jump_jet_duration(), mech.max_jump_jet_duration());
        assert!(!mech.set_jump_jets_active(true));
    }

    #[test]
    fn test_fuel_recharges_on_ground() {
        let config = SimConfig::default();
        let mut mech = test_mech(2);
        mech.set_jump_jets_active(true);
        mech.update(&config);
        mech.set_jump_jets_active(false);
        let spent = mech.jump_jet_duration();

        // grounded: z stays 0 because the arena never applied the climb
        mech.unit.entity.velocity_z = 0.0;
        mech.update(&config);
        assert!(mech.jump_jet_duration() < spent);
    }

    #[test]
    fn test_jump_jets_climb_to_target_velocity() {
        let config = SimConfig::default();
        let mut mech = test_mech(2);
        mech.set_jump_jets_active(true);
        mech.set_target_velocity_z(0.01);

        for _ in 0..20 {
            mech.update(&config);
        }
        assert!(mech.jump_jets_active());
        assert!((mech.unit.entity.velocity_z - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_airborne_drift_decays_with_tonnage() {
        let config = SimConfig::default();
        let mut mech = test_mech(2);
        mech.unit.entity.position_z = 5.0;
        mech.jump_jet_velocity = 0.1;

        let drag = config.motion.gravity * mech.unit.tonnage / 100.0;
        mech.update(&config);
        assert!((mech.jump_jet_motion().1 - (0.1 - drag)).abs() < 1e-12);

        for _ in 0..200 {
            mech.unit.entity.position_z = 5.0;
            mech.update(&config);
        }
        assert_eq!(mech.jump_jet_motion().1, 0.0);
    }

    #[test]
    fn test_airborne_motion_uses_jet_snapshot() {
        let config = SimConfig::default();
        let mut mech = test_mech(2);
        mech.unit.entity.velocity = 0.1;
        mech.set_jump_jets_active(true);
        mech.update(&config);
        assert_eq!(mech.jump_jet_motion(), (0.0, 0.1));

        mech.unit.entity.position_z = 2.0;
        mech.unit.entity.set_heading(1.0);
        let delta = mech.motion_delta();
        // still moving along the heading captured at liftoff
        assert!(delta.y.abs() < 1e-12);
        assert!(delta.x > 0.0);
    }
}
