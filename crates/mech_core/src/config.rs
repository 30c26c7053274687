//! Simulation tuning and world-scale configuration.
//!
//! The motion deltas below are provisional tuning values, not a physical
//! model. They are kept configurable so balancing can change them without
//! touching the integrators.

use serde::{Deserialize, Serialize};

/// Default ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed simulation ticks per second.
    pub tick_rate: u32,
    /// Meters covered by one world unit.
    pub meters_per_unit: f64,
    /// Heat thresholds.
    pub heat: HeatConfig,
    /// Motion integration deltas.
    pub motion: MotionTuning,
    /// Mech power sequence lengths.
    pub power: PowerConfig,
}

/// Heat thresholds supplied to the unit state machines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Heat at or above which a powered mech shuts down.
    pub overheat_threshold: f64,
}

/// Per-tick motion deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Horizontal velocity change per tick (world units / tick²).
    pub velocity_delta: f64,
    /// Vertical velocity change per tick while ascending.
    pub ascent_delta: f64,
    /// Vertical velocity change per tick while falling.
    pub gravity: f64,
    /// Elevation ceiling for jump jets and VTOLs (world units).
    pub max_jump_elevation: f64,
    /// Jet fuel seconds recovered per second on the ground, per jump jet.
    pub jump_jet_recharge_rate: f64,
    /// Vertical velocity a mech climbs toward while its jets fire (units / tick).
    pub jump_jet_velocity_z: f64,
}

/// Mech power sequence lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Seconds from power-on request to a controllable mech.
    pub power_on_seconds: f64,
    /// Seconds from power-off request to shutdown.
    pub power_off_seconds: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            meters_per_unit: 1.0,
            heat: HeatConfig::default(),
            motion: MotionTuning::default(),
            power: PowerConfig::default(),
        }
    }
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            overheat_threshold: 100.0,
        }
    }
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            velocity_delta: 0.004,
            ascent_delta: 0.008,
            gravity: 0.002,
            max_jump_elevation: 8.0,
            jump_jet_recharge_rate: 0.25,
            jump_jet_velocity_z: 0.05,
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            power_on_seconds: 5.0,
            power_off_seconds: 2.0,
        }
    }
}

impl SimConfig {
    /// Duration of one tick in seconds.
    #[must_use]
    pub fn seconds_per_tick(&self) -> f64 {
        1.0 / f64::from(self.tick_rate)
    }

    /// Convert seconds to a (fractional) tick count.
    #[must_use]
    pub fn ticks(&self, seconds: f64) -> f64 {
        seconds * f64::from(self.tick_rate)
    }

    /// Convert seconds to a whole tick count, rounded to nearest.
    #[must_use]
    pub fn whole_ticks(&self, seconds: f64) -> u32 {
        self.ticks(seconds).round().max(0.0) as u32
    }

    /// Convert meters/second to world units per tick.
    #[must_use]
    pub fn velocity_per_tick(&self, meters_per_second: f64) -> f64 {
        meters_per_second / self.meters_per_unit / f64::from(self.tick_rate)
    }

    /// Convert kilometers/hour to world units per tick.
    #[must_use]
    pub fn kph_to_units_per_tick(&self, kph: f64) -> f64 {
        self.velocity_per_tick(kph / 3.6)
    }

    /// Convert meters to world units.
    #[must_use]
    pub fn meters_to_units(&self, meters: f64) -> f64 {
        meters / self.meters_per_unit
    }

    /// Power-on sequence length in ticks.
    #[must_use]
    pub fn power_on_ticks(&self) -> u32 {
        self.whole_ticks(self.power.power_on_seconds)
    }

    /// Power-off sequence length in ticks.
    #[must_use]
    pub fn power_off_ticks(&self) -> u32 {
        self.whole_ticks(self.power.power_off_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_power_on_is_five_seconds() {
        let config = SimConfig::default();
        assert_eq!(config.power_on_ticks(), 300);
        assert_eq!(config.power_off_ticks(), 120);
    }

    #[test]
    fn test_velocity_conversion() {
        let config = SimConfig {
            meters_per_unit: 2.0,
            ..Default::default()
        };
        // 120 m/s over 2 m units at 60 Hz = 1 unit per tick
        assert!((config.velocity_per_tick(120.0) - 1.0).abs() < 1e-12);
        assert!((config.kph_to_units_per_tick(432.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimConfig = ron::from_str("(tick_rate: 30)").unwrap();
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.heat, HeatConfig::default());
        assert_eq!(config.power_on_ticks(), 150);
    }
}
