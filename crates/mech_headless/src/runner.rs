//! Single-battle runner.
//!
//! Gunnery is scripted, not AI: every unit turns (or traverses its turret)
//! toward the target its placement names and fires each weapon as soon as it
//! is ready. Units whose target is gone hold fire.

use mech_core::battle::{Battle, TickEvents};
use mech_core::entity::{Entity, EntityId};
use mech_core::math::{angle_distance, heading_to};
use mech_core::units::Unit;
use tracing::{debug, info, trace};

use crate::metrics::{BattleMetrics, EndReason, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// Runs one deployed scenario to completion.
#[derive(Debug)]
pub struct HeadlessRunner {
    battle: Battle,
    max_ticks: u64,
    metrics: MetricsCollector,
}

impl HeadlessRunner {
    /// Deploy `scenario` with `seed`.
    pub fn new(scenario: &Scenario, seed: u64) -> Result<Self, ScenarioError> {
        let deployment = scenario.deploy(seed)?;
        let metrics = MetricsCollector::new(&scenario.name, &deployment.battle, &deployment.units);
        Ok(Self {
            battle: deployment.battle,
            max_ticks: scenario.max_ticks,
            metrics,
        })
    }

    /// The battle being run.
    #[must_use]
    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Aim, queue ready weapons and advance one tick.
    pub fn step(&mut self) -> TickEvents {
        for id in self.battle.units().sorted_ids() {
            if self.aim(id) {
                if let Err(err) = self.battle.queue_ready_weapons(id) {
                    trace!(unit = %id, %err, "Could not queue weapons");
                }
            }
        }
        let events = self.battle.tick();
        let tick = self.battle.get_tick();
        for id in &events.destroyed {
            debug!(tick, unit = %id, "Unit lost");
        }
        self.metrics.record(tick, &events);
        events
    }

    /// Point a unit at its target. Returns false if it has none left.
    fn aim(&mut self, id: EntityId) -> bool {
        let Some(target) = self.battle.unit(id).and_then(Unit::target) else {
            return false;
        };
        let Some(aim) = self.battle.unit(target).map(Entity::position) else {
            return false;
        };
        let Some(unit) = self.battle.unit_mut(id) else {
            return false;
        };
        let turn = angle_distance(unit.heading(), heading_to(unit.position(), aim));
        if unit.unit().has_turret {
            unit.set_turret_angle(turn);
        } else {
            unit.set_target_relative_heading(turn);
        }
        true
    }

    /// Why the battle should stop now, if it should.
    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        match self.battle.teams_alive().len() {
            0 => Some(EndReason::MutualDestruction),
            1 => Some(EndReason::Elimination),
            _ if self.battle.get_tick() >= self.max_ticks => Some(EndReason::TimeLimit),
            _ => None,
        }
    }

    /// Run until one team is left or the tick limit is hit.
    pub fn run(mut self) -> BattleMetrics {
        let reason = loop {
            if let Some(reason) = self.end_reason() {
                break reason;
            }
            self.step();
        };
        let metrics = self.metrics.finish(&self.battle, reason);
        info!(
            scenario = %metrics.scenario,
            seed = metrics.seed,
            ticks = metrics.duration_ticks,
            winner = ?metrics.winner,
            reason = ?metrics.end_reason,
            "Battle finished"
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = include_str!("../scenarios/duel.ron");

    #[test]
    fn test_duel_runs_to_elimination() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        let metrics = HeadlessRunner::new(&scenario, 1).unwrap().run();

        assert_eq!(metrics.end_reason, EndReason::Elimination);
        assert!(metrics.winner.is_some());
        assert!(metrics.duration_ticks < scenario.max_ticks);
        let hits: u32 = metrics.teams.values().map(|t| t.hits).sum();
        assert!(hits > 0);
        assert!(metrics.units.iter().any(|u| u.destroyed_at.is_some()));
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        let a = HeadlessRunner::new(&scenario, 42).unwrap().run();
        let b = HeadlessRunner::new(&scenario, 42).unwrap().run();
        assert_eq!(a, b);
    }

    #[test]
    fn test_time_limit() {
        let mut scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        scenario.max_ticks = 10;
        let metrics = HeadlessRunner::new(&scenario, 1).unwrap().run();
        assert_eq!(metrics.end_reason, EndReason::TimeLimit);
        assert_eq!(metrics.duration_ticks, 10);
        assert_eq!(metrics.winner, None);
    }
}
