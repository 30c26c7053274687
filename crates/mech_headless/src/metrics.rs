//! Battle metrics for balance checks.

use std::collections::BTreeMap;

use mech_core::battle::{Battle, TickEvents};
use mech_core::entity::{Entity, EntityId};
use mech_core::units::{PowerState, Unit};
use serde::{Deserialize, Serialize};

/// Complete metrics for a single battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Battle seed.
    pub seed: u64,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// Last team standing (None = draw or time limit).
    pub winner: Option<u32>,
    /// How the battle ended.
    pub end_reason: EndReason,
    /// Per-team totals.
    pub teams: BTreeMap<u32, TeamMetrics>,
    /// Per-unit records, in placement order.
    pub units: Vec<UnitReport>,
    /// Final battle state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Why a battle stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Still running.
    #[default]
    InProgress,
    /// One team left.
    Elimination,
    /// Every unit destroyed.
    MutualDestruction,
    /// Tick limit reached.
    TimeLimit,
}

/// Totals for one team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMetrics {
    /// Units at the start.
    pub units_deployed: u32,
    /// Units destroyed.
    pub units_lost: u32,
    /// Projectiles launched.
    pub shots: u32,
    /// Projectiles that hit.
    pub hits: u32,
    /// Damage dealt to other teams.
    pub damage_dealt: f64,
    /// Damage taken.
    pub damage_taken: f64,
    /// Overheat shutdowns.
    pub heat_shutdowns: u32,
}

impl TeamMetrics {
    /// Hits per shot.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            f64::from(self.hits) / f64::from(self.shots)
        }
    }
}

/// State of one unit at the end of the battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    /// Battle id.
    pub id: u64,
    /// Unit name.
    pub name: String,
    /// Team.
    pub team: u32,
    /// Armor left, as a fraction.
    pub armor_ratio: f64,
    /// Structure left, as a fraction.
    pub structure_ratio: f64,
    /// Heat at the end.
    pub heat: f64,
    /// Tick of destruction, if destroyed.
    pub destroyed_at: Option<u64>,
}

/// Folds tick events into [`BattleMetrics`].
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: BattleMetrics,
    teams: BTreeMap<EntityId, u32>,
    roster: Vec<EntityId>,
}

impl MetricsCollector {
    /// Start collecting for a freshly deployed battle.
    #[must_use]
    pub fn new(scenario: impl Into<String>, battle: &Battle, roster: &[EntityId]) -> Self {
        let mut metrics = BattleMetrics {
            scenario: scenario.into(),
            seed: battle.seed(),
            ..Default::default()
        };
        let mut teams = BTreeMap::new();
        for &id in roster {
            let Some(unit) = battle.unit(id) else {
                continue;
            };
            let team = unit.unit().team;
            teams.insert(id, team);
            metrics.teams.entry(team).or_default().units_deployed += 1;
            metrics.units.push(UnitReport {
                id: id.0,
                name: unit.name().to_string(),
                team,
                armor_ratio: 1.0,
                structure_ratio: 1.0,
                ..Default::default()
            });
        }
        Self {
            metrics,
            teams,
            roster: roster.to_vec(),
        }
    }

    /// Record one tick's events. `tick` is the battle tick after the step.
    pub fn record(&mut self, tick: u64, events: &TickEvents) {
        for shot in &events.shots {
            if let Some(team) = self.team_of(shot.unit) {
                team.shots += 1;
            }
        }
        for hit in &events.hits {
            if let Some(team) = hit.source.and_then(|s| self.teams.get(&s).copied()) {
                if let Some(metrics) = self.metrics.teams.get_mut(&team) {
                    metrics.hits += 1;
                    metrics.damage_dealt += hit.damage;
                }
            }
            if let Some(team) = self.team_of(hit.target) {
                team.damage_taken += hit.damage;
            }
        }
        for transition in &events.power_transitions {
            if transition.to == PowerState::OffHeat {
                if let Some(team) = self.team_of(transition.unit) {
                    team.heat_shutdowns += 1;
                }
            }
        }
        for &id in &events.destroyed {
            if let Some(team) = self.team_of(id) {
                team.units_lost += 1;
            }
            if let Some(report) = self.metrics.units.iter_mut().find(|r| r.id == id.0) {
                report.destroyed_at = Some(tick);
                report.armor_ratio = 0.0;
                report.structure_ratio = 0.0;
            }
        }
    }

    fn team_of(&mut self, id: EntityId) -> Option<&mut TeamMetrics> {
        let team = self.teams.get(&id)?;
        self.metrics.teams.get_mut(team)
    }

    /// Close out the metrics with final unit state.
    #[must_use]
    pub fn finish(mut self, battle: &Battle, end_reason: EndReason) -> BattleMetrics {
        for (report, id) in self.metrics.units.iter_mut().zip(&self.roster) {
            if let Some(unit) = battle.unit(*id) {
                report.armor_ratio = unit.entity().armor_ratio();
                report.structure_ratio = unit.entity().structure_ratio();
                report.heat = unit.heat();
            }
        }
        let alive = battle.teams_alive();
        self.metrics.winner = match end_reason {
            EndReason::Elimination => alive.iter().next().copied(),
            _ => None,
        };
        self.metrics.end_reason = end_reason;
        self.metrics.duration_ticks = battle.get_tick();
        self.metrics.final_state_hash = battle.state_hash();
        self.metrics
    }
}

/// Aggregate over many battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Battles run.
    pub battles: u32,
    /// Wins per team.
    pub wins: BTreeMap<u32, u32>,
    /// Battles with no winner.
    pub draws: u32,
    /// Mean battle length, ticks.
    pub avg_duration_ticks: f64,
    /// Mean accuracy per team.
    pub avg_accuracy: BTreeMap<u32, f64>,
}

impl BatchSummary {
    /// Summarize a set of battles.
    #[must_use]
    pub fn from_battles(battles: &[BattleMetrics]) -> Self {
        let mut summary = Self {
            battles: battles.len() as u32,
            ..Default::default()
        };
        if battles.is_empty() {
            return summary;
        }

        let mut accuracy: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        let mut total_ticks = 0.0;
        for battle in battles {
            match battle.winner {
                Some(team) => *summary.wins.entry(team).or_default() += 1,
                None => summary.draws += 1,
            }
            total_ticks += battle.duration_ticks as f64;
            for (&team, metrics) in &battle.teams {
                accuracy.entry(team).or_default().push(metrics.accuracy());
            }
        }
        summary.avg_duration_ticks = total_ticks / battles.len() as f64;
        summary.avg_accuracy = accuracy
            .into_iter()
            .map(|(team, values)| (team, values.iter().sum::<f64>() / values.len() as f64))
            .collect();
        summary
    }
}
