//! Batch battle runner for balance testing.
//!
//! Runs one scenario over a range of seeds in parallel using rayon.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::{BatchSummary, BattleMetrics};
use crate::runner::HeadlessRunner;
use crate::scenario::{Scenario, ScenarioError};

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// First seed.
    pub seed_start: u64,
    /// Individual battle metrics, in seed order.
    pub battles: Vec<BattleMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Seeds that failed to deploy, with the reason.
    pub errors: Vec<(u64, String)>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run `count` battles with seeds `seed_start..seed_start + count`.
pub fn run_batch(scenario: &Scenario, count: u32, seed_start: u64) -> BatchResults {
    let start = Instant::now();
    info!(scenario = %scenario.name, count, seed_start, "Starting batch");

    let outcomes: Vec<_> = (0..count)
        .into_par_iter()
        .map(|i| {
            let seed = seed_start + u64::from(i);
            HeadlessRunner::new(scenario, seed)
                .map(HeadlessRunner::run)
                .map_err(|e| (seed, e.to_string()))
        })
        .collect();

    let mut battles = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(metrics) => battles.push(metrics),
            Err((seed, reason)) => {
                warn!(seed, %reason, "Battle failed to deploy");
                errors.push((seed, reason));
            }
        }
    }

    let summary = BatchSummary::from_battles(&battles);
    BatchResults {
        scenario: scenario.name.clone(),
        seed_start,
        battles,
        summary,
        duration_seconds: start.elapsed().as_secs_f64(),
        errors,
    }
}

/// Run the same seed `runs` times and check every final hash matches.
pub fn verify_determinism(
    scenario: &Scenario,
    seed: u64,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        hashes.push(HeadlessRunner::new(scenario, seed)?.run().final_state_hash);
    }
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = include_str!("../scenarios/duel.ron");

    #[test]
    fn test_batch_runs_every_seed() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        let results = run_batch(&scenario, 4, 10);
        assert_eq!(results.battles.len(), 4);
        assert!(results.errors.is_empty());
        let seeds: Vec<u64> = results.battles.iter().map(|b| b.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13]);
        assert_eq!(results.summary.battles, 4);
    }

    #[test]
    fn test_results_round_trip_through_json() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        let results = run_batch(&scenario, 2, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("batch.json");
        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.battles.len(), 2);
        for (a, b) in loaded.battles.iter().zip(&results.battles) {
            assert_eq!(a.seed, b.seed);
            assert_eq!(a.winner, b.winner);
            assert_eq!(a.final_state_hash, b.final_state_hash);
        }
        assert_eq!(loaded.summary.wins, results.summary.wins);
    }

    #[test]
    fn test_verify_determinism() {
        let scenario = Scenario::from_ron_str(SCENARIO).unwrap();
        assert!(verify_determinism(&scenario, 5, 3).unwrap());
    }
}
