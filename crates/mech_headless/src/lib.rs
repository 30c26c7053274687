//! Headless battle runner for balance checks and CI verification.
//!
//! Loads a RON [`Scenario`], runs it with scripted fire-when-ready gunnery
//! and reports [`BattleMetrics`] as JSON. This enables:
//!
//! - **Balance checks**: batch runs over many seeds
//! - **CI verification**: determinism checks on fixed seeds
//!
//! # Example
//!
//! ```bash
//! # Run one battle
//! cargo run -p mech_headless -- run --scenario crates/mech_headless/scenarios/duel.ron
//!
//! # Run a batch
//! cargo run -p mech_headless -- batch --scenario crates/mech_headless/scenarios/skirmish.ron --count 100
//!
//! # Verify determinism
//! cargo run -p mech_headless -- verify --scenario crates/mech_headless/scenarios/skirmish.ron
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchResults};
pub use metrics::{BatchSummary, BattleMetrics, EndReason, MetricsCollector};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
