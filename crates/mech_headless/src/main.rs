//! Headless mech battle runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a single battle and print its metrics
//! cargo run -p mech_headless -- run --scenario scenarios/duel.ron --seed 7
//!
//! # Run a batch and write results
//! cargo run -p mech_headless -- batch --scenario scenarios/skirmish.ron --count 500 --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p mech_headless -- verify --scenario scenarios/skirmish.ron --runs 5
//! ```
//!
//! Output (stdout): JSON
//! Logs (stderr): filtered by `RUST_LOG`, `--verbose` for debug

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mech_headless::{
    batch::{run_batch, verify_determinism},
    runner::HeadlessRunner,
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "mech_headless")]
#[command(about = "Headless mech battle runner for balance checks and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single battle
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Battle seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Override the scenario's tick limit
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Run a batch of battles over consecutive seeds
    Batch {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Write full results to this JSON file instead of printing the summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is for JSON
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            max_ticks,
        } => cmd_run(&scenario, seed, max_ticks),
        Commands::Batch {
            scenario,
            count,
            seed,
            output,
        } => cmd_batch(&scenario, count, seed, output),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Run a single battle
fn cmd_run(path: &Path, seed: u64, max_ticks: Option<u64>) -> CmdResult {
    let mut scenario = Scenario::load(path)?;
    if let Some(max_ticks) = max_ticks {
        scenario.max_ticks = max_ticks;
    }
    let metrics = HeadlessRunner::new(&scenario, seed)?.run();
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(ExitCode::SUCCESS)
}

/// Run a batch of battles
fn cmd_batch(path: &Path, count: u32, seed: u64, output: Option<PathBuf>) -> CmdResult {
    let scenario = Scenario::load(path)?;
    let results = run_batch(&scenario, count, seed);
    tracing::info!(
        battles = results.summary.battles,
        draws = results.summary.draws,
        errors = results.errors.len(),
        seconds = results.duration_seconds,
        "Batch complete"
    );

    match output {
        Some(output) => {
            results.save(&output)?;
            tracing::info!("Results written to {}", output.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&results.summary)?),
    }

    Ok(if results.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Verify determinism
fn cmd_verify(path: &Path, seed: u64, runs: u32) -> CmdResult {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        path.display(),
        seed,
        runs
    );
    let scenario = Scenario::load(path)?;

    if verify_determinism(&scenario, seed, runs)? {
        eprintln!("PASS: All {runs} runs produced identical results");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        Ok(ExitCode::FAILURE)
    }
}
