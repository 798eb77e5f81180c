//! Time Evaluation - sequential vs parallel engine sweep
//!
//! Runs both engines on a scenario, sweeps the parallel core budget over
//! powers of two and writes the averaged timings as a JSON report.

use clap::Parser;
use efield_core::{Scenario, TimeEvaluator};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "time_evaluation")]
#[command(about = "Benchmark the sequential and parallel electric field engines")]
struct Cli {
    /// Scenario JSON (viewport + charges); built-in three-charge scenario if omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Repetitions per measurement
    #[arg(long, default_value = "10")]
    times: usize,

    /// Largest core budget in the sweep
    #[arg(long, default_value = "1024")]
    max_cores: usize,

    /// Report destination
    #[arg(long, default_value = "tests.json")]
    output: PathBuf,
}

fn run(cli: Cli) -> efield_core::Result<()> {
    let scenario = match &cli.scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::default(),
    };
    info!("Viewport:\n{}", scenario.viewport);
    info!("Charges: {}", scenario.charges.len());

    let grid = scenario.viewport.sample_grid()?;
    let mut evaluator = TimeEvaluator::new(grid, scenario.charges)?;
    let report = evaluator.process(cli.times, cli.max_cores)?;

    info!("Sequential mean: {:.6}s", report.sequential_time);
    if let Some((cores, speedup)) = report.best_speedup() {
        info!("Best speedup: {:.3} at {} cores", speedup, cores);
    }
    report.save_json(&cli.output)
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "efield_core=info,time_evaluation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Evaluation failed: {}", e);
        std::process::exit(1);
    }
}
