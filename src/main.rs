//! Pellet price tracker — binary entrypoint.
//!
//! One invocation performs exactly one tracking run; an external scheduler
//! provides the cadence. Exit status is 0 when at least one product was
//! fetched, non-zero otherwise.

use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pellet_tracker::config::Config;
use pellet_tracker::fetch::HttpSource;
use pellet_tracker::record::{RunEntry, RunOutcome};
use pellet_tracker::runlock::RunLock;
use pellet_tracker::{pipeline, runlog};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pellet_tracker=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(RunOutcome::Failure) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("FAILED - {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<RunOutcome> {
    let cfg = Config::load_default()?;

    match track(&cfg).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            // The audit trail still records the aborted run.
            let now = Local::now().fixed_offset();
            runlog::append(
                &cfg.output.run_log_path(),
                &RunEntry {
                    started_at: now,
                    finished_at: now,
                    outcome: RunOutcome::Failure,
                    products_fetched: 0,
                    products_failed: 0,
                },
            );
            Err(e)
        }
    }
}

async fn track(cfg: &Config) -> anyhow::Result<RunOutcome> {
    std::fs::create_dir_all(&cfg.output.dir)
        .with_context(|| format!("creating output directory {}", cfg.output.dir.display()))?;
    let _lock = RunLock::acquire(cfg.output.lock_path())?;

    let source = HttpSource::new(&cfg.fetch)?;
    let report = pipeline::run_once(cfg, &source).await?;

    match report.entry.outcome {
        RunOutcome::Failure => {
            eprintln!("no product could be fetched this run:");
            for (id, reason) in &report.failures {
                eprintln!("  {id}: {reason}");
            }
        }
        _ => println!(
            "OK - {}/{} products finished correctly",
            report.records.len(),
            cfg.products.len()
        ),
    }

    Ok(report.entry.outcome)
}
