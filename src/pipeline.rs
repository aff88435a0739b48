//! One full tracking run: fetch, parse, persist, audit.

use anyhow::Result;
use chrono::Local;

use crate::config::Config;
use crate::fetch::PageSource;
use crate::parse;
use crate::record::{PriceRecord, RunEntry, RunOutcome};
use crate::runlog;
use crate::store::Recorder;

/// Everything a run produced, for the caller to summarize.
#[derive(Debug)]
pub struct RunReport {
    pub entry: RunEntry,
    pub records: Vec<PriceRecord>,
    /// (product_id, reason) for every product that yielded no record.
    pub failures: Vec<(String, String)>,
}

/// Fetch every configured product in order, parse what succeeded, persist the
/// records, and append a run log entry. Per-product failures never abort the
/// run; filesystem errors do.
pub async fn run_once(cfg: &Config, source: &dyn PageSource) -> Result<RunReport> {
    let started_at = Local::now().fixed_offset();
    let mut records = Vec::with_capacity(cfg.products.len());
    let mut failures = Vec::new();

    for (i, product) in cfg.products.iter().enumerate() {
        if i > 0 && cfg.fetch.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(cfg.fetch.delay_ms)).await;
        }

        let page = match source.fetch(&product.url).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(product = %product.id, url = %product.url, error = %e, "fetch failed");
                failures.push((product.id.clone(), e.to_string()));
                continue;
            }
        };

        match parse::parse_page(product, &page, started_at) {
            Ok(record) => {
                tracing::info!(
                    product = %product.id,
                    price = record.price,
                    currency = %record.currency,
                    "price extracted"
                );
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(product = %product.id, url = %product.url, error = %e, "parse failed");
                failures.push((product.id.clone(), e.to_string()));
            }
        }
    }

    // History append order must not depend on fetch completion order.
    records.sort_by(|a, b| a.product_id.cmp(&b.product_id));

    let outcome = if records.is_empty() {
        RunOutcome::Failure
    } else if failures.is_empty() {
        RunOutcome::Success
    } else {
        RunOutcome::Partial
    };

    // A run with zero successes leaves history, snapshot and CSV untouched.
    if !records.is_empty() {
        Recorder::new(&cfg.output).record_run(&records)?;
    }

    let entry = RunEntry {
        started_at,
        finished_at: Local::now().fixed_offset(),
        outcome,
        products_fetched: records.len(),
        products_failed: failures.len(),
    };
    runlog::append(&cfg.output.run_log_path(), &entry);

    tracing::info!(
        outcome = %entry.outcome,
        fetched = entry.products_fetched,
        failed = entry.products_failed,
        "run finished"
    );

    Ok(RunReport {
        entry,
        records,
        failures,
    })
}
