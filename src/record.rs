//! record.rs — core data shapes shared by the fetch, parse and store stages.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One observed price for one tracked product. Immutable once appended to
/// the history log; every record of a run carries the run's start timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    /// ISO currency code, e.g. "PLN".
    pub currency: String,
    /// Sales unit the price applies to, e.g. "per-bag" or "per-pallet".
    pub unit: String,
    /// Shipped weight when the page states one.
    pub weight_kg: Option<f64>,
    /// `price / weight_kg`, rounded to 6 decimal places.
    pub price_per_kg: Option<f64>,
    /// Price text exactly as matched on the page.
    pub raw_price: Option<String>,
    /// Extraction strategy that produced this record.
    pub method: String,
    pub source_url: String,
    pub fetched_at: DateTime<FixedOffset>,
}

/// Outcome of one scheduled invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    /// Every configured product yielded a record.
    Success,
    /// Some products yielded records, some failed.
    Partial,
    /// No product yielded a record.
    Failure,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunOutcome::Success => "success",
            RunOutcome::Partial => "partial",
            RunOutcome::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// Audit record of one invocation, appended to the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: DateTime<FixedOffset>,
    pub outcome: RunOutcome,
    pub products_fetched: usize,
    pub products_failed: usize,
}

/// Per-product fetch failure. Never aborts the run; counted in the RunEntry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Per-product parse failure. Never aborts the run; counted in the RunEntry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("no price found on page")]
    MissingPrice,
    #[error("unrecognized currency marker in {0:?}")]
    UnknownCurrency(String),
    #[error("document contains no text")]
    EmptyDocument,
}
