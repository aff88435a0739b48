//! runlog.rs — plain-text audit trail, one line per invocation.
//!
//! Logging here must never fail the run: errors are reported at warn level
//! and otherwise swallowed, so a missing line is the only symptom.

use chrono::SecondsFormat;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::record::RunEntry;

pub fn append(path: &Path, entry: &RunEntry) {
    if let Err(e) = try_append(path, entry) {
        tracing::warn!(error = %e, path = %path.display(), "could not write run log entry");
    }
}

fn try_append(path: &Path, entry: &RunEntry) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{}", format_entry(entry))
}

pub fn format_entry(entry: &RunEntry) -> String {
    format!(
        "started={} finished={} outcome={} fetched={} failed={}",
        entry.started_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        entry.finished_at.to_rfc3339_opts(SecondsFormat::Secs, false),
        entry.outcome,
        entry.products_fetched,
        entry.products_failed,
    )
}
