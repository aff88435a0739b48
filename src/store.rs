//! Durable run output: history log, latest snapshot, CSV export.
//!
//! History is append-only JSON Lines and is never rewritten. The snapshot and
//! the CSV export are replaced via tmp file + rename; readers never see a
//! half-written file.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::record::PriceRecord;

pub struct Recorder {
    history_path: PathBuf,
    snapshot_path: PathBuf,
    csv_path: PathBuf,
}

impl Recorder {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            history_path: output.history_path(),
            snapshot_path: output.snapshot_path(),
            csv_path: output.csv_path(),
        }
    }

    /// Persist one run's records: append to history, fold into the snapshot,
    /// regenerate the CSV export. A run with no records writes nothing.
    pub fn record_run(&self, records: &[PriceRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.append_history(records)?;
        self.update_snapshot(records)?;
        self.rewrite_csv()?;
        Ok(())
    }

    fn append_history(&self, records: &[PriceRecord]) -> Result<()> {
        // Serialize every line up front so the file only ever receives
        // complete records.
        let mut buf = String::with_capacity(records.len() * 256);
        for r in records {
            buf.push_str(&serde_json::to_string(r).context("encoding history record")?);
            buf.push('\n');
        }

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)
            .with_context(|| format!("opening history log {}", self.history_path.display()))?;
        f.write_all(buf.as_bytes())
            .with_context(|| format!("appending to history log {}", self.history_path.display()))?;
        f.sync_all()
            .with_context(|| format!("syncing history log {}", self.history_path.display()))?;
        Ok(())
    }

    /// Fold this run's records into the snapshot and replace it wholesale.
    /// Products absent from the run keep their previous entry.
    fn update_snapshot(&self, records: &[PriceRecord]) -> Result<()> {
        let mut snapshot: BTreeMap<String, PriceRecord> =
            match fs::read_to_string(&self.snapshot_path) {
                Ok(s) => serde_json::from_str(&s).with_context(|| {
                    format!("parsing snapshot {}", self.snapshot_path.display())
                })?,
                Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("reading snapshot {}", self.snapshot_path.display())
                    })
                }
            };

        for r in records {
            snapshot.insert(r.product_id.clone(), r.clone());
        }

        let mut json = serde_json::to_string_pretty(&snapshot).context("encoding snapshot")?;
        json.push('\n');
        write_atomic(&self.snapshot_path, json.as_bytes())
    }

    /// Read the full history back, tolerating a missing file on first run.
    pub fn read_history(&self) -> Result<Vec<PriceRecord>> {
        let content = match fs::read_to_string(&self.history_path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("reading history log {}", self.history_path.display())
                })
            }
        };

        let mut out = Vec::new();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let r: PriceRecord = serde_json::from_str(line)
                .with_context(|| format!("parsing history line {}", i + 1))?;
            out.push(r);
        }
        Ok(out)
    }

    /// Regenerate the CSV export from the full history. Output is
    /// deterministic: stable sort by (fetched_at, product_id), fixed header.
    pub fn rewrite_csv(&self) -> Result<()> {
        let mut records = self.read_history()?;
        records.sort_by(|a, b| {
            a.fetched_at
                .cmp(&b.fetched_at)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        let mut w = csv::Writer::from_writer(Vec::new());
        for r in &records {
            w.serialize(r).context("encoding csv row")?;
        }
        let bytes = w
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing csv buffer: {e}"))?;
        write_atomic(&self.csv_path, &bytes)
    }
}

/// Replace `path` contents in one step: write a sibling tmp file, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
