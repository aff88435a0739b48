// tests/recorder.rs
// Durability properties of the history log, snapshot and CSV export.

use chrono::DateTime;
use std::fs;
use std::path::Path;

use pellet_tracker::config::OutputConfig;
use pellet_tracker::record::PriceRecord;
use pellet_tracker::store::Recorder;

fn record(id: &str, price: f64, ts: &str) -> PriceRecord {
    PriceRecord {
        product_id: id.to_string(),
        product_name: format!("Pellet {id}"),
        price,
        currency: "PLN".to_string(),
        unit: "per-bag".to_string(),
        weight_kg: Some(15.0),
        price_per_kg: None,
        raw_price: Some(format!("{price} zł")),
        method: "woocommerce".to_string(),
        source_url: format!("https://shop.test/{id}"),
        fetched_at: DateTime::parse_from_rfc3339(ts).unwrap(),
    }
}

fn output(dir: &Path) -> OutputConfig {
    OutputConfig {
        dir: dir.to_path_buf(),
    }
}

#[test]
fn repeated_run_doubles_history_and_keeps_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let out = output(tmp.path());
    let recorder = Recorder::new(&out);

    let batch = vec![
        record("pellet-a", 100.0, "2025-01-15T07:00:00+01:00"),
        record("pellet-b", 120.0, "2025-01-15T07:00:00+01:00"),
    ];

    recorder.record_run(&batch).unwrap();
    let history_1 = fs::read_to_string(out.history_path()).unwrap();
    let snapshot_1 = fs::read(out.snapshot_path()).unwrap();
    assert_eq!(history_1.lines().count(), 2);

    // Appending the identical batch again never deduplicates history, but
    // the snapshot content does not change.
    recorder.record_run(&batch).unwrap();
    let history_2 = fs::read_to_string(out.history_path()).unwrap();
    let snapshot_2 = fs::read(out.snapshot_path()).unwrap();
    assert_eq!(history_2.lines().count(), 4);
    assert_eq!(snapshot_1, snapshot_2);
}

#[test]
fn csv_regeneration_is_byte_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let out = output(tmp.path());
    let recorder = Recorder::new(&out);

    recorder
        .record_run(&[
            record("pellet-a", 100.0, "2025-01-15T07:00:00+01:00"),
            record("pellet-b", 120.5, "2025-01-15T07:00:00+01:00"),
        ])
        .unwrap();

    let first = fs::read(out.csv_path()).unwrap();
    recorder.rewrite_csv().unwrap();
    let second = fs::read(out.csv_path()).unwrap();
    assert_eq!(first, second);

    // A fresh recorder over the same history produces the same bytes too.
    Recorder::new(&out).rewrite_csv().unwrap();
    let third = fs::read(out.csv_path()).unwrap();
    assert_eq!(first, third);
}

#[test]
fn csv_rows_are_sorted_by_time_then_product() {
    let tmp = tempfile::tempdir().unwrap();
    let out = output(tmp.path());
    let recorder = Recorder::new(&out);

    // Later timestamp lands in history first.
    recorder
        .record_run(&[record("pellet-b", 120.0, "2025-01-16T07:00:00+01:00")])
        .unwrap();
    recorder
        .record_run(&[record("pellet-a", 100.0, "2025-01-15T07:00:00+01:00")])
        .unwrap();

    let csv = fs::read_to_string(out.csv_path()).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].starts_with("product_id,"));
    assert!(rows[1].starts_with("pellet-a,"));
    assert!(rows[2].starts_with("pellet-b,"));
}

#[test]
fn missing_product_keeps_previous_snapshot_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let out = output(tmp.path());
    let recorder = Recorder::new(&out);

    recorder
        .record_run(&[
            record("pellet-a", 100.0, "2025-01-15T07:00:00+01:00"),
            record("pellet-b", 120.0, "2025-01-15T07:00:00+01:00"),
        ])
        .unwrap();
    recorder
        .record_run(&[record("pellet-a", 110.0, "2025-01-16T07:00:00+01:00")])
        .unwrap();

    let snapshot: std::collections::BTreeMap<String, PriceRecord> =
        serde_json::from_str(&fs::read_to_string(out.snapshot_path()).unwrap()).unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["pellet-a"].price, 110.0);
    // pellet-b was absent from the second run and keeps its first entry.
    assert_eq!(snapshot["pellet-b"].price, 120.0);
    assert_eq!(
        snapshot["pellet-b"].fetched_at,
        DateTime::parse_from_rfc3339("2025-01-15T07:00:00+01:00").unwrap()
    );
}

#[test]
fn empty_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let out = output(tmp.path());
    Recorder::new(&out).record_run(&[]).unwrap();

    assert!(!out.history_path().exists());
    assert!(!out.snapshot_path().exists());
    assert!(!out.csv_path().exists());
}
