//! Integration tests for the fetch → merge → export pipeline.
//!
//! The provider is an in-memory double keyed by provider key, so every
//! scenario runs without the network.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use twquote_core::data::{Cell, ColumnLabel, RawDate, RawFrame};
use twquote_core::{
    run, run_batch, DataError, FetchOutcome, FetchProgress, Fetcher, NoProgress, PipelineConfig,
    PriceProvider, RunSummary, PRICE_COLUMNS,
};

enum Response {
    Frame(RawFrame),
    Fail(&'static str),
}

/// Provider double that serves canned responses and records requested keys.
#[derive(Default)]
struct CannedProvider {
    responses: HashMap<String, Response>,
    requested: Mutex<Vec<String>>,
}

impl CannedProvider {
    fn with(mut self, key: &str, response: Response) -> Self {
        self.responses.insert(key.to_string(), response);
        self
    }
}

impl PriceProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    fn fetch_frame(
        &self,
        key: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<RawFrame, DataError> {
        self.requested.lock().unwrap().push(key.to_string());
        match self.responses.get(key) {
            Some(Response::Frame(frame)) => Ok(frame.clone()),
            Some(Response::Fail(msg)) => Err(DataError::NetworkUnreachable(msg.to_string())),
            None => Ok(RawFrame::empty()),
        }
    }
}

/// Nested-label frame the way a multi-ticker download shapes it.
fn nested_frame(key: &str, rows: &[(&str, f64, i64)]) -> RawFrame {
    let index = rows.iter().map(|(d, _, _)| RawDate::Text(d.to_string())).collect();
    let closes = rows.iter().map(|(_, c, _)| Cell::Float(*c)).collect::<Vec<_>>();
    let volumes = rows.iter().map(|(_, _, v)| Cell::Int(*v)).collect::<Vec<_>>();
    RawFrame::new(index)
        .with_column(ColumnLabel::nested(["Open", key]), closes.clone())
        .with_column(ColumnLabel::nested(["High", key]), closes.clone())
        .with_column(ColumnLabel::nested(["Low", key]), closes.clone())
        .with_column(ColumnLabel::nested(["Close", key]), closes)
        .with_column(ColumnLabel::nested(["Volume", key]), volumes)
}

fn config(identifiers: &[&str], output: &Path) -> PipelineConfig {
    PipelineConfig {
        identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        ..PipelineConfig::default()
    }
    .with_output(output)
}

/// Written file without the BOM, split into lines.
fn read_lines(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "missing BOM");
    String::from_utf8(bytes[3..].to_vec())
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn one_identifier_with_data_one_empty() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let provider = CannedProvider::default().with(
        "2330.TW",
        Response::Frame(nested_frame(
            "2330.TW",
            &[("2024-01-02", 593.0, 26_059_058), ("2024-01-03", 578.0, 37_106_763)],
        )),
    );
    let fetcher = Fetcher::new(provider, ".TW");

    let summary = run(&fetcher, &config(&["2330", "2317"], &out), &NoProgress).unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.with_data, 1);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.rows_written, 2);

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], PRICE_COLUMNS.join(","));
    assert_eq!(lines[1], "2024-01-02,2330,593.0,593.0,593.0,593.0,26059058,,,,");
    assert_eq!(lines[2], "2024-01-03,2330,578.0,578.0,578.0,578.0,37106763,,,,");
    assert_eq!(
        *fetcher.provider().requested.lock().unwrap(),
        ["2330.TW", "2317.TW"]
    );
}

#[test]
fn all_empty_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let fetcher = Fetcher::new(CannedProvider::default(), ".TW");

    let summary = run(&fetcher, &config(&["2330", "2317"], &out), &NoProgress).unwrap();

    assert!(!summary.wrote_output());
    assert_eq!(summary.empty, 2);
    assert_eq!(summary.rows_written, 0);
    assert!(!out.exists());
}

#[test]
fn failures_are_skipped_and_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let provider = CannedProvider::default()
        .with("2317.TW", Response::Fail("connection reset"))
        .with(
            "2454.TW",
            Response::Frame(nested_frame("2454.TW", &[("2024-01-02", 1090.0, 4_100_000)])),
        );
    let fetcher = Fetcher::new(provider, ".TW");

    let summary = run(&fetcher, &config(&["2317", "2454"], &out), &NoProgress).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.with_data, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, "2317");
    assert!(summary.failures[0].1.contains("connection reset"));

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("2024-01-02,2454,"));
}

#[test]
fn output_sorted_across_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let provider = CannedProvider::default()
        .with(
            "2454.TW",
            Response::Frame(nested_frame(
                "2454.TW",
                &[("2024-01-03", 2.0, 2), ("2024-01-02", 1.0, 1)],
            )),
        )
        .with(
            "2330.TW",
            Response::Frame(nested_frame("2330.TW", &[("2024-01-04", 3.0, 3)])),
        );
    let fetcher = Fetcher::new(provider, ".TW");

    run(&fetcher, &config(&["2454", "2330"], &out), &NoProgress).unwrap();

    let keys: Vec<(String, String)> = read_lines(&out)[1..]
        .iter()
        .map(|l| {
            let mut fields = l.split(',');
            let date = fields.next().unwrap().to_string();
            let id = fields.next().unwrap().to_string();
            (id, date)
        })
        .collect();
    assert_eq!(
        keys,
        [
            ("2330".to_string(), "2024-01-04".to_string()),
            ("2454".to_string(), "2024-01-02".to_string()),
            ("2454".to_string(), "2024-01-03".to_string()),
        ]
    );
}

#[test]
fn omitted_fields_keep_full_schema() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let frame = RawFrame::new(vec![RawDate::Text("2024-01-02".into())])
        .with_column(ColumnLabel::flat("Close"), vec![Cell::Text("593".into())]);
    let provider = CannedProvider::default().with("2330.TW", Response::Frame(frame));
    let fetcher = Fetcher::new(provider, ".TW");

    run(&fetcher, &config(&["2330"], &out), &NoProgress).unwrap();

    let lines = read_lines(&out);
    assert_eq!(lines[0], PRICE_COLUMNS.join(","));
    assert_eq!(lines[1], "2024-01-02,2330,,,,593.0,,,,,");
    assert_eq!(lines[1].split(',').count(), PRICE_COLUMNS.len());
}

#[test]
fn identical_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let provider = CannedProvider::default().with(
        "2330.TW",
        Response::Frame(nested_frame(
            "2330.TW",
            &[("2024-01-02", 593.0, 1), ("2024-01-03", 578.5, 2)],
        )),
    );
    let fetcher = Fetcher::new(provider, ".TW");
    let ids = vec!["2330".to_string()];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    let first = run_batch(&fetcher, &ids, start, end, &a, &NoProgress).unwrap();
    let second = run_batch(&fetcher, &ids, start, end, &b, &NoProgress).unwrap();

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    assert_eq!(first.dataset_hash, second.dataset_hash);
    assert!(first.dataset_hash.is_some());
}

#[test]
fn write_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let provider = CannedProvider::default().with(
        "2330.TW",
        Response::Frame(nested_frame("2330.TW", &[("2024-01-02", 1.0, 1)])),
    );
    let fetcher = Fetcher::new(provider, ".TW");

    let result = run(
        &fetcher,
        &config(&["2330"], &blocker.join("prices.csv")),
        &NoProgress,
    );
    assert!(result.is_err());
}

/// Progress double that records the callbacks it receives.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl FetchProgress for Recorder {
    fn on_start(&self, identifier: &str, index: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {identifier} {}/{total}", index + 1));
    }

    fn on_outcome(&self, identifier: &str, _index: usize, _total: usize, outcome: &FetchOutcome) {
        let kind = match outcome {
            FetchOutcome::Rows(rows) => format!("rows={}", rows.len()),
            FetchOutcome::NoData => "no-data".to_string(),
            FetchOutcome::Failed(_) => "failed".to_string(),
        };
        self.events.lock().unwrap().push(format!("{identifier} {kind}"));
    }

    fn on_batch_complete(&self, summary: &RunSummary) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done written={}", summary.rows_written));
    }
}

#[test]
fn progress_sees_every_outcome_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("prices.csv");
    let provider = CannedProvider::default()
        .with(
            "2330.TW",
            Response::Frame(nested_frame("2330.TW", &[("2024-01-02", 1.0, 1)])),
        )
        .with("2454.TW", Response::Fail("timeout"));
    let fetcher = Fetcher::new(provider, ".TW");
    let recorder = Recorder::default();

    run(&fetcher, &config(&["2330", "2317", "2454"], &out), &recorder).unwrap();

    assert_eq!(
        *recorder.events.lock().unwrap(),
        [
            "start 2330 1/3",
            "2330 rows=1",
            "start 2317 2/3",
            "2317 no-data",
            "start 2454 3/3",
            "2454 failed",
            "done written=1",
        ]
    );
}
