//! Aggregator: drives the fetcher across identifiers, merges and persists.

use crate::config::PipelineConfig;
use crate::data::fetcher::{FetchOutcome, Fetcher};
use crate::data::provider::PriceProvider;
use crate::domain::PriceRow;
use crate::export::{write_csv, ExportError};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Progress callback for a multi-identifier run.
pub trait FetchProgress {
    /// Called before an identifier is fetched.
    fn on_start(&self, identifier: &str, index: usize, total: usize);

    /// Called with the outcome of each fetch.
    fn on_outcome(&self, identifier: &str, index: usize, total: usize, outcome: &FetchOutcome);

    /// Called once the run is over, file written or not.
    fn on_batch_complete(&self, summary: &RunSummary);
}

/// Progress reporter that emits `tracing` events.
pub struct LogProgress;

impl FetchProgress for LogProgress {
    fn on_start(&self, identifier: &str, index: usize, total: usize) {
        info!(%identifier, "[{}/{}] processing", index + 1, total);
    }

    fn on_outcome(&self, identifier: &str, _index: usize, _total: usize, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Rows(rows) => info!(%identifier, rows = rows.len(), "fetched"),
            FetchOutcome::NoData => warn!(%identifier, "no data, skipping"),
            FetchOutcome::Failed(e) => warn!(%identifier, error = %e, "fetch failed, skipping"),
        }
    }

    fn on_batch_complete(&self, summary: &RunSummary) {
        summary.log_summary();
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _identifier: &str, _index: usize, _total: usize) {}
    fn on_outcome(&self, _: &str, _: usize, _: usize, _: &FetchOutcome) {}
    fn on_batch_complete(&self, _summary: &RunSummary) {}
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub with_data: usize,
    pub empty: usize,
    pub failed: usize,
    pub rows_written: usize,
    /// Set only when a file was written.
    pub output: Option<PathBuf>,
    /// BLAKE3 of the written file.
    pub dataset_hash: Option<String>,
    /// `(identifier, error message)` per failed fetch.
    pub failures: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn wrote_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn log_summary(&self) {
        let output = self
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        info!(
            total = self.total,
            with_data = self.with_data,
            empty = self.empty,
            failed = self.failed,
            rows_written = self.rows_written,
            output = %output,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "run complete"
        );
    }
}

/// Concatenate per-identifier tables and sort by `(stock_id, date)`.
///
/// The sort is stable, so rows sharing a key keep the order they arrived in.
pub fn merge_rows(tables: Vec<Vec<PriceRow>>) -> Vec<PriceRow> {
    let mut rows: Vec<PriceRow> = tables.into_iter().flatten().collect();
    rows.sort_by(|a, b| {
        a.stock_id()
            .cmp(b.stock_id())
            .then_with(|| a.date().cmp(&b.date()))
    });
    rows
}

/// Run the pipeline described by `config`.
pub fn run<P: PriceProvider>(
    fetcher: &Fetcher<P>,
    config: &PipelineConfig,
    progress: &dyn FetchProgress,
) -> Result<RunSummary, ExportError> {
    run_batch(
        fetcher,
        &config.identifiers,
        config.start,
        config.end,
        &config.output,
        progress,
    )
}

/// Fetch each identifier in order, merge what came back and write it to
/// `output`.
///
/// Per-identifier failures never abort the run. When nothing came back no
/// file is written and the summary has `output == None`. Only a failed write
/// is returned as an error.
pub fn run_batch<P: PriceProvider>(
    fetcher: &Fetcher<P>,
    identifiers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
    progress: &dyn FetchProgress,
) -> Result<RunSummary, ExportError> {
    let started = Instant::now();
    let total = identifiers.len();
    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    let mut tables: Vec<Vec<PriceRow>> = Vec::new();

    for (i, identifier) in identifiers.iter().enumerate() {
        progress.on_start(identifier, i, total);
        let outcome = fetcher.fetch_quotes(identifier, start, end);
        progress.on_outcome(identifier, i, total, &outcome);

        match outcome {
            FetchOutcome::Rows(quotes) if !quotes.is_empty() => {
                summary.with_data += 1;
                tables.push(quotes.into_iter().map(PriceRow::from_quote).collect());
            }
            FetchOutcome::Rows(_) | FetchOutcome::NoData => summary.empty += 1,
            FetchOutcome::Failed(e) => {
                summary.failed += 1;
                summary.failures.push((identifier.clone(), e.to_string()));
            }
        }
    }

    if tables.is_empty() {
        warn!("no data for any identifier; check the identifier list and date range");
        summary.elapsed = started.elapsed();
        progress.on_batch_complete(&summary);
        return Ok(summary);
    }

    let rows = merge_rows(tables);
    let written = write_csv(&rows, output)?;
    info!(rows = written.rows, path = %written.path.display(), "wrote price table");

    summary.rows_written = written.rows;
    summary.output = Some(written.path);
    summary.dataset_hash = Some(written.content_hash);
    summary.elapsed = started.elapsed();
    progress.on_batch_complete(&summary);
    Ok(summary)
}
