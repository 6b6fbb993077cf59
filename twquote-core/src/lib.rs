//! twquote core: fetch, normalize and merge daily price history.
//!
//! This crate contains the whole batch pipeline:
//! - Domain types (daily quotes, placeholder fundamentals, price rows)
//! - Provider trait with a Yahoo Finance implementation
//! - Reshape from the provider's raw frame onto the fixed quote schema
//! - Per-identifier fetcher with a three-way outcome (rows / no data / failed)
//! - Aggregator that merges, sorts and writes the CSV
//! - TOML-backed run configuration

pub mod aggregate;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;

pub use aggregate::{merge_rows, run, run_batch, FetchProgress, LogProgress, NoProgress, RunSummary};
pub use config::{ConfigError, PipelineConfig, ProviderConfig};
pub use data::{DataError, FetchOutcome, Fetcher, PriceProvider, RawFrame, YahooProvider};
pub use domain::{DailyQuote, Fundamentals, PriceRow, PRICE_COLUMNS, QUOTE_COLUMNS};
pub use export::{render_csv, write_csv, ExportError, ExportOutcome};
