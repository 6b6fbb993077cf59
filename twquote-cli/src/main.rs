//! twquote CLI: fetch daily prices for the configured identifiers and write
//! the merged price table as CSV.
//!
//! With no `--config`, the built-in defaults are used (2330/2317/2454 on TWSE,
//! 2019-01-01 to 2024-12-31, `prices_fundamentals_taiwan.csv`).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use twquote_core::{run, Fetcher, LogProgress, PipelineConfig, YahooProvider};

#[derive(Parser)]
#[command(
    name = "twquote",
    version,
    about = "Fetch daily OHLCV history and write a sorted price table"
)]
struct Cli {
    /// Path to a TOML config file. Missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output CSV path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("twquote={0},twquote_core={0}", cli.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(output) = cli.output {
        config = config.with_output(output);
    }
    config.validate()?;

    tracing::info!(
        identifiers = ?config.identifiers,
        start = %config.start,
        end = %config.end,
        output = %config.output.display(),
        "starting run"
    );

    let provider = YahooProvider::new(&config.provider).context("failed to set up provider")?;
    let fetcher = Fetcher::new(provider, config.market_suffix.as_str());

    let summary = run(&fetcher, &config, &LogProgress)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    if !summary.wrote_output() {
        tracing::info!("nothing written");
    }

    Ok(())
}
