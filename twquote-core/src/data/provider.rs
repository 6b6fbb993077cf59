//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over market-data sources so the fetcher
//! can be driven by Yahoo Finance in production and by an in-memory double in
//! tests.

use super::frame::RawFrame;
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {key}")]
    HttpStatus { key: String, status: u16 },

    #[error("symbol not found: {key}")]
    SymbolNotFound { key: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for market-data sources.
///
/// Implementations return the response in its raw tabular shape; the reshape
/// step owns the mapping onto the fixed quote schema.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the daily OHLCV series for a provider key over `[start, end]`.
    ///
    /// Whether `end` is inclusive is up to the provider.
    fn fetch_frame(&self, key: &str, start: NaiveDate, end: NaiveDate)
        -> Result<RawFrame, DataError>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_frame(
        &self,
        key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, DataError> {
        (**self).fetch_frame(key, start, end)
    }
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_frame(
        &self,
        key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, DataError> {
        (**self).fetch_frame(key, start, end)
    }
}
