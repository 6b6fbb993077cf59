//! Quote rows, the unit of market data flowing through the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of a fetched quote table.
pub const QUOTE_COLUMNS: [&str; 7] = ["date", "stock_id", "open", "high", "low", "close", "volume"];

/// Column order of the persisted price table.
pub const PRICE_COLUMNS: [&str; 11] = [
    "date",
    "stock_id",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "pe",
    "pb",
    "roe",
    "gross_margin",
];

/// Daily OHLCV quote for a single identifier.
///
/// Every numeric field is optional: the provider may omit a column entirely
/// or send a value that does not coerce to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub stock_id: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl DailyQuote {
    /// A quote with only the key fields set.
    pub fn empty(stock_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            date,
            stock_id: stock_id.into(),
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    /// `YYYY-MM-DD` form of the trading date.
    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Fundamentals columns. Not available from the price source, so these are
/// always emitted empty for now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub gross_margin: Option<f64>,
}

impl Fundamentals {
    pub fn placeholder() -> Self {
        Self::default()
    }
}

/// One row of the persisted price table: a quote plus fundamentals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub quote: DailyQuote,
    pub fundamentals: Fundamentals,
}

impl PriceRow {
    /// Attach placeholder fundamentals to a fetched quote.
    pub fn from_quote(quote: DailyQuote) -> Self {
        Self {
            quote,
            fundamentals: Fundamentals::placeholder(),
        }
    }

    pub fn stock_id(&self) -> &str {
        &self.quote.stock_id
    }

    pub fn date(&self) -> NaiveDate {
        self.quote.date
    }
}
