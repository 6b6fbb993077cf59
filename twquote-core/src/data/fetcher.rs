//! Per-identifier fetch: provider key → raw frame → typed quotes.

use super::provider::{DataError, PriceProvider};
use super::reshape::reshape;
use crate::domain::DailyQuote;
use chrono::NaiveDate;
use tracing::{debug, error, warn};

/// What a single fetch produced.
///
/// `NoData` and `Failed` are both recoverable: the aggregator skips the
/// identifier either way, but they are logged and counted apart.
#[derive(Debug)]
pub enum FetchOutcome {
    Rows(Vec<DailyQuote>),
    NoData,
    Failed(DataError),
}

impl FetchOutcome {
    /// True unless the fetch yielded at least one quote.
    pub fn is_empty(&self) -> bool {
        match self {
            FetchOutcome::Rows(rows) => rows.is_empty(),
            FetchOutcome::NoData | FetchOutcome::Failed(_) => true,
        }
    }

    /// Collapse to a plain table: the quotes, or nothing.
    pub fn into_quotes(self) -> Vec<DailyQuote> {
        match self {
            FetchOutcome::Rows(rows) => rows,
            FetchOutcome::NoData | FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&DataError> {
        match self {
            FetchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Fetches quotes for bare identifiers from a provider.
///
/// The provider is queried with `identifier + market_suffix` (e.g. `2330.TW`);
/// the returned quotes carry the bare identifier.
pub struct Fetcher<P> {
    provider: P,
    market_suffix: String,
}

impl<P: PriceProvider> Fetcher<P> {
    pub fn new(provider: P, market_suffix: impl Into<String>) -> Self {
        Self {
            provider,
            market_suffix: market_suffix.into(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Provider-specific query key for an identifier.
    pub fn provider_key(&self, identifier: &str) -> String {
        format!("{identifier}{}", self.market_suffix)
    }

    /// Fetch quotes for one identifier over `[start, end]`.
    ///
    /// `end` goes to the provider untouched. Provider and reshape errors are
    /// logged here and returned as `FetchOutcome::Failed`, never propagated.
    pub fn fetch_quotes(&self, identifier: &str, start: NaiveDate, end: NaiveDate) -> FetchOutcome {
        let key = self.provider_key(identifier);
        debug!(%identifier, %key, provider = self.provider.name(), "fetching");

        let frame = match self.provider.fetch_frame(&key, start, end) {
            Ok(frame) => frame,
            Err(e) => {
                error!(%identifier, %key, error = %e, "fetch failed");
                return FetchOutcome::Failed(e);
            }
        };

        if frame.is_empty() {
            warn!(%identifier, %key, "provider returned no data");
            return FetchOutcome::NoData;
        }

        match reshape(&frame, identifier) {
            Ok(quotes) => {
                debug!(%identifier, rows = quotes.len(), "reshaped");
                FetchOutcome::Rows(quotes)
            }
            Err(e) => {
                error!(%identifier, %key, error = %e, "reshape failed");
                FetchOutcome::Failed(e)
            }
        }
    }
}
