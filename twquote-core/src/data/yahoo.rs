//! Yahoo Finance price provider.
//!
//! Fetches daily OHLCV series from Yahoo's v8 chart API and hands them back
//! as a `RawFrame` with `(Field, key)` nested labels. One request per call:
//! no retries, no rate-limit handling.
//!
//! The window is `[start, end)`: `period2` is midnight UTC of `end`, so the
//! end date itself is normally not included. Callers wanting it must pass the
//! following day.

use super::frame::{Cell, ColumnLabel, RawDate, RawFrame};
use super::provider::{DataError, PriceProvider};
use crate::config::ProviderConfig;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    auto_adjust: bool,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auto_adjust: config.auto_adjust,
        })
    }

    /// Build the chart API URL for a key and date range.
    fn chart_url(base_url: &str, key: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{base_url}/v8/finance/chart/{key}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div%2Csplits"
        )
    }

    /// Parse the chart API response into a raw frame.
    fn parse_response(
        key: &str,
        resp: ChartResponse,
        auto_adjust: bool,
    ) -> Result<RawFrame, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                key: key.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let Some(data) = result.into_iter().next() else {
            return Ok(RawFrame::empty());
        };

        // No timestamps means the window holds no trading days.
        let Some(timestamps) = data.timestamp else {
            return Ok(RawFrame::empty());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let utc_offset_secs = data.meta.gmtoffset;
        let n = timestamps.len();
        let mut index = Vec::with_capacity(n);
        let mut opens = Vec::with_capacity(n);
        let mut highs = Vec::with_capacity(n);
        let mut lows = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut adj = Vec::with_capacity(n);
        let mut volumes = Vec::with_capacity(n);

        for (i, &secs) in timestamps.iter().enumerate() {
            let mut open = quote.open.get(i).copied().flatten();
            let mut high = quote.high.get(i).copied().flatten();
            let mut low = quote.low.get(i).copied().flatten();
            let mut close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.as_ref().and_then(|v| v.get(i).copied().flatten());

            // Placeholder rows for non-trading days
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            if auto_adjust {
                if let (Some(c), Some(a)) = (close, adj_close) {
                    if c != 0.0 {
                        let ratio = a / c;
                        open = open.map(|v| v * ratio);
                        high = high.map(|v| v * ratio);
                        low = low.map(|v| v * ratio);
                        close = Some(a);
                    }
                }
            }

            index.push(RawDate::Timestamp {
                secs,
                utc_offset_secs,
            });
            opens.push(Cell::from(open));
            highs.push(Cell::from(high));
            lows.push(Cell::from(low));
            closes.push(Cell::from(close));
            adj.push(Cell::from(adj_close));
            volumes.push(Cell::from(volume));
        }

        let mut frame = RawFrame::new(index);
        frame.push_column(ColumnLabel::nested(["Open", key]), opens);
        frame.push_column(ColumnLabel::nested(["High", key]), highs);
        frame.push_column(ColumnLabel::nested(["Low", key]), lows);
        frame.push_column(ColumnLabel::nested(["Close", key]), closes);
        if adj_closes.is_some() && !auto_adjust {
            frame.push_column(ColumnLabel::nested(["Adj Close", key]), adj);
        }
        frame.push_column(ColumnLabel::nested(["Volume", key]), volumes);
        Ok(frame)
    }

    fn request(&self, key: &str, start: NaiveDate, end: NaiveDate) -> Result<RawFrame, DataError> {
        let url = Self::chart_url(&self.base_url, key, start, end);
        debug!(%key, %url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                key: key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let chart: ChartResponse = serde_json::from_str(&body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {key}: {e}"))
        })?;

        Self::parse_response(key, chart, self.auto_adjust)
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_frame(
        &self,
        key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, DataError> {
        self.request(key, start, end)
    }
}
