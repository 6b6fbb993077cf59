//! Reshape a raw provider frame into typed daily quotes.
//!
//! Steps, in order: flatten nested labels, rename provider field names onto
//! the internal schema, turn the time index into calendar dates, coerce the
//! OHLCV cells to numbers, stamp the identifier. Fields the provider did not
//! send come out as `None` on every row.

use super::frame::{Cell, RawDate, RawFrame};
use super::provider::DataError;
use crate::domain::DailyQuote;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Numeric fields of the quote schema, in column order.
const NUMERIC_FIELDS: [Field; 5] = [
    Field::Open,
    Field::High,
    Field::Low,
    Field::Close,
    Field::Volume,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    fn slot(self) -> usize {
        match self {
            Field::Open => 0,
            Field::High => 1,
            Field::Low => 2,
            Field::Close => 3,
            Field::Volume => 4,
        }
    }
}

/// Map a flattened provider column name onto the internal schema.
///
/// Names already in internal form pass through. Anything else (`Adj Close`,
/// `Dividends`, ...) is not part of the quote schema.
fn rename(name: &str) -> Option<Field> {
    match name {
        "Open" | "open" => Some(Field::Open),
        "High" | "high" => Some(Field::High),
        "Low" | "low" => Some(Field::Low),
        "Close" | "close" => Some(Field::Close),
        "Volume" | "volume" => Some(Field::Volume),
        _ => None,
    }
}

/// Coerce a cell to a number. Values that are not numeric become `None`.
pub fn coerce_numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(v) if v.is_nan() => None,
        Cell::Float(v) => Some(*v),
        Cell::Int(v) => Some(*v as f64),
        Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
        Cell::Missing => None,
    }
}

/// Convert one index entry to the trading date it denotes.
pub fn to_calendar_date(raw: &RawDate) -> Result<NaiveDate, DataError> {
    match raw {
        RawDate::Date(d) => Ok(*d),
        RawDate::Timestamp {
            secs,
            utc_offset_secs,
        } => secs
            .checked_add(i64::from(*utc_offset_secs))
            .and_then(|local| DateTime::from_timestamp(local, 0))
            .map(|dt| dt.date_naive())
            .ok_or_else(|| DataError::MalformedFrame(format!("invalid timestamp: {secs}"))),
        RawDate::Text(s) => parse_date_text(s.trim())
            .ok_or_else(|| DataError::MalformedFrame(format!("unparseable date: {s:?}"))),
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Reshape a raw frame into quotes stamped with `identifier`.
///
/// One quote per index entry, in index order. Fails only on structural
/// problems: a date that cannot be read or a column whose length disagrees
/// with the index.
pub fn reshape(frame: &RawFrame, identifier: &str) -> Result<Vec<DailyQuote>, DataError> {
    let rows = frame.len();

    // First column wins when flattening produces the same field twice.
    let mut sources: [Option<&[Cell]>; 5] = [None; 5];
    for column in &frame.columns {
        let Some(field) = rename(column.label.flatten()) else {
            continue;
        };
        if column.cells.len() != rows {
            return Err(DataError::MalformedFrame(format!(
                "column {:?} has {} cells, index has {rows}",
                column.label.flatten(),
                column.cells.len()
            )));
        }
        let slot = &mut sources[field.slot()];
        if slot.is_none() {
            *slot = Some(column.cells.as_slice());
        }
    }

    let value = |field: Field, row: usize| -> Option<f64> {
        sources[field.slot()].and_then(|cells| coerce_numeric(&cells[row]))
    };

    let mut quotes = Vec::with_capacity(rows);
    for (row, raw_date) in frame.index.iter().enumerate() {
        let date = to_calendar_date(raw_date)?;
        let [open, high, low, close, volume] = NUMERIC_FIELDS.map(|f| value(f, row));
        quotes.push(DailyQuote {
            date,
            stock_id: identifier.to_string(),
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(quotes)
}
