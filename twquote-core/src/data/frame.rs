//! Raw provider frame, a time-indexed table as the provider shaped it.
//!
//! Column labels may be nested (`("Close", "2330.TW")`), cells may hold
//! anything the wire format allowed, and field names follow the provider's
//! conventions. Nothing here is normalized; see `reshape`.

use chrono::NaiveDate;

/// Column label, flat or multi-level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLabel {
    Flat(String),
    Nested(Vec<String>),
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        Self::Flat(name.into())
    }

    pub fn nested<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Nested(levels.into_iter().map(Into::into).collect())
    }

    /// Single-level name: the label itself, or the first level of a nested one.
    pub fn flatten(&self) -> &str {
        match self {
            Self::Flat(name) => name,
            Self::Nested(levels) => levels.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// A single cell as delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Float(f64),
    Int(i64),
    Text(String),
    Missing,
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Missing, Cell::Float)
    }
}

impl From<Option<i64>> for Cell {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Cell::Missing, Cell::Int)
    }
}

/// Index entry of the time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDate {
    /// Unix seconds plus the exchange's UTC offset.
    Timestamp { secs: i64, utc_offset_secs: i32 },
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub label: ColumnLabel,
    pub cells: Vec<Cell>,
}

impl RawColumn {
    pub fn new(label: ColumnLabel, cells: Vec<Cell>) -> Self {
        Self { label, cells }
    }
}

/// Provider response before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub index: Vec<RawDate>,
    pub columns: Vec<RawColumn>,
}

impl RawFrame {
    pub fn new(index: Vec<RawDate>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_column(mut self, label: ColumnLabel, cells: Vec<Cell>) -> Self {
        self.columns.push(RawColumn::new(label, cells));
        self
    }

    pub fn push_column(&mut self, label: ColumnLabel, cells: Vec<Cell>) {
        self.columns.push(RawColumn::new(label, cells));
    }

    /// Number of rows (length of the time index).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
