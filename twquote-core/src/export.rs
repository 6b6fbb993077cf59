//! CSV export of the merged price table.
//!
//! Output format: UTF-8 with a byte-order mark, comma-delimited, one header
//! row in `PRICE_COLUMNS` order, no index column. Missing values are empty
//! fields.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{PriceRow, PRICE_COLUMNS};

/// UTF-8 byte-order mark, so spreadsheet tools pick the right encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub rows: usize,
    /// BLAKE3 over the bytes written.
    pub content_hash: String,
}

/// Render a price. Integral values keep one fractional digit (`584.0`).
pub fn format_price(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => v.to_string(),
    }
}

/// Render a volume. Integral values print without a fractional part.
///
/// Each value is formatted on its own: a missing volume elsewhere in the
/// table does not switch the rest of the column to `.0` form.
pub fn format_volume(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => v.to_string(),
    }
}

/// Render rows as CSV bytes, BOM included.
pub fn render_csv(rows: &[PriceRow]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::with_capacity(UTF8_BOM.len() + rows.len() * 64);
    buf.extend_from_slice(UTF8_BOM);

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);

    wtr.write_record(PRICE_COLUMNS)?;

    for row in rows {
        let q = &row.quote;
        let f = &row.fundamentals;
        wtr.write_record([
            q.date_str(),
            q.stock_id.clone(),
            format_price(q.open),
            format_price(q.high),
            format_price(q.low),
            format_price(q.close),
            format_volume(q.volume),
            format_price(f.pe),
            format_price(f.pb),
            format_price(f.roe),
            format_price(f.gross_margin),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))
}

/// Write rows to `path` in one shot, creating the parent directory if needed.
pub fn write_csv(rows: &[PriceRow], path: &Path) -> Result<ExportOutcome, ExportError> {
    let bytes = render_csv(rows)?;

    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, &bytes).map_err(io_err)?;

    Ok(ExportOutcome {
        path: path.to_path_buf(),
        rows: rows.len(),
        content_hash: blake3::hash(&bytes).to_hex().to_string(),
    })
}
