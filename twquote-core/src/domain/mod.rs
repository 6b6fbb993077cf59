//! Domain types for twquote

pub mod quote;

pub use quote::{DailyQuote, Fundamentals, PriceRow, PRICE_COLUMNS, QUOTE_COLUMNS};
