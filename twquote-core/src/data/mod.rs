//! Market-data retrieval and normalization

pub mod fetcher;
pub mod frame;
pub mod provider;
pub mod reshape;
pub mod yahoo;

pub use fetcher::{FetchOutcome, Fetcher};
pub use frame::{Cell, ColumnLabel, RawColumn, RawDate, RawFrame};
pub use provider::{DataError, PriceProvider};
pub use reshape::reshape;
pub use yahoo::YahooProvider;
