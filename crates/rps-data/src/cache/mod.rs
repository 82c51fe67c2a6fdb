//! Caching layer for market data.

pub mod import;
pub mod sqlite;

pub use import::{import_csv, read_quotes_csv};
pub use sqlite::{CacheStats, QuoteRow, SqliteCache};
