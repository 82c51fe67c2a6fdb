//! SQLite quote cache.

use crate::error::{DataError, Result};
use crate::source::{Bar, BarQuery, Instrument, MarketDataSource, in_universe};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite cache of daily quotes.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Connection,
}

/// One cached daily quote.
///
/// Only `close` is required by the ranking engine; the remaining price
/// fields are kept when the data file provides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    /// Instrument code
    pub symbol: String,
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: Option<f64>,
    /// High price
    pub high: Option<f64>,
    /// Low price
    pub low: Option<f64>,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: Option<u64>,
}

impl QuoteRow {
    /// Create a close-only quote.
    pub fn close_only(symbol: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

impl SqliteCache {
    /// Create a new SQLite cache.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Open an existing cache without write access.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS quotes (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                close REAL NOT NULL,
                volume INTEGER,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_quotes_symbol_date ON quotes(symbol, date)",
            [],
        )?;

        Ok(())
    }

    /// Store quotes in the cache, replacing existing rows for the same day.
    pub fn put_quotes(&self, rows: &[QuoteRow]) -> Result<usize> {
        let cached_at = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO quotes
                 (symbol, date, open, high, low, close, volume, cached_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                let volume = row.volume.map(|v| i64::try_from(v).unwrap_or(i64::MAX));
                stmt.execute(params![
                    row.symbol,
                    row.date.format(DATE_FORMAT).to_string(),
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    volume,
                    cached_at
                ])?;
            }
        }

        tx.commit()?;
        Ok(rows.len())
    }

    /// Store close-only bars for one symbol.
    pub fn put_bars(&self, symbol: &str, bars: &[Bar]) -> Result<usize> {
        let rows: Vec<QuoteRow> = bars
            .iter()
            .map(|b| QuoteRow::close_only(symbol, b.date, b.close))
            .collect();
        self.put_quotes(&rows)
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let (quotes_count, symbols_count, first, last): (i64, i64, Option<String>, Option<String>) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT symbol), MIN(date), MAX(date) FROM quotes",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(CacheStats {
            total_quotes: quotes_count as usize,
            unique_symbols: symbols_count as usize,
            first_date: first.as_deref().map(parse_date).transpose()?,
            last_date: last.as_deref().map(parse_date).transpose()?,
        })
    }

    fn query_bars(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Bar>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, close)| Ok(Bar::new(parse_date(&date)?, close)))
            .collect()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", s, e)))
}

fn limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl MarketDataSource for SqliteCache {
    fn list_instruments(&self, universe: &str) -> Result<Vec<Instrument>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT symbol FROM quotes ORDER BY symbol",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Instrument {
                    code: row.get(0)?,
                    name: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter(|i| in_universe(&i.code, universe))
            .collect())
    }

    fn get_bars(&self, code: &str, query: BarQuery) -> Result<Vec<Bar>> {
        match query {
            BarQuery::On(date) => self.query_bars(
                "SELECT date, close FROM quotes WHERE symbol = ?1 AND date = ?2",
                params![code, date.format(DATE_FORMAT).to_string()],
            ),
            BarQuery::Head(n) => self.query_bars(
                "SELECT date, close FROM quotes WHERE symbol = ?1
                 ORDER BY date ASC LIMIT ?2",
                params![code, limit(n)],
            ),
            BarQuery::Latest(n) => {
                let mut bars = self.query_bars(
                    "SELECT date, close FROM quotes WHERE symbol = ?1
                     ORDER BY date DESC LIMIT ?2",
                    params![code, limit(n)],
                )?;
                bars.reverse();
                Ok(bars)
            }
            BarQuery::Window { end, count } => {
                let mut bars = self.query_bars(
                    "SELECT date, close FROM quotes WHERE symbol = ?1 AND date <= ?2
                     ORDER BY date DESC LIMIT ?3",
                    params![code, end.format(DATE_FORMAT).to_string(), limit(count)],
                )?;
                bars.reverse();
                Ok(bars)
            }
            BarQuery::Between { start, end } => self.query_bars(
                "SELECT date, close FROM quotes WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
                params![
                    code,
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
            ),
        }
    }

    fn listing_date(&self, code: &str) -> Result<Option<NaiveDate>> {
        let first: Option<String> = self
            .conn
            .query_row(
                "SELECT MIN(date) FROM quotes WHERE symbol = ?1",
                params![code],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();

        first.as_deref().map(parse_date).transpose()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of quote records
    pub total_quotes: usize,
    /// Number of unique symbols
    pub unique_symbols: usize,
    /// Earliest cached trading date
    pub first_date: Option<NaiveDate>,
    /// Latest cached trading date
    pub last_date: Option<NaiveDate>,
}
