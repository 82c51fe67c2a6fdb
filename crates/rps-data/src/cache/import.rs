//! Loading quotes from long-format CSV files.
//!
//! Expected header: `symbol,date,close` plus any of `open,high,low,volume`.
//! `code` is accepted in place of `symbol`; dates may be written as
//! `YYYY-MM-DD` or `YYYYMMDD`.

use super::sqlite::{QuoteRow, SqliteCache};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvQuote {
    #[serde(alias = "code")]
    symbol: String,
    date: String,
    close: f64,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    volume: Option<u64>,
}

fn parse_csv_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", s, e)))
}

/// Parse quote rows from any CSV reader.
pub fn read_quotes_csv<R: Read>(reader: R) -> Result<Vec<QuoteRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.deserialize::<CsvQuote>() {
        let record = record?;
        if record.symbol.is_empty() {
            return Err(DataError::InvalidSymbol(record.symbol));
        }
        rows.push(QuoteRow {
            date: parse_csv_date(&record.date)?,
            symbol: record.symbol,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    Ok(rows)
}

/// Import a CSV file of quotes into the cache.
///
/// Returns the number of rows written.
pub fn import_csv<P: AsRef<Path>>(cache: &SqliteCache, path: P) -> Result<usize> {
    let file = std::fs::File::open(path.as_ref())?;
    let rows = read_quotes_csv(file)?;
    let written = cache.put_quotes(&rows)?;
    tracing::info!(
        path = %path.as_ref().display(),
        rows = written,
        "imported quotes"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BarQuery, MarketDataSource};

    #[test]
    fn test_read_quotes_csv_formats() {
        let data = "\
code,date,open,close,volume
sh600000,2024-01-02,10.0,10.1,1200
sh600000,20240103,,10.3,
";
        let rows = read_quotes_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "sh600000");
        assert_eq!(rows[0].open, Some(10.0));
        assert_eq!(rows[0].volume, Some(1200));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(rows[1].open, None);
        assert_eq!(rows[1].high, None);
    }

    #[test]
    fn test_read_quotes_csv_rejects_bad_date() {
        let data = "symbol,date,close\nsh600000,Jan 2,10.0\n";
        assert!(matches!(
            read_quotes_csv(data.as_bytes()),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_import_csv_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        std::fs::write(
            &path,
            "symbol,date,close\nsz000001,2024-01-02,9.5\nsz000001,2024-01-03,9.7\n",
        )
        .unwrap();

        let cache = SqliteCache::in_memory().unwrap();
        assert_eq!(import_csv(&cache, &path).unwrap(), 2);

        let bars = cache.get_bars("sz000001", BarQuery::Latest(1)).unwrap();
        assert_eq!(bars[0].close, 9.7);
    }
}
