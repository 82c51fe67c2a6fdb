//! Wide per-period history panels.

use crate::error::Result;
use crate::layout::DateTag;
use crate::sqlite::RpsReader;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Every date's scores for one period as a date × code panel.
///
/// Columns: `date` (the `YYYYMMDD` tag), `datetime` (`Date`), then one `f64`
/// column per code in sorted order. A code without a score on a date is null
/// there. Dates that carry no sub-table for the period are left out.
pub fn period_history(reader: &RpsReader, period: usize) -> Result<DataFrame> {
    let mut by_date: BTreeMap<DateTag, HashMap<String, f64>> = BTreeMap::new();
    let mut codes = BTreeSet::new();

    for (tag, code, score) in reader.scan_period(period)? {
        codes.insert(code.clone());
        by_date.entry(tag).or_default().insert(code, score);
    }

    let tags: Vec<String> = by_date.keys().map(|t| t.to_string()).collect();
    let iso: Vec<String> = by_date
        .keys()
        .map(|t| t.date().format("%Y-%m-%d").to_string())
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(codes.len() + 2);
    columns.push(Series::new("date".into(), tags).into());
    columns.push(Series::new("datetime".into(), iso).into());
    for code in &codes {
        let values: Vec<Option<f64>> = by_date.values().map(|row| row.get(code).copied()).collect();
        columns.push(Series::new(code.as_str().into(), values).into());
    }

    let df = DataFrame::new(columns)?
        .lazy()
        .with_column(col("datetime").cast(DataType::Date))
        .collect()?;

    tracing::debug!(period, dates = df.height(), codes = codes.len(), "history panel built");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::RpsWriter;
    use chrono::NaiveDate;
    use rps_engine::ScoreTable;

    fn tag(day: u32) -> DateTag {
        DateTag::new(NaiveDate::from_ymd_opt(2024, 6, day).unwrap())
    }

    #[test]
    fn test_panel_shape_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rps.db");
        let writer = RpsWriter::create(&path).unwrap();

        let day1: ScoreTable = [("b", 100.0), ("a", 50.0)].into_iter().collect();
        let day2: ScoreTable = [("c", 100.0), ("a", 50.0)].into_iter().collect();
        writer.write(tag(3), 20, &day1).unwrap();
        writer.write(tag(4), 20, &day2).unwrap();
        // A date without RPS20 is not part of the panel
        writer.write(tag(5), 50, &day1).unwrap();
        writer.close().unwrap();

        let reader = RpsReader::open(&path).unwrap();
        let df = period_history(&reader, 20).unwrap();

        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["date", "datetime", "a", "b", "c"]);
        assert_eq!(df.column("datetime").unwrap().dtype(), &DataType::Date);

        let dates = df.column("date").unwrap().str().unwrap();
        assert_eq!(dates.get(0), Some("20240603"));

        let b = df.column("b").unwrap().f64().unwrap();
        assert_eq!(b.get(0), Some(100.0));
        assert_eq!(b.get(1), None);
        let c = df.column("c").unwrap().f64().unwrap();
        assert_eq!(c.null_count(), 1);
    }

    #[test]
    fn test_empty_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rps.db");
        RpsWriter::create(&path).unwrap().close().unwrap();

        let df = period_history(&RpsReader::open(&path).unwrap(), 10).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 2);
    }
}
