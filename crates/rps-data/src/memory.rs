//! In-memory market data source.

use crate::error::{DataError, Result};
use crate::source::{Bar, BarQuery, Instrument, MarketDataSource, in_universe};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Series {
    name: Option<String>,
    bars: Vec<Bar>,
}

/// Market data held entirely in memory.
///
/// Instruments are listed in code order. Bars are kept sorted and
/// deduplicated by date (the last bar inserted for a date wins).
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    series: BTreeMap<String, Series>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the bar series of an instrument.
    pub fn insert(&mut self, code: impl Into<String>, bars: impl IntoIterator<Item = Bar>) {
        let mut bars: Vec<Bar> = bars.into_iter().collect();
        bars.sort_by_key(|b| b.date);
        // keep the last bar per date
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();

        self.series.entry(code.into()).or_default().bars = bars;
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_series(mut self, code: impl Into<String>, bars: impl IntoIterator<Item = Bar>) -> Self {
        self.insert(code, bars);
        self
    }

    /// Set the display name of an already inserted instrument.
    pub fn set_name(&mut self, code: &str, name: impl Into<String>) -> Result<()> {
        let series = self
            .series
            .get_mut(code)
            .ok_or_else(|| DataError::InvalidSymbol(code.to_string()))?;
        series.name = Some(name.into());
        Ok(())
    }

    /// Number of instruments held.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the source holds no instruments.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl MarketDataSource for MemorySource {
    fn list_instruments(&self, universe: &str) -> Result<Vec<Instrument>> {
        Ok(self
            .series
            .iter()
            .filter(|(code, _)| in_universe(code, universe))
            .map(|(code, series)| Instrument {
                code: code.clone(),
                name: series.name.clone(),
            })
            .collect())
    }

    fn get_bars(&self, code: &str, query: BarQuery) -> Result<Vec<Bar>> {
        Ok(self
            .series
            .get(code)
            .map(|s| query.select(&s.bars).to_vec())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_insert_sorts_and_dedups() {
        let source = MemorySource::new().with_series(
            "sh600000",
            [
                Bar::new(d(3), 3.0),
                Bar::new(d(1), 1.0),
                Bar::new(d(2), 2.0),
                Bar::new(d(3), 3.5),
            ],
        );

        let bars = source.get_bars("sh600000", BarQuery::Head(10)).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, d(1));
        assert_eq!(bars[2].close, 3.5);
    }

    #[test]
    fn test_listing_date_and_unknown_code() {
        let source = MemorySource::new().with_series("sz000001", [Bar::new(d(5), 1.0), Bar::new(d(9), 1.1)]);

        assert_eq!(source.listing_date("sz000001").unwrap(), Some(d(5)));
        assert_eq!(source.listing_date("sz999999").unwrap(), None);
        assert!(source.get_bars("sz999999", BarQuery::Latest(1)).unwrap().is_empty());
    }

    #[test]
    fn test_universe_filtering() {
        let mut source = MemorySource::new()
            .with_series("sh600000", [Bar::new(d(1), 1.0)])
            .with_series("sz000001", [Bar::new(d(1), 1.0)]);
        source.set_name("sh600000", "Pudong Bank").unwrap();
        assert!(source.set_name("bj430001", "missing").is_err());

        let sh = source.list_instruments("SH").unwrap();
        assert_eq!(sh.len(), 1);
        assert_eq!(sh[0].name.as_deref(), Some("Pudong Bank"));
        assert_eq!(source.list_instruments("ALL").unwrap().len(), 2);
    }
}
