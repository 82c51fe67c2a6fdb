//! Trading calendar derived from a benchmark instrument.

use crate::error::{DataError, Result};
use crate::source::{BarQuery, MarketDataSource};
use chrono::NaiveDate;

/// Default benchmark used to derive the trading calendar.
pub const DEFAULT_BENCHMARK: &str = "sh000001";

/// Ordered, deduplicated trading dates over a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Derive the calendar from the bars of `benchmark` in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Fails when `start > end`, when the source fails, or when the
    /// benchmark has no bars in the range.
    pub fn from_benchmark<S: MarketDataSource + ?Sized>(
        source: &S,
        benchmark: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let bars = source.get_bars(benchmark, BarQuery::Between { start, end })?;
        let calendar = Self::from_dates(bars.into_iter().map(|b| b.date));

        if calendar.is_empty() {
            return Err(DataError::MissingData {
                symbol: benchmark.to_string(),
                reason: format!("no benchmark bars between {} and {}", start, end),
            });
        }

        Ok(calendar)
    }

    /// Build a calendar from arbitrary dates (sorted and deduplicated).
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    /// All trading dates, strictly increasing.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Iterate the trading dates.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    /// Number of trading dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the calendar is empty.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First trading date.
    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last trading date.
    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Whether a date is a trading day of this calendar.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }
}
