//! Trailing returns over a lookback measured in trading bars.

use crate::error::{DataUnavailable, Unavailable};
use chrono::NaiveDate;
use rps_data::{BarQuery, MarketDataSource};
use serde::{Deserialize, Serialize};

/// Trailing return of one instrument for one ranking unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnRecord {
    /// Instrument code
    pub code: String,
    /// Trailing return in percent
    pub value: f64,
}

impl ReturnRecord {
    /// Create a new return record.
    pub fn new(code: impl Into<String>, value: f64) -> Self {
        Self {
            code: code.into(),
            value,
        }
    }
}

/// How the return of a ranking unit is extracted from the bar series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnStrategy {
    /// Close on the reference date against the close `period` bars earlier.
    #[default]
    Trailing,
    /// The same measurement ending `skip` bars before the reference date.
    ///
    /// The instrument must still have traded on the reference date.
    Skipping {
        /// Most recent bars left out of the window
        skip: usize,
    },
}

impl ReturnStrategy {
    /// Bars skipped at the recent end of the window.
    pub const fn skip(&self) -> usize {
        match self {
            Self::Trailing => 0,
            Self::Skipping { skip } => *skip,
        }
    }
}

/// Percentage change from `past` to `current`.
///
/// `None` when `past` is not strictly positive or the change is not finite.
pub fn percent_change(current: f64, past: f64) -> Option<f64> {
    if past.is_nan() || past <= 0.0 {
        return None;
    }
    let change = (current / past - 1.0) * 100.0;
    change.is_finite().then_some(change)
}

/// Computes trailing returns against a market data source.
#[derive(Debug)]
pub struct ReturnComputer<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: MarketDataSource + ?Sized> ReturnComputer<'a, S> {
    /// Create a computer reading from `source`.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Trailing return of `code` over `period` bars ending on `date`.
    pub fn trailing_return(
        &self,
        code: &str,
        date: NaiveDate,
        period: usize,
    ) -> Result<ReturnRecord, DataUnavailable> {
        self.strategy_return(code, date, period, ReturnStrategy::Trailing)
    }

    /// Return of `code` over `period` bars under `strategy`.
    ///
    /// Offsets are counted in bars of the instrument itself, so non-trading
    /// days never enter the window. A series with fewer than `period` bars
    /// before the window end is excluded rather than measured over a
    /// shorter span.
    pub fn strategy_return(
        &self,
        code: &str,
        date: NaiveDate,
        period: usize,
        strategy: ReturnStrategy,
    ) -> Result<ReturnRecord, DataUnavailable> {
        let unavailable = |reason| DataUnavailable::new(code, date, reason);
        let skip = strategy.skip();
        let Some(required) = period.checked_add(skip).and_then(|n| n.checked_add(1)) else {
            return Err(unavailable(Unavailable::ShortHistory {
                available: 0,
                required: usize::MAX,
            }));
        };

        let window = self
            .source
            .get_bars(code, BarQuery::Window { end: date, count: required })
            .map_err(|e| unavailable(Unavailable::Source(e.to_string())))?;

        match window.last() {
            Some(bar) if bar.date == date => {}
            _ => return Err(unavailable(Unavailable::NoBarOnDate)),
        }
        if window.len() < required {
            return Err(unavailable(Unavailable::ShortHistory {
                available: window.len(),
                required,
            }));
        }

        let current = window[window.len() - 1 - skip].close;
        let past = window[0].close;

        if past.is_nan() || past <= 0.0 {
            return Err(unavailable(Unavailable::NonPositiveClose { close: past }));
        }
        percent_change(current, past)
            .map(|value| ReturnRecord::new(code, value))
            .ok_or_else(|| unavailable(Unavailable::NonFiniteReturn { close: current }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rps_data::{Bar, MemorySource};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    /// Bars on 1..=5 and 8..=12 April (weekends missing).
    fn source() -> MemorySource {
        let days = [1, 2, 3, 4, 5, 8, 9, 10, 11, 12];
        let closes = [10.0, 10.5, 11.0, 10.0, 12.0, 12.5, 13.0, 12.0, 14.0, 15.0];
        MemorySource::new()
            .with_series(
                "sh600000",
                days.iter().zip(closes).map(|(&day, c)| Bar::new(d(day), c)),
            )
            .with_series("sz000002", [Bar::new(d(1), 0.0), Bar::new(d(2), 1.0)])
            .with_series("sz000003", [Bar::new(d(1), 5.0), Bar::new(d(2), f64::NAN)])
            .with_series("sz000004", [Bar::new(d(1), 5.0), Bar::new(d(2), f64::INFINITY)])
    }

    #[test]
    fn test_offset_counts_bars_not_days() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        // 3 bars before 2024-04-09 is 2024-04-04 (the weekend is skipped)
        let record = computer.trailing_return("sh600000", d(9), 3).unwrap();
        assert_relative_eq!(record.value, (13.0 / 10.0 - 1.0) * 100.0, epsilon = 1e-12);
        assert_eq!(record.code, "sh600000");
    }

    #[test]
    fn test_no_bar_on_date() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        let err = computer.trailing_return("sh600000", d(6), 2).unwrap_err();
        assert_eq!(err.reason, Unavailable::NoBarOnDate);

        let err = computer.trailing_return("bj430001", d(9), 2).unwrap_err();
        assert_eq!(err.reason, Unavailable::NoBarOnDate);
    }

    #[test]
    fn test_short_history_is_excluded() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        // Four bars exist up to 2024-04-04, five are needed
        let err = computer.trailing_return("sh600000", d(4), 4).unwrap_err();
        assert_eq!(
            err.reason,
            Unavailable::ShortHistory {
                available: 4,
                required: 5
            }
        );

        // Exactly enough history
        assert!(computer.trailing_return("sh600000", d(4), 3).is_ok());
    }

    #[test]
    fn test_non_positive_past_close() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        let err = computer.trailing_return("sz000002", d(2), 1).unwrap_err();
        assert_eq!(err.reason, Unavailable::NonPositiveClose { close: 0.0 });
    }

    #[test]
    fn test_skipping_strategy() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        let trailing = computer.trailing_return("sh600000", d(12), 3).unwrap();
        let skip_zero = computer
            .strategy_return("sh600000", d(12), 3, ReturnStrategy::Skipping { skip: 0 })
            .unwrap();
        assert_eq!(trailing, skip_zero);

        // Window 2024-04-05 -> 2024-04-10, ending two bars before the 12th
        let skipped = computer
            .strategy_return("sh600000", d(12), 3, ReturnStrategy::Skipping { skip: 2 })
            .unwrap();
        assert_relative_eq!(skipped.value, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_return_is_excluded() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        for code in ["sz000003", "sz000004"] {
            let err = computer.trailing_return(code, d(2), 1).unwrap_err();
            assert!(matches!(err.reason, Unavailable::NonFiniteReturn { .. }), "{code}");
        }
    }

    #[test]
    fn test_overflowing_lookback_is_short_history() {
        let source = source();
        let computer = ReturnComputer::new(&source);

        let err = computer.trailing_return("sh600000", d(12), usize::MAX).unwrap_err();
        assert!(matches!(err.reason, Unavailable::ShortHistory { available: 0, .. }));

        let err = computer
            .strategy_return("sh600000", d(12), 3, ReturnStrategy::Skipping { skip: usize::MAX })
            .unwrap_err();
        assert!(matches!(err.reason, Unavailable::ShortHistory { .. }));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(11.0, 10.0).map(|v| v.round()), Some(10.0));
        assert_eq!(percent_change(11.0, 0.0), None);
        assert_eq!(percent_change(11.0, -1.0), None);
        assert_eq!(percent_change(f64::NAN, 10.0), None);
        assert_eq!(percent_change(f64::INFINITY, 10.0), None);
        assert_eq!(percent_change(11.0, f64::NAN), None);
        assert_eq!(percent_change(f64::MAX, f64::MIN_POSITIVE), None);
    }
}
