//! Market data source abstraction.
//!
//! Everything the ranking engine knows about prices flows through
//! [`MarketDataSource`]. Sources are passed explicitly to the components that
//! need them; there is no process-wide data handle.

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Universe tag selecting every instrument of a source.
pub const ALL_UNIVERSE: &str = "ALL";

/// A single daily price bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date of the bar
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl Bar {
    /// Create a new bar.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// A tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    /// Market-prefixed code, e.g. `sh600000`
    pub code: String,
    /// Display name, when the source knows one
    pub name: Option<String>,
}

impl Instrument {
    /// Create an instrument without a display name.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A request for a slice of an instrument's bar series.
///
/// Results are always returned in ascending date order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarQuery {
    /// The bar stamped exactly on the given date (zero or one bar).
    On(NaiveDate),
    /// The first `n` bars of the series.
    Head(usize),
    /// The last `n` bars of the series.
    Latest(usize),
    /// Up to `count` bars ending at `end`.
    ///
    /// `end` need not be a trading day of the instrument; the window then
    /// ends at the last bar before it.
    Window {
        /// Last date the window may include
        end: NaiveDate,
        /// Maximum number of bars
        count: usize,
    },
    /// Every bar with `start <= date <= end`.
    Between {
        /// First date (inclusive)
        start: NaiveDate,
        /// Last date (inclusive)
        end: NaiveDate,
    },
}

impl BarQuery {
    /// Select the bars answering this query from an ascending series.
    pub fn select<'a>(&self, bars: &'a [Bar]) -> &'a [Bar] {
        match *self {
            Self::On(date) => match bars.binary_search_by_key(&date, |b| b.date) {
                Ok(i) => &bars[i..=i],
                Err(_) => &[],
            },
            Self::Head(n) => &bars[..n.min(bars.len())],
            Self::Latest(n) => &bars[bars.len().saturating_sub(n)..],
            Self::Window { end, count } => {
                let stop = bars.partition_point(|b| b.date <= end);
                &bars[stop.saturating_sub(count)..stop]
            }
            Self::Between { start, end } => {
                let lo = bars.partition_point(|b| b.date < start);
                let hi = bars.partition_point(|b| b.date <= end);
                if lo >= hi { &[] } else { &bars[lo..hi] }
            }
        }
    }
}

/// Check whether an instrument code belongs to a universe tag.
///
/// [`ALL_UNIVERSE`] matches everything; any other tag is a market prefix
/// compared case-insensitively (`SH` matches `sh600000`).
pub fn in_universe(code: &str, tag: &str) -> bool {
    if tag.eq_ignore_ascii_case(ALL_UNIVERSE) {
        return true;
    }
    code.len() >= tag.len()
        && code.is_char_boundary(tag.len())
        && code[..tag.len()].eq_ignore_ascii_case(tag)
}

/// Provider of daily bars, instrument lists and listing dates.
pub trait MarketDataSource {
    /// List the instruments belonging to a universe tag.
    fn list_instruments(&self, universe: &str) -> Result<Vec<Instrument>>;

    /// Fetch bars for an instrument.
    ///
    /// An unknown instrument yields an empty vector, not an error.
    fn get_bars(&self, code: &str, query: BarQuery) -> Result<Vec<Bar>>;

    /// Listing date of an instrument: the date of its earliest bar.
    fn listing_date(&self, code: &str) -> Result<Option<NaiveDate>> {
        Ok(self.get_bars(code, BarQuery::Head(1))?.first().map(|b| b.date))
    }
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for &S {
    fn list_instruments(&self, universe: &str) -> Result<Vec<Instrument>> {
        (**self).list_instruments(universe)
    }

    fn get_bars(&self, code: &str, query: BarQuery) -> Result<Vec<Bar>> {
        (**self).get_bars(code, query)
    }

    fn listing_date(&self, code: &str) -> Result<Option<NaiveDate>> {
        (**self).listing_date(code)
    }
}
