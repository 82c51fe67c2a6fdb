//! Seasoning gate for ranking participation.
//!
//! An instrument takes part in a day's ranking only once it has traded for
//! at least the seasoning period. Listing dates are discovered once per run;
//! instruments whose listing date cannot be determined are left out for the
//! whole run (fail closed).

use crate::error::{DataUnavailable, Unavailable};
use chrono::{NaiveDate, TimeDelta};
use rps_data::{Instrument, MarketDataSource};
use std::collections::HashMap;

/// Default seasoning period in calendar days.
pub const DEFAULT_SEASONING_DAYS: i64 = 365;

/// Whether a listing date satisfies the seasoning gate on `date`.
///
/// True iff `listing <= date - seasoning_days` (calendar days). A cutoff
/// outside the representable date range is never satisfied.
pub fn is_seasoned(listing: NaiveDate, date: NaiveDate, seasoning_days: i64) -> bool {
    TimeDelta::try_days(seasoning_days)
        .and_then(|span| date.checked_sub_signed(span))
        .is_some_and(|cutoff| listing <= cutoff)
}

/// Cached listing dates plus the seasoning rule.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    listing_dates: HashMap<String, NaiveDate>,
    seasoning_days: i64,
}

impl EligibilityFilter {
    /// Create a filter from known listing dates.
    pub fn new(listing_dates: HashMap<String, NaiveDate>, seasoning_days: i64) -> Self {
        Self {
            listing_dates,
            seasoning_days,
        }
    }

    /// Discover listing dates for `instruments`.
    ///
    /// Source failures and unknown listing dates are returned as exclusion
    /// records (stamped with `as_of`); those instruments are never eligible.
    pub fn discover<S: MarketDataSource + ?Sized>(
        source: &S,
        instruments: &[Instrument],
        seasoning_days: i64,
        as_of: NaiveDate,
    ) -> (Self, Vec<DataUnavailable>) {
        let mut listing_dates = HashMap::with_capacity(instruments.len());
        let mut excluded = Vec::new();

        for instrument in instruments {
            match source.listing_date(&instrument.code) {
                Ok(Some(date)) => {
                    listing_dates.insert(instrument.code.clone(), date);
                }
                Ok(None) => {
                    excluded.push(DataUnavailable::new(
                        &instrument.code,
                        as_of,
                        Unavailable::ListingDateUnknown,
                    ));
                }
                Err(e) => {
                    tracing::warn!(code = %instrument.code, error = %e, "listing date lookup failed");
                    excluded.push(DataUnavailable::new(
                        &instrument.code,
                        as_of,
                        Unavailable::Source(e.to_string()),
                    ));
                }
            }
        }

        (Self::new(listing_dates, seasoning_days), excluded)
    }

    /// Seasoning period in calendar days.
    pub const fn seasoning_days(&self) -> i64 {
        self.seasoning_days
    }

    /// Cached listing date of an instrument.
    pub fn listing_date(&self, code: &str) -> Option<NaiveDate> {
        self.listing_dates.get(code).copied()
    }

    /// Number of instruments with a known listing date.
    pub fn known(&self) -> usize {
        self.listing_dates.len()
    }

    /// Whether `code` may take part in the ranking on `date`.
    pub fn is_eligible(&self, code: &str, date: NaiveDate) -> bool {
        self.listing_date(code)
            .is_some_and(|listing| is_seasoned(listing, date, self.seasoning_days))
    }

    /// The eligible subset of `instruments` on `date`, in input order.
    pub fn eligible<'a>(&self, instruments: &'a [Instrument], date: NaiveDate) -> Vec<&'a Instrument> {
        instruments
            .iter()
            .filter(|i| self.is_eligible(&i.code, date))
            .collect()
    }
}
