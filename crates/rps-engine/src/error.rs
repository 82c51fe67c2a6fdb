//! Structured skip reasons.
//!
//! None of these abort a run. They are collected by the caller so that every
//! instrument or unit left out of a ranking can be reported.

use chrono::NaiveDate;
use thiserror::Error;

/// Why an instrument has no usable data for a ranking unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unavailable {
    /// The listing date could not be determined.
    #[error("listing date unknown")]
    ListingDateUnknown,

    /// No bar on the reference date (e.g. trading suspended).
    #[error("no bar on reference date")]
    NoBarOnDate,

    /// Fewer bars before the reference date than the lookback requires.
    #[error("short history: {available} bars available, {required} required")]
    ShortHistory {
        /// Bars found, including the reference bar
        available: usize,
        /// Bars needed, including the reference bar
        required: usize,
    },

    /// The reference price at the start of the window is not positive.
    #[error("non-positive past close {close}")]
    NonPositiveClose {
        /// The offending close
        close: f64,
    },

    /// The return over the window is NaN or infinite.
    #[error("non-finite return from close {close}")]
    NonFiniteReturn {
        /// Close at the recent end of the window
        close: f64,
    },

    /// The data source failed.
    #[error("data source error: {0}")]
    Source(String),
}

impl Unavailable {
    /// Short name of the reason, used to tally exclusions.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ListingDateUnknown => "listing date unknown",
            Self::NoBarOnDate => "no bar on date",
            Self::ShortHistory { .. } => "short history",
            Self::NonPositiveClose { .. } => "non-positive close",
            Self::NonFiniteReturn { .. } => "non-finite return",
            Self::Source(_) => "data source error",
        }
    }
}

/// An instrument excluded from one ranking unit or from a whole run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code} unavailable on {date}: {reason}")]
pub struct DataUnavailable {
    /// Instrument code
    pub code: String,
    /// Reference date
    pub date: NaiveDate,
    /// What was missing
    pub reason: Unavailable,
}

impl DataUnavailable {
    /// Create a new exclusion record.
    pub fn new(code: impl Into<String>, date: NaiveDate, reason: Unavailable) -> Self {
        Self {
            code: code.into(),
            date,
            reason,
        }
    }
}

/// Too few participants to produce a meaningful ranking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} on {date}: {found} participants, {required} required", scope(.period))]
pub struct InsufficientUniverse {
    /// Date of the skipped unit
    pub date: NaiveDate,
    /// Lookback period, or `None` when the whole date was skipped
    pub period: Option<usize>,
    /// Participants found
    pub found: usize,
    /// Minimum participants
    pub required: usize,
}

fn scope(period: &Option<usize>) -> String {
    match period {
        Some(p) => format!("RPS{} returns", p),
        None => "eligible universe".to_string(),
    }
}

impl InsufficientUniverse {
    /// A whole date skipped for lack of eligible instruments.
    pub const fn for_date(date: NaiveDate, found: usize, required: usize) -> Self {
        Self {
            date,
            period: None,
            found,
            required,
        }
    }

    /// A single (date, period) unit skipped for lack of valid returns.
    pub const fn for_unit(date: NaiveDate, period: usize, found: usize, required: usize) -> Self {
        Self {
            date,
            period: Some(period),
            found,
            required,
        }
    }
}
