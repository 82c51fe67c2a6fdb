//! Naming of groups, sub-tables and stored values.

use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

const TAG_FORMAT: &str = "%Y%m%d";
const LABEL_PREFIX: &str = "RPS";

/// A trading date written as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTag(NaiveDate);

impl DateTag {
    /// Tag for a date.
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The tagged date.
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateTag {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TAG_FORMAT))
    }
}

impl FromStr for DateTag {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::InvalidTag(format!("'{}' is not YYYYMMDD", s)));
        }
        NaiveDate::parse_from_str(s, TAG_FORMAT)
            .map(Self)
            .map_err(|e| StoreError::InvalidTag(format!("'{}': {}", s, e)))
    }
}

/// Sub-table label of a period, e.g. `RPS20`.
pub fn period_label(period: usize) -> String {
    format!("{}{}", LABEL_PREFIX, period)
}

/// Period encoded in a sub-table label.
pub fn parse_period_label(label: &str) -> Result<usize> {
    label
        .strip_prefix(LABEL_PREFIX)
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| StoreError::InvalidTag(format!("'{}' is not RPS<period>", label)))
}

/// Text form of a score: the shortest decimal that parses back to the same value.
pub fn encode_score(score: f64) -> String {
    score.to_string()
}

/// Parse a stored score.
pub fn decode_score(text: &str) -> Result<f64> {
    text.parse()
        .map_err(|e| StoreError::Parse(format!("score '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_date_tag() {
        let tag: DateTag = "20240105".parse().unwrap();
        assert_eq!(tag.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(tag.to_string(), "20240105");
    }

    #[rstest]
    #[case("2024-01-05")]
    #[case("20241305")]
    #[case("2024015")]
    #[case("")]
    fn test_invalid_date_tag(#[case] s: &str) {
        assert!(matches!(s.parse::<DateTag>(), Err(StoreError::InvalidTag(_))));
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label(250), "RPS250");
        assert_eq!(parse_period_label("RPS250").unwrap(), 250);
        assert!(parse_period_label("RPS").is_err());
        assert!(parse_period_label("MA20").is_err());
    }

    #[rstest]
    #[case(100.0)]
    #[case(100.0 / 3.0)]
    #[case(100.0 / 4817.0)]
    #[case(0.1 + 0.2)]
    fn test_score_text_is_exact(#[case] score: f64) {
        let text = encode_score(score);
        assert_eq!(decode_score(&text).unwrap().to_bits(), score.to_bits());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_score("n/a"), Err(StoreError::Parse(_))));
    }
}
