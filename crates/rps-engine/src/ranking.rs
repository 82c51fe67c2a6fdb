//! Cross-sectional ranking of trailing returns.
//!
//! One call ranks one (date, period) unit: every eligible instrument's
//! return is extracted, exclusions are collected, the remaining records are
//! sorted by descending return and each position is turned into a
//! percentile score. Equal returns keep their input order.

use crate::error::{DataUnavailable, InsufficientUniverse};
use crate::returns::{ReturnComputer, ReturnRecord, ReturnStrategy};
use crate::table::ScoreTable;
use chrono::NaiveDate;
use rps_data::{Instrument, MarketDataSource};
use serde::{Deserialize, Serialize};

/// Default minimum number of participants for a ranking.
pub const DEFAULT_MIN_UNIVERSE: usize = 10;

/// Percentile score of zero-based position `i` among `n` records.
///
/// The top position scores exactly `100.0` and the bottom exactly `100.0 / n`.
pub fn percentile(i: usize, n: usize) -> f64 {
    100.0 * (n - i) as f64 / n as f64
}

/// Rank return records into a score table.
///
/// The sort is stable, so records with equal returns keep their input order
/// and receive distinct, decreasing scores.
pub fn rank_records(mut records: Vec<ReturnRecord>) -> ScoreTable {
    records.sort_by(|a, b| b.value.total_cmp(&a.value));

    let n = records.len();
    let mut table = ScoreTable::with_capacity(n);
    for (i, record) in records.into_iter().enumerate() {
        table.insert(record.code, percentile(i, n));
    }
    table
}

/// A unit of work that yields one score per instrument.
pub trait ScoreComputable {
    /// Lookback period in trading bars.
    fn period(&self) -> usize;

    /// Sub-table label, e.g. `RPS20`.
    fn label(&self) -> String {
        format!("RPS{}", self.period())
    }

    /// Extract the ranked quantity for one instrument.
    fn extract<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        code: &str,
        date: NaiveDate,
    ) -> Result<ReturnRecord, DataUnavailable>;
}

/// Trailing-return ranking over one lookback period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingUnit {
    /// Lookback period in trading bars
    pub period: usize,
    /// Return extraction strategy
    #[serde(default)]
    pub strategy: ReturnStrategy,
}

impl RankingUnit {
    /// Plain trailing-return unit.
    pub const fn trailing(period: usize) -> Self {
        Self {
            period,
            strategy: ReturnStrategy::Trailing,
        }
    }

    /// Unit with an explicit strategy.
    pub const fn with_strategy(period: usize, strategy: ReturnStrategy) -> Self {
        Self { period, strategy }
    }
}

impl ScoreComputable for RankingUnit {
    fn period(&self) -> usize {
        self.period
    }

    fn extract<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        code: &str,
        date: NaiveDate,
    ) -> Result<ReturnRecord, DataUnavailable> {
        ReturnComputer::new(source).strategy_return(code, date, self.period, self.strategy)
    }
}

/// Result of ranking one (date, period) unit.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    /// Reference date
    pub date: NaiveDate,
    /// Lookback period
    pub period: usize,
    /// Scores, or the reason the unit was skipped
    pub result: Result<ScoreTable, InsufficientUniverse>,
    /// Instruments left out of this unit
    pub exclusions: Vec<DataUnavailable>,
}

impl RankingOutcome {
    /// Scores when the unit was ranked.
    pub fn table(&self) -> Option<&ScoreTable> {
        self.result.as_ref().ok()
    }

    /// Whether the unit was skipped.
    pub fn is_skipped(&self) -> bool {
        self.result.is_err()
    }
}

/// Ranks (date, period) units with a minimum-universe guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingEngine {
    min_participants: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_UNIVERSE)
    }
}

impl RankingEngine {
    /// Create an engine requiring at least `min_participants` valid returns.
    pub const fn new(min_participants: usize) -> Self {
        Self { min_participants }
    }

    /// Minimum number of participants.
    pub const fn min_participants(&self) -> usize {
        self.min_participants
    }

    /// Check the eligible universe of a date before ranking any period.
    pub fn check_universe(&self, date: NaiveDate, eligible: usize) -> Result<(), InsufficientUniverse> {
        if eligible < self.min_participants {
            return Err(InsufficientUniverse::for_date(date, eligible, self.min_participants));
        }
        Ok(())
    }

    /// Rank `unit` over `eligible` on `date`.
    pub fn rank<U, S>(
        &self,
        source: &S,
        unit: &U,
        date: NaiveDate,
        eligible: &[&Instrument],
    ) -> RankingOutcome
    where
        U: ScoreComputable,
        S: MarketDataSource + ?Sized,
    {
        let mut records = Vec::with_capacity(eligible.len());
        let mut exclusions = Vec::new();

        for instrument in eligible {
            match unit.extract(source, &instrument.code, date) {
                Ok(record) => records.push(record),
                Err(skip) => {
                    tracing::debug!(label = %unit.label(), %skip, "instrument excluded");
                    exclusions.push(skip);
                }
            }
        }

        let result = if records.len() < self.min_participants {
            let skip = InsufficientUniverse::for_unit(
                date,
                unit.period(),
                records.len(),
                self.min_participants,
            );
            tracing::info!(%skip, "ranking unit skipped");
            Err(skip)
        } else {
            Ok(rank_records(records))
        };

        RankingOutcome {
            date,
            period: unit.period(),
            result,
            exclusions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Unavailable;
    use rps_data::{Bar, MemorySource};
    use rstest::rstest;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn records(values: &[(&str, f64)]) -> Vec<ReturnRecord> {
        values.iter().map(|&(c, v)| ReturnRecord::new(c, v)).collect()
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    #[case(4000)]
    fn test_top_and_bottom_scores_are_exact(#[case] n: usize) {
        let recs: Vec<ReturnRecord> = (0..n)
            .map(|i| ReturnRecord::new(format!("c{}", i), (i as f64).sin()))
            .collect();
        let table = rank_records(recs);

        let scores: Vec<f64> = table.iter().map(|(_, s)| s).collect();
        assert_eq!(scores[0], 100.0);
        assert_eq!(*scores.last().unwrap(), 100.0 / n as f64);
    }

    #[test]
    fn test_monotonic_in_return() {
        let table = rank_records(records(&[("a", -3.0), ("b", 12.5), ("c", 0.0), ("d", 4.0)]));
        let codes: Vec<&str> = table.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["b", "d", "c", "a"]);
        assert_eq!(table.get("b"), Some(100.0));
        assert_eq!(table.get("d"), Some(75.0));
        assert_eq!(table.get("c"), Some(50.0));
        assert_eq!(table.get("a"), Some(25.0));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let table = rank_records(records(&[("x", 1.0), ("y", 5.0), ("z", 1.0)]));
        let codes: Vec<&str> = table.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["y", "x", "z"]);
        assert!(table.get("x").unwrap() > table.get("z").unwrap());
    }

    #[test]
    fn test_label() {
        assert_eq!(RankingUnit::trailing(20).label(), "RPS20");
    }

    /// Twelve instruments with two bars each; `bad` has a zero past close.
    fn universe() -> MemorySource {
        let mut source = MemorySource::new();
        for i in 0..12 {
            let close = 10.0 + i as f64;
            source.insert(format!("sh6000{:02}", i), [Bar::new(d(4), 10.0), Bar::new(d(5), close)]);
        }
        source.insert("bad", [Bar::new(d(4), 0.0), Bar::new(d(5), 1.0)]);
        source
    }

    #[test]
    fn test_rank_unit_collects_exclusions() {
        let source = universe();
        let instruments = source.list_instruments("ALL").unwrap();
        let eligible: Vec<&Instrument> = instruments.iter().collect();

        let outcome = RankingEngine::default().rank(&source, &RankingUnit::trailing(1), d(5), &eligible);

        assert_eq!(outcome.period, 1);
        assert!(!outcome.is_skipped());
        let table = outcome.table().unwrap();
        assert_eq!(table.len(), 12);
        assert_eq!(table.get("sh600011"), Some(100.0));
        assert_eq!(outcome.exclusions.len(), 1);
        assert_eq!(outcome.exclusions[0].code, "bad");
        assert_eq!(outcome.exclusions[0].reason, Unavailable::NonPositiveClose { close: 0.0 });
    }

    #[test]
    fn test_nan_close_does_not_top_the_ranking() {
        let mut source = universe();
        source.insert("nan", [Bar::new(d(4), 10.0), Bar::new(d(5), f64::NAN)]);
        let instruments = source.list_instruments("ALL").unwrap();
        let eligible: Vec<&Instrument> = instruments.iter().collect();

        let outcome = RankingEngine::default().rank(&source, &RankingUnit::trailing(1), d(5), &eligible);

        let table = outcome.table().unwrap();
        assert!(!table.contains("nan"));
        assert_eq!(table.get("sh600011"), Some(100.0));
        assert!(outcome
            .exclusions
            .iter()
            .any(|e| e.code == "nan" && matches!(e.reason, Unavailable::NonFiniteReturn { .. })));
    }

    #[test]
    fn test_rank_unit_below_minimum_is_skipped() {
        let source = universe();
        let instruments = source.list_instruments("ALL").unwrap();
        let eligible: Vec<&Instrument> = instruments.iter().collect();

        // Period 2 needs three bars; nobody has them
        let outcome = RankingEngine::default().rank(&source, &RankingUnit::trailing(2), d(5), &eligible);
        let skip = outcome.result.unwrap_err();
        assert_eq!(skip.period, Some(2));
        assert_eq!(skip.found, 0);
        assert_eq!(skip.required, DEFAULT_MIN_UNIVERSE);
        assert_eq!(outcome.exclusions.len(), 13);

        // Nine valid records fall short by one
        let nine: Vec<&Instrument> = instruments.iter().take(9).collect();
        let outcome = RankingEngine::default().rank(&source, &RankingUnit::trailing(1), d(5), &nine);
        assert!(outcome.is_skipped());
    }

    #[test]
    fn test_check_universe() {
        let engine = RankingEngine::new(10);
        assert!(engine.check_universe(d(5), 10).is_ok());
        let skip = engine.check_universe(d(5), 9).unwrap_err();
        assert_eq!(skip.period, None);
        assert_eq!(skip.found, 9);
    }
}
