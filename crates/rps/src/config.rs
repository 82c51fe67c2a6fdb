//! Run configuration.

use crate::error::{Result, RpsError};
use rps_data::{ALL_UNIVERSE, DEFAULT_BENCHMARK};
use rps_engine::{DEFAULT_MIN_UNIVERSE, DEFAULT_SEASONING_DAYS, RankingUnit, ReturnStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lookback periods ranked by default, in trading bars.
pub const DEFAULT_PERIODS: [usize; 5] = [10, 20, 50, 120, 250];

/// Longest accepted lookback, and longest accepted skip, in trading bars.
pub const MAX_PERIOD: usize = 100_000;

/// Longest accepted seasoning period in calendar days.
pub const MAX_SEASONING_DAYS: i64 = 365 * 1000;

/// Parameters of a batch run.
///
/// Missing fields in a JSON file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpsConfig {
    /// Lookback periods to rank
    pub periods: Vec<usize>,
    /// Calendar days an instrument must be listed before it is ranked
    pub seasoning_days: i64,
    /// Minimum eligible instruments per date and valid returns per unit
    pub min_universe: usize,
    /// Instrument whose bars define the trading calendar
    pub benchmark: String,
    /// Universe tag passed to the data source
    pub universe: String,
    /// Return extraction strategy
    pub strategy: ReturnStrategy,
}

impl Default for RpsConfig {
    fn default() -> Self {
        Self {
            periods: DEFAULT_PERIODS.to_vec(),
            seasoning_days: DEFAULT_SEASONING_DAYS,
            min_universe: DEFAULT_MIN_UNIVERSE,
            benchmark: DEFAULT_BENCHMARK.to_string(),
            universe: ALL_UNIVERSE.to_string(),
            strategy: ReturnStrategy::Trailing,
        }
    }
}

impl RpsConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check the configuration for values no run can use.
    pub fn validate(&self) -> Result<()> {
        if self.periods.is_empty() {
            return Err(RpsError::Config("at least one period is required".into()));
        }
        if self.periods.contains(&0) {
            return Err(RpsError::Config("periods must be at least 1".into()));
        }
        if let Some(&period) = self.periods.iter().find(|&&p| p > MAX_PERIOD) {
            return Err(RpsError::Config(format!(
                "period {} exceeds the maximum of {}",
                period, MAX_PERIOD
            )));
        }
        if self.strategy.skip() > MAX_PERIOD {
            return Err(RpsError::Config(format!(
                "skip {} exceeds the maximum of {}",
                self.strategy.skip(),
                MAX_PERIOD
            )));
        }
        if self.min_universe == 0 {
            return Err(RpsError::Config("min_universe must be at least 1".into()));
        }
        if self.seasoning_days < 0 {
            return Err(RpsError::Config("seasoning_days must not be negative".into()));
        }
        if self.seasoning_days > MAX_SEASONING_DAYS {
            return Err(RpsError::Config(format!(
                "seasoning_days {} exceeds the maximum of {}",
                self.seasoning_days, MAX_SEASONING_DAYS
            )));
        }
        if self.benchmark.trim().is_empty() {
            return Err(RpsError::Config("benchmark is required".into()));
        }
        Ok(())
    }

    /// One ranking unit per configured period, duplicates dropped.
    pub fn units(&self) -> Vec<RankingUnit> {
        let mut units: Vec<RankingUnit> = Vec::with_capacity(self.periods.len());
        for &period in &self.periods {
            if !units.iter().any(|u| u.period == period) {
                units.push(RankingUnit::with_strategy(period, self.strategy));
            }
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = RpsConfig::default();
        assert_eq!(config.periods, vec![10, 20, 50, 120, 250]);
        assert_eq!(config.seasoning_days, 365);
        assert_eq!(config.min_universe, 10);
        assert_eq!(config.benchmark, "sh000001");
        assert_eq!(config.universe, "ALL");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RpsConfig::from_json_str(
            r#"{"periods": [20, 60], "strategy": {"kind": "skipping", "skip": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.periods, vec![20, 60]);
        assert_eq!(config.min_universe, 10);
        assert_eq!(config.strategy, ReturnStrategy::Skipping { skip: 5 });
    }

    #[rstest]
    #[case(r#"{"periods": []}"#)]
    #[case(r#"{"periods": [10, 0]}"#)]
    #[case(r#"{"min_universe": 0}"#)]
    #[case(r#"{"seasoning_days": -1}"#)]
    #[case(r#"{"seasoning_days": 365001}"#)]
    #[case(r#"{"seasoning_days": 9223372036854775}"#)]
    #[case(r#"{"periods": [10, 100001]}"#)]
    #[case(r#"{"periods": [18446744073709551615]}"#)]
    #[case(r#"{"strategy": {"kind": "skipping", "skip": 100001}}"#)]
    #[case(r#"{"benchmark": " "}"#)]
    fn test_validate_rejects(#[case] json: &str) {
        let config = RpsConfig::from_json_str(json).unwrap();
        assert!(matches!(config.validate(), Err(RpsError::Config(_))));
    }

    #[test]
    fn test_validate_accepts_bounds() {
        let config = RpsConfig {
            periods: vec![1, MAX_PERIOD],
            seasoning_days: MAX_SEASONING_DAYS,
            strategy: ReturnStrategy::Skipping { skip: MAX_PERIOD },
            ..RpsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_units_drop_duplicates() {
        let config = RpsConfig {
            periods: vec![20, 10, 20],
            ..RpsConfig::default()
        };
        let periods: Vec<usize> = config.units().iter().map(|u| u.period).collect();
        assert_eq!(periods, vec![20, 10]);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rps.json");
        std::fs::write(&path, r#"{"universe": "SZ"}"#).unwrap();
        assert_eq!(RpsConfig::from_json_file(&path).unwrap().universe, "SZ");
        assert!(RpsConfig::from_json_file(dir.path().join("absent.json")).is_err());
    }
}
