//! Composite scores across lookback periods.
//!
//! Combines the per-period percentile scores of one date into a single score
//! per instrument. Only instruments scored in every requested period take
//! part.

use crate::table::ScoreTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// How per-period scores are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Plain sum of the period scores
    Sum,
    /// Average weighted by `1 / period`, favouring shorter lookbacks
    #[default]
    InversePeriod,
}

impl Aggregation {
    /// Short name used in reports.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::InversePeriod => "inverse_period",
        }
    }

    fn combine(&self, scored: &[(usize, f64)]) -> f64 {
        match self {
            Self::Sum => scored.iter().map(|&(_, s)| s).sum(),
            Self::InversePeriod => {
                let (weighted, total) = scored.iter().fold((0.0, 0.0), |(w, t), &(p, s)| {
                    let weight = 1.0 / p as f64;
                    (w + s * weight, t + weight)
                });
                weighted / total
            }
        }
    }
}

/// Combined score of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Instrument code
    pub code: String,
    /// Aggregated score
    pub score: f64,
}

/// Stateless combiner of per-period score tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScorer;

impl CompositeScorer {
    /// Composite scores in descending order.
    ///
    /// Duplicate periods count once. Codes with equal composites keep the
    /// order in which they were first met, walking `periods` in order and each
    /// table in row order. A requested period with no table leaves the
    /// intersection, and the result, empty.
    pub fn composite(
        per_period: &BTreeMap<usize, ScoreTable>,
        periods: &[usize],
        aggregation: Aggregation,
    ) -> Vec<CompositeScore> {
        let mut seen = HashSet::new();
        let periods: Vec<usize> = periods.iter().copied().filter(|p| seen.insert(*p)).collect();

        let mut tables = Vec::with_capacity(periods.len());
        for &period in &periods {
            match per_period.get(&period) {
                Some(table) => tables.push((period, table)),
                None => return Vec::new(),
            }
        }

        let mut met = HashSet::new();
        let mut scores = Vec::new();
        for (_, table) in &tables {
            for (code, _) in table.iter() {
                if !met.insert(code) {
                    continue;
                }
                let scored: Option<Vec<(usize, f64)>> = tables
                    .iter()
                    .map(|(p, t)| t.get(code).map(|s| (*p, s)))
                    .collect();
                if let Some(scored) = scored {
                    scores.push(CompositeScore {
                        code: code.to_string(),
                        score: aggregation.combine(&scored),
                    });
                }
            }
        }

        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }
}
