//! Read-side selection over a computed store.

use crate::error::Result;
use rps_engine::{Aggregation, CompositeScore, CompositeScorer};
use rps_output::{SelectionLine, SelectionReport};
use rps_store::{DateTag, RpsReader};
use std::path::Path;

/// The `top_n` instruments by composite score on one date.
///
/// Instruments must be ranked in every requested period to be selected.
/// Fewer than `top_n` are returned when fewer qualify.
pub fn get_top_ranked<P: AsRef<Path>>(
    store_path: P,
    tag: DateTag,
    periods: &[usize],
    top_n: usize,
    aggregation: Aggregation,
) -> Result<Vec<CompositeScore>> {
    let reader = RpsReader::open(store_path)?;
    top_ranked(&reader, tag, periods, top_n, aggregation)
}

/// [`get_top_ranked`] against an open reader.
pub fn top_ranked(
    reader: &RpsReader,
    tag: DateTag,
    periods: &[usize],
    top_n: usize,
    aggregation: Aggregation,
) -> Result<Vec<CompositeScore>> {
    let tables = reader.read_periods(tag, periods)?;
    let mut scores = CompositeScorer::composite(&tables, periods, aggregation);
    scores.truncate(top_n);
    Ok(scores)
}

/// Score of `code` in each of `periods`, `None` where it was not ranked.
pub fn instrument_profile(
    reader: &RpsReader,
    tag: DateTag,
    code: &str,
    periods: &[usize],
) -> Result<Vec<(usize, Option<f64>)>> {
    periods
        .iter()
        .map(|&p| Ok((p, reader.read(tag, p)?.get(code))))
        .collect()
}

/// A report of the top selection with each period's score alongside.
pub fn selection_report(
    reader: &RpsReader,
    tag: DateTag,
    periods: &[usize],
    top_n: usize,
    aggregation: Aggregation,
) -> Result<SelectionReport> {
    let tables = reader.read_periods(tag, periods)?;
    let mut scores = CompositeScorer::composite(&tables, periods, aggregation);
    scores.truncate(top_n);

    let mut report = SelectionReport::new(tag.date(), periods.to_vec(), aggregation.as_str());
    for score in scores {
        let per_period = periods
            .iter()
            .map(|p| tables.get(p).and_then(|t| t.get(&score.code)))
            .collect();
        report.push(SelectionLine {
            code: score.code,
            composite: score.score,
            scores: per_period,
        });
    }
    Ok(report)
}
