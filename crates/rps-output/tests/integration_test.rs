//! Integration tests for exports and reports built from engine output.

use chrono::NaiveDate;
use rps_engine::{Aggregation, CompositeScorer, ScoreTable};
use rps_output::{
    ExportFormat, Exporter, RankingExport, SelectionExport, SelectionLine, SelectionReport,
};
use rstest::rstest;
use std::collections::BTreeMap;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 8).unwrap()
}

fn per_period() -> BTreeMap<usize, ScoreTable> {
    let rps10: ScoreTable = [("a", 100.0), ("b", 75.0), ("c", 50.0), ("d", 25.0)]
        .into_iter()
        .collect();
    let rps20: ScoreTable = [("b", 100.0), ("a", 75.0), ("d", 50.0)].into_iter().collect();
    BTreeMap::from([(10, rps10), (20, rps20)])
}

#[test]
fn test_selection_workflow() {
    let tables = per_period();
    let periods = [10, 20];
    let scores = CompositeScorer::composite(&tables, &periods, Aggregation::Sum);
    assert_eq!(scores.len(), 3);

    let mut report = SelectionReport::new(date(), periods.to_vec(), Aggregation::Sum.as_str());
    for s in scores.iter().take(2) {
        report.push(SelectionLine {
            code: s.code.clone(),
            composite: s.score,
            scores: periods.iter().map(|p| tables[p].get(&s.code)).collect(),
        });
    }

    let ascii = report.to_ascii_table();
    assert!(ascii.contains("Top 2 by RPS on 2024-10-08"));
    // a and b tie at 175; a was met first
    let a = ascii.find(" a ").unwrap();
    let b = ascii.find(" b ").unwrap();
    assert!(a < b);

    let export = SelectionExport::from_composite(date(), &periods, Aggregation::Sum, &scores[..2]);
    let csv = export.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.contains("1,a,175.0"));
    assert!(csv.contains("2,b,175.0"));
}

#[rstest]
#[case(ExportFormat::Csv, "sh600000")]
#[case(ExportFormat::Json, "\"code\":\"sh600000\"")]
#[case(ExportFormat::PrettyJson, "\"code\": \"sh600000\"")]
fn test_ranking_formats(#[case] format: ExportFormat, #[case] expected: &str) {
    let table: ScoreTable = [("sh600000", 100.0)].into_iter().collect();
    let export = RankingExport::from_table(date(), 50, &table);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("rps50.{}", format.extension()));
    export.export_to_file(&path, format).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains(expected));
}
