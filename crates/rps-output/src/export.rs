//! CSV and JSON export of rankings, selections and history panels.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use rps_engine::{Aggregation, CompositeScore, ScoreTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Polars error while reading a panel.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

fn csv_string<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// One row of a persisted ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingRow {
    /// One-based position in the ranking.
    pub rank: usize,

    /// Instrument code.
    pub code: String,

    /// Percentile score.
    pub score: f64,
}

/// The ranking of one (date, period) unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingExport {
    /// Reference date.
    pub date: NaiveDate,

    /// Lookback period in trading bars.
    pub period: usize,

    /// Rows in ranking order.
    pub rows: Vec<RankingRow>,
}

impl RankingExport {
    /// Build an export from a score table, keeping its row order.
    pub fn from_table(date: NaiveDate, period: usize, table: &ScoreTable) -> Self {
        let rows = table
            .iter()
            .enumerate()
            .map(|(i, (code, score))| RankingRow {
                rank: i + 1,
                code: code.to_string(),
                score,
            })
            .collect();
        Self { date, period, rows }
    }
}

/// Flattened ranking row for CSV export.
#[derive(Debug, Serialize)]
struct RankingFlat<'a> {
    date: NaiveDate,
    period: usize,
    rank: usize,
    code: &'a str,
    score: f64,
}

impl RankingExport {
    fn flat(&self) -> impl Iterator<Item = RankingFlat<'_>> {
        self.rows.iter().map(move |r| RankingFlat {
            date: self.date,
            period: self.period,
            rank: r.rank,
            code: &r.code,
            score: r.score,
        })
    }
}

/// A top-N selection from composite scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionExport {
    /// Reference date.
    pub date: NaiveDate,

    /// Periods combined into the composite.
    pub periods: Vec<usize>,

    /// Aggregation rule, e.g. `inverse_period`.
    pub aggregation: String,

    /// Selected instruments, best first.
    pub picks: Vec<RankingRow>,
}

impl SelectionExport {
    /// Build an export from composite scores.
    pub fn from_composite(
        date: NaiveDate,
        periods: &[usize],
        aggregation: Aggregation,
        scores: &[CompositeScore],
    ) -> Self {
        let picks = scores
            .iter()
            .enumerate()
            .map(|(i, s)| RankingRow {
                rank: i + 1,
                code: s.code.clone(),
                score: s.score,
            })
            .collect();
        Self {
            date,
            periods: periods.to_vec(),
            aggregation: aggregation.as_str().to_string(),
            picks,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for RankingExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.flat()),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<RankingExport> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.iter().flat_map(RankingExport::flat)),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for SelectionExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();

                // Header information as comments
                output.push_str(&format!("# Date: {}\n", self.date));
                let periods: Vec<String> = self.periods.iter().map(|p| p.to_string()).collect();
                output.push_str(&format!("# Periods: {}\n", periods.join(",")));
                output.push_str(&format!("# Aggregation: {}\n", self.aggregation));

                output.push_str(&csv_string(&self.picks)?);
                Ok(output)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// A wide date × code history panel.
///
/// The `date` column and every `f64` column are written; other columns are
/// left out of the CSV form.
#[derive(Debug, Clone, Copy)]
pub struct PanelExport<'a> {
    df: &'a DataFrame,
}

impl<'a> PanelExport<'a> {
    /// Wrap a panel.
    pub const fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }
}

impl Exporter for PanelExport<'_> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        let dates = self.df.column("date")?.str()?;
        let mut codes = Vec::new();
        for column in self.df.get_columns() {
            if let Ok(values) = column.f64() {
                codes.push((column.name().to_string(), values));
            }
        }

        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                let mut header = vec!["date".to_string()];
                header.extend(codes.iter().map(|(name, _)| name.clone()));
                wtr.write_record(&header)?;

                for i in 0..self.df.height() {
                    let mut record = vec![dates.get(i).unwrap_or_default().to_string()];
                    for (_, values) in &codes {
                        record.push(values.get(i).map(|v| v.to_string()).unwrap_or_default());
                    }
                    wtr.write_record(&record)?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json | ExportFormat::PrettyJson => {
                let rows: Vec<serde_json::Value> = (0..self.df.height())
                    .map(|i| {
                        let mut row = serde_json::Map::new();
                        row.insert("date".into(), dates.get(i).unwrap_or_default().into());
                        for (name, values) in &codes {
                            row.insert(name.clone(), values.get(i).into());
                        }
                        serde_json::Value::Object(row)
                    })
                    .collect();
                if format == ExportFormat::Json {
                    Ok(serde_json::to_string(&rows)?)
                } else {
                    Ok(serde_json::to_string_pretty(&rows)?)
                }
            }
        }
    }
}
