//! Text reports of selections and instrument profiles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One selected instrument with its per-period scores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionLine {
    /// Instrument code.
    pub code: String,

    /// Composite score.
    pub composite: f64,

    /// Score in each requested period, in request order.
    pub scores: Vec<Option<f64>>,
}

/// A top-N selection report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionReport {
    /// Reference date.
    pub date: NaiveDate,

    /// Periods combined into the composite.
    pub periods: Vec<usize>,

    /// Aggregation rule.
    pub aggregation: String,

    /// Selected instruments, best first.
    pub lines: Vec<SelectionLine>,
}

fn score_cell(score: Option<f64>) -> String {
    score.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "-".to_string())
}

impl SelectionReport {
    /// Create an empty report.
    pub fn new(date: NaiveDate, periods: Vec<usize>, aggregation: impl Into<String>) -> Self {
        Self {
            date,
            periods,
            aggregation: aggregation.into(),
            lines: Vec::new(),
        }
    }

    /// Append a selected instrument.
    pub fn push(&mut self, line: SelectionLine) {
        self.lines.push(line);
    }

    /// Format the report as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        let width = 32 + 10 * self.periods.len();

        output.push_str(&format!("\nTop {} by RPS on {}\n", self.lines.len(), self.date));
        output.push_str(&format!("Aggregation: {}\n", self.aggregation));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output.push_str(&format!("{:<4} {:<12} {:>12}", "#", "Code", "Composite"));
        for period in &self.periods {
            output.push_str(&format!(" {:>9}", format!("RPS{}", period)));
        }
        output.push('\n');
        output.push_str(&"-".repeat(width));
        output.push('\n');

        if self.lines.is_empty() {
            output.push_str("  (no instrument scored in every period)\n");
        }
        for (i, line) in self.lines.iter().enumerate() {
            output.push_str(&format!("{:<4} {:<12} {:>12.4}", i + 1, line.code, line.composite));
            for score in &line.scores {
                output.push_str(&format!(" {:>9}", score_cell(*score)));
            }
            output.push('\n');
        }

        output
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Top {} by RPS on {}\n\n", self.lines.len(), self.date));
        output.push_str(&format!("**Aggregation:** {}\n\n", self.aggregation));

        output.push_str("| # | Code | Composite |");
        for period in &self.periods {
            output.push_str(&format!(" RPS{} |", period));
        }
        output.push('\n');
        output.push_str("|---|------|-----------|");
        for _ in &self.periods {
            output.push_str("------|");
        }
        output.push('\n');

        for (i, line) in self.lines.iter().enumerate() {
            output.push_str(&format!("| {} | {} | {:.4} |", i + 1, line.code, line.composite));
            for score in &line.scores {
                output.push_str(&format!(" {} |", score_cell(*score)));
            }
            output.push('\n');
        }

        output
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}

/// Per-period scores of one instrument on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileReport {
    /// Instrument code.
    pub code: String,

    /// Reference date.
    pub date: NaiveDate,

    /// `(period, score)` pairs; `None` where the instrument was not ranked.
    pub scores: Vec<(usize, Option<f64>)>,
}

impl ProfileReport {
    /// Format the profile as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRPS profile: {} on {}\n", self.code, self.date));
        output.push_str(&"=".repeat(24));
        output.push('\n');
        for (period, score) in &self.scores {
            output.push_str(&format!("{:<10} {:>13}\n", format!("RPS{}", period), score_cell(*score)));
        }

        output
    }
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}
