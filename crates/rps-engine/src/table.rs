//! Ordered score tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One (code, score) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Instrument code
    pub code: String,
    /// Percentile score in `(0, 100]`
    pub score: f64,
}

/// The scores of one (date, period) unit.
///
/// Rows keep their insertion order; lookups by code go through an index.
/// Inserting a code twice replaces its score in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    entries: Vec<ScoreEntry>,
    index: HashMap<String, usize>,
}

impl ScoreTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Append a row, or replace the score of an existing code.
    pub fn insert(&mut self, code: impl Into<String>, score: f64) {
        let code = code.into();
        if let Some(&i) = self.index.get(&code) {
            self.entries[i].score = score;
        } else {
            self.index.insert(code.clone(), self.entries.len());
            self.entries.push(ScoreEntry { code, score });
        }
    }

    /// Score of a code, if present.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.index.get(code).map(|&i| self.entries[i].score)
    }

    /// Whether a code is present.
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Rows in insertion order.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Iterate `(code, score)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.code.as_str(), e.score))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into an unordered map.
    pub fn to_map(&self) -> HashMap<String, f64> {
        self.iter().map(|(c, s)| (c.to_string(), s)).collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ScoreTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (code, score) in iter {
            table.insert(code, score);
        }
        table
    }
}
