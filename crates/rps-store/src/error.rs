//! Error types for the score store.

use thiserror::Error;

/// Errors raised by the score store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A group or sub-table was written twice.
    #[error("{date_tag}/{label} already exists")]
    Conflict {
        /// Date tag of the group
        date_tag: String,
        /// Sub-table label, empty for a group
        label: String,
    },

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed date tag or period label
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// Polars error while building a panel
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
