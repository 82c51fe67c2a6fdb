//! Top-level error type.

use rps_data::DataError;
use rps_output::ExportError;
use rps_store::StoreError;
use thiserror::Error;

/// Errors surfaced by runs and queries.
#[derive(Debug, Error)]
pub enum RpsError {
    /// Market data could not be read.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The score store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An export failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runs and queries.
pub type Result<T> = std::result::Result<T, RpsError>;
