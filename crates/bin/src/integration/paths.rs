//! Default locations of the quote cache and the score store.
//!
//! Uses platform-specific data directories:
//! - Linux: `~/.local/share/rps/`
//! - macOS: `~/Library/Application Support/rps/`
//! - Windows: `%APPDATA%\rps\`

use rps_data::{DataError, SqliteCache};
use std::path::{Path, PathBuf};

/// Get the default data directory path.
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rps")
}

/// Get the default quote cache path.
pub(crate) fn default_quotes_path() -> PathBuf {
    default_data_dir().join("quotes.db")
}

/// Get the default score store path.
pub(crate) fn default_store_path() -> PathBuf {
    default_data_dir().join("daily_rps.db")
}

/// Resolve an optional user path against a default.
pub(crate) fn or_default(path: Option<PathBuf>, default: fn() -> PathBuf) -> PathBuf {
    path.unwrap_or_else(default)
}

/// Open the quote cache for writing, creating the directory if needed.
pub(crate) fn open_quotes(path: &Path) -> Result<SqliteCache, DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCache::new(path)
}

/// Open an existing quote cache for reading.
pub(crate) fn open_quotes_read_only(path: &Path) -> Result<SqliteCache, DataError> {
    if !path.exists() {
        return Err(DataError::MissingData {
            symbol: path.display().to_string(),
            reason: "quote cache not found; run `rps import` first".to_string(),
        });
    }
    SqliteCache::open_read_only(path)
}
