//! SQLite-backed score store.

use crate::error::{Result, StoreError};
use crate::layout::{DateTag, decode_score, encode_score, parse_period_label, period_label};
use rps_engine::ScoreTable;
use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Write handle for a freshly created store.
///
/// The connection is released when the writer is dropped; every sub-table
/// committed before that point stays readable.
#[derive(Debug)]
pub struct RpsWriter {
    conn: Connection,
    path: PathBuf,
}

impl RpsWriter {
    /// Create a store at `path`, discarding any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::debug!(path = %path.display(), "removed existing store");
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let writer = Self { conn, path };
        writer.initialize_schema()?;
        Ok(writer)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE groups (
                date_tag TEXT PRIMARY KEY
            );
            CREATE TABLE tables (
                date_tag TEXT NOT NULL REFERENCES groups(date_tag),
                label TEXT NOT NULL,
                period INTEGER NOT NULL,
                rows INTEGER NOT NULL,
                PRIMARY KEY (date_tag, label)
            );
            CREATE TABLE scores (
                date_tag TEXT NOT NULL,
                label TEXT NOT NULL,
                position INTEGER NOT NULL,
                code TEXT NOT NULL,
                score TEXT NOT NULL,
                PRIMARY KEY (date_tag, label, code)
            );
            CREATE INDEX idx_scores_label ON scores(label, date_tag);",
        )?;
        Ok(())
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the group for a date.
    ///
    /// Fails with [`StoreError::Conflict`] when the group already exists.
    pub fn create_group(&self, tag: DateTag) -> Result<()> {
        let tag = tag.to_string();
        match self
            .conn
            .execute("INSERT INTO groups (date_tag) VALUES (?1)", params![tag])
        {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict {
                date_tag: tag,
                label: String::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the sub-table of one (date, period) unit.
    ///
    /// The group is created when absent. The sub-table is committed as a
    /// whole or not at all; writing it a second time fails with
    /// [`StoreError::Conflict`] and leaves the first copy untouched.
    pub fn write(&self, tag: DateTag, period: usize, table: &ScoreTable) -> Result<()> {
        let tag = tag.to_string();
        let label = period_label(period);
        let rows = i64::try_from(table.len()).unwrap_or(i64::MAX);
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO groups (date_tag) VALUES (?1)",
            params![tag],
        )?;
        match tx.execute(
            "INSERT INTO tables (date_tag, label, period, rows) VALUES (?1, ?2, ?3, ?4)",
            params![tag, label, period as i64, rows],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(StoreError::Conflict {
                    date_tag: tag,
                    label,
                });
            }
            Err(e) => return Err(e.into()),
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO scores (date_tag, label, position, code, score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, (code, score)) in table.iter().enumerate() {
                stmt.execute(params![
                    tag,
                    label,
                    position as i64,
                    code,
                    encode_score(score)
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(date = %tag, %label, rows, "sub-table written");
        Ok(())
    }

    /// Flush and release the store.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::from(e))
    }
}

/// Read-only handle on a store.
#[derive(Debug)]
pub struct RpsReader {
    conn: Connection,
}

impl RpsReader {
    /// Open an existing store for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Scores of one (date, period) unit in stored row order.
    ///
    /// Empty when the date or the period is absent.
    pub fn read(&self, tag: DateTag, period: usize) -> Result<ScoreTable> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT code, score FROM scores
             WHERE date_tag = ?1 AND label = ?2
             ORDER BY position",
        )?;
        let rows = stmt.query_map(params![tag.to_string(), period_label(period)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut table = ScoreTable::new();
        for row in rows {
            let (code, text) = row?;
            table.insert(code, decode_score(&text)?);
        }
        Ok(table)
    }

    /// Tables of several periods on one date, keyed by period.
    ///
    /// Absent periods map to empty tables.
    pub fn read_periods(&self, tag: DateTag, periods: &[usize]) -> Result<BTreeMap<usize, ScoreTable>> {
        periods
            .iter()
            .map(|&p| Ok((p, self.read(tag, p)?)))
            .collect()
    }

    /// All date tags in ascending order.
    pub fn dates(&self) -> Result<Vec<DateTag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date_tag FROM groups ORDER BY date_tag")?;
        let tags = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        tags.iter().map(|t| t.parse()).collect()
    }

    /// Periods with a sub-table under a date, ascending.
    pub fn periods(&self, tag: DateTag) -> Result<Vec<usize>> {
        let mut stmt = self
            .conn
            .prepare("SELECT label FROM tables WHERE date_tag = ?1")?;
        let labels = stmt
            .query_map(params![tag.to_string()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        let mut periods = labels
            .iter()
            .map(|l| parse_period_label(l))
            .collect::<Result<Vec<usize>>>()?;
        periods.sort_unstable();
        Ok(periods)
    }

    /// Every score of one period, as `(date_tag, code, score)` in date then
    /// row order.
    pub fn scan_period(&self, period: usize) -> Result<Vec<(DateTag, String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT date_tag, code, score FROM scores
             WHERE label = ?1
             ORDER BY date_tag, position",
        )?;
        let rows = stmt.query_map(params![period_label(period)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (tag, code, text) = row?;
            out.push((tag.parse()?, code, decode_score(&text)?));
        }
        Ok(out)
    }
}

/// Open `path` and read one (date, period) unit.
pub fn read_scores<P: AsRef<Path>>(path: P, tag: DateTag, period: usize) -> Result<ScoreTable> {
    RpsReader::open(path)?.read(tag, period)
}
