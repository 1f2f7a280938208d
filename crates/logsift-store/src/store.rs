use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, Row, ToSql};

use logsift_types::{FilterSpec, LogRecord, RecordId, StoredRecord};

use crate::error::{Result, StoreError};
use crate::query::{Query, QueryBuilder};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS log_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ip TEXT NOT NULL,
        date TEXT NOT NULL,
        method TEXT NOT NULL,
        url TEXT NOT NULL,
        status INTEGER NOT NULL,
        size INTEGER NOT NULL,
        user_agent TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_log_entries_date ON log_entries (date);
";

/// How long a writer waits on a database locked by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Append-only table of parsed log records
///
/// The connection is guarded by a mutex, so appends from several threads
/// serialize and receive strictly increasing ids.
pub struct RecordStore {
    /// SQLite connection
    conn: Mutex<Connection>,

    /// Database file (`None` for in-memory stores)
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = ?path, "record store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file backing this store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert one record and return its id
    pub fn append(&self, record: &LogRecord) -> Result<RecordId> {
        let size = i64::try_from(record.size).map_err(|_| StoreError::OutOfRange {
            field: "size",
            value: record.size,
        })?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO log_entries (ip, date, method, url, status, size, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.ip,
                record.timestamp,
                record.method,
                record.url,
                i64::from(record.status),
                size,
                record.user_agent,
            ],
        )?;
        // Rowids under AUTOINCREMENT start at 1
        let id = conn.last_insert_rowid();
        Ok(RecordId(id.unsigned_abs()))
    }

    /// Records matching `query`, newest timestamp first
    ///
    /// Timestamps compare as strings, so rows holding a raw fallback date
    /// sort by their characters rather than chronologically.
    pub fn query(&self, query: &Query) -> Result<Vec<StoredRecord>> {
        let sql = format!(
            "SELECT id, ip, date, method, url, status, size, user_agent
             FROM log_entries {} ORDER BY date DESC, id DESC LIMIT ?",
            query.where_clause()
        );
        let params = query.params();
        let limit = i64::try_from(query.limit()).unwrap_or(i64::MAX);

        let mut bound: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        bound.push(&limit);

        tracing::debug!(%sql, ?params, limit, "querying records");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(bound.as_slice(), row_to_record)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Build and run a query from a filter
    pub fn search(&self, spec: &FilterSpec) -> Result<Vec<StoredRecord>> {
        self.query(&QueryBuilder::build(spec))
    }

    /// Total number of stored records
    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .finish()
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id: i64 = row.get(0)?;
    let status: i64 = row.get(5)?;
    let size: i64 = row.get(6)?;

    Ok(StoredRecord {
        id: RecordId(id.unsigned_abs()),
        record: LogRecord {
            ip: row.get(1)?,
            timestamp: row.get(2)?,
            method: row.get(3)?,
            url: row.get(4)?,
            status: u32::try_from(status)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(5, status))?,
            size: u64::try_from(size)
                .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(6, size))?,
            user_agent: row.get(7)?,
        },
    })
}
