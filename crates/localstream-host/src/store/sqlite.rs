//! SQLite-backed record store.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags, params};
use serde_json::{Number, Value};
use tracing::{debug, warn};

use super::{QueryRow, Record, RecordStore, STORE_TARGET, StoreError, StoreStats};

const BUSY_TIMEOUT_MS: u64 = 100;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tweets (
    originator_id TEXT PRIMARY KEY,
    timestamp TEXT,
    type TEXT,
    data TEXT,
    user_id TEXT,
    canSendToCA BOOLEAN,
    reason TEXT,
    date_added TEXT
)";

const UPSERT_RECORD: &str = "INSERT OR REPLACE INTO tweets
    (originator_id, timestamp, type, data, user_id, canSendToCA, reason, date_added)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const COUNT_RECORDS: &str = "SELECT COUNT(*) FROM tweets";

/// Record store backed by a single SQLite file.
///
/// The connection lives in an `Option` so [`RecordStore::close`] can release
/// it early; every later operation reports [`StoreError::Closed`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (creating when absent) the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateDirectory`] if the parent directory cannot
    /// be created, or [`StoreError::Open`] if SQLite rejects the file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(target: STORE_TARGET, path = %path.display(), "store opened");
        Ok(Self {
            conn: Some(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a transient in-memory store; its reported size is always 0.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// Location of the store file, if it is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true once [`RecordStore::close`] has released the handle.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    fn connection(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn file_size(&self) -> Result<u64, StoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(0);
        };
        match fs::metadata(path) {
            Ok(metadata) => Ok(metadata.len()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(source) => Err(StoreError::Size {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl RecordStore for SqliteStore {
    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.connection()?
            .execute_batch(CREATE_TABLE)
            .map_err(StoreError::Schema)
    }

    fn upsert(&mut self, record: &Record) -> Result<(), StoreError> {
        let conn = self.connection()?;
        let mut statement = conn
            .prepare_cached(UPSERT_RECORD)
            .map_err(|source| StoreError::upsert(&record.originator_id, source))?;
        statement
            .execute(params![
                record.originator_id,
                record.timestamp,
                record.record_type,
                record.data,
                record.user_id,
                record.can_send_to_ca,
                record.reason,
                record.date_added,
            ])
            .map_err(|source| StoreError::upsert(&record.originator_id, source))?;
        Ok(())
    }

    fn query(&mut self, statement: &str) -> Result<Vec<QueryRow>, StoreError> {
        let conn = self.connection()?;
        // SQLite prepares comment-only text to a null statement that cannot
        // be stepped.
        if Batch::new(conn, statement)
            .next()
            .map_err(StoreError::Query)?
            .is_none()
        {
            return Ok(Vec::new());
        }
        let mut prepared = conn.prepare(statement).map_err(StoreError::Query)?;
        let columns = prepared.column_count();
        let mut rows = prepared.query([]).map_err(StoreError::Query)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(StoreError::Query)? {
            let mut values = Vec::with_capacity(columns);
            for index in 0..columns {
                let value = row.get_ref(index).map_err(StoreError::Query)?;
                values.push(column_value(value));
            }
            results.push(values);
        }
        Ok(results)
    }

    fn stats(&mut self) -> Result<StoreStats, StoreError> {
        let count: i64 = self
            .connection()?
            .query_row(COUNT_RECORDS, [], |row| row.get(0))
            .map_err(StoreError::Count)?;
        Ok(StoreStats {
            total: u64::try_from(count).unwrap_or(0),
            size: self.file_size()?,
        })
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close() {
            Ok(()) => debug!(target: STORE_TARGET, "store closed"),
            Err((_conn, error)) => {
                warn!(target: STORE_TARGET, %error, "store did not close cleanly");
            }
        }
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        self.close();
    }
}

/// Converts one SQLite column value into JSON.
///
/// Non-finite reals become `null`; blobs are base64 text.
fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::String(BASE64.encode(bytes)),
    }
}
