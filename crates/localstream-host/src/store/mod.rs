//! Durable single-table record store.
//!
//! The dispatcher talks to the store through [`RecordStore`] so handlers can
//! be exercised against doubles; the host itself uses [`SqliteStore`].

mod errors;
mod record;
mod sqlite;

use serde::Serialize;
use serde_json::Value;

pub use self::errors::StoreError;
pub use self::record::Record;
pub use self::sqlite::SqliteStore;

const STORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::store");

/// One result row, with column values in statement order.
pub type QueryRow = Vec<Value>;

/// Aggregate figures reported by [`RecordStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of stored records.
    pub total: u64,
    /// On-disk size of the store in bytes; 0 when no file exists yet.
    pub size: u64,
}

/// Persistence contract used by the action handlers.
pub trait RecordStore {
    /// Creates the record table if it does not exist. Idempotent.
    fn ensure_schema(&mut self) -> Result<(), StoreError>;

    /// Inserts `record`, or replaces every column of the row sharing its
    /// identifier, as one atomic write.
    fn upsert(&mut self, record: &Record) -> Result<(), StoreError>;

    /// Executes a caller-supplied statement and returns all result rows.
    ///
    /// Statements run verbatim. The only caller is the parent process that
    /// spawned the host, which is trusted by construction; the escape hatch
    /// exists for ad-hoc diagnostics and is not sanitized.
    fn query(&mut self, statement: &str) -> Result<Vec<QueryRow>, StoreError>;

    /// Reports the record count and on-disk size.
    fn stats(&mut self) -> Result<StoreStats, StoreError>;

    /// Releases the store handle. Idempotent and infallible; failures are
    /// logged.
    fn close(&mut self);
}
