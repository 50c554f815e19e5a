//! Error types for store operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The directory holding the store file could not be created.
    #[error("failed to create store directory '{}': {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store file could not be opened.
    #[error("failed to open store '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The record table could not be created.
    #[error("failed to create record table: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A record could not be written.
    #[error("failed to store record '{id}': {source}")]
    Upsert {
        id: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A caller-supplied statement failed; the engine's message is kept as is.
    #[error("{0}")]
    Query(#[source] rusqlite::Error),

    /// The record count could not be read.
    #[error("failed to count records: {0}")]
    Count(#[source] rusqlite::Error),

    /// The store file's size could not be read.
    #[error("failed to read size of '{}': {source}", .path.display())]
    Size {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The store handle has already been released.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates an upsert error for the given record identifier.
    pub fn upsert(id: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Upsert {
            id: id.into(),
            source,
        }
    }
}
