//! SQLite persistence for manager snapshots.
//!
//! # Responsibility
//! - Open and configure SQLite connections.
//! - Apply schema migrations in deterministic order.
//! - Save and load full `Snapshot`s (the durable flush/reload path).
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Nothing reads or writes register data before migrations succeed.

use crate::snapshot::SnapshotError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod snapshot_store;

pub use open::{open_db, open_db_in_memory};
pub use snapshot_store::SqliteSnapshotStore;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Stored rows or an outgoing snapshot break register invariants.
    Snapshot(SnapshotError),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::Snapshot(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<SnapshotError> for DbError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}
