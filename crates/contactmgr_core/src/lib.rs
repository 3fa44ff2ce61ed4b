//! Core domain logic for the contact manager.
//! This crate is the single source of truth for contact and meeting
//! invariants.

pub mod clock;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, SqliteSnapshotStore};
pub use error::{CoreError, CoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactHandle};
pub use model::ids::{ContactId, IdIssuer, MeetingId};
pub use model::meeting::{FutureMeeting, Meeting, PastMeeting};
pub use service::contact_manager::{ContactManager, MeetingCounts};
pub use snapshot::{Snapshot, SnapshotError, SnapshotResult, SNAPSHOT_FORMAT_VERSION};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
