//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `contactmgr_core` linkage and print its version.
//! - Optionally load a register database, settle elapsed meetings, flush the
//!   result back and print a one-line summary.
//!
//! Usage: `contactmgr_cli [DB_PATH]`, with `CONTACTMGR_DB` as fallback and
//! `CONTACTMGR_LOG_DIR` (absolute) to enable file logging.

use contactmgr_core::{
    default_log_level, init_logging, open_db, ContactManager, SqliteSnapshotStore, SystemClock,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

const DB_ENV_VAR: &str = "CONTACTMGR_DB";
const LOG_DIR_ENV_VAR: &str = "CONTACTMGR_LOG_DIR";

fn main() -> ExitCode {
    println!("contactmgr_core version={}", contactmgr_core::core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV_VAR) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let Some(db_path) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(DB_ENV_VAR).ok())
    else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> Result<(), Box<dyn Error>> {
    let mut conn = open_db(db_path)?;
    let mut store = SqliteSnapshotStore::new(&mut conn);

    let mut manager = match store.load()? {
        Some(snapshot) => ContactManager::from_snapshot(snapshot, SystemClock)?,
        None => ContactManager::default(),
    };
    let counts = manager.meeting_counts();
    store.save(&manager.export_snapshot())?;

    info!(
        "event=cli_summary module=cli status=ok contacts={} future={} past={}",
        manager.contact_count(),
        counts.future,
        counts.past
    );
    println!(
        "contacts={} meetings={} future={} past={}",
        manager.contact_count(),
        manager.meeting_count(),
        counts.future,
        counts.past
    );
    Ok(())
}
