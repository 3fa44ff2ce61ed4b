//! SQLite-backed snapshot store.
//!
//! # Responsibility
//! - Persist a full manager `Snapshot` and read it back.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save` validates first and replaces all stored rows in one transaction.
//! - `load` rejects rows that do not form a valid snapshot instead of
//!   masking them.
//! - Timestamps are stored as seconds plus nanoseconds, so every instant a
//!   meeting can hold survives unchanged.

use crate::db::{DbError, DbResult};
use crate::model::contact::{Contact, ContactHandle};
use crate::model::ids::{ContactId, MeetingId};
use crate::model::meeting::{FutureMeeting, Meeting, PastMeeting};
use crate::snapshot::{Snapshot, SnapshotError};
use chrono::DateTime;
use log::info;
use rusqlite::{params, Connection, Row};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use uuid::Uuid;

const STATE_FUTURE: &str = "future";
const STATE_PAST: &str = "past";

/// Durable home for the register between process runs.
pub struct SqliteSnapshotStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteSnapshotStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Replaces the stored register with `snapshot`.
    ///
    /// # Errors
    /// - `DbError::Snapshot` when `snapshot` is not valid; nothing is written.
    /// - `DbError::Sqlite` on storage failure; the previous state is kept.
    pub fn save(&mut self, snapshot: &Snapshot) -> DbResult<()> {
        snapshot.validate()?;
        let started_at = Instant::now();

        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM meeting_participants;
             DELETE FROM meetings;
             DELETE FROM contacts;",
        )?;
        {
            let mut insert_contact = tx.prepare(
                "INSERT INTO contacts (id, instance, name, notes) VALUES (?1, ?2, ?3, ?4);",
            )?;
            for contact in &snapshot.contacts {
                insert_contact.execute(params![
                    contact.id().0,
                    contact.instance().to_string(),
                    contact.name(),
                    contact.notes(),
                ])?;
            }

            let mut insert_meeting = tx.prepare(
                "INSERT INTO meetings (id, date_secs, date_nanos, state, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            let mut insert_participant = tx.prepare(
                "INSERT INTO meeting_participants (meeting_id, contact_id) VALUES (?1, ?2);",
            )?;
            for meeting in &snapshot.meetings {
                let date = meeting.date();
                insert_meeting.execute(params![
                    meeting.id().0,
                    date.timestamp(),
                    date.timestamp_subsec_nanos(),
                    state_to_db(meeting),
                    meeting.notes(),
                ])?;
                for handle in meeting.participants() {
                    insert_participant.execute(params![meeting.id().0, handle.id.0])?;
                }
            }
        }
        tx.commit()?;

        info!(
            "event=snapshot_save module=db status=ok contacts={} meetings={} duration_ms={}",
            snapshot.contacts.len(),
            snapshot.meetings.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Reads the stored register, or `None` when nothing was saved yet.
    pub fn load(&self) -> DbResult<Option<Snapshot>> {
        let contacts = self.load_contacts()?;
        let meetings = self.load_meetings(&contacts)?;
        if contacts.is_empty() && meetings.is_empty() {
            return Ok(None);
        }

        let snapshot = Snapshot::new(contacts, meetings);
        snapshot.validate()?;
        info!(
            "event=snapshot_load module=db status=ok contacts={} meetings={}",
            snapshot.contacts.len(),
            snapshot.meetings.len()
        );
        Ok(Some(snapshot))
    }

    fn load_contacts(&self) -> DbResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, instance, name, notes FROM contacts ORDER BY id;")?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn load_meetings(&self, contacts: &[Contact]) -> DbResult<Vec<Meeting>> {
        let handles: HashMap<ContactId, ContactHandle> = contacts
            .iter()
            .map(|contact| (contact.id(), contact.handle()))
            .collect();

        let mut participants: BTreeMap<MeetingId, BTreeSet<ContactHandle>> = BTreeMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT meeting_id, contact_id FROM meeting_participants;")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let meeting_id = MeetingId(row.get("meeting_id")?);
                let contact_id = ContactId(row.get("contact_id")?);
                let handle = handles.get(&contact_id).copied().ok_or_else(|| {
                    invalid_data(format!(
                        "meeting {meeting_id} references missing contact {contact_id}"
                    ))
                })?;
                participants.entry(meeting_id).or_default().insert(handle);
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, date_secs, date_nanos, state, notes FROM meetings ORDER BY id;",
        )?;
        let mut rows = stmt.query([])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            let id = MeetingId(row.get("id")?);
            let attendees = participants.remove(&id).unwrap_or_default();
            meetings.push(parse_meeting_row(row, id, attendees)?);
        }
        Ok(meetings)
    }
}

fn parse_contact_row(row: &Row<'_>) -> DbResult<Contact> {
    let instance_text: String = row.get("instance")?;
    let instance = Uuid::parse_str(&instance_text).map_err(|_| {
        invalid_data(format!(
            "invalid uuid value `{instance_text}` in contacts.instance"
        ))
    })?;

    Ok(Contact::restore(
        ContactId(row.get("id")?),
        row.get("name")?,
        row.get("notes")?,
        instance,
    ))
}

fn parse_meeting_row(
    row: &Row<'_>,
    id: MeetingId,
    participants: BTreeSet<ContactHandle>,
) -> DbResult<Meeting> {
    let secs: i64 = row.get("date_secs")?;
    let nanos: u32 = row.get("date_nanos")?;
    let date = DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
        invalid_data(format!(
            "invalid timestamp {secs}.{nanos:09} for meeting {id}"
        ))
    })?;

    let state: String = row.get("state")?;
    let notes: Option<String> = row.get("notes")?;
    match (state.as_str(), notes) {
        (STATE_FUTURE, None) => Ok(Meeting::Future(FutureMeeting::new(id, date, participants))),
        (STATE_PAST, Some(notes)) => Ok(Meeting::Past(PastMeeting::new(
            id,
            date,
            participants,
            notes,
        ))),
        (other, _) => Err(invalid_data(format!(
            "invalid state `{other}` or notes for meeting {id}"
        ))),
    }
}

fn state_to_db(meeting: &Meeting) -> &'static str {
    match meeting {
        Meeting::Future(_) => STATE_FUTURE,
        Meeting::Past(_) => STATE_PAST,
    }
}

fn invalid_data(message: String) -> DbError {
    DbError::Snapshot(SnapshotError::InvalidData(message))
}

#[cfg(test)]
mod tests {
    use super::SqliteSnapshotStore;
    use crate::db::{open_db_in_memory, DbError};
    use crate::model::contact::Contact;
    use crate::model::ids::ContactId;
    use crate::snapshot::Snapshot;

    #[test]
    fn load_from_fresh_database_returns_none() {
        let mut conn = open_db_in_memory().unwrap();
        let store = SqliteSnapshotStore::new(&mut conn);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_rejects_invalid_snapshot_without_writing() {
        let mut conn = open_db_in_memory().unwrap();
        let mut store = SqliteSnapshotStore::new(&mut conn);
        let alice = Contact::new(ContactId(1000), "Alice", "");
        let invalid = Snapshot::new(vec![alice.clone(), alice], Vec::new());

        let err = store.save(&invalid).unwrap_err();
        assert!(matches!(err, DbError::Snapshot(_)));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_rejects_corrupted_instance_key() {
        let mut conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO contacts (id, instance, name, notes) VALUES (1000, 'nope', 'A', '');",
            [],
        )
        .unwrap();

        let store = SqliteSnapshotStore::new(&mut conn);
        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("contacts.instance"));
    }
}
