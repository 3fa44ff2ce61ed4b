//! Export/import contract for persistence collaborators.
//!
//! # Responsibility
//! - Capture every contact and meeting, lifecycle state and notes included.
//! - Validate an incoming snapshot before it replaces any manager state.
//! - Provide the JSON encoding used by file-based callers.
//!
//! # Invariants
//! - Export then import preserves every field and the future/past split.
//! - Imported meetings only reference imported contact handles.
//! - Restored id sequences resume strictly above every imported id.

use crate::model::contact::{Contact, ContactHandle};
use crate::model::ids::IdIssuer;
use crate::model::meeting::Meeting;
use crate::repo::contact_registry::ContactRegistry;
use crate::repo::meeting_store::MeetingStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Current snapshot layout version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    InvalidData(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot encoding error: {err}"),
            Self::InvalidData(message) => write!(f, "invalid snapshot data: {message}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Full manager state as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    /// Contacts in ascending id order.
    pub contacts: Vec<Contact>,
    /// Meetings in store insertion order, lifecycle as stored.
    pub meetings: Vec<Meeting>,
}

/// Validated state ready to be installed into a manager.
pub(crate) struct RestoredState {
    pub(crate) ids: IdIssuer,
    pub(crate) contacts: ContactRegistry,
    pub(crate) meetings: MeetingStore,
}

impl Snapshot {
    pub fn new(contacts: Vec<Contact>, meetings: Vec<Meeting>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            contacts,
            meetings,
        }
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks structural invariants without building any state.
    pub fn validate(&self) -> SnapshotResult<()> {
        self.restore().map(|_| ())
    }

    pub(crate) fn restore(&self) -> SnapshotResult<RestoredState> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::InvalidData(format!(
                "unsupported format_version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                self.format_version
            )));
        }

        let mut contacts = ContactRegistry::new();
        for contact in &self.contacts {
            if !contacts.insert_restored(contact.clone()) {
                return Err(SnapshotError::InvalidData(format!(
                    "duplicate contact id {}",
                    contact.id()
                )));
            }
        }
        let known: HashSet<ContactHandle> = contacts.iter().map(Contact::handle).collect();

        let mut meetings = MeetingStore::new();
        for meeting in &self.meetings {
            if meeting.participants().is_empty() {
                return Err(SnapshotError::InvalidData(format!(
                    "meeting {} has no participants",
                    meeting.id()
                )));
            }
            if let Some(stranger) = meeting
                .participants()
                .iter()
                .find(|handle| !known.contains(*handle))
            {
                return Err(SnapshotError::InvalidData(format!(
                    "meeting {} references unknown contact {}",
                    meeting.id(),
                    stranger.id
                )));
            }
            if !meetings.insert_restored(meeting.clone()) {
                return Err(SnapshotError::InvalidData(format!(
                    "duplicate meeting id {}",
                    meeting.id()
                )));
            }
        }

        let ids = IdIssuer::resume_after(contacts.max_id(), meetings.max_id()).ok_or_else(|| {
            SnapshotError::InvalidData(format!(
                "ids must stay below {} so new ids can follow them",
                u32::MAX
            ))
        })?;

        Ok(RestoredState {
            ids,
            contacts,
            meetings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Snapshot, SnapshotError, SNAPSHOT_FORMAT_VERSION};
    use crate::model::contact::Contact;
    use crate::model::ids::{ContactId, MeetingId};
    use crate::model::meeting::{FutureMeeting, Meeting};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn meeting_with(id: u32, contact: &Contact) -> Meeting {
        let date = Utc.with_ymd_and_hms(2031, 3, 4, 10, 0, 0).unwrap();
        Meeting::Future(FutureMeeting::new(
            MeetingId(id),
            date,
            BTreeSet::from([contact.handle()]),
        ))
    }

    #[test]
    fn restore_resumes_ids_above_maxima() {
        let alice = Contact::new(ContactId(1017), "Alice", "");
        let snapshot = Snapshot::new(vec![alice.clone()], vec![meeting_with(12, &alice)]);

        let mut state = snapshot.restore().unwrap();
        assert_eq!(state.ids.next_contact_id().unwrap(), ContactId(1018));
        assert_eq!(state.ids.next_meeting_id().unwrap(), MeetingId(13));
        assert!(state.contacts.is_member(&alice.handle()));
    }

    #[test]
    fn validate_rejects_foreign_participant_handle() {
        let alice = Contact::new(ContactId(1000), "Alice", "");
        let impostor = Contact::new(ContactId(1000), "Alice", "");
        let snapshot = Snapshot::new(vec![alice], vec![meeting_with(1, &impostor)]);

        let err = snapshot.validate().unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidData(message) if message.contains("unknown contact")));
    }

    #[test]
    fn validate_rejects_duplicates_and_unknown_versions() {
        let alice = Contact::new(ContactId(1000), "Alice", "");
        let duplicated = Snapshot::new(vec![alice.clone(), alice.clone()], Vec::new());
        assert!(duplicated.validate().is_err());

        let twice = Snapshot::new(
            vec![alice.clone()],
            vec![meeting_with(1, &alice), meeting_with(1, &alice)],
        );
        assert!(twice.validate().is_err());

        let mut newer = Snapshot::new(vec![alice], Vec::new());
        newer.format_version = SNAPSHOT_FORMAT_VERSION + 1;
        assert!(newer.validate().is_err());
    }

    #[test]
    fn restore_rejects_ids_at_the_top_of_the_range() {
        let last = Contact::new(ContactId(u32::MAX), "Last", "");
        let err = Snapshot::new(vec![last], Vec::new()).validate().unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidData(message) if message.contains("new ids")));

        let alice = Contact::new(ContactId(1000), "Alice", "");
        let crowded = Snapshot::new(vec![alice.clone()], vec![meeting_with(u32::MAX, &alice)]);
        assert!(crowded.validate().is_err());
    }

    #[test]
    fn json_rejects_garbage() {
        let err = Snapshot::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }
}
