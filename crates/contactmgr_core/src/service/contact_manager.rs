//! Contact manager orchestration.
//!
//! # Responsibility
//! - Expose the full contact/meeting contract to callers.
//! - Enforce cross-entity invariants (meeting contacts must be registry
//!   members) before delegating to the registry and the meeting store.
//! - Issue ids and read the clock once per operation.
//!
//! # Invariants
//! - Only handles held by this manager's registry are accepted.
//! - Empty contact sets are rejected for both future and past meetings.
//! - Failed operations consume no ids and change no state.

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, CoreResult};
use crate::model::contact::{Contact, ContactHandle};
use crate::model::ids::{ContactId, IdIssuer, MeetingId};
use crate::model::meeting::{FutureMeeting, Meeting, PastMeeting};
use crate::repo::contact_registry::ContactRegistry;
use crate::repo::meeting_store::MeetingStore;
use crate::snapshot::{Snapshot, SnapshotResult};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Meeting totals by stored lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeetingCounts {
    pub future: usize,
    pub past: usize,
}

/// Owner of one register of contacts and meetings.
pub struct ContactManager<C: Clock = SystemClock> {
    clock: C,
    ids: IdIssuer,
    contacts: ContactRegistry,
    meetings: MeetingStore,
}

impl Default for ContactManager<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> ContactManager<C> {
    /// Creates an empty manager reading time from `clock`.
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            ids: IdIssuer::new(),
            contacts: ContactRegistry::new(),
            meetings: MeetingStore::new(),
        }
    }

    /// Creates a manager rehydrated from `snapshot`.
    pub fn from_snapshot(snapshot: Snapshot, clock: C) -> SnapshotResult<Self> {
        let mut manager = Self::new(clock);
        manager.import_snapshot(snapshot)?;
        Ok(manager)
    }

    /// Schedules a meeting for a future date and returns its id.
    ///
    /// # Errors
    /// - `InvalidArgument` when `contacts` is empty, contains a contact that
    ///   is not registered here, or `date` is not strictly in the future.
    pub fn add_future_meeting(
        &mut self,
        contacts: &[Contact],
        date: DateTime<Utc>,
    ) -> CoreResult<MeetingId> {
        let now = self.clock.now();
        let participants = self.validated_participants(contacts)?;
        if date <= now {
            return Err(reject(
                "meeting_schedule",
                format!("meeting date {date} is not in the future"),
            ));
        }

        let count = participants.len();
        let id = self.ids.next_meeting_id()?;
        self.meetings.schedule_future(id, participants, date, now)?;
        info!(
            "event=meeting_schedule module=manager status=ok meeting_id={} participants={}",
            id, count
        );
        Ok(id)
    }

    /// Returns the past meeting with `id`, or `None` if there is none.
    ///
    /// # Errors
    /// - `InvalidArgument` when that meeting is still in the future.
    pub fn get_past_meeting(&mut self, id: MeetingId) -> CoreResult<Option<PastMeeting>> {
        let now = self.clock.now();
        self.meetings.past_by_id(id, now)
    }

    /// Returns the future meeting with `id`, or `None` if there is none.
    ///
    /// # Errors
    /// - `InvalidArgument` when that meeting has already happened.
    pub fn get_future_meeting(&mut self, id: MeetingId) -> CoreResult<Option<FutureMeeting>> {
        let now = self.clock.now();
        self.meetings.future_by_id(id, now)
    }

    /// Returns the meeting with `id` in whichever state it is in.
    pub fn get_meeting(&mut self, id: MeetingId) -> Option<Meeting> {
        let now = self.clock.now();
        self.meetings.by_id(id, now)
    }

    /// Lists the upcoming meetings of `contact`, earliest first.
    pub fn get_future_meeting_list(&mut self, contact: &Contact) -> CoreResult<Vec<Meeting>> {
        let now = self.clock.now();
        let handle = self.member_handle(contact)?;
        Ok(self.meetings.list_by_contact(&handle, true, now))
    }

    /// Lists every meeting held on the calendar day of `date`, past or
    /// future, ordered by time of day.
    pub fn get_meeting_list_on(&mut self, date: DateTime<Utc>) -> Vec<Meeting> {
        let now = self.clock.now();
        self.meetings.list_by_calendar_day(date.date_naive(), now)
    }

    /// Lists the past meetings of `contact`, earliest first.
    ///
    /// Elapsed future meetings of that contact are converted on the way.
    pub fn get_past_meeting_list(&mut self, contact: &Contact) -> CoreResult<Vec<PastMeeting>> {
        let now = self.clock.now();
        let handle = self.member_handle(contact)?;
        Ok(self
            .meetings
            .list_by_contact(&handle, false, now)
            .into_iter()
            .filter_map(Meeting::into_past_meeting)
            .collect())
    }

    /// Records a meeting that already took place.
    ///
    /// # Errors
    /// - `InvalidArgument` when `contacts` is empty, contains a contact that
    ///   is not registered here, or `date` is not strictly in the past.
    pub fn add_new_past_meeting(
        &mut self,
        contacts: &[Contact],
        date: DateTime<Utc>,
        text: &str,
    ) -> CoreResult<MeetingId> {
        let now = self.clock.now();
        let participants = self.validated_participants(contacts)?;
        if date >= now {
            return Err(reject(
                "meeting_record",
                format!("meeting date {date} is not in the past"),
            ));
        }

        let count = participants.len();
        let id = self.ids.next_meeting_id()?;
        self.meetings.record_past(id, participants, date, text, now)?;
        info!(
            "event=meeting_record module=manager status=ok meeting_id={} participants={}",
            id, count
        );
        Ok(id)
    }

    /// Adds notes to a meeting that has happened, converting it if needed.
    ///
    /// # Errors
    /// - `InvalidArgument` when no meeting has `id`.
    /// - `FutureState` when the meeting is still in the future.
    pub fn add_meeting_notes(&mut self, id: MeetingId, text: &str) -> CoreResult<PastMeeting> {
        let now = self.clock.now();
        match self.meetings.append_notes(id, text, now) {
            Ok(meeting) => {
                info!(
                    "event=meeting_notes module=manager status=ok meeting_id={} notes_len={}",
                    id,
                    meeting.notes().len()
                );
                Ok(meeting)
            }
            Err(err) => {
                debug!(
                    "event=meeting_notes module=manager status=rejected meeting_id={} error={}",
                    id, err
                );
                Err(err)
            }
        }
    }

    /// Registers a new contact and returns it.
    pub fn add_new_contact(&mut self, name: &str, notes: &str) -> CoreResult<Contact> {
        let id = self.ids.next_contact_id()?;
        let contact = self.contacts.add(id, name, notes)?;
        info!("event=contact_add module=manager status=ok contact_id={id}");
        Ok(contact)
    }

    /// Returns the contacts for `ids`; fails as a whole if any is unknown.
    pub fn get_contacts_by_ids(&self, ids: &[ContactId]) -> CoreResult<Vec<Contact>> {
        self.contacts.find_by_ids(ids)
    }

    /// Returns contacts whose name contains `text`.
    pub fn get_contacts_by_name(&self, text: &str) -> CoreResult<Vec<Contact>> {
        self.contacts.find_by_name_substring(text)
    }

    /// Appends notes to a registered contact and returns the updated record.
    pub fn add_contact_notes(&mut self, contact: &Contact, text: &str) -> CoreResult<Contact> {
        self.contacts.append_notes(&contact.handle(), text)
    }

    /// Resolves a meeting's participant handles to current contact records.
    pub fn meeting_contacts(&self, meeting: &Meeting) -> Vec<Contact> {
        meeting
            .participants()
            .iter()
            .filter_map(|handle| self.contacts.resolve(handle))
            .cloned()
            .collect()
    }

    /// Whether `contact` is the registered instance for its id.
    pub fn is_registered(&self, contact: &Contact) -> bool {
        self.contacts.is_member(&contact.handle())
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn meeting_count(&self) -> usize {
        self.meetings.len()
    }

    /// Converts every elapsed meeting, then counts meetings by state.
    pub fn meeting_counts(&mut self) -> MeetingCounts {
        let now = self.clock.now();
        let converted = self.meetings.settle_all(now);
        if converted > 0 {
            debug!("event=meeting_settle module=manager status=ok converted={converted}");
        }

        let past = self.meetings.iter().filter(|meeting| meeting.is_past()).count();
        MeetingCounts {
            future: self.meetings.len() - past,
            past,
        }
    }

    /// Captures the full state, with meetings exactly as stored.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.contacts.iter().cloned().collect(),
            self.meetings.iter().cloned().collect(),
        )
    }

    /// Replaces the full state with `snapshot`.
    ///
    /// Nothing changes when validation fails.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> SnapshotResult<()> {
        let restored = snapshot.restore().map_err(|err| {
            warn!("event=snapshot_import module=manager status=error error={err}");
            err
        })?;

        self.ids = restored.ids;
        self.contacts = restored.contacts;
        self.meetings = restored.meetings;
        info!(
            "event=snapshot_import module=manager status=ok contacts={} meetings={}",
            self.contacts.len(),
            self.meetings.len()
        );
        Ok(())
    }

    fn member_handle(&self, contact: &Contact) -> CoreResult<ContactHandle> {
        let handle = contact.handle();
        if !self.contacts.is_member(&handle) {
            return Err(reject(
                "contact_check",
                format!("contact {} is not registered", contact.id()),
            ));
        }
        Ok(handle)
    }

    fn validated_participants(&self, contacts: &[Contact]) -> CoreResult<BTreeSet<ContactHandle>> {
        if contacts.is_empty() {
            return Err(reject(
                "contact_check",
                "a meeting needs at least one contact".to_string(),
            ));
        }
        contacts
            .iter()
            .map(|contact| self.member_handle(contact))
            .collect()
    }
}

fn reject(event: &str, message: String) -> CoreError {
    debug!("event={event} module=manager status=rejected reason={message}");
    CoreError::InvalidArgument(message)
}
