//! Canonical meeting collection and the future-to-past lifecycle.
//!
//! # Responsibility
//! - Own every meeting in insertion order, indexed by id.
//! - Convert latent past meetings the first time an operation observes them.
//! - Answer lookups and ordered listings with a lifecycle-correct view.
//!
//! # Invariants
//! - Every method receives `now` from its caller; the future/past split is
//!   recomputed from dates on each call, never cached.
//! - Conversion happens through `settle` only, at most once per meeting, and
//!   keeps id, date and participants.
//! - No meeting is ever removed.

use crate::error::{CoreError, CoreResult};
use crate::model::contact::ContactHandle;
use crate::model::ids::MeetingId;
use crate::model::meeting::{
    falls_on_day, sort_chronologically, FutureMeeting, Meeting, PastMeeting,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct MeetingStore {
    meetings: Vec<Meeting>,
    index: HashMap<MeetingId, usize>,
}

impl MeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new future meeting.
    ///
    /// # Errors
    /// - `InvalidArgument` when `date` is not strictly after `now`, when
    ///   `participants` is empty, or when `id` is already used.
    pub fn schedule_future(
        &mut self,
        id: MeetingId,
        participants: BTreeSet<ContactHandle>,
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CoreResult<MeetingId> {
        ensure_participants(&participants)?;
        if date <= now {
            return Err(CoreError::InvalidArgument(format!(
                "meeting date {date} is not in the future"
            )));
        }
        self.insert(Meeting::Future(FutureMeeting::new(id, date, participants)))
    }

    /// Stores a meeting that already took place, with its notes.
    ///
    /// # Errors
    /// - `InvalidArgument` when `date` is at or after `now`, when
    ///   `participants` is empty, or when `id` is already used.
    pub fn record_past(
        &mut self,
        id: MeetingId,
        participants: BTreeSet<ContactHandle>,
        date: DateTime<Utc>,
        notes: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<MeetingId> {
        ensure_participants(&participants)?;
        if date >= now {
            return Err(CoreError::InvalidArgument(format!(
                "meeting date {date} is not in the past"
            )));
        }
        self.insert(Meeting::Past(PastMeeting::new(
            id,
            date,
            participants,
            notes,
        )))
    }

    /// Inserts a meeting restored from a snapshot, as stored.
    ///
    /// Returns `false` and leaves the store unchanged on an id collision.
    pub(crate) fn insert_restored(&mut self, meeting: Meeting) -> bool {
        self.insert(meeting).is_ok()
    }

    fn insert(&mut self, meeting: Meeting) -> CoreResult<MeetingId> {
        let id = meeting.id();
        if self.index.contains_key(&id) {
            return Err(CoreError::InvalidArgument(format!(
                "meeting id {id} is already used"
            )));
        }
        self.index.insert(id, self.meetings.len());
        self.meetings.push(meeting);
        Ok(id)
    }

    /// Lifecycle transition: converts the meeting at `index` to past when its
    /// date is no longer strictly in the future. Returns whether it fired.
    fn settle(&mut self, index: usize, now: DateTime<Utc>) -> bool {
        let slot = &mut self.meetings[index];
        let Meeting::Future(future) = &mut *slot else {
            return false;
        };
        if future.date() > now {
            return false;
        }

        let converted = future.clone().into_past(String::new());
        debug!(
            "event=meeting_convert module=store status=ok meeting_id={} trigger=observed",
            converted.id()
        );
        *slot = Meeting::Past(converted);
        true
    }

    /// Settles every stored meeting; returns how many converted.
    pub fn settle_all(&mut self, now: DateTime<Utc>) -> usize {
        (0..self.meetings.len())
            .filter(|&index| self.settle(index, now))
            .count()
    }

    /// Returns the meeting with `id` in its lifecycle-correct state.
    pub fn by_id(&mut self, id: MeetingId, now: DateTime<Utc>) -> Option<Meeting> {
        let index = *self.index.get(&id)?;
        self.settle(index, now);
        Some(self.meetings[index].clone())
    }

    /// Returns the future meeting with `id`, or `None` if absent.
    ///
    /// # Errors
    /// - `InvalidArgument` when the meeting is dated at or before `now`.
    pub fn future_by_id(
        &mut self,
        id: MeetingId,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<FutureMeeting>> {
        let Some(&index) = self.index.get(&id) else {
            return Ok(None);
        };
        self.settle(index, now);

        match &self.meetings[index] {
            Meeting::Future(meeting) => Ok(Some(meeting.clone())),
            Meeting::Past(_) => Err(CoreError::InvalidArgument(format!(
                "meeting {id} is not a future meeting"
            ))),
        }
    }

    /// Returns the past meeting with `id`, converting it first if needed.
    ///
    /// # Errors
    /// - `InvalidArgument` when the meeting is dated strictly after `now`.
    pub fn past_by_id(
        &mut self,
        id: MeetingId,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<PastMeeting>> {
        let Some(&index) = self.index.get(&id) else {
            return Ok(None);
        };
        if self.meetings[index].is_dated_after(now) {
            return Err(CoreError::InvalidArgument(format!(
                "meeting {id} is in the future"
            )));
        }
        self.settle(index, now);
        Ok(self.meetings[index].as_past().cloned())
    }

    /// Adds notes to an elapsed meeting and returns the past record.
    ///
    /// A meeting still stored as future is converted with `text` as its
    /// notes; a past one gets `text` appended.
    ///
    /// # Errors
    /// - `InvalidArgument` when no meeting has `id`.
    /// - `FutureState` when the meeting is dated strictly after `now`.
    pub fn append_notes(
        &mut self,
        id: MeetingId,
        text: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<PastMeeting> {
        let index = *self.index.get(&id).ok_or_else(|| {
            CoreError::InvalidArgument(format!("meeting {id} does not exist"))
        })?;
        let slot = &mut self.meetings[index];
        if slot.is_dated_after(now) {
            return Err(CoreError::FutureState(id));
        }

        let updated = match &mut *slot {
            Meeting::Future(future) => {
                debug!(
                    "event=meeting_convert module=store status=ok meeting_id={} trigger=notes",
                    id
                );
                future.clone().into_past(text)
            }
            Meeting::Past(past) => {
                past.add_notes(text);
                past.clone()
            }
        };
        *slot = Meeting::Past(updated.clone());
        Ok(updated)
    }

    /// Lists meetings of one participant on one side of `now`, by date.
    ///
    /// `only_future` selects meetings dated strictly after `now`; otherwise
    /// the elapsed ones, which are converted on the way.
    pub fn list_by_contact(
        &mut self,
        handle: &ContactHandle,
        only_future: bool,
        now: DateTime<Utc>,
    ) -> Vec<Meeting> {
        let mut matched = Vec::new();
        for index in 0..self.meetings.len() {
            if !self.meetings[index].has_participant(handle) {
                continue;
            }
            self.settle(index, now);
            let meeting = &self.meetings[index];
            if meeting.is_dated_after(now) == only_future {
                matched.push(meeting.clone());
            }
        }
        sort_chronologically(&mut matched);
        matched
    }

    /// Lists every meeting on `day`, whatever its lifecycle, by timestamp.
    pub fn list_by_calendar_day(&mut self, day: NaiveDate, now: DateTime<Utc>) -> Vec<Meeting> {
        let mut matched = Vec::new();
        for index in 0..self.meetings.len() {
            if !falls_on_day(self.meetings[index].date(), day) {
                continue;
            }
            self.settle(index, now);
            matched.push(self.meetings[index].clone());
        }
        sort_chronologically(&mut matched);
        matched
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }

    /// Iterates meetings in insertion order, exactly as stored.
    pub fn iter(&self) -> impl Iterator<Item = &Meeting> {
        self.meetings.iter()
    }

    pub fn max_id(&self) -> Option<MeetingId> {
        self.index.keys().max().copied()
    }
}

fn ensure_participants(participants: &BTreeSet<ContactHandle>) -> CoreResult<()> {
    if participants.is_empty() {
        return Err(CoreError::InvalidArgument(
            "a meeting needs at least one contact".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MeetingStore;
    use crate::error::CoreError;
    use crate::model::contact::{Contact, ContactHandle};
    use crate::model::ids::{ContactId, MeetingId};
    use crate::model::meeting::Meeting;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn handle() -> ContactHandle {
        Contact::new(ContactId(1000), "Alice", "").handle()
    }

    fn with(handle: ContactHandle) -> BTreeSet<ContactHandle> {
        BTreeSet::from([handle])
    }

    #[test]
    fn schedule_future_rejects_present_and_past_dates() {
        let mut store = MeetingStore::new();
        let err = store
            .schedule_future(MeetingId(1), with(handle()), now(), now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn record_past_rejects_empty_participants_and_future_dates() {
        let mut store = MeetingStore::new();
        let earlier = now() - TimeDelta::days(1);
        assert!(store
            .record_past(MeetingId(1), BTreeSet::new(), earlier, "", now())
            .is_err());
        assert!(store
            .record_past(MeetingId(1), with(handle()), now(), "", now())
            .is_err());
    }

    #[test]
    fn elapsed_future_meeting_converts_once_on_observation() {
        let mut store = MeetingStore::new();
        let date = now() + TimeDelta::hours(1);
        store
            .schedule_future(MeetingId(1), with(handle()), date, now())
            .unwrap();

        let later = now() + TimeDelta::hours(2);
        assert!(matches!(store.by_id(MeetingId(1), now()), Some(Meeting::Future(_))));
        assert!(store.future_by_id(MeetingId(1), later).is_err());

        let past = store.past_by_id(MeetingId(1), later).unwrap().unwrap();
        assert_eq!(past.id(), MeetingId(1));
        assert_eq!(past.date(), date);
        assert_eq!(past.notes(), "");
        assert_eq!(store.settle_all(later), 0);
    }

    #[test]
    fn past_by_id_rejects_future_dates_and_misses_return_none() {
        let mut store = MeetingStore::new();
        store
            .schedule_future(MeetingId(1), with(handle()), now() + TimeDelta::days(3), now())
            .unwrap();
        assert!(store.past_by_id(MeetingId(1), now()).is_err());
        assert_eq!(store.past_by_id(MeetingId(99), now()).unwrap(), None);
        assert_eq!(store.future_by_id(MeetingId(99), now()).unwrap(), None);
    }

    #[test]
    fn append_notes_converts_then_appends() {
        let mut store = MeetingStore::new();
        store
            .schedule_future(MeetingId(1), with(handle()), now() + TimeDelta::minutes(5), now())
            .unwrap();

        let too_early = store.append_notes(MeetingId(1), "early", now()).unwrap_err();
        assert_eq!(too_early, CoreError::FutureState(MeetingId(1)));

        let later = now() + TimeDelta::hours(1);
        let converted = store.append_notes(MeetingId(1), "done", later).unwrap();
        assert_eq!(converted.notes(), "done");
        let appended = store.append_notes(MeetingId(1), "again", later).unwrap();
        assert_eq!(appended.notes(), "done again");

        let missing = store.append_notes(MeetingId(2), "x", later).unwrap_err();
        assert!(matches!(missing, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn list_by_contact_splits_on_now_and_sorts() {
        let mut store = MeetingStore::new();
        let alice = handle();
        let bob = Contact::new(ContactId(1001), "Bob", "").handle();
        store
            .schedule_future(MeetingId(1), with(alice), now() + TimeDelta::days(2), now())
            .unwrap();
        store
            .schedule_future(MeetingId(2), with(alice), now() + TimeDelta::days(1), now())
            .unwrap();
        store
            .record_past(MeetingId(3), with(alice), now() - TimeDelta::days(1), "", now())
            .unwrap();
        store
            .schedule_future(MeetingId(4), with(bob), now() + TimeDelta::days(1), now())
            .unwrap();

        let future: Vec<MeetingId> = store
            .list_by_contact(&alice, true, now())
            .iter()
            .map(Meeting::id)
            .collect();
        assert_eq!(future, vec![MeetingId(2), MeetingId(1)]);

        let past = store.list_by_contact(&alice, false, now() + TimeDelta::days(1));
        let ids: Vec<MeetingId> = past.iter().map(Meeting::id).collect();
        assert_eq!(ids, vec![MeetingId(3), MeetingId(2)]);
        assert!(past.iter().all(Meeting::is_past));
    }
}
