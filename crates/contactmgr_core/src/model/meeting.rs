//! Meeting domain model.
//!
//! # Responsibility
//! - Define the two lifecycle variants (`FutureMeeting`, `PastMeeting`) and
//!   the `Meeting` record that is always exactly one of them.
//! - Provide the shared date helpers used for lifecycle checks and ordering.
//!
//! # Invariants
//! - `id`, `date` and `participants` are fixed at construction.
//! - Future to past is the only transition; it keeps id, date, participants.
//! - A future meeting carries no notes.

use crate::model::append_note;
use crate::model::contact::ContactHandle;
use crate::model::ids::MeetingId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A scheduled meeting that has not been observed as past yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureMeeting {
    id: MeetingId,
    date: DateTime<Utc>,
    participants: BTreeSet<ContactHandle>,
}

impl FutureMeeting {
    pub(crate) fn new(
        id: MeetingId,
        date: DateTime<Utc>,
        participants: BTreeSet<ContactHandle>,
    ) -> Self {
        Self {
            id,
            date,
            participants,
        }
    }

    pub fn id(&self) -> MeetingId {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn participants(&self) -> &BTreeSet<ContactHandle> {
        &self.participants
    }

    /// Retires this record and produces its past counterpart.
    pub(crate) fn into_past(self, notes: impl Into<String>) -> PastMeeting {
        PastMeeting {
            id: self.id,
            date: self.date,
            participants: self.participants,
            notes: notes.into(),
        }
    }
}

/// A meeting whose date has elapsed, with appendable notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastMeeting {
    id: MeetingId,
    date: DateTime<Utc>,
    participants: BTreeSet<ContactHandle>,
    notes: String,
}

impl PastMeeting {
    pub(crate) fn new(
        id: MeetingId,
        date: DateTime<Utc>,
        participants: BTreeSet<ContactHandle>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            participants,
            notes: notes.into(),
        }
    }

    pub fn id(&self) -> MeetingId {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn participants(&self) -> &BTreeSet<ContactHandle> {
        &self.participants
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub(crate) fn add_notes(&mut self, text: &str) {
        append_note(&mut self.notes, text);
    }
}

/// Stored meeting in exactly one lifecycle state.
///
/// Serialized with a `state` tag (`future` | `past`) so snapshots keep the
/// lifecycle distinction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Meeting {
    Future(FutureMeeting),
    Past(PastMeeting),
}

impl Meeting {
    pub fn id(&self) -> MeetingId {
        match self {
            Self::Future(meeting) => meeting.id(),
            Self::Past(meeting) => meeting.id(),
        }
    }

    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Self::Future(meeting) => meeting.date(),
            Self::Past(meeting) => meeting.date(),
        }
    }

    pub fn participants(&self) -> &BTreeSet<ContactHandle> {
        match self {
            Self::Future(meeting) => meeting.participants(),
            Self::Past(meeting) => meeting.participants(),
        }
    }

    /// Returns notes for past meetings, `None` for future ones.
    pub fn notes(&self) -> Option<&str> {
        match self {
            Self::Future(_) => None,
            Self::Past(meeting) => Some(meeting.notes()),
        }
    }

    /// Whether the record is stored as past (not whether its date elapsed).
    pub fn is_past(&self) -> bool {
        matches!(self, Self::Past(_))
    }

    pub fn has_participant(&self, handle: &ContactHandle) -> bool {
        self.participants().contains(handle)
    }

    /// Whether the date is strictly after `now`.
    pub fn is_dated_after(&self, now: DateTime<Utc>) -> bool {
        self.date() > now
    }

    pub fn as_past(&self) -> Option<&PastMeeting> {
        match self {
            Self::Past(meeting) => Some(meeting),
            Self::Future(_) => None,
        }
    }

    pub fn into_past_meeting(self) -> Option<PastMeeting> {
        match self {
            Self::Past(meeting) => Some(meeting),
            Self::Future(_) => None,
        }
    }
}

/// Sorts meetings ascending by date; equal timestamps keep their order.
pub fn sort_chronologically(meetings: &mut [Meeting]) {
    meetings.sort_by_key(Meeting::date);
}

/// Whether `date` falls on `day` (UTC), ignoring time of day.
pub fn falls_on_day(date: DateTime<Utc>, day: NaiveDate) -> bool {
    date.date_naive() == day
}

#[cfg(test)]
mod tests {
    use super::{falls_on_day, sort_chronologically, FutureMeeting, Meeting};
    use crate::model::contact::Contact;
    use crate::model::ids::{ContactId, MeetingId};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn participants() -> BTreeSet<crate::model::contact::ContactHandle> {
        BTreeSet::from([Contact::new(ContactId(1000), "Alice", "").handle()])
    }

    fn future(id: u32, hour: u32) -> Meeting {
        let date = Utc.with_ymd_and_hms(2030, 5, 1, hour, 0, 0).unwrap();
        Meeting::Future(FutureMeeting::new(MeetingId(id), date, participants()))
    }

    #[test]
    fn conversion_keeps_identity_fields() {
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 9, 30, 0).unwrap();
        let future = FutureMeeting::new(MeetingId(4), date, participants());
        let past = future.clone().into_past("");

        assert_eq!(past.id(), future.id());
        assert_eq!(past.date(), future.date());
        assert_eq!(past.participants(), future.participants());
        assert_eq!(past.notes(), "");
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let mut meetings = vec![future(1, 15), future(2, 9), future(3, 15), future(4, 9)];
        sort_chronologically(&mut meetings);
        let ids: Vec<u32> = meetings.iter().map(|meeting| meeting.id().0).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn falls_on_day_ignores_time_of_day() {
        let day = NaiveDate::from_ymd_opt(2030, 5, 1).unwrap();
        let early = Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2030, 5, 1, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2030, 5, 2, 0, 0, 0).unwrap();

        assert!(falls_on_day(early, day));
        assert!(falls_on_day(late, day));
        assert!(!falls_on_day(next, day));
    }

    #[test]
    fn serialization_tags_lifecycle_state() {
        let json = serde_json::to_value(future(9, 10)).unwrap();
        assert_eq!(json["state"], "future");
        assert_eq!(json["id"], 9);
        assert!(json.get("notes").is_none());
    }
}
