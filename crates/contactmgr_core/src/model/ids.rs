//! Identifier types and the per-manager id issuer.
//!
//! # Invariants
//! - Contact ids start at 1000 to keep a four-digit convention.
//! - Meeting ids start at 1.
//! - Each sequence is strictly increasing; the two never interact.
//! - A sequence that reaches `u32::MAX` is exhausted; it never wraps.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const CONTACT_ID_BASE: u32 = 1000;
const MEETING_ID_BASE: u32 = 1;

/// Stable identifier of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub u32);

/// Stable identifier of a meeting, kept across the future-to-past conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(pub u32);

impl Display for ContactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for MeetingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues unique ids for one manager instance.
///
/// Never share an issuer between managers: a contact built elsewhere may
/// legitimately carry a colliding id and must still be rejected as unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdIssuer {
    next_contact: Option<u32>,
    next_meeting: Option<u32>,
}

impl Default for IdIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl IdIssuer {
    pub fn new() -> Self {
        Self {
            next_contact: Some(CONTACT_ID_BASE),
            next_meeting: Some(MEETING_ID_BASE),
        }
    }

    /// Creates an issuer whose next ids are strictly above the given maxima.
    ///
    /// Used after a snapshot import. Sequences never drop below their base.
    /// Returns `None` when a maximum is `u32::MAX` and has no successor.
    pub fn resume_after(
        max_contact: Option<ContactId>,
        max_meeting: Option<MeetingId>,
    ) -> Option<Self> {
        let next_contact = match max_contact {
            Some(id) => id.0.checked_add(1)?.max(CONTACT_ID_BASE),
            None => CONTACT_ID_BASE,
        };
        let next_meeting = match max_meeting {
            Some(id) => id.0.checked_add(1)?.max(MEETING_ID_BASE),
            None => MEETING_ID_BASE,
        };
        Some(Self {
            next_contact: Some(next_contact),
            next_meeting: Some(next_meeting),
        })
    }

    /// # Errors
    /// - `IdsExhausted` once `u32::MAX` has been issued.
    pub fn next_contact_id(&mut self) -> CoreResult<ContactId> {
        issue(&mut self.next_contact, "contact").map(ContactId)
    }

    /// # Errors
    /// - `IdsExhausted` once `u32::MAX` has been issued.
    pub fn next_meeting_id(&mut self) -> CoreResult<MeetingId> {
        issue(&mut self.next_meeting, "meeting").map(MeetingId)
    }
}

fn issue(next: &mut Option<u32>, kind: &'static str) -> CoreResult<u32> {
    let id = next.ok_or(CoreError::IdsExhausted(kind))?;
    *next = id.checked_add(1);
    Ok(id)
}
