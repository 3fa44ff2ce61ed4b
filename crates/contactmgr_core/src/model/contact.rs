//! Contact domain model.
//!
//! # Responsibility
//! - Hold the immutable identity of a person (id, name, instance key).
//! - Carry free-text notes that only grow by appending.
//!
//! # Invariants
//! - `instance` is generated once per constructed contact; two contacts with
//!   equal id/name/notes but different instances are different contacts.
//! - Registry membership is decided by `ContactHandle`, never by field
//!   equality.

use crate::model::append_note;
use crate::model::ids::ContactId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque reference to one contact instance.
///
/// Meetings hold handles instead of copies so contact notes stay owned by the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContactHandle {
    pub id: ContactId,
    pub instance: Uuid,
}

/// A named person record with notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    id: ContactId,
    name: String,
    notes: String,
    instance: Uuid,
}

impl Contact {
    /// Creates a contact with a fresh instance key.
    ///
    /// Building a contact does not register it; only contacts returned by a
    /// manager are accepted by its operations.
    pub fn new(id: ContactId, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            notes: notes.into(),
            instance: Uuid::new_v4(),
        }
    }

    /// Rebuilds a stored contact with its original instance key.
    pub(crate) fn restore(id: ContactId, name: String, notes: String, instance: Uuid) -> Self {
        Self {
            id,
            name,
            notes,
            instance,
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn instance(&self) -> Uuid {
        self.instance
    }

    pub fn handle(&self) -> ContactHandle {
        ContactHandle {
            id: self.id,
            instance: self.instance,
        }
    }

    /// Appends notes; the first note replaces the empty default.
    pub fn add_notes(&mut self, text: &str) {
        append_note(&mut self.notes, text);
    }
}

#[cfg(test)]
mod tests {
    use super::Contact;
    use crate::model::ids::ContactId;

    #[test]
    fn same_fields_different_instances_have_different_handles() {
        let first = Contact::new(ContactId(1000), "Alice", "");
        let second = Contact::new(ContactId(1000), "Alice", "");
        assert_ne!(first.handle(), second.handle());
        assert_ne!(first, second);
    }

    #[test]
    fn clone_keeps_handle() {
        let contact = Contact::new(ContactId(1001), "Bob", "met at work");
        assert_eq!(contact.clone().handle(), contact.handle());
    }

    #[test]
    fn add_notes_joins_with_space() {
        let mut contact = Contact::new(ContactId(1002), "Carol", "");
        contact.add_notes("likes tea");
        contact.add_notes("allergic to nuts");
        assert_eq!(contact.notes(), "likes tea allergic to nuts");
    }
}
