//! Canonical contact set.
//!
//! # Responsibility
//! - Own every registered `Contact` and answer "does this contact exist".
//! - Provide id and name lookups over the registered set.
//!
//! # Invariants
//! - At most one contact per id.
//! - Membership compares the full handle, so an outside contact that reuses a
//!   registered id is not a member.
//! - Id lookups are all-or-nothing.

use crate::error::{CoreError, CoreResult};
use crate::model::contact::{Contact, ContactHandle};
use crate::model::ids::ContactId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ContactRegistry {
    contacts: BTreeMap<ContactId, Contact>,
}

impl ContactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new contact under a freshly issued id and returns it.
    pub fn add(
        &mut self,
        id: ContactId,
        name: impl Into<String>,
        notes: impl Into<String>,
    ) -> CoreResult<Contact> {
        if self.contacts.contains_key(&id) {
            return Err(CoreError::InvalidArgument(format!(
                "contact id {id} is already registered"
            )));
        }

        let contact = Contact::new(id, name, notes);
        self.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    /// Inserts a contact restored from a snapshot.
    ///
    /// Returns `false` and leaves the registry unchanged on an id collision.
    pub(crate) fn insert_restored(&mut self, contact: Contact) -> bool {
        if self.contacts.contains_key(&contact.id()) {
            return false;
        }
        self.contacts.insert(contact.id(), contact);
        true
    }

    /// Returns the contacts for `ids`, in request order without duplicates.
    ///
    /// # Errors
    /// - `MissingArgument` when `ids` is empty.
    /// - `InvalidArgument` when any id is unknown; nothing is returned then.
    pub fn find_by_ids(&self, ids: &[ContactId]) -> CoreResult<Vec<Contact>> {
        if ids.is_empty() {
            return Err(CoreError::MissingArgument("contact ids"));
        }

        let mut found: Vec<Contact> = Vec::with_capacity(ids.len());
        for id in ids {
            let contact = self.contacts.get(id).ok_or_else(|| {
                CoreError::InvalidArgument(format!("{id} does not correspond to a real contact"))
            })?;
            if !found.iter().any(|existing| existing.id() == *id) {
                found.push(contact.clone());
            }
        }
        Ok(found)
    }

    /// Returns contacts whose name contains `text` (case-sensitive).
    pub fn find_by_name_substring(&self, text: &str) -> CoreResult<Vec<Contact>> {
        if text.is_empty() {
            return Err(CoreError::InvalidArgument(
                "name search text cannot be empty".to_string(),
            ));
        }

        Ok(self
            .contacts
            .values()
            .filter(|contact| contact.name().contains(text))
            .cloned()
            .collect())
    }

    pub fn is_member(&self, handle: &ContactHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Returns the registered contact for `handle` when it is a member.
    pub fn resolve(&self, handle: &ContactHandle) -> Option<&Contact> {
        self.contacts
            .get(&handle.id)
            .filter(|contact| contact.instance() == handle.instance)
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.get(&id)
    }

    /// Appends notes to a registered contact and returns the updated record.
    pub fn append_notes(&mut self, handle: &ContactHandle, text: &str) -> CoreResult<Contact> {
        let contact = self
            .contacts
            .get_mut(&handle.id)
            .filter(|contact| contact.instance() == handle.instance)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!("contact {} is not registered", handle.id))
            })?;
        contact.add_notes(text);
        Ok(contact.clone())
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Iterates contacts in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn max_id(&self) -> Option<ContactId> {
        self.contacts.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::ContactRegistry;
    use crate::error::CoreError;
    use crate::model::contact::Contact;
    use crate::model::ids::ContactId;

    fn registry_with(names: &[&str]) -> ContactRegistry {
        let mut registry = ContactRegistry::new();
        for (offset, name) in names.iter().enumerate() {
            registry
                .add(ContactId(1000 + offset as u32), *name, "")
                .unwrap();
        }
        registry
    }

    #[test]
    fn find_by_ids_is_all_or_nothing() {
        let registry = registry_with(&["Alice", "Bob"]);
        let err = registry
            .find_by_ids(&[ContactId(1000), ContactId(4242)])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(message) if message.contains("4242")));
    }

    #[test]
    fn find_by_ids_collapses_duplicates_in_request_order() {
        let registry = registry_with(&["Alice", "Bob"]);
        let found = registry
            .find_by_ids(&[ContactId(1001), ContactId(1000), ContactId(1001)])
            .unwrap();
        let names: Vec<&str> = found.iter().map(Contact::name).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn find_by_ids_rejects_empty_request() {
        let registry = registry_with(&["Alice"]);
        assert_eq!(
            registry.find_by_ids(&[]).unwrap_err(),
            CoreError::MissingArgument("contact ids")
        );
    }

    #[test]
    fn name_search_is_case_sensitive_substring() {
        let registry = registry_with(&["Alice Smith", "alice jones", "Bob"]);
        let found = registry.find_by_name_substring("Ali").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Alice Smith");
        assert!(registry.find_by_name_substring("zzz").unwrap().is_empty());
    }

    #[test]
    fn name_search_rejects_empty_text() {
        let registry = registry_with(&["Alice"]);
        assert!(matches!(
            registry.find_by_name_substring(""),
            Err(CoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn colliding_outside_contact_is_not_a_member() {
        let mut registry = ContactRegistry::new();
        let stored = registry.add(ContactId(1000), "Alice", "").unwrap();
        let impostor = Contact::new(ContactId(1000), "Alice", "");

        assert!(registry.is_member(&stored.handle()));
        assert!(!registry.is_member(&impostor.handle()));
        assert!(registry.append_notes(&impostor.handle(), "x").is_err());
        assert_eq!(registry.get(ContactId(1000)).unwrap().notes(), "");
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut registry = registry_with(&["Alice"]);
        assert!(registry.add(ContactId(1000), "Again", "").is_err());
        assert_eq!(registry.len(), 1);
    }
}
