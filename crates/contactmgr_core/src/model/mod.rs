//! Domain model for contacts and meetings.
//!
//! # Responsibility
//! - Define the canonical records shared by registry, store and snapshots.
//! - Keep identity (ids, handles) separate from mutable free-text notes.
//!
//! # Invariants
//! - Ids are issued once and never reused within a manager.
//! - Contact identity is the `(id, instance)` handle, never field equality.
//! - Meeting date and participants never change after creation.

pub mod contact;
pub mod ids;
pub mod meeting;

/// Appends one note fragment using the register's joining rule.
///
/// The first fragment replaces an empty string; later fragments are joined
/// with a single space.
pub(crate) fn append_note(target: &mut String, text: &str) {
    if target.is_empty() {
        target.push_str(text);
    } else {
        target.push(' ');
        target.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::append_note;

    #[test]
    fn first_note_replaces_empty_string() {
        let mut notes = String::new();
        append_note(&mut notes, "hello");
        assert_eq!(notes, "hello");
    }

    #[test]
    fn later_notes_are_space_joined() {
        let mut notes = "hello".to_string();
        append_note(&mut notes, "world");
        assert_eq!(notes, "hello world");
    }
}
