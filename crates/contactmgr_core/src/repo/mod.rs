//! In-memory stores behind the contact manager.
//!
//! # Responsibility
//! - Own the canonical contact set and meeting collection.
//! - Keep lookup, ordering and lifecycle rules out of the orchestration layer.
//!
//! # Invariants
//! - Stores never read the clock; callers pass `now` in.
//! - Stores do not know about each other; cross-entity checks live in
//!   `service`.

pub mod contact_registry;
pub mod meeting_store;
