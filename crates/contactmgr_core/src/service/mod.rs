//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry and store calls into the public contract.
//! - Keep callers decoupled from storage details.

pub mod contact_manager;
