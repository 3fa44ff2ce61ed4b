//! Domain error shared by registry, store and manager.
//!
//! Errors are raised at the point of violation and never retried. Lookups
//! that simply find nothing return `None` or an empty list instead.

use crate::model::ids::MeetingId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A required value was not supplied (e.g. an empty id list).
    MissingArgument(&'static str),
    /// A supplied value violates a precondition.
    InvalidArgument(String),
    /// A past-only operation hit a meeting whose date has not elapsed.
    FutureState(MeetingId),
    /// An id sequence has issued its last value.
    IdsExhausted(&'static str),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(what) => write!(f, "missing argument: {what}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::FutureState(id) => write!(f, "meeting {id} is in the future"),
            Self::IdsExhausted(kind) => write!(f, "no {kind} ids left to issue"),
        }
    }
}

impl Error for CoreError {}
