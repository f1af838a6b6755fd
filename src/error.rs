//! Error types for the scheduling engine.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur in scheduling operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unparseable time label: '{0}'")]
    UnparseableTimeLabel(String),

    #[error("Time out of range: {hour}:{minute:02}")]
    InvalidTimeValue { hour: u32, minute: u32 },

    #[error("Slot is blocked for '{resource}' at {start}")]
    ConflictRejected { resource: String, start: DateTime<Utc> },

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Appointment end must be after its start")]
    InvalidInterval,

    #[error("Recurrence rule error: {0}")]
    Recurrence(String),

    #[error("Recurrence expansion produced no occurrences")]
    EmptySeries,

    #[error("Invalid calendar date or time component")]
    InvalidDate,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors from the remote persistence collaborator.
///
/// The engine is local-first: most of these are absorbed rather than
/// propagated (see the reconciler's sync worker).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote store has no record with this id. For updates and deletes
    /// this is treated as success-equivalent: already gone remotely.
    #[error("not found remotely")]
    NotFound,

    /// Network-level failure. Local state stands.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote rejected the payload with an actionable message.
    #[error("validation rejected: {0}")]
    Validation(String),
}

/// Result type alias for scheduling operations.
pub type EngineResult<T> = Result<T, EngineError>;
