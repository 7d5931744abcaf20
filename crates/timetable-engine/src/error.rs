//! Error types for timetable-engine operations.

use thiserror::Error;

use crate::conflict::ConflictReport;

#[derive(Error, Debug)]
pub enum TimetableError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid day of week: {0} (expected 1 = Monday .. 6 = Saturday)")]
    InvalidDay(u8),

    #[error("Invalid day of week: '{0}'")]
    UnknownDay(String),

    #[error("Invalid slot: {}", .0.join("; "))]
    Structural(Vec<String>),

    #[error("Scheduling conflict: {}", .0.summary())]
    Conflict(ConflictReport),

    #[error("Slot not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl TimetableError {
    /// The conflict report carried by a rejection, if this is one.
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            TimetableError::Conflict(report) => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
