//! # timetable-engine
//!
//! Conflict-checked lecture scheduling for university timetables.
//!
//! A lecture slot is a weekly recurring session: a unit, a teacher, a weekday,
//! a wall-clock range and a room (or online). The engine guarantees that no
//! teacher and no physical room is double-booked, re-checking on every create,
//! update and drag-and-drop move.
//!
//! ## Modules
//!
//! - [`interval`] — Weekday + wall-clock ranges, overlap test, end-time arithmetic
//! - [`slot`] — Lecture slot data model and partial updates
//! - [`repository`] — Storage trait and in-memory implementation
//! - [`conflict`] — Teacher/venue conflict evaluation and timetable audit
//! - [`schedule`] — Create/update/move/delete operations gated on the conflict check
//! - [`error`] — Error types

pub mod conflict;
pub mod error;
pub mod interval;
pub mod repository;
pub mod schedule;
pub mod slot;

pub use conflict::{
    detect_conflicts, evaluate, find_slot_conflicts, ConflictDetail, ConflictKind,
    ConflictReport, SlotConflict, TeacherScope,
};
pub use error::TimetableError;
pub use interval::{end_time, overlaps, DayOfWeek, TimeRange, WallTime};
pub use repository::{InMemoryRepository, LectureSlotRepository};
pub use schedule::{Scheduler, SchedulerOptions};
pub use slot::{Frequency, LectureSlot, LectureType, SlotDraft, SlotPatch, Venue};
