//! Teacher and venue conflict detection for weekly lecture slots.
//!
//! Two rules, both evaluated per weekday with half-open overlap:
//!
//! - **Teacher conflict**: the same teacher is booked into overlapping slots.
//!   Scoped to one timetable by default (see [`TeacherScope`]).
//! - **Venue conflict**: the same physical room (building + room) is booked
//!   into overlapping slots, across all timetables. Online slots never take
//!   part in venue conflicts.
//!
//! Slot frequency is ignored: a biweekly slot occupies its weekday every week.
//!
//! # Functions
//!
//! - [`evaluate`] — Check a candidate against a repository (read-only)
//! - [`detect_conflicts`] — Check a candidate against an already-fetched set of slots
//! - [`find_slot_conflicts`] — Every conflicting pair within a set of stored slots

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::interval::TimeRange;
use crate::repository::LectureSlotRepository;
use crate::slot::{LectureSlot, SlotDraft};

pub const TEACHER_CONFLICT_MESSAGE: &str = "Teacher already has a lecture at this time";
pub const VENUE_CONFLICT_MESSAGE: &str = "Venue is already booked at this time";

/// Which resource two slots contend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Teacher,
    Venue,
}

impl ConflictKind {
    pub fn message(self) -> &'static str {
        match self {
            ConflictKind::Teacher => TEACHER_CONFLICT_MESSAGE,
            ConflictKind::Venue => VENUE_CONFLICT_MESSAGE,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Teacher => f.write_str("teacher"),
            ConflictKind::Venue => f.write_str("venue"),
        }
    }
}

/// How far teacher conflicts reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherScope {
    /// Only slots in the candidate's own timetable.
    #[default]
    Timetable,
    /// Every slot the teacher holds, in any timetable.
    Global,
}

/// One existing slot that blocks the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetail {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub message: String,
    pub conflicting_slot_id: String,
}

impl ConflictDetail {
    fn new(kind: ConflictKind, slot: &LectureSlot) -> Self {
        ConflictDetail {
            kind,
            message: kind.message().to_string(),
            conflicting_slot_id: slot.id.clone(),
        }
    }
}

/// The outcome of checking one candidate slot.
///
/// `teacher` and `venue` are true iff `details` holds at least one entry of
/// that kind. An empty report means the candidate may be committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub teacher: bool,
    pub venue: bool,
    pub details: Vec<ConflictDetail>,
}

impl ConflictReport {
    pub fn from_details(details: Vec<ConflictDetail>) -> Self {
        ConflictReport {
            teacher: details.iter().any(|d| d.kind == ConflictKind::Teacher),
            venue: details.iter().any(|d| d.kind == ConflictKind::Venue),
            details,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.details.is_empty()
    }

    /// Ids of the slots blocking the candidate on `kind`, in report order.
    pub fn conflicting_ids(&self, kind: ConflictKind) -> Vec<&str> {
        self.details
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.conflicting_slot_id.as_str())
            .collect()
    }

    /// One-line description, e.g. `"teacher (slot-1), venue (slot-4)"`.
    pub fn summary(&self) -> String {
        if self.is_clear() {
            return "no conflicts".to_string();
        }
        self.details
            .iter()
            .map(|d| format!("{} ({})", d.kind, d.conflicting_slot_id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A pair of stored slots that conflict with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// The slot starting first (ties broken by id).
    pub first_slot_id: String,
    pub second_slot_id: String,
}

// ── Rules ───────────────────────────────────────────────────────────────────

/// The range a slot occupies. Built without validation so that a malformed
/// stored range (end <= start) simply never overlaps anything.
fn occupied(draft: &SlotDraft) -> TimeRange {
    TimeRange {
        day: draft.day_of_week,
        start: draft.start_time,
        end: draft.end_time,
    }
}

fn shares_teacher(a: &SlotDraft, b: &SlotDraft, scope: TeacherScope) -> bool {
    a.teacher_id == b.teacher_id
        && match scope {
            TeacherScope::Timetable => a.timetable_id == b.timetable_id,
            TeacherScope::Global => true,
        }
}

fn shares_room(a: &SlotDraft, b: &SlotDraft) -> bool {
    match (a.physical_venue(), b.physical_venue()) {
        (Some(x), Some(y)) => x.same_room(y),
        _ => false,
    }
}

fn clashing<'a>(
    candidate: &SlotDraft,
    existing: impl IntoIterator<Item = &'a LectureSlot>,
    exclude_id: Option<&str>,
    kind: ConflictKind,
    rule: impl Fn(&SlotDraft) -> bool,
) -> Vec<ConflictDetail> {
    let range = occupied(candidate);
    let mut hits: Vec<&LectureSlot> = existing
        .into_iter()
        .filter(|s| exclude_id != Some(s.id.as_str()))
        .filter(|s| rule(&s.details))
        .filter(|s| range.overlaps(&occupied(&s.details)))
        .collect();
    hits.sort_by(|a, b| {
        a.details
            .start_time
            .cmp(&b.details.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    hits.dedup_by(|a, b| a.id == b.id);
    hits.into_iter().map(|s| ConflictDetail::new(kind, s)).collect()
}

fn build_report(
    candidate: &SlotDraft,
    teacher_set: &[LectureSlot],
    venue_set: &[LectureSlot],
    exclude_id: Option<&str>,
    scope: TeacherScope,
) -> ConflictReport {
    let mut details = clashing(
        candidate,
        teacher_set,
        exclude_id,
        ConflictKind::Teacher,
        |other| shares_teacher(candidate, other, scope),
    );
    if candidate.physical_venue().is_some() {
        details.extend(clashing(
            candidate,
            venue_set,
            exclude_id,
            ConflictKind::Venue,
            |other| shares_room(candidate, other),
        ));
    }
    ConflictReport::from_details(details)
}

// ── evaluate ────────────────────────────────────────────────────────────────

/// Check whether committing `candidate` would double-book its teacher or room.
///
/// Pulls the teacher's slots and the room's slots for the candidate's weekday
/// from `repository` and reports every overlapping one. Pass the slot's own id
/// as `exclude_id` when re-checking a stored slot that is being edited or
/// moved; otherwise it conflicts with itself.
///
/// Read-only: nothing is written, so this is safe to call speculatively.
///
/// # Errors
///
/// Returns [`crate::TimetableError::InvalidTime`] if the candidate's end time
/// is not after its start time, or any error the repository reports.
pub fn evaluate<R>(
    repository: &R,
    candidate: &SlotDraft,
    exclude_id: Option<&str>,
    scope: TeacherScope,
) -> Result<ConflictReport>
where
    R: LectureSlotRepository + ?Sized,
{
    let range = candidate.time_range()?;

    let timetable_scope = match scope {
        TeacherScope::Timetable => Some(candidate.timetable_id.as_str()),
        TeacherScope::Global => None,
    };
    let teacher_set =
        repository.find_by_teacher_and_day(&candidate.teacher_id, range.day, timetable_scope)?;

    let venue_set = match candidate.physical_venue() {
        Some(venue) => repository.find_by_venue_and_day(&venue.building, &venue.room, range.day)?,
        None => Vec::new(),
    };

    let report = build_report(candidate, &teacher_set, &venue_set, exclude_id, scope);
    debug!(
        teacher = %candidate.teacher_id,
        range = %range,
        exclude = exclude_id.unwrap_or("-"),
        teacher_candidates = teacher_set.len(),
        venue_candidates = venue_set.len(),
        conflicts = report.details.len(),
        "evaluated lecture slot"
    );
    Ok(report)
}

/// Check `candidate` against an already-fetched set of slots.
///
/// Same rules as [`evaluate`]; `existing` may hold unrelated slots, which
/// are filtered out.
///
/// # Errors
///
/// Returns [`crate::TimetableError::InvalidTime`] if the candidate's end time
/// is not after its start time.
pub fn detect_conflicts(
    candidate: &SlotDraft,
    existing: &[LectureSlot],
    exclude_id: Option<&str>,
    scope: TeacherScope,
) -> Result<ConflictReport> {
    candidate.time_range()?;
    Ok(build_report(candidate, existing, existing, exclude_id, scope))
}

// ── find_slot_conflicts ─────────────────────────────────────────────────────

/// Every pair of slots in `slots` that conflict with each other.
///
/// Used to audit stored data, e.g. double-bookings that slipped in through
/// concurrent writers. A pair sharing both teacher and room is reported twice,
/// once per kind. Output is ordered by day, then start time.
pub fn find_slot_conflicts(slots: &[LectureSlot], scope: TeacherScope) -> Vec<SlotConflict> {
    let mut ordered: Vec<&LectureSlot> = slots.iter().collect();
    ordered.sort_by(|a, b| {
        (a.details.day_of_week, a.details.start_time, &a.id).cmp(&(
            b.details.day_of_week,
            b.details.start_time,
            &b.id,
        ))
    });

    let mut conflicts = Vec::new();
    for (i, first) in ordered.iter().enumerate() {
        let first_range = occupied(&first.details);
        // Sorted by (day, start): once a later slot is on another day or
        // starts at or after `first` ends, no further slot can overlap it.
        for second in &ordered[i + 1..] {
            let second_range = occupied(&second.details);
            if second_range.day != first_range.day || second_range.start >= first_range.end {
                break;
            }
            if !first_range.overlaps(&second_range) {
                continue;
            }
            if shares_teacher(&first.details, &second.details, scope) {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::Teacher,
                    first_slot_id: first.id.clone(),
                    second_slot_id: second.id.clone(),
                });
            }
            if shares_room(&first.details, &second.details) {
                conflicts.push(SlotConflict {
                    kind: ConflictKind::Venue,
                    first_slot_id: first.id.clone(),
                    second_slot_id: second.id.clone(),
                });
            }
        }
    }
    conflicts
}
