//! Conflict-checked scheduling operations.
//!
//! Every write goes through the same linear flow:
//!
//! ```text
//! Requested → Validating → Checking → Committed | Rejected
//! ```
//!
//! Validation failures surface as [`TimetableError::Structural`], conflicts
//! as [`TimetableError::Conflict`] carrying the full [`ConflictReport`]. A
//! rejected request writes nothing. Conflicts are hard-blocking; there is no
//! override.
//!
//! The scheduler holds no locks: two processes sharing a store can both pass
//! the check and then both write. [`Scheduler::audit`] finds the results.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::conflict::{self, ConflictReport, SlotConflict, TeacherScope};
use crate::error::{Result, TimetableError};
use crate::interval::{end_time, DayOfWeek, TimeRange, WallTime};
use crate::repository::LectureSlotRepository;
use crate::slot::{LectureSlot, SlotDraft, SlotPatch};

/// Options for a [`Scheduler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerOptions {
    /// How far teacher conflicts reach. Venue conflicts are always global.
    pub teacher_scope: TeacherScope,
    /// Earliest start time allowed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opens_at: Option<WallTime>,
    /// Latest end time allowed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<WallTime>,
}

/// Create, update and move lecture slots without double-booking a teacher or room.
#[derive(Debug, Clone)]
pub struct Scheduler<R> {
    repository: R,
    options: SchedulerOptions,
}

impl<R: LectureSlotRepository> Scheduler<R> {
    pub fn new(repository: R) -> Self {
        Self::with_options(repository, SchedulerOptions::default())
    }

    pub fn with_options(repository: R, options: SchedulerOptions) -> Self {
        Scheduler {
            repository,
            options,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Check `candidate` against the stored slots without writing anything.
    ///
    /// Pass the slot's own id as `exclude_id` when re-checking a stored slot.
    pub fn evaluate(&self, candidate: &SlotDraft, exclude_id: Option<&str>) -> Result<ConflictReport> {
        conflict::evaluate(
            &self.repository,
            candidate,
            exclude_id,
            self.options.teacher_scope,
        )
    }

    /// Schedule a new slot.
    ///
    /// # Errors
    ///
    /// [`TimetableError::Structural`] if the draft is malformed,
    /// [`TimetableError::Conflict`] if it overlaps an existing slot's teacher
    /// or room.
    pub fn create(&mut self, candidate: SlotDraft) -> Result<LectureSlot> {
        self.validate(&candidate)?;
        let report = self.evaluate(&candidate, None)?;
        if !report.is_clear() {
            warn!(
                teacher = %candidate.teacher_id,
                conflicts = %report.summary(),
                "rejected new lecture slot"
            );
            return Err(TimetableError::Conflict(report));
        }

        let slot = self.repository.save(candidate)?;
        info!(id = %slot.id, timetable = %slot.details.timetable_id, "scheduled lecture slot");
        Ok(slot)
    }

    /// Apply `patch` to a stored slot, re-checking the merged result against
    /// every other slot. On any error the stored slot is unchanged.
    ///
    /// # Errors
    ///
    /// [`TimetableError::NotFound`] if `id` is not stored, otherwise as
    /// [`Scheduler::create`].
    pub fn update(&mut self, id: &str, patch: &SlotPatch) -> Result<LectureSlot> {
        let stored = self.load(id)?;
        let merged = patch.apply_to(&stored.details);
        self.commit(id, &merged, patch)
    }

    /// Drag-and-drop reschedule: move a stored slot to `day` starting at
    /// `start`, keeping its duration.
    ///
    /// # Errors
    ///
    /// [`TimetableError::InvalidTime`] if the moved slot would cross midnight,
    /// otherwise as [`Scheduler::update`].
    pub fn move_slot(&mut self, id: &str, day: DayOfWeek, start: WallTime) -> Result<LectureSlot> {
        let stored = self.load(id)?;
        let patch = self.move_patch(&stored, day, start)?;
        let merged = patch.apply_to(&stored.details);
        self.commit(id, &merged, &patch)
    }

    /// What [`Scheduler::move_slot`] would report, without moving anything.
    /// Meant to be called repeatedly while a slot is being dragged.
    pub fn preview_move(&self, id: &str, day: DayOfWeek, start: WallTime) -> Result<ConflictReport> {
        let stored = self.load(id)?;
        let patch = self.move_patch(&stored, day, start)?;
        let merged = patch.apply_to(&stored.details);
        self.validate(&merged)?;
        self.evaluate(&merged, Some(id))
    }

    /// Remove a stored slot. Dependent-record checks (attendance and the like)
    /// belong to the caller's persistence layer.
    pub fn delete(&mut self, id: &str) -> Result<LectureSlot> {
        let removed = self.repository.remove(id)?;
        info!(id = %removed.id, "deleted lecture slot");
        Ok(removed)
    }

    /// Every conflicting pair involving at least one stored slot of
    /// `timetable_id`.
    ///
    /// Rooms are shared across timetables, so the timetable's slots are
    /// checked against every booking of the rooms they use (and, with
    /// [`TeacherScope::Global`], every slot of their teachers).
    pub fn audit(&self, timetable_id: &str) -> Result<Vec<SlotConflict>> {
        let own = self.repository.find_by_timetable(timetable_id)?;
        let own_ids: BTreeSet<String> = own.iter().map(|s| s.id.clone()).collect();

        let mut pool: BTreeMap<String, LectureSlot> = BTreeMap::new();
        for slot in &own {
            let day = slot.details.day_of_week;
            if let Some(venue) = slot.details.physical_venue() {
                for other in self
                    .repository
                    .find_by_venue_and_day(&venue.building, &venue.room, day)?
                {
                    pool.insert(other.id.clone(), other);
                }
            }
            if self.options.teacher_scope == TeacherScope::Global {
                for other in
                    self.repository
                        .find_by_teacher_and_day(&slot.details.teacher_id, day, None)?
                {
                    pool.insert(other.id.clone(), other);
                }
            }
        }
        for slot in own {
            pool.insert(slot.id.clone(), slot);
        }

        let slots: Vec<LectureSlot> = pool.into_values().collect();
        let conflicts = conflict::find_slot_conflicts(&slots, self.options.teacher_scope)
            .into_iter()
            .filter(|c| own_ids.contains(&c.first_slot_id) || own_ids.contains(&c.second_slot_id))
            .collect();
        Ok(conflicts)
    }

    fn load(&self, id: &str) -> Result<LectureSlot> {
        self.repository
            .get(id)?
            .ok_or_else(|| TimetableError::NotFound(id.to_string()))
    }

    fn move_patch(&self, stored: &LectureSlot, day: DayOfWeek, start: WallTime) -> Result<SlotPatch> {
        let duration = stored.time_range()?.duration_minutes();
        let end = end_time(start, duration)?;
        Ok(SlotPatch::reschedule(TimeRange::new(day, start, end)?))
    }

    fn commit(&mut self, id: &str, merged: &SlotDraft, patch: &SlotPatch) -> Result<LectureSlot> {
        self.validate(merged)?;
        let report = self.evaluate(merged, Some(id))?;
        if !report.is_clear() {
            warn!(id, conflicts = %report.summary(), "rejected lecture slot change");
            return Err(TimetableError::Conflict(report));
        }

        let slot = self.repository.apply_patch(id, patch)?;
        info!(
            id = %slot.id,
            day = %slot.details.day_of_week,
            start = %slot.details.start_time,
            end = %slot.details.end_time,
            "updated lecture slot"
        );
        Ok(slot)
    }

    fn validate(&self, draft: &SlotDraft) -> Result<()> {
        let mut problems = draft.shape_violations();
        if let Some(opens) = self.options.opens_at {
            if draft.start_time < opens {
                problems.push(format!("startTime {} is before opening time {opens}", draft.start_time));
            }
        }
        if let Some(closes) = self.options.closes_at {
            if draft.end_time > closes {
                problems.push(format!("endTime {} is after closing time {closes}", draft.end_time));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            warn!(problems = %problems.join("; "), "rejected malformed lecture slot");
            Err(TimetableError::Structural(problems))
        }
    }
}
