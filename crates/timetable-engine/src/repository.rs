//! Lecture slot storage.
//!
//! The conflict engine only reads and writes slots through
//! [`LectureSlotRepository`]. [`InMemoryRepository`] backs the CLI's JSON
//! store and the tests; a database-backed implementation plugs in the same way.

use std::collections::BTreeMap;

use crate::error::{Result, TimetableError};
use crate::interval::DayOfWeek;
use crate::slot::{LectureSlot, SlotDraft, SlotPatch};

/// Query and write access to stored lecture slots.
pub trait LectureSlotRepository {
    fn get(&self, id: &str) -> Result<Option<LectureSlot>>;

    /// Slots taught by `teacher_id` on `day`. With `timetable_id` set, only
    /// slots of that timetable; with `None`, across all timetables.
    fn find_by_teacher_and_day(
        &self,
        teacher_id: &str,
        day: DayOfWeek,
        timetable_id: Option<&str>,
    ) -> Result<Vec<LectureSlot>>;

    /// Slots booked into `building`/`room` on `day`, across all timetables.
    fn find_by_venue_and_day(
        &self,
        building: &str,
        room: &str,
        day: DayOfWeek,
    ) -> Result<Vec<LectureSlot>>;

    fn find_by_timetable(&self, timetable_id: &str) -> Result<Vec<LectureSlot>>;

    /// Store a new slot, assigning its id.
    fn save(&mut self, draft: SlotDraft) -> Result<LectureSlot>;

    /// Merge `patch` onto the stored slot and return the result.
    fn apply_patch(&mut self, id: &str, patch: &SlotPatch) -> Result<LectureSlot>;

    fn remove(&mut self, id: &str) -> Result<LectureSlot>;
}

/// A repository held entirely in memory, keyed by slot id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    slots: BTreeMap<String, LectureSlot>,
    next_id: u64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from previously stored slots. Later duplicates of an id replace
    /// earlier ones.
    pub fn from_slots(slots: impl IntoIterator<Item = LectureSlot>) -> Self {
        let slots: BTreeMap<String, LectureSlot> =
            slots.into_iter().map(|s| (s.id.clone(), s)).collect();
        let next_id = slots.len() as u64;
        InMemoryRepository { slots, next_id }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, ordered by id.
    pub fn slots(&self) -> impl Iterator<Item = &LectureSlot> {
        self.slots.values()
    }

    pub fn into_slots(self) -> Vec<LectureSlot> {
        self.slots.into_values().collect()
    }

    fn allocate_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("slot-{}", self.next_id);
            if !self.slots.contains_key(&id) {
                return id;
            }
        }
    }

    fn matching(&self, pred: impl Fn(&LectureSlot) -> bool) -> Vec<LectureSlot> {
        self.slots.values().filter(|s| pred(s)).cloned().collect()
    }
}

impl LectureSlotRepository for InMemoryRepository {
    fn get(&self, id: &str) -> Result<Option<LectureSlot>> {
        Ok(self.slots.get(id).cloned())
    }

    fn find_by_teacher_and_day(
        &self,
        teacher_id: &str,
        day: DayOfWeek,
        timetable_id: Option<&str>,
    ) -> Result<Vec<LectureSlot>> {
        Ok(self.matching(|s| {
            s.details.teacher_id == teacher_id
                && s.details.day_of_week == day
                && timetable_id.is_none_or(|tt| s.details.timetable_id == tt)
        }))
    }

    fn find_by_venue_and_day(
        &self,
        building: &str,
        room: &str,
        day: DayOfWeek,
    ) -> Result<Vec<LectureSlot>> {
        Ok(self.matching(|s| {
            s.details.day_of_week == day
                && s.details
                    .venue
                    .as_ref()
                    .is_some_and(|v| v.building == building && v.room == room)
        }))
    }

    fn find_by_timetable(&self, timetable_id: &str) -> Result<Vec<LectureSlot>> {
        Ok(self.matching(|s| s.details.timetable_id == timetable_id))
    }

    fn save(&mut self, draft: SlotDraft) -> Result<LectureSlot> {
        let id = self.allocate_id();
        let slot = LectureSlot::new(id.clone(), draft);
        self.slots.insert(id, slot.clone());
        Ok(slot)
    }

    fn apply_patch(&mut self, id: &str, patch: &SlotPatch) -> Result<LectureSlot> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| TimetableError::NotFound(id.to_string()))?;
        slot.details = patch.apply_to(&slot.details);
        Ok(slot.clone())
    }

    fn remove(&mut self, id: &str) -> Result<LectureSlot> {
        self.slots
            .remove(id)
            .ok_or_else(|| TimetableError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::TimeRange;
    use crate::slot::Venue;

    fn range(day: DayOfWeek, start: &str, end: &str) -> TimeRange {
        TimeRange::new(day, start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    fn seeded() -> InMemoryRepository {
        let mut repo = InMemoryRepository::new();
        repo.save(SlotDraft::in_room(
            "tt-1",
            "CS101",
            "T1",
            range(DayOfWeek::Monday, "09:00", "10:00"),
            Venue::new("B", "101", 60),
        ))
        .unwrap();
        repo.save(SlotDraft::in_room(
            "tt-2",
            "CS201",
            "T1",
            range(DayOfWeek::Monday, "11:00", "12:00"),
            Venue::new("B", "102", 60),
        ))
        .unwrap();
        repo.save(SlotDraft::online(
            "tt-1",
            "CS102",
            "T2",
            range(DayOfWeek::Tuesday, "09:00", "10:00"),
        ))
        .unwrap();
        repo
    }

    #[test]
    fn test_save_assigns_sequential_ids() {
        let repo = seeded();
        let ids: Vec<&str> = repo.slots().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["slot-1", "slot-2", "slot-3"]);
    }

    #[test]
    fn test_from_slots_never_reuses_an_id() {
        let mut repo = InMemoryRepository::from_slots(seeded().into_slots().into_iter().skip(1));
        assert_eq!(repo.len(), 2);
        let fresh = repo
            .save(SlotDraft::online(
                "tt-1",
                "CS103",
                "T3",
                range(DayOfWeek::Friday, "09:00", "10:00"),
            ))
            .unwrap();
        assert!(fresh.id != "slot-2" && fresh.id != "slot-3", "{}", fresh.id);
        assert_eq!(repo.len(), 3);
    }

    #[test]
    fn test_find_by_teacher_scoped_and_global() {
        let repo = seeded();
        let scoped = repo
            .find_by_teacher_and_day("T1", DayOfWeek::Monday, Some("tt-1"))
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].details.unit_id, "CS101");

        let global = repo
            .find_by_teacher_and_day("T1", DayOfWeek::Monday, None)
            .unwrap();
        assert_eq!(global.len(), 2);

        assert!(repo
            .find_by_teacher_and_day("T1", DayOfWeek::Tuesday, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_by_venue_matches_building_and_room() {
        let repo = seeded();
        assert_eq!(
            repo.find_by_venue_and_day("B", "101", DayOfWeek::Monday)
                .unwrap()
                .len(),
            1
        );
        assert!(repo
            .find_by_venue_and_day("B", "101", DayOfWeek::Tuesday)
            .unwrap()
            .is_empty());
        assert!(repo
            .find_by_venue_and_day("A", "101", DayOfWeek::Monday)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_find_by_timetable() {
        let repo = seeded();
        assert_eq!(repo.find_by_timetable("tt-1").unwrap().len(), 2);
        assert!(repo.find_by_timetable("tt-missing").unwrap().is_empty());
    }

    #[test]
    fn test_apply_patch_and_remove() {
        let mut repo = seeded();
        let patched = repo
            .apply_patch(
                "slot-1",
                &SlotPatch {
                    unit_id: Some("CS199".to_string()),
                    ..SlotPatch::default()
                },
            )
            .unwrap();
        assert_eq!(patched.details.unit_id, "CS199");
        assert_eq!(
            repo.get("slot-1").unwrap().unwrap().details.unit_id,
            "CS199"
        );

        let removed = repo.remove("slot-1").unwrap();
        assert_eq!(removed.id, "slot-1");
        assert!(repo.get("slot-1").unwrap().is_none());
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let mut repo = seeded();
        assert!(matches!(
            repo.apply_patch("nope", &SlotPatch::default()),
            Err(TimetableError::NotFound(id)) if id == "nope"
        ));
        assert!(matches!(repo.remove("nope"), Err(TimetableError::NotFound(_))));
    }
}
