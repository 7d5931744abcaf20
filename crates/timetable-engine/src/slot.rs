//! Lecture slot data model.
//!
//! A [`LectureSlot`] is one recurring weekly teaching session. Its JSON form
//! uses camelCase field names (`timetableId`, `dayOfWeek`, `startTime`, ...)
//! with `id` alongside the [`SlotDraft`] fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::interval::{DayOfWeek, TimeRange, WallTime};

/// A physical teaching room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub building: String,
    pub room: String,
    #[serde(default)]
    pub capacity: u32,
}

impl Venue {
    pub fn new(building: impl Into<String>, room: impl Into<String>, capacity: u32) -> Self {
        Venue {
            building: building.into(),
            room: room.into(),
            capacity,
        }
    }

    /// Whether both venues name the same room (capacity is not part of identity).
    pub fn same_room(&self, other: &Venue) -> bool {
        self.building == other.building && self.room == other.room
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LectureType {
    #[default]
    Lecture,
    Tutorial,
    Lab,
    Seminar,
}

/// How often a recurring slot meets. Conflict checks ignore this: every slot
/// is treated as occupying its weekday every week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Weekly,
    Biweekly,
    Monthly,
}

fn default_recurring() -> bool {
    true
}

/// Every lecture slot field except the id: what a caller proposes to schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDraft {
    pub timetable_id: String,
    pub unit_id: String,
    pub teacher_id: String,
    pub day_of_week: DayOfWeek,
    pub start_time: WallTime,
    pub end_time: WallTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub lecture_type: LectureType,
    #[serde(default = "default_recurring")]
    pub is_recurring: bool,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl SlotDraft {
    /// A weekly lecture in a physical room.
    pub fn in_room(
        timetable_id: impl Into<String>,
        unit_id: impl Into<String>,
        teacher_id: impl Into<String>,
        range: TimeRange,
        venue: Venue,
    ) -> Self {
        let mut draft = SlotDraft::online(timetable_id, unit_id, teacher_id, range);
        draft.venue = Some(venue);
        draft.is_online = false;
        draft
    }

    /// A weekly lecture with no physical venue.
    pub fn online(
        timetable_id: impl Into<String>,
        unit_id: impl Into<String>,
        teacher_id: impl Into<String>,
        range: TimeRange,
    ) -> Self {
        SlotDraft {
            timetable_id: timetable_id.into(),
            unit_id: unit_id.into(),
            teacher_id: teacher_id.into(),
            day_of_week: range.day,
            start_time: range.start,
            end_time: range.end,
            venue: None,
            is_online: true,
            lecture_type: LectureType::default(),
            is_recurring: true,
            frequency: Frequency::default(),
            color: None,
            metadata: Map::new(),
        }
    }

    pub fn with_lecture_type(mut self, lecture_type: LectureType) -> Self {
        self.lecture_type = lecture_type;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// The weekly range this draft occupies.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TimetableError::InvalidTime`] if `endTime <= startTime`.
    pub fn time_range(&self) -> Result<TimeRange> {
        TimeRange::new(self.day_of_week, self.start_time, self.end_time)
    }

    /// The room this draft books, or `None` for online slots.
    pub fn physical_venue(&self) -> Option<&Venue> {
        if self.is_online {
            None
        } else {
            self.venue.as_ref()
        }
    }

    /// Shape rules every stored slot satisfies, independent of other slots.
    /// Returns one message per violated rule.
    pub fn shape_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (field, value) in [
            ("timetableId", &self.timetable_id),
            ("unitId", &self.unit_id),
            ("teacherId", &self.teacher_id),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{field} is required"));
            }
        }

        if self.end_time <= self.start_time {
            problems.push(format!(
                "endTime {} must be after startTime {}",
                self.end_time, self.start_time
            ));
        }

        match (self.is_online, &self.venue) {
            (true, Some(_)) => problems.push("an online slot cannot have a venue".to_string()),
            (false, None) => problems.push("venue is required when not online".to_string()),
            (false, Some(venue)) => {
                if venue.building.trim().is_empty() {
                    problems.push("venue.building is required".to_string());
                }
                if venue.room.trim().is_empty() {
                    problems.push("venue.room is required".to_string());
                }
            }
            (true, None) => {}
        }

        problems
    }
}

/// A scheduled lecture slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureSlot {
    pub id: String,
    #[serde(flatten)]
    pub details: SlotDraft,
}

impl LectureSlot {
    pub fn new(id: impl Into<String>, details: SlotDraft) -> Self {
        LectureSlot {
            id: id.into(),
            details,
        }
    }

    pub fn time_range(&self) -> Result<TimeRange> {
        self.details.time_range()
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A partial update: only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<WallTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<WallTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Venue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lecture_type: Option<LectureType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    /// `Some(None)` (JSON `null`) clears the stored color.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SlotPatch {
    /// A patch that only reschedules: new day and time range.
    pub fn reschedule(range: TimeRange) -> Self {
        SlotPatch {
            day_of_week: Some(range.day),
            start_time: Some(range.start),
            end_time: Some(range.end),
            ..SlotPatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SlotPatch::default()
    }

    /// Merge this patch onto `base`, returning the result; `base` is untouched.
    ///
    /// Switching a slot online (`isOnline: true`) without supplying a venue
    /// drops the stored venue.
    pub fn apply_to(&self, base: &SlotDraft) -> SlotDraft {
        let mut merged = base.clone();

        if let Some(v) = &self.timetable_id {
            merged.timetable_id = v.clone();
        }
        if let Some(v) = &self.unit_id {
            merged.unit_id = v.clone();
        }
        if let Some(v) = &self.teacher_id {
            merged.teacher_id = v.clone();
        }
        if let Some(v) = self.day_of_week {
            merged.day_of_week = v;
        }
        if let Some(v) = self.start_time {
            merged.start_time = v;
        }
        if let Some(v) = self.end_time {
            merged.end_time = v;
        }
        if let Some(v) = self.is_online {
            merged.is_online = v;
            if v && self.venue.is_none() {
                merged.venue = None;
            }
        }
        if let Some(v) = &self.venue {
            merged.venue = Some(v.clone());
        }
        if let Some(v) = self.lecture_type {
            merged.lecture_type = v;
        }
        if let Some(v) = self.is_recurring {
            merged.is_recurring = v;
        }
        if let Some(v) = self.frequency {
            merged.frequency = v;
        }
        if let Some(v) = &self.color {
            merged.color = v.clone();
        }
        if let Some(v) = &self.metadata {
            merged.metadata = v.clone();
        }

        merged
    }
}
