//! Weekly time intervals for lecture slots.
//!
//! A lecture slot occupies a wall-clock range on one weekday, every week.
//! Times are held as minutes since midnight so that `"9:00"` and `"09:00"`
//! compare equal; the `HH:MM` text form exists only at the serde boundary.
//!
//! # Functions
//!
//! - [`overlaps`] — Whether two weekly ranges occupy the same minutes
//! - [`end_time`] — Wall-clock end of a range given its start and duration

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TimetableError};

const MINUTES_PER_DAY: u32 = 24 * 60;

// ── DayOfWeek ───────────────────────────────────────────────────────────────

/// A schedulable weekday. Sunday is not schedulable.
///
/// Serialized as its integer: Monday = 1 .. Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayOfWeek {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 6] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = TimetableError;

    fn try_from(n: u8) -> Result<Self> {
        match n {
            1 => Ok(DayOfWeek::Monday),
            2 => Ok(DayOfWeek::Tuesday),
            3 => Ok(DayOfWeek::Wednesday),
            4 => Ok(DayOfWeek::Thursday),
            5 => Ok(DayOfWeek::Friday),
            6 => Ok(DayOfWeek::Saturday),
            other => Err(TimetableError::InvalidDay(other)),
        }
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> u8 {
        day.number()
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Weekday {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
        }
    }
}

impl TryFrom<Weekday> for DayOfWeek {
    type Error = TimetableError;

    fn try_from(weekday: Weekday) -> Result<Self> {
        // number_from_monday: Mon = 1 .. Sun = 7
        DayOfWeek::try_from(weekday.number_from_monday() as u8)
    }
}

/// Accepts the day number (`"1"`..`"6"`) or an English weekday name
/// (`"mon"`, `"Monday"`).
impl FromStr for DayOfWeek {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return DayOfWeek::try_from(n);
        }
        let weekday = s
            .parse::<Weekday>()
            .map_err(|_| TimetableError::UnknownDay(s.to_string()))?;
        DayOfWeek::try_from(weekday)
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Weekday::from(*self))
    }
}

// ── WallTime ────────────────────────────────────────────────────────────────

/// A wall-clock time of day, minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(u16);

impl WallTime {
    pub const MIDNIGHT: WallTime = WallTime(0);
    pub const LAST_MINUTE: WallTime = WallTime((MINUTES_PER_DAY - 1) as u16);

    /// Build from hour (0-23) and minute (0-59).
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(TimetableError::InvalidTime(format!(
                "{hour}:{minute:02} is not a time of day"
            )));
        }
        Ok(WallTime((hour * 60 + minute) as u16))
    }

    /// Build from minutes since midnight (0-1439).
    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if minutes >= MINUTES_PER_DAY {
            return Err(TimetableError::InvalidTime(format!(
                "{minutes} minutes is past the end of the day"
            )));
        }
        Ok(WallTime(minutes as u16))
    }

    pub fn minutes(self) -> u32 {
        self.0 as u32
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS` (24-hour). Seconds must be zero.
impl FromStr for WallTime {
    type Err = TimetableError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|e| TimetableError::InvalidTime(format!("'{}': {}", s, e)))?;
        if time.second() != 0 {
            return Err(TimetableError::InvalidTime(format!(
                "'{}': seconds are not supported",
                s
            )));
        }
        WallTime::from_hm(time.hour(), time.minute())
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<WallTime> for NaiveTime {
    fn from(t: WallTime) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(t.minutes() * 60, 0)
            .unwrap_or_default()
    }
}

impl Serialize for WallTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A half-open weekly range `[start, end)` on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    pub day: DayOfWeek,
    pub start: WallTime,
    pub end: WallTime,
}

impl TimeRange {
    /// Build a range, rejecting `end <= start` (no overnight ranges).
    pub fn new(day: DayOfWeek, start: WallTime, end: WallTime) -> Result<Self> {
        if end <= start {
            return Err(TimetableError::InvalidTime(format!(
                "end time {end} must be after start time {start}"
            )));
        }
        Ok(TimeRange { day, start, end })
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self, other)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start, self.end)
    }
}

/// Whether two weekly ranges occupy any common minute.
///
/// Ranges are half-open, so a range ending at `10:00` and one starting at
/// `10:00` on the same day do not overlap.
///
/// # Examples
///
/// ```
/// use timetable_engine::interval::{overlaps, DayOfWeek, TimeRange};
///
/// let a = TimeRange::new(DayOfWeek::Monday, "09:00".parse().unwrap(), "10:00".parse().unwrap()).unwrap();
/// let b = TimeRange::new(DayOfWeek::Monday, "10:00".parse().unwrap(), "11:00".parse().unwrap()).unwrap();
/// assert!(!overlaps(&a, &b));
/// ```
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.day == b.day && a.start < b.end && b.start < a.end
}

/// Wall-clock end time of a range starting at `start` lasting `duration_minutes`.
///
/// # Errors
///
/// Returns [`TimetableError::InvalidTime`] if the end would fall past `23:59`;
/// slots never cross midnight.
pub fn end_time(start: WallTime, duration_minutes: u32) -> Result<WallTime> {
    let end = start
        .minutes()
        .checked_add(duration_minutes)
        .filter(|m| *m < MINUTES_PER_DAY)
        .ok_or_else(|| {
            TimetableError::InvalidTime(format!(
                "{start} plus {duration_minutes} minutes crosses midnight"
            ))
        })?;
    WallTime::from_minutes(end)
}
