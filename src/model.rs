use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::limits::*;

/// A single court's availability for the 30-minute slot starting at `datetime`.
///
/// Timestamps are facility-local wall-clock time; nothing in the crate converts zones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HalfHourOpening {
    pub facility: String,
    pub court: String,
    pub datetime: NaiveDateTime,
}

impl HalfHourOpening {
    pub fn new(facility: impl Into<String>, court: impl Into<String>, datetime: NaiveDateTime) -> Self {
        Self {
            facility: facility.into(),
            court: court.into(),
            datetime,
        }
    }

    /// Identity used for slot-level diffing.
    pub fn key(&self) -> (&str, NaiveDateTime) {
        (self.court.as_str(), self.datetime)
    }
}

/// Every court free at one start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensedHalfHourOpening {
    pub start: NaiveDateTime,
    /// Ordered so the "first" court is stable across runs.
    pub courts: BTreeSet<String>,
}

/// Maximal run of condensed openings spaced exactly one slot apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningChunk {
    pub start: NaiveDateTime,
    /// Exclusive: last member's start plus one slot.
    pub end: NaiveDateTime,
    pub slots: Vec<CondensedHalfHourOpening>,
}

impl OpeningChunk {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// How an opening's slots map onto courts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtAssignment {
    /// Any one of these courts covers the whole opening; no switch needed.
    Courts(Vec<String>),
    /// One court per half-hour slot, in order.
    Path(Vec<String>),
}

impl CourtAssignment {
    /// Court booked for the `i`th slot of the opening.
    pub fn court_at(&self, i: usize) -> Option<&str> {
        match self {
            CourtAssignment::Courts(courts) => courts.first().map(String::as_str),
            CourtAssignment::Path(path) => path.get(i).map(String::as_str),
        }
    }

    /// Number of times the player has to change court.
    pub fn switches(&self) -> usize {
        match self {
            CourtAssignment::Courts(_) => 0,
            CourtAssignment::Path(path) => path.windows(2).filter(|w| w[0] != w[1]).count(),
        }
    }
}

/// An opening derived from one chunk, before the facility is attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpeningWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(flatten)]
    pub assignment: CourtAssignment,
}

/// Diff identity of an opening: court assignment is deliberately not part of it.
pub type OpeningKey = (NaiveDateTime, u32);

impl OpeningWindow {
    pub fn key(&self) -> OpeningKey {
        (self.start, self.duration_minutes)
    }

    pub fn slot_count(&self) -> usize {
        (self.duration_minutes as i64 / SLOT_MINUTES) as usize
    }
}

/// A candidate reservation at a facility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opening {
    pub facility: String,
    #[serde(flatten)]
    pub window: OpeningWindow,
}

impl Opening {
    pub fn key(&self) -> OpeningKey {
        self.window.key()
    }
}

// ── Preferences ──────────────────────────────────────────────────

/// Time of day on the half hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time {
    pub hour: u32,
    pub minute: u32,
}

impl Time {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    pub fn minutes(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Like `minutes`, but an hour of 0 is read as 24:00 so a midnight close
    /// does not produce an empty window.
    pub fn minutes_as_end(&self) -> u32 {
        if self.hour == 0 {
            24 * 60 + self.minute
        } else {
            self.minutes()
        }
    }

    pub fn of(datetime: &NaiveDateTime) -> Self {
        Self::new(datetime.hour(), datetime.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPreferences(pub &'static str);

impl std::fmt::Display for InvalidPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid preferences: {}", self.0)
    }
}

impl std::error::Error for InvalidPreferences {}

/// A subscriber's filter over one facility's slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub min_start_time: Time,
    pub max_end_time: Time,
    pub min_duration: u32,
    /// 0 = Sunday .. 6 = Saturday.
    pub days_of_week: BTreeSet<u32>,
    #[serde(default)]
    pub omitted_courts: BTreeSet<String>,
}

impl Preferences {
    /// Every day, all day, every court.
    pub fn unrestricted(min_duration: u32) -> Self {
        Self {
            min_start_time: Time::new(0, 0),
            max_end_time: Time::new(0, 0),
            min_duration,
            days_of_week: (0..7).collect(),
            omitted_courts: BTreeSet::new(),
        }
    }

    pub fn matches_day(&self, date: NaiveDate) -> bool {
        self.days_of_week
            .contains(&date.weekday().num_days_from_sunday())
    }

    /// Inclusive on both ends, compared on (hour, minute).
    pub fn matches_time(&self, time: Time) -> bool {
        let t = time.minutes();
        t >= self.min_start_time.minutes() && t <= self.max_end_time.minutes_as_end()
    }

    /// Checks the rules subscription creation enforces. The engine assumes they hold.
    pub fn validate(&self) -> Result<(), InvalidPreferences> {
        if self.days_of_week.is_empty() {
            return Err(InvalidPreferences("no days of week selected"));
        }
        if self.days_of_week.iter().any(|d| *d > 6) {
            return Err(InvalidPreferences("days of week must be between 0 and 6"));
        }
        if self.min_duration < MIN_DURATION_MINUTES
            || self.min_duration > MAX_DURATION_MINUTES
            || self.min_duration % SLOT_MINUTES as u32 != 0
        {
            return Err(InvalidPreferences(
                "minimum duration must be between 30 and 180 minutes and a multiple of 30",
            ));
        }
        for t in [self.min_start_time, self.max_end_time] {
            if t.minute != 0 && t.minute != 30 {
                return Err(InvalidPreferences("minutes must be 0 or 30"));
            }
        }
        if self.min_start_time.hour >= 24 || self.max_end_time.hour > 24 {
            return Err(InvalidPreferences("invalid hour range"));
        }
        if self.max_end_time.minutes_as_end() <= self.min_start_time.minutes() {
            return Err(InvalidPreferences("end time must be after start time"));
        }
        Ok(())
    }
}

/// Binds one subscriber to one filter for a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub email: String,
    pub preferences: Preferences,
}

// ── Collaborator contracts ───────────────────────────────────────

/// One free slot as reported by a facility scraper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtSlot {
    pub court: String,
    pub datetime: NaiveDateTime,
}

/// Result of scraping a single date. `error` set means the fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<CourtSlot>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An existing booking on a court, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub court: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityConfig {
    pub name: String,
    #[serde(default)]
    pub courts: Vec<String>,
    pub max_days_in_advance: u32,
    #[serde(default)]
    pub open_hour: Option<u32>,
    /// 0 means the facility closes at midnight.
    #[serde(default)]
    pub close_hour: Option<u32>,
}
